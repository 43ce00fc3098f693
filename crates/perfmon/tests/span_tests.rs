// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for the timed-span wrapper
//!
//! Session bracketing, failure handling, cancellation and concurrency.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use iris_monitor_perfmon::{
    FixedClock, PerfmonError, ProfilingBackend, ReportName, SessionMode, SpanLabel, TimedSpan,
};
use iris_monitor_test_utils::{MockProfiler, ProfilerCall, sample_instant};

fn fixed_span(profiler: Arc<MockProfiler>) -> TimedSpan {
    TimedSpan::with_clock(profiler, Arc::new(FixedClock(sample_instant())))
}

fn label(text: &str) -> SpanLabel {
    SpanLabel::parse(text).unwrap()
}

async fn wait_for_stops(profiler: &MockProfiler, expected: usize) {
    for _ in 0..200 {
        if profiler.count(&ProfilerCall::Stop) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_success_calls_start_report_stop_in_order() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());

    let result: Result<&str, PerfmonError> = span.run(&label("Foo_bar"), || async { Ok("ok") }).await;

    assert_eq!(result, Ok("ok"));
    assert_eq!(
        profiler.calls(),
        vec![
            ProfilerCall::Start,
            ProfilerCall::GenerateReport("Foo_bar_20240305_080910.txt".to_string()),
            ProfilerCall::Stop,
        ]
    );
}

#[tokio::test]
async fn test_start_failure_is_returned_and_nothing_else_runs() {
    let profiler = Arc::new(
        MockProfiler::new().failing_start(PerfmonError::ConnectionFailed("refused".to_string())),
    );
    let span = fixed_span(profiler.clone());
    let mut invoked = false;

    let result: Result<(), PerfmonError> = span
        .run(&label("Foo_bar"), || {
            invoked = true;
            async { Ok(()) }
        })
        .await;

    assert_eq!(
        result,
        Err(PerfmonError::ConnectionFailed("refused".to_string()))
    );
    assert!(!invoked);
    assert_eq!(profiler.calls(), vec![ProfilerCall::Start]);
}

#[tokio::test]
async fn test_operation_failure_is_returned_after_cleanup() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());

    let result: Result<(), PerfmonError> = span
        .run(&label("Foo_bar"), || async {
            Err(PerfmonError::ConfigurationError("operation failed".to_string()))
        })
        .await;

    assert_eq!(
        result,
        Err(PerfmonError::ConfigurationError("operation failed".to_string()))
    );
    assert_eq!(profiler.count(&ProfilerCall::Start), 1);
    assert_eq!(profiler.report_names().len(), 1);
    assert_eq!(profiler.count(&ProfilerCall::Stop), 1);
}

#[tokio::test]
async fn test_cleanup_failures_do_not_mask_operation_result() {
    let profiler = Arc::new(
        MockProfiler::new()
            .failing_report(PerfmonError::procedure("generateReport", "no space"))
            .failing_stop(PerfmonError::procedure("stop", "not running")),
    );
    let span = fixed_span(profiler.clone());

    let ok: Result<u8, PerfmonError> = span.run(&label("Job_ok"), || async { Ok(1) }).await;
    assert_eq!(ok, Ok(1));

    let failed: Result<u8, PerfmonError> = span
        .run(&label("Job_fail"), || async {
            Err(PerfmonError::InvalidLabel("primary".to_string()))
        })
        .await;
    assert_eq!(failed, Err(PerfmonError::InvalidLabel("primary".to_string())));

    // Stop is still attempted after the report failed
    assert_eq!(profiler.count(&ProfilerCall::Stop), 2);
}

#[tokio::test]
async fn test_distinct_labels_in_same_second_get_distinct_names() {
    let profiler = Arc::new(MockProfiler::new().with_mode(SessionMode::Concurrent));
    let span = fixed_span(profiler.clone());

    let (bar, baz) = (label("Foo_bar"), label("Foo_baz"));
    let (a, b) = tokio::join!(
        span.run(&bar, || async { Ok::<_, PerfmonError>(()) }),
        span.run(&baz, || async { Ok::<_, PerfmonError>(()) }),
    );
    assert!(a.is_ok() && b.is_ok());

    let mut names = profiler.report_names();
    names.sort();
    assert_eq!(
        names,
        vec![
            "Foo_bar_20240305_080910.txt".to_string(),
            "Foo_baz_20240305_080910.txt".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_same_label_in_same_second_collides() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());

    for _ in 0..2 {
        let _: Result<(), PerfmonError> = span.run(&label("Foo_bar"), || async { Ok(()) }).await;
    }

    let names = profiler.report_names();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], names[1]);
    assert_eq!(
        names[0],
        ReportName::new(&label("Foo_bar"), sample_instant()).to_string()
    );
}

#[tokio::test]
async fn test_cancelled_operation_still_reports_and_stops() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());
    let job = label("Slow_job");

    let pending = span.run(&job, || async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok::<_, PerfmonError>(())
    });
    let timed_out = tokio::time::timeout(Duration::from_millis(20), pending).await;
    assert!(timed_out.is_err());

    wait_for_stops(&profiler, 1).await;
    assert_eq!(
        profiler.calls(),
        vec![
            ProfilerCall::Start,
            ProfilerCall::GenerateReport("Slow_job_20240305_080910.txt".to_string()),
            ProfilerCall::Stop,
        ]
    );
}

#[tokio::test]
async fn test_panicking_operation_still_reports_and_stops() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());

    let task = tokio::spawn(async move {
        let fail = true;
        span.run(&label("Panicky_job"), || async move {
            if fail {
                panic!("operation blew up");
            }
            Ok::<_, PerfmonError>(())
        })
        .await
    });
    assert!(task.await.unwrap_err().is_panic());

    wait_for_stops(&profiler, 1).await;
    assert_eq!(profiler.count(&ProfilerCall::Start), 1);
    assert_eq!(profiler.report_names().len(), 1);
    assert_eq!(profiler.count(&ProfilerCall::Stop), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exclusive_backend_never_sees_overlapping_sessions() {
    let profiler = Arc::new(MockProfiler::new().with_start_delay(Duration::from_millis(5)));
    assert_eq!(profiler.session_mode(), SessionMode::Exclusive);
    let span = fixed_span(profiler.clone());

    let mut handles = Vec::new();
    for i in 0..8 {
        let span = span.clone();
        handles.push(tokio::spawn(async move {
            let job = label(&format!("Job_{}", i));
            span.run(&job, || async {
                tokio::time::sleep(Duration::from_millis(2)).await;
                Ok::<_, PerfmonError>(i)
            })
            .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(profiler.max_overlap(), 1);
    assert_eq!(profiler.count(&ProfilerCall::Start), 8);
    assert_eq!(profiler.count(&ProfilerCall::Stop), 8);

    // Sessions never interleave: start, report, stop, start, ...
    for (i, call) in profiler.calls().iter().enumerate() {
        match i % 3 {
            0 => assert_eq!(call, &ProfilerCall::Start),
            1 => assert!(matches!(call, ProfilerCall::GenerateReport(_))),
            _ => assert_eq!(call, &ProfilerCall::Stop),
        }
    }
}

#[tokio::test]
async fn test_concurrent_backend_allows_overlap() {
    let profiler = Arc::new(
        MockProfiler::new()
            .with_mode(SessionMode::Concurrent)
            .with_start_delay(Duration::from_millis(5)),
    );
    let span = fixed_span(profiler.clone());

    let (job_a, job_b) = (label("Job_a"), label("Job_b"));
    let (a, b) = tokio::join!(
        span.run(&job_a, || async { Ok::<_, PerfmonError>(()) }),
        span.run(&job_b, || async { Ok::<_, PerfmonError>(()) }),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(profiler.max_overlap(), 2);
}

#[tokio::test]
async fn test_blocking_operation_is_bracketed() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());

    let result: Result<u64, PerfmonError> = span
        .run_blocking(&label("Batch_sum"), || Ok((1..=10).sum()))
        .await;

    assert_eq!(result, Ok(55));
    assert_eq!(
        profiler.report_names(),
        vec!["Batch_sum_20240305_080910.txt".to_string()]
    );
    assert_eq!(profiler.count(&ProfilerCall::Stop), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spans_sharing_a_backend_never_overlap() {
    let profiler = Arc::new(MockProfiler::new().with_start_delay(Duration::from_millis(20)));
    let first = fixed_span(profiler.clone());
    let second = fixed_span(profiler.clone());

    let (job_a, job_b) = (label("A_x"), label("B_y"));
    let (a, b) = tokio::join!(
        first.run(&job_a, || async { Ok::<_, PerfmonError>(()) }),
        second.run(&job_b, || async { Ok::<_, PerfmonError>(()) }),
    );
    assert!(a.is_ok() && b.is_ok());

    assert_eq!(profiler.max_overlap(), 1);
    let calls = profiler.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0], ProfilerCall::Start);
    assert!(matches!(calls[1], ProfilerCall::GenerateReport(_)));
    assert_eq!(calls[2], ProfilerCall::Stop);
    assert_eq!(calls[3], ProfilerCall::Start);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_blocking_operation_keeps_session_until_it_returns() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());
    let finished = Arc::new(AtomicBool::new(false));

    let batch = label("Slow_batch");
    let slow = {
        let finished = finished.clone();
        span.run_blocking(&batch, move || {
            std::thread::sleep(Duration::from_millis(150));
            finished.store(true, Ordering::SeqCst);
            Ok::<_, PerfmonError>(())
        })
    };
    let timed_out = tokio::time::timeout(Duration::from_millis(20), slow).await;
    assert!(timed_out.is_err());

    // The next session only starts once the abandoned closure is done
    let observed = span
        .run(&label("Next_job"), || async {
            Ok::<_, PerfmonError>(finished.load(Ordering::SeqCst))
        })
        .await;
    assert_eq!(observed, Ok(true));
    assert_eq!(
        profiler.report_names(),
        vec![
            "Slow_batch_20240305_080910.txt".to_string(),
            "Next_job_20240305_080910.txt".to_string(),
        ]
    );
    assert_eq!(profiler.max_overlap(), 1);
}

#[tokio::test]
async fn test_panicking_blocking_operation_is_resumed_after_cleanup() {
    let profiler = Arc::new(MockProfiler::new());
    let span = fixed_span(profiler.clone());

    let task = tokio::spawn(async move {
        let fail = true;
        span.run_blocking(&label("Panicky_batch"), move || {
            if fail {
                panic!("batch blew up");
            }
            Ok::<_, PerfmonError>(())
        })
        .await
    });
    assert!(task.await.unwrap_err().is_panic());

    // Cleanup completes before the panic is resumed
    assert_eq!(profiler.count(&ProfilerCall::Start), 1);
    assert_eq!(
        profiler.report_names(),
        vec!["Panicky_batch_20240305_080910.txt".to_string()]
    );
    assert_eq!(profiler.count(&ProfilerCall::Stop), 1);
}
