// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Decorator pairing a service with the span label of its operation.

use std::future::Future;

use crate::error::PerfmonError;
use crate::report::SpanLabel;
use crate::span::TimedSpan;

/// A service whose calls run inside a [`TimedSpan`]
///
/// Service crates wrap their trait implementations in `Profiled<S>` and
/// forward each trait method through [`Profiled::call`].
#[derive(Clone)]
pub struct Profiled<S> {
    inner: S,
    span: TimedSpan,
    label: SpanLabel,
}

impl<S> Profiled<S> {
    pub fn new(inner: S, span: TimedSpan, label: SpanLabel) -> Self {
        Self { inner, span, label }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn label(&self) -> &SpanLabel {
        &self.label
    }

    pub fn span(&self) -> &TimedSpan {
        &self.span
    }

    /// Invoke `operation` on the inner service inside a profiling session
    pub async fn call<'a, F, Fut, T, E>(&'a self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&'a S) -> Fut,
        Fut: Future<Output = Result<T, E>> + 'a,
        E: From<PerfmonError>,
    {
        self.span.run(&self.label, || operation(&self.inner)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NoopProfiler;
    use std::sync::Arc;

    struct Greeter;

    impl Greeter {
        async fn greet(&self, name: &str) -> Result<String, PerfmonError> {
            Ok(format!("hello {}", name))
        }
    }

    #[tokio::test]
    async fn test_call_forwards_to_inner() {
        let span = TimedSpan::new(Arc::new(NoopProfiler));
        let profiled = Profiled::new(Greeter, span, SpanLabel::of::<Greeter>("greet").unwrap());

        let greeting = profiled.call(|g| g.greet("iris")).await.unwrap();

        assert_eq!(greeting, "hello iris");
        assert_eq!(profiled.label().as_str(), "Greeter_greet");
    }
}
