// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures: sample patients and fixed instants

use chrono::{NaiveDate, NaiveDateTime};
use iris_monitor_patient::PatientInfo;

/// Sample patient records for testing
pub struct PatientFixtures;

impl PatientFixtures {
    /// Fully populated patient
    pub fn ada() -> PatientInfo {
        PatientInfo::new("P001")
            .with_name("Ada Lovelace")
            .with_gender("F")
            .with_birth_date("1815-12-10")
            .with_address("12 St James's Square, London")
    }

    /// Patient with only a name
    pub fn alan() -> PatientInfo {
        PatientInfo::new("P002").with_name("Alan Turing")
    }

    /// Patient with no optional fields
    pub fn anonymous() -> PatientInfo {
        PatientInfo::new("P003")
    }

    pub fn standard() -> Vec<PatientInfo> {
        vec![Self::ada(), Self::alan(), Self::anonymous()]
    }
}

/// 2024-03-05 08:09:10, the instant used in report-name examples
pub fn sample_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .and_then(|d| d.and_hms_opt(8, 9, 10))
        .expect("valid fixture instant")
}
