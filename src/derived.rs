use chrono::{DateTime, TimeZone};
use std::ffi::OsString;

use crate::config::Settings;

/// Values computed once per run rather than read from the reference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedValues {
    /// YYYYMMDD
    pub date: String,
    /// HHMMSS
    pub time: String,
    /// YYYYMMDDHHMMSS
    pub date_time: String,
    pub issuer_of_patient_id: OsString,
}

impl DerivedValues {
    pub fn new<Tz>(now: &DateTime<Tz>, settings: &Settings) -> DerivedValues
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        DerivedValues {
            date: now.format("%Y%m%d").to_string(),
            time: now.format("%H%M%S").to_string(),
            date_time: now.format("%Y%m%d%H%M%S").to_string(),
            issuer_of_patient_id: settings.issuer_of_patient_id.clone(),
        }
    }

    pub fn now(settings: &Settings) -> DerivedValues {
        DerivedValues::new(&chrono::Local::now(), settings)
    }
}
