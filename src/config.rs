use std::ffi::OsString;
use std::path::PathBuf;

use crate::command::binary_to_path;

pub const ISSUER_OF_PATIENT_ID_ENV: &str = "PDF2DCM_ISSUEROFPATIENTID_ENV";
pub const DEFAULT_ISSUER_OF_PATIENT_ID: &str = "AAA";
pub const DCMDUMP_ENV: &str = "PDF2DCM_DCMDUMP";
pub const PDF2DCM_ENV: &str = "PDF2DCM_PDF2DCM";

/// Everything the run takes from the environment rather than from argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub issuer_of_patient_id: OsString,
    pub dcmdump: PathBuf,
    pub pdf2dcm: PathBuf,
}

impl Settings {
    pub fn from_env() -> Settings {
        Settings::from_vars(|name| std::env::var_os(name))
    }

    /// `lookup` returns the value of an environment variable, if set. Values
    /// need not be UTF-8. An issuer set to the empty string stays empty.
    pub fn from_vars<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let issuer_of_patient_id = lookup(ISSUER_OF_PATIENT_ID_ENV)
            .unwrap_or_else(|| OsString::from(DEFAULT_ISSUER_OF_PATIENT_ID));
        let dcmdump = tool_path(&lookup, DCMDUMP_ENV, "dcmdump");
        let pdf2dcm = tool_path(&lookup, PDF2DCM_ENV, "pdf2dcm");
        Settings {
            issuer_of_patient_id,
            dcmdump,
            pdf2dcm,
        }
    }
}

fn tool_path<F>(lookup: &F, env_name: &str, binary_name: &str) -> PathBuf
where
    F: Fn(&str) -> Option<OsString>,
{
    match lookup(env_name) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => binary_to_path(binary_name),
    }
}
