//! Reads single attribute values out of the reference DICOM file by running
//! `dcmdump +P <Keyword>` and picking the bracketed value from its output.
//!
//! A dcmdump line looks like
//!
//! ```text
//! (0008,0020) DA [20240101]                               #   8, 1 StudyDate
//! (0008,0090) PN (no value available)                     #   0, 0 ReferringPhysicianName
//! ```
//!
//! and an attribute absent from the file produces no line at all.

use log::{debug, warn};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;

use crate::command::{exec_command, ToolRunner};
use crate::error::{DumpParseError, P2DError};

const NO_VALUE_MARKER: &[u8] = b"(no value available)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTag {
    StudyDate,
    StudyTime,
    AccessionNumber,
    StudyID,
    InstitutionName,
    InstitutionAddress,
    ReferringPhysicianName,
    StudyDescription,
    PatientAge,
    PatientWeight,
}

impl ReferenceTag {
    pub const ALL: [ReferenceTag; 10] = [
        ReferenceTag::StudyDate,
        ReferenceTag::StudyTime,
        ReferenceTag::AccessionNumber,
        ReferenceTag::StudyID,
        ReferenceTag::InstitutionName,
        ReferenceTag::InstitutionAddress,
        ReferenceTag::ReferringPhysicianName,
        ReferenceTag::StudyDescription,
        ReferenceTag::PatientAge,
        ReferenceTag::PatientWeight,
    ];

    /// DICOM keyword, as understood by dcmdump `+P` and pdf2dcm `-k`.
    pub fn keyword(&self) -> &'static str {
        match self {
            ReferenceTag::StudyDate => "StudyDate",
            ReferenceTag::StudyTime => "StudyTime",
            ReferenceTag::AccessionNumber => "AccessionNumber",
            ReferenceTag::StudyID => "StudyID",
            ReferenceTag::InstitutionName => "InstitutionName",
            ReferenceTag::InstitutionAddress => "InstitutionAddress",
            ReferenceTag::ReferringPhysicianName => "ReferringPhysicianName",
            ReferenceTag::StudyDescription => "StudyDescription",
            ReferenceTag::PatientAge => "PatientAge",
            ReferenceTag::PatientWeight => "PatientWeight",
        }
    }
}

/// dcmdump prints values in the character set of the file (often
/// ISO_IR 100), so values stay raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpValue {
    Present(Vec<u8>),
    /// The attribute exists but is zero length.
    Empty,
    /// dcmdump printed nothing for the attribute.
    Missing,
    Malformed(String),
}

pub fn parse_dump_output(output: &[u8]) -> DumpValue {
    let line = output
        .split(|b| *b == b'\n')
        .map(trim_ascii)
        .find(|l| !l.is_empty() && !l.starts_with(b"#"));
    let line = match line {
        Some(l) => l,
        None => return DumpValue::Missing,
    };
    if contains(line, NO_VALUE_MARKER) {
        return DumpValue::Empty;
    }
    match line.iter().position(|b| *b == b'[') {
        Some(open) => {
            let rest = &line[open + 1..];
            let value = rest.split(|b| *b == b']').next().unwrap_or(rest);
            DumpValue::Present(value.to_vec())
        }
        None => DumpValue::Malformed(String::from_utf8_lossy(line).into_owned()),
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Turns dcmdump value bytes into an argument for the next tool without
/// re-encoding them. Platforms without byte-based strings get a lossy copy.
pub fn bytes_to_os_string(bytes: Vec<u8>) -> OsString {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStringExt;
        return OsString::from_vec(bytes);
    }
    #[cfg(not(unix))]
    {
        return OsString::from(String::from_utf8_lossy(&bytes).into_owned());
    }
}

/// Values copied from the reference file; absent and empty attributes are
/// both stored as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceAttributes {
    values: HashMap<ReferenceTag, OsString>,
}

impl ReferenceAttributes {
    pub fn get(&self, tag: ReferenceTag) -> &OsStr {
        self.values
            .get(&tag)
            .map(OsString::as_os_str)
            .unwrap_or_else(|| OsStr::new(""))
    }

    pub fn set<S: Into<OsString>>(&mut self, tag: ReferenceTag, value: S) {
        self.values.insert(tag, value.into());
    }
}

pub fn read_attribute<R>(
    runner: &R,
    dcmdump: &Path,
    reference: &Path,
    tag: ReferenceTag,
) -> Result<OsString, P2DError>
where
    R: ToolRunner + ?Sized,
{
    let arguments = [
        OsStr::new("-q"),
        OsStr::new("+L"),
        OsStr::new("+P"),
        OsStr::new(tag.keyword()),
        reference.as_os_str(),
    ];
    let output = exec_command(runner, dcmdump, &arguments, false)?;
    match parse_dump_output(&output.stdout) {
        DumpValue::Present(value) => {
            debug!("{} = {:?}", tag.keyword(), String::from_utf8_lossy(&value));
            Ok(bytes_to_os_string(value))
        }
        DumpValue::Empty => {
            debug!("{} is empty", tag.keyword());
            Ok(OsString::new())
        }
        DumpValue::Missing => {
            warn!(
                "{} not found in {}, leaving it empty",
                tag.keyword(),
                reference.display()
            );
            Ok(OsString::new())
        }
        DumpValue::Malformed(line) => Err(DumpParseError {
            keyword: tag.keyword().to_string(),
            line,
        }
        .into()),
    }
}

/// Queries every `ReferenceTag` in turn, stopping at the first failure.
pub fn read_reference_attributes<R>(
    runner: &R,
    dcmdump: &Path,
    reference: &Path,
) -> Result<ReferenceAttributes, P2DError>
where
    R: ToolRunner + ?Sized,
{
    let mut attributes = ReferenceAttributes::default();
    for tag in ReferenceTag::ALL {
        let value = read_attribute(runner, dcmdump, reference, tag)?;
        attributes.set(tag, value);
    }
    return Ok(attributes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(
        "(0008,0020) DA [20240101]                               #   8, 1 StudyDate\n",
        DumpValue::Present(b"20240101".to_vec())
    )]
    #[case(
        "(0008,0080) LO [Klinik Hirslanden]                      #  18, 1 InstitutionName\n",
        DumpValue::Present(b"Klinik Hirslanden".to_vec())
    )]
    #[case(
        "(0008,0090) PN (no value available)                     #   0, 0 ReferringPhysicianName\n",
        DumpValue::Empty
    )]
    #[case("", DumpValue::Missing)]
    #[case("\n   \n", DumpValue::Missing)]
    #[case(
        "(0010,1030) DS 72.5 # 4, 1 PatientWeight",
        DumpValue::Malformed("(0010,1030) DS 72.5 # 4, 1 PatientWeight".to_string())
    )]
    #[case("(0008,1030) LO [cut off", DumpValue::Present(b"cut off".to_vec()))]
    #[case("(0020,0010) SH []  # 0, 0 StudyID", DumpValue::Present(Vec::new()))]
    fn test_parse_dump_output(#[case] output: &str, #[case] expected: DumpValue) {
        assert_eq!(parse_dump_output(output.as_bytes()), expected);
    }

    #[test]
    fn first_match_wins() {
        let output = "(0008,0020) DA [20240101] # 8, 1 StudyDate\n\
                      (0008,0020) DA [19991231] # 8, 1 StudyDate\n";
        assert_eq!(
            parse_dump_output(output.as_bytes()),
            DumpValue::Present(b"20240101".to_vec())
        );
    }

    #[test]
    fn value_stops_at_first_closing_bracket() {
        assert_eq!(
            parse_dump_output(b"(0008,1030) LO [CT [A]] # 8, 1 StudyDescription"),
            DumpValue::Present(b"CT [A".to_vec())
        );
    }

    #[test]
    fn comment_lines_are_skipped() {
        let output = "# Dicom-Data-Set\n(0010,1010) AS [045Y] # 4, 1 PatientAge\n";
        assert_eq!(
            parse_dump_output(output.as_bytes()),
            DumpValue::Present(b"045Y".to_vec())
        );
    }

    #[test]
    fn latin1_value_keeps_its_bytes() {
        let output = b"(0008,0080) LO [Spital Z\xfcrich]    #  14, 1 InstitutionName\n";
        assert_eq!(
            parse_dump_output(output),
            DumpValue::Present(b"Spital Z\xfcrich".to_vec())
        );
    }

    #[cfg(unix)]
    #[test]
    fn latin1_value_survives_conversion_to_argument() {
        use std::os::unix::ffi::OsStrExt;
        let value = bytes_to_os_string(b"Z\xfcrich".to_vec());
        assert_eq!(value.as_bytes(), b"Z\xfcrich");
    }

    #[test]
    fn unset_attribute_reads_as_empty() {
        let attributes = ReferenceAttributes::default();
        assert_eq!(attributes.get(ReferenceTag::PatientAge), "");
    }

    #[test]
    fn every_tag_has_a_distinct_keyword() {
        let mut keywords: Vec<&str> = ReferenceTag::ALL.iter().map(|t| t.keyword()).collect();
        keywords.sort();
        keywords.dedup();
        assert_eq!(keywords.len(), ReferenceTag::ALL.len());
    }
}
