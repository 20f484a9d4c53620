use log::info;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::cli::Args;
use crate::command::{exec_command, ToolRunner};
use crate::config::Settings;
use crate::derived::DerivedValues;
use crate::dump::{read_reference_attributes, ReferenceAttributes, ReferenceTag};
use crate::error::{P2DError, ValidationError};

pub const MANUFACTURER: &str = "pdf2dicom";
pub const MANUFACTURER_MODEL_NAME: &str = "pdf2dicom";
pub const STATION_NAME: &str = "PDF2DICOM";

/// Series number as typed by the user, guaranteed to be ASCII digits only.
/// Leading zeros are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesNumber(String);

impl SeriesNumber {
    pub fn parse(s: &str) -> Result<SeriesNumber, ValidationError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidSeriesNumber(s.to_string()));
        }
        Ok(SeriesNumber(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Command line arguments that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationArgs {
    pub pdf_in: PathBuf,
    pub dcm_ref: PathBuf,
    pub dcm_out: PathBuf,
    pub doc_title: OsString,
    pub series_number: SeriesNumber,
}

impl InvocationArgs {
    /// The reference file is checked before the series number.
    pub fn validate(args: &Args) -> Result<InvocationArgs, ValidationError> {
        if !args.dcm_ref.is_file() {
            return Err(ValidationError::ReferenceMissing(args.dcm_ref.clone()));
        }
        let series_number = SeriesNumber::parse(&args.series_num)?;
        Ok(InvocationArgs {
            pdf_in: args.pdf_in.clone(),
            dcm_ref: args.dcm_ref.clone(),
            dcm_out: args.dcm_out.clone(),
            doc_title: args.doc_title.clone(),
            series_number,
        })
    }
}

/// Attribute overrides handed to pdf2dcm as `-k Keyword=Value`, in order.
pub fn attribute_overrides(
    args: &InvocationArgs,
    reference: &ReferenceAttributes,
    derived: &DerivedValues,
) -> Vec<(&'static str, OsString)> {
    let from_ref = |tag: ReferenceTag| (tag.keyword(), reference.get(tag).to_os_string());
    vec![
        from_ref(ReferenceTag::StudyDate),
        from_ref(ReferenceTag::StudyTime),
        ("SeriesDate", derived.date.clone().into()),
        ("SeriesTime", derived.time.clone().into()),
        ("ContentDate", derived.date.clone().into()),
        ("ContentTime", derived.time.clone().into()),
        ("AcquisitionDateTime", derived.date_time.clone().into()),
        from_ref(ReferenceTag::AccessionNumber),
        ("Manufacturer", MANUFACTURER.into()),
        ("ManufacturerModelName", MANUFACTURER_MODEL_NAME.into()),
        ("StationName", STATION_NAME.into()),
        from_ref(ReferenceTag::InstitutionName),
        from_ref(ReferenceTag::InstitutionAddress),
        from_ref(ReferenceTag::ReferringPhysicianName),
        from_ref(ReferenceTag::StudyDescription),
        from_ref(ReferenceTag::StudyID),
        ("ProtocolName", args.doc_title.clone()),
        ("SeriesDescription", args.doc_title.clone()),
        ("IssuerOfPatientID", derived.issuer_of_patient_id.clone()),
        from_ref(ReferenceTag::PatientAge),
        from_ref(ReferenceTag::PatientWeight),
        ("SeriesNumber", args.series_number.as_str().into()),
    ]
}

/// Full pdf2dcm argument vector:
/// `--title T --study-from REF (-k Key=Value)* PDF_IN DCM_OUT`.
pub fn build_arguments(
    args: &InvocationArgs,
    reference: &ReferenceAttributes,
    derived: &DerivedValues,
) -> Vec<OsString> {
    let mut arguments: Vec<OsString> = vec![
        "--title".into(),
        args.doc_title.clone(),
        "--study-from".into(),
        args.dcm_ref.clone().into(),
    ];
    for (keyword, value) in attribute_overrides(args, reference, derived) {
        // Values may be raw bytes in the reference file's character set.
        let mut pair = OsString::from(format!("{}=", keyword));
        pair.push(&value);
        arguments.push("-k".into());
        arguments.push(pair);
    }
    arguments.push(args.pdf_in.clone().into());
    arguments.push(args.dcm_out.clone().into());
    return arguments;
}

/// Validates, reads the reference attributes and runs pdf2dcm. Nothing is
/// executed when validation fails.
pub fn pdf_to_dicom<R>(
    runner: &R,
    settings: &Settings,
    args: &Args,
    derived: &DerivedValues,
) -> Result<InvocationArgs, P2DError>
where
    R: ToolRunner + ?Sized,
{
    let args = InvocationArgs::validate(args)?;

    info!("Reading study attributes from {}", args.dcm_ref.display());
    let reference = read_reference_attributes(runner, &settings.dcmdump, &args.dcm_ref)?;

    let arguments = build_arguments(&args, &reference, derived);
    exec_command(runner, &settings.pdf2dcm, &arguments, true)?;

    info!("Written {}", args.dcm_out.display());
    return Ok(args);
}
