use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::diagnostics::OutputStyle;
use crate::error::P2DError;

const ENVIRONMENT_HELP: &str = "\
Environment:
  PDF2DCM_ISSUEROFPATIENTID_ENV  Issuer of Patient ID written to the output [default: AAA]
  PDF2DCM_DCMDUMP                dcmdump executable to use
  PDF2DCM_PDF2DCM                pdf2dcm executable to use
  NO_COLOR                       Same as --no-color when set";

/// Convert a PDF file to a DICOM Encapsulated PDF, taking patient and
/// study attributes from a reference DICOM file
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None, after_help = ENVIRONMENT_HELP)]
pub struct Args {
    /// PDF file to encapsulate
    pub pdf_in: PathBuf,

    /// DICOM file of the study the document belongs to
    pub dcm_ref: PathBuf,

    /// Where to write the DICOM file
    pub dcm_out: PathBuf,

    /// Document title, also used as protocol name and series description
    pub doc_title: OsString,

    /// Series number, digits only
    pub series_num: String,

    /// Do not colorize diagnostics
    #[arg(long)]
    pub no_color: bool,
}

/// Parses argv including the program name. `-h`/`--help` anywhere before
/// `--` wins over every other argument and comes back as a clap error of
/// kind `DisplayHelp`.
pub fn parse_args<I, T>(args: I, style: OutputStyle) -> Result<Args, P2DError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let mut command = Args::command().color(style.color_choice());

    if wants_help(&args) {
        let bin_name = args
            .first()
            .cloned()
            .unwrap_or_else(|| OsString::from(env!("CARGO_PKG_NAME")));
        let err = command
            .try_get_matches_from_mut([bin_name, OsString::from("--help")])
            .err();
        if let Some(err) = err {
            return Err(err.into());
        }
    }

    let matches = command.try_get_matches_from_mut(&args)?;
    let parsed = Args::from_arg_matches(&matches).map_err(|e| e.format(&mut command))?;
    return Ok(parsed);
}

fn wants_help(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|a| a.as_os_str() != OsStr::new("--"))
        .any(|a| a == "-h" || a == "--help")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use rstest::*;

    const PLAIN: OutputStyle = OutputStyle { color: false };

    fn kind_of(args: &[&str]) -> ErrorKind {
        match parse_args(args.iter().copied(), PLAIN) {
            Err(P2DError::UsageError(e)) => e.kind(),
            other => panic!("expected a usage error, got {:?}", other),
        }
    }

    #[test]
    fn parses_five_positionals() {
        let args = parse_args(
            ["pdf2dicom", "in.pdf", "ref.dcm", "out.dcm", "Lab Report", "3"],
            PLAIN,
        )
        .unwrap();
        assert_eq!(args.pdf_in, PathBuf::from("in.pdf"));
        assert_eq!(args.dcm_ref, PathBuf::from("ref.dcm"));
        assert_eq!(args.dcm_out, PathBuf::from("out.dcm"));
        assert_eq!(args.doc_title, "Lab Report");
        assert_eq!(args.series_num, "3");
        assert!(!args.no_color);
    }

    #[test]
    fn no_color_may_appear_between_positionals() {
        let args = parse_args(
            ["pdf2dicom", "in.pdf", "--no-color", "ref.dcm", "out.dcm", "T", "0"],
            PLAIN,
        )
        .unwrap();
        assert!(args.no_color);
        assert_eq!(args.series_num, "0");
    }

    #[rstest]
    #[case(&["pdf2dicom"])]
    #[case(&["pdf2dicom", "in.pdf", "ref.dcm", "out.dcm", "T"])]
    #[case(&["pdf2dicom", "in.pdf", "ref.dcm", "out.dcm", "T", "3", "extra"])]
    #[case(&["pdf2dicom", "--bogus", "in.pdf", "ref.dcm", "out.dcm", "T", "3"])]
    #[case(&["pdf2dicom", "in.pdf", "ref.dcm", "out.dcm", "T", "-5"])]
    fn rejects_bad_command_lines(#[case] args: &[&str]) {
        let kind = kind_of(args);
        assert_ne!(kind, ErrorKind::DisplayHelp);
        let err = parse_args(args.iter().copied(), PLAIN).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[rstest]
    #[case(&["pdf2dicom", "-h"])]
    #[case(&["pdf2dicom", "--help"])]
    #[case(&["pdf2dicom", "in.pdf", "--help", "ref.dcm"])]
    #[case(&["pdf2dicom", "--bogus", "-h"])]
    fn help_wins(#[case] args: &[&str]) {
        assert_eq!(kind_of(args), ErrorKind::DisplayHelp);
        let err = parse_args(args.iter().copied(), PLAIN).unwrap_err();
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn help_after_separator_is_positional() {
        let args = parse_args(
            ["pdf2dicom", "--", "in.pdf", "ref.dcm", "out.dcm", "--help", "1"],
            PLAIN,
        )
        .unwrap();
        assert_eq!(args.doc_title, "--help");
    }

    #[cfg(unix)]
    #[test]
    fn title_may_be_any_bytes() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};
        let title = OsString::from_vec(b"Befund B\xfcrgi".to_vec());
        let args = parse_args(
            [
                OsString::from("pdf2dicom"),
                OsString::from("in.pdf"),
                OsString::from("ref.dcm"),
                OsString::from("out.dcm"),
                title,
                OsString::from("1"),
            ],
            PLAIN,
        )
        .unwrap();
        assert_eq!(args.doc_title.as_bytes(), b"Befund B\xfcrgi");
    }

    #[test]
    fn help_lists_environment_variables() {
        match parse_args(["pdf2dicom", "--help"], PLAIN) {
            Err(P2DError::UsageError(e)) => {
                let rendered = e.render().to_string();
                assert!(rendered.contains("<SERIES_NUM>"));
                assert!(rendered.contains("--no-color"));
                assert!(rendered.contains("PDF2DCM_ISSUEROFPATIENTID_ENV"));
            }
            other => panic!("expected help, got {:?}", other),
        }
    }
}
