use log::error;
use std::ffi::OsString;
use std::process::ExitCode;

use pdf2dicom::cli::parse_args;
use pdf2dicom::command::ProcessRunner;
use pdf2dicom::config::Settings;
use pdf2dicom::derived::DerivedValues;
use pdf2dicom::diagnostics::OutputStyle;
use pdf2dicom::encapsulate::pdf_to_dicom;
use pdf2dicom::error::P2DError;

fn main() -> ExitCode {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let style = OutputStyle::detect(&argv);
    style.init_logger();

    match run(argv, style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(P2DError::UsageError(e)) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            ExitCode::from(code)
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(argv: Vec<OsString>, style: OutputStyle) -> Result<(), P2DError> {
    let args = parse_args(argv, style)?;
    let settings = Settings::from_env();
    let derived = DerivedValues::now(&settings);
    let runner = ProcessRunner::new()?;
    pdf_to_dicom(&runner, &settings, &args, &derived)?;
    return Ok(());
}
