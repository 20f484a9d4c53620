use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum P2DError {
    /// Bad command line, carries clap's rendered message. Help and version
    /// requests travel through here too, see `exit_code`.
    UsageError(clap::Error),
    ValidationError(ValidationError),
    ExternalToolError {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    DumpParseError(DumpParseError),
    IoError(std::io::Error),
    Interrupted,
}

#[derive(Debug)]
pub enum ValidationError {
    ReferenceMissing(PathBuf),
    InvalidSeriesNumber(String),
}

#[derive(Debug)]
pub struct DumpParseError {
    pub keyword: String,
    pub line: String,
}

impl P2DError {
    pub fn exit_code(&self) -> i32 {
        match self {
            P2DError::UsageError(e) if !e.use_stderr() => 0,
            P2DError::Interrupted => 130,
            _ => 1,
        }
    }
}

impl From<clap::Error> for P2DError {
    fn from(error: clap::Error) -> Self {
        P2DError::UsageError(error)
    }
}

impl From<ValidationError> for P2DError {
    fn from(error: ValidationError) -> Self {
        P2DError::ValidationError(error)
    }
}

impl From<DumpParseError> for P2DError {
    fn from(error: DumpParseError) -> Self {
        P2DError::DumpParseError(error)
    }
}

impl From<std::io::Error> for P2DError {
    fn from(error: std::io::Error) -> Self {
        P2DError::IoError(error)
    }
}

impl fmt::Display for P2DError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            P2DError::UsageError(e) => write!(f, "{}", e),
            P2DError::ValidationError(e) => write!(f, "{}", e),
            P2DError::ExternalToolError {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(c) => write!(f, "{} failed with exit code {}", program, c)?,
                    None => write!(f, "{} was terminated by a signal", program)?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
            P2DError::DumpParseError(e) => write!(f, "{}", e),
            P2DError::IoError(e) => write!(f, "IO: {}", e),
            P2DError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ReferenceMissing(path) => {
                write!(f, "Reference DICOM file not found: {}", path.display())
            }
            ValidationError::InvalidSeriesNumber(s) => {
                write!(f, "Series number must be a non-negative integer, got {:?}", s)
            }
        }
    }
}

impl fmt::Display for DumpParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot read {} from dcmdump output: {:?}",
            self.keyword, self.line
        )
    }
}

impl std::error::Error for P2DError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_tool_error_mentions_program_and_stderr() {
        let err = P2DError::ExternalToolError {
            program: "pdf2dcm".to_string(),
            code: Some(1),
            stderr: "E: cannot open file\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pdf2dcm failed with exit code 1: E: cannot open file"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn interrupted_exits_130() {
        assert_eq!(P2DError::Interrupted.exit_code(), 130);
    }

    #[test]
    fn validation_errors_have_distinct_messages() {
        let missing = P2DError::from(ValidationError::ReferenceMissing("ref.dcm".into()));
        let series = P2DError::from(ValidationError::InvalidSeriesNumber("12a".to_string()));
        assert_ne!(missing.to_string(), series.to_string());
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(series.exit_code(), 1);
    }
}
