use log::info;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::runtime::Runtime;

use crate::error::P2DError;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// What an external tool left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        ToolOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs one external program to completion.
pub trait ToolRunner {
    fn run(&self, program: &Path, arguments: &[OsString]) -> Result<ToolOutput, P2DError>;
}

/// Spawns real child processes. A Ctrl-C or SIGTERM received while a child
/// is running kills the child and yields `P2DError::Interrupted`.
pub struct ProcessRunner {
    runtime: Runtime,
}

impl ProcessRunner {
    pub fn new() -> Result<ProcessRunner, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_name("pdf2dicom")
            .build()?;
        return Ok(ProcessRunner { runtime });
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, program: &Path, arguments: &[OsString]) -> Result<ToolOutput, P2DError> {
        self.runtime.block_on(run_child(program, arguments))
    }
}

async fn run_child(program: &Path, arguments: &[OsString]) -> Result<ToolOutput, P2DError> {
    let mut command = tokio::process::Command::new(program);
    command
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(target_os = "windows")]
    command.creation_flags(CREATE_NO_WINDOW);

    let child = command.spawn()?;
    // Dropping the wait future on interrupt drops the child, which kills it.
    tokio::select! {
        output = child.wait_with_output() => Ok(ToolOutput::from(output?)),
        _ = interrupted() => Err(P2DError::Interrupted),
    }
}

async fn interrupted() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = term.recv() => {}
            }
            return;
        }
    }
    ctrl_c().await;
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No handler could be installed, so never report an interrupt.
        std::future::pending::<()>().await;
    }
}

/// Logs and runs `program`, failing with `ExternalToolError` on a non-zero
/// exit. With `print` the captured output is forwarded to our own
/// stdout/stderr.
pub fn exec_command<R, S>(
    runner: &R,
    program: &Path,
    arguments: &[S],
    print: bool,
) -> Result<ToolOutput, P2DError>
where
    R: ToolRunner + ?Sized,
    S: AsRef<OsStr>,
{
    let arguments: Vec<OsString> = arguments
        .iter()
        .map(|s| s.as_ref().to_os_string())
        .collect();
    info!("Running: {}", command_line(program, &arguments));

    let output = runner.run(program, &arguments)?;

    if print {
        std::io::stdout().write_all(&output.stdout)?;
        std::io::stderr().write_all(&output.stderr)?;
    }
    if !output.success() {
        return Err(P2DError::ExternalToolError {
            program: program.display().to_string(),
            code: output.code,
            stderr: output.stderr_lossy(),
        });
    }
    return Ok(output);
}

/// Printable form of a command line, quoting arguments that contain
/// whitespace or are empty.
pub fn command_line(program: &Path, arguments: &[OsString]) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(arguments.iter().map(|a| {
        let s = a.to_string_lossy();
        if s.is_empty() || s.contains(char::is_whitespace) {
            format!("\"{}\"", s)
        } else {
            s.into_owned()
        }
    }));
    parts.join(" ")
}

/// Prefers a tool shipped next to our own executable, falling back to the
/// bare name so the PATH lookup applies.
pub fn binary_to_path(binary_name: &str) -> PathBuf {
    let file_name = if cfg!(target_os = "windows") {
        format!("{}.exe", binary_name)
    } else {
        binary_name.to_string()
    };
    if let Ok(mut sibling) = std::env::current_exe() {
        sibling.set_file_name(&file_name);
        if sibling.is_file() {
            return sibling;
        }
    }
    return PathBuf::from(binary_name);
}
