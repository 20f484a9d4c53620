use env_logger::{Env, WriteStyle};
use std::ffi::OsStr;
use std::io::IsTerminal;

pub const NO_COLOR_FLAG: &str = "--no-color";

/// Whether diagnostics may carry ANSI colors. Resolved once at startup and
/// handed to everything that prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputStyle {
    pub color: bool,
}

impl OutputStyle {
    pub fn resolve(no_color_flag: bool, no_color_env: bool, stderr_is_terminal: bool) -> OutputStyle {
        OutputStyle {
            color: !no_color_flag && !no_color_env && stderr_is_terminal,
        }
    }

    /// Looks at the raw argv before clap does, so usage errors are already
    /// printed in the right style. `NO_COLOR` counts when set to anything.
    pub fn detect<S: AsRef<OsStr>>(args: &[S]) -> OutputStyle {
        let no_color_env = std::env::var_os("NO_COLOR").is_some();
        OutputStyle::from_argv(args, no_color_env, std::io::stderr().is_terminal())
    }

    pub fn from_argv<S: AsRef<OsStr>>(
        args: &[S],
        no_color_env: bool,
        stderr_is_terminal: bool,
    ) -> OutputStyle {
        let no_color_flag = args
            .iter()
            .skip(1)
            .map(|a| a.as_ref())
            .take_while(|a| *a != OsStr::new("--"))
            .any(|a| a == OsStr::new(NO_COLOR_FLAG));
        OutputStyle::resolve(no_color_flag, no_color_env, stderr_is_terminal)
    }

    pub fn color_choice(&self) -> clap::ColorChoice {
        if self.color {
            clap::ColorChoice::Auto
        } else {
            clap::ColorChoice::Never
        }
    }

    pub fn write_style(&self) -> WriteStyle {
        if self.color {
            WriteStyle::Auto
        } else {
            WriteStyle::Never
        }
    }

    /// Installs the logger. `RUST_LOG` still picks the level, info by default.
    pub fn init_logger(&self) {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .write_style(self.write_style())
            .target(env_logger::Target::Stderr)
            .try_init();
    }
}
