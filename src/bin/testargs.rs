//! Stand-in for dcmtk tools in integration tests. Appends its argv as one
//! line to `$TESTARGS_OUT` (default: `testout` next to the executable),
//! writes its pid to `$TESTARGS_PID_OUT`, sleeps `$TESTARGS_SLEEP` seconds,
//! prints `$TESTARGS_STDOUT` and exits with `$TESTARGS_EXIT`.

use std::env;
use std::io::Write;

fn main() -> Result<(), std::io::Error> {
    let args: Vec<String> = env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let out_path = match env::var_os("TESTARGS_OUT") {
        Some(p) => p.into(),
        None => {
            let mut current_path = env::current_exe()?;
            current_path.pop();
            current_path.push("testout");
            current_path
        }
    };
    let mut out = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(out_path)?;
    writeln!(out, "args: {:?}", args)?;

    if let Some(pid_path) = env::var_os("TESTARGS_PID_OUT") {
        std::fs::write(pid_path, std::process::id().to_string())?;
    }
    if let Some(secs) = env::var("TESTARGS_SLEEP")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        std::thread::sleep(std::time::Duration::from_secs(secs));
    }

    if let Ok(stdout) = env::var("TESTARGS_STDOUT") {
        print!("{}", stdout);
    }
    let code = env::var("TESTARGS_EXIT")
        .ok()
        .and_then(|c| c.parse::<i32>().ok())
        .unwrap_or(0);
    std::process::exit(code);
}
