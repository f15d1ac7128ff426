//! Execution of external commands.
//!
//! The dump and restore pipelines never touch [`std::process`] directly;
//! they go through [`CommandRunner`] so the pipeline logic stays testable
//! without `mysqldump` or the compression binaries installed.

use std::env;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Everything the command wrote to stdout.
    pub stdout: Vec<u8>,
    /// Exit code, `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Whether the command exited with code `0`.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands on behalf of the dump and restore pipelines.
pub trait CommandRunner {
    /// Runs `command` with `args`, feeding `stdin` to the child when given,
    /// and captures its stdout.
    fn run(&self, command: &Path, args: &[&OsStr], stdin: Option<&[u8]>)
        -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] spawning real child processes.
///
/// Stderr of the child is captured and relayed through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        command: &Path,
        args: &[&OsStr],
        stdin: Option<&[u8]>,
    ) -> io::Result<CommandOutput> {
        log::trace!(target: "exec", "Running: {} {:?}", command.display(), args);

        let mut child = Command::new(command)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a separate thread; writing it inline would
        // deadlock once the child fills its stdout pipe while still
        // reading input.
        let writer = stdin.and_then(|bytes| {
            let mut pipe = child.stdin.take()?;
            let bytes = bytes.to_vec();
            Some(thread::spawn(move || {
                if let Err(e) = pipe.write_all(&bytes) {
                    log::warn!(target: "exec", "Writing to child stdin failed: {e}");
                }
                // pipe is dropped here so the child sees EOF
            }))
        });

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        // relay stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            log::warn!(target: "exec", "{}: {}", command.display(), stderr.trim_end());
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Locates `binary` on `PATH`, like the `which` shell command.
pub fn which(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;

    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn which_finds_binaries_on_path() {
        // sh is everywhere we run tests
        let sh = which("sh").expect("sh should be on PATH");
        assert!(sh.is_file());

        assert_eq!(None, which("no-such-binary-for-sure"));
    }

    #[test]
    #[cfg(unix)]
    fn system_runner_captures_stdout_and_exit_code() {
        let runner = SystemRunner;
        let sh = which("sh").unwrap();

        let args = ["-c", "printf hello"].map(OsStr::new);
        let output = runner.run(&sh, &args, None).unwrap();
        assert!(output.success());
        assert_eq!(b"hello".to_vec(), output.stdout);

        let args = ["-c", "exit 3"].map(OsStr::new);
        let output = runner.run(&sh, &args, None).unwrap();
        assert!(!output.success());
        assert_eq!(3, output.exit_code);
    }

    #[test]
    #[cfg(unix)]
    fn system_runner_feeds_stdin() {
        let runner = SystemRunner;
        let sh = which("sh").unwrap();

        let args = ["-c", "cat"].map(OsStr::new);
        let output = runner.run(&sh, &args, Some(b"piped")).unwrap();
        assert!(output.success());
        assert_eq!(b"piped".to_vec(), output.stdout);
    }
}
