//! Command runner: executes a collector's [`CommandSpec`] against a target
//! and captures its raw output.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::collector::CommandSpec;
use crate::decode::RawResult;
use crate::error::CollectError;
use crate::target::Target;

/// Default bound on a single command execution.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for a child process.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs external commands on behalf of collectors.
pub trait CommandRunner: Send + Sync {
    /// Execute `command` against `target`, returning its stdout.
    fn run(&self, command: &CommandSpec, target: &Target) -> Result<RawResult, CollectError>;
}

/// Runs FreeIPMI tools as child processes.
///
/// Remote targets get `-h <host>` appended; the local BMC is reached through
/// the in-band driver. Processes exceeding the timeout are killed.
#[derive(Debug, Clone)]
pub struct FreeIpmiRunner {
    bin_dir: Option<PathBuf>,
    timeout: Duration,
    driver_type: Option<String>,
}

impl Default for FreeIpmiRunner {
    fn default() -> Self {
        Self {
            bin_dir: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
            driver_type: None,
        }
    }
}

impl FreeIpmiRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the FreeIPMI binaries; `PATH` lookup when unset.
    pub fn with_bin_dir(mut self, bin_dir: Option<PathBuf>) -> Self {
        self.bin_dir = bin_dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value for `--driver-type` on remote targets (e.g. `LAN_2_0`).
    pub fn with_driver_type(mut self, driver_type: Option<String>) -> Self {
        self.driver_type = driver_type;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn program_path(&self, program: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }

    /// Full argument list for `command` against `target`.
    pub fn args(&self, command: &CommandSpec, target: &Target) -> Vec<String> {
        let mut args: Vec<String> = command.args.iter().map(|a| a.to_string()).collect();
        if let Some(host) = target.host() {
            args.push("-h".to_string());
            args.push(host.to_string());
            if let Some(driver) = &self.driver_type {
                args.push(format!("--driver-type={driver}"));
            }
        }
        args
    }
}

impl CommandRunner for FreeIpmiRunner {
    fn run(&self, command: &CommandSpec, target: &Target) -> Result<RawResult, CollectError> {
        let fail = |reason: String| CollectError::Execution {
            program: command.program.to_string(),
            target: target.name().to_string(),
            reason,
        };

        let program = self.program_path(command.program);
        let mut child = Command::new(&program)
            .args(self.args(command, target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("cannot spawn {}: {e}", program.display())))?;

        // Drain both pipes while waiting so a chatty child never blocks on a
        // full pipe buffer.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) if start.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    break Err(fail(format!("timed out after {:?}", self.timeout)));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    break Err(fail(e.to_string()));
                }
            }
        };

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);
        let status = status?;
        let stdout = stdout.map_err(|e| fail(format!("cannot read output: {e}")))?;

        if !status.success() {
            let stderr = stderr.unwrap_or_default();
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(fail(format!("{status}: {detail}")));
        }

        log::trace!("{} {} -> {:?}", command, target, stdout.trim());
        Ok(RawResult::new(stdout))
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<String>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join_reader(reader: Option<JoinHandle<std::io::Result<String>>>) -> std::io::Result<String> {
    match reader {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("output reader panicked"))),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const LAN_MODE: CommandSpec = CommandSpec {
        program: "ipmi-raw",
        args: &["0x0", "0x30", "0x70", "0x0c", "0"],
    };

    #[test]
    fn local_target_uses_fixed_args_only() {
        let runner = FreeIpmiRunner::new().with_driver_type(Some("LAN_2_0".into()));
        assert_eq!(
            runner.args(&LAN_MODE, &Target::local()),
            vec!["0x0", "0x30", "0x70", "0x0c", "0"]
        );
    }

    #[test]
    fn remote_target_appends_host_and_driver() {
        let runner = FreeIpmiRunner::new().with_driver_type(Some("LAN_2_0".into()));
        let args = runner.args(&LAN_MODE, &Target::remote("10.0.0.9"));
        assert_eq!(&args[5..], &["-h", "10.0.0.9", "--driver-type=LAN_2_0"]);
    }

    #[test]
    fn bin_dir_prefixes_program() {
        let runner =
            FreeIpmiRunner::new().with_bin_dir(Some(PathBuf::from("/opt/freeipmi/sbin")));
        assert_eq!(
            runner.program_path("ipmi-raw"),
            PathBuf::from("/opt/freeipmi/sbin/ipmi-raw")
        );
    }

    #[test]
    fn missing_program_is_an_execution_error() {
        let runner = FreeIpmiRunner::new();
        let spec = CommandSpec {
            program: "ipmiscope-definitely-not-installed",
            args: &[],
        };
        let err = runner.run(&spec, &Target::local()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let runner = FreeIpmiRunner::new();
        let spec = CommandSpec {
            program: "echo",
            args: &["rcvd:", "0C", "00", "01"],
        };
        let raw = runner.run(&spec, &Target::local()).unwrap();
        assert_eq!(raw.as_str().trim(), "rcvd: 0C 00 01");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_execution_error() {
        let runner = FreeIpmiRunner::new();
        let spec = CommandSpec {
            program: "false",
            args: &[],
        };
        let err = runner.run(&spec, &Target::local()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out() {
        let runner = FreeIpmiRunner::new().with_timeout(Duration::from_millis(50));
        let spec = CommandSpec {
            program: "sleep",
            args: &["5"],
        };
        let start = Instant::now();
        let err = runner.run(&spec, &Target::local()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn large_output_does_not_block_the_child() {
        let runner = FreeIpmiRunner::new().with_timeout(Duration::from_secs(2));
        let spec = CommandSpec {
            program: "head",
            args: &["-c", "200000", "/dev/zero"],
        };
        let raw = runner.run(&spec, &Target::local()).unwrap();
        assert_eq!(raw.as_str().len(), 200_000);
    }

    #[cfg(unix)]
    #[test]
    fn stderr_is_reported_on_failure() {
        let runner = FreeIpmiRunner::new();
        let spec = CommandSpec {
            program: "sh",
            args: &["-c", "echo 'ipmi_ctx_open_outofband: connection timeout' >&2; exit 1"],
        };
        let err = runner.run(&spec, &Target::local()).unwrap_err();
        assert!(err.to_string().contains("connection timeout"), "{err}");
    }
}
