//! Process Execution
//!
//! Spawns native processes on behalf of compiled programs and waits for them.
//! `run` propagates spawn failures; `chmod` swallows every failure.

use std::ffi::OsString;
use std::process::{Command, ExitStatus};

use log::{debug, warn};

use crate::config::ProcessConfig;
use crate::error::{ShimError, ShimResult};

/// Process spawner configured with the host's permission utility.
#[derive(Debug, Clone)]
pub struct ProcessExec {
    chmod_program: String,
}

impl ProcessExec {
    pub fn new(config: &ProcessConfig) -> Self {
        Self {
            chmod_program: config.chmod_program.clone(),
        }
    }

    /// Run `argv[0]` with the remaining arguments and wait for it to exit.
    ///
    /// Returns the child's exit status. On unix a child killed by a signal
    /// reports `128 + signal`.
    pub fn run(&self, argv: &[&[u8]]) -> ShimResult<i32> {
        let (program, args) = argv.split_first().ok_or(ShimError::EmptyCommand)?;
        let program = native_string(program);
        debug!("running {:?} with {} argument(s)", program, args.len());

        let status = Command::new(&program)
            .args(args.iter().map(|arg| native_string(arg)))
            .status()
            .map_err(|source| ShimError::Spawn {
                program: program.to_string_lossy().into_owned(),
                source,
            })?;

        Ok(exit_code(status))
    }

    /// Change the permission bits of `path` through the host chmod utility.
    ///
    /// `mode` is rendered in octal and never validated. Nothing is reported
    /// back; failures are only logged.
    pub fn chmod(&self, path: &[u8], mode: i32) {
        let mode = octal_mode(mode);
        let path = native_string(path);

        match Command::new(&self.chmod_program)
            .arg(&mode)
            .arg(&path)
            .status()
        {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(
                "ignoring {} {} {:?}: exited with {}",
                self.chmod_program, mode, path, status
            ),
            Err(e) => warn!("ignoring {} {} {:?}: {}", self.chmod_program, mode, path, e),
        }
    }
}

impl Default for ProcessExec {
    fn default() -> Self {
        Self::new(&ProcessConfig::default())
    }
}

/// Render a permission mode in octal.
///
/// Negative modes keep their sign: `-8` renders as `"-10"`.
pub fn octal_mode(mode: i32) -> String {
    if mode < 0 {
        format!("-{:o}", mode.unsigned_abs())
    } else {
        format!("{:o}", mode)
    }
}

/// Decode a raw argument into a host string.
#[cfg(unix)]
fn native_string(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStringExt;

    OsString::from_vec(bytes.to_vec())
}

#[cfg(not(unix))]
fn native_string(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        return code;
    }
    match status.signal() {
        Some(signal) => {
            match nix::sys::signal::Signal::try_from(signal) {
                Ok(name) => debug!("child terminated by {}", name),
                Err(_) => debug!("child terminated by signal {}", signal),
            }
            128 + signal
        }
        None => -1,
    }
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
