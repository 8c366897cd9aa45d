use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result, bail};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamMode {
    Inherit,
    Capture,
}

#[derive(Clone, Debug)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
    pub current_dir: Option<PathBuf>,
    pub stdout: StreamMode,
    pub stderr: StreamMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            stdout: StreamMode::Inherit,
            stderr: StreamMode::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.stdout = StreamMode::Capture;
        self.stderr = StreamMode::Capture;
        self
    }

    /// Shell-like rendering used for debug echo and error messages.
    pub fn display(&self) -> String {
        let mut rendered = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        self.stdout
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    pub fn stderr_lossy(&self) -> String {
        self.stderr
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    /// Exit code of the child; termination by signal maps to 1.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(1)
    }
}

/// Seam between subverbs and the processes they spawn.
pub trait CommandRunner {
    fn run(&self, spec: CommandSpec) -> Result<CommandOutput>;
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        run(spec)
    }
}

pub fn run(spec: CommandSpec) -> Result<CommandOutput> {
    tracing::debug!(command = %spec.display(), cwd = ?spec.current_dir, "spawning");
    let mut command = Command::new(&spec.program);
    command.args(&spec.args);
    if let Some(dir) = &spec.current_dir {
        command.current_dir(dir);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    match (spec.stdout, spec.stderr) {
        (StreamMode::Inherit, StreamMode::Inherit) => {
            command.stdin(Stdio::inherit());
            command.stdout(Stdio::inherit());
            command.stderr(Stdio::inherit());
            let status = command
                .status()
                .with_context(|| format!("failed to spawn `{}`", spec.program.to_string_lossy()))?;
            Ok(CommandOutput {
                status,
                stdout: None,
                stderr: None,
            })
        }
        (StreamMode::Capture, StreamMode::Capture) => {
            command.stdout(Stdio::piped());
            command.stderr(Stdio::piped());
            let output = command
                .output()
                .with_context(|| format!("failed to spawn `{}`", spec.program.to_string_lossy()))?;
            Ok(CommandOutput {
                status: output.status,
                stdout: Some(output.stdout),
                stderr: Some(output.stderr),
            })
        }
        _ => bail!("mixed capture/inherit mode is not supported yet"),
    }
}

/// Run a captured command and fail with `what` plus the tool's stderr when it exits non-zero.
pub fn run_checked(
    runner: &dyn CommandRunner,
    spec: CommandSpec,
    what: &str,
) -> Result<CommandOutput> {
    let rendered = spec.display();
    let output = runner
        .run(spec)
        .with_context(|| format!("failed while {what}"))?;
    if output.status.success() {
        return Ok(output);
    }
    let stderr = output.stderr_lossy();
    bail!(
        "something went wrong while {what} (`{rendered}` exited with code {}).\nReview the output: {}",
        output.code(),
        stderr.trim()
    );
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_stderr() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo out; echo err >&2"])
            .captured();
        let output = run(spec).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout_lossy(), "out\n");
        assert_eq!(output.stderr_lossy(), "err\n");
    }

    #[test]
    fn run_checked_reports_stderr() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .captured();
        let err = run_checked(&SystemRunner, spec, "testing").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("while testing"));
        assert!(message.contains("exited with code 3"));
        assert!(message.contains("broken"));
    }

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("sudo").args(["umount", "/tmp/sdcard_img_p1"]);
        assert_eq!(spec.display(), "sudo umount /tmp/sdcard_img_p1");
    }
}
