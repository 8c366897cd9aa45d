use std::cell::RefCell;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use anyhow::Result;

use super::process::{CommandOutput, CommandRunner, CommandSpec};

pub struct Response {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Response {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Records every spawned command and answers with a scripted response.
pub struct FakeRunner {
    calls: RefCell<Vec<CommandSpec>>,
    respond: Box<dyn Fn(&CommandSpec) -> Response>,
}

impl FakeRunner {
    pub fn new(respond: impl Fn(&CommandSpec) -> Response + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|_| Response::ok(""))
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let response = (self.respond)(&spec);
        self.calls.borrow_mut().push(spec);
        Ok(CommandOutput {
            status: ExitStatus::from_raw(response.code << 8),
            stdout: Some(response.stdout.into_bytes()),
            stderr: Some(response.stderr.into_bytes()),
        })
    }
}
