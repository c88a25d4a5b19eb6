//! Scripted [`CommandRunner`] for tests.
//!
//! Enabled with the `test-util` feature. Responses are registered against a
//! substring of the rendered command line; the most recently registered
//! matching rule wins and unmatched commands succeed with empty output.

use std::io;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{VtoolError, VtoolResult};
use crate::exec::{CommandLine, CommandRunner, ExecResult};

#[derive(Debug, Clone)]
enum Response {
    Exit(ExecResult),
    SpawnError,
}

/// Runner that replays canned results and records every invocation.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, Response)>>,
    calls: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responds to commands containing `pattern` with `result`.
    pub fn on(&self, pattern: &str, result: ExecResult) -> &Self {
        self.rules
            .lock()
            .expect("runner lock poisoned")
            .push((pattern.to_string(), Response::Exit(result)));
        self
    }

    /// Makes commands containing `pattern` fail to start.
    pub fn on_spawn_error(&self, pattern: &str) -> &Self {
        self.rules
            .lock()
            .expect("runner lock poisoned")
            .push((pattern.to_string(), Response::SpawnError));
        self
    }

    /// Rendered command lines seen so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("runner lock poisoned")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Raw invocations seen so far, in order.
    pub fn invocations(&self) -> Vec<CommandLine> {
        self.calls.lock().expect("runner lock poisoned").clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, cmd: &CommandLine) -> VtoolResult<ExecResult> {
        self.calls
            .lock()
            .expect("runner lock poisoned")
            .push(cmd.clone());

        let rendered = cmd.to_string();
        let response = self
            .rules
            .lock()
            .expect("runner lock poisoned")
            .iter()
            .rev()
            .find(|(pattern, _)| rendered.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());

        match response {
            Some(Response::Exit(result)) => Ok(result),
            Some(Response::SpawnError) => Err(VtoolError::CommandSpawn {
                command: rendered,
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
            None => Ok(ExecResult::default()),
        }
    }
}

/// A successful result with the given stdout.
pub fn ok(stdout: &str) -> ExecResult {
    ExecResult {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// A failed result with the given exit code and stderr.
pub fn fail(exit_code: i32, stderr: &str) -> ExecResult {
    ExecResult {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
