#![allow(dead_code)]

use knl_provision::{
    CapmcCommand, CommandOutput, CommandRunner, HookEvent, ProvisionError, Sleeper,
};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUCCESS: &str = r#"{"e":0,"err_msg":"Success"}"#;

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        return_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(return_code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        return_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub fn status_ready(nids: &[u64]) -> CommandOutput {
    ok(&serde_json::json!({ "e": 0, "err_msg": "", "ready": nids }).to_string())
}

pub fn status_without_ready() -> CommandOutput {
    ok(r#"{"e":0,"err_msg":"","on":[],"off":[]}"#)
}

/// In-memory capmc: replies are queued per subcommand and every call is recorded.
///
/// Subcommands with an empty queue answer with their fallback, or `SUCCESS`.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: RefCell<HashMap<String, VecDeque<CommandOutput>>>,
    fallback: RefCell<HashMap<String, CommandOutput>>,
    spawn_errors: RefCell<HashMap<String, i32>>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, subcommand: &str, output: CommandOutput) -> Self {
        self.replies
            .borrow_mut()
            .entry(subcommand.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn always(self, subcommand: &str, output: CommandOutput) -> Self {
        self.fallback
            .borrow_mut()
            .insert(subcommand.to_string(), output);
        self
    }

    pub fn spawn_error(self, subcommand: &str, os_code: i32) -> Self {
        self.spawn_errors
            .borrow_mut()
            .insert(subcommand.to_string(), os_code);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, subcommand: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.split_whitespace().nth(1) == Some(subcommand))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CapmcCommand) -> Result<CommandOutput, ProvisionError> {
        self.calls.borrow_mut().push(command.to_string());
        let subcommand = command.args()[0].clone();

        if let Some(code) = self.spawn_errors.borrow().get(&subcommand) {
            return Err(ProvisionError::Spawn {
                command: command.to_string(),
                source: std::io::Error::from_raw_os_error(*code),
            });
        }

        if let Some(output) = self
            .replies
            .borrow_mut()
            .get_mut(&subcommand)
            .and_then(VecDeque::pop_front)
        {
            return Ok(output);
        }

        Ok(self
            .fallback
            .borrow()
            .get(&subcommand)
            .cloned()
            .unwrap_or_else(|| ok(SUCCESS)))
    }
}

/// Records requested sleeps instead of sleeping
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn count(&self) -> usize {
        self.sleeps.borrow().len()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

/// Scheduler stand-in that records every callback
#[derive(Debug, Default)]
pub struct RecordingEvent {
    pub accepted: Vec<i32>,
    pub rejected: Vec<(String, Option<i32>)>,
}

impl RecordingEvent {
    pub fn total_calls(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

impl HookEvent for RecordingEvent {
    fn accept(&mut self, code: i32) {
        self.accepted.push(code);
    }

    fn reject(&mut self, message: &str, code: Option<i32>) {
        self.rejected.push((message.to_string(), code));
    }
}

/// Write an executable shell script named `name` into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    {
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
