//! Diagnostic log lines emitted while waiting for readiness

mod common;

use common::{RecordingSleeper, ScriptedRunner, ok, status_ready};
use knl_provision::{CapmcCommand, PollConfig, ProvisionError, wait_until_ready};
use log::{LevelFilter, Log, Metadata, Record};
use rstest::rstest;
use serial_test::serial;
use std::sync::{Mutex, OnceLock};

struct CaptureLogger;

static LOGS: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
static LOGGER: CaptureLogger = CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Some(logs) = LOGS.get() {
            logs.lock().unwrap().push(format!("{}", record.args()));
        }
    }

    fn flush(&self) {}
}

fn init_logger() -> &'static Mutex<Vec<String>> {
    let logs = LOGS.get_or_init(|| Mutex::new(Vec::new()));
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Debug);
    logs.lock().unwrap().clear();
    logs
}

fn poll_config(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        interval_secs: 0,
        reboot_failure_code: 211,
    }
}

#[rstest]
#[serial]
fn test_undecodable_status_payload_is_logged() {
    let logs = init_logger();
    let runner = ScriptedRunner::new().reply("node_status", ok("<html>maintenance</html>\n"));
    let sleeper = RecordingSleeper::default();
    let cmd = CapmcCommand::node_status("capmc", 12);

    let err = wait_until_ready(&runner, &sleeper, &cmd, 12, &poll_config(3)).unwrap_err();

    assert!(matches!(err, ProvisionError::Decode { .. }));
    let logs = logs.lock().unwrap();
    assert!(
        logs.iter()
            .any(|line| line == "poll_cnt: 0 node_status: <html>maintenance</html>"),
        "captured: {:?}",
        *logs
    );
}

#[rstest]
#[serial]
fn test_every_poll_payload_is_logged() {
    let logs = init_logger();
    let runner = ScriptedRunner::new()
        .reply("node_status", ok(r#"{"e":0,"err_msg":"","off":[12]}"#))
        .reply("node_status", status_ready(&[12]));
    let sleeper = RecordingSleeper::default();
    let cmd = CapmcCommand::node_status("capmc", 12);

    let state = wait_until_ready(&runner, &sleeper, &cmd, 12, &poll_config(5)).unwrap();

    assert!(state.ready);
    let logs = logs.lock().unwrap();
    let polls: Vec<&String> = logs
        .iter()
        .filter(|line| line.starts_with("poll_cnt: "))
        .collect();
    assert_eq!(polls.len(), 2);
    assert_eq!(polls[0], r#"poll_cnt: 0 node_status: {"e":0,"err_msg":"","off":[12]}"#);
    assert!(polls[1].starts_with("poll_cnt: 1 node_status: "));
    assert!(logs.iter().any(|line| line == "Node 12 was successfully powered on"));
}
