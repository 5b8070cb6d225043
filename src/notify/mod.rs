//! Alert notifiers
//!
//! A notifier is a fire-and-forget side effect played when a detection cycle
//! raises at least one alert. Implementations swallow their own failures:
//! they log and return, and never affect alert state.

use crate::config::{NotifierConfig, NotifierKind};
use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::runtime::Handle;

/// Side effect fired once per detection cycle that raised alerts
pub trait Notifier: Send + Sync {
    /// Play the alert. Must not block and must not panic.
    fn play_alert(&self);
}

/// Does nothing; for tests and headless runs
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn play_alert(&self) {}
}

/// Emits a log line instead of a sound
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn play_alert(&self) {
        tracing::info!("Alert raised");
    }
}

/// Rings the terminal bell on stderr
#[derive(Debug, Default)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn play_alert(&self) {
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            tracing::warn!(error = %e, "Failed to ring terminal bell");
        }
    }
}

/// Spawns an external program, e.g. a sound player
///
/// The child is awaited on a tokio task so the caller never blocks. Outside a
/// runtime the alert is skipped with a warning.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Notifier for CommandNotifier {
    fn play_alert(&self) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "No runtime for alert command");
                return;
            }
        };
        // child reaping registers with the runtime's driver
        let _guard = handle.enter();

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "Failed to spawn alert command");
                return;
            }
        };

        let program = self.program.clone();
        handle.spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::warn!(program = %program, %status, "Alert command failed");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(program = %program, error = %e, "Failed to wait on alert command"),
            }
        });
    }
}

/// Build the notifier selected in config
pub fn from_config(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match config.kind {
        NotifierKind::None => Arc::new(NoopNotifier),
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Bell => Arc::new(BellNotifier),
        NotifierKind::Command => match &config.command {
            Some(program) => Arc::new(CommandNotifier::new(program, config.args.clone())),
            None => {
                tracing::warn!("Notifier kind is \"command\" but no command is set, logging instead");
                Arc::new(LogNotifier)
            }
        },
    }
}
