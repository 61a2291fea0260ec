//! Synthetic log generator
//!
//! Sends one log template to `POST /logs` a configurable number of times,
//! reporting progress after each send and stopping at the first failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::api::ConsoleApi;
use crate::config::GeneratorConfig;
use crate::error::Error;
use crate::types::{CollectLogRequest, LogLevel};

/// Label for a message the level cannot be inferred from.
pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

/// Canned incidents for quick demos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Db,
    Payment,
    Oom,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Db, Preset::Payment, Preset::Oom];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Db => "DB",
            Preset::Payment => "PAYMENT",
            Preset::Oom => "OOM",
        }
    }

    pub fn template(self) -> LogTemplate {
        let (service, level, message, stack_trace, host) = match self {
            Preset::Db => (
                "Order-Service",
                LogLevel::Error,
                "ERROR: ConnectionRefused - Database connection pool exhaustion.",
                "java.sql.SQLException: Connection refused at com.zaxxer.hikari.pool.HikariPool...",
                "db-master-01",
            ),
            Preset::Payment => (
                "Payment-Gateway",
                LogLevel::Fatal,
                "FATAL: Payment Gateway Timeout (504) - Critical failure.",
                "com.payment.gateway.TimeoutException: No response from provider...",
                "payment-api-02",
            ),
            Preset::Oom => (
                "Analytics-Service",
                LogLevel::Critical,
                "CRITICAL: java.lang.OutOfMemoryError: Java heap space",
                "java.lang.OutOfMemoryError: Java heap space at java.util.Arrays.copyOf...",
                "worker-node-05",
            ),
        };
        LogTemplate {
            service_name: service.to_string(),
            host_name: host.to_string(),
            log_level: Some(level),
            message: message.to_string(),
            stack_trace: stack_trace.to_string(),
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown preset: {} (expected DB, PAYMENT or OOM)", s))
    }
}

/// The log the generator sends.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTemplate {
    pub service_name: String,
    pub host_name: String,
    /// `None` lets the server infer the level from the message
    pub log_level: Option<LogLevel>,
    pub message: String,
    pub stack_trace: String,
}

impl Default for LogTemplate {
    fn default() -> Self {
        Self {
            service_name: "Payment-Service".to_string(),
            host_name: "prod-db-01".to_string(),
            log_level: None,
            message: String::new(),
            stack_trace: String::new(),
        }
    }
}

impl LogTemplate {
    /// The level the server will record: the explicit one, else a guess.
    pub fn predicted_level(&self) -> String {
        match &self.log_level {
            Some(level) => level.to_string(),
            None => level_label(infer_level(&self.message).as_ref()).to_string(),
        }
    }

    pub fn to_request(&self) -> CollectLogRequest {
        CollectLogRequest {
            service_name: self.service_name.trim().to_string(),
            host_name: non_blank(&self.host_name),
            log_level: self.log_level.clone(),
            message: self.message.clone(),
            stack_trace: non_blank(&self.stack_trace),
            occurred_time: None,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Guess a level from message keywords, most severe first.
///
/// Blank messages have no level.
pub fn infer_level(message: &str) -> Option<LogLevel> {
    if message.trim().is_empty() {
        return None;
    }
    let upper = message.to_uppercase();
    let level = if upper.contains("FATAL") {
        LogLevel::Fatal
    } else if upper.contains("CRITICAL") {
        LogLevel::Critical
    } else if upper.contains("ERROR") || upper.contains("EXCEPTION") {
        LogLevel::Error
    } else if upper.contains("WARN") {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };
    Some(level)
}

pub fn level_label(level: Option<&LogLevel>) -> &str {
    level.map(LogLevel::as_str).unwrap_or(UNKNOWN_LEVEL)
}

/// How many logs to send and how fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub repeat: u32,
    pub delay: Duration,
}

impl RunSettings {
    /// Clamp user input into `1..=max_repeat` and `0..=max_delay_ms`.
    pub fn clamped(repeat: u32, delay_ms: u64, limits: &GeneratorConfig) -> Self {
        Self {
            repeat: repeat.clamp(1, limits.max_repeat.max(1)),
            delay: Duration::from_millis(delay_ms.min(limits.max_delay_ms)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub sent: u32,
    pub total: u32,
}

impl Progress {
    /// Rounded completion percentage.
    pub fn percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        ((f64::from(self.sent) / f64::from(self.total)) * 100.0).round() as u16
    }
}

/// Outcome of a generator run.
#[derive(Debug)]
pub struct RunReport {
    pub sent: u32,
    pub total: u32,
    /// The error that stopped the run early
    pub failure: Option<Error>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && !self.cancelled && self.sent == self.total
    }

    /// One-line summary for the operator.
    pub fn summary(&self) -> String {
        match (&self.failure, self.cancelled) {
            (Some(err), _) => format!(
                "send failed after {}/{}: {}",
                self.sent,
                self.total,
                err.user_message()
            ),
            (None, true) => format!("cancelled after {}/{}", self.sent, self.total),
            (None, false) => format!("{} logs sent", self.sent),
        }
    }
}

/// Send `template` `settings.repeat` times, sequentially.
///
/// `on_progress` runs after every successful send. Setting `cancel` stops
/// the run before the next send.
pub async fn run<P>(
    api: &dyn ConsoleApi,
    template: &LogTemplate,
    settings: RunSettings,
    cancel: Option<&AtomicBool>,
    mut on_progress: P,
) -> RunReport
where
    P: FnMut(Progress) + Send,
{
    let request = template.to_request();
    let total = settings.repeat;
    let mut sent = 0;

    tracing::info!(
        service = %request.service_name,
        total,
        delay_ms = settings.delay.as_millis() as u64,
        "Generator run started"
    );

    while sent < total {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            tracing::info!(sent, total, "Generator run cancelled");
            return RunReport {
                sent,
                total,
                failure: None,
                cancelled: true,
            };
        }

        if let Err(err) = api.collect_log(&request).await {
            tracing::warn!(sent, total, error = %err, "Generator run stopped");
            return RunReport {
                sent,
                total,
                failure: Some(err),
                cancelled: false,
            };
        }

        sent += 1;
        on_progress(Progress { sent, total });

        if sent < total && !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }
    }

    tracing::info!(sent, "Generator run finished");
    RunReport {
        sent,
        total,
        failure: None,
        cancelled: false,
    }
}
