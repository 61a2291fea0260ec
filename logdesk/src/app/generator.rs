use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use logdesk_core::config::GeneratorConfig;
use logdesk_core::generator::{self, LogTemplate, Preset, RunSettings};
use logdesk_core::LogLevel;

use super::*;

/// Editable generator form fields, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenField {
    Service,
    Host,
    Level,
    Message,
    StackTrace,
    Repeat,
    Delay,
}

impl GenField {
    pub const ALL: [GenField; 7] = [
        GenField::Service,
        GenField::Host,
        GenField::Level,
        GenField::Message,
        GenField::StackTrace,
        GenField::Repeat,
        GenField::Delay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GenField::Service => "Service",
            GenField::Host => "Host",
            GenField::Level => "Level",
            GenField::Message => "Message",
            GenField::StackTrace => "Stack trace",
            GenField::Repeat => "Repeat",
            GenField::Delay => "Delay (ms)",
        }
    }
}

pub struct GeneratorState {
    pub template: LogTemplate,
    pub repeat: u32,
    pub delay_ms: u64,
    /// Index into [`GenField::ALL`]
    pub selected: usize,
    pub preset: Option<Preset>,
    /// Logs sent by the current run
    pub progress: Arc<AtomicU32>,
    pub total: u32,
    pub last_summary: Option<String>,
    cancel: Arc<AtomicBool>,
}

impl GeneratorState {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            template: LogTemplate::default(),
            repeat: 1,
            delay_ms: config.delay_ms,
            selected: 0,
            preset: None,
            progress: Arc::new(AtomicU32::new(0)),
            total: 0,
            last_summary: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn selected_field(&self) -> GenField {
        GenField::ALL[self.selected.min(GenField::ALL.len() - 1)]
    }

    /// Display value of a form field.
    pub fn value(&self, field: GenField) -> String {
        match field {
            GenField::Service => self.template.service_name.clone(),
            GenField::Host => self.template.host_name.clone(),
            GenField::Level => match &self.template.log_level {
                Some(level) => level.to_string(),
                None => "(server infers)".to_string(),
            },
            GenField::Message => self.template.message.clone(),
            GenField::StackTrace => self.template.stack_trace.clone(),
            GenField::Repeat => self.repeat.to_string(),
            GenField::Delay => self.delay_ms.to_string(),
        }
    }

    pub fn sent(&self) -> u32 {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        self.template = preset.template();
        self.preset = Some(preset);
    }
}

impl App {
    // ========== Generator Methods ==========

    pub fn generator_running(&self) -> bool {
        self.is_loading(Channel::Generator)
    }

    pub(super) fn set_generator_field(&mut self, field: GenField, value: String) {
        let limits = self.config.generator.clone();
        let state = &mut self.generator;
        match field {
            GenField::Service => state.template.service_name = value.trim().to_string(),
            GenField::Host => state.template.host_name = value.trim().to_string(),
            GenField::Message => state.template.message = value,
            GenField::StackTrace => state.template.stack_trace = value,
            GenField::Level => {
                state.template.log_level = value.trim().parse::<LogLevel>().ok()
            }
            GenField::Repeat => match value.trim().parse::<u32>() {
                Ok(n) => state.repeat = RunSettings::clamped(n, 0, &limits).repeat,
                Err(_) => {
                    self.flash_error(format!("Repeat must be a number (1-{})", limits.max_repeat))
                }
            },
            GenField::Delay => match value.trim().parse::<u64>() {
                Ok(ms) => state.delay_ms = ms.min(limits.max_delay_ms),
                Err(_) => {
                    self.flash_error(format!("Delay must be a number (0-{})", limits.max_delay_ms))
                }
            },
        }
        if field != GenField::Repeat && field != GenField::Delay {
            self.generator.preset = None;
        }
    }

    /// Handle keyboard input on the generator tab.
    pub(super) fn handle_generator_key(&mut self, key: KeyEvent) {
        if self.generator_running() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('c') => {
                    self.generator.cancel.store(true, Ordering::Relaxed);
                    self.flash_info("Cancelling...");
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }
        if self.handle_global_key(key) {
            return;
        }

        let len = GenField::ALL.len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.generator.selected = (self.generator.selected + 1).min(len - 1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.generator.selected = self.generator.selected.saturating_sub(1)
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                let field = self.generator.selected_field();
                if field == GenField::Level {
                    self.generator.template.log_level = cycle_filter(
                        self.generator.template.log_level.as_ref(),
                        &LogLevel::all(),
                    );
                    self.generator.preset = None;
                } else {
                    let current = self.generator.value(field);
                    self.open_prompt(Field::Generator(field), &current);
                }
            }
            KeyCode::Char('p') => {
                let next = match self.generator.preset {
                    None => Preset::ALL[0],
                    Some(p) => {
                        let idx = Preset::ALL.iter().position(|x| *x == p).unwrap_or(0);
                        Preset::ALL[(idx + 1) % Preset::ALL.len()]
                    }
                };
                self.generator.apply_preset(next);
            }
            KeyCode::Char('x') => {
                self.generator.template = LogTemplate::default();
                self.generator.preset = None;
            }
            KeyCode::Char('r') => self.start_generator(),
            _ => {}
        }
    }

    fn start_generator(&mut self) {
        if self.generator.template.message.trim().is_empty() {
            self.flash_error("Message is empty");
            return;
        }
        let settings = RunSettings::clamped(
            self.generator.repeat,
            self.generator.delay_ms,
            &self.config.generator,
        );
        let template = self.generator.template.clone();
        let progress = Arc::clone(&self.generator.progress);
        let cancel = Arc::clone(&self.generator.cancel);
        progress.store(0, Ordering::Relaxed);
        cancel.store(false, Ordering::Relaxed);
        self.generator.total = settings.repeat;
        self.generator.last_summary = None;

        self.submit(Channel::Generator, move |api| async move {
            let report = generator::run(
                api.as_ref(),
                &template,
                settings,
                Some(cancel.as_ref()),
                |p| progress.store(p.sent, Ordering::Relaxed),
            )
            .await;
            Reply::Generator(report)
        });
    }

    pub(super) fn apply_generator(&mut self, report: RunReport) {
        let summary = report.summary();
        if report.failure.is_some() {
            self.flash_error(summary.clone());
        } else {
            self.flash_info(summary.clone());
        }
        self.generator.progress.store(report.sent, Ordering::Relaxed);
        self.generator.last_summary = Some(summary);
    }
}
