use logdesk_core::checks;

use super::*;

#[derive(Default)]
pub struct CheckState {
    pub report: Option<CheckReport>,
}

impl App {
    // ========== System Check Methods ==========

    pub(super) fn run_check(&mut self) {
        self.submit(Channel::Check, |api| async move {
            Reply::Check(checks::run_checks(api.as_ref()).await)
        });
    }

    pub(super) fn apply_check(&mut self, report: CheckReport) {
        if report.all_passed() {
            self.flash_info("System check passed");
        } else {
            self.flash_error(format!("System check: {} failed", report.failed()));
        }
        self.check.report = Some(report);
    }

    /// Handle keyboard input on the system check tab.
    pub(super) fn handle_check_key(&mut self, key: KeyEvent) {
        if self.handle_global_key(key) {
            return;
        }
        if matches!(key.code, KeyCode::Char('r') | KeyCode::Enter)
            && !self.is_loading(Channel::Check)
        {
            self.run_check();
        }
    }
}
