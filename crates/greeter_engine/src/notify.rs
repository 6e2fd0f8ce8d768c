use async_trait::async_trait;
use greeter_core::Notice;
use run_logging::{run_error, run_info, run_warn};

/// Where user-visible notices go.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Sends notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::Completed { .. } => run_info!("{}", notice),
            Notice::Aborted(_) => run_error!("{}", notice),
            _ => run_warn!("{}", notice),
        }
    }
}

/// Yes/no question put to the user.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, question: &str) -> bool;
}

/// Answers every question the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, question: &str) -> bool {
        run_info!("{} -> {}", question, if self.0 { "yes" } else { "no" });
        self.0
    }
}
