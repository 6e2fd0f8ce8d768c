//! Terminal-facing collaborators: notices on stderr and yes/no prompts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use greeter_core::Notice;
use greeter_engine::{Confirm, LogNotifier, Notifier};
use run_logging::run_warn;

/// Logs every notice and echoes it to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) {
        LogNotifier.notify(notice);
        eprintln!("{notice}");
    }
}

/// Asks on stdin unless `assume_yes` is set.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PromptConfirm {
    pub assume_yes: bool,
}

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let question = question.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            write!(stderr, "{question} [y/N] ")?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(err)) => {
                run_warn!("Could not read answer: {}", err);
                false
            }
            Err(err) => {
                run_warn!("Prompt task failed: {}", err);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
