use async_trait::async_trait;

use wavecrew_core::workflow::ApprovalUi;

/// Yes/no prompts on the controlling terminal. Without a TTY on stdin the
/// workflow treats the session as non-interactive.
pub struct TerminalApproval {
    interactive: bool,
}

impl TerminalApproval {
    pub fn detect() -> Self {
        Self {
            interactive: atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stderr),
        }
    }
}

#[async_trait]
impl ApprovalUi for TerminalApproval {
    fn has_ui(&self) -> bool {
        self.interactive
    }

    async fn confirm(&self, title: &str, detail: &str) -> bool {
        let title = title.to_string();
        let detail = detail.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            eprintln!("{detail}");
            inquire::Confirm::new(&title).with_default(false).prompt()
        })
        .await;

        match answer {
            Ok(Ok(yes)) => yes,
            Ok(Err(e)) => {
                tracing::warn!(error.kind = "ui.prompt", error.message = %e, "approval prompt failed");
                false
            }
            Err(e) => {
                tracing::warn!(error.kind = "ui.join", error.message = %e);
                false
            }
        }
    }
}
