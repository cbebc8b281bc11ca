//! Transient banner notifier
//!
//! Every transient banner owns its own dismissal timer: after
//! `dismiss_after_ms` the banner starts fading out and is removed
//! `fade_out_ms` later. Banners never wait on each other.

use super::{render, RenderInstruction, RenderSink, Severity};
use crate::config::NotificationConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const FADE_OUT_ANIMATION: &str = "slideOut";

#[derive(Clone)]
pub struct UiNotifier {
    sink: Arc<dyn RenderSink>,
    timing: NotificationConfig,
}

impl UiNotifier {
    pub fn new(sink: Arc<dyn RenderSink>, timing: NotificationConfig) -> Self {
        Self { sink, timing }
    }

    /// Forward a render instruction unchanged
    pub fn render(&self, instruction: RenderInstruction) {
        self.sink.apply(instruction);
    }

    pub fn render_all(&self, instructions: impl IntoIterator<Item = RenderInstruction>) {
        for instruction in instructions {
            self.sink.apply(instruction);
        }
    }

    /// Show a banner that dismisses itself
    pub fn notify(&self, severity: Severity, message: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.sink.apply(render::alert(id, severity, message, false));
        self.schedule_dismissal(id);
        id
    }

    /// Like [`notify`](Self::notify), for prebuilt banner markup
    pub fn notify_html(&self, severity: Severity, html: String) -> Uuid {
        let id = self.append(severity, html, false);
        self.schedule_dismissal(id);
        id
    }

    /// Show a banner that stays until the page goes away
    pub fn notify_persistent(&self, severity: Severity, html: String) -> Uuid {
        self.append(severity, html, true)
    }

    pub fn success(&self, message: &str) -> Uuid {
        self.notify(Severity::Success, message)
    }

    pub fn warning(&self, message: &str) -> Uuid {
        self.notify(Severity::Warning, message)
    }

    pub fn error(&self, message: &str) -> Uuid {
        self.notify(Severity::Error, message)
    }

    fn append(&self, severity: Severity, html: String, persistent: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.sink.apply(RenderInstruction::AppendAlert {
            target: super::selectors::ALERTS_CONTAINER.to_string(),
            id,
            severity,
            html,
            persistent,
        });
        id
    }

    fn schedule_dismissal(&self, id: Uuid) {
        let sink = Arc::clone(&self.sink);
        let delay = Duration::from_millis(self.timing.dismiss_after_ms);
        let fade = Duration::from_millis(self.timing.fade_out_ms);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.apply(RenderInstruction::FadeOutAlert {
                id,
                animation: FADE_OUT_ANIMATION.to_string(),
                duration_ms: fade.as_millis() as u64,
            });
            tokio::time::sleep(fade).await;
            sink.apply(RenderInstruction::RemoveAlert { id });
        });
    }
}
