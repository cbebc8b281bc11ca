//! UI output channel
//!
//! Nothing here touches a DOM. Notifications and state changes are turned
//! into [`RenderInstruction`]s by pure functions in [`render`] and handed
//! to a [`RenderSink`], which the host applies to the page (or prints, in
//! the CLI).

pub mod notifier;
pub mod render;
mod sink;

pub use notifier::UiNotifier;
pub use sink::{JsonLinesSink, LogSink, RecordingSink};

use serde::Serialize;
use uuid::Uuid;

/// Element identifiers produced by the templating layer
pub mod selectors {
    pub const ALERTS_CONTAINER: &str = "#alerts-container";
    pub const USER_ACCOUNT: &str = ".user-account";
    pub const BLOCKCHAIN_FEATURE: &str = ".blockchain-feature";
    pub const VOTE_BUTTON: &str = ".vote-btn";
    pub const VOTING_STATUS: &str = "[data-voting-status]";
    pub const COUNTDOWN: &str = "#countdown";

    pub fn candidate_card(candidate_id: u64) -> String {
        format!("#candidate-{}", candidate_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// CSS modifier used by the stylesheet (`alert-{class}`)
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A DOM update for the host to apply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderInstruction {
    /// Append a banner to `target`
    AppendAlert {
        target: String,
        id: Uuid,
        severity: Severity,
        html: String,
        persistent: bool,
    },
    /// Start the banner's fade-out animation
    FadeOutAlert {
        id: Uuid,
        animation: String,
        duration_ms: u64,
    },
    /// Remove the banner from the DOM
    RemoveAlert { id: Uuid },
    /// Set the text (and optional title) of every element matching `target`
    SetText {
        target: String,
        text: String,
        title: Option<String>,
    },
    /// Show or hide every element matching `target`
    SetVisible { target: String, visible: bool },
    /// Replace text and class of a status badge
    SetBadge {
        target: String,
        text: String,
        class: String,
    },
    /// Grey out a candidate card and disable its vote button
    MarkVoted {
        card: String,
        button: String,
        opacity: f32,
        button_text: String,
    },
    /// Drop any eligibility state shown for the previous account
    ClearEligibility,
    /// Discard all derived state and reload the page
    Reload,
}

/// Receives render instructions
pub trait RenderSink: Send + Sync {
    fn apply(&self, instruction: RenderInstruction);
}
