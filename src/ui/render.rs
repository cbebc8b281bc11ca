//! Pure rendering helpers

use super::{selectors, RenderInstruction, Severity};
use alloy::primitives::Address;
use chrono::Duration as ChronoDuration;
use uuid::Uuid;

pub const METAMASK_DOWNLOAD_URL: &str = "https://metamask.io/download.html";

/// Escape text for inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `0x1234...abcd`
pub fn format_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Banner markup with a close button
pub fn alert_html(severity: Severity, message: &str) -> String {
    format!(
        r#"<div class="alert alert-{}">{}<button type="button" class="close" onclick="this.parentElement.remove()">&times;</button></div>"#,
        severity.css_class(),
        escape_html(message)
    )
}

pub fn alert(id: Uuid, severity: Severity, message: &str, persistent: bool) -> RenderInstruction {
    RenderInstruction::AppendAlert {
        target: selectors::ALERTS_CONTAINER.to_string(),
        id,
        severity,
        html: alert_html(severity, message),
        persistent,
    }
}

pub fn provider_missing_html() -> String {
    format!(
        r#"<div class="alert alert-warning"><h4>MetaMask Required</h4><p>Please install MetaMask to use blockchain features.</p><a href="{}" target="_blank" class="btn btn-primary">Install MetaMask</a></div>"#,
        METAMASK_DOWNLOAD_URL
    )
}

pub fn registration_prompt_html() -> String {
    r#"<div class="alert alert-info"><h4>Complete Your Registration</h4><p>You need to register as a voter to participate in elections.</p><button onclick="showVoterRegistrationModal()" class="btn btn-success">Register as Voter</button></div>"#.to_string()
}

/// Account label plus revealing the wallet-only parts of the page
pub fn account_connected(address: &Address) -> Vec<RenderInstruction> {
    vec![
        RenderInstruction::SetText {
            target: selectors::USER_ACCOUNT.to_string(),
            text: format_address(address),
            title: Some(address.to_checksum(None)),
        },
        RenderInstruction::SetVisible {
            target: selectors::BLOCKCHAIN_FEATURE.to_string(),
            visible: true,
        },
    ]
}

pub fn account_disconnected() -> Vec<RenderInstruction> {
    vec![
        RenderInstruction::SetText {
            target: selectors::USER_ACCOUNT.to_string(),
            text: "Not connected".to_string(),
            title: None,
        },
        RenderInstruction::SetVisible {
            target: selectors::BLOCKCHAIN_FEATURE.to_string(),
            visible: false,
        },
    ]
}

pub fn mark_voted(candidate_id: u64) -> RenderInstruction {
    let card = selectors::candidate_card(candidate_id);
    RenderInstruction::MarkVoted {
        button: format!("{} {}", card, selectors::VOTE_BUTTON),
        card,
        opacity: 0.5,
        button_text: "Voted ✓".to_string(),
    }
}

pub fn voting_status(is_open: bool) -> RenderInstruction {
    let (text, class) = if is_open {
        ("🟢 Voting is OPEN", "badge badge-success")
    } else {
        ("🔴 Voting is CLOSED", "badge badge-danger")
    };
    RenderInstruction::SetBadge {
        target: selectors::VOTING_STATUS.to_string(),
        text: text.to_string(),
        class: class.to_string(),
    }
}

/// `{d}d {h}h {m}m {s}s`, or "Election Ended" once the target has passed
pub fn format_countdown(remaining: ChronoDuration) -> String {
    if remaining < ChronoDuration::zero() {
        return "Election Ended".to_string();
    }
    let total = remaining.num_seconds();
    format!(
        "{}d {}h {}m {}s",
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60
    )
}

pub fn countdown(remaining: ChronoDuration) -> RenderInstruction {
    RenderInstruction::SetText {
        target: selectors::COUNTDOWN.to_string(),
        text: format_countdown(remaining),
        title: None,
    }
}
