//! Render sinks

use super::{RenderInstruction, RenderSink};
use std::io::Write;
use std::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Keeps every instruction with the time it was applied
#[derive(Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<(Instant, RenderInstruction)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> Vec<RenderInstruction> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|(_, i)| i.clone())
            .collect()
    }

    /// HTML of every banner appended so far
    pub fn alerts(&self) -> Vec<String> {
        self.instructions()
            .into_iter()
            .filter_map(|i| match i {
                RenderInstruction::AppendAlert { html, .. } => Some(html),
                _ => None,
            })
            .collect()
    }

    /// When the banner was removed, if it has been
    pub fn removed_at(&self, id: Uuid) -> Option<Instant> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .find_map(|(at, i)| match i {
                RenderInstruction::RemoveAlert { id: removed } if *removed == id => Some(*at),
                _ => None,
            })
    }

    pub fn clear(&self) {
        self.applied.lock().unwrap().clear();
    }
}

impl RenderSink for RecordingSink {
    fn apply(&self, instruction: RenderInstruction) {
        self.applied
            .lock()
            .unwrap()
            .push((Instant::now(), instruction));
    }
}

/// Writes one JSON object per instruction to stdout, for a host page to consume
pub struct JsonLinesSink;

impl RenderSink for JsonLinesSink {
    fn apply(&self, instruction: RenderInstruction) {
        match serde_json::to_string(&instruction) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", line) {
                    tracing::warn!(error = %e, "Failed to write render instruction");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize render instruction"),
        }
    }
}

/// Reports banners and page updates through the log
pub struct LogSink;

impl RenderSink for LogSink {
    fn apply(&self, instruction: RenderInstruction) {
        match &instruction {
            RenderInstruction::AppendAlert { severity, html, .. } => {
                tracing::info!(severity = ?severity, "{}", strip_tags(html));
            }
            RenderInstruction::FadeOutAlert { .. } | RenderInstruction::RemoveAlert { .. } => {}
            other => tracing::debug!(instruction = ?other, "Render"),
        }
    }
}

/// Visible text of a banner, without the close button glyph
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&times;", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
