//! Seams to the rendering layer, and the escaping shared by HTML fragments.

use futures::future::BoxFuture;

use crate::judge::model::Tally;

/// Controls of the slider judging page the core drives.
pub trait JudgeView: Send {
    /// Show `message` in the inline status area; `is_error` styles it as a failure.
    fn set_status(&mut self, message: &str, is_error: bool);
    /// Disable or re-enable the submit control.
    fn set_submit_locked(&mut self, locked: bool);
    fn focus_judge_name(&mut self);
    /// Ask the judge to confirm; resolves to `false` when declined.
    fn confirm(&mut self, message: &str) -> BoxFuture<'static, bool>;
    /// Reload the served view from the server of record.
    fn reload(&mut self);
    /// Repaint per-category points, totals and the leader line.
    fn show_tally(&mut self, _tally: &Tally, _headline: &str) {}
}

/// Page-level facts and actions a background poller needs.
pub trait PageHost: Send + Sync {
    /// Whether the page is currently in a background tab.
    fn is_hidden(&self) -> bool {
        false
    }
    fn reload(&self);
}

/// Minimal escaping for text interpolated into HTML fragments.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
