use chrono::{DateTime, Utc};

use super::error::JournalError;
use super::stats;
use crate::models::{Profile, TradeDraft, TradePatch, TradeStatus};

/// Status a freshly logged position starts in.
pub const DEFAULT_OPEN_STATUS: TradeStatus = TradeStatus::Running;

/// Raw form input for a new position. Numeric fields stay text here; the
/// engine owns the parsing rules.
#[derive(Debug, Clone, Default)]
pub struct NewTradeForm {
    pub pair: String,
    pub open_price: String,
    pub stop_loss: String,
    pub final_target: String,
    pub img_before: String,
    pub img_after: String,
}

/// Requested status transition for an existing position.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: TradeStatus,
    pub result: f64,
    /// Replacement after-chart link; `None` keeps the stored one.
    pub img_after: Option<String>,
    /// User-picked close date; `None` lets the engine decide.
    pub close_date: Option<DateTime<Utc>>,
}

/// What the caller must persist after a status change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeDirective {
    /// Write the patch back to the store.
    Update(TradePatch),
    /// First delete request: nothing was touched, ask the user to confirm.
    ConfirmDelete,
    /// Confirmed delete: remove the row.
    Delete,
}

/// Lenient numeric parsing for form fields: empty or malformed text
/// degrades to 0 instead of rejecting the submission.
pub fn parse_numeric(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Validate a new-position form and produce the insert payload.
///
/// The risk snapshot is sized off the caller-supplied realized balance,
/// frozen here and never recomputed.
pub fn build_trade(
    form: &NewTradeForm,
    profile: &Profile,
    realized_balance: f64,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<TradeDraft, JournalError> {
    let pair = form.pair.trim().to_uppercase();
    if pair.is_empty() {
        return Err(JournalError::Validation("Pair is required".to_string()));
    }
    if form.open_price.trim().is_empty() {
        return Err(JournalError::Validation(
            "Open price is required".to_string(),
        ));
    }
    if profile.initial_balance <= 0.0 {
        return Err(JournalError::Configuration(
            "Set an initial balance before logging positions".to_string(),
        ));
    }

    Ok(TradeDraft {
        user_id: user_id.to_string(),
        pair,
        open_price: parse_numeric(&form.open_price),
        stop_loss: parse_numeric(&form.stop_loss),
        final_target: parse_numeric(&form.final_target),
        img_before: form.img_before.trim().to_string(),
        img_after: form.img_after.trim().to_string(),
        status: DEFAULT_OPEN_STATUS,
        result: 0.0,
        risk_usd: stats::next_trade_risk(realized_balance, profile.risk_percent),
        open_date: now,
    })
}

/// Decide what a requested status change does to the row. Pure; the caller
/// persists the directive.
///
/// Deletion is never performed on the first request: the caller gets
/// `ConfirmDelete` back and must repeat the call with `confirmed` set.
pub fn apply_status_change(
    change: &StatusChange,
    confirmed: bool,
    now: DateTime<Utc>,
) -> ChangeDirective {
    if change.status == TradeStatus::Delete {
        return if confirmed {
            ChangeDirective::Delete
        } else {
            ChangeDirective::ConfirmDelete
        };
    }

    // Closing auto-stamps today; every other status clears the close date
    // unless the user picked one explicitly.
    let close_date = match change.status {
        TradeStatus::Closed | TradeStatus::Done => Some(change.close_date.unwrap_or(now)),
        _ => change.close_date,
    };

    let result = if change.result.is_finite() {
        change.result
    } else {
        0.0
    };

    ChangeDirective::Update(TradePatch {
        status: change.status,
        result,
        img_after: change.img_after.clone(),
        close_date,
    })
}
