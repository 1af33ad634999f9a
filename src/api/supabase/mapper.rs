use chrono::{DateTime, SecondsFormat, Utc};

use super::types::{NewTradeRow, ProfileRow, TradePatchRow, TradeRow};
use crate::api::error::ApiError;
use crate::models::{Profile, Trade, TradeDraft, TradePatch, TradeStatus};

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Parse(format!("Invalid timestamp '{}': {}", value, e)))
}

/// RFC 3339 with a `Z` suffix, the format the backend stores and the only
/// one safe to embed in query strings.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Map a trades-table row to the domain model. Null numeric columns
/// degrade to 0 rather than failing the whole listing.
pub fn map_row_to_trade(row: &TradeRow) -> Result<Trade, ApiError> {
    let status = TradeStatus::parse(&row.status)
        .ok_or_else(|| ApiError::Parse(format!("Unknown trade status '{}'", row.status)))?;

    Ok(Trade {
        id: row.id,
        user_id: row.user_id.clone(),
        pair: row.pair.clone(),
        open_price: row.op,
        stop_loss: row.sl.unwrap_or(0.0),
        final_target: row.ft.unwrap_or(0.0),
        img_before: row.img_before.clone().unwrap_or_default(),
        img_after: row.img_after.clone().unwrap_or_default(),
        status,
        result: row.result.unwrap_or(0.0),
        risk_usd: row.risk_usd,
        open_date: parse_timestamp(&row.open_date)?,
        close_date: row.close_date.as_deref().map(parse_timestamp).transpose()?,
    })
}

pub fn map_draft_to_row(draft: &TradeDraft) -> NewTradeRow {
    NewTradeRow {
        user_id: draft.user_id.clone(),
        pair: draft.pair.clone(),
        op: draft.open_price,
        sl: draft.stop_loss,
        ft: draft.final_target,
        img_before: draft.img_before.clone(),
        img_after: draft.img_after.clone(),
        status: draft.status.as_str().to_string(),
        result: draft.result,
        risk_usd: draft.risk_usd,
        open_date: format_timestamp(draft.open_date),
    }
}

pub fn map_patch_to_row(patch: &TradePatch) -> TradePatchRow {
    TradePatchRow {
        status: patch.status.as_str().to_string(),
        result: patch.result,
        img_after: patch.img_after.clone(),
        close_date: patch.close_date.map(format_timestamp),
    }
}

pub fn map_row_to_profile(row: &ProfileRow) -> Profile {
    Profile {
        initial_balance: row.initial_balance.unwrap_or(0.0),
        risk_percent: row.risk_per_trade_percent.unwrap_or(1.0),
        pair_prefix: row.pair_prefix.clone().unwrap_or_default(),
        pair_suffix: row.pair_suffix.clone().unwrap_or_default(),
    }
}

pub fn map_profile_to_row(owner: &str, profile: &Profile, updated_at: DateTime<Utc>) -> ProfileRow {
    ProfileRow {
        id: owner.to_string(),
        initial_balance: Some(profile.initial_balance),
        risk_per_trade_percent: Some(profile.risk_percent),
        pair_prefix: Some(profile.pair_prefix.clone()),
        pair_suffix: Some(profile.pair_suffix.clone()),
        updated_at: Some(format_timestamp(updated_at)),
    }
}
