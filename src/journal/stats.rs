use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Profile, Trade};

/// Floating P&L over currently open positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSummary {
    pub count: usize,
    /// Net result in R across open positions.
    pub total_r: f64,
    /// Net result in currency, each position priced at its own frozen
    /// risk snapshot.
    pub total_usd: f64,
}

/// Aggregate numbers for one month of history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Wins over total, in percent; 0 when the month is empty.
    pub win_rate: f64,
    pub net_r: f64,
}

/// One point on the equity curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub label: String,
    pub balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
}

/// Equity curve plus period statistics for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Balance at the period start: initial balance plus everything
    /// realized before it.
    pub starting_balance: f64,
    pub current_balance: f64,
    pub growth_percent: f64,
    pub points: Vec<EquityPoint>,
    pub total_net_r: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
}

/// Coerce non-finite values to 0 so one bad row never poisons a sum.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn result_r(trade: &Trade) -> f64 {
    sanitize(trade.result)
}

/// Currency value of one R for a trade. Prefers the snapshot frozen at
/// open; legacy rows without one fall back to the *current* balance and
/// risk settings — an approximation inherited from the stored data, not a
/// historically accurate figure.
fn effective_risk(trade: &Trade, profile: &Profile) -> f64 {
    match trade.risk_usd {
        Some(risk) if risk.is_finite() && risk != 0.0 => risk,
        _ => profile.initial_balance * profile.risk_percent / 100.0,
    }
}

/// The date a completed trade counts under. Well-formed completed rows
/// always carry a close date; anything else counts under its open date.
fn event_date(trade: &Trade) -> DateTime<Utc> {
    trade.close_date.unwrap_or(trade.open_date)
}

/// Floating P&L across the given trades, counting only open statuses.
pub fn open_summary(trades: &[Trade]) -> OpenSummary {
    let open: Vec<&Trade> = trades.iter().filter(|t| t.status.is_open()).collect();

    OpenSummary {
        count: open.len(),
        total_r: open.iter().map(|t| result_r(t)).sum(),
        total_usd: open
            .iter()
            .map(|t| result_r(t) * sanitize(t.risk_usd.unwrap_or(0.0)))
            .sum(),
    }
}

/// Account balance counting only completed trades, each priced at its own
/// risk snapshot.
pub fn realized_balance(profile: &Profile, trades: &[Trade]) -> f64 {
    profile.initial_balance
        + trades
            .iter()
            .filter(|t| t.status.is_completed())
            .map(|t| result_r(t) * effective_risk(t, profile))
            .sum::<f64>()
}

/// Currency amount the next position should risk: sized off the latest
/// realized balance so risk compounds with the account.
pub fn next_trade_risk(realized_balance: f64, risk_percent: f64) -> f64 {
    realized_balance * risk_percent / 100.0
}

/// Table-footer stats for one month of history. Open positions count with
/// a result of 0, like the history view shows them.
pub fn month_summary(trades: &[Trade]) -> MonthSummary {
    let wins = trades.iter().filter(|t| result_r(t) > 0.0).count();
    let losses = trades.iter().filter(|t| result_r(t) < 0.0).count();
    let win_rate = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64 * 100.0
    };

    MonthSummary {
        total_trades: trades.len(),
        winning_trades: wins,
        losing_trades: losses,
        win_rate,
        net_r: trades.iter().map(result_r).sum(),
    }
}

/// Build the equity curve and period stats over completed trades.
///
/// Trades completed before `period_start` only move the starting balance;
/// trades inside the inclusive window each emit one curve point. With no
/// lower bound the whole history is the period.
pub fn performance_report(
    trades: &[Trade],
    profile: &Profile,
    period_start: Option<DateTime<Utc>>,
    period_end: DateTime<Utc>,
) -> PerformanceReport {
    let mut completed: Vec<&Trade> = trades.iter().filter(|t| t.status.is_completed()).collect();
    completed.sort_by_key(|t| event_date(t));

    let (before, within): (Vec<&Trade>, Vec<&Trade>) = match period_start {
        None => (Vec::new(), completed),
        Some(start) => {
            let mut before = Vec::new();
            let mut within = Vec::new();
            for trade in completed {
                let date = event_date(trade);
                if date < start {
                    before.push(trade);
                } else if date <= period_end {
                    within.push(trade);
                }
            }
            (before, within)
        }
    };

    let starting_balance = profile.initial_balance
        + before
            .iter()
            .map(|t| result_r(t) * effective_risk(t, profile))
            .sum::<f64>();

    let mut running_balance = starting_balance;
    let mut points = Vec::with_capacity(within.len() + 1);
    points.push(EquityPoint {
        label: "Start".to_string(),
        balance: starting_balance,
        result: None,
        pair: None,
    });

    for trade in &within {
        running_balance += result_r(trade) * effective_risk(trade, profile);
        points.push(EquityPoint {
            label: event_date(trade).format("%d %b").to_string(),
            balance: running_balance,
            result: Some(result_r(trade)),
            pair: Some(trade.pair.clone()),
        });
    }

    let wins = within.iter().filter(|t| result_r(t) > 0.0).count();
    let losses = within.iter().filter(|t| result_r(t) < 0.0).count();
    let total = within.len();
    let win_rate = if total > 0 {
        wins as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let growth_percent = if starting_balance != 0.0 {
        (running_balance - starting_balance) / starting_balance * 100.0
    } else {
        0.0
    };

    PerformanceReport {
        starting_balance,
        current_balance: running_balance,
        growth_percent,
        points,
        total_net_r: within.iter().map(|t| result_r(t)).sum(),
        total_trades: total,
        winning_trades: wins,
        losing_trades: losses,
        win_rate,
    }
}
