use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a journal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Unfill,
    Running,
    /// Final target changed / moved to breakeven; still an open position.
    Be,
    Closed,
    Done,
    /// Soft terminal state: the row is kept but hidden from every view.
    Cancel,
    /// Hard removal; only reachable through the confirmed delete flow.
    Delete,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Unfill => "unfill",
            Self::Running => "running",
            Self::Be => "be",
            Self::Closed => "closed",
            Self::Done => "done",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "unfill" => Some(Self::Unfill),
            "running" => Some(Self::Running),
            "be" => Some(Self::Be),
            "closed" => Some(Self::Closed),
            "done" => Some(Self::Done),
            "cancel" => Some(Self::Cancel),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Open positions contribute to floating P&L.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Running | Self::Unfill | Self::Be)
    }

    /// `closed` and `done` are synonymous completed states; only these
    /// contribute to realized P&L.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Closed | Self::Done)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One trading position as held by the backend store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub user_id: String,
    pub pair: String,
    pub open_price: f64,
    pub stop_loss: f64,
    pub final_target: f64,
    pub img_before: String,
    pub img_after: String,
    pub status: TradeStatus,
    /// Signed R-multiple; 0 while the position is open.
    pub result: f64,
    /// Currency amount one R corresponds to, frozen when the position was
    /// opened and never recomputed. `None` only on legacy rows created
    /// before the snapshot column existed.
    pub risk_usd: Option<f64>,
    pub open_date: DateTime<Utc>,
    pub close_date: Option<DateTime<Utc>>,
}

/// Insert payload for a new position; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDraft {
    pub user_id: String,
    pub pair: String,
    pub open_price: f64,
    pub stop_loss: f64,
    pub final_target: f64,
    pub img_before: String,
    pub img_after: String,
    pub status: TradeStatus,
    pub result: f64,
    pub risk_usd: f64,
    pub open_date: DateTime<Utc>,
}

/// Fields a status change writes back. Everything else on the row,
/// including the risk snapshot, is immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePatch {
    pub status: TradeStatus,
    pub result: f64,
    /// `None` leaves the stored after-chart link untouched.
    pub img_after: Option<String>,
    /// `None` clears any previously stored close date.
    pub close_date: Option<DateTime<Utc>>,
}

impl TradePatch {
    /// Project the patch onto an in-memory copy of the row.
    pub fn apply(&self, trade: &Trade) -> Trade {
        Trade {
            status: self.status,
            result: self.result,
            img_after: self
                .img_after
                .clone()
                .unwrap_or_else(|| trade.img_after.clone()),
            close_date: self.close_date,
            ..trade.clone()
        }
    }
}
