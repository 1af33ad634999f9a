use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::ApiError;
use crate::models::{Profile, Trade, TradeDraft, TradePatch, TradeStatus};

/// Sort order for trade queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOrder {
    /// Newest positions first (list views).
    OpenedDesc,
    /// Completion order (equity curve input).
    ClosedAsc,
}

/// Filtered select against the trades table. Every query is scoped to its
/// owner; the store never returns another user's rows.
#[derive(Debug, Clone)]
pub struct TradeQuery {
    pub owner: String,
    /// Statuses to include; empty means any.
    pub statuses: Vec<TradeStatus>,
    /// Inclusive window matched against the open *or* close date.
    pub active_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub order: TradeOrder,
}

impl TradeQuery {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            statuses: Vec::new(),
            active_between: None,
            order: TradeOrder::OpenedDesc,
        }
    }

    pub fn with_statuses(mut self, statuses: &[TradeStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.active_between = Some((start, end));
        self
    }

    pub fn ordered(mut self, order: TradeOrder) -> Self {
        self.order = order;
        self
    }
}

/// Trade table access, implemented by the hosted backend.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn insert_trade(&self, draft: TradeDraft) -> Result<Trade, ApiError>;

    /// Applies a status-change patch. `ApiError::NotFound` when the row
    /// vanished between load and mutate.
    async fn update_trade(&self, owner: &str, id: i64, patch: &TradePatch) -> Result<(), ApiError>;

    async fn delete_trade(&self, owner: &str, id: i64) -> Result<(), ApiError>;

    async fn query_trades(&self, query: TradeQuery) -> Result<Vec<Trade>, ApiError>;
}

/// Profile table access, implemented by the hosted backend.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, owner: &str) -> Result<Option<Profile>, ApiError>;

    async fn upsert_profile(&self, owner: &str, profile: &Profile) -> Result<(), ApiError>;
}

/// Source of the authenticated user's stable id. The id is opaque to the
/// core; it is only ever passed back to the store for row scoping.
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Result<String, ApiError>;
}
