pub mod error;
pub mod lifecycle;
pub mod period;
pub mod stats;

pub use error::JournalError;
pub use lifecycle::{
    ChangeDirective, NewTradeForm, StatusChange, DEFAULT_OPEN_STATUS,
};
pub use period::PeriodFilter;
pub use stats::{EquityPoint, MonthSummary, OpenSummary, PerformanceReport};

use std::sync::Arc;

use chrono::Utc;

use crate::api::{ApiError, Identity, ProfileStore, TradeOrder, TradeQuery, TradeStore};
use crate::models::{Profile, Trade, TradeStatus};

/// Statuses that count as completed for realized P&L.
const COMPLETED: [TradeStatus; 2] = [TradeStatus::Closed, TradeStatus::Done];
/// Statuses that count as open for floating P&L.
const OPEN: [TradeStatus; 3] = [TradeStatus::Running, TradeStatus::Unfill, TradeStatus::Be];

/// Result of an edit request.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// The store accepted the patch; here is the refreshed copy.
    Updated(Trade),
    /// Deletion requested but not yet confirmed; nothing was changed.
    ConfirmDelete,
    /// The position was removed.
    Deleted,
}

/// History listing for one calendar month.
#[derive(Debug, Clone)]
pub struct MonthHistory {
    pub trades: Vec<Trade>,
    pub summary: MonthSummary,
}

/// The operation layer a dashboard frontend drives: one method per user
/// interaction. All durable state lives in the backend store; every read
/// is a point-in-time snapshot.
pub struct Journal<S> {
    store: Arc<S>,
}

impl<S> Journal<S>
where
    S: TradeStore + ProfileStore + Identity,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Currently running positions, newest first.
    pub async fn running_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let owner = self.store.current_user_id()?;
        let query = TradeQuery::new(owner).with_statuses(&[TradeStatus::Running]);
        Ok(self.store.query_trades(query).await?)
    }

    /// Floating P&L over every open position.
    pub async fn open_summary(&self) -> Result<OpenSummary, JournalError> {
        let owner = self.store.current_user_id()?;
        let trades = self
            .store
            .query_trades(TradeQuery::new(owner).with_statuses(&OPEN))
            .await?;
        Ok(stats::open_summary(&trades))
    }

    /// Log a new position. The risk snapshot is sized off the latest
    /// realized balance, so consecutive positions compound with the
    /// account instead of the original deposit.
    pub async fn add_position(&self, form: &NewTradeForm) -> Result<Trade, JournalError> {
        let owner = self.store.current_user_id()?;
        let profile = self.store.get_profile(&owner).await?.unwrap_or_default();
        let closed = self
            .store
            .query_trades(TradeQuery::new(owner.clone()).with_statuses(&COMPLETED))
            .await?;

        let balance = stats::realized_balance(&profile, &closed);
        let draft = lifecycle::build_trade(form, &profile, balance, &owner, Utc::now())?;
        let trade = self.store.insert_trade(draft).await?;

        log::info!(
            "Opened position {} ({}) risking {:.2}",
            trade.id,
            trade.pair,
            trade.risk_usd.unwrap_or(0.0)
        );
        Ok(trade)
    }

    /// Apply a status change to an existing position. Deletion needs a
    /// second call with `confirmed` set; the first one only asks.
    pub async fn edit_position(
        &self,
        trade: &Trade,
        change: &StatusChange,
        confirmed: bool,
    ) -> Result<EditOutcome, JournalError> {
        match lifecycle::apply_status_change(change, confirmed, Utc::now()) {
            ChangeDirective::ConfirmDelete => Ok(EditOutcome::ConfirmDelete),
            ChangeDirective::Delete => {
                self.store
                    .delete_trade(&trade.user_id, trade.id)
                    .await
                    .map_err(Self::map_gone)?;
                log::info!("Deleted position {} ({})", trade.id, trade.pair);
                Ok(EditOutcome::Deleted)
            }
            ChangeDirective::Update(patch) => {
                self.store
                    .update_trade(&trade.user_id, trade.id, &patch)
                    .await
                    .map_err(Self::map_gone)?;
                log::debug!("Position {} now {}", trade.id, patch.status);
                Ok(EditOutcome::Updated(patch.apply(trade)))
            }
        }
    }

    /// Running and completed positions touching one calendar month, with
    /// summary stats for the table footer.
    pub async fn month_history(&self, year: i32, month: u32) -> Result<MonthHistory, JournalError> {
        let owner = self.store.current_user_id()?;
        let (start, end) = period::month_bounds(year, month)?;

        let query = TradeQuery::new(owner)
            .with_statuses(&[TradeStatus::Running, TradeStatus::Closed, TradeStatus::Done])
            .between(start, end);
        let trades = self.store.query_trades(query).await?;
        let summary = stats::month_summary(&trades);

        Ok(MonthHistory { trades, summary })
    }

    /// Equity curve and period stats over completed positions.
    pub async fn performance(
        &self,
        filter: PeriodFilter,
    ) -> Result<PerformanceReport, JournalError> {
        let owner = self.store.current_user_id()?;
        let (start, end) = filter.bounds(Utc::now())?;

        let trades_query = TradeQuery::new(owner.clone())
            .with_statuses(&COMPLETED)
            .ordered(TradeOrder::ClosedAsc);
        // Independent reads; no transactional consistency needed between them.
        let (profile, trades) = tokio::try_join!(
            self.store.get_profile(&owner),
            self.store.query_trades(trades_query),
        )?;

        let profile = profile.unwrap_or_default();
        Ok(stats::performance_report(&trades, &profile, start, end))
    }

    /// Account configuration; defaults until first saved.
    pub async fn settings(&self) -> Result<Profile, JournalError> {
        let owner = self.store.current_user_id()?;
        Ok(self.store.get_profile(&owner).await?.unwrap_or_default())
    }

    /// Create or update the account configuration.
    pub async fn save_settings(&self, profile: &Profile) -> Result<(), JournalError> {
        let owner = self.store.current_user_id()?;
        self.store.upsert_profile(&owner, profile).await?;
        log::info!("Saved settings for {}", owner);
        Ok(())
    }

    /// A vanished row is stale local state, not a store fault.
    fn map_gone(err: ApiError) -> JournalError {
        match err {
            ApiError::NotFound => {
                JournalError::NotFound("Position no longer exists".to_string())
            }
            other => JournalError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeDraft, TradePatch};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// Store double holding everything in memory, filtering the way the
    /// backend would.
    struct MemoryStore {
        user_id: String,
        trades: Mutex<Vec<Trade>>,
        profile: Mutex<Option<Profile>>,
        next_id: AtomicI64,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                user_id: "user-1".to_string(),
                trades: Mutex::new(Vec::new()),
                profile: Mutex::new(None),
                next_id: AtomicI64::new(1),
            }
        }

        fn seed_trade(&self, trade: Trade) {
            self.trades.lock().unwrap().push(trade);
        }

        fn seed_profile(&self, profile: Profile) {
            *self.profile.lock().unwrap() = Some(profile);
        }

        fn trade(&self, id: i64) -> Option<Trade> {
            self.trades.lock().unwrap().iter().find(|t| t.id == id).cloned()
        }
    }

    #[async_trait]
    impl TradeStore for MemoryStore {
        async fn insert_trade(&self, draft: TradeDraft) -> Result<Trade, ApiError> {
            let trade = Trade {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                user_id: draft.user_id,
                pair: draft.pair,
                open_price: draft.open_price,
                stop_loss: draft.stop_loss,
                final_target: draft.final_target,
                img_before: draft.img_before,
                img_after: draft.img_after,
                status: draft.status,
                result: draft.result,
                risk_usd: Some(draft.risk_usd),
                open_date: draft.open_date,
                close_date: None,
            };
            self.trades.lock().unwrap().push(trade.clone());
            Ok(trade)
        }

        async fn update_trade(
            &self,
            owner: &str,
            id: i64,
            patch: &TradePatch,
        ) -> Result<(), ApiError> {
            let mut trades = self.trades.lock().unwrap();
            let existing = trades
                .iter_mut()
                .find(|t| t.id == id && t.user_id == owner)
                .ok_or(ApiError::NotFound)?;
            *existing = patch.apply(existing);
            Ok(())
        }

        async fn delete_trade(&self, owner: &str, id: i64) -> Result<(), ApiError> {
            let mut trades = self.trades.lock().unwrap();
            let before = trades.len();
            trades.retain(|t| !(t.id == id && t.user_id == owner));
            if trades.len() == before {
                return Err(ApiError::NotFound);
            }
            Ok(())
        }

        async fn query_trades(&self, query: TradeQuery) -> Result<Vec<Trade>, ApiError> {
            let mut matches: Vec<Trade> = self
                .trades
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.user_id == query.owner)
                .filter(|t| query.statuses.is_empty() || query.statuses.contains(&t.status))
                .filter(|t| match query.active_between {
                    None => true,
                    Some((start, end)) => {
                        let open_in = t.open_date >= start && t.open_date <= end;
                        let close_in = t
                            .close_date
                            .map(|d| d >= start && d <= end)
                            .unwrap_or(false);
                        open_in || close_in
                    }
                })
                .cloned()
                .collect();

            match query.order {
                TradeOrder::OpenedDesc => {
                    matches.sort_by(|a, b| b.open_date.cmp(&a.open_date))
                }
                TradeOrder::ClosedAsc => matches.sort_by_key(|t| t.close_date.unwrap_or(t.open_date)),
            }
            Ok(matches)
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryStore {
        async fn get_profile(&self, owner: &str) -> Result<Option<Profile>, ApiError> {
            assert_eq!(owner, self.user_id);
            Ok(self.profile.lock().unwrap().clone())
        }

        async fn upsert_profile(&self, owner: &str, profile: &Profile) -> Result<(), ApiError> {
            assert_eq!(owner, self.user_id);
            *self.profile.lock().unwrap() = Some(profile.clone());
            Ok(())
        }
    }

    impl Identity for MemoryStore {
        fn current_user_id(&self) -> Result<String, ApiError> {
            Ok(self.user_id.clone())
        }
    }

    fn journal_with_store() -> (Journal<MemoryStore>, Arc<MemoryStore>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(MemoryStore::new());
        (Journal::new(store.clone()), store)
    }

    fn configured_profile() -> Profile {
        Profile {
            initial_balance: 1000.0,
            risk_percent: 1.0,
            ..Profile::default()
        }
    }

    fn closed_trade(id: i64, result: f64, risk_usd: f64, closed: DateTime<Utc>) -> Trade {
        Trade {
            id,
            user_id: "user-1".to_string(),
            pair: "EURUSD".to_string(),
            open_price: 1.08,
            stop_loss: 1.07,
            final_target: 1.10,
            img_before: String::new(),
            img_after: String::new(),
            status: TradeStatus::Closed,
            result,
            risk_usd: Some(risk_usd),
            open_date: closed - chrono::Duration::days(2),
            close_date: Some(closed),
        }
    }

    fn new_trade_form() -> NewTradeForm {
        NewTradeForm {
            pair: "xauusd".to_string(),
            open_price: "2350.5".to_string(),
            ..NewTradeForm::default()
        }
    }

    #[tokio::test]
    async fn test_add_position_blocked_without_balance() {
        let (journal, _store) = journal_with_store();

        let err = journal.add_position(&new_trade_form()).await.unwrap_err();
        assert!(matches!(err, JournalError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_add_position_compounds_risk_snapshot() {
        let (journal, store) = journal_with_store();
        store.seed_profile(configured_profile());
        store.seed_trade(closed_trade(
            100,
            2.0,
            10.0,
            Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap(),
        ));

        let trade = journal.add_position(&new_trade_form()).await.unwrap();

        assert_eq!(trade.pair, "XAUUSD");
        assert_eq!(trade.status, DEFAULT_OPEN_STATUS);
        assert_eq!(trade.result, 0.0);
        // 1% of the compounded balance (1000 + 2R * $10 = 1020).
        assert!((trade.risk_usd.unwrap() - 10.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delete_asks_then_removes() {
        let (journal, store) = journal_with_store();
        let trade = closed_trade(5, 1.0, 10.0, Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap());
        store.seed_trade(trade.clone());

        let change = StatusChange {
            status: TradeStatus::Delete,
            result: trade.result,
            img_after: None,
            close_date: None,
        };

        let first = journal.edit_position(&trade, &change, false).await.unwrap();
        assert!(matches!(first, EditOutcome::ConfirmDelete));
        assert!(store.trade(5).is_some());

        let second = journal.edit_position(&trade, &change, true).await.unwrap();
        assert!(matches!(second, EditOutcome::Deleted));
        assert!(store.trade(5).is_none());
    }

    #[tokio::test]
    async fn test_edit_closes_with_auto_date() {
        let (journal, store) = journal_with_store();
        let mut trade =
            closed_trade(9, 0.0, 10.0, Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap());
        trade.status = TradeStatus::Running;
        trade.close_date = None;
        store.seed_trade(trade.clone());

        let change = StatusChange {
            status: TradeStatus::Closed,
            result: 1.5,
            img_after: Some("https://charts/after".to_string()),
            close_date: None,
        };

        let outcome = journal.edit_position(&trade, &change, false).await.unwrap();
        let updated = match outcome {
            EditOutcome::Updated(updated) => updated,
            other => panic!("expected update, got {:?}", other),
        };

        assert_eq!(updated.status, TradeStatus::Closed);
        assert_eq!(updated.result, 1.5);
        assert!(updated.close_date.is_some());

        let stored = store.trade(9).unwrap();
        assert_eq!(stored.status, TradeStatus::Closed);
        assert!(stored.close_date.is_some());
        // Snapshot untouched by the edit.
        assert_eq!(stored.risk_usd, Some(10.0));
    }

    #[tokio::test]
    async fn test_edit_vanished_position_is_not_found() {
        let (journal, _store) = journal_with_store();
        let trade = closed_trade(1, 1.0, 10.0, Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap());

        let change = StatusChange {
            status: TradeStatus::Done,
            result: 1.0,
            img_after: None,
            close_date: None,
        };

        let err = journal.edit_position(&trade, &change, false).await.unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_month_history_filters_by_window() {
        let (journal, store) = journal_with_store();
        store.seed_trade(closed_trade(
            1,
            2.0,
            10.0,
            Utc.with_ymd_and_hms(2025, 6, 10, 16, 0, 0).unwrap(),
        ));
        store.seed_trade(closed_trade(
            2,
            -1.0,
            10.0,
            Utc.with_ymd_and_hms(2025, 5, 10, 16, 0, 0).unwrap(),
        ));
        // Cancelled rows never surface in history.
        let mut cancelled = closed_trade(
            3,
            1.0,
            10.0,
            Utc.with_ymd_and_hms(2025, 6, 12, 16, 0, 0).unwrap(),
        );
        cancelled.status = TradeStatus::Cancel;
        store.seed_trade(cancelled);

        let history = journal.month_history(2025, 6).await.unwrap();

        assert_eq!(history.trades.len(), 1);
        assert_eq!(history.trades[0].id, 1);
        assert_eq!(history.summary.total_trades, 1);
        assert_eq!(history.summary.winning_trades, 1);
        assert!((history.summary.net_r - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_performance_all_time() {
        let (journal, store) = journal_with_store();
        store.seed_profile(configured_profile());
        store.seed_trade(closed_trade(
            1,
            2.0,
            10.0,
            Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap(),
        ));
        store.seed_trade(closed_trade(
            2,
            -0.5,
            10.0,
            Utc.with_ymd_and_hms(2025, 6, 20, 16, 0, 0).unwrap(),
        ));

        let report = journal.performance(PeriodFilter::All).await.unwrap();

        assert_eq!(report.starting_balance, 1000.0);
        assert!((report.current_balance - 1015.0).abs() < 1e-9);
        assert_eq!(report.total_trades, 2);
        assert_eq!(report.points.len(), 3);
    }

    #[tokio::test]
    async fn test_running_trades_only() {
        let (journal, store) = journal_with_store();
        let mut running =
            closed_trade(1, 0.0, 10.0, Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap());
        running.status = TradeStatus::Running;
        running.close_date = None;
        store.seed_trade(running);
        store.seed_trade(closed_trade(
            2,
            1.0,
            10.0,
            Utc.with_ymd_and_hms(2025, 6, 3, 16, 0, 0).unwrap(),
        ));

        let trades = journal.running_trades().await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, 1);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let (journal, _store) = journal_with_store();

        assert_eq!(journal.settings().await.unwrap(), Profile::default());

        let profile = Profile {
            initial_balance: 2500.0,
            risk_percent: 0.5,
            pair_prefix: String::new(),
            pair_suffix: "m".to_string(),
        };
        journal.save_settings(&profile).await.unwrap();

        assert_eq!(journal.settings().await.unwrap(), profile);
    }
}
