pub mod api;
pub mod journal;
pub mod models;

pub use api::supabase::{Session, SupabaseClient};
pub use api::{ApiError, Identity, ProfileStore, TradeOrder, TradeQuery, TradeStore};
pub use journal::{
    ChangeDirective, EditOutcome, Journal, JournalError, MonthHistory, NewTradeForm,
    PeriodFilter, PerformanceReport, StatusChange,
};
pub use models::{Profile, Trade, TradeDraft, TradePatch, TradeStatus};
