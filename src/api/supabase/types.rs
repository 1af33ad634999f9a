use serde::{Deserialize, Serialize};

/// Row shape of the `trades` table. Column names are the contract with the
/// hosted backend's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub id: i64,

    pub user_id: String,

    pub pair: String,

    /// Open price.
    pub op: f64,

    /// Stop loss; null when never entered.
    pub sl: Option<f64>,

    /// Final target; null when never entered.
    pub ft: Option<f64>,

    pub img_before: Option<String>,

    pub img_after: Option<String>,

    pub status: String,

    /// Signed R-multiple; null on some legacy rows.
    pub result: Option<f64>,

    /// Currency risk snapshot frozen at open; null on rows created before
    /// the column existed.
    pub risk_usd: Option<f64>,

    /// RFC 3339 timestamp.
    pub open_date: String,

    /// RFC 3339 timestamp; null while the position is open.
    pub close_date: Option<String>,
}

/// Insert payload for `trades`; the table assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewTradeRow {
    pub user_id: String,
    pub pair: String,
    pub op: f64,
    pub sl: f64,
    pub ft: f64,
    pub img_before: String,
    pub img_after: String,
    pub status: String,
    pub result: f64,
    pub risk_usd: f64,
    pub open_date: String,
}

/// Update payload for a status change. `close_date` is always serialized so
/// an explicit null clears a previously stored date.
#[derive(Debug, Clone, Serialize)]
pub struct TradePatchRow {
    pub status: String,

    pub result: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_after: Option<String>,

    pub close_date: Option<String>,
}

/// Row shape of the `profiles` table. Every column besides the key is
/// nullable until the user saves the configuration form once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    /// Same id as the auth user.
    pub id: String,

    pub initial_balance: Option<f64>,

    pub risk_per_trade_percent: Option<f64>,

    pub pair_prefix: Option<String>,

    pub pair_suffix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Password-grant request body for the auth endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrant {
    pub email: String,
    pub password: String,
}

/// Token response from the auth endpoint (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
}

/// Auth error body; the populated field varies across endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthErrorBody {
    pub error_description: Option<String>,
    pub msg: Option<String>,
}

/// Table-endpoint error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}
