use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};

use crate::api::{
    client::{Identity, ProfileStore, TradeOrder, TradeQuery, TradeStore},
    error::ApiError,
    rate_limiter::RateLimiter,
};
use crate::models::{Profile, Trade, TradeDraft, TradePatch};

use super::{
    mapper::{
        format_timestamp, map_draft_to_row, map_patch_to_row, map_profile_to_row,
        map_row_to_profile, map_row_to_trade,
    },
    session::Session,
    types::{AuthErrorBody, AuthResponse, PasswordGrant, ProfileRow, RestErrorBody, TradeRow},
};

const TRADES_TABLE: &str = "trades";
const PROFILES_TABLE: &str = "profiles";

// Hosted projects enforce per-project request quotas; stay under them.
const REQUESTS_PER_SECOND: u32 = 10;
const BURST_SIZE: u32 = 20;

/// Client for the hosted backend: auth plus row access to the `trades` and
/// `profiles` tables. Row-level security on the backend enforces ownership;
/// every request here still carries the owner filter.
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            http_client: reqwest::Client::new(),
            rate_limiter: RateLimiter::new(REQUESTS_PER_SECOND, BURST_SIZE),
            session: RwLock::new(None),
        }
    }

    /// Exchange email/password for a session (password grant).
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            let reason = body
                .error_description
                .or(body.msg)
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::Authentication(reason));
        }

        let response_text = response.text().await?;
        let auth: AuthResponse = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::Parse(format!("Failed to parse auth response: {}", e))
        })?;

        let session = Session::new(auth.access_token, auth.refresh_token, auth.user.id);
        self.store_session(Some(session.clone()));
        log::info!("Signed in user {}", session.user_id);
        Ok(session)
    }

    /// Adopt a previously issued session, e.g. one restored from a kept
    /// access token.
    pub fn restore_session(&self, session: Session) {
        log::info!("Restored session for user {}", session.user_id);
        self.store_session(Some(session));
    }

    pub fn sign_out(&self) {
        log::info!("Signed out");
        self.store_session(None);
    }

    fn store_session(&self, session: Option<Session>) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = session;
    }

    fn session(&self) -> Result<Session, ApiError> {
        let guard = self
            .session
            .read()
            .map_err(|e| ApiError::Unknown(e.to_string()))?;
        let session = guard.clone().ok_or(ApiError::NotSignedIn)?;
        if session.is_expired() {
            return Err(ApiError::Authentication(
                "Session expired; sign in again".to_string(),
            ));
        }
        Ok(session)
    }

    fn table_url(&self, table: &str, filters: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, filters)
    }

    fn auth_headers(&self, session: &Session) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| ApiError::Authentication(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", session.access_token))
                .map_err(|e| ApiError::Authentication(format!("Invalid access token: {}", e)))?,
        );
        Ok(headers)
    }

    /// Triage a table-endpoint response and hand back the body text.
    async fn read_body(response: Response) -> Result<String, ApiError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimit(
                "Backend throttled the request; wait before retrying".to_string(),
            ));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication(
                "Invalid or expired credentials".to_string(),
            ));
        }
        if !status.is_success() {
            let body: RestErrorBody = response.json().await.unwrap_or_default();
            return Err(ApiError::Backend {
                code: body.code.unwrap_or_else(|| status.as_u16().to_string()),
                message: body.message.unwrap_or_else(|| status.to_string()),
            });
        }

        Ok(response.text().await?)
    }

    fn trade_filters(query: &TradeQuery) -> String {
        let mut params = vec![
            "select=*".to_string(),
            format!("user_id=eq.{}", query.owner),
        ];

        if !query.statuses.is_empty() {
            let list = query
                .statuses
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",");
            params.push(format!("status=in.({})", list));
        }

        if let Some((start, end)) = query.active_between {
            let start = format_timestamp(start);
            let end = format_timestamp(end);
            // A position belongs to a window if it was opened or closed in it.
            params.push(format!(
                "or=(and(open_date.gte.{start},open_date.lte.{end}),and(close_date.gte.{start},close_date.lte.{end}))",
                start = start,
                end = end
            ));
        }

        params.push(match query.order {
            TradeOrder::OpenedDesc => "order=open_date.desc".to_string(),
            TradeOrder::ClosedAsc => "order=close_date.asc".to_string(),
        });

        params.join("&")
    }
}

#[async_trait]
impl TradeStore for SupabaseClient {
    async fn insert_trade(&self, draft: TradeDraft) -> Result<Trade, ApiError> {
        let session = self.session()?;
        self.rate_limiter.acquire().await;

        let url = self.table_url(TRADES_TABLE, "select=*");
        let row = map_draft_to_row(&draft);
        log::debug!("Inserting {} position for {}", row.pair, row.user_id);

        let response = self
            .http_client
            .post(&url)
            .headers(self.auth_headers(&session)?)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        let response_text = Self::read_body(response).await?;
        let rows: Vec<TradeRow> = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::Parse(format!(
                "Failed to parse insert response: {} - Body: {}",
                e, response_text
            ))
        })?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Parse("Insert returned no row".to_string()))?;

        map_row_to_trade(&row)
    }

    async fn update_trade(&self, owner: &str, id: i64, patch: &TradePatch) -> Result<(), ApiError> {
        let session = self.session()?;
        self.rate_limiter.acquire().await;

        let url = self.table_url(TRADES_TABLE, &format!("id=eq.{}&user_id=eq.{}", id, owner));
        let response = self
            .http_client
            .patch(&url)
            .headers(self.auth_headers(&session)?)
            .header("Prefer", "return=representation")
            .json(&map_patch_to_row(patch))
            .send()
            .await?;

        let response_text = Self::read_body(response).await?;
        let rows: Vec<TradeRow> = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::Parse(format!("Failed to parse update response: {}", e))
        })?;

        // An empty representation means the row vanished under us.
        if rows.is_empty() {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn delete_trade(&self, owner: &str, id: i64) -> Result<(), ApiError> {
        let session = self.session()?;
        self.rate_limiter.acquire().await;

        let url = self.table_url(TRADES_TABLE, &format!("id=eq.{}&user_id=eq.{}", id, owner));
        let response = self
            .http_client
            .delete(&url)
            .headers(self.auth_headers(&session)?)
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let response_text = Self::read_body(response).await?;
        let rows: Vec<TradeRow> = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::Parse(format!("Failed to parse delete response: {}", e))
        })?;

        if rows.is_empty() {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn query_trades(&self, query: TradeQuery) -> Result<Vec<Trade>, ApiError> {
        let session = self.session()?;
        self.rate_limiter.acquire().await;

        let url = self.table_url(TRADES_TABLE, &Self::trade_filters(&query));
        let response = self
            .http_client
            .get(&url)
            .headers(self.auth_headers(&session)?)
            .send()
            .await?;

        let response_text = Self::read_body(response).await?;
        let rows: Vec<TradeRow> = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::Parse(format!(
                "Failed to parse trades response: {} - Body: {}",
                e, response_text
            ))
        })?;

        rows.iter().map(map_row_to_trade).collect()
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn get_profile(&self, owner: &str) -> Result<Option<Profile>, ApiError> {
        let session = self.session()?;
        self.rate_limiter.acquire().await;

        let url = self.table_url(PROFILES_TABLE, &format!("select=*&id=eq.{}", owner));
        let response = self
            .http_client
            .get(&url)
            .headers(self.auth_headers(&session)?)
            .send()
            .await?;

        let response_text = Self::read_body(response).await?;
        let rows: Vec<ProfileRow> = serde_json::from_str(&response_text).map_err(|e| {
            ApiError::Parse(format!("Failed to parse profile response: {}", e))
        })?;

        Ok(rows.first().map(map_row_to_profile))
    }

    async fn upsert_profile(&self, owner: &str, profile: &Profile) -> Result<(), ApiError> {
        let session = self.session()?;
        self.rate_limiter.acquire().await;

        let url = self.table_url(PROFILES_TABLE, "select=*");
        let row = map_profile_to_row(owner, profile, Utc::now());
        let response = self
            .http_client
            .post(&url)
            .headers(self.auth_headers(&session)?)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row])
            .send()
            .await?;

        Self::read_body(response).await?;
        Ok(())
    }
}

impl Identity for SupabaseClient {
    fn current_user_id(&self) -> Result<String, ApiError> {
        Ok(self.session()?.user_id)
    }
}
