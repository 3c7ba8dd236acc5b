//! # Feedback Relay
//!
//! Forwards user feedback to a Discord webhook as a single embed.
//!
//! ## Pipeline
//!
//! ```text
//! client ip ──► RateLimiter (5 per hour) ──► validate ──► sanitize ──► webhook (10s)
//!                    │ 429                      │ 400                     │ 504 / 500
//! ```
//!
//! ## Limits
//!
//! | Field      | Accepted          | Forwarded (chars) |
//! |------------|-------------------|-------------------|
//! | message    | 10..=5000 chars   | 2000 |
//! | email      | `a@b.c`, ≤ 200    | 200 |
//! | version    | anything          | 20 |
//! | user agent | anything          | 100 |
//! | client ip  | from headers      | 50 |
//!
//! `@everyone` and `@here` are broken with a zero-width space so the
//! message cannot ping the channel.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::render::artwork::USER_AGENT;

pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 5000;
pub const EMAIL_MAX_CHARS: usize = 200;

const FORWARDED_MESSAGE_CHARS: usize = 2000;
const FORWARDED_VERSION_CHARS: usize = 20;
const FORWARDED_USER_AGENT_CHARS: usize = 100;
const FORWARDED_IP_CHARS: usize = 50;

/// Submissions allowed per client within one window.
pub const RATE_LIMIT: u32 = 5;
pub const RATE_WINDOW: Duration = Duration::from_secs(3600);
/// Expired windows are purged once the table grows past this many clients.
pub const RATE_TABLE_SOFT_CAP: usize = 1000;
/// Clients tracked at most; the oldest windows are evicted beyond this.
pub const RATE_TABLE_HARD_CAP: usize = 10_000;

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

const BOT_USERNAME: &str = "Feedback Bot";
const FOOTER: &str = "MiniDisc Cover Designer Feedback";
const ZERO_WIDTH_SPACE: char = '\u{200B}';
const MENTIONS: [&str; 2] = ["everyone", "here"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Too many requests. Please try again in an hour.")]
    RateLimited,

    #[error("{0}")]
    Invalid(String),

    #[error("Feedback system not configured")]
    NotConfigured,

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to send feedback: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Feature,
    Bug,
    Other,
}

impl FeedbackKind {
    pub fn title(self) -> &'static str {
        match self {
            FeedbackKind::Feature => "💡 Feature Request",
            FeedbackKind::Bug => "🐛 Bug Report",
            FeedbackKind::Other => "💬 General Feedback",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            FeedbackKind::Feature => 0x0099ff,
            FeedbackKind::Bug => 0xff0000,
            FeedbackKind::Other => 0x9b59b6,
        }
    }

    fn label(self) -> &'static str {
        match self {
            FeedbackKind::Feature => "Feature",
            FeedbackKind::Bug => "Bug",
            FeedbackKind::Other => "Other",
        }
    }
}

/// One feedback submission as posted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        let length = self.message.chars().count();
        if length < MESSAGE_MIN_CHARS {
            return Err(FeedbackError::Invalid(format!(
                "Message too short (minimum {} characters)",
                MESSAGE_MIN_CHARS
            )));
        }
        if length > MESSAGE_MAX_CHARS {
            return Err(FeedbackError::Invalid(format!(
                "Message too long (maximum {} characters)",
                MESSAGE_MAX_CHARS
            )));
        }

        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !is_valid_email(email) {
                return Err(FeedbackError::Invalid("Invalid email format".to_string()));
            }
            if email.chars().count() > EMAIL_MAX_CHARS {
                return Err(FeedbackError::Invalid("Email too long".to_string()));
            }
        }
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // a dot with something on both sides
    domain
        .char_indices()
        .any(|(i, ch)| ch == '.' && i > 0 && i + 1 < domain.len())
}

/// Insert a zero-width space after `@` in `@everyone` and `@here`
/// (any letter case).
pub fn break_mentions(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..=at]);
        rest = &rest[at + 1..];
        let is_mention = MENTIONS.iter().any(|mention| {
            rest.get(..mention.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(mention))
        });
        if is_mention {
            out.push(ZERO_WIDTH_SPACE);
        }
    }
    out.push_str(rest);
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// The webhook body for one validated submission.
pub fn discord_payload(
    request: &FeedbackRequest,
    client_ip: &str,
    timestamp: DateTime<Utc>,
) -> serde_json::Value {
    let message = truncate_chars(&break_mentions(&request.message), FORWARDED_MESSAGE_CHARS);
    let email = request
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .map(|e| truncate_chars(e, EMAIL_MAX_CHARS))
        .unwrap_or_else(|| "_Not provided_".to_string());
    let version = request
        .version
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| truncate_chars(v, FORWARDED_VERSION_CHARS))
        .unwrap_or_else(|| "Unknown".to_string());
    let user_agent = request
        .user_agent
        .as_deref()
        .filter(|ua| !ua.is_empty())
        .map(|ua| truncate_chars(ua, FORWARDED_USER_AGENT_CHARS))
        .unwrap_or_else(|| "Unknown".to_string());

    json!({
        "username": BOT_USERNAME,
        "embeds": [{
            "title": request.kind.title(),
            "description": message,
            "color": request.kind.color(),
            "fields": [
                {"name": "📧 Contact Email", "value": email, "inline": true},
                {"name": "🏷️ Type", "value": request.kind.label(), "inline": true},
                {"name": "📦 Version", "value": version, "inline": true},
                {"name": "🌐 Browser", "value": user_agent, "inline": false},
                {"name": "🔒 IP", "value": truncate_chars(client_ip, FORWARDED_IP_CHARS), "inline": true},
            ],
            "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            "footer": {"text": FOOTER},
        }],
    })
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Fixed-window limiter keyed by client. The clock is passed in.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    max_clients: usize,
    windows: Mutex<HashMap<String, Window>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT, RATE_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            max_clients: RATE_TABLE_HARD_CAP,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    /// Count one attempt by `key` at `now`. Returns false when the client has
    /// used up its window.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() > RATE_TABLE_SOFT_CAP {
            windows.retain(|_, w| now <= w.resets_at);
        }

        match windows.get_mut(key) {
            Some(w) if now <= w.resets_at => {
                if w.count >= self.limit {
                    return false;
                }
                w.count += 1;
                true
            }
            _ => {
                while windows.len() >= self.max_clients && !windows.contains_key(key) {
                    let oldest = windows
                        .iter()
                        .min_by_key(|(_, w)| w.resets_at)
                        .map(|(k, _)| k.clone());
                    match oldest {
                        Some(k) => windows.remove(&k),
                        None => break,
                    };
                }
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        resets_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Rate-limits, validates and forwards feedback to a webhook.
pub struct FeedbackRelay {
    http: reqwest::Client,
    webhook_url: Option<String>,
    limiter: RateLimiter,
    timeout: Duration,
}

impl FeedbackRelay {
    pub fn new(webhook_url: Option<String>) -> Result<Self, crate::error::MdLabelError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| crate::error::MdLabelError::Server(format!("HTTP client error: {}", e)))?;
        Ok(Self::with_client(http, webhook_url))
    }

    pub fn with_client(http: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self {
            http,
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
            limiter: RateLimiter::default(),
            timeout: WEBHOOK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Count an attempt against the client's rate limit. Every attempt
    /// counts, including ones that later fail validation.
    pub fn admit(&self, client_ip: &str) -> Result<(), FeedbackError> {
        if self.limiter.check(client_ip, Instant::now()) {
            Ok(())
        } else {
            tracing::warn!(client_ip, "feedback rate limit exceeded");
            Err(FeedbackError::RateLimited)
        }
    }

    /// Validate and forward an admitted submission.
    pub async fn deliver(
        &self,
        client_ip: &str,
        request: &FeedbackRequest,
    ) -> Result<(), FeedbackError> {
        request.validate()?;

        let Some(url) = self.webhook_url.as_deref() else {
            tracing::error!("feedback webhook URL not configured");
            return Err(FeedbackError::NotConfigured);
        };

        let payload = discord_payload(request, client_ip, Utc::now());
        let send = self.http.post(url).json(&payload).send();

        let response = match tokio::time::timeout(self.timeout, send).await {
            Err(_) => {
                tracing::error!("feedback webhook timed out");
                return Err(FeedbackError::Timeout);
            }
            Ok(Err(e)) => return Err(FeedbackError::Upstream(e.to_string())),
            Ok(Ok(response)) => response,
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "feedback webhook rejected the submission");
            return Err(FeedbackError::Upstream(format!("webhook returned HTTP {}", status)));
        }

        tracing::info!(client_ip, kind = ?request.kind, "feedback forwarded");
        Ok(())
    }

    /// [`admit`](Self::admit) then [`deliver`](Self::deliver).
    pub async fn submit(
        &self,
        client_ip: &str,
        request: &FeedbackRequest,
    ) -> Result<(), FeedbackError> {
        self.admit(client_ip)?;
        self.deliver(client_ip, request).await
    }
}
