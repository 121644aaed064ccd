//! Twilio voice-call API client
//!
//! Two operations are used: place an outbound call that speaks a message,
//! and fetch the current status of a call by sid.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

/// Status of a call as reported by the voice API.
///
/// Twilio's `queued`, `initiated`, `ringing` and `in-progress` all collapse
/// into `Pending`; the other five are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    Pending,
    Completed,
    Failed,
    Busy,
    NoAnswer,
    Canceled,
}

impl CallStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "completed" => CallStatus::Completed,
            "failed" => CallStatus::Failed,
            "busy" => CallStatus::Busy,
            "no-answer" => CallStatus::NoAnswer,
            "canceled" => CallStatus::Canceled,
            _ => CallStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
            CallStatus::Busy => "busy",
            CallStatus::NoAnswer => "no-answer",
            CallStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice API failures, classified by what the caller can do about them
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("voice API unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("voice API rejected credentials")]
    Unauthorized,
    #[error("voice API rejected request (code {code:?}): {message}")]
    Rejected { code: Option<u32>, message: String },
    #[error("voice API server error (HTTP {status})")]
    Server { status: u16 },
    #[error("unexpected voice API response: {0}")]
    Decode(String),
}

/// Placing a call and fetching its status
#[async_trait]
pub trait VoiceApi: Send + Sync {
    /// Start a call to `to` that speaks `message`. Returns the call sid.
    async fn place_call(&self, to: &str, message: &str) -> Result<String, VoiceError>;

    /// Point-in-time status of a previously placed call
    async fn call_status(&self, sid: &str) -> Result<CallStatus, VoiceError>;
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CallResource {
    pub sid: String,
    pub status: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Wrap a spoken message in TwiML
pub fn build_twiml(message: &str) -> String {
    format!("<Response><Say>{}</Say></Response>", escape_xml(message))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Form body for the create-call request
pub fn build_call_params(to: &str, from: &str, message: &str) -> [(&'static str, String); 3] {
    [
        ("To", to.to_string()),
        ("From", from.to_string()),
        ("Twiml", build_twiml(message)),
    ]
}

/// Map a non-success HTTP response to a classified error
pub fn classify_error(status: u16, body: &str) -> VoiceError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    match status {
        401 | 403 => VoiceError::Unauthorized,
        400..=499 => {
            let (code, message) = match parsed {
                Some(b) => (b.code, b.message.unwrap_or_else(|| "Unknown error".to_string())),
                None => (None, format!("HTTP {}", status)),
            };
            VoiceError::Rejected { code, message }
        }
        _ => VoiceError::Server { status },
    }
}

/// Per-request timeout for the voice API
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TwilioClient {
    client: reqwest::Client,
    timeout: Duration,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_phone: String,
}

impl TwilioClient {
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(config, API_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &Config, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            api_base: config.twilio_api_base.clone(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_phone: config.from_phone.clone(),
        }
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base,
            urlencoding::encode(&self.account_sid)
        )
    }

    fn call_url(&self, sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls/{}.json",
            self.api_base,
            urlencoding::encode(&self.account_sid),
            urlencoding::encode(sid)
        )
    }

    async fn read_call(response: reqwest::Response) -> Result<CallResource, VoiceError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| VoiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl VoiceApi for TwilioClient {
    async fn place_call(&self, to: &str, message: &str) -> Result<String, VoiceError> {
        let params = build_call_params(to, &self.from_phone, message);
        let response = self
            .client
            .post(self.calls_url())
            .timeout(self.timeout)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        let call = Self::read_call(response).await?;
        debug!("Call created with status {}", call.status);
        Ok(call.sid)
    }

    async fn call_status(&self, sid: &str) -> Result<CallStatus, VoiceError> {
        let response = self
            .client
            .get(self.call_url(sid))
            .timeout(self.timeout)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let call = Self::read_call(response).await?;
        Ok(CallStatus::from_api(&call.status))
    }
}
