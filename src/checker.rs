//! Endpoint checks
//!
//! A check is one GET. The response status, and for a 403 the body, decide
//! whether the site is up, hidden behind a firewall block, or down.

use tracing::warn;

/// Text a firewall-generated 403 carries when the origin behind it is failing
pub const MASKED_OUTAGE_MARKER: &str = "502 Bad Gateway";

/// What came back from one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub status: u16,
    pub body: String,
}

/// Transport-level failure: no HTTP status was received
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CheckError::Timeout(err)
        } else if err.is_connect() {
            CheckError::Connect(err)
        } else {
            CheckError::Request(err)
        }
    }
}

/// Classified outcome of a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Up,
    /// 403 from the firewall with no sign of an upstream failure
    Blocked,
    /// 403 whose body shows the origin returned 502
    MaskedOutage,
    Down { status: u16 },
    Unreachable { error: String },
}

impl Verdict {
    /// Whether this outcome warrants a call. Transport failures only alert
    /// when `alert_on_unreachable` is set.
    pub fn warrants_alert(&self, alert_on_unreachable: bool) -> bool {
        match self {
            Verdict::Up | Verdict::Blocked => false,
            Verdict::MaskedOutage | Verdict::Down { .. } => true,
            Verdict::Unreachable { .. } => alert_on_unreachable,
        }
    }
}

pub fn classify(status: u16, body: &str) -> Verdict {
    match status {
        200 => Verdict::Up,
        403 if body.contains(MASKED_OUTAGE_MARKER) => Verdict::MaskedOutage,
        403 => Verdict::Blocked,
        _ => Verdict::Down { status },
    }
}

pub fn classify_result(result: &Result<Probe, CheckError>) -> Verdict {
    match result {
        Ok(probe) => classify(probe.status, &probe.body),
        Err(e) => Verdict::Unreachable {
            error: e.to_string(),
        },
    }
}

pub struct EndpointChecker {
    client: reqwest::Client,
}

impl EndpointChecker {
    /// `client` carries the timeout, User-Agent and trust anchor
    /// (see [`crate::tls::build_probe_client`]).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn check(&self, url: &str) -> Result<Probe, CheckError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not read response body from {}: {}", url, e);
                String::new()
            }
        };

        Ok(Probe { status, body })
    }
}



/// Kani formal verification proofs
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Proves: only 200 and 403 can avoid an alert
    #[kani::proof]
    fn non_forbidden_failures_always_alert() {
        let status: u16 = kani::any();
        kani::assume(status != 200 && status != 403);
        kani::assert(
            classify(status, "").warrants_alert(false),
            "non-200, non-403 must alert",
        );
    }
}
