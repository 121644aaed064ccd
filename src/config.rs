use anyhow::{bail, Context, Result};
#[cfg(test)]
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Endpoints watched when `MONITOR_URLS` is not set
pub const DEFAULT_URLS: [&str; 2] = [
    "https://musaid-donationbox.myfundbox.com/MultipleDBox.jsf?orgid=1331",
    "https://fcrm.myfundbox.com/MultipleDBox.jsf?orgid=1331",
];

/// Where the pinned certificate is written before the run
pub const DEFAULT_CERT_PATH: &str = "/tmp/myfundbox.crt";

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Clone)]
pub struct Config {
    // Twilio credentials
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_api_base: String,

    // Caller id for outgoing alert calls
    pub from_phone: String,

    // Who gets called when a site is down
    pub alert_phone: String,

    // PEM body of the trust anchor (optional, system roots used when absent)
    pub certificate_pem: Option<String>,
    pub cert_path: PathBuf,

    pub urls: Vec<String>,

    // Escalate transport failures as well as bad statuses
    pub alert_on_unreachable: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env if present, ignore if missing
        Self::from_getter(|key| env::var(key).ok())
    }

    /// Parse config from a custom getter function (for testing)
    pub fn from_getter<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let urls = match get("MONITOR_URLS") {
            Some(raw) if !raw.trim().is_empty() => parse_url_list(&raw),
            _ => DEFAULT_URLS.iter().map(|u| u.to_string()).collect(),
        };

        Ok(Config {
            twilio_account_sid: get("TWILIO_ACCOUNT_SID").context("TWILIO_ACCOUNT_SID not set")?,
            twilio_auth_token: get("TWILIO_AUTH_TOKEN").context("TWILIO_AUTH_TOKEN not set")?,
            twilio_api_base: get("TWILIO_API_BASE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),

            from_phone: get("TWILIO_PHONE_NUMBER").context("TWILIO_PHONE_NUMBER not set")?,
            alert_phone: get("YOUR_PHONE_NUMBER").context("YOUR_PHONE_NUMBER not set")?,

            certificate_pem: get("SSL_CERTIFICATE").filter(|s| !s.trim().is_empty()),
            cert_path: get("SSL_CERT_PATH")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CERT_PATH.to_string())
                .into(),

            urls,

            alert_on_unreachable: match get("ALERT_ON_UNREACHABLE") {
                Some(v) => parse_bool(&v)
                    .context("ALERT_ON_UNREACHABLE must be true/false")?,
                None => false,
            },
        })
    }

    /// Create config from a HashMap (convenience for testing)
    #[cfg(test)]
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_getter(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Validate configuration values at startup.
    /// Returns Ok(()) if all validations pass, or Err with details of what failed.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if !self.twilio_account_sid.starts_with("AC") || self.twilio_account_sid.len() < 10 {
            errors.push("TWILIO_ACCOUNT_SID should look like 'AC' followed by 32 hex chars.".to_string());
        }

        if self.twilio_auth_token.trim().is_empty() {
            errors.push("TWILIO_AUTH_TOKEN cannot be empty.".to_string());
        }

        for (key, phone) in [
            ("TWILIO_PHONE_NUMBER", &self.from_phone),
            ("YOUR_PHONE_NUMBER", &self.alert_phone),
        ] {
            if !Self::is_valid_phone(phone) {
                errors.push(format!(
                    "{} '{}' invalid. Expected E.164, e.g. +15551234567.",
                    key, phone
                ));
            }
        }

        if !is_http_url(&self.twilio_api_base) {
            errors.push(format!(
                "TWILIO_API_BASE '{}' must start with http:// or https://.",
                self.twilio_api_base
            ));
        }

        if self.urls.is_empty() {
            errors.push("MONITOR_URLS resolved to an empty list.".to_string());
        }
        for url in &self.urls {
            if !is_http_url(url) {
                errors.push(format!("URL '{}' must start with http:// or https://.", url));
            }
        }

        if let Some(pem) = &self.certificate_pem {
            if !pem.contains("-----BEGIN CERTIFICATE-----") {
                errors.push("SSL_CERTIFICATE does not contain a PEM certificate block.".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }

    /// E.164: leading '+', then 8 to 15 digits
    fn is_valid_phone(phone: &str) -> bool {
        match phone.strip_prefix('+') {
            Some(digits) => {
                (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        }
    }
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
