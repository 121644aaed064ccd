//! Pinned trust anchor for the monitored endpoints
//!
//! The certificate arrives as PEM text in the environment. It is written to
//! disk once per run and read back when the HTTP client is built, so every
//! request in the run verifies against that single anchor instead of the
//! system bundle. The file may hold a chain; every certificate in it is
//! trusted.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Per-request timeout for monitored endpoints
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Browser User-Agent so the web application firewall lets the probe through
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Write the certificate body to `path`.
///
/// Returns the path when a certificate was written, `None` when there was
/// nothing to write (the caller falls back to system roots).
pub fn install_certificate(pem: Option<&str>, path: &Path) -> Result<Option<PathBuf>> {
    match pem {
        Some(body) if !body.trim().is_empty() => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write certificate to {}", path.display()))?;
            info!("SSL certificate written to {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        _ => {
            warn!("SSL_CERTIFICATE is empty; using system trust roots");
            Ok(None)
        }
    }
}

/// Build the client used for endpoint checks.
///
/// With a trust anchor, built-in roots are disabled so only the pinned
/// certificates are trusted.
pub fn build_probe_client(trust_anchor: Option<&Path>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(BROWSER_USER_AGENT);

    if let Some(path) = trust_anchor {
        let pem = std::fs::read(path)
            .with_context(|| format!("Failed to read certificate from {}", path.display()))?;
        let certs = reqwest::Certificate::from_pem_bundle(&pem)
            .with_context(|| format!("Invalid PEM certificate in {}", path.display()))?;
        if certs.is_empty() {
            bail!("Invalid PEM certificate in {}: no certificates found", path.display());
        }
        info!("Pinning {} certificate(s) from {}", certs.len(), path.display());
        builder = builder.tls_built_in_root_certs(false);
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    builder.build().context("Failed to build HTTP client")
}
