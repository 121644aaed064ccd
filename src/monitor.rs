//! One monitoring run
//!
//! Checks each configured URL in order and escalates to a phone call when a
//! check warrants it. Nothing here returns an error: every failure is logged
//! and the run moves on to the next URL.

use tracing::{error, info, warn};

use crate::checker::{classify_result, EndpointChecker, Verdict};
use crate::config::Config;
use crate::escalate::{Clock, Escalator};
use crate::redact;
use crate::voice::VoiceApi;

/// What one run saw, in URL order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub verdicts: Vec<(String, Verdict)>,
    pub calls_placed: usize,
    pub escalation_failures: usize,
}

impl RunSummary {
    pub fn count(&self, pred: impl Fn(&Verdict) -> bool) -> usize {
        self.verdicts.iter().filter(|(_, v)| pred(v)).count()
    }

    pub fn up(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Up))
    }

    pub fn unreachable(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Unreachable { .. }))
    }
}

/// Run every check once, escalating as needed
pub async fn run_once<V, C>(
    config: &Config,
    checker: &EndpointChecker,
    escalator: &Escalator<V, C>,
) -> RunSummary
where
    V: VoiceApi,
    C: Clock,
{
    info!("Monitoring {} URLs", config.urls.len());
    let mut summary = RunSummary::default();

    for url in &config.urls {
        info!(" - {}", url);
        let verdict = classify_result(&checker.check(url).await);
        log_verdict(url, &verdict, config.alert_on_unreachable);

        if verdict.warrants_alert(config.alert_on_unreachable) {
            send_call_alert(escalator, &config.alert_phone, &mut summary).await;
        }

        summary.verdicts.push((url.clone(), verdict));
    }

    info!(
        "Run complete: {}/{} up, {} call(s) placed",
        summary.up(),
        summary.verdicts.len(),
        summary.calls_placed
    );
    summary
}

fn log_verdict(url: &str, verdict: &Verdict, alert_on_unreachable: bool) {
    match verdict {
        Verdict::Up => info!("SUCCESS: {} is up with status code 200", url),
        Verdict::Blocked => {
            warn!("WAF blocked request to {} (403) with no sign of an outage. No action needed.", url)
        }
        Verdict::MaskedOutage => error!(
            "ALERT: {} returned 403 but the body shows a 502 Bad Gateway behind the WAF",
            url
        ),
        Verdict::Down { status } => {
            error!("ALERT: {} is down with status code {}", url, status)
        }
        Verdict::Unreachable { error } => {
            error!("ERROR: Unable to reach {}: {}", url, error);
            if !alert_on_unreachable {
                warn!("Not calling for unreachable {} (ALERT_ON_UNREACHABLE is off)", url);
            }
        }
    }
}

async fn send_call_alert<V, C>(escalator: &Escalator<V, C>, phone: &str, summary: &mut RunSummary)
where
    V: VoiceApi,
    C: Clock,
{
    match escalator.notify(phone).await {
        Ok(report) => {
            summary.calls_placed += report.calls_placed();
            match &report.second {
                Some(second) => info!(
                    "Escalation finished: first call {}, second call {}",
                    report.first.status, second.status
                ),
                None => info!("Escalation finished: first call {}", report.first.status),
            }
        }
        Err(e) => {
            summary.calls_placed += e.calls_placed();
            summary.escalation_failures += 1;
            error!(
                "Unable to send call notification to {}: {}",
                redact::phone_number(phone),
                e
            );
        }
    }
}
