//! Voice-call alert escalation
//!
//! One alert is at most two calls: place a call, poll it to a terminal
//! status, and only when nobody answered wait out a cooldown and call once
//! more.

mod clock;

#[cfg(test)]
mod model;

pub use clock::{Clock, ManualClock, TokioClock};

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::redact;
use crate::voice::{CallStatus, VoiceApi, VoiceError};

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(60);
pub const RETRY_COOLDOWN: Duration = Duration::from_secs(20);

pub const FIRST_CALL_MESSAGE: &str = "The monitored website is down. Please check immediately.";
pub const SECOND_CALL_MESSAGE: &str =
    "This is a second attempt. The monitored website is down. Please check immediately.";

/// Timing of one escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub poll_interval: Duration,
    /// Budget for a call to reach a terminal status
    pub status_timeout: Duration,
    /// Wait between an unanswered first call and the second
    pub retry_cooldown: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            status_timeout: STATUS_TIMEOUT,
            retry_cooldown: RETRY_COOLDOWN,
        }
    }
}

/// Escalation phases. `Done` is the only terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PlaceFirst,
    AwaitFirst,
    Cooldown,
    PlaceSecond,
    AwaitSecond,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Placed,
    Settled(CallStatus),
    CooledDown,
}

impl Phase {
    /// Pure transition function. Events that do not belong to the current
    /// phase end the escalation.
    pub fn next(self, event: Event) -> Phase {
        match (self, event) {
            (Phase::PlaceFirst, Event::Placed) => Phase::AwaitFirst,
            (Phase::AwaitFirst, Event::Settled(CallStatus::NoAnswer)) => Phase::Cooldown,
            (Phase::AwaitFirst, Event::Settled(_)) => Phase::Done,
            (Phase::Cooldown, Event::CooledDown) => Phase::PlaceSecond,
            (Phase::PlaceSecond, Event::Placed) => Phase::AwaitSecond,
            (Phase::AwaitSecond, Event::Settled(_)) => Phase::Done,
            _ => Phase::Done,
        }
    }
}

/// Which step of the escalation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PlaceFirst,
    PollFirst,
    PlaceSecond,
    PollSecond,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::PlaceFirst => "placing first call",
            Stage::PollFirst => "polling first call",
            Stage::PlaceSecond => "placing second call",
            Stage::PollSecond => "polling second call",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("escalation failed while {stage}: {source}")]
pub struct EscalationError {
    pub stage: Stage,
    #[source]
    pub source: VoiceError,
    /// The first call, when the failure happened after it settled
    pub first: Option<CallAttempt>,
}

impl EscalationError {
    /// Calls that went out before the failure
    pub fn calls_placed(&self) -> usize {
        match self.stage {
            Stage::PlaceFirst => 0,
            Stage::PollFirst | Stage::PlaceSecond => 1,
            Stage::PollSecond => 2,
        }
    }
}

/// Result of polling one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Terminal status; `NoAnswer` when the budget ran out
    pub status: CallStatus,
    pub polls: u32,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAttempt {
    pub sid: String,
    pub status: CallStatus,
    pub polls: u32,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationReport {
    pub first: CallAttempt,
    pub second: Option<CallAttempt>,
}

impl EscalationReport {
    pub fn calls_placed(&self) -> usize {
        1 + usize::from(self.second.is_some())
    }
}

/// Poll `sid` until it reaches a terminal status or the budget runs out.
///
/// A timeout is reported as `NoAnswer` so the retry rule can act on it.
pub async fn wait_for_terminal<V, C>(
    voice: &V,
    clock: &C,
    sid: &str,
    policy: &EscalationPolicy,
) -> Result<PollOutcome, VoiceError>
where
    V: VoiceApi + ?Sized,
    C: Clock + ?Sized,
{
    let start = clock.now();
    let mut polls = 0u32;

    while clock.now().duration_since(start) < policy.status_timeout {
        polls += 1;
        let status = voice.call_status(sid).await?;
        debug!("Poll {} for {}: {}", polls, redact::sid(sid), status);

        if status.is_terminal() {
            return Ok(PollOutcome {
                status,
                polls,
                timed_out: false,
            });
        }

        clock.sleep(policy.poll_interval).await;
    }

    warn!(
        "Call {} not settled after {:?}; treating as no-answer",
        redact::sid(sid),
        policy.status_timeout
    );
    Ok(PollOutcome {
        status: CallStatus::NoAnswer,
        polls,
        timed_out: true,
    })
}

pub struct Escalator<V, C = TokioClock> {
    voice: V,
    clock: C,
    policy: EscalationPolicy,
}

impl<V: VoiceApi> Escalator<V, TokioClock> {
    pub fn with_defaults(voice: V) -> Self {
        Self::new(voice, TokioClock, EscalationPolicy::default())
    }
}

impl<V: VoiceApi, C: Clock> Escalator<V, C> {
    pub fn new(voice: V, clock: C, policy: EscalationPolicy) -> Self {
        Self {
            voice,
            clock,
            policy,
        }
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Call `phone_number`, retrying once if the first call goes unanswered.
    pub async fn notify(&self, phone_number: &str) -> Result<EscalationReport, EscalationError> {
        let first = self.attempt(phone_number, None).await?;

        if Phase::AwaitFirst.next(Event::Settled(first.status)) != Phase::Cooldown {
            info!("First call was {}. No second call needed.", first.status);
            return Ok(EscalationReport {
                first,
                second: None,
            });
        }

        warn!(
            "First call was not answered. Second call in {:?}",
            self.policy.retry_cooldown
        );
        self.clock.sleep(self.policy.retry_cooldown).await;

        let second = self.attempt(phone_number, Some(&first)).await?;
        Ok(EscalationReport {
            first,
            second: Some(second),
        })
    }

    /// Place one call and poll it to a terminal status. `first` is the
    /// earlier attempt when this is the retry.
    async fn attempt(
        &self,
        phone_number: &str,
        first: Option<&CallAttempt>,
    ) -> Result<CallAttempt, EscalationError> {
        let (place, poll, message, ordinal) = match first {
            None => (Stage::PlaceFirst, Stage::PollFirst, FIRST_CALL_MESSAGE, "First"),
            Some(_) => (Stage::PlaceSecond, Stage::PollSecond, SECOND_CALL_MESSAGE, "Second"),
        };
        let failed = |stage: Stage, source: VoiceError| EscalationError {
            stage,
            source,
            first: first.cloned(),
        };

        let sid = self
            .voice
            .place_call(phone_number, message)
            .await
            .map_err(|e| failed(place, e))?;
        info!(
            "{} call initiated to {} ({})",
            ordinal,
            redact::phone_number(phone_number),
            redact::sid(&sid)
        );

        let outcome = wait_for_terminal(&self.voice, &self.clock, &sid, &self.policy)
            .await
            .map_err(|e| failed(poll, e))?;
        info!("{} call status: {}", ordinal, outcome.status);

        Ok(CallAttempt {
            sid,
            status: outcome.status,
            polls: outcome.polls,
            timed_out: outcome.timed_out,
        })
    }
}
