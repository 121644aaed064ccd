/// Escalation State Machine - Stateright Model
/// Exhaustively checks the phase transitions: every path places at most two
/// calls, and the second call only follows an unanswered first call.
///
/// Run with: cargo test --release escalation_model -- --nocapture

use stateright::*;

use super::{Event, Phase};
use crate::voice::CallStatus;

const TERMINAL: [CallStatus; 5] = [
    CallStatus::Completed,
    CallStatus::Failed,
    CallStatus::Busy,
    CallStatus::NoAnswer,
    CallStatus::Canceled,
];

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct EscalationModel {
    pub phase: Phase,
    pub calls_placed: u8,
    pub first_status: Option<CallStatus>,
    pub cooled_down: bool,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct EscalationChecker;

impl Model for EscalationChecker {
    type State = EscalationModel;
    type Action = Event;

    fn init_states(&self) -> Vec<Self::State> {
        vec![EscalationModel {
            phase: Phase::PlaceFirst,
            calls_placed: 0,
            first_status: None,
            cooled_down: false,
        }]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        match state.phase {
            Phase::PlaceFirst | Phase::PlaceSecond => actions.push(Event::Placed),
            Phase::AwaitFirst | Phase::AwaitSecond => {
                // Timeouts surface as NoAnswer, so the terminal set covers them
                actions.extend(TERMINAL.iter().map(|s| Event::Settled(*s)));
            }
            Phase::Cooldown => actions.push(Event::CooledDown),
            Phase::Done => {}
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        let mut next = state.clone();
        match action {
            Event::Placed => next.calls_placed += 1,
            Event::Settled(status) if state.phase == Phase::AwaitFirst => {
                next.first_status = Some(status);
            }
            Event::CooledDown => next.cooled_down = true,
            Event::Settled(_) => {}
        }
        next.phase = state.phase.next(action);
        Some(next)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("at_most_two_calls", |_, state: &EscalationModel| {
                state.calls_placed <= 2
            }),
            Property::always("second_call_only_after_no_answer", |_, state: &EscalationModel| {
                state.calls_placed < 2 || state.first_status == Some(CallStatus::NoAnswer)
            }),
            Property::always("second_call_only_after_cooldown", |_, state: &EscalationModel| {
                state.calls_placed < 2 || state.cooled_down
            }),
            Property::always("done_implies_first_settled", |_, state: &EscalationModel| {
                state.phase != Phase::Done || state.first_status.is_some()
            }),
            Property::sometimes("retry_reachable", |_, state: &EscalationModel| {
                state.calls_placed == 2
            }),
            Property::eventually("escalation_ends", |_, state: &EscalationModel| {
                state.phase == Phase::Done
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stateright::Checker;

    #[test]
    fn escalation_model_check_properties() {
        let checker = EscalationChecker.checker().spawn_bfs().join();
        println!("States explored: {}", checker.unique_state_count());
        checker.assert_properties();
    }

    #[test]
    fn escalation_model_explores_all_branches() {
        let checker = EscalationChecker.checker().spawn_bfs().join();
        // Four outcomes that end after one call, plus the five-step retry branch
        assert!(
            checker.unique_state_count() >= 10,
            "Expected at least 10 states, got {}",
            checker.unique_state_count()
        );
    }

    #[test]
    fn escalation_model_busy_path() {
        let model = EscalationChecker;
        let mut state = model.init_states()[0].clone();

        state = model.next_state(&state, Event::Placed).unwrap();
        assert_eq!(state.phase, Phase::AwaitFirst);

        state = model
            .next_state(&state, Event::Settled(CallStatus::Busy))
            .unwrap();
        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.calls_placed, 1);
    }

    #[test]
    fn escalation_model_retry_path() {
        let model = EscalationChecker;
        let mut state = model.init_states()[0].clone();

        for action in [
            Event::Placed,
            Event::Settled(CallStatus::NoAnswer),
            Event::CooledDown,
            Event::Placed,
            Event::Settled(CallStatus::NoAnswer),
        ] {
            state = model.next_state(&state, action).unwrap();
        }

        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.calls_placed, 2);
        assert!(state.cooled_down);
    }
}
