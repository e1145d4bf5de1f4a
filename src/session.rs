//! The per-session trial state machine.
//!
//! All transitions take explicit monotonic timestamps so sessions can be
//! driven and asserted in tests without sleeping. Out-of-order or
//! unrecognized inputs are absorbed as no-ops; they never fail the session.

use crate::conditions::Condition;
use crate::experiment::ExperimentKind;
use crate::scores::ScoreTable;
use std::time::Instant;

/// Interaction phase of the current trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// waiting for the start input of the current condition
    Idle,
    /// timer armed, waiting for the end input
    Running,
    /// steering only: the pointer left the tunnel mid-traversal
    Error,
    /// queue exhausted, results available
    Complete,
}

/// Screen region reported by the pointer layer for the steering task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Start,
    Middle,
    End,
    Outside,
}

/// Result of feeding an end-of-trial input to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialOutcome {
    /// trial recorded, next condition is up
    Recorded { elapsed_ms: f64 },
    /// trial recorded and the queue is exhausted
    Finished { elapsed_ms: f64 },
    /// input did not apply in the current phase
    Ignored,
}

/// One experiment session: the remaining condition queue, the trial in
/// flight, and everything recorded so far. Owns the score table; nothing
/// else mutates it.
#[derive(Debug)]
pub struct Session {
    kind: ExperimentKind,
    queue: Vec<Condition>,
    current: Option<Condition>,
    phase: Phase,
    started_at: Option<Instant>,
    prev_region: Region,
    scores: ScoreTable,
    generated: usize,
}

impl Session {
    /// Takes the full randomized queue; conditions are consumed from the
    /// end. An empty queue completes immediately.
    pub fn new(kind: ExperimentKind, mut conditions: Vec<Condition>) -> Self {
        let generated = conditions.len();
        let current = conditions.pop();
        let phase = if current.is_some() {
            Phase::Idle
        } else {
            Phase::Complete
        };

        Self {
            kind,
            queue: conditions,
            current,
            phase,
            started_at: None,
            prev_region: Region::Outside,
            scores: ScoreTable::default(),
            generated,
        }
    }

    pub fn kind(&self) -> ExperimentKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn current_condition(&self) -> Option<&Condition> {
        self.current.as_ref()
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    /// Number of conditions the session was created with.
    pub fn generated(&self) -> usize {
        self.generated
    }

    /// Trials recorded so far. Together with the remaining queue and the
    /// condition in flight this always accounts for every generated
    /// condition.
    pub fn completed_trials(&self) -> usize {
        self.generated - self.remaining()
    }

    /// Conditions not yet recorded: the queue plus the one in flight.
    pub fn remaining(&self) -> usize {
        self.queue.len() + usize::from(self.current.is_some())
    }

    /// Start input: arms the timer for the current condition. Ignored
    /// unless idle, so a second start cannot restart a running timer.
    pub fn trial_start(&mut self, now: Instant) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
            self.started_at = Some(now);
        }
    }

    /// End input: records the elapsed time for the current condition and
    /// advances the queue. A no-op in any phase but `Running`.
    pub fn trial_end(&mut self, now: Instant) -> TrialOutcome {
        if self.phase != Phase::Running {
            return TrialOutcome::Ignored;
        }
        let Some(started) = self.started_at.take() else {
            return TrialOutcome::Ignored;
        };
        let Some(condition) = self.current.take() else {
            return TrialOutcome::Ignored;
        };

        let elapsed_ms = now.saturating_duration_since(started).as_secs_f64() * 1000.0;
        self.scores.record(condition, elapsed_ms);

        self.current = self.queue.pop();
        if self.current.is_some() {
            self.phase = Phase::Idle;
            TrialOutcome::Recorded { elapsed_ms }
        } else {
            self.phase = Phase::Complete;
            TrialOutcome::Finished { elapsed_ms }
        }
    }

    /// Pointer region event for the steering task.
    ///
    /// A trial arms only by entering the tunnel directly from the start
    /// band; that also re-arms after an error, so a blown trial must be
    /// re-traversed from the start. Leaving every region mid-traversal is
    /// the error transition, and reaching the end band completes the trial.
    /// Region events for other experiment kinds are no-ops.
    pub fn region_enter(&mut self, region: Region, now: Instant) -> TrialOutcome {
        if self.kind != ExperimentKind::Steering {
            return TrialOutcome::Ignored;
        }

        let outcome = match self.phase {
            Phase::Idle | Phase::Error => {
                if self.prev_region == Region::Start && region == Region::Middle {
                    self.phase = Phase::Running;
                    self.started_at = Some(now);
                }
                TrialOutcome::Ignored
            }
            Phase::Running => match region {
                Region::Outside => {
                    self.phase = Phase::Error;
                    TrialOutcome::Ignored
                }
                Region::End => self.trial_end(now),
                _ => TrialOutcome::Ignored,
            },
            Phase::Complete => TrialOutcome::Ignored,
        };

        self.prev_region = region;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn t(base: Instant, offset_ms: u64) -> Instant {
        base + Duration::from_millis(offset_ms)
    }

    fn fitts_session(conditions: &[[u32; 2]]) -> Session {
        Session::new(
            ExperimentKind::Fitts,
            conditions.iter().map(|c| Condition::new(*c)).collect(),
        )
    }

    #[test]
    fn empty_queue_completes_immediately() {
        let session = Session::new(ExperimentKind::Fitts, vec![]);

        assert_eq!(session.phase(), Phase::Complete);
        assert_eq!(session.current_condition(), None);
        assert_eq!(session.completed_trials(), 0);
    }

    #[test]
    fn start_then_end_records_one_trial() {
        let base = Instant::now();
        let mut session = fitts_session(&[[256, 32], [384, 64]]);

        session.trial_start(t(base, 0));
        assert_eq!(session.phase(), Phase::Running);

        let outcome = session.trial_end(t(base, 450));
        assert_matches!(outcome, TrialOutcome::Recorded { elapsed_ms } if elapsed_ms == 450.0);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.completed_trials(), 1);
        assert_eq!(session.scores().all_times(), vec![450.0]);
    }

    #[test]
    fn end_while_idle_is_a_no_op() {
        let base = Instant::now();
        let mut session = fitts_session(&[[256, 32]]);

        let outcome = session.trial_end(t(base, 100));

        assert_eq!(outcome, TrialOutcome::Ignored);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.scores().is_empty());
        assert_eq!(session.completed_trials(), 0);
    }

    #[test]
    fn second_start_does_not_restart_the_timer() {
        let base = Instant::now();
        let mut session = fitts_session(&[[256, 32]]);

        session.trial_start(t(base, 0));
        session.trial_start(t(base, 300));
        let outcome = session.trial_end(t(base, 500));

        // elapsed is measured from the first start
        assert_matches!(outcome, TrialOutcome::Finished { elapsed_ms } if elapsed_ms == 500.0);
    }

    #[test]
    fn draining_the_queue_completes_the_session() {
        let base = Instant::now();
        let mut session = fitts_session(&[[256, 32], [384, 64], [512, 96]]);

        for i in 0..2 {
            session.trial_start(t(base, i * 1000));
            assert_matches!(
                session.trial_end(t(base, i * 1000 + 400)),
                TrialOutcome::Recorded { .. }
            );
        }
        session.trial_start(t(base, 5000));
        assert_matches!(
            session.trial_end(t(base, 5400)),
            TrialOutcome::Finished { .. }
        );

        assert_eq!(session.phase(), Phase::Complete);
        assert_eq!(session.completed_trials(), 3);
        assert_eq!(session.scores().all_times().len(), 3);
    }

    #[test]
    fn input_after_completion_is_ignored() {
        let base = Instant::now();
        let mut session = fitts_session(&[[256, 32]]);

        session.trial_start(t(base, 0));
        session.trial_end(t(base, 200));
        assert_eq!(session.phase(), Phase::Complete);

        session.trial_start(t(base, 300));
        assert_eq!(session.phase(), Phase::Complete);
        assert_eq!(session.trial_end(t(base, 400)), TrialOutcome::Ignored);
        assert_eq!(session.completed_trials(), 1);
    }

    #[test]
    fn queue_plus_completed_always_accounts_for_every_condition() {
        let base = Instant::now();
        let conditions = [[256u32, 32u32], [384, 64], [512, 96], [256, 64]];
        let mut session = fitts_session(&conditions);

        for i in 0..conditions.len() {
            assert_eq!(session.completed_trials(), i);
            assert_eq!(
                session.completed_trials() + session.remaining(),
                session.generated()
            );

            session.trial_start(t(base, i as u64 * 1000));
            session.trial_end(t(base, i as u64 * 1000 + 300));
        }
        assert_eq!(session.completed_trials(), conditions.len());
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn steering_arms_only_from_start_into_middle() {
        let base = Instant::now();
        let mut session = Session::new(
            ExperimentKind::Steering,
            vec![Condition::new([384, 64])],
        );

        // wandering in from outside does not arm
        session.region_enter(Region::Middle, t(base, 0));
        assert_eq!(session.phase(), Phase::Idle);

        session.region_enter(Region::Start, t(base, 10));
        session.region_enter(Region::Middle, t(base, 20));
        assert_eq!(session.phase(), Phase::Running);
    }

    #[test]
    fn steering_completes_at_the_end_band() {
        let base = Instant::now();
        let mut session = Session::new(
            ExperimentKind::Steering,
            vec![Condition::new([384, 64])],
        );

        session.region_enter(Region::Start, t(base, 0));
        session.region_enter(Region::Middle, t(base, 100));
        let outcome = session.region_enter(Region::End, t(base, 800));

        assert_matches!(outcome, TrialOutcome::Finished { elapsed_ms } if elapsed_ms == 700.0);
        assert_eq!(session.phase(), Phase::Complete);
    }

    #[test]
    fn leaving_the_tunnel_is_an_error_until_retraversal() {
        let base = Instant::now();
        let mut session = Session::new(
            ExperimentKind::Steering,
            vec![Condition::new([384, 64])],
        );

        session.region_enter(Region::Start, t(base, 0));
        session.region_enter(Region::Middle, t(base, 100));
        session.region_enter(Region::Outside, t(base, 200));
        assert_eq!(session.phase(), Phase::Error);

        // reaching the end without re-traversing records nothing
        assert_eq!(
            session.region_enter(Region::End, t(base, 300)),
            TrialOutcome::Ignored
        );
        assert_eq!(session.phase(), Phase::Error);
        assert!(session.scores().is_empty());

        // back to the start band, through the tunnel, out the end
        session.region_enter(Region::Start, t(base, 400));
        session.region_enter(Region::Middle, t(base, 500));
        assert_eq!(session.phase(), Phase::Running);
        let outcome = session.region_enter(Region::End, t(base, 900));

        // the timer restarted on re-entry
        assert_matches!(outcome, TrialOutcome::Finished { elapsed_ms } if elapsed_ms == 400.0);
    }

    #[test]
    fn region_events_are_ignored_outside_steering() {
        let base = Instant::now();
        let mut session = fitts_session(&[[256, 32]]);

        session.region_enter(Region::Start, t(base, 0));
        session.region_enter(Region::Middle, t(base, 10));

        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn recorded_conditions_come_from_the_generated_set() {
        let base = Instant::now();
        let conditions = vec![Condition::new([256, 32]), Condition::new([384, 64])];
        let mut session = Session::new(ExperimentKind::Fitts, conditions.clone());

        while !session.is_complete() {
            session.trial_start(t(base, 0));
            session.trial_end(t(base, 250));
        }

        for condition in session.scores().entries().keys() {
            assert!(conditions.contains(condition));
        }
    }
}
