use movelab::conditions::generate_conditions;
use movelab::experiment::ExperimentKind;
use movelab::results::SessionSummary;
use movelab::session::{Phase, Session, TrialOutcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

fn drive_to_completion(session: &mut Session, slope: f64, intercept: f64) {
    let base = Instant::now();
    let mut offset = 0.0f64;

    while !session.is_complete() {
        let difficulty = session
            .current_condition()
            .map(|c| session.kind().difficulty(c))
            .unwrap_or(0.0);
        let elapsed_ms = if difficulty.is_finite() {
            intercept + slope * difficulty
        } else {
            intercept
        };

        session.trial_start(base + Duration::from_secs_f64(offset));
        session.trial_end(base + Duration::from_secs_f64(offset + elapsed_ms / 1000.0));
        offset += 30.0;
    }
}

#[test]
fn classic_fitts_session_reduces_to_seven_points_and_a_clean_fit() {
    let mut rng = StdRng::seed_from_u64(2024);
    let sets = ExperimentKind::Fitts.factor_sets(&[256, 384, 512], &[32, 64, 96]);
    let conditions = generate_conditions(&sets, 5, &mut rng);
    assert_eq!(conditions.len(), 45);

    let mut session = Session::new(ExperimentKind::Fitts, conditions);
    drive_to_completion(&mut session, 150.0, 200.0);

    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(session.completed_trials(), 45);

    // all nine factor pairs completed exactly five trials each
    assert_eq!(session.scores().condition_count(), 9);
    for times in session.scores().entries().values() {
        assert_eq!(times.len(), 5);
    }

    let summary = SessionSummary::from_session(&session).unwrap();

    // the nine pairs collapse onto seven distinct difficulty values:
    // 256/32 and 512/64 share a ratio, as do 256/64 and 384/96
    assert_eq!(summary.points.len(), 7);
    assert!(summary.points.len() <= 9);

    let fit = summary.fit.expect("seven distinct points fit a line");
    assert!((fit.slope - 150.0).abs() < 1e-3);
    assert!((fit.intercept - 200.0).abs() < 1e-2);
    assert!(fit.r_squared() > 0.999);
}

#[test]
fn steering_session_aggregates_by_amplitude_over_width() {
    let mut rng = StdRng::seed_from_u64(7);
    let sets = ExperimentKind::Steering.factor_sets(&[256, 384, 512], &[32, 64, 96]);
    let conditions = generate_conditions(&sets, 1, &mut rng);
    assert_eq!(conditions.len(), 9);

    let mut session = Session::new(ExperimentKind::Steering, conditions);
    drive_to_completion(&mut session, 80.0, 400.0);

    let summary = SessionSummary::from_session(&session).unwrap();

    // 384/96 duplicates 256/64 and 512/64 duplicates 256/32
    assert_eq!(summary.points.len(), 7);
    let fit = summary.fit.unwrap();
    assert!((fit.slope - 80.0).abs() < 1e-3);
    assert!(fit.r_squared() > 0.999);
}

#[test]
fn reaction_session_is_bare_trials_without_a_fit() {
    let mut rng = StdRng::seed_from_u64(1);
    let sets = ExperimentKind::Reaction.factor_sets(&[], &[]);
    let conditions = generate_conditions(&sets, 20, &mut rng);
    assert_eq!(conditions.len(), 20);

    let mut session = Session::new(ExperimentKind::Reaction, conditions);
    drive_to_completion(&mut session, 0.0, 275.0);

    let summary = SessionSummary::from_session(&session).unwrap();

    assert_eq!(summary.completed_trials, 20);
    assert_eq!(summary.trial_times.len(), 20);
    assert!(summary.points.is_empty());
    assert!(summary.fit.is_none());
    assert!((summary.mean_ms - 275.0).abs() < 1e-6);
}

#[test]
fn single_condition_session_reports_a_degenerate_fit() {
    let mut rng = StdRng::seed_from_u64(3);
    let sets = ExperimentKind::Fitts.factor_sets(&[256], &[64]);
    let conditions = generate_conditions(&sets, 5, &mut rng);

    let mut session = Session::new(ExperimentKind::Fitts, conditions);
    drive_to_completion(&mut session, 120.0, 300.0);

    let summary = SessionSummary::from_session(&session).unwrap();

    assert_eq!(summary.points.len(), 1);
    assert!(summary.fit.is_none());
    assert!(summary.fit_line().contains("no fit"));
}

#[test]
fn end_input_before_start_never_records_anything() {
    let mut rng = StdRng::seed_from_u64(5);
    let sets = ExperimentKind::Fitts.factor_sets(&[256, 384], &[32]);
    let mut session = Session::new(
        ExperimentKind::Fitts,
        generate_conditions(&sets, 1, &mut rng),
    );

    let outcome = session.trial_end(Instant::now());

    assert_eq!(outcome, TrialOutcome::Ignored);
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.completed_trials(), 0);
    assert!(session.scores().is_empty());
}
