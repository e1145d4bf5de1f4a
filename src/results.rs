use crate::app_dirs::AppDirs;
use crate::experiment::ExperimentKind;
use crate::regression::{linear_fit, Fit};
use crate::scores::{DifficultyError, DifficultyPoint};
use crate::session::Session;
use crate::util;
use chrono::Local;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;

/// Aggregated outcome of one completed session, recomputed from the score
/// table rather than stored alongside it.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub kind: ExperimentKind,
    pub completed_trials: usize,
    /// every recorded time; per-trial order is only meaningful for the
    /// single-condition reaction test
    pub trial_times: Vec<f64>,
    /// one point per distinct difficulty value, empty for the reaction test
    pub points: Vec<DifficultyPoint>,
    /// absent when the point set is too small or degenerate
    pub fit: Option<Fit>,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Result<Self, DifficultyError> {
        let kind = session.kind();
        let trial_times = session.scores().all_times();
        let mean_ms = util::mean(&trial_times).unwrap_or(0.0);
        let std_dev_ms = util::std_dev(&trial_times).unwrap_or(0.0);

        let points = if kind.has_fit() {
            session
                .scores()
                .difficulty_points(|condition| kind.difficulty(condition))?
        } else {
            Vec::new()
        };
        let tuples: Vec<(f64, f64)> = points.iter().map(|p| (p.difficulty, p.mean_ms)).collect();
        let fit = linear_fit(&tuples);

        Ok(Self {
            kind,
            completed_trials: session.completed_trials(),
            trial_times,
            points,
            fit,
            mean_ms,
            std_dev_ms,
        })
    }

    /// One-line fit description for the results screen.
    pub fn fit_line(&self) -> String {
        match &self.fit {
            Some(fit) => format!(
                "MT = {:.2} + {:.2} {}   R^2 = {:.2}",
                fit.intercept,
                fit.slope,
                self.kind.fit_term(),
                fit.r_squared()
            ),
            None => String::from("no fit (insufficient or degenerate data)"),
        }
    }

    /// Append one row to the session log under the app data dir. Callers
    /// ignore failures; logging never blocks the results screen.
    pub fn save_log(&self) -> Result<(), Box<dyn Error>> {
        match AppDirs::log_path() {
            Some(path) => self.save_log_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_log_to(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record([
                "date",
                "experiment",
                "trials",
                "mean_ms",
                "std_dev_ms",
                "slope",
                "intercept",
                "r_squared",
            ])?;
        }

        let (slope, intercept, r_squared) = match &self.fit {
            Some(fit) => (
                format!("{:.4}", fit.slope),
                format!("{:.4}", fit.intercept),
                format!("{:.4}", fit.r_squared()),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        writer.write_record([
            Local::now().format("%c").to_string(),
            self.kind.to_string(),
            self.completed_trials.to_string(),
            format!("{:.2}", self.mean_ms),
            format!("{:.2}", self.std_dev_ms),
            slope,
            intercept,
            r_squared,
        ])?;
        writer.flush()?;

        Ok(())
    }
}
