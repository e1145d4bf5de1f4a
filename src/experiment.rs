use crate::conditions::Condition;
use clap::ValueEnum;

/// The three experiment types movelab can run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExperimentKind {
    /// simple reaction-time test: click as soon as the screen arms
    Reaction,
    /// fitts-law pointing task: click the start bar, then the target bar
    Fitts,
    /// steering-law path task: traverse the tunnel without leaving it
    Steering,
}

impl ExperimentKind {
    /// Factor-level sets fed to the condition generator. `distances` doubles
    /// as the path amplitude for the steering task.
    pub fn factor_sets(&self, distances: &[u32], widths: &[u32]) -> Vec<Vec<u32>> {
        match self {
            ExperimentKind::Reaction => vec![],
            ExperimentKind::Fitts | ExperimentKind::Steering => {
                vec![distances.to_vec(), widths.to_vec()]
            }
        }
    }

    /// Whether sessions of this kind reduce to difficulty points and a fit.
    pub fn has_fit(&self) -> bool {
        !matches!(self, ExperimentKind::Reaction)
    }

    /// Index of difficulty for one condition.
    ///
    /// Non-finite values (missing factors, zero width) are reported by the
    /// aggregator as configuration errors rather than folded into the points.
    pub fn difficulty(&self, condition: &Condition) -> f64 {
        let amplitude = condition.level(0).map(f64::from).unwrap_or(f64::NAN);
        let width = condition.level(1).map(f64::from).unwrap_or(f64::NAN);

        match self {
            ExperimentKind::Reaction => f64::NAN,
            ExperimentKind::Fitts => (amplitude / width + 1.0).log2(),
            ExperimentKind::Steering => amplitude / width,
        }
    }

    pub fn x_label(&self) -> &'static str {
        match self {
            ExperimentKind::Reaction => "trial",
            ExperimentKind::Fitts => "ID [bits]",
            ExperimentKind::Steering => "ID [A/W]",
        }
    }

    pub fn y_label(&self) -> &'static str {
        match self {
            ExperimentKind::Reaction => "RT [ms]",
            _ => "MT [ms]",
        }
    }

    /// Short tag for the first factor shown during a trial ("D: 384").
    pub fn amplitude_tag(&self) -> &'static str {
        match self {
            ExperimentKind::Fitts => "D",
            _ => "A",
        }
    }

    /// Term printed in the fit equation, e.g. `MT = a + b ID`.
    pub fn fit_term(&self) -> &'static str {
        match self {
            ExperimentKind::Steering => "A/W",
            _ => "ID",
        }
    }
}
