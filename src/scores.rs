use crate::conditions::Condition;
use crate::util;
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// One aggregated chart point: an index of difficulty and the mean elapsed
/// time over every trial that mapped to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyPoint {
    pub difficulty: f64,
    pub mean_ms: f64,
}

/// A condition whose difficulty function came out non-finite (zero width,
/// missing factors). Surfaced instead of silently dropping the trials.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyError {
    pub condition: Condition,
    pub value: f64,
}

impl fmt::Display for DifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "difficulty for condition {} is not finite ({})",
            self.condition, self.value
        )
    }
}

impl Error for DifficultyError {}

/// Raw per-condition timings, appended as trials complete. Entries are never
/// removed; its keys are exactly the conditions with at least one completed
/// trial.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    entries: HashMap<Condition, Vec<f64>>,
}

impl ScoreTable {
    pub fn record(&mut self, condition: Condition, elapsed_ms: f64) {
        self.entries.entry(condition).or_default().push(elapsed_ms);
    }

    pub fn entries(&self) -> &HashMap<Condition, Vec<f64>> {
        &self.entries
    }

    pub fn times(&self, condition: &Condition) -> Option<&[f64]> {
        self.entries.get(condition).map(Vec::as_slice)
    }

    pub fn condition_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every recorded time, flattened across conditions. Only aggregate
    /// statistics (mean, deviation) should be read from this; the order
    /// across conditions is unspecified.
    pub fn all_times(&self) -> Vec<f64> {
        self.entries.values().flatten().copied().collect()
    }

    /// Group recorded times by `difficulty(condition)` and reduce each group
    /// to its arithmetic mean, sorted by difficulty.
    ///
    /// Grouping is by difficulty value, not condition identity: conditions
    /// with different factor levels but the same computed difficulty merge
    /// into one point. The grouping key is the value's bit pattern, which is
    /// exact because equal-ratio conditions produce bit-identical results.
    pub fn difficulty_points<F>(&self, difficulty: F) -> Result<Vec<DifficultyPoint>, DifficultyError>
    where
        F: Fn(&Condition) -> f64,
    {
        let mut grouped: HashMap<u64, Vec<f64>> = HashMap::new();

        for (condition, times) in &self.entries {
            let value = difficulty(condition);
            if !value.is_finite() {
                return Err(DifficultyError {
                    condition: condition.clone(),
                    value,
                });
            }
            grouped
                .entry(value.to_bits())
                .or_default()
                .extend_from_slice(times);
        }

        Ok(grouped
            .into_iter()
            .filter_map(|(bits, times)| {
                util::mean(&times).map(|mean_ms| DifficultyPoint {
                    difficulty: f64::from_bits(bits),
                    mean_ms,
                })
            })
            .sorted_by(|a, b| a.difficulty.total_cmp(&b.difficulty))
            .collect())
    }
}
