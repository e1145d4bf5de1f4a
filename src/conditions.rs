use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// One trial configuration: an ordered tuple of factor levels.
///
/// Conditions are value-equal and hashable, so they key the score table
/// directly instead of going through a serialized form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Condition {
    levels: Vec<u32>,
}

impl Condition {
    pub fn new<I: IntoIterator<Item = u32>>(levels: I) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    /// Factor level at `idx`, if the condition carries that many factors.
    pub fn level(&self, idx: usize) -> Option<u32> {
        self.levels.get(idx).copied()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.levels.is_empty() {
            return write!(f, "-");
        }
        write!(f, "{}", self.levels.iter().join("x"))
    }
}

/// Build the randomized trial queue for a session.
///
/// Each repetition block shuffles every factor set independently, then takes
/// the full cross product with the first factor varying slowest. Blocks are
/// concatenated, so every repetition covers the factorial set once before it
/// repeats. The queue is consumed from the end.
///
/// With no factor sets at all (the reaction test) each repetition contributes
/// a single bare trial; a present-but-empty factor set yields an empty queue.
pub fn generate_conditions<R: Rng>(
    factor_sets: &[Vec<u32>],
    repetitions: usize,
    rng: &mut R,
) -> Vec<Condition> {
    let block_len: usize = factor_sets.iter().map(Vec::len).product();
    let mut queue = Vec::with_capacity(block_len * repetitions);

    for _ in 0..repetitions {
        if factor_sets.is_empty() {
            queue.push(Condition::default());
            continue;
        }

        let shuffled: Vec<Vec<u32>> = factor_sets
            .iter()
            .map(|set| {
                let mut set = set.clone();
                set.shuffle(rng);
                set
            })
            .collect();

        for combo in shuffled
            .iter()
            .map(|set| set.iter().copied())
            .multi_cartesian_product()
        {
            queue.push(Condition::new(combo));
        }
    }

    queue
}
