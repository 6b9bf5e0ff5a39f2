use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Token, cost and turn accounting. Pointwise addition with [`UsageSummary::default`]
/// as identity, so per-invocation usage folds into per-task and per-workflow totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub turns: u64,
}

impl UsageSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// One-line rendering used in result summaries.
    pub fn summary_text(&self) -> String {
        format!(
            "turns={} input={} output={} cacheRead={} cacheWrite={} cost=${:.4}",
            self.turns, self.input, self.output, self.cache_read, self.cache_write, self.total_cost
        )
    }
}

impl Add for UsageSummary {
    type Output = UsageSummary;

    fn add(self, rhs: UsageSummary) -> UsageSummary {
        UsageSummary {
            input: self.input + rhs.input,
            output: self.output + rhs.output,
            cache_read: self.cache_read + rhs.cache_read,
            cache_write: self.cache_write + rhs.cache_write,
            total_tokens: self.total_tokens + rhs.total_tokens,
            total_cost: self.total_cost + rhs.total_cost,
            turns: self.turns + rhs.turns,
        }
    }
}

impl AddAssign for UsageSummary {
    fn add_assign(&mut self, rhs: UsageSummary) {
        *self = *self + rhs;
    }
}

impl Sum for UsageSummary {
    fn sum<I: Iterator<Item = UsageSummary>>(iter: I) -> Self {
        iter.fold(UsageSummary::default(), Add::add)
    }
}

impl<'a> Sum<&'a UsageSummary> for UsageSummary {
    fn sum<I: Iterator<Item = &'a UsageSummary>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
