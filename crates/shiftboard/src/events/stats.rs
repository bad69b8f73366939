use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::participation::{Participation, ParticipationState};

/// Head counts of a shift (or an event, by summing its shifts).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupStats {
    pub requested_count: u32,
    pub confirmed_count: u32,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
}

impl SignupStats {
    pub fn from_participations<'a>(
        participations: impl IntoIterator<Item = &'a Participation>,
        (min_count, max_count): (Option<u32>, Option<u32>),
    ) -> Self {
        let mut stats = SignupStats {
            min_count,
            max_count,
            ..SignupStats::default()
        };
        for participation in participations {
            match participation.state() {
                ParticipationState::Requested => stats.requested_count += 1,
                state if state.counts_as_confirmed() => stats.confirmed_count += 1,
                _ => {}
            }
        }
        stats
    }

    /// Open places, if the maximum is known.
    pub fn free(&self) -> Option<u32> {
        self.max_count
            .map(|max| max.saturating_sub(self.confirmed_count))
    }

    pub fn is_full(&self) -> bool {
        self.free() == Some(0)
    }

    pub fn missing(&self) -> u32 {
        self.min_count
            .map(|min| min.saturating_sub(self.confirmed_count))
            .unwrap_or(0)
    }
}

impl Add for SignupStats {
    type Output = SignupStats;

    // A known minimum on either side stays known; a maximum is only known if both are.
    // Counts saturate; a maximum beyond u32 is treated as unbounded.
    fn add(self, other: SignupStats) -> SignupStats {
        let min_count = if self.min_count.is_some() || other.min_count.is_some() {
            Some(
                self.min_count
                    .unwrap_or(0)
                    .saturating_add(other.min_count.unwrap_or(0)),
            )
        } else {
            None
        };
        let max_count = match (self.max_count, other.max_count) {
            (Some(left), Some(right)) => left.checked_add(right),
            _ => None,
        };
        SignupStats {
            requested_count: self.requested_count.saturating_add(other.requested_count),
            confirmed_count: self.confirmed_count.saturating_add(other.confirmed_count),
            min_count,
            max_count,
        }
    }
}

impl std::iter::Sum for SignupStats {
    fn sum<I: Iterator<Item = SignupStats>>(iter: I) -> SignupStats {
        let mut iter = iter;
        match iter.next() {
            Some(first) => iter.fold(first, |acc, next| acc + next),
            None => SignupStats::default(),
        }
    }
}
