//! Round history for a run
//!
//! Kept by the outer driver, one entry per finished round, and printed as
//! JSON when the run ends.

use serde::{Deserialize, Serialize};

use crate::sim::{EndReason, RoundOutcome};

/// Maximum number of rounds kept in the history
pub const MAX_HISTORY: usize = 50;

/// A single finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Seed the round was generated from
    pub seed: u64,
    pub outcome: RoundOutcome,
    pub reason: Option<EndReason>,
    /// Ticks simulated before the round ended
    pub ticks: u64,
    pub items_collected: u32,
    pub items_total: u32,
}

/// Aggregate results of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Most recent rounds, oldest first
    pub rounds: Vec<RoundRecord>,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub quits: u32,
    /// Consecutive wins ending at the latest round
    pub streak: u32,
    pub best_streak: u32,
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished round. Returns the current win streak.
    pub fn record(&mut self, round: RoundRecord) -> u32 {
        self.played += 1;
        match round.outcome {
            RoundOutcome::Won => {
                self.wins += 1;
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
            }
            RoundOutcome::Lost => {
                self.losses += 1;
                self.streak = 0;
            }
            // Leaving does not break a streak
            RoundOutcome::Quit => self.quits += 1,
        }

        self.rounds.push(round);
        if self.rounds.len() > MAX_HISTORY {
            let excess = self.rounds.len() - MAX_HISTORY;
            self.rounds.drain(..excess);
        }

        self.streak
    }

    pub fn is_empty(&self) -> bool {
        self.played == 0
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    /// Fraction of decided rounds that were won
    pub fn win_rate(&self) -> Option<f64> {
        let decided = self.wins + self.losses;
        (decided > 0).then(|| self.wins as f64 / decided as f64)
    }
}
