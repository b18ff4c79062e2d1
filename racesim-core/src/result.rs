//! Final, immutable outcome of a race run.
use serde::{Deserialize, Serialize};

use crate::horse::{HorseId, LegType};
use crate::progression::ProgressionReport;
use crate::purse::format_cents;
use crate::race::{RaceClass, RaceId, Surface, TrackCondition};

/// One horse's line in the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub horse_id: HorseId,
    pub name: String,
    pub leg_type: LegType,
    pub place: u8,
    /// Fractional ticks to the line; the tick cap for horses that never finished.
    pub finish_time: f64,
    pub payout_cents: i64,
    pub lane_changes: usize,
    /// False when the horse was still running at the tick cap.
    pub finished: bool,
    /// Stat growth earned by this finish.
    pub progression: ProgressionReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRunResult {
    pub race_id: RaceId,
    pub race_name: String,
    pub track_name: String,
    pub surface: Surface,
    pub condition: TrackCondition,
    pub class: RaceClass,
    pub furlongs: f64,
    pub purse_cents: i64,
    pub total_ticks: u32,
    pub ticks_elapsed: u32,
    /// Entries in finish order.
    pub entries: Vec<ResultEntry>,
    pub commentary: Vec<String>,
    pub photo_finish: bool,
    /// Hash of the tick history; equal seeds give equal fingerprints.
    pub fingerprint: u64,
    /// The horse the run was requested for; the rest of the field are drawn opponents.
    pub entered: HorseId,
}

impl RaceRunResult {
    #[must_use]
    pub fn winner(&self) -> Option<&ResultEntry> {
        self.entries.first()
    }

    #[must_use]
    pub fn entry_for(&self, horse_id: HorseId) -> Option<&ResultEntry> {
        self.entries.iter().find(|entry| entry.horse_id == horse_id)
    }

    /// Progression report for the entered horse.
    #[must_use]
    pub fn entered_progression(&self) -> Option<&ProgressionReport> {
        self.entry_for(self.entered).map(|entry| &entry.progression)
    }

    #[must_use]
    pub fn total_paid_cents(&self) -> i64 {
        self.entries.iter().map(|entry| entry.payout_cents).sum()
    }

    /// One-line summary for logs and console reports.
    #[must_use]
    pub fn headline(&self) -> String {
        match self.winner() {
            Some(winner) => format!(
                "{} ({:.1}f {} {}): {} wins in {:.2} ticks, {}",
                self.race_name,
                self.furlongs,
                self.surface,
                self.condition,
                winner.name,
                winner.finish_time,
                format_cents(winner.payout_cents)
            ),
            None => format!("{}: no runners", self.race_name),
        }
    }
}
