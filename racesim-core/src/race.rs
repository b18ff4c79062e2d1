//! Static race metadata.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    DISTANCE_MIN_FURLONGS, MIN_FURLONGS, PURSE_ALLOWANCE_CENTS, PURSE_ALLOWANCE_OPTIONAL_CENTS,
    PURSE_CHAMPIONSHIP_CENTS, PURSE_CLAIMING_CENTS, PURSE_GRADE_ONE_CENTS, PURSE_GRADE_THREE_CENTS,
    PURSE_GRADE_TWO_CENTS, PURSE_MAIDEN_CENTS, PURSE_STAKES_CENTS, SPRINT_MAX_FURLONGS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceId(pub u64);

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "race#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Surface {
    #[default]
    Dirt,
    Turf,
    Artificial,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dirt => write!(f, "Dirt"),
            Self::Turf => write!(f, "Turf"),
            Self::Artificial => write!(f, "Artificial"),
        }
    }
}

/// Track condition rolled once at the start of a run, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrackCondition {
    Fast,
    Firm,
    #[default]
    Good,
    WetFast,
    Soft,
    Yielding,
    Muddy,
    Sloppy,
    Heavy,
    Frozen,
    Slow,
}

impl TrackCondition {
    pub const ALL: [Self; 11] = [
        Self::Fast,
        Self::Firm,
        Self::Good,
        Self::WetFast,
        Self::Soft,
        Self::Yielding,
        Self::Muddy,
        Self::Sloppy,
        Self::Heavy,
        Self::Frozen,
        Self::Slow,
    ];

    /// Condition at `index`, wrapping out-of-range indices.
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        let len = u32::try_from(Self::ALL.len()).unwrap_or(1);
        let slot = usize::try_from(index % len).unwrap_or(0);
        Self::ALL[slot]
    }
}

impl fmt::Display for TrackCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fast => "Fast",
            Self::Firm => "Firm",
            Self::Good => "Good",
            Self::WetFast => "Wet Fast",
            Self::Soft => "Soft",
            Self::Yielding => "Yielding",
            Self::Muddy => "Muddy",
            Self::Sloppy => "Sloppy",
            Self::Heavy => "Heavy",
            Self::Frozen => "Frozen",
            Self::Slow => "Slow",
        };
        f.write_str(label)
    }
}

/// Payout tier a race class belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutTier {
    Lower,
    Mid,
    Stakes,
    Elite,
    Championship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RaceClass {
    #[default]
    Maiden,
    Claiming,
    Allowance,
    AllowanceOptional,
    Stakes,
    GradeThree,
    GradeTwo,
    GradeOne,
    Championship,
}

impl RaceClass {
    pub const ALL: [Self; 9] = [
        Self::Maiden,
        Self::Claiming,
        Self::Allowance,
        Self::AllowanceOptional,
        Self::Stakes,
        Self::GradeThree,
        Self::GradeTwo,
        Self::GradeOne,
        Self::Championship,
    ];

    /// Purse at the 10-furlong reference distance, in cents.
    #[must_use]
    pub const fn base_purse_cents(self) -> i64 {
        match self {
            Self::Maiden => PURSE_MAIDEN_CENTS,
            Self::Claiming => PURSE_CLAIMING_CENTS,
            Self::Allowance => PURSE_ALLOWANCE_CENTS,
            Self::AllowanceOptional => PURSE_ALLOWANCE_OPTIONAL_CENTS,
            Self::Stakes => PURSE_STAKES_CENTS,
            Self::GradeThree => PURSE_GRADE_THREE_CENTS,
            Self::GradeTwo => PURSE_GRADE_TWO_CENTS,
            Self::GradeOne => PURSE_GRADE_ONE_CENTS,
            Self::Championship => PURSE_CHAMPIONSHIP_CENTS,
        }
    }

    #[must_use]
    pub const fn tier(self) -> PayoutTier {
        match self {
            Self::Maiden | Self::Claiming => PayoutTier::Lower,
            Self::Allowance | Self::AllowanceOptional => PayoutTier::Mid,
            Self::Stakes => PayoutTier::Stakes,
            Self::GradeThree | Self::GradeTwo | Self::GradeOne => PayoutTier::Elite,
            Self::Championship => PayoutTier::Championship,
        }
    }
}

/// Distance bracket used by stat progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceClass {
    Sprint,
    Classic,
    Distance,
}

impl DistanceClass {
    #[must_use]
    pub fn from_furlongs(furlongs: f64) -> Self {
        if furlongs <= SPRINT_MAX_FURLONGS {
            Self::Sprint
        } else if furlongs >= DISTANCE_MIN_FURLONGS {
            Self::Distance
        } else {
            Self::Classic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub name: String,
    #[serde(default)]
    pub track_name: String,
    pub furlongs: f64,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub class: RaceClass,
}

impl Race {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, furlongs: f64) -> Self {
        Self {
            id: RaceId(id),
            name: name.into(),
            track_name: String::new(),
            furlongs,
            surface: Surface::default(),
            class: RaceClass::default(),
        }
    }

    #[must_use]
    pub fn with_track(mut self, track_name: impl Into<String>) -> Self {
        self.track_name = track_name.into();
        self
    }

    #[must_use]
    pub const fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    #[must_use]
    pub const fn with_class(mut self, class: RaceClass) -> Self {
        self.class = class;
        self
    }

    /// Distance used by the simulation, never below one furlong.
    #[must_use]
    pub fn effective_furlongs(&self) -> f64 {
        if self.furlongs.is_finite() {
            self.furlongs.max(MIN_FURLONGS)
        } else {
            MIN_FURLONGS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_index_wraps() {
        assert_eq!(TrackCondition::from_index(0), TrackCondition::Fast);
        assert_eq!(TrackCondition::from_index(10), TrackCondition::Slow);
        assert_eq!(TrackCondition::from_index(11), TrackCondition::Fast);
    }

    #[test]
    fn distance_classes_follow_brackets() {
        assert_eq!(DistanceClass::from_furlongs(6.0), DistanceClass::Sprint);
        assert_eq!(DistanceClass::from_furlongs(6.5), DistanceClass::Classic);
        assert_eq!(DistanceClass::from_furlongs(10.0), DistanceClass::Classic);
        assert_eq!(DistanceClass::from_furlongs(11.0), DistanceClass::Distance);
    }

    #[test]
    fn effective_distance_never_below_one() {
        assert!((Race::new(1, "Dash", 0.25).effective_furlongs() - 1.0).abs() < f64::EPSILON);
        assert!((Race::new(1, "Odd", f64::NAN).effective_furlongs() - 1.0).abs() < f64::EPSILON);
        assert!((Race::new(1, "Mile", 8.0).effective_furlongs() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn class_tiers_cover_every_class() {
        assert_eq!(RaceClass::Maiden.tier(), PayoutTier::Lower);
        assert_eq!(RaceClass::Allowance.tier(), PayoutTier::Mid);
        assert_eq!(RaceClass::Stakes.tier(), PayoutTier::Stakes);
        assert_eq!(RaceClass::GradeOne.tier(), PayoutTier::Elite);
        assert_eq!(RaceClass::Championship.tier(), PayoutTier::Championship);
        assert_eq!(RaceClass::Championship.base_purse_cents(), 100_000_000);
    }
}
