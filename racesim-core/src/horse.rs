//! Horse records consumed read-only by the race core.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::STAT_MAX;

/// Stable identity of a horse across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HorseId(pub u64);

impl fmt::Display for HorseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "horse#{}", self.0)
    }
}

/// Racing style archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LegType {
    #[default]
    StartDash,
    FrontRunner,
    StretchRunner,
    LastSpurt,
    RailRunner,
}

impl LegType {
    pub const ALL: [Self; 5] = [
        Self::StartDash,
        Self::FrontRunner,
        Self::StretchRunner,
        Self::LastSpurt,
        Self::RailRunner,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartDash => "start dash",
            Self::FrontRunner => "front runner",
            Self::StretchRunner => "stretch runner",
            Self::LastSpurt => "last spurt",
            Self::RailRunner => "rail runner",
        }
    }
}

/// Stats that can grow after a race. Happiness moves separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Speed,
    Agility,
    Stamina,
    Durability,
}

impl StatKind {
    pub const GROWABLE: [Self; 4] = [Self::Speed, Self::Agility, Self::Stamina, Self::Durability];
}

/// The five racing stats, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorseStats {
    pub speed: u8,
    pub agility: u8,
    pub stamina: u8,
    pub durability: u8,
    pub happiness: u8,
}

impl Default for HorseStats {
    fn default() -> Self {
        Self::uniform(50)
    }
}

impl HorseStats {
    /// Every stat set to the same value.
    #[must_use]
    pub fn uniform(value: u8) -> Self {
        let value = value.min(STAT_MAX);
        Self {
            speed: value,
            agility: value,
            stamina: value,
            durability: value,
            happiness: value,
        }
    }

    #[must_use]
    pub const fn get(&self, kind: StatKind) -> u8 {
        match kind {
            StatKind::Speed => self.speed,
            StatKind::Agility => self.agility,
            StatKind::Stamina => self.stamina,
            StatKind::Durability => self.durability,
        }
    }

    pub fn set(&mut self, kind: StatKind, value: u8) {
        let value = value.min(STAT_MAX);
        match kind {
            StatKind::Speed => self.speed = value,
            StatKind::Agility => self.agility = value,
            StatKind::Stamina => self.stamina = value,
            StatKind::Durability => self.durability = value,
        }
    }

    /// Clamp every stat into `[0, 100]`.
    pub fn clamp(&mut self) {
        self.speed = self.speed.min(STAT_MAX);
        self.agility = self.agility.min(STAT_MAX);
        self.stamina = self.stamina.min(STAT_MAX);
        self.durability = self.durability.min(STAT_MAX);
        self.happiness = self.happiness.min(STAT_MAX);
    }
}

/// Growth ceilings ("dominant potential") per growable stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatPotential {
    #[serde(default)]
    pub speed: Option<u8>,
    #[serde(default)]
    pub agility: Option<u8>,
    #[serde(default)]
    pub stamina: Option<u8>,
    #[serde(default)]
    pub durability: Option<u8>,
}

impl StatPotential {
    /// Ceiling for `kind`; a missing ceiling allows growth up to 100.
    #[must_use]
    pub fn ceiling(&self, kind: StatKind) -> u8 {
        let ceiling = match kind {
            StatKind::Speed => self.speed,
            StatKind::Agility => self.agility,
            StatKind::Stamina => self.stamina,
            StatKind::Durability => self.durability,
        };
        ceiling.unwrap_or(STAT_MAX).min(STAT_MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    pub id: HorseId,
    pub name: String,
    #[serde(default)]
    pub leg_type: LegType,
    #[serde(default)]
    pub stats: HorseStats,
    #[serde(default)]
    pub potential: StatPotential,
    /// Career starts before this race.
    #[serde(default)]
    pub race_starts: u32,
}

impl Horse {
    /// Create a horse with neutral stats and no explicit potential.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, leg_type: LegType) -> Self {
        Self {
            id: HorseId(id),
            name: name.into(),
            leg_type,
            stats: HorseStats::default(),
            potential: StatPotential::default(),
            race_starts: 0,
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: HorseStats) -> Self {
        self.stats = stats;
        self.stats.clamp();
        self
    }

    #[must_use]
    pub const fn with_race_starts(mut self, race_starts: u32) -> Self {
        self.race_starts = race_starts;
        self
    }

    #[must_use]
    pub const fn with_potential(mut self, potential: StatPotential) -> Self {
        self.potential = potential;
        self
    }
}
