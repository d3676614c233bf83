//! Urgency scoring and on-scene service durations.
//!
//! Priority is a pure function of the case. Service duration adds a random
//! base drawn from a [`ServiceTimeSource`], which is injected so tests can
//! supply fixed or scripted values.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::network::Minutes;

/// Urgency score; higher is more urgent.
pub type Priority = u32;

/// Shortest base on-scene time, in minutes.
pub const MIN_SERVICE_MINUTES: Minutes = 3;
/// Longest base on-scene time, in minutes.
pub const MAX_SERVICE_MINUTES: Minutes = 8;

/// Disease category of a case, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disease {
    General,
    Infection,
    Respiratory,
    Trauma,
    Cardiac,
}

impl Disease {
    pub const ALL: [Disease; 5] = [
        Disease::General,
        Disease::Infection,
        Disease::Respiratory,
        Disease::Trauma,
        Disease::Cardiac,
    ];

    /// Severity rank, 1 (General) through 5 (Cardiac).
    pub fn severity_rank(self) -> u32 {
        match self {
            Disease::General => 1,
            Disease::Infection => 2,
            Disease::Respiratory => 3,
            Disease::Trauma => 4,
            Disease::Cardiac => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Disease::General => "general",
            Disease::Infection => "infection",
            Disease::Respiratory => "respiratory",
            Disease::Trauma => "trauma",
            Disease::Cardiac => "cardiac",
        }
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An intake code that names no known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseCategoryError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Disease {
    type Err = ParseCategoryError;

    /// Accepts the full label or the single-letter intake codes (C, T, R, I, G).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "general" | "other" => Ok(Disease::General),
            "i" | "infection" => Ok(Disease::Infection),
            "r" | "respiratory" | "breathing" => Ok(Disease::Respiratory),
            "t" | "trauma" | "accident" => Ok(Disease::Trauma),
            "c" | "cardiac" | "heart" => Ok(Disease::Cardiac),
            _ => Err(ParseCategoryError {
                kind: "disease category",
                value: s.to_string(),
            }),
        }
    }
}

/// Caller-assessed criticality. When present it dominates the priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub fn level(self) -> u32 {
        match self {
            Criticality::Low => 1,
            Criticality::Medium => 2,
            Criticality::High => 3,
            Criticality::Critical => 4,
        }
    }
}

impl FromStr for Criticality {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "low" => Ok(Criticality::Low),
            "2" | "medium" => Ok(Criticality::Medium),
            "3" | "high" => Ok(Criticality::High),
            "4" | "critical" => Ok(Criticality::Critical),
            _ => Err(ParseCategoryError {
                kind: "criticality level",
                value: s.to_string(),
            }),
        }
    }
}

/// Severity-based priority: `rank * 3`, plus age modifiers for cardiac and
/// respiratory cases.
pub fn priority(disease: Disease, age: u32) -> Priority {
    let mut score = disease.severity_rank() * 3;
    if disease == Disease::Cardiac && age >= 60 {
        score += 3;
    }
    if disease == Disease::Respiratory && (age <= 10 || age >= 60) {
        score += 2;
    }
    score
}

/// Criticality-based priority: `level * 20 + rank * 2`, plus 3 for patients
/// aged 10 or under or 60 and over.
pub fn criticality_priority(criticality: Criticality, disease: Disease, age: u32) -> Priority {
    let mut score = criticality.level() * 20 + disease.severity_rank() * 2;
    if age <= 10 || age >= 60 {
        score += 3;
    }
    score
}

/// Source of the random base component of a service duration.
pub trait ServiceTimeSource: Send + Sync + fmt::Debug {
    /// Draw a base duration in `min..=max`.
    fn base_minutes(&mut self, min: Minutes, max: Minutes) -> Minutes;
}

/// Uniform draws from a seeded (or entropy-seeded) `StdRng`.
#[derive(Debug)]
pub struct SeededServiceTime {
    rng: StdRng,
}

impl SeededServiceTime {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl ServiceTimeSource for SeededServiceTime {
    fn base_minutes(&mut self, min: Minutes, max: Minutes) -> Minutes {
        self.rng.gen_range(min..=max)
    }
}

/// Always the same base, clamped into the configured range.
#[derive(Debug, Clone, Copy)]
pub struct FixedServiceTime(pub Minutes);

impl ServiceTimeSource for FixedServiceTime {
    fn base_minutes(&mut self, min: Minutes, max: Minutes) -> Minutes {
        self.0.clamp(min, max)
    }
}

/// Replays a fixed sequence, then falls back to the range minimum.
#[derive(Debug, Clone, Default)]
pub struct ScriptedServiceTime {
    values: VecDeque<Minutes>,
}

impl ScriptedServiceTime {
    pub fn new(values: impl IntoIterator<Item = Minutes>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl ServiceTimeSource for ScriptedServiceTime {
    fn base_minutes(&mut self, min: Minutes, max: Minutes) -> Minutes {
        self.values.pop_front().unwrap_or(min).clamp(min, max)
    }
}

/// Minutes spent at the scene: a base from `source` in `min..=max`, then
/// +2 for trauma, +1 for cardiac patients 60 and over, +1 for anyone 80 and over.
pub fn service_duration(
    source: &mut dyn ServiceTimeSource,
    min: Minutes,
    max: Minutes,
    disease: Disease,
    age: u32,
) -> Minutes {
    let mut minutes = source.base_minutes(min, max);
    if disease == Disease::Trauma {
        minutes += 2;
    }
    if disease == Disease::Cardiac && age >= 60 {
        minutes += 1;
    }
    if age >= 80 {
        minutes += 1;
    }
    minutes
}

/// World resource wrapping the injected service-time source and its range.
#[derive(Resource, Debug)]
pub struct ServiceTimeModel {
    source: Box<dyn ServiceTimeSource>,
    min: Minutes,
    max: Minutes,
}

impl ServiceTimeModel {
    pub fn new(source: Box<dyn ServiceTimeSource>, min: Minutes, max: Minutes) -> Self {
        Self { source, min, max }
    }

    pub fn seeded(seed: Option<u64>, min: Minutes, max: Minutes) -> Self {
        Self::new(Box::new(SeededServiceTime::new(seed)), min, max)
    }

    pub fn sample(&mut self, disease: Disease, age: u32) -> Minutes {
        service_duration(self.source.as_mut(), self.min, self.max, disease, age)
    }

    pub fn range(&self) -> (Minutes, Minutes) {
        (self.min, self.max)
    }
}
