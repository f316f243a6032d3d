//! Team/car model: car rating, reliability, engine supplier.

use serde::{Deserialize, Serialize};

use super::ids::TeamId;

/// Known engine suppliers with their component failure multipliers.
///
/// A closed mapping: identifiers outside the known set deserialize to
/// `Other`, which carries the neutral multiplier. This replaces the
/// free-form supplier lookup table of earlier prototypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineSupplier {
    Apex,
    Meridian,
    Vulcan,
    Kestrel,
    #[serde(other)]
    Other,
}

impl EngineSupplier {
    /// Multiplier on the team's base failure probability.
    pub fn failure_multiplier(&self) -> f64 {
        match self {
            EngineSupplier::Apex => 0.92,
            EngineSupplier::Meridian => 1.0,
            EngineSupplier::Vulcan => 1.12,
            EngineSupplier::Kestrel => 1.25,
            EngineSupplier::Other => 1.0,
        }
    }

    /// Resolve a free-form supplier name; unknown names fall back to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "apex" => EngineSupplier::Apex,
            "meridian" => EngineSupplier::Meridian,
            "vulcan" => EngineSupplier::Vulcan,
            "kestrel" => EngineSupplier::Kestrel,
            _ => EngineSupplier::Other,
        }
    }
}

/// Season roster entry for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Base car rating on a 0–100 scale.
    pub car_rating: f64,
    /// Base per-race failure probability before multipliers, 0–1.
    pub reliability: f64,
    pub supplier: EngineSupplier,
}
