//! Physical and statistical sub-models.
//!
//! Each sub-model is a stateless function of explicit inputs. Out-of-range
//! numeric inputs clamp to the documented realism ceilings rather than
//! erroring; missing inputs are the caller's concern and never invented
//! here.

pub mod aero;
pub mod fuel;
pub mod pace;
pub mod reliability;
pub mod tire;
pub mod weather;

pub use aero::{BattleStats, BattleTracker, OvertakeInputs};
pub use pace::{PaceInputs, PaceWeights};
pub use tire::TireCompound;
pub use weather::WeatherScenario;
