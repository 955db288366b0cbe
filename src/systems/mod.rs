mod creatures;
mod replenishment;

pub use creatures::{CreatureSystem, StepTally};
pub use replenishment::ReplenishmentSystem;
