pub mod behavior;
pub mod census;
pub mod components;
pub mod config;
pub mod engine;
pub mod rng;
pub mod scheduler;
pub mod spatial;
pub mod systems;
pub mod world;

pub use census::{Census, CensusTag};
pub use config::{ConfigLoader, SimulationConfig};
pub use engine::{Engine, EngineBuilder, EngineSettings, TickOutcome, TickReport};
pub use scheduler::{CloseReason, HostEvent, Scheduler, SchedulerState};
pub use world::WorldMap;
