use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    census::{Census, CensusTag},
    config::SimulationConfig,
    rng::{RngManager, SystemRng},
    systems::{CreatureSystem, ReplenishmentSystem},
    world::{WorldMap, WorldSnapshot},
};

pub struct EngineSettings {
    pub seed: u64,
    pub config: SimulationConfig,
}

impl EngineSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            seed: config.seed,
            config: config.clone(),
        }
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    /// Creatures first, then grass replenishment
    pub fn standard(settings: EngineSettings) -> Self {
        Self::new(settings)
            .with_system(CreatureSystem::new())
            .with_system(ReplenishmentSystem::new())
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            config: self.settings.config,
            food_low: false,
            move_counter: 0,
        }
    }
}

/// What one tick produced, as pushed to the host
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub move_counter: u64,
    pub census: Census,
    pub snapshot: WorldSnapshot,
}

#[derive(Debug, Clone)]
pub enum TickOutcome {
    Advanced(TickReport),
    /// A family had died out before the tick could act
    Extinct(Census),
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    config: SimulationConfig,
    food_low: bool,
    move_counter: u64,
}

impl Engine {
    pub fn move_counter(&self) -> u64 {
        self.move_counter
    }

    pub fn food_low(&self) -> bool {
        self.food_low
    }

    pub fn tick(&mut self, map: &mut WorldMap) -> Result<TickOutcome> {
        let census = map.census();
        if census.is_extinct() {
            info!(move_counter = self.move_counter, "a family has died out");
            return Ok(TickOutcome::Extinct(census));
        }

        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let mut ctx = SystemContext::new(self.move_counter, &self.config, self.food_low);
            system.run(&mut ctx, map, &mut rng_stream)?;
            // refresh after every system so replenishment sees this tick's grazing
            self.food_low = ctx.food_low || food_is_low(&map.census(), &self.config);
        }
        self.move_counter += 1;

        let census = map.census();
        debug!(move_counter = self.move_counter, food_low = self.food_low, "tick complete");
        Ok(TickOutcome::Advanced(TickReport {
            move_counter: self.move_counter,
            census,
            snapshot: map.snapshot(),
        }))
    }

    /// Tick up to `ticks` times, stopping early on extinction. Returns the
    /// number of ticks that advanced.
    pub fn run_with_hook<F>(&mut self, map: &mut WorldMap, ticks: u64, mut hook: F) -> Result<u64>
    where
        F: FnMut(TickReport),
    {
        let mut advanced = 0;
        for _ in 0..ticks {
            match self.tick(map)? {
                TickOutcome::Advanced(report) => {
                    advanced += 1;
                    hook(report);
                }
                TickOutcome::Extinct(_) => break,
            }
        }
        Ok(advanced)
    }
}

fn food_is_low(census: &Census, config: &SimulationConfig) -> bool {
    census.get(CensusTag::Grass) <= config.population.low_grass_threshold()
}

pub struct SystemContext<'a> {
    /// Ticks completed before this one
    pub move_counter: u64,
    pub config: &'a SimulationConfig,
    /// Set when grass fell to the low threshold; cleared by whoever refills it
    pub food_low: bool,
}

impl<'a> SystemContext<'a> {
    pub fn new(move_counter: u64, config: &'a SimulationConfig, food_low: bool) -> Self {
        Self {
            move_counter,
            config,
            food_low,
        }
    }
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        map: &mut WorldMap,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{EntityKind, Species},
        spatial::Coord,
    };

    /// Fails on its first run only
    struct FlakySystem {
        runs: u32,
    }

    impl System for FlakySystem {
        fn name(&self) -> &str {
            "flaky"
        }

        fn run(
            &mut self,
            _ctx: &mut SystemContext<'_>,
            _map: &mut WorldMap,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            self.runs += 1;
            if self.runs == 1 {
                anyhow::bail!("first run fails");
            }
            Ok(())
        }
    }

    fn engine(config: &SimulationConfig) -> Engine {
        EngineBuilder::standard(EngineSettings::from_config(config)).build()
    }

    #[test]
    fn test_extinct_world_does_not_tick() {
        let config = SimulationConfig::default();
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::Hen, 1, 20, 1);
        let mut engine = engine(&config);

        let outcome = engine.tick(&mut map).unwrap();
        assert!(matches!(outcome, TickOutcome::Extinct(_)));
        assert_eq!(engine.move_counter(), 0);
        assert_eq!(map.species_at(Coord::new(0, 0)), Some(Species::Hen));
    }

    #[test]
    fn test_low_grass_is_refilled_in_the_same_tick() {
        let config = SimulationConfig {
            grid_size: 30,
            ..SimulationConfig::default()
        };
        let mut map = WorldMap::new(30);
        map.spawn(Coord::new(0, 0), Species::Hen, 1, 20, 1);
        map.spawn(Coord::new(29, 29), Species::FemaleFox, 1, 20, 1);
        let mut engine = engine(&config);

        let TickOutcome::Advanced(report) = engine.tick(&mut map).unwrap() else {
            panic!("expected the tick to advance");
        };
        assert_eq!(report.move_counter, 1);
        assert_eq!(report.census.get(CensusTag::Grass), config.population.grass_batch());
        assert!(!engine.food_low());
    }

    #[test]
    fn test_failing_system_abandons_the_tick() {
        let config = SimulationConfig::default();
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::Hen, 1, 20, 1);
        map.spawn(Coord::new(9, 9), Species::FemaleFox, 1, 20, 1);
        let mut engine = EngineBuilder::new(EngineSettings::from_config(&config))
            .with_system(FlakySystem { runs: 0 })
            .build();

        let err = engine.tick(&mut map).unwrap_err();
        assert!(format!("{err:#}").contains("first run fails"));
        assert_eq!(engine.move_counter(), 0);

        let outcome = engine.tick(&mut map).unwrap();
        assert!(matches!(outcome, TickOutcome::Advanced(ref r) if r.move_counter == 1));
    }

    #[test]
    fn test_run_with_hook_counts_ticks() {
        let config = SimulationConfig::default();
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::Hen, 1, 20, 1);
        map.spawn(Coord::new(9, 9), Species::FemaleFox, 1, 20, 1);
        for x in 3..7 {
            map.set(Coord::new(x, 5), EntityKind::Rock);
        }
        let mut engine = engine(&config);

        let mut counters = Vec::new();
        let advanced = engine
            .run_with_hook(&mut map, 4, |report| counters.push(report.move_counter))
            .unwrap();
        assert_eq!(advanced, 4);
        assert_eq!(counters, vec![1, 2, 3, 4]);
    }
}
