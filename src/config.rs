use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    components::{EntityKind, Species},
    rng::RngManager,
    world::WorldMap,
};

fn default_grid_size() -> i32 {
    20
}

fn default_seed() -> u64 {
    0x5EED
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_shutdown_timeout_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    #[serde(default)]
    pub population: PopulationTargets,
    #[serde(default)]
    pub creatures: CreatureRules,
}

/// Configured head counts. They seed the initial world and double as the
/// reference values for mating, overpopulation and low-food thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationTargets {
    pub male_foxes: u32,
    pub female_foxes: u32,
    pub roosters: u32,
    pub hens: u32,
    pub grass: u32,
    pub rocks: u32,
    pub trees: u32,
}

impl Default for PopulationTargets {
    fn default() -> Self {
        Self {
            male_foxes: 1,
            female_foxes: 1,
            roosters: 12,
            hens: 12,
            grass: 60,
            rocks: 20,
            trees: 60,
        }
    }
}

impl PopulationTargets {
    pub fn target(&self, species: Species) -> u32 {
        match species {
            Species::Rooster => self.roosters,
            Species::Hen => self.hens,
            Species::MaleFox => self.male_foxes,
            Species::FemaleFox => self.female_foxes,
            Species::Chick | Species::FoxCub => 0,
        }
    }

    pub fn total(&self) -> u64 {
        [
            self.male_foxes,
            self.female_foxes,
            self.roosters,
            self.hens,
            self.grass,
            self.rocks,
            self.trees,
        ]
        .iter()
        .map(|count| *count as u64)
        .sum()
    }

    /// Grass count at or below which food is considered low
    pub fn low_grass_threshold(&self) -> u32 {
        self.grass / 3
    }

    /// Grass placed by one replenishment
    pub fn grass_batch(&self) -> u32 {
        self.grass - self.grass / 3
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureRules {
    pub adult_speed: u32,
    pub adult_health: u32,
    pub offspring_speed: u32,
    pub offspring_health: u32,
    pub chicken_regen: u32,
    pub fox_regen: u32,
}

impl Default for CreatureRules {
    fn default() -> Self {
        Self {
            adult_speed: 1,
            adult_health: 20,
            offspring_speed: 0,
            offspring_health: 2,
            chicken_regen: 10,
            fox_regen: 5,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid size must be at least 2, got {0}")]
    GridTooSmall(i32),
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
    #[error("{requested} initial entities do not fit on a {size}x{size} grid")]
    Overcrowded { requested: u64, size: i32 },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            population: PopulationTargets::default(),
            creatures: CreatureRules::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 2 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        let cells = (self.grid_size as u64).pow(2);
        let requested = self.population.total();
        if requested > cells {
            return Err(ConfigError::Overcrowded {
                requested,
                size: self.grid_size,
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Populate a fresh registry with the configured counts on distinct
    /// random cells.
    pub fn build_world(&self) -> Result<WorldMap> {
        self.validate()?;
        let mut rng = RngManager::new(self.seed);
        let mut stream = rng.stream("bootstrap");
        let mut map = WorldMap::new(self.grid_size);
        let mut cells = map
            .grid()
            .random_cells(self.population.total() as usize, &mut stream)
            .into_iter();

        let rules = &self.creatures;
        let pop = &self.population;
        for (species, count) in [
            (Species::MaleFox, pop.male_foxes),
            (Species::FemaleFox, pop.female_foxes),
            (Species::Rooster, pop.roosters),
            (Species::Hen, pop.hens),
        ] {
            for pos in cells.by_ref().take(count as usize) {
                map.spawn(pos, species, rules.adult_speed, rules.adult_health, 1);
            }
        }
        for (kind, count) in [
            (EntityKind::Grass, pop.grass),
            (EntityKind::Rock, pop.rocks),
            (EntityKind::Tree, pop.trees),
        ] {
            for pos in cells.by_ref().take(count as usize) {
                map.set(pos, kind.clone());
            }
        }
        Ok(map)
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<SimulationConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SimulationConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::CensusTag;

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = SimulationConfig::default();
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.population.total(), 166);
        assert_eq!(config.population.low_grass_threshold(), 20);
        assert_eq!(config.population.grass_batch(), 40);
        assert_eq!(config.creatures.chicken_regen, 10);
        assert_eq!(config.creatures.fox_regen, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: SimulationConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.population.hens, 12);
        assert_eq!(config.tick_interval_ms, 1_000);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = "grid_size: 8\npopulation:\n  grass: 9\n  trees: 0\n";
        let config: SimulationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.grid_size, 8);
        assert_eq!(config.population.grass, 9);
        assert_eq!(config.population.roosters, 12);
        assert_eq!(config.population.trees, 0);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = SimulationConfig {
            grid_size: 1,
            ..SimulationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::GridTooSmall(1)));

        config.grid_size = 10;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Overcrowded {
                requested: 166,
                size: 10
            })
        );

        config.grid_size = 20;
        config.tick_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));
    }

    #[test]
    fn test_build_world_places_configured_counts() {
        let config = SimulationConfig::default();
        let map = config.build_world().unwrap();
        let census = map.census();

        assert_eq!(map.len(), 166);
        assert_eq!(census.get(Species::MaleFox), 1);
        assert_eq!(census.get(Species::FemaleFox), 1);
        assert_eq!(census.get(Species::Rooster), 12);
        assert_eq!(census.get(Species::Hen), 12);
        assert_eq!(census.get(CensusTag::Grass), 60);
        assert_eq!(census.get(CensusTag::AllChickens), 24);
    }

    #[test]
    fn test_build_world_is_deterministic() {
        let config = SimulationConfig::default();
        let a = config.build_world().unwrap().snapshot();
        let b = config.build_world().unwrap().snapshot();
        assert_eq!(a, b);

        let other = SimulationConfig {
            seed: 99,
            ..SimulationConfig::default()
        };
        assert_ne!(a, other.build_world().unwrap().snapshot());
    }
}
