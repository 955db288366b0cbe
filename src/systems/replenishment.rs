use anyhow::Result;
use rand::seq::SliceRandom;
use tracing::info;

use crate::{
    components::EntityKind,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::WorldMap,
};

/// Drops a batch of grass on random empty cells whenever food is flagged low
pub struct ReplenishmentSystem;

impl ReplenishmentSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReplenishmentSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ReplenishmentSystem {
    fn name(&self) -> &str {
        "replenishment"
    }

    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        map: &mut WorldMap,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !ctx.food_low {
            return Ok(());
        }
        let batch = ctx.config.population.grass_batch() as usize;
        let empty = map.empty_cells();
        let chosen: Vec<_> = empty.choose_multiple(rng, batch).copied().collect();
        for pos in &chosen {
            map.set(*pos, EntityKind::Grass);
        }
        info!(placed = chosen.len(), requested = batch, "grass replenished");
        ctx.food_low = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{census::CensusTag, config::SimulationConfig, rng::RngManager};

    #[test]
    fn test_noop_while_food_is_plentiful() {
        let config = SimulationConfig::default();
        let mut map = WorldMap::new(20);
        let mut rng = RngManager::new(3);
        let mut ctx = SystemContext::new(0, &config, false);
        ReplenishmentSystem::new()
            .run(&mut ctx, &mut map, &mut rng.stream("replenishment"))
            .unwrap();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_places_batch_and_clears_flag() {
        let config = SimulationConfig::default();
        let mut map = WorldMap::new(20);
        let mut rng = RngManager::new(3);
        let mut ctx = SystemContext::new(0, &config, true);
        ReplenishmentSystem::new()
            .run(&mut ctx, &mut map, &mut rng.stream("replenishment"))
            .unwrap();
        assert!(!ctx.food_low);
        assert_eq!(map.census().get(CensusTag::Grass), config.population.grass_batch());
    }

    #[test]
    fn test_batch_is_limited_by_free_space() {
        let config = SimulationConfig::default();
        let mut map = WorldMap::new(4);
        let mut rng = RngManager::new(3);
        let mut ctx = SystemContext::new(0, &config, true);
        ReplenishmentSystem::new()
            .run(&mut ctx, &mut map, &mut rng.stream("replenishment"))
            .unwrap();
        assert_eq!(map.len(), 16);
        assert!(map.empty_cells().is_empty());
    }
}
