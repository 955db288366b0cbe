//! Per-creature behaviour for one tick.
//!
//! Every creature is in exactly one [`CreatureState`], derived from its
//! species, skip flag and held parents; [`step`] advances it once.

pub mod legality;
pub mod pathfinding;
pub mod reproduction;
pub mod targeting;

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    components::{Creature, EntityId, EntityKind, Family, Species},
    config::SimulationConfig,
    spatial::Coord,
    world::WorldMap,
};

use self::{
    legality::MovePolicy,
    pathfinding::find_path,
    reproduction::{apply_parent_step, are_partners, mature, pair, plan_parent_step, select_parent},
    targeting::find_target,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureState {
    /// Reached its target last tick; heals instead of moving
    Skipping,
    /// Adult looking for food or a partner
    Seeking,
    /// Juvenile still holding at least one parent
    Parented,
    /// Juvenile with no parents left; becomes an adult next
    Maturing,
}

impl CreatureState {
    pub fn of(creature: &Creature) -> Self {
        if creature.species.is_juvenile() {
            if creature.parents.is_empty() {
                CreatureState::Maturing
            } else {
                CreatureState::Parented
            }
        } else if creature.skip_next_move {
            CreatureState::Skipping
        } else {
            CreatureState::Seeking
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Rested,
    Idle,
    Moved { to: Coord },
    Starved,
    Paired { juvenile: EntityId },
    /// A parent was let go; `placed` is where it re-entered the grid
    ReleasedParent { placed: Option<Coord> },
    Waiting,
    Matured(Species),
}

fn regen_bonus(family: Family, config: &SimulationConfig) -> u32 {
    match family {
        Family::Chickens => config.creatures.chicken_regen,
        Family::Foxes => config.creatures.fox_regen,
    }
}

/// Advance the creature standing at `pos` by one tick
pub fn step(map: &mut WorldMap, pos: Coord, config: &SimulationConfig) -> Result<StepOutcome> {
    let creature = map
        .creature_at(pos)
        .with_context(|| format!("no creature at {pos}"))?;
    let species = creature.species;
    match CreatureState::of(creature) {
        CreatureState::Skipping => {
            let bonus = regen_bonus(species.family(), config);
            let creature = map.creature_at_mut(pos).context("creature vanished")?;
            creature.regenerate(bonus);
            creature.skip_next_move = false;
            Ok(StepOutcome::Rested)
        }
        CreatureState::Seeking => seek(map, pos, species, config),
        CreatureState::Parented => tend_parents(map, pos, config),
        CreatureState::Maturing => mature(map, pos, &config.creatures).map(StepOutcome::Matured),
    }
}

fn seek(
    map: &mut WorldMap,
    pos: Coord,
    species: Species,
    config: &SimulationConfig,
) -> Result<StepOutcome> {
    let targets = &config.population;
    let Some(target) = find_target(map, pos, species.family(), targets) else {
        return Ok(StepOutcome::Idle);
    };
    let policy = MovePolicy::current(species, map, targets);
    let Some(&next) = find_path(map, &policy, pos, target).first() else {
        return Ok(StepOutcome::Idle);
    };

    if map
        .species_at(next)
        .is_some_and(|other| are_partners(species, other))
    {
        let juvenile = pair(map, pos, next, &config.creatures)?;
        return Ok(StepOutcome::Paired { juvenile });
    }

    let mut creature = map.take_creature(pos).context("mover vanished")?;
    if creature.is_exhausted() {
        debug!(?species, %pos, "creature starved");
        return Ok(StepOutcome::Starved);
    }
    creature.decrease_health();
    creature.skip_next_move = next == target;
    map.set(next, EntityKind::Creature(creature));
    Ok(StepOutcome::Moved { to: next })
}

fn tend_parents(map: &mut WorldMap, pos: Coord, config: &SimulationConfig) -> Result<StepOutcome> {
    let targets = &config.population;
    let juvenile = map.creature_at_mut(pos).context("juvenile vanished")?;
    juvenile.decrease_health();
    let health = juvenile.health;
    let family = juvenile.family();

    let target = find_target(map, pos, family, targets);
    let census = map.census();
    let juvenile = map.creature_at_mut(pos).context("juvenile vanished")?;
    let Some(parent) = select_parent(&mut juvenile.parents, family, &census, health) else {
        return Ok(StepOutcome::Waiting);
    };

    match plan_parent_step(map, pos, parent.species, target) {
        Some(step) => {
            apply_parent_step(map, parent, step);
            Ok(StepOutcome::ReleasedParent {
                placed: Some(step.to),
            })
        }
        None => {
            debug!(species = ?parent.species, %pos, "parent left without a route");
            Ok(StepOutcome::ReleasedParent { placed: None })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::CensusTag;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[test]
    fn test_state_of() {
        let mut hen = Creature::new(EntityId(0), Species::Hen, 1, 20, 1);
        assert_eq!(CreatureState::of(&hen), CreatureState::Seeking);
        hen.skip_next_move = true;
        assert_eq!(CreatureState::of(&hen), CreatureState::Skipping);

        let mut chick = Creature::new(EntityId(1), Species::Chick, 0, 2, 2);
        assert_eq!(CreatureState::of(&chick), CreatureState::Maturing);
        chick.parents.insert(hen);
        assert_eq!(CreatureState::of(&chick), CreatureState::Parented);
    }

    #[test]
    fn test_hen_steps_toward_grass() {
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::Hen, 1, 20, 1);
        map.set(Coord::new(3, 0), EntityKind::Grass);

        let outcome = step(&mut map, Coord::new(0, 0), &config()).unwrap();
        assert_eq!(outcome, StepOutcome::Moved { to: Coord::new(1, 0) });
        assert!(map.is_empty(Coord::new(0, 0)));
        let hen = map.creature_at(Coord::new(1, 0)).unwrap();
        assert_eq!(hen.health, 19);
        assert!(!hen.skip_next_move);
    }

    #[test]
    fn test_reaching_target_eats_and_rests() {
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::Hen, 1, 5, 1);
        map.set(Coord::new(1, 1), EntityKind::Grass);

        step(&mut map, Coord::new(0, 0), &config()).unwrap();
        let hen = map.creature_at(Coord::new(1, 1)).unwrap();
        assert!(hen.skip_next_move);
        assert_eq!(hen.health, 4);
        assert_eq!(map.census().get(CensusTag::Grass), 0);

        let outcome = step(&mut map, Coord::new(1, 1), &config()).unwrap();
        assert_eq!(outcome, StepOutcome::Rested);
        let hen = map.creature_at(Coord::new(1, 1)).unwrap();
        assert_eq!(hen.health, 14);
        assert!(!hen.skip_next_move);
    }

    #[test]
    fn test_exhausted_creature_is_evicted() {
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::Rooster, 1, 0, 1);
        map.set(Coord::new(4, 4), EntityKind::Grass);

        let outcome = step(&mut map, Coord::new(0, 0), &config()).unwrap();
        assert_eq!(outcome, StepOutcome::Starved);
        assert!(map.is_empty(Coord::new(0, 0)));
        assert!(map.is_empty(Coord::new(1, 1)));
    }

    #[test]
    fn test_idle_without_target() {
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(5, 5), Species::FemaleFox, 1, 20, 1);
        let outcome = step(&mut map, Coord::new(5, 5), &config()).unwrap();
        assert_eq!(outcome, StepOutcome::Idle);
        assert_eq!(map.creature_at(Coord::new(5, 5)).unwrap().health, 20);
    }

    #[test]
    fn test_fox_eats_adjacent_hen() {
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::MaleFox, 1, 20, 1);
        map.spawn(Coord::new(9, 9), Species::MaleFox, 1, 20, 1);
        map.spawn(Coord::new(1, 0), Species::Hen, 1, 20, 1);

        let outcome = step(&mut map, Coord::new(0, 0), &config()).unwrap();
        assert_eq!(outcome, StepOutcome::Moved { to: Coord::new(1, 0) });
        assert_eq!(map.species_at(Coord::new(1, 0)), Some(Species::MaleFox));
        assert_eq!(map.census().get(Species::Hen), 0);
    }

    #[test]
    fn test_foxes_pair_when_adjacent() {
        let mut map = WorldMap::new(10);
        map.spawn(Coord::new(0, 0), Species::MaleFox, 1, 20, 3);
        map.spawn(Coord::new(1, 1), Species::FemaleFox, 1, 20, 1);
        map.spawn(Coord::new(8, 8), Species::Hen, 1, 20, 1);

        let outcome = step(&mut map, Coord::new(0, 0), &config()).unwrap();
        let StepOutcome::Paired { juvenile } = outcome else {
            panic!("expected pairing, got {outcome:?}");
        };
        let cub = map.creature_at(Coord::new(1, 1)).unwrap();
        assert_eq!(cub.id, juvenile);
        assert_eq!(cub.species, Species::FoxCub);
        assert_eq!(cub.generation, 4);
        assert!(map.is_empty(Coord::new(0, 0)));

        // held parents still count
        let census = map.census();
        assert_eq!(census.get(Species::MaleFox), 1);
        assert_eq!(census.get(Species::FemaleFox), 1);
        assert_eq!(census.get(CensusTag::AllFoxes), 3);
    }

    #[test]
    fn test_juvenile_releases_parents_then_matures() {
        let mut map = WorldMap::new(10);
        let nest = Coord::new(4, 4);
        map.spawn(Coord::new(0, 0), Species::Rooster, 1, 20, 1);
        map.spawn(Coord::new(1, 0), Species::Hen, 1, 20, 1);
        pair(&mut map, Coord::new(0, 0), Coord::new(1, 0), &config().creatures).unwrap();
        let chick = map.take_creature(Coord::new(1, 0)).unwrap();
        map.set(nest, EntityKind::Creature(chick));
        map.set(Coord::new(7, 4), EntityKind::Grass);

        // health 2 -> 1: scarcer role goes first (tie, so the hen)
        let first = step(&mut map, nest, &config()).unwrap();
        assert_eq!(
            first,
            StepOutcome::ReleasedParent {
                placed: Some(Coord::new(5, 4))
            }
        );
        assert_eq!(map.species_at(Coord::new(5, 4)), Some(Species::Hen));
        assert_eq!(map.creature_at(nest).unwrap().health, 1);

        // health 1 -> 0: remaining parent by presence (the rooster)
        let second = step(&mut map, nest, &config()).unwrap();
        let StepOutcome::ReleasedParent { placed: Some(at) } = second else {
            panic!("expected the rooster to be placed, got {second:?}");
        };
        assert_eq!(map.species_at(at), Some(Species::Rooster));
        assert_eq!(map.species_at(Coord::new(5, 4)), Some(Species::Hen));
        assert_eq!(map.creature_at(nest).unwrap().health, 0);

        // no parents left: matures in place, keeping its generation
        let third = step(&mut map, nest, &config()).unwrap();
        assert!(matches!(third, StepOutcome::Matured(_)));
        let adult = map.creature_at(nest).unwrap();
        assert_eq!(adult.generation, 2);
        assert!(!adult.species.is_juvenile());
    }
}
