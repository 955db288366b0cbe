//! Movement legality: which cells a creature may step onto.
//!
//! Rules stack from the general to the specific:
//! creature (empty, in bounds) -> diet (grass for herbivores, adult chickens
//! for predators) -> species (the opposite sex, unless the family is
//! overpopulated).

use crate::{
    census::Census,
    components::{Diet, Family, Species},
    config::PopulationTargets,
    spatial::Coord,
    world::WorldMap,
};

/// Both sexes above twice their configured target
pub fn is_overpopulated(family: Family, census: &Census, targets: &PopulationTargets) -> bool {
    let male = family.male();
    let female = family.female();
    census.get(female) > targets.target(female) * 2 && census.get(male) > targets.target(male) * 2
}

/// Legality predicate for one species, bound to the population figures of
/// the moment it was built.
#[derive(Debug, Clone, Copy)]
pub struct MovePolicy {
    species: Species,
    mate: Option<Species>,
}

impl MovePolicy {
    pub fn new(species: Species, census: &Census, targets: &PopulationTargets) -> Self {
        let mate = species
            .mate()
            .filter(|_| !is_overpopulated(species.family(), census, targets));
        Self { species, mate }
    }

    /// Diet rules only. Used for parents re-entering the grid, whose
    /// placement would otherwise overwrite a partner.
    pub fn ignoring_mates(species: Species) -> Self {
        Self { species, mate: None }
    }

    /// Build a policy from the registry's current census
    pub fn current(species: Species, map: &WorldMap, targets: &PopulationTargets) -> Self {
        Self::new(species, &map.census(), targets)
    }

    pub fn species(&self) -> Species {
        self.species
    }

    /// Whether the opposite sex currently counts as walkable
    pub fn seeks_mate(&self) -> bool {
        self.mate.is_some()
    }

    pub fn allows(&self, map: &WorldMap, pos: Coord) -> bool {
        if !map.in_bounds(pos) {
            return false;
        }
        let Some(occupant) = map.get(pos) else {
            return true;
        };
        let diet_food = match self.species.diet() {
            Diet::Herbivore => occupant.is_grass(),
            Diet::Predator => occupant.species().is_some_and(Species::is_adult_prey),
        };
        diet_food || (self.mate.is_some() && occupant.species() == self.mate)
    }
}
