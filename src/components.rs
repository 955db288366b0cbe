use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::spatial::Coord;

/// Upper bound on a creature's health points
pub const MAX_HEALTH: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Diet class, the first layer of movement and food rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diet {
    Herbivore,
    Predator,
}

/// A breeding family: two adult sexes plus their juvenile form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Chickens,
    Foxes,
}

impl Family {
    pub fn diet(self) -> Diet {
        match self {
            Family::Chickens => Diet::Herbivore,
            Family::Foxes => Diet::Predator,
        }
    }

    pub fn male(self) -> Species {
        match self {
            Family::Chickens => Species::Rooster,
            Family::Foxes => Species::MaleFox,
        }
    }

    pub fn female(self) -> Species {
        match self {
            Family::Chickens => Species::Hen,
            Family::Foxes => Species::FemaleFox,
        }
    }

    pub fn juvenile(self) -> Species {
        match self {
            Family::Chickens => Species::Chick,
            Family::Foxes => Species::FoxCub,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Rooster,
    Hen,
    Chick,
    MaleFox,
    FemaleFox,
    FoxCub,
}

impl Species {
    pub fn family(self) -> Family {
        match self {
            Species::Rooster | Species::Hen | Species::Chick => Family::Chickens,
            Species::MaleFox | Species::FemaleFox | Species::FoxCub => Family::Foxes,
        }
    }

    pub fn diet(self) -> Diet {
        self.family().diet()
    }

    pub fn is_juvenile(self) -> bool {
        matches!(self, Species::Chick | Species::FoxCub)
    }

    /// Opposite sex within the family; juveniles have none
    pub fn mate(self) -> Option<Species> {
        match self {
            Species::Rooster => Some(Species::Hen),
            Species::Hen => Some(Species::Rooster),
            Species::MaleFox => Some(Species::FemaleFox),
            Species::FemaleFox => Some(Species::MaleFox),
            Species::Chick | Species::FoxCub => None,
        }
    }

    /// Prey a predator may walk onto
    pub fn is_adult_prey(self) -> bool {
        matches!(self, Species::Rooster | Species::Hen)
    }

    pub fn is_herbivore(self) -> bool {
        self.diet() == Diet::Herbivore
    }
}

/// Parents held by a juvenile, keyed by their species role
#[derive(Debug, Clone, Default)]
pub struct HeldParents(BTreeMap<Species, Creature>);

impl HeldParents {
    pub fn insert(&mut self, creature: Creature) {
        self.0.insert(creature.species, creature);
    }

    pub fn take(&mut self, role: Species) -> Option<Creature> {
        self.0.remove(&role)
    }

    pub fn contains(&self, role: Species) -> bool {
        self.0.contains_key(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.0.values()
    }
}

#[derive(Debug, Clone)]
pub struct Creature {
    pub id: EntityId,
    pub species: Species,
    pub speed: u32,
    pub health: u32,
    pub generation: u32,
    pub skip_next_move: bool,
    pub parents: HeldParents,
}

impl Creature {
    pub fn new(id: EntityId, species: Species, speed: u32, health: u32, generation: u32) -> Self {
        Self {
            id,
            species,
            speed,
            health: health.min(MAX_HEALTH),
            generation,
            skip_next_move: false,
            parents: HeldParents::default(),
        }
    }

    pub fn family(&self) -> Family {
        self.species.family()
    }

    pub fn decrease_health(&mut self) {
        self.health = self.health.saturating_sub(1);
    }

    pub fn regenerate(&mut self, bonus: u32) {
        self.health = (self.health + bonus).min(MAX_HEALTH);
    }

    pub fn is_exhausted(&self) -> bool {
        self.health == 0
    }
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Grass,
    Rock,
    Tree,
    Creature(Creature),
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Grass => "grass",
            EntityKind::Rock => "rock",
            EntityKind::Tree => "tree",
            EntityKind::Creature(c) => match c.species {
                Species::Rooster => "rooster",
                Species::Hen => "hen",
                Species::Chick => "chick",
                Species::MaleFox => "male_fox",
                Species::FemaleFox => "female_fox",
                Species::FoxCub => "fox_cub",
            },
        }
    }
}

/// Anything occupying a cell. `pos` is kept in step with the registry key.
#[derive(Debug, Clone)]
pub struct Entity {
    pub pos: Coord,
    pub kind: EntityKind,
}

impl Entity {
    pub fn creature(&self) -> Option<&Creature> {
        match &self.kind {
            EntityKind::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn creature_mut(&mut self) -> Option<&mut Creature> {
        match &mut self.kind {
            EntityKind::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn species(&self) -> Option<Species> {
        self.creature().map(|c| c.species)
    }

    pub fn is_grass(&self) -> bool {
        matches!(self.kind, EntityKind::Grass)
    }
}
