use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    census::{Census, CensusTag},
    components::{Creature, Entity, EntityId, EntityKind, Species},
    spatial::{Coord, Grid},
};

/// Read-only view of one occupied cell, handed to hosts after a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub x: i32,
    pub y: i32,
    pub kind: String,
    pub health: Option<u32>,
    pub generation: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub grid_size: i32,
    pub entities: Vec<EntitySnapshot>,
}

/// Coordinate -> entity registry. At most one entity per cell.
pub struct WorldMap {
    grid: Grid,
    next_entity: u64,
    cells: HashMap<Coord, Entity>,
}

impl WorldMap {
    pub fn new(grid_size: i32) -> Self {
        Self {
            grid: Grid::new(grid_size),
            next_entity: 0,
            cells: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn size(&self) -> i32 {
        self.grid.size()
    }

    /// Store `kind` at `pos`, silently replacing any previous occupant
    pub fn set(&mut self, pos: Coord, kind: EntityKind) {
        self.cells.insert(pos, Entity { pos, kind });
    }

    pub fn get(&self, pos: Coord) -> Option<&Entity> {
        self.cells.get(&pos)
    }

    pub fn get_mut(&mut self, pos: Coord) -> Option<&mut Entity> {
        self.cells.get_mut(&pos)
    }

    pub fn remove(&mut self, pos: Coord) -> Option<Entity> {
        self.cells.remove(&pos)
    }

    pub fn is_empty(&self, pos: Coord) -> bool {
        !self.cells.contains_key(&pos)
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        self.grid.in_bounds(pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn species_at(&self, pos: Coord) -> Option<Species> {
        self.get(pos).and_then(Entity::species)
    }

    pub fn creature_at(&self, pos: Coord) -> Option<&Creature> {
        self.get(pos).and_then(Entity::creature)
    }

    pub fn creature_at_mut(&mut self, pos: Coord) -> Option<&mut Creature> {
        self.get_mut(pos).and_then(Entity::creature_mut)
    }

    /// Remove and return the creature at `pos`; other occupants stay put
    pub fn take_creature(&mut self, pos: Coord) -> Option<Creature> {
        if self.creature_at(pos).is_none() {
            return None;
        }
        match self.cells.remove(&pos)?.kind {
            EntityKind::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    /// Create a fresh creature at `pos` and return its id
    pub fn spawn(
        &mut self,
        pos: Coord,
        species: Species,
        speed: u32,
        health: u32,
        generation: u32,
    ) -> EntityId {
        let id = self.allocate();
        self.set(
            pos,
            EntityKind::Creature(Creature::new(id, species, speed, health, generation)),
        );
        id
    }

    pub fn all_creatures(&self) -> impl Iterator<Item = (Coord, &Creature)> {
        self.cells
            .iter()
            .filter_map(|(pos, entity)| entity.creature().map(|c| (*pos, c)))
    }

    /// Live creatures ordered by id, i.e. by spawn order
    pub fn creature_roster(&self) -> Vec<(EntityId, Coord)> {
        let mut roster: Vec<_> = self.all_creatures().map(|(pos, c)| (c.id, pos)).collect();
        roster.sort();
        roster
    }

    pub fn empty_cells(&self) -> Vec<Coord> {
        self.grid.cells().filter(|pos| self.is_empty(*pos)).collect()
    }

    /// Count every species plus grass. Parents still held by a juvenile are
    /// counted as if they were on the grid.
    pub fn census(&self) -> Census {
        let mut census = Census::zeroed();
        for entity in self.cells.values() {
            match &entity.kind {
                EntityKind::Grass => census.record(CensusTag::Grass),
                EntityKind::Creature(creature) => {
                    census.record(creature.species);
                    for parent in creature.parents.iter() {
                        census.record(parent.species);
                    }
                }
                EntityKind::Rock | EntityKind::Tree => {}
            }
        }
        census.close();
        census
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut entities: Vec<EntitySnapshot> = self
            .cells
            .values()
            .map(|entity| {
                let creature = entity.creature();
                EntitySnapshot {
                    x: entity.pos.x,
                    y: entity.pos.y,
                    kind: entity.kind.label().to_string(),
                    health: creature.map(|c| c.health),
                    generation: creature.map(|c| c.generation),
                }
            })
            .collect();
        entities.sort_by_key(|e| (e.y, e.x));
        WorldSnapshot {
            grid_size: self.size(),
            entities,
        }
    }
}
