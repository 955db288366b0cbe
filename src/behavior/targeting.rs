//! Nearest food-or-mate search over distance-ordered grid offsets

use crate::{
    census::Census,
    components::{Diet, Entity, Family},
    config::PopulationTargets,
    spatial::Coord,
    world::WorldMap,
};

/// Whether the family should look for partners instead of food.
///
/// Chickens: exactly one sex is in deficit (at or below half its target,
/// still present, at least two of the other sex, no chicks about).
/// Foxes: exactly one male, one female and no cubs.
pub fn needs_mating(family: Family, census: &Census, targets: &PopulationTargets) -> bool {
    let male = family.male();
    let female = family.female();
    let juveniles = census.get(family.juvenile());
    match family {
        Family::Chickens => {
            let deficit = |short, other| {
                let count = census.get(short);
                count <= targets.target(short) / 2
                    && count > 0
                    && census.get(other) >= 2
                    && juveniles == 0
            };
            deficit(male, female) != deficit(female, male)
        }
        Family::Foxes => census.get(male) == 1 && census.get(female) == 1 && juveniles == 0,
    }
}

fn is_food(diet: Diet, entity: &Entity) -> bool {
    match diet {
        Diet::Herbivore => entity.is_grass(),
        Diet::Predator => entity.species().is_some_and(|s| s.is_herbivore()),
    }
}

/// First in-bounds cell, nearest first, holding a partner (when the family
/// needs mating) or food (otherwise) for the creature standing at `from`.
pub fn find_target(
    map: &WorldMap,
    from: Coord,
    family: Family,
    targets: &PopulationTargets,
) -> Option<Coord> {
    let mating = needs_mating(family, &map.census(), targets);
    let seeker = map.species_at(from);
    let partner = seeker.and_then(|s| s.mate()).filter(|_| mating);
    if mating && partner.is_none() {
        return None;
    }
    let diet = family.diet();

    map.grid()
        .offsets()
        .iter()
        .map(|offset| from.shift(*offset))
        .filter(|pos| map.in_bounds(*pos))
        .find(|pos| match (partner, map.get(*pos)) {
            (Some(mate), Some(entity)) => entity.species() == Some(mate),
            (None, Some(entity)) => is_food(diet, entity),
            (_, None) => false,
        })
}
