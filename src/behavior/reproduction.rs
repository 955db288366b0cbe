//! Pairing, parent release and maturation of juveniles

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::{
    behavior::{legality::MovePolicy, pathfinding::find_path},
    census::Census,
    components::{Creature, EntityId, EntityKind, Family, HeldParents, Species},
    config::CreatureRules,
    spatial::Coord,
    world::WorldMap,
};

/// True when `a` and `b` are opposite-sex adults of one family
pub fn are_partners(a: Species, b: Species) -> bool {
    a.mate() == Some(b)
}

/// Replace the adults at `mover` and `partner` with one juvenile at
/// `partner`. Returns the juvenile's id.
pub fn pair(
    map: &mut WorldMap,
    mover: Coord,
    partner: Coord,
    rules: &CreatureRules,
) -> Result<EntityId> {
    let (Some(a), Some(b)) = (map.species_at(mover), map.species_at(partner)) else {
        bail!("pairing at {mover} / {partner} needs a creature in both cells");
    };
    if !are_partners(a, b) {
        bail!("{a:?} and {b:?} cannot pair");
    }
    let first = map.take_creature(mover).context("mover vanished")?;
    let second = map.take_creature(partner).context("partner vanished")?;
    let family = first.family();
    let generation = first.generation.max(second.generation) + 1;

    let id = map.allocate();
    let mut juvenile = Creature::new(
        id,
        family.juvenile(),
        rules.offspring_speed,
        rules.offspring_health,
        generation,
    );
    juvenile.parents.insert(first);
    juvenile.parents.insert(second);
    debug!(?family, %partner, generation, "offspring born");
    map.set(partner, EntityKind::Creature(juvenile));
    Ok(id)
}

/// Release one held parent.
///
/// On the juvenile's last health point the parent of the scarcer sex goes
/// (female on ties, even if only the male is still held); otherwise the
/// male goes first while present.
pub fn select_parent(
    parents: &mut HeldParents,
    family: Family,
    census: &Census,
    health: u32,
) -> Option<Creature> {
    let male = family.male();
    let female = family.female();
    let role = if health == 1 {
        if census.get(male) < census.get(female) {
            male
        } else {
            female
        }
    } else if parents.contains(male) {
        male
    } else {
        female
    };
    parents.take(role)
}

/// Where a released parent lands and whether it arrived on its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentStep {
    pub to: Coord,
    pub reached_target: bool,
}

/// First step a released parent takes from the juvenile's cell toward
/// `target`, judged by the parent's own diet rules. `None` means the
/// parent leaves the grid.
pub fn plan_parent_step(map: &WorldMap, origin: Coord, parent: Species, target: Option<Coord>) -> Option<ParentStep> {
    let target = target?;
    let policy = MovePolicy::ignoring_mates(parent);
    let to = *find_path(map, &policy, origin, target).first()?;
    Some(ParentStep {
        to,
        reached_target: to == target,
    })
}

/// Put a released parent back on the grid
pub fn apply_parent_step(map: &mut WorldMap, mut parent: Creature, step: ParentStep) {
    if step.reached_target {
        parent.skip_next_move = true;
    }
    map.set(step.to, EntityKind::Creature(parent));
}

/// Swap the juvenile at `pos` for an adult of whichever sex is currently
/// scarcer (female on ties), keeping its generation.
pub fn mature(map: &mut WorldMap, pos: Coord, rules: &CreatureRules) -> Result<Species> {
    let juvenile = map
        .take_creature(pos)
        .with_context(|| format!("no juvenile at {pos}"))?;
    let family = juvenile.family();
    let census = map.census();
    let species = if census.get(family.male()) < census.get(family.female()) {
        family.male()
    } else {
        family.female()
    };
    let id = map.allocate();
    map.set(
        pos,
        EntityKind::Creature(Creature::new(
            id,
            species,
            rules.adult_speed,
            rules.adult_health,
            juvenile.generation,
        )),
    );
    debug!(?species, %pos, generation = juvenile.generation, "juvenile matured");
    Ok(species)
}
