use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    behavior::{self, StepOutcome},
    engine::{System, SystemContext},
    rng::SystemRng,
    world::WorldMap,
};

/// Outcome counts for the creatures that acted in one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTally {
    pub moved: u32,
    pub rested: u32,
    pub idle: u32,
    pub starved: u32,
    pub paired: u32,
    pub released: u32,
    pub matured: u32,
}

impl StepTally {
    fn record(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Moved { .. } => self.moved += 1,
            StepOutcome::Rested => self.rested += 1,
            StepOutcome::Idle | StepOutcome::Waiting => self.idle += 1,
            StepOutcome::Starved => self.starved += 1,
            StepOutcome::Paired { .. } => self.paired += 1,
            StepOutcome::ReleasedParent { .. } => self.released += 1,
            StepOutcome::Matured(_) => self.matured += 1,
        }
    }
}

/// Steps every creature present at the start of the tick exactly once
pub struct CreatureSystem {
    last_tally: StepTally,
}

impl CreatureSystem {
    pub fn new() -> Self {
        Self {
            last_tally: StepTally::default(),
        }
    }

    pub fn last_tally(&self) -> StepTally {
        self.last_tally
    }
}

impl Default for CreatureSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CreatureSystem {
    fn name(&self) -> &str {
        "creatures"
    }

    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        map: &mut WorldMap,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut tally = StepTally::default();
        for (id, pos) in map.creature_roster() {
            // eaten, paired or replaced earlier in this tick
            if map.creature_at(pos).map(|c| c.id) != Some(id) {
                continue;
            }
            // a failing step abandons the whole tick
            let outcome = behavior::step(map, pos, ctx.config)
                .with_context(|| format!("creature {} at {pos}", id.raw()))?;
            tally.record(&outcome);
        }
        debug!(tick = ctx.move_counter + 1, ?tally, "creatures stepped");
        self.last_tally = tally;
        Ok(())
    }
}
