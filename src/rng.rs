//! Deterministic randomness: one seeded master, one derived stream per consumer
//!
//! Streams in use: `bootstrap` for the initial world layout and one per
//! system, keyed by its name (`creatures`, `replenishment`).

use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    /// Stream for `name`, derived from the master on first request.
    /// Streams are independent of each other's draw counts.
    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let master = &mut self.master;
        let entry = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()));
        SystemRng { inner: entry }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl RngCore for SystemRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
