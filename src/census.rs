//! Population census - per-species counts plus family aggregates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Family, Species};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CensusTag {
    Rooster,
    Hen,
    Grass,
    MaleFox,
    FemaleFox,
    FoxCub,
    Chick,
    AllChickens,
    AllFoxes,
}

impl CensusTag {
    pub const ALL: [CensusTag; 9] = [
        CensusTag::Rooster,
        CensusTag::Hen,
        CensusTag::Grass,
        CensusTag::MaleFox,
        CensusTag::FemaleFox,
        CensusTag::FoxCub,
        CensusTag::Chick,
        CensusTag::AllChickens,
        CensusTag::AllFoxes,
    ];

    pub fn aggregate(family: Family) -> CensusTag {
        match family {
            Family::Chickens => CensusTag::AllChickens,
            Family::Foxes => CensusTag::AllFoxes,
        }
    }
}

impl From<Species> for CensusTag {
    fn from(species: Species) -> Self {
        match species {
            Species::Rooster => CensusTag::Rooster,
            Species::Hen => CensusTag::Hen,
            Species::Chick => CensusTag::Chick,
            Species::MaleFox => CensusTag::MaleFox,
            Species::FemaleFox => CensusTag::FemaleFox,
            Species::FoxCub => CensusTag::FoxCub,
        }
    }
}

/// Snapshot of population counts. Every tag is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    counts: BTreeMap<CensusTag, u32>,
}

impl Census {
    pub fn zeroed() -> Self {
        Self {
            counts: CensusTag::ALL.into_iter().map(|tag| (tag, 0)).collect(),
        }
    }

    pub fn get(&self, tag: impl Into<CensusTag>) -> u32 {
        self.counts.get(&tag.into()).copied().unwrap_or(0)
    }

    pub(crate) fn record(&mut self, tag: impl Into<CensusTag>) {
        *self.counts.entry(tag.into()).or_insert(0) += 1;
    }

    /// Recompute the family aggregates from their constituent species
    pub(crate) fn close(&mut self) {
        for family in [Family::Chickens, Family::Foxes] {
            let total = self.get(family.male()) + self.get(family.female()) + self.get(family.juvenile());
            self.counts.insert(CensusTag::aggregate(family), total);
        }
    }

    pub fn family_total(&self, family: Family) -> u32 {
        self.get(CensusTag::aggregate(family))
    }

    /// True when either family has died out
    pub fn is_extinct(&self) -> bool {
        self.family_total(Family::Chickens) == 0 || self.family_total(Family::Foxes) == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (CensusTag, u32)> + '_ {
        self.counts.iter().map(|(tag, count)| (*tag, *count))
    }
}

impl Default for Census {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_has_every_tag() {
        let census = Census::zeroed();
        assert_eq!(census.iter().count(), CensusTag::ALL.len());
        assert!(census.iter().all(|(_, count)| count == 0));
        assert!(census.is_extinct());
    }

    #[test]
    fn test_aggregates_sum_members() {
        let mut census = Census::zeroed();
        census.record(Species::Hen);
        census.record(Species::Hen);
        census.record(Species::Chick);
        census.record(Species::MaleFox);
        census.record(CensusTag::Grass);
        census.close();

        assert_eq!(census.get(CensusTag::AllChickens), 3);
        assert_eq!(census.get(CensusTag::AllFoxes), 1);
        assert_eq!(census.get(CensusTag::Grass), 1);
        assert!(!census.is_extinct());
    }
}
