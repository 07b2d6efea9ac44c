//! Seed growth registry.

use serde::Deserialize;
use sprout_core::BlockValue;

/// Seed kind that matures into the next content code after a delay.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SeedSpecies {
    /// Value of the planted seed. The grown tree is `seed + 1`.
    pub seed: BlockValue,
    /// Seconds a seed must accumulate before it grows.
    pub threshold_secs: f32,
}

impl SeedSpecies {
    /// Value the seed turns into once grown.
    #[must_use]
    pub const fn grown(&self) -> BlockValue {
        BlockValue::new(self.seed.get() + 1)
    }
}

/// Tunables controlling which seeds grow and how quickly.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrowthTuning {
    /// Registered seed kinds.
    pub species: Vec<SeedSpecies>,
}

impl GrowthTuning {
    pub(crate) fn species_for(&self, value: BlockValue) -> Option<&SeedSpecies> {
        self.species.iter().find(|species| species.seed == value)
    }
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            species: vec![
                SeedSpecies {
                    seed: BlockValue::GRASS_SEED,
                    threshold_secs: 5.0,
                },
                SeedSpecies {
                    seed: BlockValue::DIRT_SEED,
                    threshold_secs: 8.0,
                },
            ],
        }
    }
}
