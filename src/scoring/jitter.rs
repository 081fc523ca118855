use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Source of the small random offset the body policies add to their score.
#[derive(Debug, Clone)]
pub enum Jitter {
    Disabled,
    /// Draws from the calling thread's RNG.
    Thread,
    Seeded(StdRng),
}

impl Jitter {
    pub fn seeded(seed: u64) -> Self {
        Jitter::Seeded(StdRng::seed_from_u64(seed))
    }

    pub fn from_settings(settings: &JitterSettings) -> Self {
        match (settings.enabled, settings.seed) {
            (false, _) => Jitter::Disabled,
            (true, Some(seed)) => Jitter::seeded(seed),
            (true, None) => Jitter::Thread,
        }
    }

    /// Uniform offset in `[-amplitude, amplitude]`; 0 when disabled.
    pub fn sample(&mut self, amplitude: f64) -> f64 {
        if !(amplitude.is_finite() && amplitude > 0.0) {
            return 0.0;
        }
        match self {
            Jitter::Disabled => 0.0,
            Jitter::Thread => rand::thread_rng().gen_range(-amplitude..=amplitude),
            Jitter::Seeded(rng) => rng.gen_range(-amplitude..=amplitude),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JitterSettings {
    pub enabled: bool,
    /// Re-seeded for every computation, so equal inputs give equal scores.
    pub seed: Option<u64>,
}

impl Default for JitterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
        }
    }
}
