use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;

use crate::config::{ForecastConfig, JitterMode};

/// Source of bounded jitter. `sample` returns a value in `[-1.0, 1.0]`.
pub trait NoiseSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG, different on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNoise;

impl NoiseSource for RandomNoise {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(-1.0..=1.0)
    }
}

/// Reproducible sequence from a fixed seed.
pub struct SeededNoise {
    rng: Mutex<StdRng>,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn sample(&self) -> f64 {
        self.rng.lock().gen_range(-1.0..=1.0)
    }
}

/// Jitter forced to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&self) -> f64 {
        0.0
    }
}

pub fn noise_from_config(cfg: &ForecastConfig) -> Arc<dyn NoiseSource> {
    match cfg.jitter {
        JitterMode::Random => Arc::new(RandomNoise),
        JitterMode::Seeded => Arc::new(SeededNoise::new(cfg.jitter_seed.unwrap_or(0))),
        JitterMode::Off => Arc::new(NoNoise),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_noise_is_bounded() {
        let noise = RandomNoise;
        for _ in 0..1000 {
            let v = noise.sample();
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let a = SeededNoise::new(42);
        let b = SeededNoise::new(42);
        let xs: Vec<f64> = (0..10).map(|_| a.sample()).collect();
        let ys: Vec<f64> = (0..10).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_config_off_yields_zero() {
        let cfg = ForecastConfig {
            jitter: JitterMode::Off,
            ..ForecastConfig::default()
        };
        let noise = noise_from_config(&cfg);
        assert_eq!(noise.sample(), 0.0);
    }
}
