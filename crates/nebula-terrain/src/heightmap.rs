//! Multi-octave fractal Brownian motion (fBm) heightmap sampler.
//!
//! Composites multiple octaves of simplex noise to produce natural-looking
//! terrain height values with features at many spatial frequencies.

use noise::{NoiseFn, Simplex};

/// Configuration for multi-octave fBm noise used in heightmap generation.
#[derive(Clone, Debug)]
pub struct HeightmapParams {
    /// World seed for deterministic generation.
    pub seed: u64,
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves. Default: 2.0.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves. Default: 0.5.
    pub persistence: f64,
    /// Frequency of the first (lowest) octave, in cycles per block.
    pub base_frequency: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 16,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 1.0 / 128.0,
        }
    }
}

/// Generates terrain height values using fractal Brownian motion over simplex noise.
///
/// Each sample composites multiple octaves of noise, where each successive octave
/// doubles in frequency and halves in amplitude.
pub struct HeightmapSampler {
    noise: Simplex,
    params: HeightmapParams,
}

/// Folds the high half of a world seed into the 32-bit noise seed.
fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

impl HeightmapSampler {
    /// Create a new sampler with the given parameters.
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Simplex::new(noise_seed(params.seed));
        Self { noise, params }
    }

    /// Raw fBm sum at `(x, z)`. The first octave has amplitude 1, so the
    /// range is roughly `[-max_amplitude, +max_amplitude]`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = 1.0;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, z * frequency]) * amplitude;

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// fBm sum divided by [`max_amplitude`](Self::max_amplitude), in about `[-1, 1]`.
    pub fn sample_normalized(&self, x: f64, z: f64) -> f64 {
        let max = self.max_amplitude();
        if max <= 0.0 {
            return 0.0;
        }
        self.sample(x, z) / max
    }

    /// Maps the normalized sample linearly onto `[low, high]`.
    pub fn sample_range(&self, x: f64, z: f64, low: f64, high: f64) -> f64 {
        self.sample_normalized(x, z) * (high - low) / 2.0 + (high + low) / 2.0
    }

    /// Compute the theoretical maximum absolute amplitude (geometric series sum).
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = 1.0;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.persistence;
        }
        sum
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }
}
