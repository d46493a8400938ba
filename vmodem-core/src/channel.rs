//! Test-only channel impairment simulation: AWGN and attenuation applied
//! to line signal samples or baseband symbols, for exercising the
//! receiver's acquisition and tracking loops under noise.
//!
//! Not part of the shipped receiver/transmitter API — used by
//! `vmodem-core`'s own test suite and by `vmodem-cli`'s channel
//! simulation mode.

use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;

/// Adds AWGN to real-valued line signal samples.
pub fn apply_line_noise<R: Rng>(samples: &[f32], noise_std: f64, rng: &mut R) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| {
            let noise: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            s + noise as f32
        })
        .collect()
}

/// Adds independent AWGN to the I and Q components of baseband symbols.
pub fn apply_symbol_noise<R: Rng>(
    symbols: &[Complex64],
    noise_std: f64,
    rng: &mut R,
) -> Vec<Complex64> {
    symbols
        .iter()
        .map(|symbol| {
            let noise_i: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            let noise_q: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            symbol + Complex64::new(noise_i, noise_q)
        })
        .collect()
}

/// Attenuation plus AWGN, modeling a lossy line at a given noise level.
pub fn apply_channel<R: Rng>(
    symbols: &[Complex64],
    attenuation: f64,
    noise_std: f64,
    rng: &mut R,
) -> Vec<Complex64> {
    symbols
        .iter()
        .map(|symbol| {
            let attenuated = symbol * attenuation;
            let noise_i: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            let noise_q: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            attenuated + Complex64::new(noise_i, noise_q)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn line_noise_deterministic_with_seed() {
        let samples = vec![0.1, 0.2, 0.3];
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let noisy1 = apply_line_noise(&samples, 0.01, &mut rng1);
        let noisy2 = apply_line_noise(&samples, 0.01, &mut rng2);

        assert_eq!(noisy1, noisy2);
    }

    #[test]
    fn symbol_noise_affects_both_components() {
        let symbols = vec![Complex64::new(1.0, 0.0)];
        let mut rng = StdRng::seed_from_u64(42);

        let noisy = apply_symbol_noise(&symbols, 0.1, &mut rng);

        assert_ne!(noisy[0].re, 1.0);
        assert_ne!(noisy[0].im, 0.0);
    }

    #[test]
    fn channel_attenuation_reduces_power() {
        let symbols = vec![Complex64::new(1.0, 1.0)];
        let mut rng = StdRng::seed_from_u64(42);

        let processed = apply_channel(&symbols, 0.5, 0.0, &mut rng);

        let original_power = symbols[0].norm_sqr();
        let processed_power = processed[0].norm_sqr();

        assert!(processed_power < original_power);
    }

    #[test]
    fn zero_noise_std_preserves_signal() {
        let symbols = vec![Complex64::new(1.0, 0.5)];
        let mut rng = StdRng::seed_from_u64(42);

        let noisy = apply_symbol_noise(&symbols, 0.0, &mut rng);

        assert_eq!(noisy[0], symbols[0]);
    }
}
