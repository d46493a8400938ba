//! Channel impairment scenarios: additive noise at two SNR levels and a
//! small symbol-clock offset, exercising the Gardner/equalizer tracking
//! loops rather than the ideal-channel path the other suites cover.

mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;
use vmodem_core::callbacks::Event;
use vmodem_core::config::BitRate;

fn normalize(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

fn denormalize(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

fn bit_error_rate(expected: &[u8], actual: &[u8]) -> f64 {
    let n = expected.len().min(actual.len());
    if n == 0 {
        return 1.0;
    }
    let errors = expected[..n].iter().zip(&actual[..n]).filter(|(a, b)| a != b).count();
    errors as f64 / n as f64
}

#[test]
fn higher_snr_decodes_with_fewer_errors_than_lower_snr() {
    let bit_rate = BitRate::V29_7200;
    let data_bits = common::pseudo_random_bits(123, 6000);

    let add_noise = |noise_std: f64| {
        move |samples: Vec<i16>| -> Vec<i16> {
            let mut rng = StdRng::seed_from_u64(7);
            let noisy = vmodem_core::channel::apply_line_noise(&normalize(&samples), noise_std, &mut rng);
            denormalize(&noisy)
        }
    };

    let high_snr = common::round_trip_with_channel(bit_rate, &data_bits, add_noise(0.01));
    let low_snr = common::round_trip_with_channel(bit_rate, &data_bits, add_noise(0.15));

    assert!(
        high_snr.events.contains(&Event::TrainingSucceeded),
        "high-SNR channel failed to train"
    );

    let high_snr_ber = bit_error_rate(&data_bits, &high_snr.bits);
    let low_snr_ber = bit_error_rate(&data_bits, &low_snr.bits);

    assert!(
        high_snr_ber < 0.01,
        "high-SNR channel had unexpectedly high BER {high_snr_ber}"
    );
    assert!(
        high_snr_ber <= low_snr_ber,
        "lower-noise channel ({high_snr_ber}) did not outperform the noisier one ({low_snr_ber})"
    );
}

#[test]
fn small_symbol_clock_offset_still_locks_and_decodes() {
    let bit_rate = BitRate::V17_7200;
    let data_bits = common::pseudo_random_bits(321, 4000);

    // 0.01% fast symbol clock, simulated by resampling the line signal.
    let result = common::round_trip_with_channel(bit_rate, &data_bits, |samples| common::resample(&samples, 1.0001));

    assert!(
        result.events.contains(&Event::TrainingSucceeded),
        "receiver never locked under a 0.01% symbol clock offset"
    );
    let ber = bit_error_rate(&data_bits, &result.bits);
    assert!(
        ber < 0.02,
        "symbol clock offset produced an unexpectedly high BER {ber}"
    );
    assert_ne!(
        result.diagnostics.gardner_total_correction, 0,
        "Gardner never applied a timing correction for a drifting clock"
    );
}
