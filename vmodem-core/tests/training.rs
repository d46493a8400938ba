//! Training finite-state-machine lifecycle: restart reuse, short-train
//! snapshot restore, and carrier drop/reacquire.

mod common;

use vmodem_core::callbacks::{BitCollector, Event};
use vmodem_core::config::{BitRate, RxConfig, TxConfig};
use vmodem_core::training::budget;
use vmodem_core::v17::{BAUD_RATE_HZ, SAMPLE_RATE_HZ};

#[test]
fn restart_supports_a_second_full_session_with_no_leftover_state() {
    let bit_rate = BitRate::V29_9600;
    let mut tx = common::AnyTx::new(TxConfig {
        bit_rate,
        short_train: false,
        log: None,
    });
    let mut rx = common::AnyRx::new(RxConfig {
        bit_rate,
        ..RxConfig::default()
    });

    for seed in [1u64, 2u64] {
        let data_bits = common::pseudo_random_bits(seed, 3000);
        let mut samples = tx.training_sequence();
        samples.extend(tx.transmit(&data_bits));

        let mut collector = BitCollector::default();
        rx.receive(&samples, &mut collector);

        assert!(
            collector.events.contains(&Event::TrainingSucceeded),
            "session with seed {seed} never reported TrainingSucceeded"
        );
        assert_eq!(
            &collector.bits[..data_bits.len()],
            &data_bits[..],
            "session with seed {seed} had bit errors"
        );

        tx.restart();
        rx.restart();
    }
}

#[test]
fn short_train_restores_the_saved_equalizer_snapshot_instead_of_a_fresh_start() {
    let bit_rate = BitRate::V17_9600;
    let mut tx = common::AnyTx::new(TxConfig {
        bit_rate,
        short_train: false,
        log: None,
    });
    let mut rx = common::AnyRx::new(RxConfig {
        bit_rate,
        short_train: true,
        ..RxConfig::default()
    });

    // First session: no snapshot exists yet, so this falls back to a full
    // acquisition (mirrors `training::tests::short_train_without_a_snapshot_falls_back_to_full_acquisition`).
    let data_bits = common::pseudo_random_bits(99, 3000);
    let mut samples = tx.training_sequence();
    samples.extend(tx.transmit(&data_bits));
    samples.extend(tx.transmit(&common::flush_bits(bit_rate)));

    let mut collector = BitCollector::default();
    rx.receive(&samples, &mut collector);
    assert!(collector.events.contains(&Event::TrainingSucceeded));

    tx.restart();
    rx.restart();

    // Second session: a snapshot is now available, so once the abbreviated
    // GainSet phase elapses the FSM jumps straight to EqualizerTrain and
    // restores the saved taps immediately, before any further adaptation.
    let unmodulated_prefix_symbols = budget::GAIN_SET_SYMBOLS as usize + 20;
    let prefix_sample_count =
        (unmodulated_prefix_symbols as f64 * SAMPLE_RATE_HZ / BAUD_RATE_HZ).round() as usize;
    let prefix_samples = &tx.training_sequence()[..prefix_sample_count];

    let mut collector2 = BitCollector::default();
    rx.receive(prefix_samples, &mut collector2);

    let taps = rx.diagnostics().equalizer_taps;
    assert!(
        taps.iter().any(|t| t.norm_sqr() > 0.0),
        "equalizer taps are still all-zero; snapshot restore did not happen"
    );
}

#[test]
fn carrier_drop_and_reacquire_recovers_a_second_burst() {
    let bit_rate = BitRate::V29_7200;
    let mut tx = common::AnyTx::new(TxConfig {
        bit_rate,
        short_train: false,
        log: None,
    });
    let mut rx = common::AnyRx::new(RxConfig {
        bit_rate,
        ..RxConfig::default()
    });

    let data_bits = common::pseudo_random_bits(5, 2000);
    let mut first_call = tx.training_sequence();
    first_call.extend(tx.transmit(&data_bits));

    let mut collector = BitCollector::default();
    rx.receive(&first_call, &mut collector);
    assert!(collector.events.contains(&Event::TrainingSucceeded));
    assert_eq!(&collector.bits[..data_bits.len()], &data_bits[..]);

    // Line goes silent: carrier drops, the receiver falls back to Idle.
    let silence = vec![0i16; 2000];
    rx.receive(&silence, &mut collector);
    assert!(collector.events.contains(&Event::CarrierDown));

    // A fresh call, with fresh transmitter/receiver state (the way a real
    // second call would start), reacquires and decodes cleanly.
    tx.restart();
    rx.restart();
    let data_bits_2 = common::pseudo_random_bits(6, 2000);
    let mut second_call = tx.training_sequence();
    second_call.extend(tx.transmit(&data_bits_2));

    let mut collector2 = BitCollector::default();
    rx.receive(&second_call, &mut collector2);
    assert!(collector2.events.contains(&Event::TrainingSucceeded));
    assert_eq!(&collector2.bits[..data_bits_2.len()], &data_bits_2[..]);
}
