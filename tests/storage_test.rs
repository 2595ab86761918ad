//! Integration tests for CSV persistence and the session workflow.

use std::path::Path;

use mca_daq::acquisition::CHANNEL_COUNT;
use mca_daq::config::Settings;
use mca_daq::error::McaError;
use mca_daq::session::SpectrumSession;
use mca_daq::smoothing;
use mca_daq::storage;

#[test]
fn save_then_load_reproduces_both_series() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spectrum.csv");

    let raw: Vec<u32> = (0..CHANNEL_COUNT as u32).map(|i| i * 3 % 1021).collect();
    let smoothed = smoothing::smooth(&raw, 20);

    storage::save(&raw, &smoothed, &path).unwrap();
    let (loaded_raw, loaded_smoothed) = storage::load(&path).unwrap();

    assert_eq!(loaded_raw, raw);
    assert_eq!(loaded_smoothed, smoothed);
}

#[test]
fn malformed_rows_degrade_to_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spectrum.csv");

    let mut content = String::from("Channel,Raw,Smoothed\n");
    for i in 0..8 {
        content.push_str(&format!("{},{},{}\n", i, i * 10, i * 5));
    }
    content.push_str("3,notanumber,5\n");
    std::fs::write(&path, content).unwrap();

    let (raw, smoothed) = storage::load(&path).unwrap();
    // The malformed row is row index 8 in the data block.
    assert_eq!((raw[8], smoothed[8]), (0, 0));
    assert_eq!(raw[3], 30);
}

#[test]
fn loading_a_missing_file_reports_file_not_found() {
    let err = storage::load(Path::new("/no/such/spectrum.csv")).unwrap_err();
    assert!(matches!(err, McaError::FileNotFound(_)));
}

#[test]
fn session_round_trips_through_timestamped_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.storage_dir = dir.path().to_path_buf();

    let raw: Vec<u32> = (0..CHANNEL_COUNT as u32).collect();
    let smoothed = smoothing::smooth(&raw, 20);

    // Build a session holding data by loading a file we save directly.
    let seed = dir.path().join("seed.csv");
    storage::save(&raw, &smoothed, &seed).unwrap();

    let mut session = SpectrumSession::new(settings);
    session.load_csv(&seed).unwrap();
    let written = session.save_timestamped().unwrap();

    let (loaded_raw, loaded_smoothed) = storage::load(&written).unwrap();
    assert_eq!(loaded_raw, raw);
    assert_eq!(loaded_smoothed, smoothed);
}

#[test]
fn saving_without_data_reports_no_spectrum() {
    let session = SpectrumSession::new(Settings::default());
    let err = session.save_csv(Path::new("unused.csv")).unwrap_err();
    assert!(matches!(err, McaError::NoSpectrum));
}
