use std::fs;

use mnemoscope::task::adaptive::{DifficultyParams, EXPOSURE_MIN_MS};
use mnemoscope::task::ports::{ParamStore, TomlStore};
use mnemoscope::task::session::{keys, ContrastCondition, Mode, NumerositySubmode, Session};

fn unique_path(name: &str) -> (std::path::PathBuf, String) {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "mnemoscope_roundtrip_{}_{}",
        name,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let s = p.to_string_lossy().to_string();
    (p, s)
}

#[test]
fn session_survives_a_store_reopen() {
    let (path, path_str) = unique_path("full");

    {
        let mut store = TomlStore::open(&path_str);
        let mut session = Session::load(&store);
        session.points = 315;
        session.trial_index = 48;
        session.block_correct = 6;
        session.block_total = 8;
        session.set_size = 7;
        session.mode = Mode::SpatialFrequency;
        session.submode = NumerositySubmode::Compare;
        session.contrast = ContrastCondition::Blurred;
        session.difficulty = DifficultyParams {
            exposure_ms: 180,
            min_separation_px: 24.0,
            similarity: 0.42,
            anchor: 8,
            compare_delta: 1,
        };
        session.save(&mut store);
    }

    let store = TomlStore::open(&path_str);
    let session = Session::load(&store);
    assert_eq!(session.points, 315);
    assert_eq!(session.trial_index, 48);
    assert_eq!(session.block_correct, 6);
    assert_eq!(session.block_total, 8);
    assert_eq!(session.set_size, 7);
    assert_eq!(session.mode, Mode::SpatialFrequency);
    assert_eq!(session.submode, NumerositySubmode::Compare);
    assert_eq!(session.contrast, ContrastCondition::Blurred);
    assert_eq!(session.difficulty.exposure_ms, 180);
    assert_eq!(session.difficulty.min_separation_px, 24.0);
    assert!((session.difficulty.similarity - 0.42).abs() < 1e-6);
    assert_eq!(session.difficulty.anchor, 8);
    assert_eq!(session.difficulty.compare_delta, 1);

    let _ = fs::remove_file(&path);
}

#[test]
fn malformed_persisted_values_fall_back_into_domain() {
    let (path, path_str) = unique_path("malformed");
    fs::write(
        &path,
        concat!(
            "points = \"lots\"\n",
            "trial_index = -9\n",
            "set_size = 400\n",
            "mode = \"spatial\"\n",
            "num_exposure_ms = 5\n",
            "num_similarity = 9.9\n",
            "num_compare_delta = 0\n",
        ),
    )
    .unwrap();

    let store = TomlStore::open(&path_str);
    let session = Session::load(&store);
    // A string where a number belongs reads as missing.
    assert_eq!(session.points, 0);
    assert_eq!(session.trial_index, 0);
    // Spatial mode narrows the set-size domain to 1..=7.
    assert_eq!(session.set_size, 7);
    assert_eq!(session.difficulty.exposure_ms, EXPOSURE_MIN_MS);
    assert_eq!(session.difficulty.similarity, 1.0);
    assert_eq!(session.difficulty.compare_delta, 1);

    let _ = fs::remove_file(&path);
}

#[test]
fn every_loaded_field_lands_in_its_domain_from_any_store() {
    let (path, path_str) = unique_path("fuzzish");
    // A grab bag of hostile values.
    fs::write(
        &path,
        concat!(
            "points = -1\n",
            "block_correct = 999\n",
            "block_total = 999\n",
            "set_size = 0\n",
            "mode = \"??\"\n",
            "numerosity_submode = 17\n",
            "num_min_separation_px = 1e9\n",
            "num_anchor = 255\n",
        ),
    )
    .unwrap();

    let store = TomlStore::open(&path_str);
    let session = Session::load(&store);
    assert_eq!(session.points, 0);
    assert!(session.block_correct <= 20);
    assert!(session.block_total <= 20);
    assert!((2..=10).contains(&session.set_size));
    assert_eq!(session.mode, Mode::Orientation);
    assert_eq!(session.submode, NumerositySubmode::Enumerate);
    assert!(session.difficulty.min_separation_px <= 48.0);
    assert!((5..=9).contains(&session.difficulty.anchor));

    let _ = fs::remove_file(&path);
}

#[test]
fn reset_clears_counters_in_the_store_but_not_difficulty() {
    let (path, path_str) = unique_path("reset");

    {
        let mut store = TomlStore::open(&path_str);
        let mut session = Session::load(&store);
        session.points = 900;
        session.trial_index = 120;
        session.set_size = 9;
        session.difficulty.anchor = 8;
        session.mode = Mode::Color;
        session.save(&mut store);
        session.reset_stats(&mut store);
    }

    let store = TomlStore::open(&path_str);
    assert_eq!(store.load_num(keys::POINTS), Some(0.0));
    assert_eq!(store.load_num(keys::TRIAL_INDEX), Some(0.0));
    let session = Session::load(&store);
    assert_eq!(session.points, 0);
    assert_eq!(session.mode, Mode::Color, "mode untouched by reset");
    assert_eq!(session.difficulty.anchor, 8, "difficulty untouched by reset");

    let _ = fs::remove_file(&path);
}
