// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::*;

#[test]
fn positional_quintet_parses_and_validates() -> anyhow::Result<()> {
    let args = PrimaryArgs {
        config_path: None,
        log_path: "sorsim.log".into(),
        summary_path: "sorsim-summary.txt".into(),
        reconcile_wait_sem: None,
        log_level: "info".into(),
        log_format: "json".into(),
        positional: vec!["10".into(), "5".into(), "60".into(), "1000".into(), "42".into()],
    };
    let params = args.resolve()?;
    assert_eq!(params.waiting_room_capacity, 10);
    assert_eq!(params.open_threshold_k, 5);
    assert_eq!(params.duration_minutes, 60);
    assert_eq!(params.time_scale_ms_per_sim_minute, 1000);
    assert_eq!(params.seed, 42);
    Ok(())
}

#[test]
fn wrong_positional_count_is_rejected() {
    let args = PrimaryArgs {
        config_path: None,
        log_path: "sorsim.log".into(),
        summary_path: "sorsim-summary.txt".into(),
        reconcile_wait_sem: None,
        log_level: "info".into(),
        log_format: "json".into(),
        positional: vec!["10".into(), "5".into()],
    };
    assert!(args.resolve().is_err());
}

#[test]
fn zero_threshold_is_derived_from_capacity() -> anyhow::Result<()> {
    let mut params = SimParams { waiting_room_capacity: 9, open_threshold_k: 0, ..SimParams::default() };
    params.validate()?;
    assert_eq!(params.open_threshold_k, 4);
    Ok(())
}

#[test]
fn config_file_round_trips_known_keys() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "# a waiting-room config\nN_waitingRoom = 20\nK_registrationThreshold = 8\nrandomSeed=99\nreconcileWaitSem = 1\n"
    )?;
    let params = load_config_file(file.path())?;
    assert_eq!(params.waiting_room_capacity, 20);
    assert_eq!(params.open_threshold_k, 8);
    assert_eq!(params.seed, 99);
    assert!(params.reconcile_wait_sem);
    Ok(())
}

#[test]
fn config_file_rejects_unknown_key() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "notARealKey = 1\n")?;
    assert!(load_config_file(file.path()).is_err());
    Ok(())
}

#[test]
fn env_override_wins_over_config_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "N_waitingRoom = 4\nreconcileWaitSem = 0\n")?;
    let args = PrimaryArgs {
        config_path: Some(file.path().to_path_buf()),
        log_path: "sorsim.log".into(),
        summary_path: "sorsim-summary.txt".into(),
        reconcile_wait_sem: Some(1),
        log_level: "info".into(),
        log_format: "json".into(),
        positional: Vec::new(),
    };
    let params = args.resolve()?;
    assert!(params.reconcile_wait_sem);
    Ok(())
}

#[test]
fn out_of_order_exam_bounds_are_rejected() {
    let mut params = SimParams {
        specialist_exam_min_ms: 2000,
        specialist_exam_max_ms: 500,
        ..SimParams::default()
    };
    assert!(params.validate().is_err());
}
