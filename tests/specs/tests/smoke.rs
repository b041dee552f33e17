// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `sorsim` binary and inspect
//! the log and summary files it produces.

use std::time::Duration;

use sorsim_specs::SorsimProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn run_completes_and_writes_summary() -> anyhow::Result<()> {
    let mut sim = SorsimProcess::build()
        .waiting_room_capacity(4)
        .open_threshold(2)
        .duration_minutes(1)
        .time_scale_ms_per_minute(20)
        .seed(12345)
        .spawn()?;

    let status = sim.wait_exit(TIMEOUT).await?;
    assert!(status.success());

    let summary = sim.read_summary()?;
    assert!(summary.contains_key("total_patients"));
    assert!(summary.contains_key("inside_waiting_room"));

    let inside: u64 = summary["inside_waiting_room"].parse()?;
    assert_eq!(inside, 0, "every spawned patient should have finished its pipeline by shutdown");

    Ok(())
}

#[tokio::test]
async fn log_file_carries_arrival_and_sentinel_lines() -> anyhow::Result<()> {
    let mut sim = SorsimProcess::build()
        .waiting_room_capacity(4)
        .open_threshold(2)
        .duration_minutes(1)
        .time_scale_ms_per_minute(20)
        .seed(12345)
        .spawn()?;

    sim.wait_exit(TIMEOUT).await?;

    let lines = sim.read_log_lines()?;
    assert!(lines.iter().any(|l| l.contains(";patient;") && l.to_lowercase().contains("arriv")));
    assert!(lines.last().map(|l| l.contains("END")).unwrap_or(false), "log must end with the sentinel line");

    Ok(())
}

#[tokio::test]
async fn unbounded_duration_runs_until_external_stop() -> anyhow::Result<()> {
    let mut sim = SorsimProcess::build()
        .waiting_room_capacity(2)
        .open_threshold(1)
        .duration_minutes(0)
        .time_scale_ms_per_minute(20)
        .seed(7)
        .spawn()?;

    // duration=0 disables the wall-clock stop; give it a moment to prove
    // it does not exit on its own, then stop it externally.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(sim.read_summary().is_err(), "summary is only written at shutdown");

    sim.interrupt()?;
    let status = sim.wait_exit(TIMEOUT).await?;
    assert!(status.success());

    let summary = sim.read_summary()?;
    assert!(summary.contains_key("total_patients"));

    Ok(())
}

#[tokio::test]
async fn reg2_history_records_at_most_one_concurrent_desk() -> anyhow::Result<()> {
    let mut sim = SorsimProcess::build()
        .waiting_room_capacity(10)
        .open_threshold(5)
        .duration_minutes(1)
        .time_scale_ms_per_minute(20)
        .seed(99)
        .spawn()?;

    sim.wait_exit(TIMEOUT).await?;

    let summary = sim.read_summary()?;
    let history = summary.get("reg2_history").cloned().unwrap_or_default();
    // Either no Reg2 was ever provisioned under light load, or its id
    // appears once per open/close cycle — the dynamic-desk invariant is
    // that two are never alive at once, not that only one ever opens.
    let count = if history.is_empty() { 0 } else { history.split(',').count() };
    assert!(count <= 4, "reg2History grew suspiciously large for a one-minute run: {history:?}");

    Ok(())
}
