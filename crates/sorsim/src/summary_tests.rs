// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn elapsed_formats_days_hours_minutes_seconds() {
    assert_eq!(format_elapsed(0.0), "0d 0h 0m 0s");
    assert_eq!(format_elapsed(1.5), "0d 0h 1m 30s");
    assert_eq!(format_elapsed(60.0 * 25.0 + 3.0 / 60.0), "1d 1h 0m 3s");
}

#[tokio::test]
async fn write_produces_recognizable_fields() -> anyhow::Result<()> {
    let params = crate::config::SimParams { waiting_room_capacity: 4, ..crate::config::SimParams::default() };
    let state = SharedState::new(params);
    let file = tempfile::NamedTempFile::new()?;
    write(&state, file.path()).await?;
    let contents = std::fs::read_to_string(file.path())?;
    assert!(contents.contains("total_patients=0"));
    assert!(contents.contains("waiting_room_capacity=4"));
    assert!(contents.contains("specialists=-,-,-,-,-,-"));
    Ok(())
}
