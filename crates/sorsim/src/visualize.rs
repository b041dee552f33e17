// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal log-tailing renderer. The real terminal visualizer is out of
//! scope — this is the thin stand-in the CLI surface still needs to
//! present.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

pub async fn run(log_path: &Path, interval_ms: u64) -> anyhow::Result<()> {
    let mut file = std::fs::File::open(log_path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", log_path.display()))?;
    let mut pos = file.seek(SeekFrom::End(0))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = tokio::time::sleep(Duration::from_millis(interval_ms)) => {}
        }

        let len = file.metadata()?.len();
        if len < pos {
            // Log file was rotated or truncated; start over from the top.
            pos = 0;
        }
        if len > pos {
            file.seek(SeekFrom::Start(pos))?;
            let mut buf = String::new();
            file.read_to_string(&mut buf)?;
            print!("{buf}");
            pos = file.stream_position()?;
        }
    }
}
