// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logger: drains `LogChan` and appends formatted lines to a file.
//! Terminates on the sentinel record.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::kernel::Kernel;

/// Run the Logger until it sees a record whose text is literally `END`.
pub async fn run(kernel: Arc<Kernel>, log_path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", log_path.display()))?;

    loop {
        let Some(record) = kernel.channels.log.recv_at_most(0).await else {
            break;
        };
        let is_sentinel = record.text == "END";
        let mut line = record.render();
        line.push('\n');
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::warn!(err = %e, "logger failed to write a line");
        }
        if is_sentinel {
            break;
        }
    }

    let _ = file.flush();
    Ok(())
}
