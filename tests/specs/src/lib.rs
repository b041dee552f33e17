// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `sorsim` binary as a subprocess against a generated
//! config file and inspects the simulation log and summary files it
//! writes rather than talking to it over a transport.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Resolve the path to the compiled `sorsim` binary.
pub fn sorsim_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("sorsim")
}

/// Builder for a config file plus the process spawned against it.
pub struct SorsimBuilder {
    n: u64,
    k: u64,
    duration_minutes: u64,
    ms_per_minute: u64,
    seed: u64,
    extra: Vec<(String, String)>,
}

impl Default for SorsimBuilder {
    fn default() -> Self {
        Self { n: 4, k: 2, duration_minutes: 1, ms_per_minute: 20, seed: 1, extra: Vec::new() }
    }
}

impl SorsimBuilder {
    pub fn waiting_room_capacity(mut self, n: u64) -> Self {
        self.n = n;
        self
    }

    pub fn open_threshold(mut self, k: u64) -> Self {
        self.k = k;
        self
    }

    pub fn duration_minutes(mut self, minutes: u64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn time_scale_ms_per_minute(mut self, ms: u64) -> Self {
        self.ms_per_minute = ms;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set an arbitrary additional `key=value` config line.
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.extra.push((key.to_owned(), value.to_string()));
        self
    }

    pub fn spawn(self) -> anyhow::Result<SorsimProcess> {
        let binary = sorsim_binary();
        anyhow::ensure!(binary.exists(), "sorsim binary not found at {}", binary.display());

        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("sorsim.conf");
        let log_path = dir.path().join("sorsim.log");
        let summary_path = dir.path().join("sorsim-summary.txt");

        let mut config_body = format!(
            "N_waitingRoom={}\nK_registrationThreshold={}\nsimulationDurationMinutes={}\ntimeScaleMsPerSimMinute={}\nrandomSeed={}\n",
            self.n, self.k, self.duration_minutes, self.ms_per_minute, self.seed
        );
        for (key, value) in &self.extra {
            config_body.push_str(&format!("{key}={value}\n"));
        }
        std::fs::write(&config_path, config_body)?;

        let child = Command::new(&binary)
            .arg("--config")
            .arg(&config_path)
            .arg("--log-path")
            .arg(&log_path)
            .arg("--summary-path")
            .arg(&summary_path)
            .arg("--log-level")
            .arg("warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(SorsimProcess { child, log_path, summary_path, _dir: dir })
    }
}

/// A running `sorsim` process that is killed on drop.
pub struct SorsimProcess {
    child: Child,
    log_path: PathBuf,
    summary_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl SorsimProcess {
    /// Spawn sorsim with default parameters small enough to finish quickly.
    pub fn start() -> anyhow::Result<Self> {
        SorsimBuilder::default().spawn()
    }

    pub fn build() -> SorsimBuilder {
        SorsimBuilder::default()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// Send `SIGINT`, asking for a graceful shutdown.
    pub fn interrupt(&self) -> anyhow::Result<()> {
        send_signal(self.child.id(), libc_sigint())
    }

    /// Send the evacuation stimulus (`SIGUSR1`).
    pub fn evacuate(&self) -> anyhow::Result<()> {
        send_signal(self.child.id(), libc_sigusr1())
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(&mut self, timeout: Duration) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("sorsim did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Read every currently-written log line.
    pub fn read_log_lines(&self) -> anyhow::Result<Vec<String>> {
        let text = std::fs::read_to_string(&self.log_path).unwrap_or_default();
        Ok(text.lines().map(|l| l.to_owned()).collect())
    }

    /// Parse the summary file into its `key=value` fields.
    pub fn read_summary(&self) -> anyhow::Result<HashMap<String, String>> {
        let text = std::fs::read_to_string(&self.summary_path)?;
        let mut map = HashMap::new();
        for line in text.lines() {
            if let Some((key, value)) = line.split_once('=') {
                map.insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }
        Ok(map)
    }
}

impl Drop for SorsimProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn libc_sigint() -> i32 {
    2
}

fn libc_sigusr1() -> i32 {
    10
}

/// Send a raw signal to a process by pid without depending on a signal crate.
fn send_signal(pid: u32, sig: i32) -> anyhow::Result<()> {
    let status = Command::new("kill").arg(format!("-{sig}")).arg(pid.to_string()).status()?;
    anyhow::ensure!(status.success(), "kill -{sig} {pid} failed");
    Ok(())
}

/// Write arbitrary text to a fresh temp file, returning its path.
pub fn write_temp_file(contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}
