// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use sorsim::config::{Cli, Mode};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.primary.log_level.clone())),
        )
        .init();

    let result = match cli.mode {
        Some(Mode::Logger { channel_id, path }) => sorsim::run::run_logger_mode(channel_id, path).await,
        Some(Mode::Registration { key_base }) => {
            sorsim::run::run_registration_mode(key_base, sorsim::model::Role::Reg1).await
        }
        Some(Mode::Registration2 { key_base }) => {
            sorsim::run::run_registration_mode(key_base, sorsim::model::Role::Reg2).await
        }
        Some(Mode::Triage { key_base }) => sorsim::run::run_triage_mode(key_base).await,
        Some(Mode::Specialist { key_base, type_idx }) => sorsim::run::run_specialist_mode(key_base, type_idx).await,
        Some(Mode::PatientGenerator { key_base, n, k, duration, ms_per_minute, seed, min, max }) => {
            sorsim::run::run_patient_generator_mode(key_base, n, k, duration, ms_per_minute, seed, min, max).await
        }
        Some(Mode::Patient { key_base, id, age, vip, guardian, persons }) => {
            sorsim::run::run_patient_mode(key_base, id, age, vip != 0, guardian != 0, persons).await
        }
        Some(Mode::Visualize { log_path, interval_ms }) => {
            sorsim::run::run_visualize_mode(log_path, interval_ms.unwrap_or(500)).await
        }
        None => {
            let params = match cli.primary.resolve() {
                Ok(params) => params,
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(2);
                }
            };
            sorsim::run::run_primary(params, cli.primary.log_path.clone(), cli.primary.summary_path.clone()).await
        }
    };

    if let Err(e) = result {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
