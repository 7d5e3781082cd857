// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use conf_cli::{Cli, Parser};
use conf_logging::{init_to_file, standard_log_path, CliLogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to a file so they never mix with command output
    let log_path = cli
        .logging
        .log_path("confctl")
        .unwrap_or_else(|| standard_log_path("confctl"));
    init_to_file(
        "confctl",
        cli.logging.log_level.unwrap_or(CliLogLevel::Warn).into(),
        cli.logging.log_format.unwrap_or_default(),
        &log_path,
    )?;

    cli.run().await
}
