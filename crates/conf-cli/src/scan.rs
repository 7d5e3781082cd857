// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scanning station
//!
//! Payloads come from the command line or, when none are given, one per line
//! on stdin so a QR reader can be piped in.

use crate::context::Context;
use crate::output::print_json;
use clap::Args;
use conf_domain_types::Role;
use conf_rest_client::{RestClientError, ScanDebouncer, ScanOutcome, Scanner};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Decoded QR payloads; read from stdin when omitted
    pub payloads: Vec<String>,

    /// Record this mark instead of toggling (checkin, pause, resume, checkout)
    #[arg(long)]
    pub action: Option<String>,

    /// Ignore the same payload read again within this many seconds
    #[arg(long, default_value_t = 3)]
    pub debounce_secs: u64,
}

impl ScanArgs {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let client = ctx.client_for(Role::Admin)?;
        let debouncer = ScanDebouncer::new(Duration::from_secs(self.debounce_secs));
        let mut scanner = Scanner::new(client, debouncer).with_action(self.action);
        let mut failures = 0usize;

        if self.payloads.is_empty() {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                if !scan_one(&mut scanner, &line, ctx.json).await? {
                    failures += 1;
                }
            }
        } else {
            for payload in &self.payloads {
                if !scan_one(&mut scanner, payload, ctx.json).await? {
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} scan(s) failed");
        }
        Ok(())
    }
}

/// Submit one payload; `Ok(false)` when it was rejected but scanning can go on
async fn scan_one(scanner: &mut Scanner, payload: &str, json: bool) -> anyhow::Result<bool> {
    match scanner.scan(payload).await {
        Ok(ScanOutcome::Recorded(response)) => {
            if json {
                print_json(&response)?;
            } else {
                let note = if response.duplicate { " (already recorded)" } else { "" };
                println!(
                    "Registration {}: {} | {:.2} credit h{note}",
                    response.registration_id, response.status, response.credit_hours
                );
            }
            Ok(true)
        }
        Ok(ScanOutcome::Debounced) => Ok(true),
        Err(err @ (RestClientError::InvalidPayload(_) | RestClientError::Server { .. })) => {
            eprintln!("{}: {err}", payload.trim());
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}
