// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Attendee commands

use crate::context::Context;
use crate::output::{emit, print_json, Table};
use clap::Subcommand;
use conf_domain_types::Role;
use conf_rest_api_contract::{local_datetime, AttendeeDashboardStatsResponse, RegistrationResponse};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum AttendeeCommands {
    /// Browse events open for registration
    Events,
    /// Register for an event
    Register { event_id: i64 },
    /// List your registrations
    Registrations,
    /// Save a registration's QR code as PNG
    Qr {
        registration_id: i64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Your attendance summary
    Stats,
}

impl AttendeeCommands {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let client = ctx.client_for(Role::Attendee)?;

        match self {
            AttendeeCommands::Events => {
                let events = client.attendee_events().await?;
                emit(ctx.json, &events, |events| {
                    let mut table = Table::new(["ID", "Name", "Start", "End"]);
                    for event in events {
                        table.row([
                            event.id.to_string(),
                            event.event_name.clone(),
                            local_datetime::format(&event.event_start_time),
                            local_datetime::format(&event.event_end_time),
                        ]);
                    }
                    table.render()
                })
            }
            AttendeeCommands::Register { event_id } => {
                let registration = client.register_for_event(event_id).await?;
                emit(ctx.json, &registration, |r| {
                    format!(
                        "Registered for event {} (registration {}, code {})\n",
                        r.event_id, r.registration_id, r.code
                    )
                })
            }
            AttendeeCommands::Registrations => {
                let registrations = client.my_registrations().await?;
                emit(ctx.json, &registrations, |r| registration_table(r).render())
            }
            AttendeeCommands::Qr {
                registration_id,
                out,
            } => {
                let png = client.registration_qr(registration_id).await?;
                std::fs::write(&out, &png)?;
                if ctx.json {
                    print_json(&serde_json::json!({ "path": out, "bytes": png.len() }))
                } else {
                    println!("Wrote {}", out.display());
                    Ok(())
                }
            }
            AttendeeCommands::Stats => {
                let stats = client.attendee_dashboard_stats().await?;
                emit(ctx.json, &stats, render_stats)
            }
        }
    }
}

fn registration_table(registrations: &[RegistrationResponse]) -> Table {
    let mut table = Table::new(["Reg", "Event", "Code"]);
    for r in registrations {
        table.row([r.registration_id.to_string(), r.event_id.to_string(), r.code.clone()]);
    }
    table
}

fn render_stats(stats: &AttendeeDashboardStatsResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Upcoming events:  {}", stats.upcoming_events);
    let _ = writeln!(out, "Events attended:  {}", stats.events_attended);
    let _ = writeln!(out, "Attendance hours: {:.2}", stats.total_attendance_hours);
    let _ = writeln!(out, "QR scans:         {}", stats.qr_scans);

    if !stats.recent_activity.is_empty() {
        out.push('\n');
        let mut table = Table::new(["When", "Activity", "Status"]);
        for activity in &stats.recent_activity {
            table.row([
                activity.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                format!("{} {}", activity.activity_type, activity.event_name),
                activity.status.clone(),
            ]);
        }
        out.push_str(&table.render());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use conf_rest_api_contract::RecentActivityResponse;

    #[test]
    fn stats_include_recent_activity() {
        let stats = AttendeeDashboardStatsResponse {
            upcoming_events: 2,
            total_attendance_hours: 1.25,
            qr_scans: 3,
            events_attended: 1,
            recent_activity: vec![RecentActivityResponse {
                activity_type: "Checked in to".to_string(),
                event_name: "RustConf".to_string(),
                timestamp: chrono::Utc::now(),
                status: "completed".to_string(),
            }],
        };

        let text = render_stats(&stats);
        assert!(text.contains("Attendance hours: 1.25"));
        assert!(text.contains("Checked in to RustConf"));
    }
}
