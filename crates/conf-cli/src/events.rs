// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Staff event management

use crate::context::Context;
use crate::output::{emit, print_json, Table};
use chrono::NaiveDateTime;
use clap::{Args, Subcommand};
use conf_domain_types::Role;
use conf_rest_api_contract::{local_datetime, EventAttendeeResponse, EventRequest, EventResponse};
use conf_rest_client::{poll_attendees, RestClientError};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

/// Accepts `2025-03-14T09:00`, with or without seconds
pub fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    local_datetime::parse(raw).ok_or_else(|| format!("invalid date/time '{raw}', expected YYYY-MM-DDTHH:MM"))
}

#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    #[arg(long)]
    pub name: String,

    /// Local start time, e.g. 2025-03-14T09:00
    #[arg(long, value_parser = parse_local_datetime)]
    pub start: NaiveDateTime,

    /// Local end time
    #[arg(long, value_parser = parse_local_datetime)]
    pub end: NaiveDateTime,
}

impl From<EventArgs> for EventRequest {
    fn from(args: EventArgs) -> Self {
        EventRequest {
            event_name: args.name,
            event_start_time: args.start,
            event_end_time: args.end,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum EventsCommands {
    /// List all events
    List,
    /// Show one event
    Show { id: i64 },
    /// Create an event
    Create(EventArgs),
    /// Replace an event's name and times
    Update {
        id: i64,
        #[command(flatten)]
        event: EventArgs,
    },
    /// Delete an event with its registrations
    Delete { id: i64 },
    /// Attendee roster with live status
    Attendees { id: i64 },
    /// Refresh the roster until interrupted
    Watch {
        id: i64,
        /// Seconds between refreshes
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
    /// Check out everyone still checked in
    CheckoutAll { id: i64 },
    /// Download the roster as CSV
    Export {
        id: i64,
        /// Output file (default: the name suggested by the server)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl EventsCommands {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        let client = ctx.client_for(Role::Admin)?;

        match self {
            EventsCommands::List => {
                let events = client.list_events().await?;
                emit(ctx.json, &events, |events| event_table(events).render())
            }
            EventsCommands::Show { id } => {
                let event = client.get_event(id).await?;
                emit(ctx.json, &event, |event| event_table(std::slice::from_ref(event)).render())
            }
            EventsCommands::Create(args) => {
                let event = client.create_event(&args.into()).await?;
                emit(ctx.json, &event, |event| format!("Created event {}\n", event.id))
            }
            EventsCommands::Update { id, event } => {
                let event = client.update_event(id, &event.into()).await?;
                emit(ctx.json, &event, |event| format!("Updated event {}\n", event.id))
            }
            EventsCommands::Delete { id } => {
                client.delete_event(id).await?;
                if !ctx.json {
                    println!("Deleted event {id}");
                }
                Ok(())
            }
            EventsCommands::Attendees { id } => {
                let roster = client.event_attendees(id).await?;
                emit(ctx.json, &roster, |roster| roster_table(roster).render())
            }
            EventsCommands::Watch { id, interval } => {
                let json = ctx.json;
                let mut failure = None;
                poll_attendees(
                    &client,
                    id,
                    Duration::from_secs(interval.max(1)),
                    async {
                        let _ = tokio::signal::ctrl_c().await;
                    },
                    |result| match result {
                        Ok(roster) => {
                            let printed = if json {
                                print_json(&roster)
                            } else {
                                println!("{}", chrono::Local::now().format("%H:%M:%S"));
                                print!("{}", roster_table(&roster));
                                Ok(())
                            };
                            match printed {
                                Ok(()) => ControlFlow::Continue(()),
                                Err(err) => {
                                    failure = Some(err);
                                    ControlFlow::Break(())
                                }
                            }
                        }
                        // stop on server rejections
                        Err(err @ (RestClientError::Unauthorized(_) | RestClientError::Server { .. })) => {
                            failure = Some(err.into());
                            ControlFlow::Break(())
                        }
                        Err(err) => {
                            eprintln!("refresh failed: {err}");
                            ControlFlow::Continue(())
                        }
                    },
                )
                .await;
                failure.map_or(Ok(()), Err)
            }
            EventsCommands::CheckoutAll { id } => {
                let result = client.checkout_all(id).await?;
                emit(ctx.json, &result, |result| format!("{}\n", result.message))
            }
            EventsCommands::Export { id, out } => {
                let export = client.export_attendees(id).await?;
                let path = out.unwrap_or_else(|| PathBuf::from(&export.filename));
                std::fs::write(&path, export.csv_content.as_bytes())?;
                if ctx.json {
                    print_json(&serde_json::json!({ "path": path }))
                } else {
                    println!("Wrote {}", path.display());
                    Ok(())
                }
            }
        }
    }
}

/// Overall counts for staff
pub async fn stats(ctx: &Context) -> anyhow::Result<()> {
    let stats = ctx.client_for(Role::Admin)?.admin_dashboard_stats().await?;
    emit(ctx.json, &stats, |stats| {
        format!(
            "Events:        {}\nAttendees:     {}\nRegistrations: {}\n",
            stats.total_events, stats.total_attendees, stats.total_registrations
        )
    })
}

fn event_table(events: &[EventResponse]) -> Table {
    let mut table = Table::new(["ID", "Name", "Start", "End"]);
    for event in events {
        table.row([
            event.id.to_string(),
            event.event_name.clone(),
            local_datetime::format(&event.event_start_time),
            local_datetime::format(&event.event_end_time),
        ]);
    }
    table
}

fn roster_table(roster: &[EventAttendeeResponse]) -> Table {
    let mut table = Table::new(["Reg", "Name", "Email", "Status", "Last action", "Credit h"]);
    for row in roster {
        table.row([
            row.registration_id.to_string(),
            row.user_name.clone(),
            row.user_email.clone(),
            row.current_status.clone(),
            row.last_action.clone(),
            format!("{:.2}", row.total_credit_hours),
        ]);
    }
    table
}
