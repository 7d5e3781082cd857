// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use conf_cli::account::ExpectedRole;
use conf_cli::attendee::AttendeeCommands;
use conf_cli::events::EventsCommands;
use conf_cli::{Cli, Commands, Parser, DEFAULT_SERVER};
use std::path::PathBuf;

#[test]
fn test_cli_parsing_login() {
    let cli = Cli::try_parse_from([
        "confctl",
        "login",
        "--email",
        "desk@example.com",
        "--password",
        "secret123",
        "--expect",
        "admin",
    ])
    .unwrap();

    let Commands::Login(args) = cli.command else {
        panic!("expected login");
    };
    assert_eq!(args.email, "desk@example.com");
    assert_eq!(args.expect, Some(ExpectedRole::Admin));
    assert_eq!(cli.server.as_str(), format!("{DEFAULT_SERVER}/"));
}

#[test]
fn test_cli_parsing_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "confctl",
        "events",
        "list",
        "--server",
        "http://conf.example.com:9000",
        "--session-file",
        "/tmp/session.json",
        "--json",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.server.host_str(), Some("conf.example.com"));
    assert_eq!(cli.context().session_path, PathBuf::from("/tmp/session.json"));
    assert!(matches!(
        cli.command,
        Commands::Events {
            subcommand: EventsCommands::List
        }
    ));
}

#[test]
fn test_cli_parsing_event_create() {
    let cli = Cli::try_parse_from([
        "confctl",
        "events",
        "create",
        "--name",
        "RustConf",
        "--start",
        "2025-03-14T09:00",
        "--end",
        "2025-03-14T17:00:00",
    ])
    .unwrap();

    let Commands::Events {
        subcommand: EventsCommands::Create(args),
    } = cli.command
    else {
        panic!("expected events create");
    };
    assert_eq!(args.name, "RustConf");
    assert!(args.start < args.end);
}

#[test]
fn test_cli_rejects_bad_datetime() {
    let result = Cli::try_parse_from([
        "confctl", "events", "create", "--name", "X", "--start", "soon", "--end",
        "2025-03-14T17:00",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_cli_parsing_watch_defaults() {
    let cli = Cli::try_parse_from(["confctl", "events", "watch", "4"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Events {
            subcommand: EventsCommands::Watch { id: 4, interval: 10 }
        }
    ));
}

#[test]
fn test_cli_parsing_scan() {
    let cli = Cli::try_parse_from([
        "confctl",
        "scan",
        "REG:abc:EVENT:1:USER:2",
        "def",
        "--action",
        "pause",
    ])
    .unwrap();

    let Commands::Scan(args) = cli.command else {
        panic!("expected scan");
    };
    assert_eq!(args.payloads, vec!["REG:abc:EVENT:1:USER:2", "def"]);
    assert_eq!(args.action.as_deref(), Some("pause"));
    assert_eq!(args.debounce_secs, 3);

    let cli = Cli::try_parse_from(["confctl", "scan"]).unwrap();
    let Commands::Scan(args) = cli.command else {
        panic!("expected scan");
    };
    assert!(args.payloads.is_empty());
}

#[test]
fn test_cli_parsing_attendee_qr() {
    let cli = Cli::try_parse_from(["confctl", "attendee", "qr", "12", "--out", "ticket.png"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Attendee {
            subcommand: AttendeeCommands::Qr { registration_id: 12, .. }
        }
    ));
}

#[test]
fn test_cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["confctl"]).is_err());
}
