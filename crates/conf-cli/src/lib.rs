// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use clap::Subcommand;
use conf_logging::CliLoggingArgs;
use std::path::PathBuf;
use url::Url;

pub mod account;
pub mod attendee;
pub mod context;
pub mod events;
pub mod output;
pub mod scan;

pub use context::Context;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(clap::Parser, Debug)]
#[command(
    name = "confctl",
    about = "Conference attendance command-line client",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Base URL of the attendance service
    #[arg(long, global = true, env = "CONFCTL_SERVER", default_value = DEFAULT_SERVER)]
    pub server: Url,

    /// Where the sign-in session is kept (default: platform config directory)
    #[arg(long, global = true, env = "CONFCTL_SESSION")]
    pub session_file: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub logging: CliLoggingArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login(account::LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Create an attendee account
    Register(account::RegisterArgs),
    /// Create a staff account
    AdminRegister(account::AdminRegisterArgs),
    /// Event management (staff)
    Events {
        #[command(subcommand)]
        subcommand: events::EventsCommands,
    },
    /// Overall statistics (staff)
    Stats,
    /// Submit scanned QR payloads (staff)
    Scan(scan::ScanArgs),
    /// Attendee commands
    Attendee {
        #[command(subcommand)]
        subcommand: attendee::AttendeeCommands,
    },
}

impl Cli {
    pub fn context(&self) -> Context {
        Context {
            server: self.server.clone(),
            session_path: self
                .session_file
                .clone()
                .unwrap_or_else(conf_rest_client::default_session_path),
            json: self.json,
        }
    }

    /// Execute the parsed command
    pub async fn run(self) -> anyhow::Result<()> {
        let ctx = self.context();
        match self.command {
            Commands::Login(args) => args.run(&ctx).await,
            Commands::Logout => account::logout(&ctx),
            Commands::Whoami => account::whoami(&ctx),
            Commands::Register(args) => args.run(&ctx).await,
            Commands::AdminRegister(args) => args.run(&ctx).await,
            Commands::Events { subcommand } => subcommand.run(&ctx).await,
            Commands::Stats => events::stats(&ctx).await,
            Commands::Scan(args) => args.run(&ctx).await,
            Commands::Attendee { subcommand } => subcommand.run(&ctx).await,
        }
    }
}

pub use clap::Parser;
