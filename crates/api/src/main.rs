//! CivicReport - command-line client
//!
//! Restores the persisted session and runs one command against it.

#![allow(clippy::print_stdout)]

use std::time::Instant;

use anyhow::{Context, Result};
use civicreport_core::{RestoreOutcome, SessionError};
use civicreport_domain::SessionSnapshot;
use civicreport_lib::utils::logging::{error_label, init_tracing, log_command_execution};
use civicreport_lib::AppContext;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

/// CivicReport session client.
#[derive(Parser)]
#[command(name = "civicreport")]
#[command(about = "Sign in to CivicReport and inspect the session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Show the current session after refreshing the profile.
    Status,

    /// Sign in with email and password.
    Login {
        /// Account email
        email: String,

        /// Account password
        password: String,
    },

    /// Sign out and clear stored credentials.
    Logout,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Login { .. } => "login",
            Self::Logout => "logout",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    let ctx = AppContext::new().context("failed to initialize application")?;
    init_tracing(&ctx.config.logging)?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    match ctx.start().await {
        RestoreOutcome::DecodeFailed(err) => warn!(error = %err, "Stored session was discarded"),
        outcome => debug!(?outcome, "Session restored"),
    }

    let name = cli.command.name();
    let started = Instant::now();
    let result = run(&ctx, cli.command).await;
    log_command_execution(name, started.elapsed(), result.is_ok());

    ctx.shutdown().await;
    result
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Status => {
            ctx.session.await_profile_refresh().await;
            print_snapshot(&ctx.session.snapshot());
            Ok(())
        }
        Commands::Login { email, password } => match ctx.session.login(&email, &password).await {
            Ok(user) => {
                println!("Signed in as {} ({})", user.display_name(), user.role);
                Ok(())
            }
            Err(err) => {
                if let SessionError::Api(api) = &err {
                    warn!(kind = error_label(api), "Login failed");
                }
                Err(err).context("login failed")
            }
        },
        Commands::Logout => {
            ctx.session.logout().await;
            println!("Signed out");
            Ok(())
        }
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!("status: {}", snapshot.status);
    if let Some(user) = &snapshot.user {
        println!("user:   {} <{}>", user.display_name(), user.email);
        println!("role:   {}", user.role);
        if let Some(tenant) = &user.tenant_id {
            println!("tenant: {tenant}");
        }
    }
}
