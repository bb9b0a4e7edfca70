//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use lectern_core::LoginCredentials;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username or email address
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(global: &GlobalArgs, args: LoginArgs) -> Result<()> {
    let session = CliSession::open(global, true)?;
    let credentials = LoginCredentials::new(args.identifier, args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let profile = session
        .manager
        .login(credentials)
        .await
        .context("Failed to login")?;

    session.persist().context("Failed to save session")?;

    output::success("Logged in successfully");
    println!();
    output::field("User", profile.label());
    output::field("ID", &profile.id.to_string());
    output::field("Server", session.base().as_str());

    Ok(())
}
