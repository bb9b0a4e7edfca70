//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use lectern_core::AuthError;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the full profile as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(global: &GlobalArgs, args: WhoamiArgs) -> Result<()> {
    let session = CliSession::open(global, false)?;

    let state = session
        .manager
        .bootstrap()
        .await
        .context("Failed to resume session")?;
    session.persist().context("Failed to save session")?;

    let profile = state
        .profile()
        .ok_or(AuthError::NotAuthenticated)
        .context("No active session. Run 'lectern login' first.")?;

    if args.json {
        return output::json_pretty(profile);
    }

    output::field("User", profile.label());
    output::field("ID", &profile.id.to_string());
    if let Some(email) = &profile.email {
        output::field("Email", email);
    }
    if !profile.roles.is_empty() {
        output::field("Roles", &profile.roles.join(", "));
    }
    output::field("Server", session.base().as_str());

    Ok(())
}
