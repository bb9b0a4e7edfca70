//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(global: &GlobalArgs, _args: LogoutArgs) -> Result<()> {
    let session = CliSession::open(global, false)?;

    session.manager.logout().await;
    session.forget().context("Failed to remove session cookie")?;

    output::success("Logged out");
    Ok(())
}
