//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::CliSession;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(global: &GlobalArgs, _args: RefreshArgs) -> Result<()> {
    let session = CliSession::open(global, false)?;

    let result = session.manager.refresh().await;
    // Persist even on failure: teardown may have dropped the cookie.
    session.persist().context("Failed to save session")?;
    result.context("Failed to refresh session")?;

    output::success("Session refreshed");
    Ok(())
}
