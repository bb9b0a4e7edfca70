//! Subcommand implementations.

mod login;
mod logout;
mod refresh;
mod request;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with a username or email and password
    Login(login::LoginArgs),

    /// End the session and forget the stored credential
    Logout(logout::LogoutArgs),

    /// Resume the stored session and show who it belongs to
    Whoami(whoami::WhoamiArgs),

    /// Exchange the session cookie for a fresh access credential
    Refresh(refresh::RefreshArgs),

    /// GET a protected endpoint
    Get(request::ReadArgs),

    /// POST a JSON body to a protected endpoint
    Post(request::WriteArgs),

    /// PUT a JSON body to a protected endpoint
    Put(request::WriteArgs),

    /// DELETE a protected resource
    Delete(request::ReadArgs),
}

pub async fn handle(global: GlobalArgs, command: Command) -> Result<()> {
    match command {
        Command::Login(args) => login::run(&global, args).await,
        Command::Logout(args) => logout::run(&global, args).await,
        Command::Whoami(args) => whoami::run(&global, args).await,
        Command::Refresh(args) => refresh::run(&global, args).await,
        Command::Get(args) => request::get(&global, args).await,
        Command::Post(args) => request::post(&global, args).await,
        Command::Put(args) => request::put(&global, args).await,
        Command::Delete(args) => request::delete(&global, args).await,
    }
}
