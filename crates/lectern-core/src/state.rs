//! Session state and the events observers receive.

use crate::profile::UserProfile;

/// Where the session is in its lifecycle.
///
/// `Unauthenticated` → `Authenticating` → `Authenticated` → `Terminating` →
/// `Unauthenticated`. `Authenticated` implies a credential is stored; a
/// missing credential implies `Unauthenticated` or `Authenticating`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(UserProfile),
    Terminating,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// The user profile, when authenticated.
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Terminating => "terminating",
        }
    }
}

/// Events published to UI shells and other observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session state changed.
    StateChanged(SessionState),
    /// The user logged out.
    LoggedOut,
    /// The session was torn down after the server refused to refresh it.
    /// `redirected` is false when the shell was already at the login route.
    Terminated { redirected: bool },
}
