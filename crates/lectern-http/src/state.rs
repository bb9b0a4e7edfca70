//! Observable session state cell.

use tokio::sync::watch;

use lectern_core::SessionState;

/// Holds the current [`SessionState`] and notifies subscribers on change.
///
/// Transitions are plain assignments; legality is the session manager's
/// concern. Subscribers see the latest state, not every intermediate one.
#[derive(Debug)]
pub struct SessionStateCell {
    tx: watch::Sender<SessionState>,
}

impl Default for SessionStateCell {
    fn default() -> Self {
        Self::new(SessionState::Unauthenticated)
    }
}

impl SessionStateCell {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// The current state.
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Replace the state, returning the previous one.
    pub fn transition(&self, next: SessionState) -> SessionState {
        self.tx.send_replace(next)
    }

    /// Observe state changes. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// A live subscription to session state changes.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: watch::Receiver<SessionState>,
}

impl SessionSubscription {
    /// The state as of now.
    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the session manager
    /// has been dropped.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::UserProfile;
    use lectern_core::profile::UserId;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::Number(1),
            username: "ada".to_string(),
            email: None,
            display_name: None,
            roles: Vec::new(),
            created_at: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn transition_returns_previous_state() {
        let cell = SessionStateCell::default();
        let previous = cell.transition(SessionState::Authenticating);
        assert_eq!(previous, SessionState::Unauthenticated);
        assert_eq!(cell.current(), SessionState::Authenticating);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let cell = SessionStateCell::default();
        let mut sub = cell.subscribe();

        cell.transition(SessionState::Authenticated(profile()));
        let seen = sub.changed().await.unwrap();
        assert!(seen.is_authenticated());
        assert_eq!(sub.current(), seen);
    }

    #[tokio::test]
    async fn subscription_ends_when_cell_dropped() {
        let cell = SessionStateCell::default();
        let mut sub = cell.subscribe();
        drop(cell);
        assert!(sub.changed().await.is_none());
    }

    #[test]
    fn transitions_work_without_subscribers() {
        let cell = SessionStateCell::default();
        drop(cell.subscribe());
        cell.transition(SessionState::Terminating);
        assert_eq!(cell.current(), SessionState::Terminating);
    }
}
