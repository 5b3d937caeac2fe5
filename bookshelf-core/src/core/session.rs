use tokio::sync::watch;

/// In-memory state of the signed-in user.
///
/// Holds the nickname shown across screens. It is separate from the persisted
/// nickname in [`PrefsStore`](crate::PrefsStore): signing out clears this
/// value only, so the login screen can still prefill the saved name.
pub struct Session {
    user_name: watch::Sender<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            user_name: watch::channel(String::new()).0,
        }
    }

    pub fn user_name(&self) -> String {
        self.user_name.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.user_name.subscribe()
    }

    pub fn set_user_name(&self, name: impl Into<String>) {
        self.user_name.send_replace(name.into());
    }

    pub fn is_signed_in(&self) -> bool {
        !self.user_name.borrow().is_empty()
    }

    pub fn reset_for_logout(&self) {
        self.user_name.send_replace(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_logout() {
        let session = Session::new();
        assert!(!session.is_signed_in());

        session.set_user_name("reader42");
        assert!(session.is_signed_in());
        assert_eq!(session.user_name(), "reader42");

        session.reset_for_logout();
        assert!(!session.is_signed_in());
        assert_eq!(session.user_name(), "");
    }

    #[test]
    fn test_subscribers_see_changes() {
        let session = Session::new();
        let mut rx = session.subscribe();

        session.set_user_name("ana");
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "ana");
    }
}
