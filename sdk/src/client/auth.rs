//! Sign-out notification.
//!
//! The REST client reports `401` responses to every registered listener.
//! Listeners are handed to the client when it is built, so no screen can
//! silently replace another's handler.

/// Receives a notification whenever the server rejects the credential.
pub trait UnauthorizedListener: Send + Sync {
    /// Called once per `401` response.
    fn on_unauthorized(&self);
}

impl<F> UnauthorizedListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        self();
    }
}
