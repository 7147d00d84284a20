/// Receives the side effect of an unrecoverable authentication failure
///
/// Called once when a request got a 401 and the token refresh failed. The
/// front end reacts by sending the user back to login.
#[cfg_attr(test, mockall::automock)]
pub trait AuthObserver: Send + Sync {
    fn on_auth_required(&self);
}

/// Observer that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyObserver;

impl AuthObserver for LogOnlyObserver {
    fn on_auth_required(&self) {
        tracing::warn!("Authentication required, session could not be refreshed");
    }
}
