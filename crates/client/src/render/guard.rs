//! Scoped ownership of a browser session.
//!
//! A session must be closed exactly once however its owner exits. The guard
//! offers an explicit async [`SessionGuard::close`]; if the guard is dropped
//! instead (an early return, a panic, or the request future being cancelled),
//! `Drop` spawns the close on the runtime captured at construction.

use tokio::runtime::Handle;

use super::{BrowserSession, RenderError};

/// Owns a browser session and closes it exactly once.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    label: String,
    runtime: Option<Handle>,
}

impl SessionGuard {
    /// Wrap a session. `label` identifies it in logs (usually the target URL).
    pub fn new(session: Box<dyn BrowserSession>, label: impl Into<String>) -> Self {
        Self { session: Some(session), label: label.into(), runtime: Handle::try_current().ok() }
    }

    pub fn session(&self) -> Result<&dyn BrowserSession, RenderError> {
        self.session.as_deref().ok_or(RenderError::BrowserClosed)
    }

    pub fn session_mut(&mut self) -> Result<&mut (dyn BrowserSession + 'static), RenderError> {
        self.session.as_deref_mut().ok_or(RenderError::BrowserClosed)
    }

    /// Close the session, consuming the guard. Close failures are logged, not returned.
    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => tracing::debug!(target_url = %self.label, "browser session closed"),
                Err(e) => tracing::warn!(target_url = %self.label, "failed to close browser session: {e}"),
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else { return };
        let label = std::mem::take(&mut self.label);

        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = session.close().await {
                        tracing::warn!(target_url = %label, "deferred browser session close failed: {e}");
                    } else {
                        tracing::debug!(target_url = %label, "browser session closed after drop");
                    }
                });
            }
            None => tracing::warn!(target_url = %label, "browser session dropped outside a runtime"),
        }
    }
}
