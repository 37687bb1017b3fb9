//! Provisioning readiness tracking.
//!
//! [`ReadinessHandle`] records whether the managed indices have been
//! provisioned. Hosts can gate traffic on it instead of racing index
//! creation during cold start.
//!
//! ```rust
//! use quarry_core::service::{ReadinessHandle, ReadinessState};
//!
//! let handle = ReadinessHandle::new("indices");
//! assert_eq!(handle.state(), ReadinessState::Pending);
//!
//! handle.set_state(ReadinessState::Provisioning);
//! handle.set_state(ReadinessState::Ready);
//! assert!(handle.state().is_serving());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

// ============================================================================
// ReadinessState
// ============================================================================

/// Provisioning state of the managed indices.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadinessState {
    /// Provisioning has not started.
    Pending,
    /// Index checks/creates are in flight.
    Provisioning,
    /// Both indices exist.
    Ready,
    /// Provisioning finished but at least one index could not be ensured.
    Degraded(String),
    /// Provisioning could not run at all.
    Failed(String),
}

impl ReadinessState {
    /// Returns `true` once provisioning has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded(_) | Self::Failed(_))
    }

    /// Returns `true` if searches can be served (Ready or Degraded).
    pub fn is_serving(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded(_))
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Provisioning => write!(f, "provisioning"),
            Self::Ready => write!(f, "ready"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// ReadinessHandle
// ============================================================================

/// Shared handle for observing and updating provisioning state.
///
/// Cheap to clone; every clone observes the same state.
#[derive(Clone)]
pub struct ReadinessHandle {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    tx: watch::Sender<ReadinessState>,
}

impl ReadinessHandle {
    /// Create a handle in the [`ReadinessState::Pending`] state.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ReadinessState::Pending);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                tx,
            }),
        }
    }

    /// Handle name, used in log lines.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current state.
    pub fn state(&self) -> ReadinessState {
        self.inner.tx.borrow().clone()
    }

    /// Update the state and notify subscribers.
    pub fn set_state(&self, state: ReadinessState) {
        match &state {
            ReadinessState::Degraded(_) | ReadinessState::Failed(_) => {
                tracing::warn!(handle = %self.inner.name, state = %state, "Readiness changed");
            }
            _ => tracing::info!(handle = %self.inner.name, state = %state, "Readiness changed"),
        }
        self.inner.tx.send_replace(state);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.inner.tx.subscribe()
    }

    /// Wait until provisioning settles and return the settled state.
    ///
    /// Fails with [`Error::Unavailable`] when `timeout` elapses first.
    pub async fn wait_settled(&self, timeout: Duration) -> Result<ReadinessState> {
        let mut rx = self.subscribe();
        let settled = tokio::time::timeout(timeout, rx.wait_for(ReadinessState::is_settled)).await;

        match settled {
            Ok(Ok(state)) => Ok(state.clone()),
            Ok(Err(_)) => Err(Error::unavailable(format!(
                "readiness channel '{}' closed",
                self.inner.name
            ))),
            Err(_) => Err(Error::unavailable(format!(
                "'{}' not provisioned after {timeout:?} (state: {})",
                self.inner.name,
                self.state()
            ))),
        }
    }
}

impl fmt::Debug for ReadinessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
