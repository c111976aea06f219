//! Callback sink for location service events.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::types::{AuthorizationStatus, PlatformError};
use crate::coord::LocationFix;

/// An event pushed by a [`LocationService`](super::LocationService).
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// Authorization status changed.
    AuthorizationChanged(AuthorizationStatus),
    /// One or more fixes arrived, oldest first.
    FixesDelivered(Vec<LocationFix>),
    /// The service reported a failure.
    Failed(PlatformError),
}

type Deliver = dyn Fn(LocationEvent) -> bool + Send + Sync;

/// Sink through which a location service reports back.
///
/// Cheap to clone. Delivery never blocks: events are forwarded to the
/// owning session's inbox and applied there. Once the session is gone,
/// events are dropped.
#[derive(Clone)]
pub struct LocationEvents {
    deliver: Arc<Deliver>,
}

impl LocationEvents {
    /// Build a sink from a delivery function.
    ///
    /// The function returns `false` when the receiver no longer exists.
    pub fn from_fn<F>(deliver: F) -> Self
    where
        F: Fn(LocationEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Report an authorization change.
    pub fn authorization_changed(&self, status: AuthorizationStatus) -> bool {
        self.send(LocationEvent::AuthorizationChanged(status))
    }

    /// Report a batch of fixes (oldest first).
    pub fn fixes_delivered(&self, fixes: Vec<LocationFix>) -> bool {
        self.send(LocationEvent::FixesDelivered(fixes))
    }

    /// Report a service failure.
    pub fn failed(&self, error: PlatformError) -> bool {
        self.send(LocationEvent::Failed(error))
    }

    fn send(&self, event: LocationEvent) -> bool {
        let delivered = (self.deliver)(event);
        if !delivered {
            debug!("Location event dropped - receiver is gone");
        }
        delivered
    }
}

impl fmt::Debug for LocationEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationEvents").finish_non_exhaustive()
    }
}
