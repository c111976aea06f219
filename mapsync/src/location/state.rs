//! Location state owned by the map session.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::coord::{Coordinate, LocationFix};
use crate::error::MapError;
use crate::platform::{AuthorizationStatus, LocationService, PlatformError};

/// Callback invoked with the coordinate of each newly applied fix.
pub type FixHandler = Box<dyn Fn(Coordinate) + Send + Sync>;

/// Identifies a registered fix handler so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixHandlerId(u64);

/// Point-in-time copy of [`LocationState`] for observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSnapshot {
    /// Current authorization status.
    pub authorization: AuthorizationStatus,
    /// Whether the service has been told to deliver fixes.
    pub tracking: bool,
    /// Coordinate of the most recent fix.
    pub current: Option<Coordinate>,
    /// Most recent fix.
    pub last_known: Option<LocationFix>,
    /// Most recent failure, if any.
    #[serde(skip)]
    pub last_error: Option<MapError>,
}

/// Tracks authorization, tracking state and the latest fix.
///
/// Owns the platform subscription for its whole life. Mutated only by the
/// session that owns it; all methods take `&mut self` and run on the
/// session task.
pub struct LocationState {
    service: Arc<dyn LocationService>,
    authorization: AuthorizationStatus,
    tracking: bool,
    last_known: Option<LocationFix>,
    last_error: Option<MapError>,
    handlers: Vec<(FixHandlerId, FixHandler)>,
    next_handler_id: u64,
    fixes_tx: broadcast::Sender<Coordinate>,
}

impl LocationState {
    /// Create a new location state around a platform service.
    ///
    /// `fix_channel_capacity` bounds the broadcast backlog kept for slow
    /// subscribers; lagging subscribers skip ahead.
    pub fn new(service: Arc<dyn LocationService>, fix_channel_capacity: usize) -> Self {
        let (fixes_tx, _) = broadcast::channel(fix_channel_capacity.max(1));
        Self {
            service,
            authorization: AuthorizationStatus::NotDetermined,
            tracking: false,
            last_known: None,
            last_error: None,
            handlers: Vec::new(),
            next_handler_id: 0,
            fixes_tx,
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Ask the platform for authorization. The answer arrives later via
    /// [`handle_authorization_change`](Self::handle_authorization_change).
    pub fn request_permission(&self) {
        debug!("Requesting location authorization");
        self.service.request_authorization();
    }

    /// Start tracking. Returns `false` if already tracking.
    pub fn start_tracking(&mut self) -> bool {
        if self.tracking {
            return false;
        }
        self.service.start();
        self.tracking = true;
        info!(authorization = ?self.authorization, "Location tracking started");
        true
    }

    /// Stop tracking. Returns `false` if already stopped.
    pub fn stop_tracking(&mut self) -> bool {
        if !self.tracking {
            return false;
        }
        self.service.stop();
        self.tracking = false;
        info!(authorization = ?self.authorization, "Location tracking stopped");
        true
    }

    /// Register a fix handler. Existing handlers stay registered.
    pub fn on_fix_update(&mut self, handler: FixHandler) -> FixHandlerId {
        let id = FixHandlerId(self.next_handler_id);
        self.next_handler_id += 1;
        self.handlers.push((id, handler));
        id
    }

    /// Remove a previously registered handler. Returns `false` if unknown.
    pub fn remove_fix_handler(&mut self, id: FixHandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Subscribe to fix coordinates through the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Coordinate> {
        self.fixes_tx.subscribe()
    }

    /// Sender side of the fix broadcast, for handing out new subscriptions.
    pub fn fix_sender(&self) -> broadcast::Sender<Coordinate> {
        self.fixes_tx.clone()
    }

    // =========================================================================
    // Platform callbacks
    // =========================================================================

    /// Apply an authorization change and start or stop tracking to match.
    pub fn handle_authorization_change(&mut self, status: AuthorizationStatus) {
        let previous = std::mem::replace(&mut self.authorization, status);
        debug!(from = ?previous, to = ?status, "Authorization changed");

        if status.is_authorized() {
            self.start_tracking();
        } else {
            self.stop_tracking();
            if status.is_refused() {
                warn!(status = ?status, "Location permission refused");
                self.last_error = Some(MapError::PermissionDenied);
            }
        }
    }

    /// Apply a batch of fixes delivered oldest first.
    ///
    /// Only the last fix is kept; earlier ones in the batch are discarded.
    /// Returns the applied coordinate, or `None` for an empty batch.
    pub fn handle_fixes(&mut self, fixes: Vec<LocationFix>) -> Option<Coordinate> {
        let batch_len = fixes.len();
        let fix = fixes.into_iter().last()?;
        let coordinate = fix.coordinate;

        self.last_known = Some(fix);
        debug!(
            lat = coordinate.latitude,
            lon = coordinate.longitude,
            accuracy_m = fix.accuracy,
            batch_len,
            "Fix applied"
        );

        for (_, handler) in &self.handlers {
            handler(coordinate);
        }
        // No subscribers is fine.
        let _ = self.fixes_tx.send(coordinate);

        Some(coordinate)
    }

    /// Record a service failure. Tracking is left as is; the platform owns retry.
    pub fn handle_failure(&mut self, error: PlatformError) {
        let error = match error {
            PlatformError::Denied => MapError::PermissionDenied,
            PlatformError::Unavailable(msg) | PlatformError::Failed(msg) => {
                MapError::LocationUnavailable(msg)
            }
        };
        warn!(error = %error, tracking = self.tracking, "Location update failed");
        self.last_error = Some(error);
    }

    /// Release the platform subscription at session teardown.
    pub fn release(&mut self) {
        self.stop_tracking();
        self.handlers.clear();
        debug!("Location subscription released");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current authorization status.
    pub fn authorization(&self) -> AuthorizationStatus {
        self.authorization
    }

    /// Whether tracking is active.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Coordinate of the most recent fix.
    pub fn current(&self) -> Option<Coordinate> {
        self.last_known.map(|fix| fix.coordinate)
    }

    /// Most recent fix.
    pub fn last_known(&self) -> Option<&LocationFix> {
        self.last_known.as_ref()
    }

    /// Most recent failure.
    pub fn last_error(&self) -> Option<&MapError> {
        self.last_error.as_ref()
    }

    /// Number of registered fix handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Take a snapshot for observers.
    pub fn snapshot(&self) -> LocationSnapshot {
        LocationSnapshot {
            authorization: self.authorization,
            tracking: self.tracking,
            current: self.current(),
            last_known: self.last_known,
            last_error: self.last_error.clone(),
        }
    }
}

impl fmt::Debug for LocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationState")
            .field("authorization", &self.authorization)
            .field("tracking", &self.tracking)
            .field("last_known", &self.last_known)
            .field("last_error", &self.last_error)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
