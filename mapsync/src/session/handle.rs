//! Cloneable front door to a running session.

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::message::{Command, Message};
use crate::coord::Coordinate;
use crate::error::SessionError;
use crate::location::{FixHandlerId, LocationSnapshot};
use crate::map::{CameraView, MapSnapshot};
use crate::platform::SearchSuggestion;

/// Handle to a [`MapSession`](super::MapSession).
///
/// Every command enqueues a message and returns at once. The effect shows
/// up in the published snapshots once the session has applied it; use
/// [`sync`](Self::sync) to wait for that.
#[derive(Clone)]
pub struct MapHandle {
    tx: mpsc::UnboundedSender<Message>,
    map_rx: watch::Receiver<MapSnapshot>,
    location_rx: watch::Receiver<LocationSnapshot>,
    fixes_tx: broadcast::Sender<Coordinate>,
}

impl MapHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Message>,
        map_rx: watch::Receiver<MapSnapshot>,
        location_rx: watch::Receiver<LocationSnapshot>,
        fixes_tx: broadcast::Sender<Coordinate>,
    ) -> Self {
        Self {
            tx,
            map_rx,
            location_rx,
            fixes_tx,
        }
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx
            .send(Message::Command(command))
            .map_err(|_| SessionError::Closed)
    }

    // =========================================================================
    // Location commands
    // =========================================================================

    /// Ask the platform for location authorization.
    pub fn request_permission(&self) -> Result<(), SessionError> {
        self.send(Command::RequestPermission)
    }

    /// Start location tracking. No effect if already tracking.
    pub fn start_tracking(&self) -> Result<(), SessionError> {
        self.send(Command::StartTracking)
    }

    /// Stop location tracking. No effect if already stopped.
    pub fn stop_tracking(&self) -> Result<(), SessionError> {
        self.send(Command::StopTracking)
    }

    /// Register a callback for fix coordinates.
    ///
    /// Handlers accumulate; registering one never displaces another. The
    /// callback runs on the session task and must not block.
    pub async fn on_fix_update<F>(&self, handler: F) -> Result<FixHandlerId, SessionError>
    where
        F: Fn(Coordinate) + Send + Sync + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Command::OnFixUpdate {
            handler: Box::new(handler),
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Detach a callback registered with [`on_fix_update`](Self::on_fix_update).
    pub fn remove_fix_handler(&self, id: FixHandlerId) -> Result<(), SessionError> {
        self.send(Command::RemoveFixHandler(id))
    }

    /// Subscribe to fix coordinates.
    ///
    /// Slow receivers lag and skip ahead rather than slowing the session.
    pub fn subscribe_fixes(&self) -> broadcast::Receiver<Coordinate> {
        self.fixes_tx.subscribe()
    }

    // =========================================================================
    // Map commands
    // =========================================================================

    /// Set or clear the user location shown on the map.
    pub fn set_user_location(&self, coordinate: Option<Coordinate>) -> Result<(), SessionError> {
        self.send(Command::SetUserLocation(coordinate))
    }

    /// Set or clear the selected point.
    pub fn set_selected_point(&self, coordinate: Option<Coordinate>) -> Result<(), SessionError> {
        self.send(Command::SetSelectedPoint(coordinate))
    }

    /// Replace the camera.
    pub fn set_camera(&self, camera: CameraView) -> Result<(), SessionError> {
        self.send(Command::SetCamera(camera))
    }

    /// Make a coordinate the default location and look at it.
    pub fn set_default_location(&self, coordinate: Coordinate) -> Result<(), SessionError> {
        self.send(Command::SetDefaultLocation(coordinate))
    }

    /// Feed the current search field text.
    pub fn update_search_query(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(Command::UpdateSearchQuery(text.into()))
    }

    /// Choose a suggestion and move the map to it.
    pub fn select_suggestion(&self, suggestion: SearchSuggestion) -> Result<(), SessionError> {
        self.send(Command::SelectSuggestion(suggestion))
    }

    /// Forward-geocode free text and move the map to it.
    pub fn locate_address(&self, address: impl Into<String>) -> Result<(), SessionError> {
        self.send(Command::LocateAddress(address.into()))
    }

    /// Resolve the address of a point without selecting it.
    pub fn resolve_address_for_point(&self, coordinate: Coordinate) -> Result<(), SessionError> {
        self.send(Command::ResolveAddressForPoint(coordinate))
    }

    /// Select a tapped point and resolve its address.
    pub fn user_tap(&self, coordinate: Coordinate) -> Result<(), SessionError> {
        self.send(Command::UserTap(coordinate))
    }

    /// Hide the suggestion list.
    pub fn dismiss_suggestions(&self) -> Result<(), SessionError> {
        self.send(Command::DismissSuggestions)
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Wait until every command sent before this call has been applied.
    ///
    /// Lookups those commands started may still be in flight.
    pub async fn sync(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Sync(reply))?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Watch the map snapshot.
    pub fn map(&self) -> watch::Receiver<MapSnapshot> {
        self.map_rx.clone()
    }

    /// Watch the location snapshot.
    pub fn location(&self) -> watch::Receiver<LocationSnapshot> {
        self.location_rx.clone()
    }

    /// Latest published map snapshot.
    pub fn map_snapshot(&self) -> MapSnapshot {
        self.map_rx.borrow().clone()
    }

    /// Latest published location snapshot.
    pub fn location_snapshot(&self) -> LocationSnapshot {
        self.location_rx.borrow().clone()
    }

    /// Whether the session has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHandle")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}
