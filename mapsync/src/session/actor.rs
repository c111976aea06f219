//! The session task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::handle::MapHandle;
use super::message::{Command, Completion, Message};
use super::SessionConfig;
use crate::coord::Coordinate;
use crate::error::MapError;
use crate::location::{LocationSnapshot, LocationState};
use crate::map::{MapSnapshot, MapState, QueryOutcome, RequestTicket};
use crate::platform::{
    Geocoder, LocationEvent, LocationEvents, LocationService, SearchService, SearchSuggestion,
};

/// Single writer of one map screen's location and map state.
///
/// Owns [`LocationState`] and [`MapState`] and applies every message from
/// its inbox in arrival order. Lookups run on spawned tasks and report back
/// through the same inbox, so state is only ever touched by [`run`](Self::run).
pub struct MapSession {
    location: LocationState,
    map: MapState,
    search: Arc<dyn SearchService>,
    geocoder: Arc<dyn Geocoder>,
    inbox: mpsc::UnboundedReceiver<Message>,
    /// Weak so that in-flight lookups and platform callbacks never keep the
    /// session alive after every handle is gone.
    loopback: mpsc::WeakUnboundedSender<Message>,
    map_tx: watch::Sender<MapSnapshot>,
    location_tx: watch::Sender<LocationSnapshot>,
}

impl MapSession {
    /// Creates a session and the first handle to it.
    ///
    /// Attaches an event sink to `location_service` right away; events it
    /// delivers before [`run`](Self::run) starts are queued.
    pub fn new(
        config: SessionConfig,
        location_service: Arc<dyn LocationService>,
        search: Arc<dyn SearchService>,
        geocoder: Arc<dyn Geocoder>,
    ) -> (Self, MapHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let loopback = tx.downgrade();

        let events_tx = loopback.clone();
        location_service.attach(LocationEvents::from_fn(move |event| {
            events_tx
                .upgrade()
                .is_some_and(|tx| tx.send(Message::Location(event)).is_ok())
        }));

        let location = LocationState::new(location_service, config.fix_channel_capacity);
        let map = MapState::with_camera_distance(config.default_location, config.camera_distance_m);

        let (map_tx, map_rx) = watch::channel(map.snapshot());
        let (location_tx, location_rx) = watch::channel(location.snapshot());
        let handle = MapHandle::new(tx, map_rx, location_rx, location.fix_sender());

        let session = Self {
            location,
            map,
            search,
            geocoder,
            inbox,
            loopback,
            map_tx,
            location_tx,
        };

        (session, handle)
    }

    /// Runs the session until shutdown is signalled or every handle is dropped.
    ///
    /// Releases the location subscription before returning.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            lat = self.map.default_location().latitude,
            lon = self.map.default_location().longitude,
            "Map session starting"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Map session shutting down");
                    break;
                }

                message = self.inbox.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        info!("All map handles dropped");
                        break;
                    }
                }
            }
        }

        self.location.release();
        self.publish();
        info!("Map session stopped");
    }

    fn handle(&mut self, message: Message) {
        debug!(message = ?message, "Applying message");
        match message {
            Message::Command(command) => self.handle_command(command),
            Message::Location(event) => self.handle_location_event(event),
            Message::Completed(completion) => self.handle_completion(completion),
        }
        self.publish();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::RequestPermission => self.location.request_permission(),
            Command::StartTracking => {
                self.location.start_tracking();
            }
            Command::StopTracking => {
                self.location.stop_tracking();
            }
            Command::OnFixUpdate { handler, reply } => {
                let id = self.location.on_fix_update(handler);
                // Caller may have stopped waiting; the handler stays registered.
                let _ = reply.send(id);
            }
            Command::RemoveFixHandler(id) => {
                self.location.remove_fix_handler(id);
            }
            Command::SetUserLocation(coordinate) => self.map.set_user_location(coordinate),
            Command::SetSelectedPoint(coordinate) => self.map.set_selected_point(coordinate),
            Command::SetCamera(camera) => self.map.set_camera(camera),
            Command::SetDefaultLocation(coordinate) => self.map.set_default_location(coordinate),
            Command::UpdateSearchQuery(text) => match self.map.update_search_query(&text) {
                QueryOutcome::Dispatch(ticket) => self.spawn_autocomplete(ticket, text),
                QueryOutcome::Cleared | QueryOutcome::Unchanged => {}
            },
            Command::SelectSuggestion(suggestion) => {
                let ticket = self.map.select_suggestion(&suggestion);
                self.spawn_suggestion_lookup(ticket, suggestion);
            }
            Command::LocateAddress(text) => {
                if let Some(ticket) = self.map.locate_address(&text) {
                    self.spawn_forward_geocode(ticket, text);
                }
            }
            Command::ResolveAddressForPoint(coordinate) => {
                let ticket = self.map.resolve_address_for_point(coordinate);
                self.spawn_reverse_geocode(ticket, coordinate);
            }
            Command::UserTap(coordinate) => {
                let ticket = self.map.user_tap(coordinate);
                self.spawn_reverse_geocode(ticket, coordinate);
            }
            Command::DismissSuggestions => self.map.dismiss_suggestions(),
            Command::Sync(reply) => {
                // Everything queued earlier has been applied and published.
                let _ = reply.send(());
            }
        }
    }

    fn handle_location_event(&mut self, event: LocationEvent) {
        match event {
            LocationEvent::AuthorizationChanged(status) => {
                self.location.handle_authorization_change(status)
            }
            LocationEvent::FixesDelivered(fixes) => {
                if let Some(coordinate) = self.location.handle_fixes(fixes) {
                    self.map.set_user_location(Some(coordinate));
                }
            }
            LocationEvent::Failed(error) => self.location.handle_failure(error),
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Suggestions { ticket, result } => {
                self.map.apply_suggestions(ticket, result);
            }
            Completion::ForwardLookup {
                ticket,
                label,
                result,
            } => {
                self.map.apply_forward_lookup(ticket, &label, result);
            }
            Completion::Placemark { ticket, result } => {
                self.map.apply_placemark(ticket, result);
            }
        }
    }

    /// Publishes snapshots that changed since the last message.
    fn publish(&self) {
        let map = self.map.snapshot();
        self.map_tx.send_if_modified(|current| {
            if *current == map {
                return false;
            }
            *current = map;
            true
        });

        let location = self.location.snapshot();
        self.location_tx.send_if_modified(|current| {
            if *current == location {
                return false;
            }
            *current = location;
            true
        });
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn spawn_autocomplete(&self, ticket: RequestTicket, fragment: String) {
        let search = Arc::clone(&self.search);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let result = search
                .autocomplete(fragment)
                .await
                .map_err(|e| MapError::SearchFailed(e.to_string()));
            deliver(&loopback, Completion::Suggestions { ticket, result });
        });
    }

    fn spawn_suggestion_lookup(&self, ticket: RequestTicket, suggestion: SearchSuggestion) {
        let search = Arc::clone(&self.search);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let label = suggestion.title.clone();
            let result = match search.lookup(suggestion).await {
                Ok(Some(coordinate)) => Ok(coordinate),
                Ok(None) => Err(MapError::SearchFailed(format!("No result for '{}'", label))),
                Err(e) => Err(MapError::SearchFailed(e.to_string())),
            };
            deliver(
                &loopback,
                Completion::ForwardLookup {
                    ticket,
                    label,
                    result,
                },
            );
        });
    }

    fn spawn_forward_geocode(&self, ticket: RequestTicket, address: String) {
        let geocoder = Arc::clone(&self.geocoder);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let label = address.clone();
            let result = match geocoder.forward_geocode(address).await {
                Ok(Some(coordinate)) => Ok(coordinate),
                Ok(None) => Err(MapError::GeocodeFailed(format!("No match for '{}'", label))),
                Err(e) => Err(MapError::GeocodeFailed(e.to_string())),
            };
            deliver(
                &loopback,
                Completion::ForwardLookup {
                    ticket,
                    label,
                    result,
                },
            );
        });
    }

    fn spawn_reverse_geocode(&self, ticket: RequestTicket, coordinate: Coordinate) {
        let geocoder = Arc::clone(&self.geocoder);
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let result = match geocoder.reverse_geocode(coordinate).await {
                Ok(Some(placemark)) => Ok(placemark),
                Ok(None) => Err(MapError::GeocodeFailed(format!(
                    "No placemark at {}",
                    coordinate
                ))),
                Err(e) => Err(MapError::GeocodeFailed(e.to_string())),
            };
            deliver(&loopback, Completion::Placemark { ticket, result });
        });
    }
}

/// Hands a finished lookup back to the session, if it still exists.
fn deliver(loopback: &mpsc::WeakUnboundedSender<Message>, completion: Completion) {
    let delivered = loopback
        .upgrade()
        .is_some_and(|tx| tx.send(Message::Completed(completion)).is_ok());
    if !delivered {
        debug!("Lookup finished after session teardown");
    }
}
