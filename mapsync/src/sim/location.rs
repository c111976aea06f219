//! Simulated device location.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{offset_meters, Coordinate, LocationFix};
use crate::platform::{AuthorizationStatus, LocationEvents, LocationService, PlatformError};

/// Default time between simulated fixes.
pub const DEFAULT_FIX_INTERVAL: Duration = Duration::from_secs(1);

/// Reported accuracy of simulated fixes (meters).
pub const SIMULATED_ACCURACY_M: f64 = 5.0;

#[derive(Default)]
struct Inner {
    events: Option<LocationEvents>,
    walker: Option<CancellationToken>,
}

/// Location service that walks a fixed route.
///
/// `request_authorization` answers at once with the configured status.
/// While started, a background task reports one fix per interval, cycling
/// through the route. Must be started from within a tokio runtime.
pub struct SimulatedLocationService {
    route: Arc<Vec<Coordinate>>,
    interval: Duration,
    grant: AuthorizationStatus,
    position: Arc<AtomicUsize>,
    inner: Mutex<Inner>,
}

impl SimulatedLocationService {
    /// Create a service walking `route`. Authorization is granted by default.
    pub fn new(route: Vec<Coordinate>) -> Self {
        Self {
            route: Arc::new(route),
            interval: DEFAULT_FIX_INTERVAL,
            grant: AuthorizationStatus::AuthorizedLimited,
            position: Arc::new(AtomicUsize::new(0)),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Set the time between fixes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the status reported when authorization is requested.
    pub fn with_authorization(mut self, status: AuthorizationStatus) -> Self {
        self.grant = status;
        self
    }

    /// Whether the walker task is running.
    pub fn is_running(&self) -> bool {
        self.inner.lock().walker.is_some()
    }

    /// Report an authorization change as if the user edited system settings.
    pub fn change_authorization(&self, status: AuthorizationStatus) {
        if let Some(events) = self.events() {
            events.authorization_changed(status);
        }
    }

    /// Report a service failure.
    pub fn inject_failure(&self, error: PlatformError) {
        if let Some(events) = self.events() {
            events.failed(error);
        }
    }

    fn events(&self) -> Option<LocationEvents> {
        let events = self.inner.lock().events.clone();
        if events.is_none() {
            warn!("Simulated location service used before attach");
        }
        events
    }
}

impl LocationService for SimulatedLocationService {
    fn attach(&self, events: LocationEvents) {
        self.inner.lock().events = Some(events);
    }

    fn request_authorization(&self) {
        debug!(status = ?self.grant, "Simulated authorization answer");
        self.change_authorization(self.grant);
    }

    fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.walker.is_some() {
            return;
        }
        let Some(events) = inner.events.clone() else {
            warn!("Simulated location service started before attach");
            return;
        };
        if self.route.is_empty() {
            warn!("Simulated route is empty, no fixes will be delivered");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Simulated location service started outside a tokio runtime");
            return;
        };

        let cancel = CancellationToken::new();
        runtime.spawn(walk(
            events,
            Arc::clone(&self.route),
            Arc::clone(&self.position),
            self.interval,
            cancel.clone(),
        ));
        inner.walker = Some(cancel);
        info!(
            points = self.route.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Simulated walk started"
        );
    }

    fn stop(&self) {
        if let Some(cancel) = self.inner.lock().walker.take() {
            cancel.cancel();
            info!("Simulated walk stopped");
        }
    }
}

impl Drop for SimulatedLocationService {
    fn drop(&mut self) {
        if let Some(cancel) = self.inner.get_mut().walker.take() {
            cancel.cancel();
        }
    }
}

async fn walk(
    events: LocationEvents,
    route: Arc<Vec<Coordinate>>,
    position: Arc<AtomicUsize>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                let index = position.fetch_add(1, Ordering::Relaxed) % route.len();
                let fix = LocationFix::new(route[index], SIMULATED_ACCURACY_M);
                if !events.fixes_delivered(vec![fix]) {
                    break;
                }
            }
        }
    }
}

/// A closed loop of `points` coordinates on a circle around `center`.
pub fn circle_route(center: Coordinate, radius_m: f64, points: usize) -> Vec<Coordinate> {
    let points = points.max(1);
    (0..points)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / points as f64;
            offset_meters(&center, radius_m * angle.cos(), radius_m * angle.sin())
        })
        .collect()
}
