//! Device location state.
//!
//! [`LocationState`] wraps a platform [`LocationService`](crate::platform::LocationService)
//! and keeps the authorization status, tracking flag, last fix and last error.
//!
//! # Authorization State Machine
//!
//! ```text
//! notDetermined ─┐
//! restricted ────┼──► (any edge, platform driven)
//! denied ────────┤
//! authorizedLimited ─┐
//! authorizedFull ────┴──► tracking on
//! everything else ───────► tracking off
//! ```
//!
//! Edges are driven only by the platform; the state reacts to the target
//! status. Entering `denied` or `restricted` also records
//! [`MapError::PermissionDenied`](crate::MapError::PermissionDenied).
//!
//! # Fix Fan-out
//!
//! Fix coordinates go to every registered handler and to a broadcast
//! channel, so several consumers can follow the device without displacing
//! each other.

mod state;

pub use crate::platform::AuthorizationStatus;
pub use state::{FixHandler, FixHandlerId, LocationSnapshot, LocationState};

/// Default capacity of the fix broadcast channel.
pub const DEFAULT_FIX_CHANNEL_CAPACITY: usize = 64;
