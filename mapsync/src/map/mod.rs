//! Map screen state.
//!
//! [`MapState`] owns the camera, the selected point, the suggestion list and
//! the address text of one map screen. It is the only place where location
//! pushes, user commands and lookup replies meet.
//!
//! # Address Text
//!
//! The address text is shared between the search field and the resolved
//! address display. It is query-authoritative while the user types and
//! display-authoritative after a suggestion is chosen or a point resolves.
//! Feeding the displayed text back as a query is recognised as an echo and
//! does not trigger autocomplete.
//!
//! # Reply Ordering
//!
//! Every lookup is tagged with a [`RequestTicket`]. A reply is applied only
//! if its ticket is still the latest of its [`RequestKind`]; kinds do not
//! affect each other.

mod address;
mod camera;
mod sequence;
mod state;

pub use address::{AddressMode, AddressText};
pub use camera::{CameraView, DEFAULT_CAMERA_DISTANCE_M};
pub use sequence::{RequestKind, RequestSequencer, RequestTicket};
pub use state::{MapSnapshot, MapState, QueryOutcome};
