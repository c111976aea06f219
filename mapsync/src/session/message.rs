//! Messages carried by the session inbox.

use std::fmt;

use tokio::sync::oneshot;

use crate::coord::Coordinate;
use crate::error::MapError;
use crate::location::{FixHandler, FixHandlerId};
use crate::map::{CameraView, RequestTicket};
use crate::platform::{LocationEvent, Placemark, SearchSuggestion};

/// Everything the session task applies, in arrival order.
pub(crate) enum Message {
    Command(Command),
    Location(LocationEvent),
    Completed(Completion),
}

/// User-side commands sent through a [`MapHandle`](super::MapHandle).
pub(crate) enum Command {
    RequestPermission,
    StartTracking,
    StopTracking,
    OnFixUpdate {
        handler: FixHandler,
        reply: oneshot::Sender<FixHandlerId>,
    },
    RemoveFixHandler(FixHandlerId),
    SetUserLocation(Option<Coordinate>),
    SetSelectedPoint(Option<Coordinate>),
    SetCamera(CameraView),
    SetDefaultLocation(Coordinate),
    UpdateSearchQuery(String),
    SelectSuggestion(SearchSuggestion),
    LocateAddress(String),
    ResolveAddressForPoint(Coordinate),
    UserTap(Coordinate),
    DismissSuggestions,
    Sync(oneshot::Sender<()>),
}

/// A finished lookup, already mapped into the session's error taxonomy.
pub(crate) enum Completion {
    Suggestions {
        ticket: RequestTicket,
        result: Result<Vec<SearchSuggestion>, MapError>,
    },
    ForwardLookup {
        ticket: RequestTicket,
        label: String,
        result: Result<Coordinate, MapError>,
    },
    Placemark {
        ticket: RequestTicket,
        result: Result<Placemark, MapError>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::RequestPermission => "request_permission",
            Command::StartTracking => "start_tracking",
            Command::StopTracking => "stop_tracking",
            Command::OnFixUpdate { .. } => "on_fix_update",
            Command::RemoveFixHandler(_) => "remove_fix_handler",
            Command::SetUserLocation(_) => "set_user_location",
            Command::SetSelectedPoint(_) => "set_selected_point",
            Command::SetCamera(_) => "set_camera",
            Command::SetDefaultLocation(_) => "set_default_location",
            Command::UpdateSearchQuery(_) => "update_search_query",
            Command::SelectSuggestion(_) => "select_suggestion",
            Command::LocateAddress(_) => "locate_address",
            Command::ResolveAddressForPoint(_) => "resolve_address_for_point",
            Command::UserTap(_) => "user_tap",
            Command::DismissSuggestions => "dismiss_suggestions",
            Command::Sync(_) => "sync",
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Command(command) => write!(f, "Command({})", command.name()),
            Message::Location(event) => write!(f, "Location({:?})", event),
            Message::Completed(completion) => {
                let ticket = match completion {
                    Completion::Suggestions { ticket, .. }
                    | Completion::ForwardLookup { ticket, .. }
                    | Completion::Placemark { ticket, .. } => ticket,
                };
                write!(f, "Completed({})", ticket)
            }
        }
    }
}
