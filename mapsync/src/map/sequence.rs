//! Latest-wins request sequencing.
//!
//! Every asynchronous lookup is tagged with a [`RequestTicket`] when it is
//! issued. When the reply comes back it is applied only if its ticket is
//! still the latest one issued for that kind; anything older is stale and
//! discarded. Kinds are independent of each other.

use std::fmt;

/// Independent kinds of asynchronous lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Autocomplete for the current query text.
    Autocomplete,
    /// Forward lookup: suggestion selection or free-text address.
    ForwardLookup,
    /// Reverse geocoding of a point.
    ReverseGeocode,
}

impl RequestKind {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            RequestKind::Autocomplete => 0,
            RequestKind::ForwardLookup => 1,
            RequestKind::ReverseGeocode => 2,
        }
    }

    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Autocomplete => "autocomplete",
            RequestKind::ForwardLookup => "forward_lookup",
            RequestKind::ReverseGeocode => "reverse_geocode",
        }
    }
}

/// Tag correlating a reply with the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    kind: RequestKind,
    seq: u64,
}

impl RequestTicket {
    /// Kind of request this ticket belongs to.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Sequence number within its kind (starts at 1).
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.as_str(), self.seq)
    }
}

/// Issues tickets and decides which replies are still current.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: [u64; RequestKind::COUNT],
    in_flight: [bool; RequestKind::COUNT],
}

impl RequestSequencer {
    /// Create a sequencer with nothing issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier ticket of the same kind.
    pub fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        let i = kind.index();
        self.latest[i] += 1;
        self.in_flight[i] = true;
        RequestTicket {
            kind,
            seq: self.latest[i],
        }
    }

    /// Supersede every outstanding ticket of a kind without issuing a new one.
    pub fn invalidate(&mut self, kind: RequestKind) {
        let i = kind.index();
        self.latest[i] += 1;
        self.in_flight[i] = false;
    }

    /// Whether the ticket is still the latest of its kind.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest[ticket.kind.index()] == ticket.seq
    }

    /// Mark a reply as received.
    ///
    /// Returns `true` if the reply should be applied. A ticket settles at
    /// most once; a second reply for the same ticket is treated as stale.
    pub fn settle(&mut self, ticket: RequestTicket) -> bool {
        let i = ticket.kind.index();
        if !self.is_current(ticket) || !self.in_flight[i] {
            return false;
        }
        self.in_flight[i] = false;
        true
    }

    /// Whether the latest request of a kind is still awaiting its reply.
    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.in_flight[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_settles() {
        let mut seq = RequestSequencer::new();
        let ticket = seq.issue(RequestKind::Autocomplete);
        assert!(seq.is_pending(RequestKind::Autocomplete));
        assert!(seq.settle(ticket));
        assert!(!seq.is_pending(RequestKind::Autocomplete));
    }

    #[test]
    fn test_older_ticket_is_stale() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue(RequestKind::Autocomplete);
        let second = seq.issue(RequestKind::Autocomplete);

        assert!(!seq.settle(first));
        assert!(seq.settle(second));
    }

    #[test]
    fn test_stale_reply_after_newer_settled() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue(RequestKind::ReverseGeocode);
        let second = seq.issue(RequestKind::ReverseGeocode);

        assert!(seq.settle(second));
        assert!(!seq.settle(first));
    }

    #[test]
    fn test_ticket_settles_once() {
        let mut seq = RequestSequencer::new();
        let ticket = seq.issue(RequestKind::ForwardLookup);
        assert!(seq.settle(ticket));
        assert!(!seq.settle(ticket));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut seq = RequestSequencer::new();
        let search = seq.issue(RequestKind::Autocomplete);
        let reverse = seq.issue(RequestKind::ReverseGeocode);
        let _newer_reverse = seq.issue(RequestKind::ReverseGeocode);

        assert!(seq.settle(search));
        assert!(!seq.settle(reverse));
    }

    #[test]
    fn test_invalidate_supersedes_outstanding() {
        let mut seq = RequestSequencer::new();
        let ticket = seq.issue(RequestKind::Autocomplete);
        seq.invalidate(RequestKind::Autocomplete);

        assert!(!seq.is_pending(RequestKind::Autocomplete));
        assert!(!seq.settle(ticket));
    }

    #[test]
    fn test_display() {
        let mut seq = RequestSequencer::new();
        let ticket = seq.issue(RequestKind::ReverseGeocode);
        assert_eq!(ticket.to_string(), "reverse_geocode#1");
    }
}
