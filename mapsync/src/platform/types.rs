//! Value types exchanged with platform services.

use serde::Serialize;
use thiserror::Error;

/// Location authorization as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    #[default]
    NotDetermined,
    /// Access is blocked by device policy.
    Restricted,
    /// The user refused access.
    Denied,
    /// Access granted while the app is in use.
    AuthorizedLimited,
    /// Access granted at all times.
    AuthorizedFull,
}

impl AuthorizationStatus {
    /// Whether this status allows fixes to be delivered.
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedLimited | AuthorizationStatus::AuthorizedFull
        )
    }

    /// Whether this status is an explicit refusal.
    pub fn is_refused(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Restricted | AuthorizationStatus::Denied
        )
    }

    /// Short label for status displays.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "not determined",
            AuthorizationStatus::Restricted => "restricted",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::AuthorizedLimited => "when in use",
            AuthorizationStatus::AuthorizedFull => "always",
        }
    }
}

/// An autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchSuggestion {
    /// Primary line, e.g. a street address or place name.
    pub title: String,
    /// Secondary line, e.g. the city and country.
    pub subtitle: String,
}

impl SearchSuggestion {
    /// Create a new suggestion.
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }
}

/// Best-effort reverse geocoding result. Any field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Placemark {
    /// Place or street name.
    pub name: Option<String>,
    /// City or town.
    pub locality: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

impl Placemark {
    /// Create a placemark with all three components.
    pub fn new(
        name: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            locality: Some(locality.into()),
            country: Some(country.into()),
        }
    }

    /// Format as `"{name}, {locality}, {country}"`.
    ///
    /// Missing components become empty strings; the separators are always
    /// present, so a placemark with nothing in it formats as `", , "`.
    pub fn formatted_address(&self) -> String {
        format!(
            "{}, {}, {}",
            self.name.as_deref().unwrap_or_default(),
            self.locality.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or_default()
        )
    }
}

/// Failure reported by a platform service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The service refused because access was denied.
    #[error("Access denied")]
    Denied,

    /// The service cannot currently answer (no network, no signal).
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The request itself failed.
    #[error("Request failed: {0}")]
    Failed(String),
}
