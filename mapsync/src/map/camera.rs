//! Map camera descriptor.

use serde::Serialize;

use crate::coord::Coordinate;

/// Default distance for fixed cameras produced by the map state (meters).
pub const DEFAULT_CAMERA_DISTANCE_M: f64 = 1000.0;

/// What the map is looking at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CameraView {
    /// Follow the device; use `fallback` until a user location is known.
    FollowUser {
        /// Camera used while no user location exists.
        fallback: Box<CameraView>,
    },
    /// Look at a fixed point from a fixed distance.
    Fixed {
        /// Center of the view.
        center: Coordinate,
        /// Camera distance in meters.
        distance_m: f64,
    },
}

impl CameraView {
    /// A fixed camera.
    pub fn fixed(center: Coordinate, distance_m: f64) -> Self {
        CameraView::Fixed { center, distance_m }
    }

    /// A follow-user camera with the given fallback.
    pub fn follow_user(fallback: CameraView) -> Self {
        CameraView::FollowUser {
            fallback: Box::new(fallback),
        }
    }

    /// Whether this camera follows the user.
    pub fn is_following_user(&self) -> bool {
        matches!(self, CameraView::FollowUser { .. })
    }

    /// Effective center given the current user location.
    pub fn center(&self, user_location: Option<Coordinate>) -> Coordinate {
        match self {
            CameraView::Fixed { center, .. } => *center,
            CameraView::FollowUser { fallback } => {
                user_location.unwrap_or_else(|| fallback.center(None))
            }
        }
    }

    /// Effective camera distance in meters.
    ///
    /// A follow-user camera keeps the distance of its fallback.
    pub fn distance_m(&self) -> f64 {
        match self {
            CameraView::Fixed { distance_m, .. } => *distance_m,
            CameraView::FollowUser { fallback } => fallback.distance_m(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_center_ignores_user() {
        let camera = CameraView::fixed(Coordinate::new(1.0, 2.0), 500.0);
        assert_eq!(
            camera.center(Some(Coordinate::new(9.0, 9.0))),
            Coordinate::new(1.0, 2.0)
        );
        assert_eq!(camera.distance_m(), 500.0);
    }

    #[test]
    fn test_follow_user_prefers_user_location() {
        let camera = CameraView::follow_user(CameraView::fixed(Coordinate::new(1.0, 2.0), 1000.0));
        assert_eq!(
            camera.center(Some(Coordinate::new(9.0, 9.0))),
            Coordinate::new(9.0, 9.0)
        );
    }

    #[test]
    fn test_follow_user_falls_back() {
        let camera = CameraView::follow_user(CameraView::fixed(Coordinate::new(1.0, 2.0), 750.0));
        assert_eq!(camera.center(None), Coordinate::new(1.0, 2.0));
        assert_eq!(camera.distance_m(), 750.0);
        assert!(camera.is_following_user());
    }
}
