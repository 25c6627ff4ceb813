//! Device geolocation modeled as a single asynchronous call with a tagged
//! result, instead of the browser's nested success/error callbacks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A device position in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// The distinct ways a position request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("position request timed out")]
    Timeout,
}

/// One async "where is the device" call. Implementations wrap whatever
/// platform capability is available; tests use a fixed position.
pub trait LocationSource {
    fn current_position(
        &self,
    ) -> impl std::future::Future<Output = Result<Position, GeolocationError>> + Send;
}

/// A source that always reports the same position. Useful in tests and as
/// a fallback when no device capability exists.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Position);

impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeniedLocation;

    impl LocationSource for DeniedLocation {
        async fn current_position(&self) -> Result<Position, GeolocationError> {
            Err(GeolocationError::PermissionDenied)
        }
    }

    #[tokio::test]
    async fn fixed_source_reports_its_position() {
        let source = FixedLocation(Position {
            latitude: 37.4979,
            longitude: 127.0276,
        });
        let position = source.current_position().await.expect("position");
        assert!((position.latitude - 37.4979).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn failure_reasons_are_distinguishable() {
        let err = DeniedLocation.current_position().await.unwrap_err();
        assert_eq!(err, GeolocationError::PermissionDenied);
        assert_ne!(err, GeolocationError::Timeout);
    }
}
