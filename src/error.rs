//! Error types for route playback setup.
//!
//! Only construction is fallible. Once a [`RoutePlayer`](crate::RoutePlayer) exists,
//! every control operation is total and inapplicable requests are no-ops.

/// Convenience result type used across the crate.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors reported while building a playback session.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The route polyline has no coordinates.
    #[error("route geometry is empty")]
    EmptyRoute,

    /// A route coordinate is NaN, infinite, or outside WGS84 ranges.
    #[error("invalid route coordinate at index {index}: ({latitude}, {longitude})")]
    InvalidCoordinate {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    /// The animation duration is not a finite, non-negative number of milliseconds.
    #[error("invalid duration: {0}ms")]
    InvalidDuration(f64),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Build a [`PlaybackError::InvalidConfig`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(PlaybackError::EmptyRoute.to_string(), "route geometry is empty");
        assert_eq!(
            PlaybackError::config("sample_count must be > 0").to_string(),
            "invalid configuration: sample_count must be > 0"
        );
        let err = PlaybackError::InvalidCoordinate { index: 3, latitude: 91.0, longitude: 0.0 };
        assert!(err.to_string().contains("index 3"));
    }
}
