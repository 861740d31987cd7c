use thiserror::Error;

/// Error types for the elefan-rs library.
#[derive(Error, Debug)]
pub enum ElefanError {
    /// Malformed length-frequency data (dimensions, ordering, counts).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Length classes are not evenly spaced.
    #[error("Invalid bin size: width {width} at class {index} differs from {expected}")]
    InvalidBinSize {
        index: usize,
        width: f64,
        expected: f64,
    },

    /// A sampling date carries no catch at all.
    #[error("Degenerate column: sampling date {column} has zero total catch")]
    DegenerateColumn { column: usize },

    /// The restructured data has no positive peaks, so no score can be formed.
    #[error("Degenerate surface: available sum of peaks is zero")]
    DegenerateSurface,

    /// Search bounds are inconsistent.
    #[error("Bounds violation: {0}")]
    BoundsViolation(String),

    /// Error for invalid parameter values.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<crate::parameters::bounds::BoundsError> for ElefanError {
    fn from(err: crate::parameters::bounds::BoundsError) -> Self {
        ElefanError::BoundsViolation(format!("{}", err))
    }
}

/// Result type alias for elefan-rs operations.
pub type Result<T> = std::result::Result<T, ElefanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ElefanError::InvalidBinSize {
            index: 3,
            width: 2.0,
            expected: 1.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("class 3"));
        assert!(msg.contains("differs from 1"));

        let err = ElefanError::DegenerateColumn { column: 7 };
        assert!(format!("{}", err).contains("sampling date 7"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ElefanError = io_err.into();

        match err {
            ElefanError::IoError(_) => (),
            _ => panic!("Expected IoError variant"),
        }

        let bounds_err = crate::parameters::bounds::BoundsError::InvalidBounds {
            min: 2.0,
            max: 1.0,
        };
        match ElefanError::from(bounds_err) {
            ElefanError::BoundsViolation(msg) => assert!(msg.contains("min (2)")),
            _ => panic!("Expected BoundsViolation variant"),
        }
    }
}
