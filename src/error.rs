use thiserror::Error;

/// Everything that can go wrong while post-processing a job.
///
/// Data problems local to one operation (a side the format cannot address,
/// a missing geometry list, a trajectory that does not belong to its
/// operation) are recoverable: the drivers log them, skip the unit and keep
/// going. A geometry used as something it is not aborts the run.
#[derive(Error, Debug)]
pub enum PostError {
    #[error("side '{side}' is not supported by the {post} postprocessor")]
    UnsupportedSide { side: String, post: String },

    #[error("operation '{operation}' refers to unknown side '{side}'")]
    MissingSide { operation: String, side: String },

    #[error("missing geometry: {0}")]
    MissingGeometry(String),

    #[error("trajectory {trajectory} does not belong to operation {operation}")]
    TrajectoryMismatch { operation: String, trajectory: String },

    #[error("invalid geometry: expected {expected}, got {got}")]
    InvalidGeometry { expected: String, got: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not parse job: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PostError {
    /// Whether a driver may skip the offending unit and continue the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PostError::UnsupportedSide { .. }
                | PostError::MissingSide { .. }
                | PostError::MissingGeometry(_)
                | PostError::TrajectoryMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(PostError::MissingGeometry("lead-in".into()).is_recoverable());
        assert!(PostError::UnsupportedSide {
            side: "Front".into(),
            post: "G-code Mach3".into()
        }
        .is_recoverable());
        assert!(!PostError::InvalidGeometry {
            expected: "Arc".into(),
            got: "Segment".into()
        }
        .is_recoverable());
        assert!(!PostError::Config("spacer".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = PostError::MissingSide {
            operation: "Drill 1".into(),
            side: "Left".into(),
        };
        assert_eq!(err.to_string(), "operation 'Drill 1' refers to unknown side 'Left'");
    }
}
