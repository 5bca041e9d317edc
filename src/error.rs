use thiserror::Error;

use crate::map::EntityId;

/// Terminal failure causes carried by `Phase::Failed`.
///
/// Running out of budget is not represented here: it is an ordinary
/// suspension, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("station {station} has no resolvable grid")]
    MissingGrid { station: EntityId },

    #[error("unknown tile kind: {0}")]
    UnknownTileKind(String),

    #[error("job was cancelled")]
    Cancelled,

    #[error("map registry error: {0}")]
    Registry(String),
}

/// Host-level errors (configuration, I/O) outside of job execution.
#[derive(Debug, Error)]
pub enum ShadowmapError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_error_display() {
        let err = JobError::MissingGrid {
            station: EntityId(7),
        };
        assert_eq!(err.to_string(), "station e7 has no resolvable grid");
        assert_eq!(
            JobError::UnknownTileKind("FloorLava".into()).to_string(),
            "unknown tile kind: FloorLava"
        );
        assert_eq!(JobError::Cancelled.to_string(), "job was cancelled");
    }

    #[test]
    fn host_errors_convert_from_sources() {
        let json = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = ShadowmapError::from(json);
        assert!(matches!(err, ShadowmapError::Json(_)));

        let parse = toml::from_str::<toml::Table>("= broken").unwrap_err();
        let err = ShadowmapError::from(parse);
        assert!(err.to_string().starts_with("TOML parse error"));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JobError>();
        assert_send_sync::<ShadowmapError>();
    }
}
