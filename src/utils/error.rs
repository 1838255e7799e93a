use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Feed request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed feature at index {index}: {reason}")]
    MalformedFeature { index: usize, reason: String },

    #[error("Malformed {feed} feed: {reason}")]
    MalformedFeed { feed: String, reason: String },

    #[error("{feed} feed unavailable: {reason}")]
    FeedUnavailable { feed: String, reason: String },

    #[error("No feed delivered data; nothing to draw")]
    NoFeedData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::HttpError(_) | MapError::FeedUnavailable { .. } | MapError::NoFeedData => {
                ErrorCategory::Network
            }
            MapError::CsvError(_)
            | MapError::SerializationError(_)
            | MapError::MalformedFeature { .. }
            | MapError::MalformedFeed { .. } => ErrorCategory::Data,
            MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. }
            | MapError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MapError::ZipError(_) | MapError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // a single bad record only drops that marker
            MapError::MalformedFeature { .. } => ErrorSeverity::Low,
            MapError::HttpError(_)
            | MapError::FeedUnavailable { .. }
            | MapError::NoFeedData => ErrorSeverity::Medium,
            MapError::CsvError(_)
            | MapError::SerializationError(_)
            | MapError::MalformedFeed { .. }
            | MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. }
            | MapError::MissingConfigError { .. } => ErrorSeverity::High,
            MapError::ZipError(_) | MapError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MapError::HttpError(_) | MapError::FeedUnavailable { .. } => {
                "Check network connectivity and that the feed URL is reachable, then rerun"
                    .to_string()
            }
            MapError::NoFeedData => {
                "Both feeds failed; verify the [feeds] URLs and try again later".to_string()
            }
            MapError::MalformedFeature { .. } | MapError::MalformedFeed { .. } => {
                "The feed did not deliver GeoJSON in the expected shape; check the feed URL points at a FeatureCollection".to_string()
            }
            MapError::CsvError(_) | MapError::SerializationError(_) => {
                "Output serialization failed; rerun with --verbose for details".to_string()
            }
            MapError::ConfigValidationError { .. } | MapError::InvalidConfigValueError { .. } => {
                "Fix the offending value in the TOML config or command line flags".to_string()
            }
            MapError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
            MapError::ZipError(_) | MapError::IoError(_) => {
                "Check that the output path is writable and the disk is not full".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not download map data: {}", self),
            ErrorCategory::Data => format!("Feed data could not be used: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error while writing output: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
