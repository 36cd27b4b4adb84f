use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Site registry unavailable at '{path}': {reason}")]
    RegistryUnavailable { path: String, reason: String },

    #[error("Scoring model unavailable at '{path}': {reason}")]
    ModelUnavailable { path: String, reason: String },

    #[error("Service not ready: {message}")]
    ServiceUnready { message: String },

    #[error("No suitable sites found")]
    NoMatchingSites,

    #[error("Prediction degraded: {reason}")]
    PredictionDegraded { reason: String },

    #[error("Job not found")]
    JobNotFound,

    #[error("Persistence failure: {message}")]
    PersistenceFailure { message: String },

    #[error("Invalid requirements: field '{field}' {reason}")]
    InvalidRequirements { field: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Model,
    Request,
    Persistence,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SiteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SiteError::RegistryUnavailable { .. } => ErrorCategory::Data,
            SiteError::ModelUnavailable { .. } | SiteError::PredictionDegraded { .. } => {
                ErrorCategory::Model
            }
            SiteError::ServiceUnready { .. } | SiteError::IoError(_) => ErrorCategory::System,
            SiteError::NoMatchingSites
            | SiteError::JobNotFound
            | SiteError::InvalidRequirements { .. } => ErrorCategory::Request,
            SiteError::PersistenceFailure { .. } | SiteError::SerializationError(_) => {
                ErrorCategory::Persistence
            }
            SiteError::ConfigValidationError { .. } | SiteError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SiteError::NoMatchingSites | SiteError::PredictionDegraded { .. } => ErrorSeverity::Low,
            SiteError::PersistenceFailure { .. } => ErrorSeverity::Medium,
            SiteError::JobNotFound
            | SiteError::InvalidRequirements { .. }
            | SiteError::SerializationError(_) => ErrorSeverity::High,
            SiteError::RegistryUnavailable { .. }
            | SiteError::ModelUnavailable { .. }
            | SiteError::ServiceUnready { .. }
            | SiteError::IoError(_)
            | SiteError::ConfigValidationError { .. }
            | SiteError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Stable machine-readable code. "no matches" and "not ready" never share a code.
    pub fn error_code(&self) -> &'static str {
        match self {
            SiteError::RegistryUnavailable { .. } => "registry_unavailable",
            SiteError::ModelUnavailable { .. } => "model_unavailable",
            SiteError::ServiceUnready { .. } => "service_unready",
            SiteError::NoMatchingSites => "no_matching_sites",
            SiteError::PredictionDegraded { .. } => "prediction_degraded",
            SiteError::JobNotFound => "job_not_found",
            SiteError::PersistenceFailure { .. } => "persistence_failure",
            SiteError::InvalidRequirements { .. } => "invalid_requirements",
            SiteError::IoError(_) => "io_error",
            SiteError::SerializationError(_) => "serialization_error",
            SiteError::ConfigValidationError { .. } | SiteError::InvalidConfigValueError { .. } => {
                "config_error"
            }
        }
    }

    /// Whether the failure is an operational fault worth an `error!` log line.
    pub fn is_operational(&self) -> bool {
        !matches!(
            self,
            SiteError::NoMatchingSites
                | SiteError::JobNotFound
                | SiteError::InvalidRequirements { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SiteError::RegistryUnavailable { .. } | SiteError::ModelUnavailable { .. } => {
                "Site data or scoring model could not be loaded".to_string()
            }
            SiteError::ServiceUnready { .. } => {
                "The recommendation service is not ready".to_string()
            }
            SiteError::NoMatchingSites => "No suitable sites found".to_string(),
            SiteError::PredictionDegraded { .. } => {
                "Scoring model failed; baseline scores were rejected by policy".to_string()
            }
            SiteError::JobNotFound => "Job not found".to_string(),
            SiteError::PersistenceFailure { .. } => "Job history could not be accessed".to_string(),
            SiteError::InvalidRequirements { field, reason } => {
                format!("Invalid project requirements: {} {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Request => match self {
                SiteError::NoMatchingSites => {
                    "Broaden the constraints: raise the budget, road distance or slope limits, or add land uses"
                }
                SiteError::JobNotFound => "Check the job id against your history",
                _ => "Fix the request fields and try again",
            },
            ErrorCategory::Data => "Check that the registry CSV exists and is well formed",
            ErrorCategory::Model => "Check the model file and that its feature schema matches the registry",
            ErrorCategory::System => "Contact an operator; the registry or model must be loaded before serving",
            ErrorCategory::Persistence => "Check that the ledger path is writable",
            ErrorCategory::Configuration => "Review the TOML configuration file",
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
