//! Error types for livepub

use serde_json::Value;
use thiserror::Error;

/// Main error type for publisher session operations
#[derive(Error, Debug)]
pub enum PublishError {
    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// A configuration entry could not be read
    #[error("Could not read {key} from session storage: {reason}")]
    Configuration {
        /// Storage key of the entry
        key: String,
        /// Parse failure description
        reason: String,
    },

    /// A configuration layer did not serialize to a JSON object
    #[error("Invalid configuration layer: expected an object, got {found}")]
    InvalidLayer {
        /// JSON type the layer serialized to
        found: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// Local media could not be acquired
    #[error("Media access failed: {0}")]
    MediaAccess(#[from] DeviceError),

    /// Publisher initialization was rejected by the provider
    #[error("Publisher init failed: {0}")]
    Init(ProviderFault),

    /// Publish start was rejected by the provider
    #[error("Publish failed: {0}")]
    Publish(ProviderFault),

    /// Unpublish was rejected by the provider
    #[error("Unpublish failed: {0}")]
    Unpublish(ProviderFault),

    /// An operation needed a session handle and none is held
    #[error("No active publisher session")]
    NoActiveSession,

    /// Invalid state error
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// The device layer or session variant lacks a capability
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Missing capability
        feature: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for session operations
pub type PublishResult<T> = Result<T, PublishError>;

impl PublishError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PublishError::Initialization { .. } => "INITIALIZATION_FAILED",
            PublishError::Configuration { .. } => "CONFIGURATION_UNREADABLE",
            PublishError::InvalidLayer { .. } => "INVALID_CONFIGURATION_LAYER",
            PublishError::MissingConfiguration { .. } => "MISSING_CONFIGURATION",
            PublishError::MediaAccess(_) => "MEDIA_ACCESS_FAILED",
            PublishError::Init(_) => "PUBLISHER_INIT_FAILED",
            PublishError::Publish(_) => "PUBLISH_FAILED",
            PublishError::Unpublish(_) => "UNPUBLISH_FAILED",
            PublishError::NoActiveSession => "NO_ACTIVE_SESSION",
            PublishError::InvalidState { .. } => "INVALID_STATE",
            PublishError::Unsupported { .. } => "UNSUPPORTED",
            PublishError::Serialization(_) => "SERIALIZATION_FAILED",
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            PublishError::Configuration { .. }
            | PublishError::InvalidLayer { .. }
            | PublishError::MissingConfiguration { .. }
            | PublishError::Serialization(_) => ErrorCategory::Configuration,
            PublishError::MediaAccess(_) => ErrorCategory::MediaAcquisition,
            PublishError::Init(_) | PublishError::Publish(_) => ErrorCategory::PublishPipeline,
            PublishError::Unpublish(_) => ErrorCategory::Unpublish,
            PublishError::Initialization { .. }
            | PublishError::NoActiveSession
            | PublishError::InvalidState { .. }
            | PublishError::Unsupported { .. } => ErrorCategory::State,
        }
    }

    /// Whether the session keeps its handle and may retry the failed step.
    ///
    /// Only unpublish failures qualify; everything else ends the attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PublishError::Unpublish(_))
    }

    /// The device error behind a media access failure
    pub fn device_error(&self) -> Option<&DeviceError> {
        match self {
            PublishError::MediaAccess(err) => Some(err),
            _ => None,
        }
    }

    /// The provider fault behind a pipeline or unpublish failure
    pub fn provider_fault(&self) -> Option<&ProviderFault> {
        match self {
            PublishError::Init(fault) | PublishError::Publish(fault) | PublishError::Unpublish(fault) => {
                Some(fault)
            }
            _ => None,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session storage or merged configuration problems
    Configuration,
    /// Permission, device or constraint failures while acquiring media
    MediaAcquisition,
    /// Publisher init or publish start rejected
    PublishPipeline,
    /// Publisher refused to stop
    Unpublish,
    /// Operation called in the wrong lifecycle state
    State,
}

/// Kind of a device-access failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    /// The user or platform refused access
    PermissionDenied,
    /// No device matches the request
    NotFound,
    /// The device exists but could not be opened
    NotReadable,
    /// A constraint cannot be satisfied
    Overconstrained,
    /// Anything else reported by the device layer
    Other,
}

/// Error reported by the device layer when local media cannot be acquired.
///
/// The message is the raw description handed back by the device layer and is
/// what gets displayed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DeviceError {
    /// Failure kind
    pub kind: DeviceErrorKind,
    /// Raw description
    pub message: String,
}

impl DeviceError {
    /// Create a device error of the given kind
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Access was refused
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::PermissionDenied, message)
    }

    /// Map a DOM exception name onto a device error
    pub fn from_dom_exception(name: &str, message: impl Into<String>) -> Self {
        let kind = match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                DeviceErrorKind::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" => DeviceErrorKind::NotFound,
            "NotReadableError" | "TrackStartError" | "AbortError" => DeviceErrorKind::NotReadable,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                DeviceErrorKind::Overconstrained
            }
            _ => DeviceErrorKind::Other,
        };
        Self::new(kind, message)
    }
}

/// Failure value returned by the provider's async operations.
///
/// Providers reject with either a bare message or a structured payload;
/// structured payloads are rendered as pretty JSON.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderFault {
    /// Plain message
    #[error("{0}")]
    Message(String),
    /// Structured payload
    #[error("{}", render_detail(.0))]
    Detail(Value),
}

impl ProviderFault {
    /// Create a plain message fault
    pub fn message(message: impl Into<String>) -> Self {
        ProviderFault::Message(message.into())
    }
}

impl From<Value> for ProviderFault {
    fn from(value: Value) -> Self {
        match value {
            Value::String(message) => ProviderFault::Message(message),
            other => ProviderFault::Detail(other),
        }
    }
}

fn render_detail(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_categories() {
        let media = PublishError::from(DeviceError::permission_denied("Permission denied"));
        assert_eq!(media.category(), ErrorCategory::MediaAcquisition);
        assert!(!media.is_recoverable());
        assert_eq!(media.error_code(), "MEDIA_ACCESS_FAILED");

        let unpublish = PublishError::Unpublish(ProviderFault::message("busy"));
        assert_eq!(unpublish.category(), ErrorCategory::Unpublish);
        assert!(unpublish.is_recoverable());

        let init = PublishError::Init(ProviderFault::message("no socket"));
        assert_eq!(init.category(), ErrorCategory::PublishPipeline);
        assert_eq!(init.provider_fault(), Some(&ProviderFault::message("no socket")));
    }

    #[test]
    fn test_device_error_display_is_raw() {
        let err = DeviceError::permission_denied("Permission denied");
        assert_eq!(err.to_string(), "Permission denied");
    }

    #[test]
    fn test_dom_exception_mapping() {
        assert_eq!(
            DeviceError::from_dom_exception("NotAllowedError", "x").kind,
            DeviceErrorKind::PermissionDenied
        );
        assert_eq!(
            DeviceError::from_dom_exception("OverconstrainedError", "x").kind,
            DeviceErrorKind::Overconstrained
        );
        assert_eq!(
            DeviceError::from_dom_exception("Weird", "x").kind,
            DeviceErrorKind::Other
        );
    }

    #[test]
    fn test_provider_fault_rendering() {
        let plain = ProviderFault::from(json!("Socket closed"));
        assert_eq!(plain.to_string(), "Socket closed");

        let detail = ProviderFault::from(json!({"code": 4}));
        assert_eq!(detail.to_string(), "{\n  \"code\": 4\n}");
    }
}
