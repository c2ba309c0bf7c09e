//! Port traits: the hexagonal boundary between the bar and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CafeService (domain)
//! ```
//!
//! Driven adapters (event sinks, config storage) implement these traits.
//! The [`CafeService`](super::service::CafeService) consumes them via
//! generics, so the domain core never touches a file or a screen.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use crate::config::MachineConfig;
use crate::error::Error;

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → presentation / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, UI bindings,
/// test recorders).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ stored config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the machine configuration.
///
/// Implementations MUST validate before persisting and return
/// [`ConfigError::ValidationFailed`] rather than clamping bad values.
pub trait ConfigPort {
    /// Load the stored configuration.
    fn load(&self) -> Result<MachineConfig, ConfigError>;

    /// Validate and persist.
    fn save(&self, config: &MachineConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored yet.
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A field failed range validation; the text names it.
    ValidationFailed(&'static str),
    /// The backend could not be read or written.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<Error> for ConfigError {
    fn from(e: Error) -> Self {
        match e {
            Error::Config(msg) => Self::ValidationFailed(msg),
            Error::Rejected(_) => Self::ValidationFailed("config rejected"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
