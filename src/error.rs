//! Unified error types for the machine process core.
//!
//! Two families, kept apart on purpose:
//!
//! - [`Rejection`]: an operation was attempted against the current state
//!   or quantities and is not allowed (insufficient stock, station full,
//!   already processing, bad slot index).  These are ordinary values that
//!   every station operation returns through [`Outcome`]; their `Display`
//!   text is what the player sees in a notification.
//! - [`Error`]: everything a caller cannot shrug off, chiefly invalid or
//!   missing configuration at construction time.

use core::fmt;

use crate::config::InteractionType;
use crate::items::ItemKind;

// ---------------------------------------------------------------------------
// Rejected operations
// ---------------------------------------------------------------------------

/// Why a station refused an operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Zero or negative amount requested.
    NonPositiveAmount,
    /// Source does not hold enough material.
    InsufficientStock { requested: f32, available: f32 },
    /// Destination is already full.
    AtCapacity,
    /// A cycle is already running.
    AlreadyProcessing,
    /// Start requested while the station is not in `Ready`.
    NotReady,
    /// A required input item is absent.
    MissingInput(ItemKind),
    /// A vessel of this kind already occupies the position.
    Occupied(ItemKind),
    /// Grinder output is at the largest size and must be taken first.
    MaxGrindSize,
    /// Slot index is outside the slots available at the current level.
    InvalidSlot { index: usize, available: usize },
    /// The station does not take this kind of item here.
    WrongItem(ItemKind),
    /// The control used does not match the station's interaction model.
    WrongInteraction { expected: InteractionType },
    /// Nothing of the requested kind to hand out.
    NothingToTake(ItemKind),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "amount must be greater than zero"),
            Self::InsufficientStock {
                requested,
                available,
            } => write!(
                f,
                "not enough stock: {requested:.1} requested, {available:.1} available"
            ),
            Self::AtCapacity => write!(f, "station is full"),
            Self::AlreadyProcessing => write!(f, "station is already working"),
            Self::NotReady => write!(f, "station is not ready"),
            Self::MissingInput(kind) => write!(f, "needs a {kind}"),
            Self::Occupied(kind) => write!(f, "a {kind} is already in place"),
            Self::MaxGrindSize => write!(f, "grinder output is full, take the coffee first"),
            Self::InvalidSlot { index, available } => write!(
                f,
                "slot {} is not available ({} slots at this level)",
                index + 1,
                available
            ),
            Self::WrongItem(kind) => write!(f, "a {kind} does not go here"),
            Self::WrongInteraction { expected } => {
                write!(f, "this station is operated by {}", expected.describe())
            }
            Self::NothingToTake(kind) => write!(f, "there is no {kind} to take"),
        }
    }
}

/// Result of any station operation.
pub type Outcome<T> = core::result::Result<T, Rejection>;

// ---------------------------------------------------------------------------
// Crate-wide error
// ---------------------------------------------------------------------------

/// Every non-recoverable failure funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// An operation was rejected where the caller required success.
    Rejected(Rejection),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Rejected(r) => write!(f, "rejected: {r}"),
        }
    }
}

impl From<Rejection> for Error {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}

impl std::error::Error for Error {}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
