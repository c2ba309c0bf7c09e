//! Draggable items and drop targets.
//!
//! Every thing the player can carry between stations is one variant of
//! [`Item`].  Stations say which kinds they take through the
//! [`DropTarget`] capability, so routing a drop is a match on
//! [`ItemKind`] rather than a runtime type test.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::quality::QualityLevel;

// ---------------------------------------------------------------------------
// Grind size
// ---------------------------------------------------------------------------

/// Grinder output size; each grind action moves one step up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrindSize {
    Small,
    Medium,
    Large,
}

impl GrindSize {
    pub const MAX: Self = Self::Large;

    /// The next size up, or `None` at Large.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Small => Some(Self::Medium),
            Self::Medium => Some(Self::Large),
            Self::Large => None,
        }
    }

    /// Number of grind actions that produced this size.
    pub const fn steps(self) -> u32 {
        match self {
            Self::Small => 1,
            Self::Medium => 2,
            Self::Large => 3,
        }
    }

    pub const fn is_max(self) -> bool {
        matches!(self, Self::Large)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Portafilter basket, possibly holding a dose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Portafilter {
    pub coffee_g: f32,
    /// Dose quality score in [0, 1]; zero when empty.
    pub quality: f32,
}

impl Portafilter {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_dose(coffee_g: f32, quality: f32) -> Self {
        Self { coffee_g, quality }
    }

    pub fn has_coffee(&self) -> bool {
        self.coffee_g > 0.0
    }
}

/// Finished shot held by a cup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Espresso {
    pub quality: f32,
    pub level: QualityLevel,
}

/// Cup, empty or holding a shot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cup {
    pub espresso: Option<Espresso>,
}

impl Cup {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.espresso.is_none()
    }
}

/// Ground coffee taken off the grinder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundCoffee {
    pub size: GrindSize,
    pub grams: f32,
    pub quality: f32,
}

/// Anything the player can drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Portafilter(Portafilter),
    Cup(Cup),
    GroundCoffee(GroundCoffee),
    BeanBag { fills: u32 },
}

impl Item {
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Portafilter(_) => ItemKind::Portafilter,
            Self::Cup(_) => ItemKind::Cup,
            Self::GroundCoffee(_) => ItemKind::GroundCoffee,
            Self::BeanBag { .. } => ItemKind::BeanBag,
        }
    }
}

/// Discriminant of [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Portafilter,
    Cup,
    GroundCoffee,
    BeanBag,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Portafilter => "portafilter",
            Self::Cup => "cup",
            Self::GroundCoffee => "ground coffee",
            Self::BeanBag => "bean bag",
        })
    }
}

// ---------------------------------------------------------------------------
// Drop targets
// ---------------------------------------------------------------------------

/// A drop that was refused; the item goes back to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounced {
    pub item: Item,
    pub reason: Rejection,
}

impl Bounced {
    pub fn new(item: Item, reason: Rejection) -> Self {
        Self { item, reason }
    }
}

/// Capability of a station to receive dragged items.
///
/// `slot` addresses a position on multi-slot stations and is ignored by
/// single-position ones.
pub trait DropTarget {
    /// Whether this kind of item is taken at all (highlighting hint).
    fn accepts(&self, kind: ItemKind, slot: Option<usize>) -> bool;

    /// Take the item, or hand it back with the reason.
    fn receive(&mut self, item: Item, slot: Option<usize>) -> Result<(), Bounced>;
}
