//! Inbound commands to the application service.
//!
//! These represent what the player (through drag-and-drop, controls and
//! purchases) asks the bar to do.  The
//! [`CafeService`](super::service::CafeService) routes each one to a
//! station and answers with a [`CommandOutcome`].

use core::fmt;

use crate::error::Rejection;
use crate::items::{Item, ItemKind};

/// Which station a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKind {
    Dosing,
    Grinder,
    Espresso,
}

impl StationKind {
    pub const ALL: [Self; 3] = [Self::Grinder, Self::Dosing, Self::Espresso];
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dosing => "doser",
            Self::Grinder => "grinder",
            Self::Espresso => "espresso machine",
        })
    }
}

/// Commands that the outside world can send into the bar.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Pour bean-fills into the grinder hopper.
    AddBeans { fills: u32 },

    /// Drop a dragged item on a station.  `slot` picks an espresso slot;
    /// `None` lets the machine choose the first free one.
    Drop {
        target: StationKind,
        slot: Option<usize>,
        item: Item,
    },

    /// Pick an item up from a station.
    Take {
        target: StationKind,
        slot: Option<usize>,
        kind: ItemKind,
    },

    PullLever {
        station: StationKind,
        slot: Option<usize>,
    },

    PressButton {
        station: StationKind,
        slot: Option<usize>,
    },

    /// Move grams straight from doser storage into the portafilter.
    Transfer { grams: f32 },

    /// Delivered by the upgrade system after a purchase.
    Upgrade { station: StationKind, level: u8 },

    /// Reset one station, or all of them with `None`.
    Reset { station: Option<StationKind> },
}

impl AppCommand {
    /// Station the command is addressed to, if a single one.
    pub fn station(&self) -> Option<StationKind> {
        match self {
            Self::AddBeans { .. } => Some(StationKind::Grinder),
            Self::Transfer { .. } => Some(StationKind::Dosing),
            Self::Drop { target, .. } | Self::Take { target, .. } => Some(*target),
            Self::PullLever { station, .. }
            | Self::PressButton { station, .. }
            | Self::Upgrade { station, .. } => Some(*station),
            Self::Reset { station } => *station,
        }
    }
}

/// Answer to one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    /// An item was handed to the player.
    Item(Item),
    /// Refused; a dropped item comes back in `returned`.
    Rejected {
        reason: Rejection,
        returned: Option<Item>,
    },
}

impl CommandOutcome {
    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
