//! Station configuration parameters
//!
//! All tunables for the three station types.  A `MachineConfig` is loaded
//! once (see [`ConfigPort`](crate::app::ports::ConfigPort)), validated, and
//! then shared read-only: every station instance holds an `Arc` to its own
//! section and never mutates it.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quality::QualityBands;

/// Highest upgrade level a station can reach.
pub const MAX_UPGRADE_LEVEL: u8 = 2;

/// Number of rows in every per-level table.
pub const LEVEL_COUNT: usize = MAX_UPGRADE_LEVEL as usize + 1;

/// Physical slot count of the largest espresso machine.
pub const MAX_BREW_SLOTS: usize = 4;

/// Table row for a level.  Levels outside the table fall back to row 0.
pub fn level_index(level: u8) -> usize {
    let idx = level as usize;
    if idx < LEVEL_COUNT {
        idx
    } else {
        log::warn!("upgrade level {level} outside table, using level 0 behaviour");
        0
    }
}

// ---------------------------------------------------------------------------
// Interaction model
// ---------------------------------------------------------------------------

/// How the player starts a cycle at a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    ManualLever,
    ButtonPress,
    Automatic,
}

impl InteractionType {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::ManualLever => "manual lever",
            Self::ButtonPress => "button press",
            Self::Automatic => "automatic operation",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One row of a per-level table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProfile {
    pub interaction: InteractionType,
    /// Multiplier applied to the station's base cycle time.
    pub time_multiplier: f32,
}

impl LevelProfile {
    const fn new(interaction: InteractionType, time_multiplier: f32) -> Self {
        Self {
            interaction,
            time_multiplier,
        }
    }
}

/// Lever → button → automatic, each level faster than the last.
fn default_levels() -> [LevelProfile; LEVEL_COUNT] {
    [
        LevelProfile::new(InteractionType::ManualLever, 1.0),
        LevelProfile::new(InteractionType::ButtonPress, 0.75),
        LevelProfile::new(InteractionType::Automatic, 0.5),
    ]
}

/// Finite and strictly above zero; NaN and infinities fail.
fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn validate_levels(levels: &[LevelProfile; LEVEL_COUNT]) -> Result<()> {
    if levels.iter().all(|l| positive(l.time_multiplier)) {
        Ok(())
    } else {
        Err(Error::Config("level time multipliers must be positive"))
    }
}

// ---------------------------------------------------------------------------
// Doser
// ---------------------------------------------------------------------------

/// Ground-coffee doser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosingConfig {
    /// Ground coffee the hopper can store (g).
    pub capacity_g: f32,
    /// Most coffee a portafilter basket holds (g).
    pub portafilter_capacity_g: f32,
    /// Target dose (g).
    pub ideal_dose_g: f32,
    /// Dose within ±tolerance scores perfect (g).
    pub tolerance_g: f32,
    /// Dispense rate at level 0 (g/s).
    pub dispense_rate_g_per_s: f32,
    /// Per-level multiplier on the dispense rate.
    pub rate_multipliers: [f32; LEVEL_COUNT],
    /// Base cycle time of one lever pull or button press (s).
    pub base_process_secs: f32,
    pub levels: [LevelProfile; LEVEL_COUNT],
    pub quality_bands: QualityBands,
}

impl Default for DosingConfig {
    fn default() -> Self {
        Self {
            capacity_g: 100.0,
            portafilter_capacity_g: 22.0,
            ideal_dose_g: 18.0,
            tolerance_g: 1.0,
            dispense_rate_g_per_s: 6.0,
            rate_multipliers: [1.0, 1.5, 2.0],
            base_process_secs: 1.0,
            levels: default_levels(),
            quality_bands: QualityBands::default(),
        }
    }
}

impl DosingConfig {
    pub fn validate(&self) -> Result<()> {
        if !positive(self.capacity_g) {
            return Err(Error::Config("dosing capacity must be positive"));
        }
        if !positive(self.ideal_dose_g)
            || !positive(self.portafilter_capacity_g)
            || self.ideal_dose_g > self.portafilter_capacity_g
        {
            return Err(Error::Config("ideal dose must fit in the portafilter"));
        }
        if !(0.0..self.ideal_dose_g).contains(&self.tolerance_g) {
            return Err(Error::Config("dose tolerance must be within [0, ideal)"));
        }
        if !positive(self.dispense_rate_g_per_s)
            || !self.rate_multipliers.iter().copied().all(positive)
        {
            return Err(Error::Config("dispense rates must be positive"));
        }
        if !positive(self.base_process_secs) {
            return Err(Error::Config("dosing cycle time must be positive"));
        }
        validate_levels(&self.levels)?;
        self.quality_bands.validate()
    }
}

// ---------------------------------------------------------------------------
// Grinder
// ---------------------------------------------------------------------------

/// Bean grinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrinderConfig {
    /// Bean-fills the hopper can hold.
    pub bean_capacity: u32,
    /// Grams of ground coffee per grind step (Small = 1 step, Large = 3).
    pub grams_per_step: f32,
    /// Target ground amount (g).
    pub ideal_grams: f32,
    pub tolerance_g: f32,
    /// Base time of one grind action (s).
    pub base_process_secs: f32,
    pub levels: [LevelProfile; LEVEL_COUNT],
    pub quality_bands: QualityBands,
}

impl Default for GrinderConfig {
    fn default() -> Self {
        Self {
            bean_capacity: 10,
            grams_per_step: 6.0,
            ideal_grams: 18.0,
            tolerance_g: 1.0,
            base_process_secs: 2.0,
            levels: default_levels(),
            quality_bands: QualityBands::default(),
        }
    }
}

impl GrinderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bean_capacity == 0 {
            return Err(Error::Config("grinder bean capacity must be positive"));
        }
        if !positive(self.grams_per_step) || !positive(self.ideal_grams) {
            return Err(Error::Config("grind amounts must be positive"));
        }
        if !(0.0..self.ideal_grams).contains(&self.tolerance_g) {
            return Err(Error::Config("grind tolerance must be within [0, ideal)"));
        }
        if !positive(self.base_process_secs) {
            return Err(Error::Config("grind time must be positive"));
        }
        validate_levels(&self.levels)?;
        self.quality_bands.validate()
    }
}

// ---------------------------------------------------------------------------
// Espresso machine
// ---------------------------------------------------------------------------

/// Multi-slot espresso machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EspressoConfig {
    /// Base brew time per shot (s).
    pub base_brew_secs: f32,
    /// Weight of the dose quality in the shot quality.
    pub coffee_weight: f32,
    /// Usable slots per level.
    pub slot_counts: [u8; LEVEL_COUNT],
    /// Flat quality bonus per level.
    pub quality_bonus: [f32; LEVEL_COUNT],
    pub levels: [LevelProfile; LEVEL_COUNT],
    pub quality_bands: QualityBands,
}

impl Default for EspressoConfig {
    fn default() -> Self {
        Self {
            base_brew_secs: 5.0,
            coffee_weight: 1.0,
            slot_counts: [2, 2, 4],
            quality_bonus: [0.0, 0.05, 0.1],
            levels: default_levels(),
            quality_bands: QualityBands::default(),
        }
    }
}

impl EspressoConfig {
    pub fn validate(&self) -> Result<()> {
        if !positive(self.base_brew_secs) {
            return Err(Error::Config("brew time must be positive"));
        }
        if !(self.coffee_weight.is_finite() && self.coffee_weight >= 0.0) {
            return Err(Error::Config("coffee weight must not be negative"));
        }
        if self
            .slot_counts
            .iter()
            .any(|n| *n == 0 || *n as usize > MAX_BREW_SLOTS)
        {
            return Err(Error::Config("slot counts must be within 1..=4"));
        }
        if self.quality_bonus.iter().any(|b| !(0.0..=1.0).contains(b)) {
            return Err(Error::Config("quality bonus must be within [0, 1]"));
        }
        validate_levels(&self.levels)?;
        self.quality_bands.validate()
    }
}

// ---------------------------------------------------------------------------
// Whole bar
// ---------------------------------------------------------------------------

/// Configuration of every station type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub dosing: DosingConfig,
    pub grinder: GrinderConfig,
    pub espresso: EspressoConfig,
}

impl MachineConfig {
    pub fn validate(&self) -> Result<()> {
        self.dosing.validate()?;
        self.grinder.validate()?;
        self.espresso.validate()
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON config"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|_| Error::Config("config not serialisable"))
    }

    /// Compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("config not serialisable"))
    }

    /// Decode and validate the compact binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("corrupted config blob"))?;
        config.validate()?;
        Ok(config)
    }
}
