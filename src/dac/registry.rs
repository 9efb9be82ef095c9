//! Channel registry: exclusive allocation of the two DAC channels.
//!
//! The ESP32 has exactly two 8-bit DAC outputs, wired to fixed pins:
//!
//! | Channel | GPIO | I2S DAC lane |
//! |---------|------|--------------|
//! | RIGHT   | 25   | channel 1    |
//! | LEFT    | 26   | channel 2    |
//!
//! Features claim channels during setup, in configuration-declaration
//! order.  A claim is either an explicit pin or an explicit mode; `BOTH`
//! takes the pair atomically.  There is no release: ownership lasts for
//! the device's operational lifetime, and [`ChannelRegistry::seal`] turns
//! any later claim into an error.

use serde::{Deserialize, Serialize};

use crate::config::FeatureRef;
use crate::error::ConfigError;
use crate::pins;

/// Physical analog output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Right,
    Left,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::Right, ChannelId::Left];

    /// GPIO the channel is bound to.
    pub const fn pin(self) -> u8 {
        match self {
            Self::Right => pins::DAC_RIGHT_GPIO,
            Self::Left => pins::DAC_LEFT_GPIO,
        }
    }

    /// Deterministic pin → channel mapping.
    pub const fn from_pin(pin: u8) -> Result<Self, ConfigError> {
        match pin {
            pins::DAC_RIGHT_GPIO => Ok(Self::Right),
            pins::DAC_LEFT_GPIO => Ok(Self::Left),
            other => Err(ConfigError::InvalidPinForChannel(other)),
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Left => 1,
        }
    }
}

/// Which channel(s) a feature drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelMode {
    Right,
    Left,
    Both,
}

impl ChannelMode {
    pub fn includes(self, channel: ChannelId) -> bool {
        matches!(
            (self, channel),
            (Self::Both, _) | (Self::Right, ChannelId::Right) | (Self::Left, ChannelId::Left)
        )
    }

    /// Channels covered by this mode, RIGHT first.
    pub fn channels(self) -> impl Iterator<Item = ChannelId> {
        ChannelId::ALL.into_iter().filter(move |ch| self.includes(*ch))
    }
}

impl From<ChannelId> for ChannelMode {
    fn from(ch: ChannelId) -> Self {
        match ch {
            ChannelId::Right => Self::Right,
            ChannelId::Left => Self::Left,
        }
    }
}

/// A resolved claim request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelClaim {
    Pin(u8),
    Mode(ChannelMode),
}

impl ChannelClaim {
    /// Build a claim from the pin/mode pair of a feature's configuration.
    /// Exactly one of the two must be present.
    pub fn from_parts(pin: Option<u8>, mode: Option<ChannelMode>) -> Result<Self, ConfigError> {
        match (pin, mode) {
            (Some(_), Some(_)) => Err(ConfigError::BothPinAndMode),
            (None, None) => Err(ConfigError::MissingPinOrMode),
            (Some(pin), None) => Ok(Self::Pin(pin)),
            (None, Some(mode)) => Ok(Self::Mode(mode)),
        }
    }

    /// The mode this claim resolves to, without touching the registry.
    pub fn resolve(self) -> Result<ChannelMode, ConfigError> {
        match self {
            Self::Pin(pin) => ChannelId::from_pin(pin).map(ChannelMode::from),
            Self::Mode(mode) => Ok(mode),
        }
    }
}

/// Proof of ownership handed back by a successful claim.
///
/// Only the registry constructs these, so holding one means the channels
/// are exclusively yours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimedChannels {
    mode: ChannelMode,
}

impl ClaimedChannels {
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        self.mode.includes(channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = ChannelId> {
        self.mode.channels()
    }

    #[cfg(test)]
    pub(crate) fn for_test(mode: ChannelMode) -> Self {
        Self { mode }
    }
}

/// Process-wide owner table for the two channels.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    owners: [Option<FeatureRef>; 2],
    sealed: bool,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the channel(s) named by `request` for `owner`.
    ///
    /// `Mode(BOTH)` is all-or-nothing: if either channel is taken, neither
    /// is allocated and the first conflicting channel is reported.
    pub fn claim(
        &mut self,
        owner: FeatureRef,
        request: ChannelClaim,
    ) -> Result<ClaimedChannels, ConfigError> {
        if self.sealed {
            return Err(ConfigError::RegistrySealed);
        }
        let mode = request.resolve()?;

        if let Some(taken) = mode.channels().find(|ch| self.owners[ch.index()].is_some()) {
            return Err(ConfigError::DuplicateChannelClaim(taken));
        }
        for ch in mode.channels() {
            self.owners[ch.index()] = Some(owner);
        }

        log::debug!("dac: {owner} claimed {mode:?}");
        Ok(ClaimedChannels { mode })
    }

    /// Freeze the table.  Called once by setup before the first tick.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Current owner of `channel`, if any.
    pub fn owner(&self, channel: ChannelId) -> Option<FeatureRef> {
        self.owners[channel.index()]
    }
}
