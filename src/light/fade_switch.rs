//! Fade-gate switch.
//!
//! A boolean configuration entity bound to one light.  Writing it
//! publishes the new state and enables or disables the light's fade
//! animation.  Its state survives power cycles according to
//! [`RestoreMode`]; the persisted record is a small postcard blob.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};

pub const DEVICE_CLASS: &str = "switch";
pub const ENTITY_CATEGORY: &str = "config";
pub const ICON_FADE: &str = "mdi:animation-play-outline";

/// NVS namespace for switch records.
pub const STORAGE_NAMESPACE: &str = "irdac_sw";

/// How the switch state is chosen at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreMode {
    /// Stored state, or ON when nothing is stored.
    #[default]
    RestoreDefaultOn,
    /// Stored state, or OFF when nothing is stored.
    RestoreDefaultOff,
    AlwaysOn,
    AlwaysOff,
}

impl RestoreMode {
    pub fn initial_state(self, stored: Option<bool>) -> bool {
        match self {
            Self::RestoreDefaultOn => stored.unwrap_or(true),
            Self::RestoreDefaultOff => stored.unwrap_or(false),
            Self::AlwaysOn => true,
            Self::AlwaysOff => false,
        }
    }
}

/// What gets written to flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SwitchRecord {
    on: bool,
}

#[derive(Debug, Clone)]
pub struct FadeSwitch {
    /// NVS key, at most 15 bytes.
    key: heapless::String<15>,
    restore_mode: RestoreMode,
    state: bool,
    /// State published but not yet collected by the runtime.
    pending: Option<bool>,
}

impl FadeSwitch {
    /// `light_index` picks the storage key.
    pub fn new(light_index: u8, restore_mode: RestoreMode) -> Self {
        let mut key = heapless::String::new();
        // "fade" + up to three digits always fits.
        let _ = core::fmt::write(&mut key, format_args!("fade{light_index}"));
        Self {
            key,
            restore_mode,
            state: restore_mode.initial_state(None),
            pending: None,
        }
    }

    pub fn state(&self) -> bool {
        self.state
    }

    pub fn restore_mode(&self) -> RestoreMode {
        self.restore_mode
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Choose the boot state from `storage` and publish it.
    pub fn restore(&mut self, storage: &impl StoragePort) -> bool {
        let stored = match self.load(storage) {
            Ok(on) => Some(on),
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("fade switch {}: stored state unreadable ({e})", self.key.as_str());
                None
            }
        };
        self.state = self.restore_mode.initial_state(stored);
        self.pending = Some(self.state);
        debug!("fade switch {}: restored {}", self.key.as_str(), self.state);
        self.state
    }

    /// Set and publish the state.  Returns the state for the parent light.
    pub fn write_state(&mut self, on: bool) -> bool {
        self.state = on;
        self.pending = Some(on);
        on
    }

    /// Collect the last published state.
    pub fn take_published(&mut self) -> Option<bool> {
        self.pending.take()
    }

    fn load(&self, storage: &impl StoragePort) -> Result<bool, StorageError> {
        let mut buf = [0u8; 8];
        let n = storage.read(STORAGE_NAMESPACE, &self.key, &mut buf)?;
        let record: SwitchRecord =
            postcard::from_bytes(&buf[..n]).map_err(|_| StorageError::Corrupted)?;
        Ok(record.on)
    }

    /// Write the current state to `storage`.
    pub fn persist(&self, storage: &mut impl StoragePort) -> Result<(), StorageError> {
        let mut buf = [0u8; 8];
        let bytes = postcard::to_slice(&SwitchRecord { on: self.state }, &mut buf)
            .map_err(|_| StorageError::Full)?;
        storage.write(STORAGE_NAMESPACE, &self.key, bytes)
    }
}
