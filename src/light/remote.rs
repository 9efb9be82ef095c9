//! NEC command set of the remote-controlled ceiling light.
//!
//! ```text
//!  address 0xB721  dim   brightness/colour, lamp fades to it
//!  address 0xB781  set   brightness/colour, lamp jumps to it
//!  address 0xB7A0  native: 0x00-0x0F preset load, 0x10-0x1F forced load,
//!                          0x20-0x2F preset save, 0xEC power off
//! ```
//!
//! Brightness/colour byte: high nibble = brightness × 15, low nibble =
//! 15 − warmth × 15, both rounded.

use crate::ir::{Frame, NecData};

pub const ADDRESS_DIM: u16 = 0xB721;
pub const ADDRESS_SET: u16 = 0xB781;
pub const ADDRESS_NATIVE: u16 = 0xB7A0;
pub const POWER_OFF: u8 = 0xEC;

/// 6500 K.
pub const COLD_MIREDS: f32 = 1.0e6 / 6500.0;
/// 2700 K.
pub const WARM_MIREDS: f32 = 1.0e6 / 2700.0;

const PRESET_FORCE: u8 = 16;
const PRESET_SAVE: u8 = 32;

/// Mireds → 0.0 (cold) ..= 1.0 (warm).
pub fn warmth_from_mireds(mireds: f32) -> f32 {
    if mireds.is_nan() {
        return 0.0;
    }
    ((mireds - COLD_MIREDS) / (WARM_MIREDS - COLD_MIREDS)).clamp(0.0, 1.0)
}

pub fn mireds_from_warmth(warmth: f32) -> f32 {
    COLD_MIREDS + warmth.clamp(0.0, 1.0) * (WARM_MIREDS - COLD_MIREDS)
}

/// Quantise brightness and warmth into one command byte.
pub fn command_byte(brightness: f32, warmth: f32) -> u8 {
    let b = (0.5 + brightness.clamp(0.0, 1.0) * 15.0) as u8;
    let c = (15.5 - warmth.clamp(0.0, 1.0) * 15.0) as u8;
    (b.min(15) << 4) | c.min(15)
}

fn frame(address: u16, command: u8) -> Frame {
    let data = NecData::with_command_byte(address, command);
    Frame::nec(data.address, data.command)
}

/// Frame reproducing a light state.  Brightness 0 is power-off.
pub fn state_frame(brightness: f32, warmth: f32, fade: bool) -> Frame {
    if brightness > 0.0 {
        let address = if fade { ADDRESS_DIM } else { ADDRESS_SET };
        frame(address, command_byte(brightness, warmth))
    } else {
        frame(ADDRESS_NATIVE, POWER_OFF)
    }
}

/// Recall stored preset `preset % 16`.
pub fn preset_load_frame(preset: u8, force: bool) -> Frame {
    let force = if force { PRESET_FORCE } else { 0 };
    frame(ADDRESS_NATIVE, preset % 16 + force)
}

/// Store the lamp's current state as preset `preset % 16`.
pub fn preset_save_frame(preset: u8) -> Frame {
    frame(ADDRESS_NATIVE, preset % 16 + PRESET_SAVE)
}

/// What a received frame asks the light to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteAction {
    Set { brightness: f32, warmth: f32, fade: bool },
    PowerOff,
    PresetLoad { preset: u8, force: bool },
    PresetSave { preset: u8 },
}

/// Whether `frame` is addressed to this kind of light at all.
pub fn is_addressed_to_light(frame: &Frame) -> bool {
    frame.as_nec().is_some_and(|d| {
        matches!(d.address, ADDRESS_DIM | ADDRESS_SET | ADDRESS_NATIVE) && d.command_is_checked()
    })
}

/// Interpret a received frame.  `None` for foreign or unknown commands.
pub fn interpret(frame: &Frame) -> Option<RemoteAction> {
    if !is_addressed_to_light(frame) {
        return None;
    }
    let data = frame.as_nec()?;
    let byte = data.command_byte();
    match data.address {
        ADDRESS_DIM | ADDRESS_SET => Some(RemoteAction::Set {
            brightness: f32::from(byte >> 4) / 15.0,
            warmth: f32::from(15 - (byte & 0x0F)) / 15.0,
            fade: data.address == ADDRESS_DIM,
        }),
        _ => match byte {
            POWER_OFF => Some(RemoteAction::PowerOff),
            0x00..=0x0F => Some(RemoteAction::PresetLoad {
                preset: byte,
                force: false,
            }),
            0x10..=0x1F => Some(RemoteAction::PresetLoad {
                preset: byte - PRESET_FORCE,
                force: true,
            }),
            0x20..=0x2F => Some(RemoteAction::PresetSave {
                preset: byte - PRESET_SAVE,
            }),
            _ => None,
        },
    }
}
