//! Built-in DAC: channel ownership and level/carrier generation.

pub mod carrier;
pub mod output;
pub mod registry;

pub use carrier::{CarrierGenerator, Waveform};
pub use output::AnalogOutput;
pub use registry::{ChannelClaim, ChannelId, ChannelMode, ChannelRegistry, ClaimedChannels};
