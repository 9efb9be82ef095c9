//! Plain analog output on claimed DAC channel(s).

use crate::app::capabilities::Outputs;
use crate::app::ports::DacPort;
use crate::error::DacError;

use super::{CarrierGenerator, ClaimedChannels, Waveform};

pub struct AnalogOutput {
    generator: CarrierGenerator,
}

impl AnalogOutput {
    pub fn new(channels: ClaimedChannels) -> Self {
        Self {
            generator: CarrierGenerator::new(channels, Waveform::Constant),
        }
    }

    pub fn generator(&self) -> &CarrierGenerator {
        &self.generator
    }
}

impl Outputs for AnalogOutput {
    fn write_level(&mut self, dac: &mut impl DacPort, level: f32) -> Result<(), DacError> {
        self.generator.set_level(dac, level)
    }
}
