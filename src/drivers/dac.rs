//! Built-in 8-bit DAC driver (GPIO25 / GPIO26).
//!
//! Both channels are fed from one cyclic DMA buffer in continuous mode,
//! so a constant level and the gated proximity carrier can share the
//! peripheral.  Every write re-renders one full carrier period for both
//! lanes and swaps it in.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `dac_continuous_*` from the IDF 5 DAC driver.
//! On host/test: records writes in memory; failures can be injected.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::DacPort;
use crate::dac::carrier::{self, CARRIER_PERIOD_SAMPLES, DacSample};
use crate::dac::{ChannelId, ChannelMode, Waveform};
use crate::error::DacError;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

#[cfg(not(target_os = "espidf"))]
static SIM_DAC_FAIL: AtomicBool = AtomicBool::new(false);

/// Make every subsequent simulated write fail (or succeed again).
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_writes(fail: bool) {
    SIM_DAC_FAIL.store(fail, Ordering::Relaxed);
}

/// Current output of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneState {
    pub code: u8,
    pub waveform: Waveform,
}

impl Default for LaneState {
    fn default() -> Self {
        Self {
            code: 0,
            waveform: Waveform::Constant,
        }
    }
}

pub struct DacDriver {
    lanes: [LaneState; 2],
    buffer: Vec<DacSample>,
    #[cfg(target_os = "espidf")]
    handle: dac_continuous_handle_t,
    #[cfg(not(target_os = "espidf"))]
    writes: Vec<(ChannelId, u8, Waveform)>,
}

impl DacDriver {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, DacError> {
        let cfg = dac_continuous_config_t {
            chan_mask: dac_channel_mask_t_DAC_CHANNEL_MASK_ALL,
            desc_num: 4,
            buf_size: 2048,
            freq_hz: crate::pins::CARRIER_SAMPLE_RATE_HZ,
            offset: 0,
            clk_src: soc_periph_dac_digi_clk_src_t_DAC_DIGI_CLK_SRC_DEFAULT,
            chan_mode: dac_continuous_channel_mode_t_DAC_CHANNEL_MODE_ALTER,
        };
        let mut handle: dac_continuous_handle_t = core::ptr::null_mut();
        // SAFETY: called once from main before the runtime starts.
        let rc = unsafe { dac_continuous_new_channels(&cfg, &mut handle) };
        if rc != ESP_OK {
            return Err(DacError::WriteFailed(rc));
        }
        let rc = unsafe { dac_continuous_enable(handle) };
        if rc != ESP_OK {
            return Err(DacError::WriteFailed(rc));
        }
        log::info!("dac: continuous mode at {} Hz", crate::pins::CARRIER_SAMPLE_RATE_HZ);
        Ok(Self {
            lanes: [LaneState::default(); 2],
            buffer: vec![DacSample::default(); CARRIER_PERIOD_SAMPLES],
            handle,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, DacError> {
        log::info!("dac(sim): in-memory backend");
        Ok(Self {
            lanes: [LaneState::default(); 2],
            buffer: vec![DacSample::default(); CARRIER_PERIOD_SAMPLES],
            writes: Vec::new(),
        })
    }

    pub fn lane(&self, channel: ChannelId) -> LaneState {
        match channel {
            ChannelId::Right => self.lanes[0],
            ChannelId::Left => self.lanes[1],
        }
    }

    /// One carrier period as currently rendered.
    pub fn samples(&self) -> &[DacSample] {
        &self.buffer
    }

    /// Everything written so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn writes(&self) -> &[(ChannelId, u8, Waveform)] {
        &self.writes
    }

    fn render(&mut self) {
        for (mode, lane) in [(ChannelMode::Right, self.lanes[0]), (ChannelMode::Left, self.lanes[1])] {
            carrier::render(mode, lane.waveform, lane.code, 0, &mut self.buffer);
        }
    }

    #[cfg(target_os = "espidf")]
    fn push_buffer(&mut self) -> Result<(), DacError> {
        // ALTER mode consumes channel 0 (GPIO25) then channel 1 (GPIO26).
        let bytes: Vec<u8> = self.buffer.iter().flat_map(|s| [s.right, s.left]).collect();
        // SAFETY: handle is valid for the driver's lifetime; the cyclic
        // write copies the buffer into DMA descriptors.
        let rc = unsafe {
            dac_continuous_write_cyclically(
                self.handle,
                bytes.as_ptr().cast_mut(),
                bytes.len(),
                core::ptr::null_mut(),
            )
        };
        if rc == ESP_OK { Ok(()) } else { Err(DacError::WriteFailed(rc)) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn push_buffer(&mut self) -> Result<(), DacError> {
        if SIM_DAC_FAIL.load(Ordering::Relaxed) {
            return Err(DacError::WriteFailed(-1));
        }
        Ok(())
    }
}

impl DacPort for DacDriver {
    fn write_channel_level(
        &mut self,
        channel: ChannelId,
        level: u8,
        waveform: Waveform,
    ) -> Result<(), DacError> {
        let idx = match channel {
            ChannelId::Right => 0,
            ChannelId::Left => 1,
        };
        self.lanes[idx] = LaneState {
            code: level,
            waveform,
        };
        self.render();
        self.push_buffer()?;
        #[cfg(not(target_os = "espidf"))]
        self.writes.push((channel, level, waveform));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_render_independently() {
        let mut dac = DacDriver::new().unwrap();
        dac.write_channel_level(ChannelId::Right, 200, Waveform::ProximityCarrier)
            .unwrap();
        dac.write_channel_level(ChannelId::Left, 50, Waveform::Constant)
            .unwrap();
        let s = dac.samples();
        assert_eq!(s[0], DacSample { right: 200, left: 50 });
        assert_eq!(s[1], DacSample { right: 0, left: 50 });
        assert_eq!(dac.lane(ChannelId::Left).code, 50);
        assert_eq!(dac.writes().len(), 2);
    }
}
