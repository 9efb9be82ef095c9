//! IR transmitter driver (RMT TX with 38 kHz carrier on GPIO4).
//!
//! `send_raw_pulses` packs the timing into RMT items held by the driver
//! and starts the transfer without waiting; `is_busy` polls the channel.
//! The item buffer is only rewritten once the previous transfer is done,
//! so the DMA source stays valid for the whole transmission.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `TxRmtDriver` for channel/carrier setup, raw
//! `rmt_write_items` / `rmt_wait_tx_done` for the non-blocking path.
//! On host/test: records every pulse train; busy until `sim_complete`.

use crate::app::ports::PulseSink;
use crate::error::TransmitError;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

/// Longest duration one RMT item half can carry (15 bits).
const MAX_ITEM_TICKS: u32 = 0x7FFF;

/// Pack signed raw timing into 32-bit RMT items:
/// `duration0 | level0 << 15 | duration1 << 16 | level1 << 31`.
/// An odd tail gets a zero-length second half, which also ends the
/// transfer.
pub fn pack_items(raw: &[i32], out: &mut Vec<u32>) {
    fn half(v: i32) -> u32 {
        let level = u32::from(v > 0);
        v.unsigned_abs().min(MAX_ITEM_TICKS) | (level << 15)
    }
    out.clear();
    for pair in raw.chunks(2) {
        let lo = half(pair[0]);
        let hi = pair.get(1).map_or(0, |&v| half(v));
        out.push(lo | (hi << 16));
    }
    if raw.len() % 2 == 0 {
        out.push(0);
    }
}

#[cfg(target_os = "espidf")]
pub struct IrTransmitter<'d> {
    driver: esp_idf_hal::rmt::TxRmtDriver<'d>,
    items: Vec<u32>,
}

#[cfg(target_os = "espidf")]
impl<'d> IrTransmitter<'d> {
    pub fn new(
        channel: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::rmt::RmtChannel> + 'd,
        pin: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::OutputPin> + 'd,
    ) -> Result<Self, EspError> {
        use esp_idf_hal::rmt::config::{CarrierConfig, DutyPercent, TransmitConfig};
        use esp_idf_hal::units::Hertz;
        use crate::pins;

        let carrier = CarrierConfig::new()
            .frequency(Hertz(pins::IR_CARRIER_HZ))
            .duty_percent(DutyPercent::new(33)?);
        let config = TransmitConfig::new()
            .clock_divider(pins::RMT_CLOCK_DIVIDER)
            .carrier(Some(carrier));
        let driver = esp_idf_hal::rmt::TxRmtDriver::new(channel, pin, &config)?;
        log::info!("ir_tx: RMT transmitter on GPIO{}", pins::IR_TX_GPIO);
        Ok(Self {
            driver,
            items: Vec::with_capacity(crate::ir::MAX_RAW_ENTRIES / 2 + 1),
        })
    }
}

#[cfg(target_os = "espidf")]
impl PulseSink for IrTransmitter<'_> {
    fn send_raw_pulses(&mut self, raw: &[i32]) -> Result<(), TransmitError> {
        if self.is_busy() {
            return Err(TransmitError::TransmitterBusy);
        }
        pack_items(raw, &mut self.items);
        // SAFETY: rmt_item32_t is a 32-bit union over exactly this layout,
        // and `items` is not touched again until the channel reports done.
        let rc = unsafe {
            rmt_write_items(
                self.driver.channel(),
                self.items.as_ptr().cast::<rmt_item32_t>(),
                self.items.len() as i32,
                false,
            )
        };
        if rc == ESP_OK { Ok(()) } else { Err(TransmitError::DriverFailed(rc)) }
    }

    fn is_busy(&self) -> bool {
        // SAFETY: zero timeout, only queries the channel status.
        unsafe { rmt_wait_tx_done(self.driver.channel(), 0) != ESP_OK }
    }
}

/// Simulated transmitter.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct IrTransmitter {
    busy: bool,
    items: Vec<u32>,
    sent: Vec<Vec<i32>>,
}

#[cfg(not(target_os = "espidf"))]
impl IrTransmitter {
    pub fn new() -> Self {
        log::info!("ir_tx(sim): recording transmitter");
        Self::default()
    }

    /// Finish the transmission in flight.
    pub fn sim_complete(&mut self) {
        self.busy = false;
    }

    pub fn sent(&self) -> &[Vec<i32>] {
        &self.sent
    }

    /// Items of the last transmission as the hardware would see them.
    pub fn last_items(&self) -> &[u32] {
        &self.items
    }
}

#[cfg(not(target_os = "espidf"))]
impl PulseSink for IrTransmitter {
    fn send_raw_pulses(&mut self, raw: &[i32]) -> Result<(), TransmitError> {
        if self.busy {
            return Err(TransmitError::TransmitterBusy);
        }
        pack_items(raw, &mut self.items);
        self.sent.push(raw.to_vec());
        self.busy = true;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_pack_level_and_duration() {
        let mut items = Vec::new();
        pack_items(&[9000, -4500, 560], &mut items);
        assert_eq!(items, vec![9000 | 0x8000 | (4500 << 16), 560 | 0x8000]);
    }

    #[test]
    fn even_length_gets_end_marker() {
        let mut items = Vec::new();
        pack_items(&[842, -842], &mut items);
        assert_eq!(items, vec![842 | 0x8000 | (842 << 16), 0]);
    }

    #[cfg(not(target_os = "espidf"))]
    #[test]
    fn sim_is_busy_until_completed() {
        let mut tx = IrTransmitter::new();
        tx.send_raw_pulses(&[560]).unwrap();
        assert!(tx.is_busy());
        assert_eq!(tx.send_raw_pulses(&[560]), Err(TransmitError::TransmitterBusy));
        tx.sim_complete();
        tx.send_raw_pulses(&[560]).unwrap();
        assert_eq!(tx.sent().len(), 2);
    }
}
