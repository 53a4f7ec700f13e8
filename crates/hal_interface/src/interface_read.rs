//! Input side contracts: the free running tick register and the ADC channels.

/// A free running hardware counter.
///
/// The register is read-only, has no writer besides the timer hardware and is read with a single
/// load, so it can be sampled from thread and interrupt context without locking.
pub trait TickSource {
    /// Mask of the implemented counter bits. A 24-bit counter uses `0x00FF_FFFF`.
    const MASK: u32 = u32::MAX;

    /// Returns the raw counter value.
    fn ticks(&self) -> u32;
}

/// Read access to converted ADC channels.
pub trait AdcReader {
    /// Starts converter `p_adc_num` in free run mode on the channels set in `p_channel_mask`.
    fn init(&mut self, p_adc_num: u8, p_channel_mask: u32);

    /// Returns the last converted value of channel `p_channel`, left aligned on 16 bits.
    fn channel_value(&mut self, p_channel: u8) -> u16;

    /// Number of conversions per second the converter achieved after initialization.
    fn conversion_rate(&self) -> u32;
}
