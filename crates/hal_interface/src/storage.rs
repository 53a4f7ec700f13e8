//! Non-volatile storage contracts used by self-flashing.
//!
//! Both devices are addressed with absolute 32-bit addresses. The internal program memory follows
//! erase-before-write: a location must be erased (blank) before it can be programmed.

use crate::HalResult;
use core::ops::Range;

/// External storage holding the image to flash (typically a SPI NOR flash).
pub trait ExternalStorage {
    /// Checks that the device answers (JEDEC identification or equivalent).
    ///
    /// # Errors
    /// Returns [`crate::HalError::DeviceNotResponding`] when the device does not answer.
    fn check_responding(&mut self) -> HalResult<()>;

    /// Reads `p_buf.len()` bytes starting at `p_addr`.
    fn read(&mut self, p_addr: u32, p_buf: &mut [u8]) -> HalResult<()>;
}

/// Erase unit sizes supported by a program memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseGranularity {
    /// Regular erase block size in bytes.
    pub block: u32,
    /// Optional smaller erase unit (e.g. 4 KiB sectors).
    pub small: Option<u32>,
}

impl EraseGranularity {
    /// Smallest erase unit the device supports.
    pub fn min(&self) -> u32 {
        match self.small {
            Some(l_small) if l_small < self.block => l_small,
            _ => self.block,
        }
    }
}

/// Internal program memory the image is written to.
pub trait ProgramMemory {
    /// Address range of the whole device.
    fn region(&self) -> Range<u32>;

    fn erase_granularity(&self) -> EraseGranularity;

    /// Erases `p_size` bytes at `p_addr`. `p_size` is one of the advertised erase units and
    /// `p_addr` is aligned on it.
    fn erase(&mut self, p_addr: u32, p_size: u32) -> HalResult<()>;

    /// Programs `p_data` at `p_addr`. The target must have been erased before.
    fn write(&mut self, p_addr: u32, p_data: &[u8]) -> HalResult<()>;

    fn read(&mut self, p_addr: u32, p_buf: &mut [u8]) -> HalResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_granularity_prefers_small_sectors() {
        let l_gran = EraseGranularity {
            block: 0x1_0000,
            small: Some(0x1000),
        };
        assert_eq!(l_gran.min(), 0x1000);

        let l_gran = EraseGranularity {
            block: 0x1_0000,
            small: None,
        };
        assert_eq!(l_gran.min(), 0x1_0000);
    }
}
