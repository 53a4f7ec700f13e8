//! Storage devices used by self-flashing: the QSPI NOR flash and the internal program flash.

use core::ops::Range;

use hal_interface::{EraseGranularity, ExternalStorage, HalError, HalResult, ProgramMemory};

use crate::bindings;

/// QSPI NOR flash holding the image to install.
pub struct SpiFlash;

impl ExternalStorage for SpiFlash {
    fn check_responding(&mut self) -> HalResult<()> {
        unsafe { bindings::spiflash_init() }.to_result("QSPI", 0)
    }

    fn read(&mut self, p_addr: u32, p_buf: &mut [u8]) -> HalResult<()> {
        unsafe { bindings::spiflash_read(p_addr, p_buf.as_mut_ptr(), p_buf.len() as u32) }
            .to_result("QSPI", p_addr)
    }
}

/// Internal flash sectors 5 to 11, all 256 KiB. The smaller sectors below hold the boot loader.
const K_INTFLASH_REGION: Range<u32> = 0x0804_0000..0x0820_0000;
const K_INTFLASH_SECTOR: u32 = 0x4_0000;

/// Internal program flash, memory mapped for reading.
pub struct IntFlash;

impl ProgramMemory for IntFlash {
    fn region(&self) -> Range<u32> {
        K_INTFLASH_REGION
    }

    fn erase_granularity(&self) -> EraseGranularity {
        EraseGranularity {
            block: K_INTFLASH_SECTOR,
            small: None,
        }
    }

    fn erase(&mut self, p_addr: u32, p_size: u32) -> HalResult<()> {
        unsafe { bindings::intflash_erase(p_addr, p_size) }.to_result("INTFLASH", p_addr)
    }

    fn write(&mut self, p_addr: u32, p_data: &[u8]) -> HalResult<()> {
        unsafe { bindings::intflash_write(p_addr, p_data.as_ptr(), p_data.len() as u32) }
            .to_result("INTFLASH", p_addr)
    }

    fn read(&mut self, p_addr: u32, p_buf: &mut [u8]) -> HalResult<()> {
        let l_end = p_addr.checked_add(p_buf.len() as u32);
        match l_end {
            Some(l_end) if p_addr >= K_INTFLASH_REGION.start && l_end <= K_INTFLASH_REGION.end => {
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        p_addr as *const u8,
                        p_buf.as_mut_ptr(),
                        p_buf.len(),
                    );
                }
                Ok(())
            }
            _ => Err(HalError::ReadError("INTFLASH", p_addr)),
        }
    }
}
