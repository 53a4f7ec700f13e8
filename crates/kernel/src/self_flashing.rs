//! Self-flashing: copies a raw image from external storage into the internal program memory.
//!
//! The destination is processed erase unit by erase unit. Each unit is erased, then filled with
//! the matching source bytes and read back before moving to the next one, so a successful return
//! never leaves an erased but unwritten unit behind.
//!
//! Failures are not retried and the image carries no checksum. The caller must treat any error
//! as fatal and must run the loader before interrupts are enabled and before any code executes
//! from the destination range.

use crate::KernelError::{
    EraseFailed, ExternalStorageNotResponding, FlashImageEmpty, FlashImageOutOfBounds,
    FlashImageOverlapsFirmware, FlashImageUnaligned, TransferFailed, VerifyFailed,
};
use crate::KernelResult;
use crate::console_output::{ConsoleFormatting, console_write};
use core::ops::Range;
use hal_interface::{ExternalStorage, ProgramMemory, TraceOutput};
use heapless::format;

/// Size of the bounce buffer used between both storages.
const K_TRANSFER_CHUNK: usize = 256;

/// Source and destination of the image to flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashImage {
    /// Start address in external storage.
    pub source_addr: u32,
    /// Start address in internal program memory.
    pub dest_addr: u32,
    /// Image length in bytes.
    pub length: u32,
}

impl FlashImage {
    pub fn source_range(&self) -> Range<u32> {
        self.source_addr..self.source_addr.saturating_add(self.length)
    }

    pub fn destination_range(&self) -> Range<u32> {
        self.dest_addr..self.dest_addr.saturating_add(self.length)
    }
}

/// Erase-then-program sequence from an [`ExternalStorage`] into a [`ProgramMemory`].
pub struct SelfFlashingLoader<'a> {
    external: &'a mut dyn ExternalStorage,
    internal: &'a mut dyn ProgramMemory,
    verbose: bool,
    firmware: Option<Range<u32>>,
}

impl<'a> SelfFlashingLoader<'a> {
    pub fn new(
        p_external: &'a mut dyn ExternalStorage,
        p_internal: &'a mut dyn ProgramMemory,
    ) -> SelfFlashingLoader<'a> {
        SelfFlashingLoader {
            external: p_external,
            internal: p_internal,
            verbose: false,
            firmware: None,
        }
    }

    /// Traces every erased unit when `p_verbose` is set.
    pub fn with_verbose(mut self, p_verbose: bool) -> SelfFlashingLoader<'a> {
        self.verbose = p_verbose;
        self
    }

    /// Program memory range holding the running firmware. It is never erased.
    pub fn with_firmware_region(
        mut self,
        p_firmware: Option<Range<u32>>,
    ) -> SelfFlashingLoader<'a> {
        self.firmware = p_firmware;
        self
    }

    /// Checks `p_image` against the program memory geometry.
    ///
    /// # Returns
    /// The address range that will be erased: the destination range rounded up to the smallest
    /// erase unit.
    ///
    /// # Errors
    /// - [`crate::KernelError::FlashImageEmpty`] for a zero length image.
    /// - [`crate::KernelError::FlashImageUnaligned`] if the destination does not start on an
    ///   erase unit.
    /// - [`crate::KernelError::FlashImageOutOfBounds`] if the erased range leaves the device.
    /// - [`crate::KernelError::FlashImageOverlapsFirmware`] if the erased range overlaps the
    ///   running firmware.
    pub fn covered_range(&self, p_image: &FlashImage) -> KernelResult<Range<u32>> {
        if p_image.length == 0 {
            return Err(FlashImageEmpty);
        }

        let l_min = self.internal.erase_granularity().min();
        if l_min == 0 || p_image.dest_addr % l_min != 0 {
            return Err(FlashImageUnaligned(p_image.dest_addr));
        }

        let l_out_of_bounds = FlashImageOutOfBounds(p_image.dest_addr, p_image.length);
        let l_end = p_image
            .dest_addr
            .checked_add(p_image.length)
            .and_then(|l_end| l_end.checked_next_multiple_of(l_min))
            .ok_or(l_out_of_bounds)?;
        if p_image.source_addr.checked_add(p_image.length).is_none() {
            return Err(l_out_of_bounds);
        }

        let l_region = self.internal.region();
        if p_image.dest_addr < l_region.start || l_end > l_region.end {
            return Err(l_out_of_bounds);
        }
        if let Some(l_firmware) = &self.firmware {
            if p_image.dest_addr < l_firmware.end && l_firmware.start < l_end {
                return Err(FlashImageOverlapsFirmware(p_image.dest_addr));
            }
        }

        Ok(p_image.dest_addr..l_end)
    }

    /// Flashes `p_image`.
    ///
    /// # Errors
    /// - Geometry errors from [`SelfFlashingLoader::covered_range`], detected before anything
    ///   is erased.
    /// - [`crate::KernelError::ExternalStorageNotResponding`] if the storage does not answer, also before
    ///   anything is erased.
    /// - [`crate::KernelError::EraseFailed`] or [`crate::KernelError::TransferFailed`] with the
    ///   failing address and the driver error, [`crate::KernelError::VerifyFailed`] when the
    ///   read back data differs. The program memory content is then undefined.
    pub fn run(&mut self, p_image: &FlashImage, p_trace: &mut dyn TraceOutput) -> KernelResult<()> {
        let l_covered = self.covered_range(p_image)?;
        self.external
            .check_responding()
            .map_err(|_| ExternalStorageNotResponding)?;

        console_write(
            p_trace,
            &ConsoleFormatting::StrNewLineAfter(
                format!(
                    100;
                    "Self-flashing {} bytes from 0x{:08X} to 0x{:08X}...",
                    p_image.length,
                    p_image.source_addr,
                    p_image.dest_addr
                )
                .unwrap_or_default()
                .as_str(),
            ),
        );

        let l_granularity = self.internal.erase_granularity();
        let l_image_end = p_image.dest_addr + p_image.length;
        let mut l_addr = l_covered.start;
        while l_addr < l_covered.end {
            let l_unit = match l_granularity.small {
                Some(l_small)
                    if l_addr % l_granularity.block != 0
                        || l_covered.end - l_addr < l_granularity.block =>
                {
                    l_small
                }
                _ => l_granularity.block,
            };

            self.internal
                .erase(l_addr, l_unit)
                .map_err(|l_err| EraseFailed(l_addr, l_err))?;
            if self.verbose {
                console_write(
                    p_trace,
                    &ConsoleFormatting::StrNewLineAfter(
                        format!(60; "  erased 0x{:08X} ({} bytes)", l_addr, l_unit)
                            .unwrap_or_default()
                            .as_str(),
                    ),
                );
            }

            let l_fill_end = (l_addr + l_unit).min(l_image_end);
            self.program(p_image, l_addr..l_fill_end)?;
            l_addr += l_unit;
        }

        console_write(
            p_trace,
            &ConsoleFormatting::StrNewLineAfter("Self-flashing done."),
        );
        Ok(())
    }

    /// Copies the source bytes of `p_dest` (a part of the destination range) and verifies them.
    fn program(&mut self, p_image: &FlashImage, p_dest: Range<u32>) -> KernelResult<()> {
        let mut l_buf = [0u8; K_TRANSFER_CHUNK];
        let mut l_check = [0u8; K_TRANSFER_CHUNK];

        let mut l_addr = p_dest.start;
        while l_addr < p_dest.end {
            let l_len = ((p_dest.end - l_addr) as usize).min(K_TRANSFER_CHUNK);
            let l_src = p_image.source_addr + (l_addr - p_image.dest_addr);

            self.external
                .read(l_src, &mut l_buf[..l_len])
                .map_err(|l_err| TransferFailed(l_addr, l_err))?;
            self.internal
                .write(l_addr, &l_buf[..l_len])
                .map_err(|l_err| TransferFailed(l_addr, l_err))?;
            self.internal
                .read(l_addr, &mut l_check[..l_len])
                .map_err(|l_err| TransferFailed(l_addr, l_err))?;
            if l_buf[..l_len] != l_check[..l_len] {
                return Err(VerifyFailed(l_addr));
            }

            l_addr += l_len as u32;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_interface::{EraseGranularity, HalError, HalResult};
    use std::string::String as StdString;
    use std::vec::Vec as StdVec;

    const K_BLANK: u8 = 0xFF;

    struct FakeSpiFlash {
        base: u32,
        data: StdVec<u8>,
        responding: bool,
        reads: usize,
        fail_read_at: Option<u32>,
    }

    impl FakeSpiFlash {
        fn with_pattern(p_base: u32, p_len: usize) -> FakeSpiFlash {
            FakeSpiFlash {
                base: p_base,
                data: (0..p_len).map(|l_i| (l_i * 7 + 3) as u8).collect(),
                responding: true,
                reads: 0,
                fail_read_at: None,
            }
        }
    }

    impl ExternalStorage for FakeSpiFlash {
        fn check_responding(&mut self) -> HalResult<()> {
            if self.responding {
                Ok(())
            } else {
                Err(HalError::DeviceNotResponding("SPIFLASH"))
            }
        }

        fn read(&mut self, p_addr: u32, p_buf: &mut [u8]) -> HalResult<()> {
            self.reads += 1;
            if self.fail_read_at == Some(p_addr) {
                return Err(HalError::ReadError("QSPI", p_addr));
            }
            let l_off = (p_addr - self.base) as usize;
            p_buf.copy_from_slice(&self.data[l_off..l_off + p_buf.len()]);
            Ok(())
        }
    }

    struct FakeIntFlash {
        base: u32,
        mem: StdVec<u8>,
        granularity: EraseGranularity,
        erased: StdVec<(u32, u32)>,
        written: StdVec<u32>,
        fail_erase_at: Option<u32>,
        fail_write_at: Option<u32>,
        stuck_bit_at: Option<u32>,
    }

    impl FakeIntFlash {
        fn new(p_base: u32, p_size: usize, p_granularity: EraseGranularity) -> FakeIntFlash {
            FakeIntFlash {
                base: p_base,
                mem: vec![0x5A; p_size],
                granularity: p_granularity,
                erased: StdVec::new(),
                written: StdVec::new(),
                fail_erase_at: None,
                fail_write_at: None,
                stuck_bit_at: None,
            }
        }

        fn slice(&self, p_range: Range<u32>) -> &[u8] {
            &self.mem[(p_range.start - self.base) as usize..(p_range.end - self.base) as usize]
        }
    }

    impl ProgramMemory for FakeIntFlash {
        fn region(&self) -> Range<u32> {
            self.base..self.base + self.mem.len() as u32
        }

        fn erase_granularity(&self) -> EraseGranularity {
            self.granularity
        }

        fn erase(&mut self, p_addr: u32, p_size: u32) -> HalResult<()> {
            if self.fail_erase_at == Some(p_addr) {
                return Err(HalError::EraseError("INTFLASH", p_addr));
            }
            assert_eq!(p_addr % p_size, 0, "erase must be aligned");
            self.erased.push((p_addr, p_size));
            let l_off = (p_addr - self.base) as usize;
            self.mem[l_off..l_off + p_size as usize].fill(K_BLANK);
            Ok(())
        }

        fn write(&mut self, p_addr: u32, p_data: &[u8]) -> HalResult<()> {
            if self.fail_write_at == Some(p_addr) {
                return Err(HalError::WriteError("INTFLASH", p_addr));
            }
            self.written.push(p_addr);
            let l_off = (p_addr - self.base) as usize;
            for (l_i, l_byte) in p_data.iter().enumerate() {
                let l_cell = &mut self.mem[l_off + l_i];
                assert_eq!(*l_cell, K_BLANK, "write to non-erased location");
                *l_cell = *l_byte;
                if self.stuck_bit_at == Some(p_addr + l_i as u32) {
                    *l_cell |= 0x01;
                    *l_cell ^= 0x80;
                }
            }
            Ok(())
        }

        fn read(&mut self, p_addr: u32, p_buf: &mut [u8]) -> HalResult<()> {
            let l_off = (p_addr - self.base) as usize;
            p_buf.copy_from_slice(&self.mem[l_off..l_off + p_buf.len()]);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Capture(StdString);

    impl TraceOutput for Capture {
        fn write_str(&mut self, p_str: &str) {
            self.0.push_str(p_str);
        }
    }

    const K_SPI_BASE: u32 = 0x0010_0000;
    const K_INT_BASE: u32 = 0x0800_0000;

    fn uniform_4k() -> EraseGranularity {
        EraseGranularity {
            block: 0x1000,
            small: None,
        }
    }

    #[test]
    fn destination_equals_source_and_nothing_else_changes() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x4000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x8000, uniform_4k());
        let l_image = FlashImage {
            source_addr: K_SPI_BASE + 0x1000,
            dest_addr: K_INT_BASE + 0x2000,
            length: 0x3000,
        };
        let mut l_trace = Capture::default();

        SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .run(&l_image, &mut l_trace)
            .unwrap();

        assert_eq!(
            l_int.slice(l_image.destination_range()),
            &l_spi.data[0x1000..0x4000]
        );
        assert!(l_int.slice(K_INT_BASE..K_INT_BASE + 0x2000).iter().all(|l_b| *l_b == 0x5A));
        assert!(l_int.slice(K_INT_BASE + 0x5000..K_INT_BASE + 0x8000).iter().all(|l_b| *l_b == 0x5A));
        assert_eq!(
            l_int.erased,
            [
                (K_INT_BASE + 0x2000, 0x1000),
                (K_INT_BASE + 0x3000, 0x1000),
                (K_INT_BASE + 0x4000, 0x1000)
            ]
        );
        assert!(l_trace.0.contains("Self-flashing 12288 bytes from 0x00101000 to 0x08002000"));
        assert!(l_trace.0.ends_with("Self-flashing done.\r\n"));
    }

    #[test]
    fn large_blocks_used_when_aligned_small_sectors_for_the_rest() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x3_0000);
        let mut l_int = FakeIntFlash::new(
            K_INT_BASE,
            0x4_0000,
            EraseGranularity {
                block: 0x1_0000,
                small: Some(0x1000),
            },
        );
        // Starts 3 sectors before a 64K boundary, spans one full block, ends with 2 sectors.
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE + 0xD000,
            length: 0x3000 + 0x1_0000 + 0x2000,
        };
        let mut l_trace = Capture::default();

        SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .with_verbose(true)
            .run(&l_image, &mut l_trace)
            .unwrap();

        assert_eq!(
            l_int.erased,
            [
                (K_INT_BASE + 0xD000, 0x1000),
                (K_INT_BASE + 0xE000, 0x1000),
                (K_INT_BASE + 0xF000, 0x1000),
                (K_INT_BASE + 0x1_0000, 0x1_0000),
                (K_INT_BASE + 0x2_0000, 0x1000),
                (K_INT_BASE + 0x2_1000, 0x1000),
            ]
        );
        assert_eq!(
            l_int.slice(l_image.destination_range()),
            &l_spi.data[..l_image.length as usize]
        );
        assert!(l_trace.0.contains("  erased 0x08010000 (65536 bytes)"));
    }

    #[test]
    fn partial_last_unit_is_erased_and_written() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x2000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x4000, uniform_4k());
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0x1100,
        };
        let mut l_trace = Capture::default();

        let mut l_loader = SelfFlashingLoader::new(&mut l_spi, &mut l_int);
        assert_eq!(
            l_loader.covered_range(&l_image),
            Ok(K_INT_BASE..K_INT_BASE + 0x2000)
        );
        l_loader.run(&l_image, &mut l_trace).unwrap();

        assert_eq!(l_int.slice(l_image.destination_range()), &l_spi.data[..0x1100]);
        assert!(
            l_int
                .slice(K_INT_BASE + 0x1100..K_INT_BASE + 0x2000)
                .iter()
                .all(|l_b| *l_b == K_BLANK)
        );
        assert!(l_int.slice(K_INT_BASE + 0x2000..K_INT_BASE + 0x4000).iter().all(|l_b| *l_b == 0x5A));
    }

    #[test]
    fn silent_storage_fails_before_any_erase() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x1000);
        l_spi.responding = false;
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x4000, uniform_4k());
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0x1000,
        };

        let l_res = SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .run(&l_image, &mut Capture::default());

        assert_eq!(l_res, Err(ExternalStorageNotResponding));
        assert!(l_int.erased.is_empty());
        assert_eq!(l_spi.reads, 0);
    }

    #[test]
    fn geometry_errors_are_detected_up_front() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x1000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x4000, uniform_4k());
        let l_loader = SelfFlashingLoader::new(&mut l_spi, &mut l_int);

        let l_empty = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0,
        };
        assert_eq!(l_loader.covered_range(&l_empty), Err(FlashImageEmpty));

        let l_unaligned = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE + 0x800,
            length: 0x100,
        };
        assert_eq!(
            l_loader.covered_range(&l_unaligned),
            Err(FlashImageUnaligned(K_INT_BASE + 0x800))
        );

        let l_too_long = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE + 0x3000,
            length: 0x1001,
        };
        assert_eq!(
            l_loader.covered_range(&l_too_long),
            Err(FlashImageOutOfBounds(K_INT_BASE + 0x3000, 0x1001))
        );
    }

    #[test]
    fn erase_failure_reports_the_block() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x3000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x4000, uniform_4k());
        l_int.fail_erase_at = Some(K_INT_BASE + 0x1000);
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0x3000,
        };

        let l_res = SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .run(&l_image, &mut Capture::default());

        assert_eq!(
            l_res,
            Err(EraseFailed(
                K_INT_BASE + 0x1000,
                HalError::EraseError("INTFLASH", K_INT_BASE + 0x1000)
            ))
        );
        assert_eq!(l_int.erased, [(K_INT_BASE, 0x1000)]);
    }

    #[test]
    fn readback_mismatch_is_reported() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x1000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x2000, uniform_4k());
        l_int.stuck_bit_at = Some(K_INT_BASE + 0x123);
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0x1000,
        };

        let l_res = SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .run(&l_image, &mut Capture::default());

        // The corrupted byte lives in the second 256-byte chunk.
        assert_eq!(l_res, Err(VerifyFailed(K_INT_BASE + 0x100)));
    }

    #[test]
    fn external_read_failure_stops_at_the_failing_chunk() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x1000);
        l_spi.fail_read_at = Some(K_SPI_BASE + 0x200);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x2000, uniform_4k());
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0x1000,
        };

        let l_res = SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .run(&l_image, &mut Capture::default());

        assert_eq!(
            l_res,
            Err(TransferFailed(
                K_INT_BASE + 0x200,
                HalError::ReadError("QSPI", K_SPI_BASE + 0x200)
            ))
        );
        assert_eq!(l_spi.reads, 3);
        assert_eq!(l_int.written, [K_INT_BASE, K_INT_BASE + 0x100]);
        assert!(
            l_res
                .unwrap_err()
                .to_string()
                .contains("Read error on QSPI at 0x00100200")
        );
    }

    #[test]
    fn internal_write_failure_stops_at_the_failing_chunk() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x2000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x4000, uniform_4k());
        l_int.fail_write_at = Some(K_INT_BASE + 0x100);
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE,
            length: 0x2000,
        };

        let l_res = SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .run(&l_image, &mut Capture::default());

        assert_eq!(
            l_res,
            Err(TransferFailed(
                K_INT_BASE + 0x100,
                HalError::WriteError("INTFLASH", K_INT_BASE + 0x100)
            ))
        );
        assert_eq!(l_int.written, [K_INT_BASE]);
        assert_eq!(l_spi.reads, 2);
        // The second erase unit is never touched.
        assert_eq!(l_int.erased, [(K_INT_BASE, 0x1000)]);
    }

    #[test]
    fn destination_overlapping_the_firmware_is_refused() {
        let mut l_spi = FakeSpiFlash::with_pattern(K_SPI_BASE, 0x2000);
        let mut l_int = FakeIntFlash::new(K_INT_BASE, 0x8000, uniform_4k());
        let l_image = FlashImage {
            source_addr: K_SPI_BASE,
            dest_addr: K_INT_BASE + 0x3000,
            length: 0x2000,
        };

        let mut l_loader = SelfFlashingLoader::new(&mut l_spi, &mut l_int)
            .with_firmware_region(Some(K_INT_BASE..K_INT_BASE + 0x4000));
        assert_eq!(
            l_loader.run(&l_image, &mut Capture::default()),
            Err(FlashImageOverlapsFirmware(K_INT_BASE + 0x3000))
        );

        let l_after_firmware = FlashImage {
            dest_addr: K_INT_BASE + 0x4000,
            ..l_image
        };
        assert_eq!(
            l_loader.covered_range(&l_after_firmware),
            Ok(K_INT_BASE + 0x4000..K_INT_BASE + 0x6000)
        );
        drop(l_loader);

        assert!(l_int.erased.is_empty());
        assert_eq!(l_spi.reads, 0);
    }
}
