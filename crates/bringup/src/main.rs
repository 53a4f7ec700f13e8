#![no_std]
#![no_main]

//! Bring-up firmware entry point.
//!
//! Boots the MCU, installs the image from the QSPI flash when the loader asked for it, then runs
//! the peripheral test tasks forever.

mod bench;
mod bindings;
mod board;
mod console;
mod flash;
mod interrupts;
mod mcu;

use core::ops::Range;

use cortex_m_rt::entry;
use hal_interface::ClockRequest;
use kernel::{
    BootConfig, BootPlatform, ClockCounter, CooperativeScheduler, FlashDevices, FlashImage,
};
use kernel_apps::{K_TEST_TASK_COUNT, TestApps, TestAppsConfig};

use crate::bench::TestBench;
use crate::board::Board;
use crate::console::Console;
use crate::flash::{IntFlash, SpiFlash};
use crate::mcu::{DwtTicks, Mcu};

const K_EXTERNAL_XTAL_HZ: u32 = 25_000_000;
const K_MCU_CLOCK_SPEED: u32 = 216_000_000;

/// Application image stored at the start of the QSPI flash.
const K_FLASH_IMAGE: FlashImage = FlashImage {
    source_addr: 0x0000_0000,
    dest_addr: 0x0804_0000,
    length: 0x0004_0000,
};

unsafe extern "C" {
    /// RAM mailbox written by the loader, see `config/memory.x`.
    static mut __self_flashing_request: u32;
    /// Bounds of the flash area the firmware is linked into.
    static __firmware_flash_start: u8;
    static __firmware_flash_end: u8;
}

/// Flash range holding this firmware, as placed by the linker.
fn firmware_region() -> Range<u32> {
    let l_start = core::ptr::addr_of!(__firmware_flash_start) as u32;
    let l_end = core::ptr::addr_of!(__firmware_flash_end) as u32;
    l_start..l_end
}

/// Reads and clears the self-flashing request left by the loader.
fn take_self_flashing_request() -> u32 {
    unsafe {
        let l_mailbox = core::ptr::addr_of_mut!(__self_flashing_request);
        let l_request = core::ptr::read_volatile(l_mailbox);
        core::ptr::write_volatile(l_mailbox, 0);
        l_request
    }
}

#[entry]
fn main() -> ! {
    let l_self_flashing = take_self_flashing_request();

    let Some(l_core) = cortex_m::Peripherals::take() else {
        panic!("core peripherals already taken");
    };
    let mut l_mcu = Mcu::new(l_core.SCB, l_core.DCB, l_core.DWT);
    let mut l_board = Board::new();
    let mut l_console = Console;
    let mut l_spi_flash = SpiFlash;
    let mut l_int_flash = IntFlash;

    let l_report = kernel::boot(
        BootPlatform {
            cpu: &mut l_mcu,
            board: &mut l_board,
            trace: &mut l_console,
            flash: Some(FlashDevices {
                external: &mut l_spi_flash,
                internal: &mut l_int_flash,
            }),
        },
        BootConfig {
            app_name: "Peripheral Bring-up Test",
            clock: ClockRequest::Crystal {
                xtal: K_EXTERNAL_XTAL_HZ,
                target: K_MCU_CLOCK_SPEED,
            },
            flash_image: Some(K_FLASH_IMAGE),
            verbose_flashing: true,
            firmware_region: Some(firmware_region()),
        },
        l_self_flashing,
    );

    let mut l_bench = TestBench {
        board: l_board,
        console: l_console,
    };
    let mut l_apps = TestApps::new(&l_bench.board, l_report.core_clock, TestAppsConfig::default());
    l_apps.init(&mut l_bench);

    let l_clock = ClockCounter::new(DwtTicks);
    let mut l_scheduler: CooperativeScheduler<TestBench, K_TEST_TASK_COUNT> =
        CooperativeScheduler::new();
    if let Err(l_err) = l_apps.register(&mut l_scheduler, l_clock.now()) {
        kernel::fatal_halt(&l_err);
    }

    l_scheduler.run(&l_clock, &mut l_bench)
}
