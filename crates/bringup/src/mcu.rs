//! Cortex-M7 core control.

use cortex_m::peripheral::{DCB, DWT, SCB};
use hal_interface::{ClockRequest, Cpu, HalError, HalResult, TickSource};

use crate::bindings;

unsafe extern "C" {
    /// Start of the vector table, defined by the `cortex-m-rt` linker script.
    static __vector_table: u32;
}

/// CP10 and CP11 full access bits in CPACR.
const K_CPACR_FPU_FULL_ACCESS: u32 = 0xF << 20;

pub struct Mcu {
    scb: SCB,
    dcb: DCB,
    dwt: DWT,
}

impl Mcu {
    pub fn new(p_scb: SCB, p_dcb: DCB, p_dwt: DWT) -> Mcu {
        Mcu {
            scb: p_scb,
            dcb: p_dcb,
            dwt: p_dwt,
        }
    }
}

impl Cpu for Mcu {
    fn preinit(&mut self) {
        unsafe { bindings::mcu_preinit() }
    }

    fn runtime_init(&mut self) {
        // Rust statics are already set up by cortex-m-rt, only the drivers' own remain
        unsafe { bindings::drivers_static_init() }
    }

    fn install_vector_table(&mut self) {
        unsafe {
            self.scb
                .vtor
                .write(core::ptr::addr_of!(__vector_table) as u32);
        }
        cortex_m::asm::dsb();
    }

    fn configure_clock(&mut self, p_request: ClockRequest) -> HalResult<u32> {
        match p_request {
            ClockRequest::Fixed(l_hz) => Ok(l_hz),
            ClockRequest::Crystal { xtal, target } => {
                if unsafe { bindings::hwclk_init(xtal, target) } {
                    Ok(unsafe { bindings::hwclk_core_speed() })
                } else {
                    Err(HalError::ClockNotStarted(target))
                }
            }
        }
    }

    fn enable_fpu(&mut self) {
        unsafe {
            self.scb.cpacr.modify(|l_r| l_r | K_CPACR_FPU_FULL_ACCESS);
        }
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    fn enable_icache(&mut self) {
        self.scb.enable_icache();
    }

    fn start_tick_source(&mut self) {
        self.dcb.enable_trace();
        DWT::unlock();
        self.dwt.enable_cycle_counter();
    }

    fn enable_interrupts(&mut self) {
        unsafe { cortex_m::interrupt::enable() }
    }

    fn disable_interrupts(&mut self) {
        cortex_m::interrupt::disable();
    }
}

/// DWT cycle counter, 32 bits wide, counting core clock cycles.
#[derive(Debug, Clone, Copy)]
pub struct DwtTicks;

impl TickSource for DwtTicks {
    #[inline]
    fn ticks(&self) -> u32 {
        DWT::cycle_count()
    }
}
