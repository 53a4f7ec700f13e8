//! External interrupt test.
//!
//! The handler only bumps an atomic counter. The task side watches that counter and, once the line
//! fired at least once, reports every change on the console, the LEDs and the hex display.

use core::sync::atomic::{AtomicU32, Ordering};

use hal_interface::{
    ExtIrqController, GpioWriteAction, HexDisplay, IrqEdge, IrqHandler, PinId, StatusLeds,
    TraceOutput,
};
use heapless::format;
use kernel::{ConsoleFormatting, TaskAction, TaskControl, console_write};

/// Number of falling edges seen on the test line since boot.
pub static G_EXT_IRQ_COUNT: AtomicU32 = AtomicU32::new(0);

/// Interrupt handler attached to the test line.
pub fn ext_irq_handler() {
    G_EXT_IRQ_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// What the task does once the line has been triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtIrqMode {
    /// Leaves the scheduler for good and runs the IRQ test sequence forever.
    #[default]
    Divergent,
    /// Reports the counter on each dispatch and returns to the scheduler.
    Returning,
}

pub struct ExtIrqTest {
    pin: Option<PinId>,
    mode: ExtIrqMode,
    counter: &'static AtomicU32,
    handler: IrqHandler,
    configured: bool,
    last_reported: u32,
}

impl ExtIrqTest {
    /// Test bound to [`G_EXT_IRQ_COUNT`] and [`ext_irq_handler`].
    pub fn new(p_pin: Option<PinId>, p_mode: ExtIrqMode) -> ExtIrqTest {
        ExtIrqTest::with_counter(p_pin, p_mode, &G_EXT_IRQ_COUNT, ext_irq_handler)
    }

    /// Test watching `p_counter`, which `p_handler` is expected to increment.
    pub fn with_counter(
        p_pin: Option<PinId>,
        p_mode: ExtIrqMode,
        p_counter: &'static AtomicU32,
        p_handler: IrqHandler,
    ) -> ExtIrqTest {
        ExtIrqTest {
            pin: p_pin,
            mode: p_mode,
            counter: p_counter,
            handler: p_handler,
            configured: false,
            last_reported: 0,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn configure<C: ExtIrqController + TraceOutput>(&mut self, p_ctx: &mut C) {
        // Only one attempt, a board without the line keeps the task idle
        self.configured = true;

        let Some(l_pin) = self.pin else {
            console_write(
                p_ctx,
                &ConsoleFormatting::StrNewLineAfter("No external IRQ pin on this board"),
            );
            return;
        };

        match p_ctx.configure(l_pin, IrqEdge::Falling, self.handler) {
            Ok(()) => {
                let l_line =
                    format!(60; "External IRQ armed on port {} pin {}", l_pin.port, l_pin.pin);
                console_write(
                    p_ctx,
                    &ConsoleFormatting::StrNewLineAfter(l_line.unwrap_or_default().as_str()),
                );
            }
            Err(l_err) => {
                console_write(
                    p_ctx,
                    &ConsoleFormatting::StrNewLineAfter(l_err.to_string().as_str()),
                );
                self.pin = None;
            }
        }
    }

    /// Reports the counter if it moved since the last report.
    pub fn service<C: TraceOutput + StatusLeds + HexDisplay>(&mut self, p_ctx: &mut C) {
        let l_count = self.counter.load(Ordering::Relaxed);
        if l_count == self.last_reported {
            return;
        }
        self.last_reported = l_count;

        let l_line = format!(40; "IRQ count: {}", l_count);
        console_write(
            p_ctx,
            &ConsoleFormatting::StrNewLineAfter(l_line.unwrap_or_default().as_str()),
        );

        for l_led in 0..p_ctx.led_count() {
            let l_bit = l_led < 32 && (l_count >> l_led) & 1 == 1;
            p_ctx.led_write(l_led, GpioWriteAction::from_state(l_bit));
        }
        p_ctx.show_hexnum(l_count);
    }

    /// IRQ test sequence, never gives control back.
    pub fn run_sequence<C: TraceOutput + StatusLeds + HexDisplay>(&mut self, p_ctx: &mut C) -> ! {
        console_write(
            p_ctx,
            &ConsoleFormatting::StrNewLineAfter("*** External IRQ test running ***"),
        );
        loop {
            self.service(p_ctx);
            core::hint::spin_loop();
        }
    }
}

impl<C> TaskAction<C> for ExtIrqTest
where
    C: ExtIrqController + TraceOutput + StatusLeds + HexDisplay,
{
    fn run(&mut self, _p_ctl: &mut TaskControl, p_ctx: &mut C) {
        if !self.configured {
            self.configure(p_ctx);
        }
        if self.pin.is_none() || self.counter.load(Ordering::Relaxed) == 0 {
            return;
        }

        match self.mode {
            ExtIrqMode::Divergent => self.run_sequence(p_ctx),
            ExtIrqMode::Returning => self.service(p_ctx),
        }
    }
}
