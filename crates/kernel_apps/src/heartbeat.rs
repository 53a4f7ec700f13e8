use hal_interface::{GpioWriteAction, HexDisplay, StatusLeds};
use kernel::{Hertz, TaskAction, TaskControl};

/// Number of fast blinks before the heartbeat slows down.
pub const K_FAST_BLINKS: u32 = 20;

/// Heartbeat: blinks the status LEDs and shows the blink counter on the hex display.
///
/// Starts fast so a fresh boot is easy to spot, then switches for good to the slow rate once
/// [`K_FAST_BLINKS`] blinks are done. When another task owns the hex display, the heartbeat only
/// drives the LEDs.
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    fast_period: u32,
    slow_period: u32,
    hex_display: bool,
}

impl Heartbeat {
    /// Fast rate is 20 Hz (`clock / 20` ticks), slow rate is 2 Hz (`clock / 2` ticks).
    pub fn new(p_clock: Hertz) -> Heartbeat {
        Heartbeat {
            fast_period: p_clock.ticks_per(20),
            slow_period: p_clock.ticks_per(2),
            hex_display: true,
        }
    }

    /// Leaves the hex display to another task.
    pub fn without_hex_display(mut self) -> Heartbeat {
        self.hex_display = false;
        self
    }

    /// Period to register the task with.
    pub fn initial_period(&self) -> u32 {
        self.fast_period
    }
}

impl<C: StatusLeds + HexDisplay> TaskAction<C> for Heartbeat {
    fn run(&mut self, p_ctl: &mut TaskControl, p_ctx: &mut C) {
        let l_count = p_ctl.fire_count();

        // LED n shows bit n of the counter, a single LED simply toggles
        for l_n in 0..p_ctx.led_count() {
            let l_on = l_n < 32 && (l_count >> l_n) & 1 == 1;
            p_ctx.led_write(l_n, GpioWriteAction::from_state(l_on));
        }
        if self.hex_display {
            p_ctx.show_hexnum(l_count);
        }

        if l_count > K_FAST_BLINKS {
            p_ctl.set_period(self.slow_period);
        }
    }
}
