//! One-shot bootstrap state machine executed at reset.
//!
//! Stages are visited strictly in order and never revisited:
//!
//! `Reset -> McuPreinit -> RuntimeInit -> VectorTableInstalled -> ClockConfigured ->
//! CoprocessorEnabled -> TickSourceStarted -> BoardConfigured -> [SelfFlashed] ->
//! InterruptsEnabled -> SchedulerRunning`
//!
//! Any failure moves the machine to the terminal `Halted` state instead. A clock failure stops
//! everything: every later stage depends on a known core frequency.

use crate::console_output::{ConsoleFormatting, console_write};
use crate::errors_mgt::fatal_halt;
use crate::self_flashing::{FlashImage, SelfFlashingLoader};
use crate::{Hertz, KernelError, publish_core_clock};
use hal_interface::{BoardConfig, ClockRequest, Cpu, ExternalStorage, ProgramMemory, TraceOutput};
use core::ops::Range;
use heapless::{Vec, format};

/// Number of states a boot can visit, `Reset` and the terminal state included.
const K_BOOT_HISTORY_LEN: usize = 12;

/// Boot stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Reset,
    McuPreinit,
    RuntimeInit,
    VectorTableInstalled,
    ClockConfigured,
    CoprocessorEnabled,
    TickSourceStarted,
    BoardConfigured,
    SelfFlashed,
    InterruptsEnabled,
    SchedulerRunning,
    /// Terminal failure state. The system never leaves it.
    Halted(KernelError),
}

impl BootState {
    pub fn name(&self) -> &'static str {
        match self {
            BootState::Reset => "RESET",
            BootState::McuPreinit => "MCU_PREINIT",
            BootState::RuntimeInit => "RUNTIME_INIT",
            BootState::VectorTableInstalled => "VECTOR_TABLE_INSTALLED",
            BootState::ClockConfigured => "CLOCK_CONFIGURED",
            BootState::CoprocessorEnabled => "COPROCESSOR_ENABLED",
            BootState::TickSourceStarted => "TICK_SOURCE_STARTED",
            BootState::BoardConfigured => "BOARD_CONFIGURED",
            BootState::SelfFlashed => "SELF_FLASHED",
            BootState::InterruptsEnabled => "INTERRUPTS_ENABLED",
            BootState::SchedulerRunning => "SCHEDULER_RUNNING",
            BootState::Halted(_) => "HALTED",
        }
    }

    /// `true` for the states the machine never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootState::SchedulerRunning | BootState::Halted(_))
    }
}

/// Configuration parameters for the boot process.
#[derive(Debug, Clone)]
pub struct BootConfig {
    /// Application title printed in the boot banner.
    pub app_name: &'static str,
    /// Clock tree configuration.
    pub clock: ClockRequest,
    /// Image to flash when the boot entry requests self-flashing.
    pub flash_image: Option<FlashImage>,
    /// Traces every erased block during self-flashing.
    pub verbose_flashing: bool,
    /// Program memory occupied by the running firmware. Self-flashing refuses to erase it.
    pub firmware_region: Option<Range<u32>>,
}

/// External and internal storages used by self-flashing.
pub struct FlashDevices<'a> {
    pub external: &'a mut dyn ExternalStorage,
    pub internal: &'a mut dyn ProgramMemory,
}

/// Hardware services the boot sequence drives.
pub struct BootPlatform<'a> {
    pub cpu: &'a mut dyn Cpu,
    pub board: &'a mut dyn BoardConfig,
    pub trace: &'a mut dyn TraceOutput,
    /// `None` on boards without self-flashing support.
    pub flash: Option<FlashDevices<'a>>,
}

/// Result of a completed boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    /// Resolved core clock, also published process wide.
    pub core_clock: Hertz,
    /// `true` if an image was flashed during this boot.
    pub self_flashed: bool,
}

/// The bootstrap state machine.
pub struct Bootstrap<'a> {
    platform: BootPlatform<'a>,
    config: BootConfig,
    self_flash_requested: bool,
    state: BootState,
    core_clock: Hertz,
    history: Vec<BootState, K_BOOT_HISTORY_LEN>,
}

impl<'a> Bootstrap<'a> {
    /// Creates the machine in the `Reset` state.
    ///
    /// # Parameters
    /// - `p_self_flashing`: the boot entry argument. Any non-zero value requests self-flashing.
    pub fn new(
        p_platform: BootPlatform<'a>,
        p_config: BootConfig,
        p_self_flashing: u32,
    ) -> Bootstrap<'a> {
        let mut l_history = Vec::new();
        l_history.push(BootState::Reset).unwrap_or(());
        Bootstrap {
            platform: p_platform,
            config: p_config,
            self_flash_requested: p_self_flashing != 0,
            state: BootState::Reset,
            core_clock: Hertz(0),
            history: l_history,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    /// Every state visited so far, in order.
    pub fn history(&self) -> &[BootState] {
        &self.history
    }

    /// Core clock resolved at `ClockConfigured`, zero before.
    pub fn core_clock(&self) -> Hertz {
        self.core_clock
    }

    /// Performs the next transition and returns the new state.
    ///
    /// Terminal states are left unchanged.
    pub fn step(&mut self) -> BootState {
        if self.state.is_terminal() {
            return self.state;
        }

        let l_next = self.transition();
        self.state = l_next;
        // Capacity covers the longest path, the push cannot fail.
        self.history.push(l_next).unwrap_or(());

        if self.trace_ready() {
            self.trace_state(l_next);
        }
        l_next
    }

    /// Steps until `SchedulerRunning` or `Halted`.
    pub fn run(&mut self) -> BootState {
        while !self.state.is_terminal() {
            self.step();
        }
        self.state
    }

    fn transition(&mut self) -> BootState {
        let l_cpu = &mut *self.platform.cpu;
        match self.state {
            BootState::Reset => {
                l_cpu.disable_interrupts();
                l_cpu.preinit();
                BootState::McuPreinit
            }
            BootState::McuPreinit => {
                l_cpu.runtime_init();
                BootState::RuntimeInit
            }
            BootState::RuntimeInit => {
                l_cpu.install_vector_table();
                BootState::VectorTableInstalled
            }
            BootState::VectorTableInstalled => match l_cpu.configure_clock(self.config.clock) {
                Ok(l_hz) if l_hz != 0 => {
                    self.core_clock = Hertz(l_hz);
                    publish_core_clock(self.core_clock);
                    BootState::ClockConfigured
                }
                _ => BootState::Halted(KernelError::ClockConfigFailed(
                    self.config.clock.target_hz(),
                )),
            },
            BootState::ClockConfigured => {
                l_cpu.enable_fpu();
                l_cpu.enable_icache();
                BootState::CoprocessorEnabled
            }
            BootState::CoprocessorEnabled => {
                l_cpu.start_tick_source();
                BootState::TickSourceStarted
            }
            BootState::TickSourceStarted => {
                self.platform.board.setup_pins();
                self.print_banner();
                BootState::BoardConfigured
            }
            BootState::BoardConfigured => {
                if self.self_flash_requested {
                    if let Some(l_next) = self.self_flash() {
                        return l_next;
                    }
                }
                self.enable_interrupts()
            }
            BootState::SelfFlashed => self.enable_interrupts(),
            BootState::InterruptsEnabled => BootState::SchedulerRunning,
            BootState::SchedulerRunning | BootState::Halted(_) => self.state,
        }
    }

    fn enable_interrupts(&mut self) -> BootState {
        self.platform.cpu.enable_interrupts();
        BootState::InterruptsEnabled
    }

    /// Runs the loader if the board and the configuration allow it.
    ///
    /// Returns `None` when self-flashing is skipped.
    fn self_flash(&mut self) -> Option<BootState> {
        let (Some(l_devices), Some(l_image)) =
            (self.platform.flash.as_mut(), self.config.flash_image)
        else {
            console_write(
                self.platform.trace,
                &ConsoleFormatting::StrNewLineAfter(
                    "Self-flashing requested but not supported by this board, skipped.",
                ),
            );
            return None;
        };

        let l_res = SelfFlashingLoader::new(&mut *l_devices.external, &mut *l_devices.internal)
            .with_verbose(self.config.verbose_flashing)
            .with_firmware_region(self.config.firmware_region.clone())
            .run(&l_image, self.platform.trace);
        Some(match l_res {
            Ok(()) => BootState::SelfFlashed,
            Err(l_err) => BootState::Halted(l_err),
        })
    }

    /// The trace output is usable once the board pins are configured.
    fn trace_ready(&self) -> bool {
        self.history.contains(&BootState::BoardConfigured)
    }

    fn print_banner(&mut self) {
        let l_trace = &mut *self.platform.trace;
        console_write(
            l_trace,
            &ConsoleFormatting::StrNewLineBoth("--------------------------------------"),
        );
        console_write(
            l_trace,
            &ConsoleFormatting::StrNewLineAfter(self.config.app_name),
        );
        console_write(
            l_trace,
            &ConsoleFormatting::StrNewLineAfter(
                format!(60; "Board: {}", self.platform.board.name())
                    .unwrap_or_default()
                    .as_str(),
            ),
        );
        console_write(
            l_trace,
            &ConsoleFormatting::StrNewLineAfter(
                format!(60; "SystemCoreClock: {}", self.core_clock.to_u32())
                    .unwrap_or_default()
                    .as_str(),
            ),
        );
    }

    fn trace_state(&mut self, p_state: BootState) {
        let l_line = match p_state {
            BootState::Halted(l_err) => {
                format!(300; "[boot] {} : {}", p_state.name(), l_err.to_string().as_str())
            }
            _ => format!(300; "[boot] {}", p_state.name()),
        };
        console_write(
            self.platform.trace,
            &ConsoleFormatting::StrNewLineAfter(l_line.unwrap_or_default().as_str()),
        );
    }
}

/// Runs the boot sequence to completion.
///
/// On success control returns to the caller, which hands it to the scheduler. On failure the
/// system halts and this function never returns.
pub fn boot(p_platform: BootPlatform, p_config: BootConfig, p_self_flashing: u32) -> BootReport {
    let mut l_boot = Bootstrap::new(p_platform, p_config, p_self_flashing);
    match l_boot.run() {
        BootState::Halted(l_err) => fatal_halt(&l_err),
        _ => BootReport {
            core_clock: l_boot.core_clock(),
            self_flashed: l_boot.history().contains(&BootState::SelfFlashed),
        },
    }
}
