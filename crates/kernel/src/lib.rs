#![cfg_attr(not(test), no_std)]

//! Bring-up core: boot sequence, self-flashing and cooperative scheduling on top of a free
//! running cycle counter.

mod boot;
mod clock_counter;
mod console_output;
mod errors_mgt;
mod scheduler;
mod self_flashing;
mod types;

pub use boot::{BootConfig, BootPlatform, BootReport, BootState, Bootstrap, FlashDevices, boot};
pub use clock_counter::{
    ClockCounter, ClockTick, elapsed_between, publish_core_clock, system_core_clock,
};
pub use console_output::{ConsoleFormatting, console_write};
pub use errors_mgt::fatal_halt;
pub use scheduler::{CooperativeScheduler, TaskAction, TaskControl, TimedTask};
pub use self_flashing::{FlashImage, SelfFlashingLoader};
pub use types::*;
