#![cfg_attr(not(test), no_std)]

//! Contracts between the bring-up core and the board drivers.
//!
//! The drivers themselves (clock controller, pin controller, ADC, SPI flash, UART) live outside
//! of this workspace. This crate only describes what the core needs from them.

mod board;
mod cpu;
mod errors;
mod interface_read;
mod interface_write;
mod storage;

pub use board::{
    AdcChannelMap, BoardConfig, K_ADC_MAP_ATSAM, K_ADC_MAP_SAME70_XPLAINED,
    K_ADC_MAP_STM32_MIN, K_ADC_MAP_STM32_NUCLEO, K_ADC_MAP_STM32F303, K_ADC_MAP_STM32F769_DISCO,
    PinMode,
};
pub use cpu::{ClockRequest, Cpu};
pub use errors::{HalError, HalErrorLevel, HalResult};
pub use interface_read::{AdcReader, TickSource};
pub use interface_write::{
    ExtIrqController, GpioWriteAction, HexDisplay, IrqEdge, IrqHandler, PinId, StatusLeds,
    TraceOutput,
};
pub use storage::{EraseGranularity, ExternalStorage, ProgramMemory};
