//! This module defines the `HalError` and `HalErrorLevel` enumerations and their associated
//! functionality. It provides a structured way to represent errors reported by the board
//! drivers (clock controller, SPI flash, internal flash controller) with different severity
//! levels and format them for the trace output.

use crate::HalError::{
    ClockNotStarted, DeviceNotResponding, EraseError, InterfaceBadConfig, ReadError, WriteError,
};
use crate::HalErrorLevel::{Critical, Error, Fatal};
use heapless::{String, format};

pub type HalResult<T> = Result<T, HalError>;

/// Represents the severity levels of hardware abstraction layer (HAL) errors.
///
/// # Variants
///
/// - `Fatal`
///   The system cannot go on: wrong clock or a damaged program image.
///
/// - `Critical`
///   A peripheral is unusable but the rest of the system may still run.
///
/// - `Error`
///   A single operation failed and may succeed later.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalErrorLevel {
    Fatal,
    Critical,
    Error,
}

impl HalErrorLevel {
    /// Converts the `HalErrorLevel` enum variant into a corresponding string slice representation.
    ///
    /// # Returns
    ///
    /// - `"HAL Fatal error : "` for `HalErrorLevel::Fatal` variant.
    /// - `"HAL Critical error : "` for `HalErrorLevel::Critical` variant.
    /// - `"HAL Error : "` for `HalErrorLevel::Error` variant.
    pub fn as_str(&self) -> &str {
        match self {
            Fatal => "HAL Fatal error : ",
            Critical => "HAL Critical error : ",
            Error => "HAL Error : ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The oscillator or PLL did not lock at the requested frequency (Hz).
    ClockNotStarted(u32),
    /// A device did not answer its identification request.
    DeviceNotResponding(&'static str),
    /// Erase of the block at the given address failed.
    EraseError(&'static str, u32),
    /// Programming at the given address failed.
    WriteError(&'static str, u32),
    /// Reading at the given address failed.
    ReadError(&'static str, u32),
    /// The driver rejected the configuration of an interface.
    InterfaceBadConfig(&'static str, &'static str),
}

impl HalError {
    /// Converts the error into a formatted string representation with a maximum size of 256
    /// characters, prefixed by its severity.
    ///
    /// Capacity overflows are ignored so formatting an error can never fail while the system
    /// is already handling one.
    pub fn to_string(&self) -> String<256> {
        let mut l_msg = String::new();
        l_msg.push_str(self.severity().as_str()).unwrap_or(());
        match self {
            ClockNotStarted(l_hz) => {
                l_msg
                    .push_str(
                        format!(60; "Clock did not start at {} Hz", l_hz)
                            .unwrap_or_default()
                            .as_str(),
                    )
                    .unwrap_or(());
            }
            DeviceNotResponding(l_name) => {
                l_msg
                    .push_str(
                        format!(60; "Device {} is not responding", l_name)
                            .unwrap_or_default()
                            .as_str(),
                    )
                    .unwrap_or(());
            }
            EraseError(l_name, l_addr) => {
                l_msg
                    .push_str(
                        format!(80; "Erase error on {} at 0x{:08X}", l_name, l_addr)
                            .unwrap_or_default()
                            .as_str(),
                    )
                    .unwrap_or(());
            }
            WriteError(l_name, l_addr) => {
                l_msg
                    .push_str(
                        format!(80; "Write error on {} at 0x{:08X}", l_name, l_addr)
                            .unwrap_or_default()
                            .as_str(),
                    )
                    .unwrap_or(());
            }
            ReadError(l_name, l_addr) => {
                l_msg
                    .push_str(
                        format!(80; "Read error on {} at 0x{:08X}", l_name, l_addr)
                            .unwrap_or_default()
                            .as_str(),
                    )
                    .unwrap_or(());
            }
            InterfaceBadConfig(l_ift, l_err) => {
                l_msg
                    .push_str(
                        format!(200; "Wrong configuration for interface {}: {}", l_ift, l_err)
                            .unwrap_or_default()
                            .as_str(),
                    )
                    .unwrap_or(());
            }
        }
        l_msg
    }

    /// Returns the severity level of the `HalError` instance.
    pub fn severity(&self) -> HalErrorLevel {
        match self {
            ClockNotStarted(_) => Fatal,
            DeviceNotResponding(_) => Critical,
            EraseError(_, _) => Critical,
            WriteError(_, _) => Critical,
            ReadError(_, _) => Error,
            InterfaceBadConfig(_, _) => Critical,
        }
    }
}
