use crate::KernelError::{
    ClockConfigFailed, EraseFailed, ExternalStorageNotResponding, FlashImageEmpty,
    FlashImageOutOfBounds, FlashImageOverlapsFirmware, FlashImageUnaligned, TaskListFull,
    TransferFailed, VerifyFailed,
};
use crate::KernelErrorLevel::{Critical, Error, Fatal};
use hal_interface::HalError;
use heapless::{String, format};

pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Debug, Clone, Copy, PartialOrd, PartialEq, Eq)]
pub enum KernelErrorLevel {
    Error,
    Critical,
    Fatal,
}

impl KernelErrorLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Fatal => "Fatal error : ",
            Critical => "Critical error : ",
            Error => "Error : ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The clock tree could not reach the requested frequency (Hz).
    ClockConfigFailed(u32),
    ExternalStorageNotResponding,
    FlashImageEmpty,
    /// Destination address is not aligned on an erase unit.
    FlashImageUnaligned(u32),
    /// Destination address and length do not fit in program memory.
    FlashImageOutOfBounds(u32, u32),
    /// Destination range starting at the given address overlaps the running firmware.
    FlashImageOverlapsFirmware(u32),
    /// Erase of the unit at the given address failed, with the driver's error.
    EraseFailed(u32, HalError),
    /// Copy of the chunk at the given destination address failed, with the driver's error.
    TransferFailed(u32, HalError),
    /// Read back data differs from the source in the chunk at the given address.
    VerifyFailed(u32),
    TaskListFull(&'static str),
}

impl KernelError {
    pub fn to_string(&self) -> String<256> {
        let mut l_msg = String::new();
        l_msg.push_str(self.severity().as_str()).unwrap_or(());
        let l_detail: String<200> = match self {
            ClockConfigFailed(l_hz) => {
                format!(200; "Clock configuration failed, requested {} Hz", l_hz)
                    .unwrap_or_default()
            }
            ExternalStorageNotResponding => {
                format!(200; "External storage is not responding").unwrap_or_default()
            }
            FlashImageEmpty => format!(200; "Flash image is empty").unwrap_or_default(),
            FlashImageUnaligned(l_addr) => format!(
                200;
                "Flash image destination 0x{:08X} is not aligned on an erase block",
                l_addr
            )
            .unwrap_or_default(),
            FlashImageOutOfBounds(l_addr, l_len) => format!(
                200;
                "Flash image of {} bytes at 0x{:08X} does not fit in program memory",
                l_len,
                l_addr
            )
            .unwrap_or_default(),
            FlashImageOverlapsFirmware(l_addr) => format!(
                200;
                "Flash image destination 0x{:08X} overlaps the running firmware",
                l_addr
            )
            .unwrap_or_default(),
            EraseFailed(l_addr, l_cause) => format!(
                200;
                "Erase failed at 0x{:08X} ({})",
                l_addr,
                l_cause.to_string().as_str()
            )
            .unwrap_or_default(),
            TransferFailed(l_addr, l_cause) => format!(
                200;
                "Image transfer failed at 0x{:08X} ({})",
                l_addr,
                l_cause.to_string().as_str()
            )
            .unwrap_or_default(),
            VerifyFailed(l_addr) => {
                format!(200; "Image verification failed at 0x{:08X}", l_addr).unwrap_or_default()
            }
            TaskListFull(l_name) => {
                format!(200; "Cannot add task {} : task list is full", l_name).unwrap_or_default()
            }
        };
        l_msg.push_str(l_detail.as_str()).unwrap_or(());
        l_msg
    }

    /// Returns the severity level of the kernel error.
    ///
    /// Anything that leaves the clock or the program image in an unknown state is fatal.
    pub fn severity(&self) -> KernelErrorLevel {
        match self {
            ClockConfigFailed(_) => Fatal,
            ExternalStorageNotResponding => Fatal,
            FlashImageEmpty => Fatal,
            FlashImageUnaligned(_) => Fatal,
            FlashImageOutOfBounds(_, _) => Fatal,
            FlashImageOverlapsFirmware(_) => Fatal,
            EraseFailed(_, _) => Fatal,
            TransferFailed(_, _) => Fatal,
            VerifyFailed(_) => Fatal,
            TaskListFull(_) => Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_failures_are_fatal() {
        for l_err in [
            ClockConfigFailed(216_000_000),
            ExternalStorageNotResponding,
            EraseFailed(0x0800_0000, HalError::EraseError("INTFLASH", 0x0800_0000)),
            TransferFailed(0x0800_0000, HalError::ReadError("QSPI", 0)),
            VerifyFailed(0x0800_0000),
        ] {
            assert_eq!(l_err.severity(), Fatal);
        }
        assert_eq!(TaskListFull("adc").severity(), Critical);
    }

    #[test]
    fn driver_cause_is_kept_in_the_message() {
        let l_err = TransferFailed(0x0804_0100, HalError::ReadError("QSPI", 0x100));
        assert_eq!(
            l_err.to_string().as_str(),
            "Fatal error : Image transfer failed at 0x08040100 \
             (HAL Error : Read error on QSPI at 0x00000100)"
        );
    }

    #[test]
    fn message_formats_addresses_in_hex() {
        assert_eq!(
            VerifyFailed(0x0801_0000).to_string().as_str(),
            "Fatal error : Image verification failed at 0x08010000"
        );
    }
}
