//! Entry points of the native `drivers` library.

use hal_interface::{GpioWriteAction, HalError, HalResult, PinMode};

/// Result codes returned by the native drivers.
#[repr(u8)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverResult {
    /// Operation successful.
    OK = 0,
    /// The device did not answer its identification command.
    ErrNotResponding = 1,
    /// The peripheral cannot be configured as requested.
    ErrBadConfig = 2,
    /// Sector erase failed.
    ErrErase = 3,
    /// Programming failed.
    ErrWrite = 4,
    /// Transfer from the device failed.
    ErrRead = 5,
}

impl DriverResult {
    /// Maps a driver result code to a [`HalResult`].
    ///
    /// `p_interface` names the peripheral in the error, `p_addr` is the address of the failed
    /// access for storage devices.
    pub fn to_result(self, p_interface: &'static str, p_addr: u32) -> HalResult<()> {
        match self {
            DriverResult::OK => Ok(()),
            DriverResult::ErrNotResponding => Err(HalError::DeviceNotResponding(p_interface)),
            DriverResult::ErrBadConfig => Err(HalError::InterfaceBadConfig(
                p_interface,
                "rejected by the driver",
            )),
            DriverResult::ErrErase => Err(HalError::EraseError(p_interface, p_addr)),
            DriverResult::ErrWrite => Err(HalError::WriteError(p_interface, p_addr)),
            DriverResult::ErrRead => Err(HalError::ReadError(p_interface, p_addr)),
        }
    }
}

/// Pin controller flags.
pub const K_PIN_OUTPUT: u32 = 1 << 0;
pub const K_PIN_INPUT: u32 = 1 << 1;
pub const K_PIN_ANALOG: u32 = 1 << 2;
pub const K_PIN_PULLUP: u32 = 1 << 8;
pub const K_PIN_GPIO_SET: u32 = 1 << 9;

/// Pin controller flags for `p_mode`.
pub fn pin_flags(p_mode: PinMode) -> u32 {
    match p_mode {
        PinMode::Output { initial_high } => {
            K_PIN_OUTPUT | if initial_high { K_PIN_GPIO_SET } else { 0 }
        }
        PinMode::Input { pull_up } => K_PIN_INPUT | if pull_up { K_PIN_PULLUP } else { 0 },
        PinMode::Analog => K_PIN_ANALOG,
    }
}

unsafe extern "C" {
    pub fn mcu_preinit();

    /// Runs the static initializers of the driver library.
    pub fn drivers_static_init();

    /// Starts the PLL from the `p_xtal_hz` crystal, or from the internal RC oscillator when it is 0.
    pub fn hwclk_init(p_xtal_hz: u32, p_target_hz: u32) -> bool;

    pub fn hwclk_core_speed() -> u32;

    /// Configures the console UART, QSPI and other fixed function pins.
    pub fn board_pins_init();

    pub fn board_show_hexnum(p_value: u32);

    pub fn pin_setup(p_port: u8, p_pin: u8, p_flags: u32);

    pub fn gpio_write(p_port: u8, p_pin: u8, p_action: GpioWriteAction);

    pub fn uart_write(p_data: *const u8, p_len: usize);

    /// Starts free run conversions and returns the measured conversion rate.
    pub fn adc_init(p_adc_num: u8, p_channel_mask: u32) -> u32;

    pub fn adc_channel_value(p_channel: u8) -> u16;

    /// Routes `p_port`.`p_pin` to its EXTI line with the given edge (bit 0 rising, bit 1 falling).
    pub fn extirq_setup(p_port: u8, p_pin: u8, p_edges: u8) -> DriverResult;

    pub fn extirq_ack(p_pin: u8);

    pub fn spiflash_init() -> DriverResult;

    pub fn spiflash_read(p_addr: u32, p_dst: *mut u8, p_len: u32) -> DriverResult;

    pub fn intflash_erase(p_addr: u32, p_len: u32) -> DriverResult;

    pub fn intflash_write(p_addr: u32, p_src: *const u8, p_len: u32) -> DriverResult;
}
