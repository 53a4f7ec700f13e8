use crate::HalResult;

/// Represents possible actions on a GPIO pin.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioWriteAction {
    /// Set the pin to a high state.
    Set = 0,
    /// Set the pin to a low state.
    Clear = 1,
    /// Toggle the pin state.
    Toggle = 2,
}

impl GpioWriteAction {
    /// Action driving a pin to `p_state`.
    pub fn from_state(p_state: bool) -> GpioWriteAction {
        if p_state {
            GpioWriteAction::Set
        } else {
            GpioWriteAction::Clear
        }
    }
}

/// The status LEDs of the board.
pub trait StatusLeds {
    /// Number of LEDs wired on the board.
    fn led_count(&self) -> usize;

    /// Applies `p_action` to LED number `p_index`. Out of range indexes are ignored.
    fn led_write(&mut self, p_index: usize, p_action: GpioWriteAction);
}

/// Numeric status display (seven segment or memory mapped hex register).
pub trait HexDisplay {
    fn show_hexnum(&mut self, p_value: u32);
}

/// Sink for human readable trace text (UART console or semihosting).
pub trait TraceOutput {
    fn write_str(&mut self, p_str: &str);
}

/// Edge selection of an external interrupt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqEdge {
    Rising,
    Falling,
    Both,
}

/// Interrupt handler type for external IRQ lines.
pub type IrqHandler = fn();

/// External interrupt controller driver.
pub trait ExtIrqController {
    /// Routes `p_pin` to an external interrupt line, attaches `p_handler` and enables it.
    ///
    /// # Errors
    /// Returns an error if the pin cannot be routed to an interrupt line.
    fn configure(&mut self, p_pin: PinId, p_edge: IrqEdge, p_handler: IrqHandler)
    -> HalResult<()>;
}

/// GPIO port and pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinId {
    pub port: u8,
    pub pin: u8,
}

impl PinId {
    pub const fn new(p_port: u8, p_pin: u8) -> PinId {
        PinId {
            port: p_port,
            pin: p_pin,
        }
    }
}
