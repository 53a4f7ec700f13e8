use hal_interface::TraceOutput;

use crate::bindings;

/// Console UART.
pub struct Console;

impl TraceOutput for Console {
    fn write_str(&mut self, p_str: &str) {
        unsafe { bindings::uart_write(p_str.as_ptr(), p_str.len()) }
    }
}
