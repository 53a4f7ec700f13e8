use hal_interface::{
    AdcReader, ExtIrqController, GpioWriteAction, HalResult, HexDisplay, IrqEdge, IrqHandler,
    PinId, StatusLeds, TraceOutput,
};

use crate::board::Board;
use crate::console::Console;

/// Everything the test tasks drive once the boot sequence is over.
pub struct TestBench {
    pub board: Board,
    pub console: Console,
}

impl StatusLeds for TestBench {
    fn led_count(&self) -> usize {
        self.board.led_count()
    }

    fn led_write(&mut self, p_index: usize, p_action: GpioWriteAction) {
        self.board.led_write(p_index, p_action);
    }
}

impl HexDisplay for TestBench {
    fn show_hexnum(&mut self, p_value: u32) {
        self.board.show_hexnum(p_value);
    }
}

impl AdcReader for TestBench {
    fn init(&mut self, p_adc_num: u8, p_channel_mask: u32) {
        self.board.init(p_adc_num, p_channel_mask);
    }

    fn channel_value(&mut self, p_channel: u8) -> u16 {
        self.board.channel_value(p_channel)
    }

    fn conversion_rate(&self) -> u32 {
        self.board.conversion_rate()
    }
}

impl ExtIrqController for TestBench {
    fn configure(
        &mut self,
        p_pin: PinId,
        p_edge: IrqEdge,
        p_handler: IrqHandler,
    ) -> HalResult<()> {
        self.board.configure(p_pin, p_edge, p_handler)
    }
}

impl TraceOutput for TestBench {
    fn write_str(&mut self, p_str: &str) {
        self.console.write_str(p_str);
    }
}
