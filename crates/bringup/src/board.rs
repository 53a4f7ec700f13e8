//! STM32F769I-DISCO board wiring.

use hal_interface::{
    AdcChannelMap, AdcReader, BoardConfig, ExtIrqController, GpioWriteAction, HalResult,
    HexDisplay, IrqEdge, IrqHandler, K_ADC_MAP_STM32F769_DISCO, PinId, PinMode, StatusLeds,
};

use crate::bindings;
use crate::interrupts;

const K_PORT_A: u8 = 0;
const K_PORT_J: u8 = 9;

/// User LEDs LD1 (green), LD2 (green) and LD3 (red).
const K_LED_PINS: [PinId; 3] = [
    PinId::new(K_PORT_J, 13),
    PinId::new(K_PORT_J, 5),
    PinId::new(K_PORT_A, 12),
];

const K_ADC_CHANNELS: AdcChannelMap = K_ADC_MAP_STM32F769_DISCO;

/// Blue user button, external pull-down.
const K_EXT_IRQ_PIN: PinId = PinId::new(K_PORT_A, 0);

#[derive(Default)]
pub struct Board {
    adc_rate: u32,
}

impl Board {
    pub fn new() -> Board {
        Board { adc_rate: 0 }
    }
}

fn pin_setup(p_pin: PinId, p_mode: PinMode) {
    unsafe { bindings::pin_setup(p_pin.port, p_pin.pin, bindings::pin_flags(p_mode)) }
}

impl BoardConfig for Board {
    fn name(&self) -> &'static str {
        "STM32F769I-DISCO"
    }

    fn setup_pins(&mut self) {
        unsafe { bindings::board_pins_init() }

        for l_pin in K_LED_PINS {
            pin_setup(l_pin, PinMode::Output { initial_high: false });
        }
        for l_pin in K_ADC_CHANNELS.pins.into_iter().flatten() {
            pin_setup(l_pin, PinMode::Analog);
        }
        pin_setup(K_EXT_IRQ_PIN, PinMode::Input { pull_up: false });
    }

    fn adc_channels(&self) -> AdcChannelMap {
        K_ADC_CHANNELS
    }

    fn ext_irq_pin(&self) -> Option<PinId> {
        Some(K_EXT_IRQ_PIN)
    }
}

impl StatusLeds for Board {
    fn led_count(&self) -> usize {
        K_LED_PINS.len()
    }

    fn led_write(&mut self, p_index: usize, p_action: GpioWriteAction) {
        if let Some(l_pin) = K_LED_PINS.get(p_index) {
            unsafe { bindings::gpio_write(l_pin.port, l_pin.pin, p_action) }
        }
    }
}

impl HexDisplay for Board {
    fn show_hexnum(&mut self, p_value: u32) {
        unsafe { bindings::board_show_hexnum(p_value) }
    }
}

impl AdcReader for Board {
    fn init(&mut self, p_adc_num: u8, p_channel_mask: u32) {
        self.adc_rate = unsafe { bindings::adc_init(p_adc_num, p_channel_mask) };
    }

    fn channel_value(&mut self, p_channel: u8) -> u16 {
        unsafe { bindings::adc_channel_value(p_channel) }
    }

    fn conversion_rate(&self) -> u32 {
        self.adc_rate
    }
}

impl ExtIrqController for Board {
    fn configure(
        &mut self,
        p_pin: PinId,
        p_edge: IrqEdge,
        p_handler: IrqHandler,
    ) -> HalResult<()> {
        let l_edges = match p_edge {
            IrqEdge::Rising => 0b01,
            IrqEdge::Falling => 0b10,
            IrqEdge::Both => 0b11,
        };
        unsafe { bindings::extirq_setup(p_pin.port, p_pin.pin, l_edges) }.to_result("EXTI", 0)?;
        interrupts::attach_ext_irq(p_pin, p_handler);
        Ok(())
    }
}
