//! Board configuration selected once at startup.

use crate::PinId;

/// Pin configuration flags forwarded to the pin controller driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output { initial_high: bool },
    Input { pull_up: bool },
    Analog,
}

/// ADC unit and the two channels sampled by the ADC test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcChannelMap {
    pub adc_num: u8,
    pub ch_x: u8,
    pub ch_y: u8,
    /// Pins switched to analog mode before the ADC is started. Some parts switch automatically.
    pub pins: [Option<PinId>; 2],
}

impl AdcChannelMap {
    /// Channel enable mask passed to the ADC driver.
    pub fn channel_mask(&self) -> u32 {
        (1 << self.ch_x) | (1 << self.ch_y)
    }
}

const K_PORT_A: u8 = 0;
const K_PORT_C: u8 = 2;

/// STM32F103/F401/F411/F405/G473 minimal boards: ADC1 IN0 (PA0) and IN1 (PA1).
pub const K_ADC_MAP_STM32_MIN: AdcChannelMap = AdcChannelMap {
    adc_num: 1,
    ch_x: 0,
    ch_y: 1,
    pins: [Some(PinId::new(K_PORT_A, 0)), Some(PinId::new(K_PORT_A, 1))],
};

/// STM32F303: PA0 and PA1 are ADC1 IN1 and IN2 on this part.
pub const K_ADC_MAP_STM32F303: AdcChannelMap = AdcChannelMap {
    adc_num: 1,
    ch_x: 1,
    ch_y: 2,
    pins: [Some(PinId::new(K_PORT_A, 0)), Some(PinId::new(K_PORT_A, 1))],
};

/// Nucleo-144 and Nucleo-64 STM32 boards: ADC123 IN3 (PA3) and IN10 (PC0).
pub const K_ADC_MAP_STM32_NUCLEO: AdcChannelMap = AdcChannelMap {
    adc_num: 1,
    ch_x: 3,
    ch_y: 10,
    pins: [Some(PinId::new(K_PORT_A, 3)), Some(PinId::new(K_PORT_C, 0))],
};

/// STM32F769I-DISCO Arduino A0 (PA6, ADC1 IN6) and A1 (PA4, ADC1 IN4).
pub const K_ADC_MAP_STM32F769_DISCO: AdcChannelMap = AdcChannelMap {
    adc_num: 1,
    ch_x: 6,
    ch_y: 4,
    pins: [Some(PinId::new(K_PORT_A, 6)), Some(PinId::new(K_PORT_A, 4))],
};

/// Arduino Due and ATSAM4S boards: ADC channels 0 and 1, pins switch to analog on enabling.
pub const K_ADC_MAP_ATSAM: AdcChannelMap = AdcChannelMap {
    adc_num: 0,
    ch_x: 0,
    ch_y: 1,
    pins: [None, None],
};

/// SAME70 Xplained: AFEC0 AD0 (PD30) and AD8 (PA19).
pub const K_ADC_MAP_SAME70_XPLAINED: AdcChannelMap = AdcChannelMap {
    adc_num: 0,
    ch_x: 0,
    ch_y: 8,
    pins: [None, None],
};

/// Board specific pin and channel assignments.
pub trait BoardConfig {
    fn name(&self) -> &'static str;

    /// Configures every pin the test tasks use (LEDs, SPI, analog inputs).
    fn setup_pins(&mut self);

    fn adc_channels(&self) -> AdcChannelMap;

    /// Input pin used by the external interrupt test, if the board wires one.
    fn ext_irq_pin(&self) -> Option<PinId>;
}
