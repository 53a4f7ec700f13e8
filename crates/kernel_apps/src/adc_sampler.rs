use hal_interface::{AdcChannelMap, AdcReader, HexDisplay, TraceOutput};
use heapless::format;
use kernel::{ConsoleFormatting, Hertz, TaskAction, TaskControl, console_write};

/// Default number of low order bits dropped from each sample: keeps the top 10 bits.
pub const K_DEFAULT_ADC_SHIFT: u8 = 6;

/// Default sampling rate, in reports per second.
pub const K_DEFAULT_SAMPLE_RATE: u32 = 20;

/// Drops the `p_shift` low order noise bits of a raw 16-bit sample.
pub fn reduce_sample(p_raw: u16, p_shift: u8) -> u16 {
    p_raw.checked_shr(p_shift as u32).unwrap_or(0)
}

/// Two channel ADC sampler reporting reduced values on the trace output and the hex display.
#[derive(Debug, Clone, Copy)]
pub struct AdcSampler {
    channels: AdcChannelMap,
    shift: u8,
    period: u32,
}

impl AdcSampler {
    pub fn new(p_channels: AdcChannelMap, p_shift: u8, p_clock: Hertz) -> AdcSampler {
        AdcSampler {
            channels: p_channels,
            shift: p_shift,
            period: p_clock.ticks_per(K_DEFAULT_SAMPLE_RATE),
        }
    }

    /// Sampling period in ticks.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Starts the converter on both channels and prints its conversion rate.
    pub fn init<C: AdcReader + TraceOutput>(&self, p_ctx: &mut C) {
        console_write(p_ctx, &ConsoleFormatting::StrNewLineAfter("Testing ADC"));
        p_ctx.init(self.channels.adc_num, self.channels.channel_mask());
        let l_line = format!(60; "ADC speed: {} conversions / s", p_ctx.conversion_rate());
        console_write(
            p_ctx,
            &ConsoleFormatting::StrNewLineAfter(l_line.unwrap_or_default().as_str()),
        );
        console_write(
            p_ctx,
            &ConsoleFormatting::StrNewLineAfter("*** ADC Test Freerun ***"),
        );
    }

    /// Reads both channels and returns the reduced `(x, y)` values.
    pub fn sample<C: AdcReader>(&self, p_ctx: &mut C) -> (u16, u16) {
        let l_x = reduce_sample(p_ctx.channel_value(self.channels.ch_x), self.shift);
        let l_y = reduce_sample(p_ctx.channel_value(self.channels.ch_y), self.shift);
        (l_x, l_y)
    }
}

impl<C: AdcReader + TraceOutput + HexDisplay> TaskAction<C> for AdcSampler {
    fn run(&mut self, _p_ctl: &mut TaskControl, p_ctx: &mut C) {
        let (l_x, l_y) = self.sample(p_ctx);

        let l_line = format!(40; "x: {:5}, y: {:5}", l_x, l_y);
        console_write(
            p_ctx,
            &ConsoleFormatting::StrOverwrite(l_line.unwrap_or_default().as_str()),
        );
        p_ctx.show_hexnum(((l_x as u32) << 16) | l_y as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::string::String;

    #[derive(Default)]
    struct Bench {
        values: HashMap<u8, u16>,
        started: Option<(u8, u32)>,
        console: String,
        hexnum: Option<u32>,
    }

    impl AdcReader for Bench {
        fn init(&mut self, p_adc_num: u8, p_channel_mask: u32) {
            self.started = Some((p_adc_num, p_channel_mask));
        }

        fn channel_value(&mut self, p_channel: u8) -> u16 {
            self.values.get(&p_channel).copied().unwrap_or(0)
        }

        fn conversion_rate(&self) -> u32 {
            125_000
        }
    }

    impl TraceOutput for Bench {
        fn write_str(&mut self, p_str: &str) {
            self.console.push_str(p_str);
        }
    }

    impl HexDisplay for Bench {
        fn show_hexnum(&mut self, p_value: u32) {
            self.hexnum = Some(p_value);
        }
    }

    fn nucleo_channels() -> AdcChannelMap {
        AdcChannelMap {
            adc_num: 1,
            ch_x: 3,
            ch_y: 10,
            pins: [None, None],
        }
    }

    #[test]
    fn full_scale_maps_to_ten_bits() {
        assert_eq!(reduce_sample(0xFFFF, 6), 0x3FF);
        assert_eq!(reduce_sample(0x0040, 6), 1);
        assert_eq!(reduce_sample(0x003F, 6), 0);
    }

    #[test]
    fn oversized_shift_yields_zero() {
        assert_eq!(reduce_sample(0xFFFF, 16), 0);
    }

    #[test]
    fn init_starts_both_channels() {
        let l_sampler = AdcSampler::new(nucleo_channels(), K_DEFAULT_ADC_SHIFT, Hertz(180_000_000));
        let mut l_bench = Bench::default();
        l_sampler.init(&mut l_bench);

        assert_eq!(l_bench.started, Some((1, (1 << 3) | (1 << 10))));
        assert!(l_bench.console.contains("ADC speed: 125000 conversions / s\r\n"));
        assert_eq!(l_sampler.period(), 9_000_000);
    }

    #[test]
    fn dispatch_reports_reduced_values() {
        let mut l_sampler =
            AdcSampler::new(nucleo_channels(), K_DEFAULT_ADC_SHIFT, Hertz(180_000_000));
        let mut l_bench = Bench::default();
        l_bench.values.insert(3, 0xFFFF);
        l_bench.values.insert(10, 0x8000);
        let mut l_ctl = TaskControl::new(l_sampler.period());

        l_sampler.run(&mut l_ctl, &mut l_bench);

        assert_eq!(l_bench.console, "\rx:  1023, y:   512");
        assert_eq!(l_bench.hexnum, Some(0x03FF_0200));
        assert_eq!(l_ctl.period(), 9_000_000);
    }

    proptest! {
        #[test]
        fn reported_value_is_raw_shifted(p_raw in any::<u16>(), p_shift in 0u8..16) {
            prop_assert_eq!(reduce_sample(p_raw, p_shift), p_raw >> p_shift);
        }
    }
}
