#![cfg_attr(not(test), no_std)]

//! Peripheral test tasks run by the bring-up scheduler.

use hal_interface::{
    AdcReader, BoardConfig, ExtIrqController, HexDisplay, StatusLeds, TraceOutput,
};
use kernel::{ClockTick, CooperativeScheduler, Hertz, KernelResult};

mod adc_sampler;
mod ext_irq;
mod heartbeat;

pub use adc_sampler::{AdcSampler, K_DEFAULT_ADC_SHIFT, K_DEFAULT_SAMPLE_RATE, reduce_sample};
pub use ext_irq::{ExtIrqMode, ExtIrqTest, G_EXT_IRQ_COUNT, ext_irq_handler};
pub use heartbeat::{Heartbeat, K_FAST_BLINKS};

/// Rate at which the external IRQ counter is polled, per second.
pub const K_EXT_IRQ_POLL_RATE: u32 = 100;

/// Number of scheduler slots used by [`TestApps`].
pub const K_TEST_TASK_COUNT: usize = 3;

/// Test tasks compiled into the firmware, in dispatch order.
pub const K_TEST_TASK_NAMES: [&str; K_TEST_TASK_COUNT] = ["heartbeat", "adc_sampler", "ext_irq"];

/// Which test tasks a firmware image starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestAppsConfig {
    pub heartbeat: bool,
    pub adc_sampler: bool,
    pub ext_irq: bool,
    pub ext_irq_mode: ExtIrqMode,
    pub adc_shift: u8,
}

impl Default for TestAppsConfig {
    fn default() -> TestAppsConfig {
        TestAppsConfig {
            heartbeat: true,
            adc_sampler: true,
            ext_irq: true,
            ext_irq_mode: ExtIrqMode::Divergent,
            adc_shift: K_DEFAULT_ADC_SHIFT,
        }
    }
}

/// Storage of the test tasks. The scheduler borrows them for its whole life.
pub struct TestApps {
    config: TestAppsConfig,
    clock: Hertz,
    heartbeat: Heartbeat,
    adc_sampler: AdcSampler,
    ext_irq: ExtIrqTest,
}

impl TestApps {
    /// The hex display belongs to the ADC sampler when it is enabled, to the heartbeat otherwise.
    pub fn new(p_board: &dyn BoardConfig, p_clock: Hertz, p_config: TestAppsConfig) -> TestApps {
        let mut l_heartbeat = Heartbeat::new(p_clock);
        if p_config.adc_sampler {
            l_heartbeat = l_heartbeat.without_hex_display();
        }

        TestApps {
            config: p_config,
            clock: p_clock,
            heartbeat: l_heartbeat,
            adc_sampler: AdcSampler::new(p_board.adc_channels(), p_config.adc_shift, p_clock),
            ext_irq: ExtIrqTest::new(p_board.ext_irq_pin(), p_config.ext_irq_mode),
        }
    }

    /// One time hardware setup of the enabled tasks, done before the scheduler starts.
    pub fn init<C: AdcReader + TraceOutput>(&self, p_ctx: &mut C) {
        if self.config.adc_sampler {
            self.adc_sampler.init(p_ctx);
        }
    }

    /// Registers the enabled tasks, in [`K_TEST_TASK_NAMES`] order.
    ///
    /// # Errors
    /// Returns [`kernel::KernelError::TaskListFull`] if the scheduler has no slot left.
    pub fn register<'a, C, const N: usize>(
        &'a mut self,
        p_scheduler: &mut CooperativeScheduler<'a, C, N>,
        p_now: ClockTick,
    ) -> KernelResult<()>
    where
        C: StatusLeds + HexDisplay + AdcReader + TraceOutput + ExtIrqController,
    {
        if self.config.heartbeat {
            let l_period = self.heartbeat.initial_period();
            p_scheduler.add_task("heartbeat", l_period, &mut self.heartbeat, p_now)?;
        }
        if self.config.adc_sampler {
            let l_period = self.adc_sampler.period();
            p_scheduler.add_task("adc_sampler", l_period, &mut self.adc_sampler, p_now)?;
        }
        if self.config.ext_irq {
            let l_period = self.clock.ticks_per(K_EXT_IRQ_POLL_RATE);
            p_scheduler.add_task("ext_irq", l_period, &mut self.ext_irq, p_now)?;
        }

        Ok(())
    }
}
