//! Deadline based cooperative scheduler.
//!
//! A fixed, ordered list of timed tasks is evaluated against the [`ClockCounter`] in an endless
//! polling loop. A task fires when strictly more than its period elapsed since its last fire.
//! Tasks run to completion: a long task delays all the others.

use crate::KernelError::TaskListFull;
use crate::KernelResult;
use crate::clock_counter::{ClockCounter, ClockTick};
use hal_interface::TickSource;
use heapless::Vec;

/// Scheduler owned state of a task, handed to the task action at every dispatch.
///
/// The action may change its own period, which takes effect for the next deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskControl {
    period: u32,
    fire_count: u32,
}

impl TaskControl {
    pub fn new(p_period: u32) -> TaskControl {
        TaskControl {
            period: p_period,
            fire_count: 0,
        }
    }

    /// Current period in ticks.
    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn set_period(&mut self, p_period: u32) {
        self.period = p_period;
    }

    /// Number of dispatches so far, the current one included.
    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }
}

/// Body of a timed task.
///
/// `C` is the context shared by all the tasks of a scheduler (peripheral services).
pub trait TaskAction<C> {
    fn run(&mut self, p_ctl: &mut TaskControl, p_ctx: &mut C);
}

impl<C> TaskAction<C> for fn(&mut TaskControl, &mut C) {
    fn run(&mut self, p_ctl: &mut TaskControl, p_ctx: &mut C) {
        self(p_ctl, p_ctx)
    }
}

/// A registered task: deadline bookkeeping plus the action to dispatch.
pub struct TimedTask<'a, C> {
    name: &'static str,
    last_fire: ClockTick,
    control: TaskControl,
    action: &'a mut dyn TaskAction<C>,
}

impl<C> TimedTask<'_, C> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn last_fire(&self) -> ClockTick {
        self.last_fire
    }

    pub fn control(&self) -> &TaskControl {
        &self.control
    }
}

/// Cooperative scheduler with room for `N` tasks.
pub struct CooperativeScheduler<'a, C, const N: usize> {
    tasks: Vec<TimedTask<'a, C>, N>,
}

impl<'a, C, const N: usize> Default for CooperativeScheduler<'a, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, C, const N: usize> CooperativeScheduler<'a, C, N> {
    pub fn new() -> CooperativeScheduler<'a, C, N> {
        CooperativeScheduler { tasks: Vec::new() }
    }

    /// Registers a task. Tasks are evaluated in registration order.
    ///
    /// `p_now` is the baseline of the first deadline: the task first fires once more than
    /// `p_period` ticks elapsed after it.
    ///
    /// # Errors
    /// Returns [`crate::KernelError::TaskListFull`] when the `N` slots are used.
    pub fn add_task(
        &mut self,
        p_name: &'static str,
        p_period: u32,
        p_action: &'a mut dyn TaskAction<C>,
        p_now: ClockTick,
    ) -> KernelResult<()> {
        self.tasks
            .push(TimedTask {
                name: p_name,
                last_fire: p_now,
                control: TaskControl::new(p_period),
                action: p_action,
            })
            .map_err(|_| TaskListFull(p_name))
    }

    pub fn tasks(&self) -> &[TimedTask<'a, C>] {
        &self.tasks
    }

    /// Runs one iteration of the loop over every task, in order.
    ///
    /// # Returns
    /// The number of tasks dispatched during this iteration.
    pub fn poll<T: TickSource>(&mut self, p_clock: &ClockCounter<T>, p_ctx: &mut C) -> usize {
        let mut l_fired = 0;
        for l_task in self.tasks.iter_mut() {
            let l_now = p_clock.now();
            if p_clock.has_elapsed(l_task.last_fire, l_now, l_task.control.period) {
                l_task.control.fire_count = l_task.control.fire_count.wrapping_add(1);
                l_task.action.run(&mut l_task.control, p_ctx);
                l_task.last_fire = l_now;
                l_fired += 1;
            }
        }
        l_fired
    }

    /// Polls forever. There is no shutdown path.
    pub fn run<T: TickSource>(mut self, p_clock: &ClockCounter<T>, p_ctx: &mut C) -> ! {
        loop {
            self.poll(p_clock, p_ctx);
        }
    }
}
