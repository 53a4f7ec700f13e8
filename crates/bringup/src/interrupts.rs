use core::cell::Cell;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::NVIC;
use hal_interface::{IrqHandler, PinId};
use stm32f7::stm32f769::{Interrupt, interrupt};

use crate::bindings;

/// Pin and handler of the armed external interrupt line.
static G_EXT_IRQ: Mutex<Cell<Option<(PinId, IrqHandler)>>> = Mutex::new(Cell::new(None));

/// NVIC line serving EXTI input `p_pin`.
fn exti_line(p_pin: u8) -> Interrupt {
    match p_pin {
        0 => Interrupt::EXTI0,
        1 => Interrupt::EXTI1,
        2 => Interrupt::EXTI2,
        3 => Interrupt::EXTI3,
        4 => Interrupt::EXTI4,
        5..=9 => Interrupt::EXTI9_5,
        _ => Interrupt::EXTI15_10,
    }
}

/// Attaches `p_handler` to the EXTI line of `p_pin` and unmasks it.
pub fn attach_ext_irq(p_pin: PinId, p_handler: IrqHandler) {
    cortex_m::interrupt::free(|l_cs| G_EXT_IRQ.borrow(l_cs).set(Some((p_pin, p_handler))));
    unsafe { NVIC::unmask(exti_line(p_pin.pin)) }
}

fn dispatch_ext_irq() {
    let l_attached = cortex_m::interrupt::free(|l_cs| G_EXT_IRQ.borrow(l_cs).get());
    if let Some((l_pin, l_handler)) = l_attached {
        unsafe { bindings::extirq_ack(l_pin.pin) }
        l_handler();
    }
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI0() {
    dispatch_ext_irq();
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI1() {
    dispatch_ext_irq();
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI2() {
    dispatch_ext_irq();
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI3() {
    dispatch_ext_irq();
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI4() {
    dispatch_ext_irq();
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI9_5() {
    dispatch_ext_irq();
}

#[allow(non_snake_case)]
#[interrupt]
fn EXTI15_10() {
    dispatch_ext_irq();
}
