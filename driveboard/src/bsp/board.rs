// Pico based driveboard, 2 or 3 axis laser cutter.
use rp2040_hal::{
    gpio::{
        bank0::{Gpio0, Gpio1},
        DynPinId, FunctionSioInput, FunctionSioOutput, FunctionUart, Pin, PullDown, PullUp,
    },
    pac::{Interrupt, UART0},
    pwm::{FreeRunning, Pwm2, Slice},
    uart::{Enabled, UartPeripheral},
};

pub type DriveboardUartPins = (
    Pin<Gpio0, FunctionUart, PullDown>,
    Pin<Gpio1, FunctionUart, PullDown>,
);
pub type DriveboardUart = UartPeripheral<Enabled, UART0, DriveboardUartPins>;

pub type DriverPin = Pin<DynPinId, FunctionSioOutput, PullDown>;
pub type SensePin = Pin<DynPinId, FunctionSioInput, PullUp>;
pub type LaserPwm = Slice<Pwm2, FreeRunning>;

pub fn driveboard_uart_irq() -> Interrupt {
    Interrupt::UART0_IRQ
}

pub fn stepper_timer_irq() -> Interrupt {
    Interrupt::TIMER_IRQ_0
}

define_pins! {
    driveboard_uart, UART0,
    laser_pwm_slice, pwm2,
    laser_channel, channel_a
}

define_pins! {
    // host link
    uart_tx, gpio0,
    uart_rx, gpio1,

    // stepper drivers
    step_x, gpio2,
    dir_x, gpio3,
    step_y, gpio4,
    dir_y, gpio5,
    step_z, gpio6,
    dir_z, gpio7,
    stepper_nEN, gpio8,

    // limit switches, min/max per axis
    limit_x1, gpio10,
    limit_x2, gpio11,
    limit_y1, gpio12,
    limit_y2, gpio13,
    limit_z1, gpio14,
    limit_z2, gpio15,

    // interlocks
    door, gpio16,
    chiller, gpio17,

    // assists
    air_assist, gpio18,
    aux_assist, gpio19,

    // PWM2 A
    laser_pwm, gpio20
}
