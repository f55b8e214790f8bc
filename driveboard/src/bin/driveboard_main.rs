#![no_std]
#![no_main]

use cortex_m::peripheral::NVIC;
use defmt::info;
use fugit::RateExtU32;
use rp2040_hal::gpio::FunctionUart;
use rp2040_hal::uart::{DataBits, StopBits, UartConfig};
use rp2040_hal::{
    clocks::{init_clocks_and_plls, Clock},
    entry, pac,
    pac::interrupt,
    sio::Sio,
    uart::UartPeripheral,
    watchdog::Watchdog,
    Timer,
};
use rp_pico::XOSC_CRYSTAL_FREQ;

use driveboard::bsp::config::{
    LASER_PWM_DIV, LASER_PWM_TOP, REVERT_X_DIRECTION, REVERT_Y_DIRECTION, REVERT_Z_DIRECTION, UART_BAUD_RATE,
};
use driveboard::bsp::{driveboard_uart_irq, stepper_timer_irq};
use driveboard::common::global_status::FLOW;
use driveboard::common::sense_control::BoardSense;
use driveboard::common::serial::{self, UartTransport};
use driveboard::common::stack_monitor::StackMonitor;
use driveboard::motion::engine::{self, MotionEngine};
use driveboard::motion::io::{AxisPins, MachineIo};
use driveboard::motion::planner::BlockPlanner;
use driveboard::motion::stepper::EngineStepper;
use driveboard::{
    air_assist, aux_assist, chiller, dir_x, dir_y, dir_z, door, driveboard_uart, laser_channel,
    laser_pwm, laser_pwm_slice, limit_x1, limit_x2, limit_y1, limit_y2, limit_z1, limit_z2,
    step_x, step_y, step_z, stepper_nEN, uart_rx, uart_tx,
};
use generic::config::{MachineConfig, FIRMWARE_VERSION};
use generic::protocol::Protocol;

#[entry]
fn main() -> ! {
    let stack = StackMonitor::paint();

    let mut pac = pac::Peripherals::take().unwrap();
    let sio = Sio::new(pac.SIO);
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let clocks = init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();
    let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let pins = rp2040_hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let uart_pins = (
        uart_tx!(pins).into_function::<FunctionUart>(),
        uart_rx!(pins).into_function::<FunctionUart>(),
    );
    let uart = UartPeripheral::new(driveboard_uart!(pac), uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(UART_BAUD_RATE.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();
    serial::install(uart);

    let pwm_slices = rp2040_hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut laser = laser_pwm_slice!(pwm_slices);
    laser.set_div_int(LASER_PWM_DIV);
    laser.set_top(LASER_PWM_TOP);
    laser.enable();
    laser_channel!(laser).output_to(laser_pwm!(pins));

    let io = MachineIo::new(
        [
            limit_x1!(pins).into_pull_up_input().into_dyn_pin(),
            limit_x2!(pins).into_pull_up_input().into_dyn_pin(),
            limit_y1!(pins).into_pull_up_input().into_dyn_pin(),
            limit_y2!(pins).into_pull_up_input().into_dyn_pin(),
            limit_z1!(pins).into_pull_up_input().into_dyn_pin(),
            limit_z2!(pins).into_pull_up_input().into_dyn_pin(),
        ],
        door!(pins).into_pull_up_input().into_dyn_pin(),
        chiller!(pins).into_pull_up_input().into_dyn_pin(),
        laser,
        air_assist!(pins).into_push_pull_output().into_dyn_pin(),
        aux_assist!(pins).into_push_pull_output().into_dyn_pin(),
    );
    let axes = [
        AxisPins::new(
            step_x!(pins).into_push_pull_output().into_dyn_pin(),
            dir_x!(pins).into_push_pull_output().into_dyn_pin(),
            REVERT_X_DIRECTION,
        ),
        AxisPins::new(
            step_y!(pins).into_push_pull_output().into_dyn_pin(),
            dir_y!(pins).into_push_pull_output().into_dyn_pin(),
            REVERT_Y_DIRECTION,
        ),
        AxisPins::new(
            step_z!(pins).into_push_pull_output().into_dyn_pin(),
            dir_z!(pins).into_push_pull_output().into_dyn_pin(),
            REVERT_Z_DIRECTION,
        ),
    ];
    let n_enable = stepper_nEN!(pins).into_push_pull_output().into_dyn_pin();
    let alarm = timer.alarm_0().unwrap();
    engine::install(MotionEngine::new(axes, n_enable, io, alarm));

    unsafe {
        NVIC::unmask(driveboard_uart_irq());
        NVIC::unmask(stepper_timer_irq());
    }

    info!("[DRIVEBOARD] firmware {} up", FIRMWARE_VERSION);
    serial::send_hello();

    let config = MachineConfig::default();
    let mut protocol = Protocol::new(
        config,
        &FLOW,
        BlockPlanner::new([0.0; 3]),
        EngineStepper::new(timer),
        UartTransport,
        BoardSense,
        stack,
    );
    protocol.run()
}

#[interrupt]
fn UART0_IRQ() {
    serial::on_uart_irq();
}

#[interrupt]
fn TIMER_IRQ_0() {
    engine::on_timer_irq();
}
