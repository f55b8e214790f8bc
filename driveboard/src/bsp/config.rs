use generic::{config, parameters};

config! {
    // limit switches pull their input low when hit
    LIMITS_ACTIVE_LOW: true,
    DOOR_OPEN_HIGH: true,
    CHILLER_OFF_HIGH: true,
    // stepper drivers are enabled on low
    STEPPER_N_EN: true,
    REVERT_X_DIRECTION: false,
    REVERT_Y_DIRECTION: false,
    REVERT_Z_DIRECTION: false,
}

parameters! {
    UART_BAUD_RATE: u32 = 57600,
    RX_BUFFER_SIZE: usize = 256,
    RASTER_BUFFER_SIZE: usize = 256,
    // the host waits for an ack after every chunk it sends
    TX_CHUNK_SIZE: u16 = 16,
    BLOCK_BUFFER_SIZE: usize = 16,
    STEPS_PER_MM: [f64; 3] = [32.80839895013123, 32.80839895013123, 32.80839895013123],
    STEP_PULSE_CYCLES: u32 = 250, // 2us at 125MHz
    HOMING_FAST_STEP_US: u32 = 150,
    HOMING_SLOW_STEP_US: u32 = 1500,
    HOMING_BACKOFF_STEPS: u32 = 164, // ~5mm
    HOMING_MAX_STEPS: u32 = 40_000,
    // left unpainted below the boot stack pointer
    STACK_PAINT_MARGIN: usize = 1024,
    LASER_PWM_TOP: u16 = 255,
    LASER_PWM_DIV: u8 = 50, // ~9.8kHz
}
