//! GPIO / peripheral pin assignments for the gauge main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Selector DIP switches (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// SW0 — carrier selection bit 0.
pub const SW0_GPIO: i32 = 4;
/// SW1 — carrier selection bit 1.
pub const SW1_GPIO: i32 = 5;
/// SW2 — ON: MB7388 short-form 10 m ranger.
pub const SW2_GPIO: i32 = 6;
/// SW3 — ON: MB7051 long-form 10 m ranger (centimetre output).
pub const SW3_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Ultrasonic ranger (MaxBotix, TTL serial)
// ---------------------------------------------------------------------------

/// High-side switch for the ranger supply rail.
pub const RANGER_POWER_GPIO: i32 = 10;
/// Ranging start / enable line.
pub const RANGER_START_GPIO: i32 = 11;
/// Ranger serial output → MCU RX.
pub const RANGER_UART_RX_GPIO: i32 = 12;
/// Unused TX (ranger is receive-only), tied for the UART driver.
pub const RANGER_UART_TX_GPIO: i32 = 13;
/// MaxBotix serial rate.
pub const RANGER_UART_BAUD: u32 = 9_600;

// ---------------------------------------------------------------------------
// Battery sense
// ---------------------------------------------------------------------------

/// Enables the battery divider only while sampling.
pub const BATTERY_DIVIDER_EN_GPIO: i32 = 14;
/// Battery divider midpoint (ADC1).
pub const BATTERY_ADC_GPIO: i32 = 1;

// ---------------------------------------------------------------------------
// I²C bus (TMP102 temperature sensor at 0x48)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// LTE modem (serial-modem firmware over UART)
// ---------------------------------------------------------------------------

pub const MODEM_UART_TX_GPIO: i32 = 17;
pub const MODEM_UART_RX_GPIO: i32 = 18;
pub const MODEM_UART_BAUD: u32 = 115_200;
