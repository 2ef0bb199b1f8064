//! Water Level Gauge Firmware — Main Entry Point
//!
//! Hexagonal architecture: the supervisor runs the measure-and-report
//! cycle against port traits, and this binary wires real peripherals to
//! those ports.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          SerialModem        LogEventSink      │
//! │  (Sensors·Watchdog·Tally) (Modem+Transport)  (EventSink)       │
//! │  NvsAdapter (ConfigPort)  RetainedTally (TripStore)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Supervisor (pure logic)                   │    │
//! │  │  FSM · ranging quorum · escalation · trip tally        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The supervisor only returns when it wants the chip restarted; the
//! restart itself happens here.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use waterlevel::adapters::hardware::HardwareAdapter;
use waterlevel::adapters::log_sink::LogEventSink;
use waterlevel::adapters::modem::SerialModem;
use waterlevel::adapters::noinit::RetainedTally;
use waterlevel::adapters::nvs;
use waterlevel::app::service::Supervisor;
use waterlevel::config::DeviceConfig;
use waterlevel::drivers::watchdog::Watchdog;
use waterlevel::pins;
use waterlevel::ranging::RangeFinder;
use waterlevel::sensors::SensorHub;
use waterlevel::sensors::battery::BatteryMonitor;
use waterlevel::sensors::selector::DipSwitches;
use waterlevel::sensors::temperature::Tmp102;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WaterLevel v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match nvs::load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, running with defaults", e);
            DeviceConfig::default()
        }
    };

    // ── 3. Watchdog, armed once for the whole run ─────────────
    let watchdog = Watchdog::arm(config.watchdog_timeout_ms());

    // ── 4. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: every GPIO number in `pins` is claimed exactly once below.
    let (sw, ranger_pins, divider_en, i2c_pins, modem_pins) = unsafe {
        (
            [
                AnyInputPin::new(pins::SW0_GPIO),
                AnyInputPin::new(pins::SW1_GPIO),
                AnyInputPin::new(pins::SW2_GPIO),
                AnyInputPin::new(pins::SW3_GPIO),
            ],
            (
                AnyOutputPin::new(pins::RANGER_POWER_GPIO),
                AnyOutputPin::new(pins::RANGER_START_GPIO),
                AnyIOPin::new(pins::RANGER_UART_TX_GPIO),
                AnyIOPin::new(pins::RANGER_UART_RX_GPIO),
            ),
            AnyOutputPin::new(pins::BATTERY_DIVIDER_EN_GPIO),
            (
                AnyIOPin::new(pins::I2C_SDA_GPIO),
                AnyIOPin::new(pins::I2C_SCL_GPIO),
            ),
            (
                AnyIOPin::new(pins::MODEM_UART_TX_GPIO),
                AnyIOPin::new(pins::MODEM_UART_RX_GPIO),
            ),
        )
    };

    // Selectors: sampled once, board must be power-cycled to change.
    let [sw0, sw1, sw2, sw3] = sw;
    let mut selector_pins = [
        PinDriver::input(sw0)?,
        PinDriver::input(sw1)?,
        PinDriver::input(sw2)?,
        PinDriver::input(sw3)?,
    ];
    for pin in &mut selector_pins {
        pin.set_pull(Pull::Up)?;
    }
    let selectors = DipSwitches::new(selector_pins).read();

    // Ranger: switched rail + receive-only UART.
    let (power, start, ranger_tx, ranger_rx) = ranger_pins;
    let ranger_uart = UartDriver::new(
        peripherals.uart1,
        ranger_tx,
        ranger_rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::RANGER_UART_BAUD)),
    )?;
    let ranger = RangeFinder::new(
        ranger_uart,
        PinDriver::output(power)?,
        PinDriver::output(start)?,
        FreeRtos,
    );

    // Battery: ADC1 on the divider midpoint, raw 12-bit samples.
    let adc = AdcDriver::new(peripherals.adc1)?;
    let mut battery_channel = AdcChannelDriver::new(
        adc,
        peripherals.pins.gpio1,
        &AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        },
    )?;
    let battery = BatteryMonitor::new(
        move || battery_channel.read_raw().ok(),
        PinDriver::output(divider_en)?,
    );

    // Temperature: TMP102 on I2C0.
    let (sda, scl) = i2c_pins;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let thermometer = Tmp102::new(i2c);

    // Modem: serial-modem firmware on UART2.
    let (modem_tx, modem_rx) = modem_pins;
    let modem_uart = UartDriver::new(
        peripherals.uart2,
        modem_tx,
        modem_rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::MODEM_UART_BAUD)),
    )?;

    // ── 5. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(ranger, battery, thermometer, selectors);
    let mut hw = HardwareAdapter::new(
        sensor_hub,
        SerialModem::new(modem_uart),
        watchdog,
        RetainedTally::new(),
        FreeRtos,
    );
    let mut log_sink = LogEventSink::new();

    // ── 6. Run until a reset is requested ─────────────────────
    let mut supervisor = Supervisor::new(config);
    let reason = supervisor.run(&mut hw, &mut log_sink);

    error!("Restarting: {}", reason);
    FreeRtos::delay_ms(100);
    // SAFETY: plain ESP-IDF call; never returns.
    unsafe { esp_idf_svc::sys::esp_restart() }
}
