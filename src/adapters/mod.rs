//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                      |
//! |------------|---------------------|----------------------------------|
//! | `hardware` | SensorPort, Board   | Ranger UART, ADC, I2C, GPIO      |
//! | `log_sink` | EventSink           | Serial log output                |
//! | `modem`    | ModemPort           | nRF91 serial modem (AT over UART)|
//! |            | TransportPort       | Modem UDP socket                 |
//! | `noinit`   | TripStore           | RTC no-init RAM                  |
//! | `nvs`      | ConfigPort          | NVS / in-memory store            |

pub mod hardware;
pub mod log_sink;
pub mod modem;
pub mod noinit;
pub mod nvs;
