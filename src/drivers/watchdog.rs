//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API so the device restarts if the supervisor
//! stalls.  The timeout comes from the device config and must exceed the
//! longest unfed stretch: one backoff minute, one registration wait, or one
//! scheduled period, whichever is largest.
//!
//! A TWDT expiry also bumps the retained trip tally through the ISR user
//! hook below, so a hung modem backs off the same way a registration
//! timeout does.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

use crate::app::ports::WatchdogPort;

pub struct Watchdog {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    subscribed: bool,
    feeds: u32,
}

impl Watchdog {
    /// Configure the TWDT with `timeout_ms` and subscribe the current task.
    pub fn arm(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!(
                        "Watchdog: subscribed ({} ms timeout, panic on trigger)",
                        timeout_ms
                    );
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self {
                    subscribed,
                    feeds: 0,
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if timeout_ms == 0 {
                warn!("Watchdog(sim): zero timeout");
            }
            info!("Watchdog(sim): no-op ({} ms)", timeout_ms);
            Self {
                subscribed: false,
                feeds: 0,
            }
        }
    }

    /// Number of feeds since arming.
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}

impl WatchdogPort for Watchdog {
    fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}

/// Weak hook ESP-IDF calls from the TWDT interrupt before it panics.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn esp_task_wdt_isr_user_handler() {
    crate::adapters::noinit::record_watchdog_trip();
}
