//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the gauge.  The configuration is stored
//! as one postcard blob under `wlgauge/devcfg`.
//!
//! - Validation: every field is range-checked before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - A missing or unreadable blob falls back to the build-time defaults,
//!   so a fresh board boots without provisioning.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::DeviceConfig;
use crate::error;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &[u8] = b"wlgauge\0";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &[u8] = b"devcfg\0";
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub const MIN_PERIOD_SECS: u32 = 60;
pub const MAX_PERIOD_SECS: u32 = 86_400;
const MAX_REGISTRATION_TIMEOUT_SECS: u32 = 600;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blob: Option<Vec<u8>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: None,
        })
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, esp_err_t> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let result = Self::with_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ret);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(buf) => Ok(Some(buf)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.blob.clone())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, CONFIG_KEY.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            ConfigError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.blob = Some(bytes.to_vec());
        Ok(())
    }

    /// Overwrite the raw stored blob (host only; for corruption tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_raw(&mut self, bytes: &[u8]) {
        self.blob = Some(bytes.to_vec());
    }
}

pub fn validate_config(cfg: &DeviceConfig) -> Result<(), ConfigError> {
    if !(MIN_PERIOD_SECS..=MAX_PERIOD_SECS).contains(&cfg.transmission_period_secs) {
        return Err(ConfigError::ValidationFailed(
            "transmission_period_secs must be 60–86400",
        ));
    }
    if cfg.server_address.is_empty() {
        return Err(ConfigError::ValidationFailed("server_address must not be empty"));
    }
    if cfg.server_address.contains('"') {
        return Err(ConfigError::ValidationFailed(
            "server_address must not contain quotes",
        ));
    }
    if cfg.server_port == 0 {
        return Err(ConfigError::ValidationFailed("server_port must be non-zero"));
    }
    if cfg.apn.is_empty() || cfg.apn.contains('"') {
        return Err(ConfigError::ValidationFailed(
            "apn must be non-empty and unquoted",
        ));
    }
    if !(1..=MAX_REGISTRATION_TIMEOUT_SECS).contains(&cfg.registration_timeout_secs) {
        return Err(ConfigError::ValidationFailed(
            "registration_timeout_secs must be 1–600",
        ));
    }
    Ok(())
}

/// Bring up NVS and load the stored config.
///
/// A missing blob yields the defaults; a corrupted or invalid one is an
/// error so the caller decides whether to fall back.
pub fn load_config() -> error::Result<DeviceConfig> {
    let nvs = NvsAdapter::new()?;
    Ok(nvs.load()?)
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(DeviceConfig::default());
        };
        let cfg: DeviceConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg).map_err(|_| ConfigError::Corrupted)?;
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&mut self, config: &DeviceConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
