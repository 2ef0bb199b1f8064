fn main() {
    // Build-time defaults baked into `DeviceConfig::default()`.
    for var in [
        "WLG_SERVER_ADDRESS",
        "WLG_SERVER_PORT",
        "WLG_PERIOD_SECS",
        "WLG_APN",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
