//! WiFi station connection for the ESP32.
//!
//! # Example
//!
//! ```ignore
//! use rs_rover::hal::esp32::Esp32Wifi;
//! use rs_rover::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("Garage")
//!     .with_password("secret123");
//!
//! let wifi = Esp32Wifi::new(modem, sysloop, nvs, &config)?;
//! log::info!("control page at http://{:?}/", wifi.ip_addr());
//! ```

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::config::WifiConfig;

/// Station-mode WiFi connection, held for the lifetime of the struct.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Wifi<'a> {
    /// Connect to the configured access point and wait for DHCP.
    ///
    /// Retries the association up to `max_retries` times (0 = forever), and
    /// gives up once `connect_timeout_ms` has passed since the first attempt.
    /// Credentials that do not fit the driver's fields are an error.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let mut ssid: heapless::String<32> = heapless::String::new();
        ssid.push_str(config.ssid.as_str())
            .map_err(|_| anyhow::anyhow!("SSID is longer than 32 bytes"))?;
        let mut password: heapless::String<64> = heapless::String::new();
        password
            .push_str(config.password.as_str())
            .map_err(|_| anyhow::anyhow!("WiFi password is longer than 64 bytes"))?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid,
            password,
            ..Default::default()
        }))?;

        log::info!("[WiFi] Starting...");
        wifi.start()?;

        let deadline = Duration::from_millis(u64::from(config.connect_timeout_ms));
        let started = Instant::now();
        let mut attempt: u8 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            log::info!("[WiFi] Connecting to '{}' (attempt {})...", config.ssid, attempt);
            match wifi.connect() {
                Ok(()) => break,
                Err(e) if started.elapsed() >= deadline => {
                    return Err(anyhow::anyhow!(
                        "WiFi connect timed out after {} ms: {:?}",
                        config.connect_timeout_ms,
                        e
                    ));
                }
                Err(e) if config.max_retries == 0 || attempt < config.max_retries => {
                    log::warn!("[WiFi] connect failed: {:?}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::info!("[WiFi] Waiting for DHCP...");
        wifi.wait_netif_up()?;

        if let Ok(ip_info) = wifi.wifi().sta_netif().get_ip_info() {
            log::info!("[WiFi] Connected! IP: {}", ip_info.ip);
        }

        Ok(Self { wifi })
    }

    /// Current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Whether the station is still associated.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
