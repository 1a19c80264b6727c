//! Wi-Fi station link for the advisory uplink.
//!
//! Owned by the advisory worker: before every round trip the worker asks
//! [`WifiLink::ensure_connected`], which reconnects when the station has
//! dropped and the backoff has elapsed.  The Wi-Fi LED follows the link.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: a static flag decides whether the simulated
//!   access point is reachable.
//!
//! ## Reconnection policy
//!
//! After a failed attempt the link waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.  Requests made in between fail
//! fast as transport errors.

use core::fmt;
use log::{error, info, warn};

use crate::drivers::status_led::StatusLed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    /// Still inside the backoff window of the last failure.
    BackingOff,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no Wi-Fi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "Wi-Fi connection failed"),
            Self::BackingOff => write!(f, "Wi-Fi reconnect backing off"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_AP_REACHABLE: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(true);

/// Make the simulated access point (un)reachable.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ap_reachable(reachable: bool) {
    SIM_AP_REACHABLE.store(reachable, core::sync::atomic::Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// Link
// ───────────────────────────────────────────────────────────────

pub struct WifiLink {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_secs: u32,
    /// Earliest uptime for the next reconnect attempt.
    retry_at_ms: u64,
    led: StatusLed,
    #[cfg(target_os = "espidf")]
    wifi: Option<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>>,
}

impl WifiLink {
    pub fn new(led: StatusLed) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            retry_at_ms: 0,
            led,
            #[cfg(target_os = "espidf")]
            wifi: None,
        }
    }

    /// Hand over the started-but-unconfigured station driver.
    #[cfg(target_os = "espidf")]
    pub fn attach(&mut self, wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>) {
        self.wifi = Some(wifi);
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_secs(&self) -> u32 {
        self.backoff_secs
    }

    pub fn led_on(&self) -> bool {
        self.led.is_on()
    }

    /// Connected on return, or the reason it is not.  Attempts a
    /// (blocking) reconnect only when the backoff has elapsed.
    pub fn ensure_connected(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            if self.platform_is_connected() {
                return Ok(());
            }
            warn!("WiFi: connection lost");
            self.state = WifiState::Reconnecting { attempt: 0 };
            self.led.set(false);
            self.retry_at_ms = now_ms;
        }
        if now_ms < self.retry_at_ms {
            return Err(ConnectivityError::BackingOff);
        }

        let attempt = match self.state {
            WifiState::Reconnecting { attempt } => attempt,
            _ => 0,
        };
        info!("WiFi: connecting to '{}' (attempt {})", self.ssid, attempt + 1);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.backoff_secs = INITIAL_BACKOFF_SECS;
                self.led.set(true);
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: {} (retry in {}s)", e, self.backoff_secs);
                self.retry_at_ms = now_ms + u64::from(self.backoff_secs) * 1000;
                self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                self.state = WifiState::Reconnecting { attempt: attempt + 1 };
                self.led.set(false);
                Err(e)
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let wifi = self.wifi.as_mut().ok_or(ConnectivityError::ConnectionFailed)?;
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi: driver error {e}");
            ConnectivityError::ConnectionFailed
        };
        wifi.set_configuration(&config).map_err(fail)?;
        if !wifi.is_started().map_err(fail)? {
            wifi.start().map_err(fail)?;
        }
        let joined = wifi.connect().and_then(|()| wifi.wait_netif_up());
        if let Err(e) = joined {
            let _ = wifi.disconnect();
            return Err(fail(e));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if SIM_AP_REACHABLE.load(core::sync::atomic::Ordering::Relaxed) {
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi
            .as_ref()
            .and_then(|w| w.is_connected().ok())
            .unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        SIM_AP_REACHABLE.load(core::sync::atomic::Ordering::Relaxed)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
