//! Advisory worker: the blocking half of the advisory channel.
//!
//! Runs on its own thread on the device.  Each request taken off the
//! [`AdvisoryLink`] is POSTed as JSON to the advisory endpoint; the reply
//! text (or the failure) goes back through the link tagged with the
//! request id.  Parsing the reply is the control loop's job.
//!
//! ```text
//!   link.next_request() ─▶ wifi up? ─▶ POST body ─▶ 2xx? ─▶ link.complete(id, text)
//!                               └──────────┴───────────┴──▶ link.complete(id, Err)
//! ```

use log::{debug, info, warn};

use super::time::MonotonicClock;
use super::wifi::WifiLink;
use crate::advisory::AdvisoryResponse;
use crate::advisory::channels::AdvisoryLink;
use crate::error::AdvisoryError;

/// Replies longer than this are not an action object.
pub const MAX_RESPONSE_BYTES: usize = 4096;

/// One blocking JSON POST.
pub trait HttpPost {
    fn post_json(&mut self, body: &str) -> Result<String, AdvisoryError>;
}

pub struct AdvisoryWorker<'a, H> {
    link: &'a AdvisoryLink,
    http: H,
    wifi: Option<WifiLink>,
    clock: MonotonicClock,
    served: u32,
}

impl<'a, H: HttpPost> AdvisoryWorker<'a, H> {
    pub fn new(link: &'a AdvisoryLink, http: H) -> Self {
        Self {
            link,
            http,
            wifi: None,
            clock: MonotonicClock::new(),
            served: 0,
        }
    }

    /// Bring the station up before each round trip.
    pub fn with_wifi(mut self, wifi: WifiLink) -> Self {
        self.wifi = Some(wifi);
        self
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    /// Wait for one request and answer it.
    pub async fn serve_one(&mut self) {
        let request = self.link.next_request().await;
        if self.link.is_cancelled(request.id) {
            debug!("advisory #{} cancelled before send, skipped", request.id);
            return;
        }

        let result = self.round_trip(&request.body);
        match &result {
            Ok(text) => debug!("advisory #{}: {} bytes", request.id, text.len()),
            Err(e) => warn!("advisory #{}: {}", request.id, e),
        }
        self.served = self.served.wrapping_add(1);
        self.link.complete(AdvisoryResponse {
            id: request.id,
            result,
        });
    }

    fn round_trip(&mut self, body: &str) -> Result<String, AdvisoryError> {
        if let Some(wifi) = self.wifi.as_mut() {
            wifi.ensure_connected(self.clock.uptime_ms()).map_err(|e| {
                warn!("advisory: uplink down ({e})");
                AdvisoryError::Transport
            })?;
        }
        self.http.post_json(body)
    }

    /// Thread body.  Never returns.
    pub fn run(mut self) -> ! {
        info!("advisory worker running");
        loop {
            futures_lite::future::block_on(self.serve_one());
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF HTTP client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspHttpPost;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use embedded_svc::http::Method;
    use embedded_svc::http::client::Client as HttpClient;
    use embedded_svc::io::{Read, Write};
    use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};
    use log::warn;

    use super::{HttpPost, MAX_RESPONSE_BYTES};
    use crate::error::AdvisoryError;

    fn transport<E: core::fmt::Debug>(e: E) -> AdvisoryError {
        warn!("advisory http: {e:?}");
        AdvisoryError::Transport
    }

    pub struct EspHttpPost {
        url: &'static str,
        api_key: Option<&'static str>,
        timeout: Duration,
    }

    impl EspHttpPost {
        pub fn new(url: &'static str, api_key: Option<&'static str>, timeout: Duration) -> Self {
            Self {
                url,
                api_key,
                timeout,
            }
        }
    }

    impl HttpPost for EspHttpPost {
        fn post_json(&mut self, body: &str) -> Result<String, AdvisoryError> {
            let conf = HttpClientConfiguration {
                timeout: Some(self.timeout),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let mut client = HttpClient::wrap(EspHttpConnection::new(&conf).map_err(transport)?);

            let length = body.len().to_string();
            let auth = self.api_key.map(|key| format!("Bearer {key}"));
            let mut headers = vec![
                ("content-type", "application/json"),
                ("content-length", length.as_str()),
            ];
            if let Some(auth) = auth.as_deref() {
                headers.push(("authorization", auth));
            }

            let mut request = client
                .request(Method::Post, self.url, &headers)
                .map_err(transport)?;
            request.write_all(body.as_bytes()).map_err(transport)?;
            request.flush().map_err(transport)?;
            let mut response = request.submit().map_err(transport)?;

            let status = response.status();
            if !(200..300).contains(&status) {
                warn!("advisory http: status {status}");
                return Err(AdvisoryError::Transport);
            }

            let mut text = Vec::new();
            let mut chunk = [0_u8; 512];
            loop {
                let read = response.read(&mut chunk).map_err(transport)?;
                if read == 0 {
                    break;
                }
                if text.len() + read > MAX_RESPONSE_BYTES {
                    return Err(AdvisoryError::Malformed);
                }
                text.extend_from_slice(&chunk[..read]);
            }
            String::from_utf8(text).map_err(|_| AdvisoryError::Malformed)
        }
    }
}
