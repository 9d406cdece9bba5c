//! Push-gateway transport adapter.
//!
//! The mobile host subscribes to the broker topics through a small push
//! gateway next to it; the hub publishes by POSTing the payload to
//! `/publish/<topic>`. Delivery failures are classified for diagnostics
//! only — the dispatcher retries every class the same way.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use zonewatch_pipeline::error::TransportError;
use zonewatch_pipeline::traits::NotificationTransport;

/// Bound on one blocking publish, so a dead gateway cannot stall the
/// processing cycle indefinitely.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct HttpNotifier {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpNotifier {
    pub fn new(host: &str, port: u16) -> Result<Self, TransportError> {
        if host.is_empty() || host.contains('/') || host.contains(' ') {
            return Err(TransportError::TypeMismatch(format!(
                "gateway host must be a plain hostname or IP, got {host:?}"
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|err| TransportError::TypeMismatch(err.to_string()))?;
        Ok(Self {
            base: format!("http://{host}:{port}"),
            client,
        })
    }
}

impl NotificationTransport for HttpNotifier {
    fn send(&self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let url = format!("{}/publish/{}", self.base, topic);
        let response = self
            .client
            .post(&url)
            .body(payload.to_vec())
            .send()
            .map_err(classify)?;
        response
            .error_for_status()
            .map_err(|err| TransportError::Unreachable(err.to_string()))?;
        Ok(())
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let message = err.to_string();
    if err.is_builder() {
        TransportError::TypeMismatch(message)
    } else if err.is_connect() {
        // Name resolution failures ride in on the connect error.
        if message.contains("dns") || message.contains("resolve") {
            TransportError::InvalidAddress(message)
        } else {
            TransportError::Unreachable(message)
        }
    } else {
        TransportError::Unreachable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_hosts_that_are_not_plain_names() {
        assert!(matches!(
            HttpNotifier::new("", 1883),
            Err(TransportError::TypeMismatch(_))
        ));
        assert!(matches!(
            HttpNotifier::new("http://broker/", 1883),
            Err(TransportError::TypeMismatch(_))
        ));
    }

    #[test]
    fn accepts_plain_host_and_port() {
        let notifier = HttpNotifier::new("192.168.230.88", 1883).unwrap();
        assert_eq!(notifier.base, "http://192.168.230.88:1883");
    }
}
