//! Live polling of Fronius inverters through the Solar API v1.
//!
//! A poll never fails: transport errors, timeouts, bad status codes and
//! malformed bodies all become an `error` reading with zeroed power, so a
//! dead inverter shows up as downtime instead of a missing sample.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;

use crate::config::{Config, DeviceConfig};
use crate::models::{Reading, ReadingStatus};

const REALTIME_PATH: &str = "/solar_api/v1/GetPowerFlowRealtimeData.fcgi";
const WATTS_PER_KW: f64 = 1000.0;

// ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RealtimeResponse {
    body: Option<RealtimeBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RealtimeBody {
    data: Option<RealtimeData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RealtimeData {
    site: Option<Site>,
}

/// Site power flow in watts. Inverters report `null` for PV at night.
#[derive(Debug, Deserialize, PartialEq)]
struct Site {
    #[serde(rename = "P_PV")]
    pv: Option<f64>,
    #[serde(rename = "P_Load")]
    load: Option<f64>,
    #[serde(rename = "P_Grid")]
    grid: Option<f64>,
}

impl Site {
    // ---
    /// `P_Load` is negative when the house consumes; stored consumption is positive.
    fn into_reading(self, device: &DeviceConfig, timestamp: DateTime<Utc>) -> Reading {
        Reading {
            device_id: device.id.clone(),
            label: device.label.clone(),
            timestamp,
            generation: self.pv.unwrap_or(0.0) / WATTS_PER_KW,
            consumption: self.load.unwrap_or(0.0).abs() / WATTS_PER_KW,
            grid: self.grid.unwrap_or(0.0) / WATTS_PER_KW,
            status: ReadingStatus::Ok,
            error: None,
        }
    }
}

fn parse_site(body: &str) -> Result<Site> {
    // ---
    let response: RealtimeResponse = serde_json::from_str(body)?;
    response
        .body
        .and_then(|b| b.data)
        .and_then(|d| d.site)
        .ok_or_else(|| anyhow!("Missing site data in response"))
}

fn offline_reading(device: &DeviceConfig, timestamp: DateTime<Utc>, error: String) -> Reading {
    Reading {
        device_id: device.id.clone(),
        label: device.label.clone(),
        timestamp,
        generation: 0.0,
        consumption: 0.0,
        grid: 0.0,
        status: ReadingStatus::Error,
        error: Some(error),
    }
}

/// HTTP client bound to the configured inverters.
#[derive(Debug, Clone)]
pub struct Collector {
    client: reqwest::Client,
    devices: Arc<[DeviceConfig]>,
}

impl Collector {
    // ---
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            devices: config.devices.clone().into(),
        })
    }

    pub fn devices(&self) -> &[DeviceConfig] {
        &self.devices
    }

    /// Poll every device concurrently. Results keep configuration order.
    pub async fn poll_all(&self) -> Vec<Reading> {
        join_all(self.devices.iter().map(|device| self.poll_device(device))).await
    }

    pub async fn poll_device(&self, device: &DeviceConfig) -> Reading {
        // ---
        let requested_at = Utc::now();

        match self.fetch_site(device).await {
            Ok(site) => {
                tracing::debug!("Polled {}: {:?}", device.id, site);
                site.into_reading(device, requested_at)
            }
            Err(e) => {
                tracing::warn!("Failed to poll {} at {}: {}", device.id, device.url, e);
                offline_reading(device, requested_at, e.to_string())
            }
        }
    }

    async fn fetch_site(&self, device: &DeviceConfig) -> Result<Site> {
        // ---
        let mut request = self.client.get(format!("{}{}", device.url, REALTIME_PATH));
        if let Some(access) = &device.access {
            request = request
                .header("CF-Access-Client-Id", &access.client_id)
                .header("CF-Access-Client-Secret", &access.client_secret);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Request failed ({})", status.as_u16()));
        }

        parse_site(&response.text().await?)
    }
}

/// Sum successful readings into the "combined" pseudo-device.
///
/// Failed devices are left out of the sums; the combined status is `ok` only
/// when every device answered.
pub fn combine(snapshots: &[Reading], observed_at: DateTime<Utc>) -> Reading {
    // ---
    let successful: Vec<&Reading> = snapshots.iter().filter(|r| r.is_online()).collect();
    let all_ok = successful.len() == snapshots.len();

    let error = if all_ok {
        None
    } else if successful.is_empty() {
        Some("All devices offline".to_string())
    } else {
        Some("One or more devices unavailable".to_string())
    };

    Reading {
        device_id: "combined".to_string(),
        label: "Combined".to_string(),
        timestamp: observed_at,
        generation: successful.iter().map(|r| r.generation).sum(),
        consumption: successful.iter().map(|r| r.consumption).sum(),
        grid: successful.iter().map(|r| r.grid).sum(),
        status: if all_ok {
            ReadingStatus::Ok
        } else {
            ReadingStatus::Error
        },
        error,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn device(id: &str) -> DeviceConfig {
        DeviceConfig {
            id: id.to_string(),
            label: id.to_uppercase(),
            url: format!("http://{id}.local"),
            access: None,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 26, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_site_converts_watts_to_kw() {
        // ---
        let body = r#"{
            "Body": { "Data": { "Site": {
                "Mode": "meter",
                "P_PV": 4200.0,
                "P_Load": -1500.0,
                "P_Grid": -2700.0
            } } },
            "Head": { "Status": { "Code": 0 } }
        }"#;

        let reading = parse_site(body).unwrap().into_reading(&device("roof"), at());

        assert_eq!(reading.generation, 4.2);
        assert_eq!(reading.consumption, 1.5);
        assert_eq!(reading.grid, -2.7);
        assert_eq!(reading.status, ReadingStatus::Ok);
        assert_eq!(reading.label, "ROOF");
    }

    #[test]
    fn test_parse_site_null_pv_is_zero() {
        // ---
        let body = r#"{"Body":{"Data":{"Site":{"P_PV":null,"P_Load":-300,"P_Grid":300}}}}"#;
        let reading = parse_site(body).unwrap().into_reading(&device("roof"), at());

        assert_eq!(reading.generation, 0.0);
        assert_eq!(reading.grid, 0.3);
    }

    #[test]
    fn test_parse_site_missing_site_is_error() {
        // ---
        let err = parse_site(r#"{"Body":{"Data":{}}}"#).unwrap_err();
        assert_eq!(err.to_string(), "Missing site data in response");

        assert!(parse_site("<html>gateway timeout</html>").is_err());
    }

    #[test]
    fn test_combine_all_ok() {
        // ---
        let a = Site { pv: Some(2000.0), load: Some(-500.0), grid: Some(-1500.0) }
            .into_reading(&device("a"), at());
        let b = Site { pv: Some(1000.0), load: Some(-1500.0), grid: Some(500.0) }
            .into_reading(&device("b"), at());

        let combined = combine(&[a, b], at());
        assert_eq!(combined.device_id, "combined");
        assert_eq!(combined.generation, 3.0);
        assert_eq!(combined.consumption, 2.0);
        assert_eq!(combined.grid, -1.0);
        assert_eq!(combined.status, ReadingStatus::Ok);
        assert_eq!(combined.error, None);
    }

    #[test]
    fn test_combine_partial_and_total_outage() {
        // ---
        let ok = Site { pv: Some(2000.0), load: None, grid: None }.into_reading(&device("a"), at());
        let down = offline_reading(&device("b"), at(), "timeout".to_string());

        let partial = combine(&[ok, down.clone()], at());
        assert_eq!(partial.generation, 2.0);
        assert_eq!(partial.status, ReadingStatus::Error);
        assert_eq!(partial.error.as_deref(), Some("One or more devices unavailable"));

        let none = combine(&[down], at());
        assert_eq!(none.generation, 0.0);
        assert_eq!(none.error.as_deref(), Some("All devices offline"));
    }

    #[tokio::test]
    async fn test_unreachable_device_becomes_offline_reading() {
        // ---
        let config = Config {
            db_url: String::new(),
            db_pool_max: 1,
            listen_port: 0,
            poll_interval: None,
            fetch_timeout: std::time::Duration::from_millis(200),
            query_timeout: std::time::Duration::from_secs(1),
            property_label: "Test".to_string(),
            devices: vec![DeviceConfig {
                url: "http://127.0.0.1:9".to_string(),
                ..device("dead")
            }],
        };
        let collector = Collector::new(&config).unwrap();

        let readings = collector.poll_all().await;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].status, ReadingStatus::Error);
        assert_eq!(readings[0].generation, 0.0);
        assert!(readings[0].error.is_some());
    }
}
