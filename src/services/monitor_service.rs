//! Device liveness monitor.
//!
//! Every registered device is probed concurrently, bounded by a semaphore,
//! each probe under its own timeout. A failed or slow probe only marks that
//! device offline. Probes run in a [`JoinSet`], so dropping the request
//! aborts whatever is still in flight.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::NaiveDateTime;
use tokio::{sync::Semaphore, task::JoinSet, time::Instant};

use crate::{
    db::DbPool,
    error::AppError,
    models::device::{Device, DeviceProbe, DeviceStatus},
};

/// Load devices, optionally limited to one tenant, ordered by name.
pub async fn list_devices(pool: &DbPool, tenant_id: Option<i64>) -> Result<Vec<Device>, AppError> {
    let devices = sqlx::query_as::<_, Device>(
        r#"
        SELECT d.device_id, COALESCE(t.alias, '') AS tenant_alias, d.device_name, d.ip_address
        FROM devices d
        LEFT JOIN tenants t ON t.id = d.tenant_id
        WHERE ($1::bigint IS NULL OR d.tenant_id = $1)
        ORDER BY d.device_name
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(devices)
}

/// Probe settings shared by all monitor requests.
#[derive(Clone)]
pub struct DeviceMonitor {
    client: reqwest::Client,
    max_concurrency: usize,
    probe_timeout: Duration,
}

impl DeviceMonitor {
    pub fn new(max_concurrency: usize, probe_timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(probe_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            max_concurrency: max_concurrency.max(1),
            probe_timeout,
        })
    }

    /// Probe every device over HTTP.
    pub async fn probe(&self, devices: Vec<Device>, checked_at: NaiveDateTime) -> Vec<DeviceProbe> {
        let client = self.client.clone();
        probe_devices(
            devices,
            checked_at,
            self.max_concurrency,
            self.probe_timeout,
            move |ip| http_probe(client.clone(), ip),
        )
        .await
    }
}

/// Any HTTP answer counts as reachable; returns the roundtrip in milliseconds.
async fn http_probe(client: reqwest::Client, ip_address: String) -> Option<u64> {
    let started = Instant::now();
    match client.get(format!("http://{ip_address}/")).send().await {
        Ok(_) => Some(started.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::debug!(ip_address, error = %e, "device probe failed");
            None
        }
    }
}

/// Run `probe` against every device with at most `max_concurrency` in flight.
///
/// Results keep the order of `devices` and are numbered from 1.
pub async fn probe_devices<F, Fut>(
    devices: Vec<Device>,
    checked_at: NaiveDateTime,
    max_concurrency: usize,
    probe_timeout: Duration,
    probe: F,
) -> Vec<DeviceProbe>
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Option<u64>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut probes = JoinSet::new();

    for (index, device) in devices.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let probe = probe.clone();

        probes.spawn(async move {
            let roundtrip = match semaphore.acquire_owned().await {
                Ok(_permit) => tokio::time::timeout(probe_timeout, probe(device.ip_address.clone()))
                    .await
                    .ok()
                    .flatten(),
                Err(_) => None,
            };
            (index, device, roundtrip)
        });
    }

    let mut results = Vec::with_capacity(probes.len());
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((index, device, roundtrip_ms)) => results.push((
                index,
                DeviceProbe {
                    no: index + 1,
                    checked_at,
                    ip_address: device.ip_address,
                    tenant_alias: device.tenant_alias,
                    device_name: device.device_name,
                    status: if roundtrip_ms.is_some() {
                        DeviceStatus::Online
                    } else {
                        DeviceStatus::Offline
                    },
                    roundtrip_ms,
                },
            )),
            Err(e) => tracing::error!(error = %e, "device probe task failed"),
        }
    }

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, probe)| probe).collect()
}
