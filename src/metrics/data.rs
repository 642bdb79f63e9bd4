//! Data structures for system and network metric samples.

use serde::{Deserialize, Serialize};

const BYTES_PER_GB: f64 = 1_073_741_824.0; // 1024^3
const BYTES_PER_MB: f64 = 1_048_576.0; // 1024^2

/// Round a value to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert a byte count to gigabytes, rounded to one decimal place.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round1(bytes as f64 / BYTES_PER_GB)
}

/// Convert a bytes-per-second rate to megabytes per second, rounded to one
/// decimal place.
pub fn bytes_per_sec_to_mb(rate: f64) -> f64 {
    round1(rate / BYTES_PER_MB)
}

/// A stored system metric sample.
///
/// `id` and `timestamp` are assigned by the store at insert time; everything
/// else comes normalized from the sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetricSample {
    /// Store-assigned row id
    pub id: i64,
    /// Store-assigned write time (Unix timestamp in seconds)
    pub timestamp: i64,
    /// Overall CPU usage percentage (0.0 to 100.0)
    pub cpu_usage: f64,
    /// Used memory in gigabytes, one decimal
    pub memory_used: f64,
    /// Total memory in gigabytes, one decimal
    pub memory_total: f64,
    /// Used space on the primary volume in gigabytes, one decimal
    pub disk_used: f64,
    /// Total space on the primary volume in gigabytes, one decimal
    pub disk_total: f64,
    /// CPU temperature in Celsius, absent when no sensor is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// System uptime in seconds
    pub uptime: i64,
}

/// A stored network metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetricSample {
    /// Store-assigned row id
    pub id: i64,
    /// Store-assigned write time (Unix timestamp in seconds)
    pub timestamp: i64,
    /// Name of the sampled interface (e.g. "eth0")
    pub interface_name: String,
    /// Receive rate in megabytes per second, one decimal
    pub download_speed: f64,
    /// Transmit rate in megabytes per second, one decimal
    pub upload_speed: f64,
    /// Devices seen in the ARP table, absent when the table cannot be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_devices: Option<i64>,
}

/// A normalized system sample as produced by the sampler, before the store
/// assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSampleDraft {
    pub cpu_usage: f64,
    pub memory_used: f64,
    pub memory_total: f64,
    pub disk_used: f64,
    pub disk_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub uptime: u64,
}

/// A normalized network sample as produced by the sampler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSampleDraft {
    pub interface_name: String,
    pub download_speed: f64,
    pub upload_speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_devices: Option<i64>,
}

/// A newly stored sample, as delivered to connected dashboard sessions.
///
/// Serializes to the wire envelope `{"event": "...", "data": {...}}` with the
/// event names the dashboard listens for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum MetricEvent {
    #[serde(rename = "system-metrics")]
    System(SystemMetricSample),
    #[serde(rename = "network-metrics")]
    Network(NetworkMetricSample),
}
