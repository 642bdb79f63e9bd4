//! System and network samplers, and the pump tasks that persist and
//! broadcast what they produce.

use crate::error::{Result, ZenithError};
use crate::metrics::data::*;
use crate::metrics::traits::Sampler;
use crate::store::MetricsStore;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{Components, Disks, Networks, System};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tracing::{debug, error};

/// Capacity of the metric event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Samples CPU, memory, disk, temperature, and uptime via sysinfo and
/// direct sysfs access.
pub struct SystemSampler {
    system: System,
    disks: Disks,
    components: Components,
}

impl SystemSampler {
    /// Create a new system sampler instance.
    pub fn new() -> Result<Self> {
        let mut system = System::new_all();
        system.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let components = Components::new_with_refreshed_list();

        Ok(Self {
            system,
            disks,
            components,
        })
    }

    /// Overall CPU usage averaged across all cores.
    fn read_cpu_usage(&self) -> Result<f64> {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(ZenithError::provider_error("no CPU information available"));
        }

        let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        Ok(f64::from(total / cpus.len() as f32))
    }

    /// The volume backing the root filesystem, falling back to the first
    /// disk the provider lists.
    fn primary_disk(&self) -> Result<&sysinfo::Disk> {
        self.disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| self.disks.iter().next())
            .ok_or_else(|| ZenithError::provider_error("no disks reported"))
    }

    /// Read the CPU temperature, if any sensor exposes one.
    ///
    /// Tries the first thermal zone in sysfs, then falls back to sysinfo's
    /// component sensors. `None` is an expected condition on hosts without
    /// sensors, not an error.
    fn read_temperature(&self) -> Option<f64> {
        if let Ok(temp_str) = fs::read_to_string("/sys/class/thermal/thermal_zone0/temp") {
            if let Ok(millicelsius) = temp_str.trim().parse::<i32>() {
                return Some(f64::from(millicelsius) / 1000.0);
            }
        }

        self.components
            .iter()
            .find(|component| {
                let label = component.label().to_ascii_lowercase();
                label.contains("cpu") || label.contains("coretemp") || label.contains("package")
            })
            .or_else(|| self.components.iter().next())
            .map(|component| f64::from(component.temperature()))
    }
}

impl Sampler for SystemSampler {
    type Sample = SystemSampleDraft;

    fn label(&self) -> &'static str {
        "system"
    }

    async fn sample(&mut self) -> Result<SystemSampleDraft> {
        self.system.refresh_all();
        self.disks.refresh();
        self.components.refresh();

        let cpu_usage = self.read_cpu_usage()?;

        let memory_used = bytes_to_gb(self.system.used_memory());
        let memory_total = bytes_to_gb(self.system.total_memory());

        let disk = self.primary_disk()?;
        let disk_total = bytes_to_gb(disk.total_space());
        let disk_used = bytes_to_gb(disk.total_space() - disk.available_space());

        Ok(SystemSampleDraft {
            cpu_usage,
            memory_used,
            memory_total,
            disk_used,
            disk_total,
            temperature: self.read_temperature(),
            uptime: System::uptime(),
        })
    }
}

/// Last-seen cumulative counters for the sampled interface.
struct NetworkCounters {
    interface: String,
    rx_total: u64,
    tx_total: u64,
}

/// Samples throughput on one network interface, plus the ARP neighbour count.
///
/// Throughput is derived from cumulative counter deltas over the elapsed wall
/// time between refreshes, so the first sample after startup reports zero.
pub struct NetworkSampler {
    networks: Networks,
    interface: Option<String>,
    last: Option<NetworkCounters>,
    last_refresh: Instant,
}

impl NetworkSampler {
    /// Create a new network sampler instance.
    pub fn new() -> Result<Self> {
        Ok(Self {
            networks: Networks::new_with_refreshed_list(),
            interface: None,
            last: None,
            last_refresh: Instant::now(),
        })
    }

    /// The interface to sample: sticks with the previous pick while it still
    /// exists, otherwise the first non-loopback interface by name.
    fn pick_interface(&mut self) -> Result<String> {
        if let Some(name) = &self.interface {
            if self.networks.iter().any(|(candidate, _)| candidate == name) {
                return Ok(name.clone());
            }
        }

        let mut names: Vec<&String> = self.networks.iter().map(|(name, _)| name).collect();
        if names.is_empty() {
            return Err(ZenithError::provider_error("no network interfaces reported"));
        }
        names.sort();

        let picked = names
            .iter()
            .find(|name| name.as_str() != "lo")
            .copied()
            .unwrap_or(names[0])
            .clone();
        self.interface = Some(picked.clone());
        Ok(picked)
    }
}

impl Sampler for NetworkSampler {
    type Sample = NetworkSampleDraft;

    fn label(&self) -> &'static str {
        "network"
    }

    async fn sample(&mut self) -> Result<NetworkSampleDraft> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refresh).as_secs_f64();
        self.networks.refresh();
        self.last_refresh = now;

        let interface_name = self.pick_interface()?;
        let (rx_total, tx_total) = self
            .networks
            .iter()
            .find(|(name, _)| name.as_str() == interface_name)
            .map(|(_, data)| (data.total_received(), data.total_transmitted()))
            .ok_or_else(|| {
                ZenithError::provider_error(format!(
                    "interface {interface_name} disappeared during sampling"
                ))
            })?;

        let (download_speed, upload_speed) = match &self.last {
            Some(prev) if prev.interface == interface_name && elapsed > 0.0 => (
                bytes_per_sec_to_mb(rx_total.saturating_sub(prev.rx_total) as f64 / elapsed),
                bytes_per_sec_to_mb(tx_total.saturating_sub(prev.tx_total) as f64 / elapsed),
            ),
            _ => (0.0, 0.0),
        };
        self.last = Some(NetworkCounters {
            interface: interface_name.clone(),
            rx_total,
            tx_total,
        });

        Ok(NetworkSampleDraft {
            interface_name,
            download_speed,
            upload_speed,
            connected_devices: read_connected_devices(),
        })
    }
}

/// Count devices in the kernel ARP table.
///
/// Returns `None` when the table cannot be read (non-Linux hosts, restricted
/// containers); the field is then absent from the stored sample.
fn read_connected_devices() -> Option<i64> {
    let arp = fs::read_to_string("/proc/net/arp").ok()?;
    Some(count_arp_entries(&arp))
}

/// Count distinct hardware addresses among complete ARP entries.
fn count_arp_entries(contents: &str) -> i64 {
    let mut devices = HashSet::new();

    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }

        // flags 0x0 marks an incomplete entry
        let (flags, mac) = (fields[2], fields[3]);
        if flags != "0x0" && mac != "00:00:00:00:00:00" {
            devices.insert(mac.to_ascii_lowercase());
        }
    }

    devices.len() as i64
}

/// Drive a system sampler: persist every sample, then broadcast the stored
/// record to connected sessions.
///
/// A store failure drops that tick's sample and its broadcast; the stream
/// keeps ticking.
pub async fn run_system_sampler<S>(
    sampler: S,
    interval_ms: u64,
    store: Arc<MetricsStore>,
    events: broadcast::Sender<MetricEvent>,
) where
    S: Sampler<Sample = SystemSampleDraft>,
{
    let mut samples = sampler.into_stream(interval_ms);

    while let Some(draft) = samples.next().await {
        match store.insert_system(&draft) {
            Ok(sample) => {
                debug!(cpu = sample.cpu_usage, "system metrics collected");
                if events.receiver_count() > 0 {
                    let _ = events.send(MetricEvent::System(sample));
                }
            }
            Err(err) => error!("failed to persist system metrics: {err}"),
        }
    }
}

/// Drive a network sampler; same persistence and broadcast semantics as
/// [`run_system_sampler`].
pub async fn run_network_sampler<S>(
    sampler: S,
    interval_ms: u64,
    store: Arc<MetricsStore>,
    events: broadcast::Sender<MetricEvent>,
) where
    S: Sampler<Sample = NetworkSampleDraft>,
{
    let mut samples = sampler.into_stream(interval_ms);

    while let Some(draft) = samples.next().await {
        match store.insert_network(&draft) {
            Ok(sample) => {
                debug!(interface = %sample.interface_name, "network metrics collected");
                if events.receiver_count() > 0 {
                    let _ = events.send(MetricEvent::Network(sample));
                }
            }
            Err(err) => error!("failed to persist network metrics: {err}"),
        }
    }
}
