// src/stats/reporter.rs
use crate::stats::hashrate::HashRate;
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::time::Duration;
use sysinfo::{Components, System};

/// Statistics related to hardware performance
#[derive(Debug, Clone)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Memory currently used on the machine (in bytes)
    pub memory_used: u64,
    /// Current CPU temperature in Celsius
    pub temperature: f32,
}

/// Periodically logs the hash rate alongside hardware statistics
pub struct StatsReporter {
    /// Hash rate published by the search loop
    hash_rate: HashRate,
    /// System information collector
    system: System,
    /// Hardware component information collector
    components: Components,
    /// Interval at which stats are reported
    report_interval: Duration,
}

impl StatsReporter {
    /// Creates a new StatsReporter with the specified reporting interval
    ///
    /// # Arguments
    /// * `hash_rate` - Meter shared with the miner
    /// * `report_interval` - How often to log statistics
    pub fn new(hash_rate: HashRate, report_interval: Duration) -> Self {
        StatsReporter {
            hash_rate,
            system: System::new_all(),
            components: Components::new_with_refreshed_list(),
            report_interval,
        }
    }

    /// Gets the current hardware statistics
    ///
    /// This refreshes system information before returning the stats.
    pub fn get_hardware_stats(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.components.refresh(true);

        let cpus = self.system.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        let temperature = self
            .components
            .iter()
            .find(|c| c.label().contains("CPU"))
            .and_then(|c| c.temperature())
            .unwrap_or(0.0);

        HardwareStats {
            cpu_usage,
            memory_used: self.system.used_memory(),
            temperature,
        }
    }

    /// Starts the periodic reporting of statistics
    ///
    /// Spawns a background thread that logs stats at the configured interval.
    /// The thread exits once the returned sender is dropped or used.
    pub fn start_reporting(mut self) -> Sender<()> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);

        std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(self.report_interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
                let hw_stats = self.get_hardware_stats();

                log::info!(
                    "Hashrate: {} H/s | Total: {} | CPU: {:.1}% | Mem: {} MiB | Temp: {:.1}°C",
                    self.hash_rate.get(),
                    self.hash_rate.total(),
                    hw_stats.cpu_usage,
                    hw_stats.memory_used / (1024 * 1024),
                    hw_stats.temperature
                );
            }
        });

        stop_tx
    }
}
