use std::time::Duration;
use sysinfo::System;

/// How long CPU usage is measured over for the status command.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(2500);

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSnapshot {
    pub cpu_percent: f32,
    pub memory_available_gb: f64,
    pub memory_total_gb: f64,
}

impl SystemSnapshot {
    pub fn cpu_field(&self) -> String {
        format!("{:.1}%", self.cpu_percent)
    }

    pub fn memory_field(&self) -> String {
        format!(
            "Available: {:.2} GB, Total: {:.2} GB",
            self.memory_available_gb, self.memory_total_gb
        )
    }
}

/// Sample CPU and memory usage.
///
/// CPU usage is the difference between two refreshes, so the first refresh is
/// taken, then the task sleeps for `window` without blocking the runtime.
pub async fn sample(window: Duration) -> SystemSnapshot {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    tokio::time::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    SystemSnapshot {
        cpu_percent: sys.global_cpu_usage(),
        memory_available_gb: bytes_to_gb(sys.available_memory()),
        memory_total_gb: bytes_to_gb(sys.total_memory()),
    }
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_GB * 100.0).round() / 100.0
}
