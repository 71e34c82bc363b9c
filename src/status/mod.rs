pub mod format;

use anyhow::Result;
use serde_json::{json, Value};
use sysinfo::{Disks, System};

use crate::config::StatusConfig;

/// Source of the status snapshot: a mapping with `system`, `cpu`, `memory`,
/// `disk` and `env` sections of scalar values.
/// Called once per status request; implementations must not cache.
pub trait StatusProvider: Send + Sync {
    fn snapshot(&self) -> Result<Value>;
}

/// Live host metrics read through `sysinfo`
pub struct SystemStatus {
    framework: String,
    disk_mount: Option<String>,
}

impl SystemStatus {
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            framework: config.framework.clone(),
            disk_mount: config.disk_mount.clone(),
        }
    }

    fn disk_section(&self) -> Value {
        let disks = Disks::new_with_refreshed_list();
        let disk = match &self.disk_mount {
            Some(mount) => disks
                .iter()
                .find(|d| d.mount_point().to_string_lossy() == mount.as_str()),
            None => disks.first(),
        };

        match disk {
            Some(d) => {
                let total = d.total_space();
                let used = total.saturating_sub(d.available_space());
                json!({
                    "used": format!("{:.1}GB", bytes_to_gb(used)),
                    "total": format!("{:.1}GB", bytes_to_gb(total)),
                    "usage": percent(used, total),
                })
            }
            None => json!({}),
        }
    }
}

impl StatusProvider for SystemStatus {
    fn snapshot(&self) -> Result<Value> {
        // Only CPU and memory; the process table is never loaded
        let mut sys = System::new();
        sys.refresh_memory();
        // CPU usage is a delta between two refreshes
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let total_memory = sys.total_memory();
        let used_memory = sys.used_memory();

        Ok(json!({
            "system": {
                "type": System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
                "version": System::long_os_version()
                    .or_else(System::os_version)
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            "cpu": {
                "cores": System::physical_core_count(),
                "threads": sys.cpus().len(),
                "usage": format!("{:.1}%", sys.global_cpu_usage()),
            },
            "memory": {
                "used": used_memory / 1024 / 1024,
                "total": total_memory / 1024 / 1024,
                "usage": percent(used_memory, total_memory),
            },
            "disk": self.disk_section(),
            "env": {
                "framework": self.framework,
                "runtime": runtime_version(),
            },
        }))
    }
}

fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}

fn percent(used: u64, total: u64) -> String {
    if total == 0 {
        return "?".to_string();
    }
    format!("{:.1}%", used as f64 / total as f64 * 100.0)
}

fn runtime_version() -> String {
    match option_env!("CARGO_PKG_RUST_VERSION") {
        Some(v) if !v.is_empty() => format!("Rust {}+", v),
        _ => "Rust".to_string(),
    }
}
