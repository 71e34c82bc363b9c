use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use tracing::warn;

/// Report sent when the snapshot cannot be read at all
pub const FALLBACK_REPORT: &str = "**服务器状态**\n\n无法获取系统状态信息";

const UNKNOWN: &str = "未知";
const MISSING: &str = "?";

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("status snapshot is not a mapping")]
    NotAMapping,
    #[error("status section '{0}' is not a mapping")]
    BadSection(&'static str),
}

/// Render a snapshot into the status report, timestamped with the local clock.
/// Malformed snapshots yield [`FALLBACK_REPORT`].
pub fn render(snapshot: &Value) -> String {
    match try_render(snapshot, Local::now()) {
        Ok(report) => report,
        Err(e) => {
            warn!("Failed to format status snapshot: {}", e);
            FALLBACK_REPORT.to_string()
        }
    }
}

pub fn try_render(snapshot: &Value, now: DateTime<Local>) -> Result<String, FormatError> {
    let root = snapshot.as_object().ok_or(FormatError::NotAMapping)?;

    let system = section(root, "system")?;
    let cpu = section(root, "cpu")?;
    let memory = section(root, "memory")?;
    let disk = section(root, "disk")?;
    let env = section(root, "env")?;

    Ok(format!(
        "**🖥️ 服务器状态报告**\n\
         \n\
         **系统信息**\n\
         - 类型: {}\n\
         - 版本: {}\n\
         \n\
         **硬件状态**\n\
         - CPU: {}核 {}线程 (使用率: {})\n\
         - 内存: {}MB / {}MB (使用率: {})\n\
         - 磁盘: {} / {} (使用率: {})\n\
         \n\
         **环境信息**\n\
         - 框架: {}\n\
         - 运行时: {}\n\
         \n\
         _更新时间: {}_",
        field(system, "type", UNKNOWN),
        field(system, "version", UNKNOWN),
        field(cpu, "cores", MISSING),
        field(cpu, "threads", MISSING),
        field(cpu, "usage", MISSING),
        field(memory, "used", MISSING),
        field(memory, "total", MISSING),
        field(memory, "usage", MISSING),
        field(disk, "used", MISSING),
        field(disk, "total", MISSING),
        field(disk, "usage", MISSING),
        field(env, "framework", MISSING),
        field(env, "runtime", MISSING),
        now.format("%Y-%m-%d %H:%M:%S"),
    ))
}

/// A missing or null section reads as empty; any other non-mapping is an error.
fn section<'a>(
    root: &'a Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a Map<String, Value>>, FormatError> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(FormatError::BadSection(name)),
    }
}

fn field(section: Option<&Map<String, Value>>, key: &str, placeholder: &str) -> String {
    match section.and_then(|s| s.get(key)) {
        None | Some(Value::Null) => placeholder.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 8, 30, 5).unwrap()
    }

    fn full_snapshot() -> Value {
        json!({
            "system": {"type": "Linux", "version": "6.1"},
            "cpu": {"cores": 4, "threads": 8, "usage": "12.5%"},
            "memory": {"used": 2048, "total": 8192, "usage": "25.0%"},
            "disk": {"used": "40.0GB", "total": "100.0GB", "usage": "40.0%"},
            "env": {"framework": "status-monitor 0.1.0", "runtime": "Rust 1.80"}
        })
    }

    #[test]
    fn test_full_report() {
        let report = try_render(&full_snapshot(), fixed_now()).unwrap();
        assert!(report.starts_with("**🖥️ 服务器状态报告**\n\n**系统信息**\n"));
        assert!(report.contains("- 类型: Linux\n- 版本: 6.1\n"));
        assert!(report.contains("- CPU: 4核 8线程 (使用率: 12.5%)"));
        assert!(report.contains("- 内存: 2048MB / 8192MB (使用率: 25.0%)"));
        assert!(report.contains("- 磁盘: 40.0GB / 100.0GB (使用率: 40.0%)"));
        assert!(report.contains("- 框架: status-monitor 0.1.0\n- 运行时: Rust 1.80"));
        assert!(report.ends_with("_更新时间: 2026-03-01 08:30:05_"));
    }

    #[test]
    fn test_missing_disk_section_uses_placeholders() {
        let mut snapshot = full_snapshot();
        snapshot.as_object_mut().unwrap().remove("disk");
        let report = try_render(&snapshot, fixed_now()).unwrap();
        assert!(report.contains("- 磁盘: ? / ? (使用率: ?)"));
        assert!(report.contains("- CPU: 4核 8线程"));
    }

    #[test]
    fn test_empty_mapping_uses_placeholders() {
        let report = try_render(&json!({}), fixed_now()).unwrap();
        assert!(report.contains("- 类型: 未知\n- 版本: 未知"));
        assert!(report.contains("- CPU: ?核 ?线程 (使用率: ?)"));
        assert!(report.contains("- 框架: ?\n- 运行时: ?"));
    }

    #[test]
    fn test_not_a_mapping_falls_back() {
        assert_eq!(render(&json!("just a string")), FALLBACK_REPORT);
        assert_eq!(render(&json!([1, 2])), FALLBACK_REPORT);
        assert!(matches!(
            try_render(&Value::Null, fixed_now()),
            Err(FormatError::NotAMapping)
        ));
    }

    #[test]
    fn test_bad_section_falls_back() {
        let snapshot = json!({"cpu": 42});
        assert!(matches!(
            try_render(&snapshot, fixed_now()),
            Err(FormatError::BadSection("cpu"))
        ));
        assert_eq!(render(&snapshot), FALLBACK_REPORT);
    }

    #[test]
    fn test_render_stamps_current_time() {
        let before = Local::now().format("%Y-%m-%d").to_string();
        let report = render(&full_snapshot());
        let after = Local::now().format("%Y-%m-%d").to_string();
        assert!(
            report.contains(&format!("_更新时间: {}", before))
                || report.contains(&format!("_更新时间: {}", after))
        );
    }
}
