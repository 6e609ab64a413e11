// src/tuning/cgroup.rs

//! CPU quota from cgroup v2 (`cpu.max`) or v1 (`cpu/cpu.cfs_*_us`).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::errors::EnvironmentSetupError;

pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// CPU quota in cores, or `None` when unlimited or not running under a
/// cgroup that exposes one.
pub fn read_cpu_quota(root: &Path) -> Result<Option<f64>, EnvironmentSetupError> {
    let v2 = root.join("cpu.max");
    if let Some(content) = read_optional(&v2)? {
        debug!(path = %v2.display(), "using cgroup v2 cpu quota");
        return parse_cpu_max(&content)
            .ok_or_else(|| malformed(&v2, &content))
            .map(|q| q.map(|(quota, period)| quota as f64 / period as f64));
    }

    let quota_path = root.join("cpu").join("cpu.cfs_quota_us");
    let period_path = root.join("cpu").join("cpu.cfs_period_us");
    let (Some(quota), Some(period)) = (read_optional(&quota_path)?, read_optional(&period_path)?)
    else {
        debug!(root = %root.display(), "no cgroup cpu quota files found");
        return Ok(None);
    };

    let quota: i64 = quota
        .trim()
        .parse()
        .map_err(|_| malformed(&quota_path, &quota))?;
    let period_us: u64 = match period.trim().parse() {
        Ok(p) if p > 0 => p,
        _ => return Err(malformed(&period_path, &period)),
    };

    if quota < 0 {
        return Ok(None);
    }
    if quota == 0 {
        return Err(malformed(&quota_path, "0"));
    }
    Ok(Some(quota as f64 / period_us as f64))
}

/// Parse `cpu.max`: `"<quota> <period>"` or `"max <period>"`.
///
/// Outer `None` means malformed; inner `None` means unlimited.
fn parse_cpu_max(content: &str) -> Option<Option<(u64, u64)>> {
    let mut fields = content.split_whitespace();
    let quota = fields.next()?;
    let period: u64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || period == 0 {
        return None;
    }

    if quota == "max" {
        return Some(None);
    }
    match quota.parse::<u64>().ok()? {
        0 => None,
        q => Some(Some((q, period))),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, EnvironmentSetupError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(EnvironmentSetupError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn malformed(path: &Path, content: &str) -> EnvironmentSetupError {
    EnvironmentSetupError::Malformed {
        path: path.display().to_string(),
        content: content.trim().to_string(),
    }
}
