//! Read-only host introspection for `getHostInfo`, permission detection and
//! the `nexus` diagnostics.
//!
//! Linux details come from `/proc`; everything degrades to "unknown" (or
//! `None`) elsewhere rather than failing.

use std::net::IpAddr;
use std::path::PathBuf;

use crate::exec::PermissionLevel;

/// System hostname.
pub fn hostname() -> String {
    if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    #[cfg(unix)]
    if let Ok(name) = nix::unistd::gethostname() {
        let name = name.to_string_lossy().trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
pub fn effective_uid() -> Option<u32> {
    Some(nix::unistd::geteuid().as_raw())
}

#[cfg(not(unix))]
pub fn effective_uid() -> Option<u32> {
    None
}

#[cfg(unix)]
pub fn effective_gid() -> Option<u32> {
    Some(nix::unistd::getegid().as_raw())
}

#[cfg(not(unix))]
pub fn effective_gid() -> Option<u32> {
    None
}

/// Login name from the environment.
pub fn username() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Heuristic admin detection: root on unix, `Administrator` on Windows.
pub fn detect_permission_level() -> PermissionLevel {
    if cfg!(windows) {
        let user = username().to_lowercase();
        if user == "administrator" || user.ends_with("\\administrator") {
            return PermissionLevel::Admin;
        }
        return PermissionLevel::Standard;
    }
    match effective_uid() {
        Some(0) => PermissionLevel::Admin,
        _ => PermissionLevel::Standard,
    }
}

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub username: String,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub home: Option<PathBuf>,
    pub shell: Option<String>,
}

pub fn user_info() -> UserInfo {
    UserInfo {
        username: username(),
        uid: effective_uid(),
        gid: effective_gid(),
        home: home_dir(),
        shell: std::env::var("SHELL").ok(),
    }
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Kernel name and release, e.g. `("Linux", "6.8.0")`.
pub fn os_release() -> (String, String) {
    let read = |name: &str| {
        std::fs::read_to_string(format!("/proc/sys/kernel/{name}"))
            .map(|s| s.trim().to_string())
            .ok()
    };
    let sysname = read("ostype").unwrap_or_else(|| capitalize(std::env::consts::OS));
    let release = read("osrelease").unwrap_or_else(|| "unknown".to_string());
    (sysname, release)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Seconds since boot.
pub fn uptime_secs() -> Option<u64> {
    let raw = std::fs::read_to_string("/proc/uptime").ok()?;
    let first = raw.split_whitespace().next()?;
    first.parse::<f64>().ok().map(|s| s as u64)
}

pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub fn cpu_model() -> String {
    std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|info| {
            info.lines()
                .find(|l| l.starts_with("model name"))
                .and_then(|l| l.split_once(':'))
                .map(|(_, v)| v.trim().to_string())
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Total and available memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: u64,
    pub free: u64,
}

impl MemoryInfo {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }

    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used() as f64 / self.total as f64 * 100.0
    }
}

pub fn memory() -> Option<MemoryInfo> {
    parse_meminfo(&std::fs::read_to_string("/proc/meminfo").ok()?)
}

fn parse_meminfo(raw: &str) -> Option<MemoryInfo> {
    let field = |name: &str| -> Option<u64> {
        let line = raw.lines().find(|l| l.starts_with(name))?;
        let kb = line.split_whitespace().nth(1)?.parse::<u64>().ok()?;
        Some(kb * 1024)
    };
    let total = field("MemTotal:")?;
    let free = field("MemAvailable:").or_else(|| field("MemFree:"))?;
    Some(MemoryInfo { total, free })
}

/// Bytes as gigabytes with two decimals.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub interface: String,
    pub addr: IpAddr,
    /// Loopback.
    pub internal: bool,
}

/// Every IPv4/IPv6 address bound to a local interface.
#[cfg(unix)]
pub fn interfaces() -> Vec<InterfaceAddr> {
    use nix::net::if_::InterfaceFlags;
    use std::net::{SocketAddrV4, SocketAddrV6};

    let addrs = match nix::ifaddrs::getifaddrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            log::debug!("getifaddrs failed: {e}");
            return Vec::new();
        }
    };
    addrs
        .filter_map(|ifa| {
            let storage = ifa.address?;
            let addr = if let Some(sin) = storage.as_sockaddr_in() {
                IpAddr::V4(*SocketAddrV4::from(*sin).ip())
            } else if let Some(sin6) = storage.as_sockaddr_in6() {
                IpAddr::V6(*SocketAddrV6::from(*sin6).ip())
            } else {
                return None;
            };
            Some(InterfaceAddr {
                interface: ifa.interface_name,
                addr,
                internal: ifa.flags.contains(InterfaceFlags::IFF_LOOPBACK),
            })
        })
        .collect()
}

#[cfg(not(unix))]
pub fn interfaces() -> Vec<InterfaceAddr> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_not_empty() {
        let name = hostname();
        assert!(!name.is_empty());
        assert!(!name.contains('\n'));
    }

    #[test]
    fn meminfo_prefers_available() {
        let raw = "MemTotal:       16000 kB\nMemFree:         1000 kB\nMemAvailable:    4000 kB\n";
        let mem = parse_meminfo(raw).unwrap();
        assert_eq!(mem.total, 16000 * 1024);
        assert_eq!(mem.free, 4000 * 1024);
        assert_eq!(mem.used(), 12000 * 1024);
        assert!((mem.used_percent() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn meminfo_falls_back_to_free() {
        let mem = parse_meminfo("MemTotal: 100 kB\nMemFree: 25 kB\n").unwrap();
        assert_eq!(mem.free, 25 * 1024);
    }

    #[test]
    fn meminfo_without_total_is_none() {
        assert!(parse_meminfo("MemFree: 25 kB\n").is_none());
    }

    #[test]
    fn gigabytes_two_decimals() {
        assert_eq!(format_gb(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_gb(0), "0.00 GB");
    }

    #[test]
    fn cpu_count_positive() {
        assert!(cpu_count() >= 1);
    }

    #[cfg(unix)]
    #[test]
    fn permission_follows_euid() {
        let expected = if effective_uid() == Some(0) {
            PermissionLevel::Admin
        } else {
            PermissionLevel::Standard
        };
        assert_eq!(detect_permission_level(), expected);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn hostname_matches_proc() {
        let proc_name = std::fs::read_to_string("/proc/sys/kernel/hostname").unwrap();
        assert_eq!(hostname(), proc_name.trim());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn ids_match_proc_status() {
        let status = std::fs::read_to_string("/proc/self/status").unwrap();
        let effective = |key: &str| -> u32 {
            let line = status.lines().find(|l| l.starts_with(key)).unwrap();
            line.split_whitespace().nth(2).unwrap().parse().unwrap()
        };
        assert_eq!(effective_uid(), Some(effective("Uid:")));
        assert_eq!(effective_gid(), Some(effective("Gid:")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn loopback_is_listed_and_internal() {
        let addrs = interfaces();
        let lo = addrs.iter().find(|a| a.addr.is_loopback());
        if let Some(lo) = lo {
            assert!(lo.internal);
            assert!(!lo.interface.is_empty());
        }
    }
}
