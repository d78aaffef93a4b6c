//! Process and host resource readings.

use std::path::{Path, PathBuf};

use sysinfo::{Disks, Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::SamplerError;

/// Raw resource numbers, before normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceReading {
    pub process_rss_bytes: u64,
    /// Percent of one core; can exceed 100 on multi-core hosts.
    pub process_cpu_percent: f32,
    pub system_cpu_percent: f32,
    pub cpu_count: usize,
    pub memory_total_bytes: u64,
    pub memory_available_bytes: u64,
    pub disk_total_bytes: u64,
    pub disk_available_bytes: u64,
}

pub trait ResourceProbe: Send {
    /// Reads current usage. `disk_path` selects the filesystem to report.
    fn read(&mut self, disk_path: &Path) -> Result<ResourceReading, SamplerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MountUsage {
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

/// The mount holding `path`: the longest mount point that prefixes it.
///
/// An unreadable path falls back to `/`.
pub(crate) fn select_mount<'a>(mounts: &'a [MountUsage], path: &Path) -> Option<&'a MountUsage> {
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from("/"));

    mounts
        .iter()
        .filter(|m| target.starts_with(&m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
}

/// [`ResourceProbe`] backed by `sysinfo`.
///
/// CPU figures are deltas between refreshes, so the probe is primed on
/// construction and the first real reading covers the time since then.
pub struct SystemProbe {
    system: System,
    pid: Option<Pid>,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = sysinfo::get_current_pid().ok();

        system.refresh_cpu_usage();
        if let Some(pid) = pid {
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_cpu().with_memory(),
            );
        }

        Self { system, pid }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SystemProbe {
    fn read(&mut self, disk_path: &Path) -> Result<ResourceReading, SamplerError> {
        let pid = self
            .pid
            .ok_or_else(|| SamplerError::Probe("current pid unavailable".to_string()))?;

        self.system.refresh_memory();
        self.system.refresh_cpu_usage();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let process = self
            .system
            .process(pid)
            .ok_or_else(|| SamplerError::Probe(format!("process {pid} not visible")))?;

        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<MountUsage> = disks
            .list()
            .iter()
            .map(|d| MountUsage {
                mount_point: d.mount_point().to_path_buf(),
                total: d.total_space(),
                available: d.available_space(),
            })
            .collect();
        let (disk_total_bytes, disk_available_bytes) = select_mount(&mounts, disk_path)
            .map(|m| (m.total, m.available))
            .unwrap_or((0, 0));

        Ok(ResourceReading {
            process_rss_bytes: process.memory(),
            process_cpu_percent: process.cpu_usage(),
            system_cpu_percent: self.system.global_cpu_usage(),
            cpu_count: self.system.cpus().len().max(1),
            memory_total_bytes: self.system.total_memory(),
            memory_available_bytes: self.system.available_memory(),
            disk_total_bytes,
            disk_available_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount(path: &str) -> MountUsage {
        MountUsage {
            mount_point: PathBuf::from(path),
            total: 100,
            available: 40,
        }
    }

    #[test]
    fn test_select_mount_prefers_longest_prefix() {
        let dir = std::env::temp_dir();
        let canonical = std::fs::canonicalize(&dir).unwrap();
        let mounts = vec![mount("/"), mount(canonical.to_str().unwrap())];

        let selected = select_mount(&mounts, &dir).unwrap();
        assert_eq!(selected.mount_point, canonical);
    }

    #[test]
    fn test_select_mount_unreadable_path_falls_back_to_root() {
        let mounts = vec![mount("/"), mount("/definitely/not/here")];
        let selected = select_mount(&mounts, Path::new("/no/such/dir/for/samples")).unwrap();
        assert_eq!(selected.mount_point, PathBuf::from("/"));
    }

    #[test]
    fn test_select_mount_without_mounts() {
        assert!(select_mount(&[], Path::new("/")).is_none());
    }

    #[test]
    fn test_system_probe_reads_current_process() {
        let mut probe = SystemProbe::new();
        let reading = probe.read(Path::new("/")).unwrap();
        assert!(reading.process_rss_bytes > 0);
        assert!(reading.memory_total_bytes >= reading.memory_available_bytes);
        assert!(reading.cpu_count >= 1);
    }
}
