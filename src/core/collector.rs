use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sysinfo::{Disks, Networks, Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::core::errors::SourceError;
use crate::core::types::{NetCounters, ProcessInfo};

/// Point-in-time reads against the host.
///
/// Shared by every sampler thread. Each method is called by exactly one
/// sampler, so implementations may keep per-metric state behind separate
/// locks without contention.
pub trait MetricsSource: Send + Sync {
    /// Global CPU utilisation, 0..=100.
    fn cpu_percent(&self) -> Result<f64, SourceError>;

    /// Used memory as a share of total, 0..=100.
    fn memory_percent(&self) -> Result<f64, SourceError>;

    /// Used space on the root volume, 0..=100.
    fn disk_percent(&self) -> Result<f64, SourceError>;

    /// Cumulative bytes sent/received since boot.
    fn net_counters(&self) -> Result<NetCounters, SourceError>;

    /// Current process table. Entries that could not be resolved are
    /// reported individually so the rest of the table is still usable.
    fn processes(&self) -> Result<Vec<Result<ProcessInfo, SourceError>>, SourceError>;

    /// Threads in this process, the main thread included.
    fn thread_count(&self) -> Result<usize, SourceError>;

    /// Processes on the host.
    fn process_count(&self) -> Result<usize, SourceError>;
}

/// Collects metrics from the underlying OS.
pub struct SysinfoSource {
    cpu: Mutex<System>,
    memory: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    processes: Mutex<System>,
    threads: Mutex<System>,
    process_count: Mutex<System>,
    tasks_unsupported: AtomicBool,
}

impl SysinfoSource {
    /// Creates a new source and primes the CPU counters so the first
    /// reading is a real delta.
    pub fn new() -> Self {
        let mut cpu = System::new();
        cpu.refresh_cpu_usage();

        Self {
            cpu: Mutex::new(cpu),
            memory: Mutex::new(System::new()),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            processes: Mutex::new(System::new()),
            threads: Mutex::new(System::new()),
            process_count: Mutex::new(System::new()),
            tasks_unsupported: AtomicBool::new(false),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

/// Refresh the process table, task lists included.
///
/// On Linux sysinfo lists every userland thread as its own entry; the
/// task lists are what let us tell them apart from real processes.
fn refresh_process_table(sys: &mut System, kind: ProcessRefreshKind) {
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, kind.with_tasks());
}

/// PIDs that belong to some other process's task list, i.e. threads.
fn thread_pids(sys: &System) -> HashSet<Pid> {
    sys.processes()
        .iter()
        .filter_map(|(pid, process)| Some((*pid, process.tasks()?)))
        .flat_map(|(leader, tasks)| tasks.iter().copied().filter(move |tid| *tid != leader))
        .collect()
}

impl MetricsSource for SysinfoSource {
    fn cpu_percent(&self) -> Result<f64, SourceError> {
        let mut sys = self.cpu.lock();
        sys.refresh_cpu_usage();
        if sys.cpus().is_empty() {
            return Err(SourceError::Unavailable("cpu"));
        }
        Ok(f64::from(sys.global_cpu_usage()))
    }

    fn memory_percent(&self) -> Result<f64, SourceError> {
        let mut sys = self.memory.lock();
        sys.refresh_memory();
        percent(sys.used_memory(), sys.total_memory()).ok_or(SourceError::Unavailable("memory"))
    }

    fn disk_percent(&self) -> Result<f64, SourceError> {
        let mut disks = self.disks.lock();
        disks.refresh(true);
        let root = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first())
            .ok_or(SourceError::NoRootVolume)?;
        let total = root.total_space();
        percent(total.saturating_sub(root.available_space()), total)
            .ok_or(SourceError::Unavailable("disk"))
    }

    fn net_counters(&self) -> Result<NetCounters, SourceError> {
        let mut networks = self.networks.lock();
        networks.refresh(true);
        let mut counters = NetCounters::default();
        for data in networks.list().values() {
            counters.sent = counters.sent.saturating_add(data.total_transmitted());
            counters.received = counters.received.saturating_add(data.total_received());
        }
        Ok(counters)
    }

    fn processes(&self) -> Result<Vec<Result<ProcessInfo, SourceError>>, SourceError> {
        let mut sys = self.processes.lock();
        refresh_process_table(&mut sys, ProcessRefreshKind::nothing().with_memory());
        let threads = thread_pids(&sys);

        let mut entries: Vec<_> = sys
            .processes()
            .iter()
            .filter(|(pid, _)| !threads.contains(*pid))
            .map(|(pid, process)| {
                let name = process.name().to_string_lossy();
                if name.is_empty() {
                    return Err(SourceError::ProcessVanished(pid.as_u32()));
                }
                Ok(ProcessInfo {
                    pid: pid.as_u32(),
                    name: name.into_owned(),
                    rss_bytes: process.memory(),
                })
            })
            .collect();
        entries.sort_by_key(|entry| match entry {
            Ok(info) => info.pid,
            Err(SourceError::ProcessVanished(pid)) => *pid,
            Err(_) => u32::MAX,
        });
        Ok(entries)
    }

    fn thread_count(&self) -> Result<usize, SourceError> {
        let pid: Pid =
            sysinfo::get_current_pid().map_err(|_| SourceError::Unavailable("current pid"))?;
        let mut sys = self.threads.lock();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_tasks(),
        );
        let process = sys
            .process(pid)
            .ok_or(SourceError::Unavailable("current process"))?;
        // Task lists are only populated on Linux.
        let Some(tasks) = process.tasks() else {
            if !self.tasks_unsupported.swap(true, Ordering::Relaxed) {
                tracing::warn!("thread count is not available on this platform");
            }
            return Err(SourceError::Unavailable("thread count"));
        };
        // The task list holds the other threads, not the leader itself.
        Ok(tasks.iter().filter(|tid| **tid != pid).count() + 1)
    }

    fn process_count(&self) -> Result<usize, SourceError> {
        let mut sys = self.process_count.lock();
        refresh_process_table(&mut sys, ProcessRefreshKind::nothing());
        let threads = thread_pids(&sys);
        Ok(sys
            .processes()
            .keys()
            .filter(|pid| !threads.contains(*pid))
            .count())
    }
}
