use std::time::Duration;

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{ProcessHandle, WatchState};

/// One row of a process snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// Read access to the live process list.
pub trait ProcessTable: Send {
    /// Every running process, in the platform's enumeration order.
    fn snapshot(&mut self) -> Vec<ProcessEntry>;

    fn is_alive(&mut self, pid: u32) -> bool;
}

/// `sysinfo`-backed process table. Skips the launcher's own process.
pub struct SystemProcessTable {
    system: System,
    own_pid: u32,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            own_pid: std::process::id(),
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn snapshot(&mut self) -> Vec<ProcessEntry> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.system
            .processes()
            .iter()
            // Linux lists every thread as a task; only whole processes count.
            .filter(|(pid, process)| {
                pid.as_u32() != self.own_pid && process.thread_kind().is_none()
            })
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .collect()
    }

    fn is_alive(&mut self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        // An unreaped child lingers as a zombie after it exited.
        self.system
            .process(pid)
            .is_some_and(|process| process.status() != ProcessStatus::Zombie)
    }
}

/// First entry whose name contains `filter`, ignoring case.
pub fn find_match(entries: &[ProcessEntry], filter: &str) -> Option<ProcessHandle> {
    let needle = filter.to_lowercase();
    entries
        .iter()
        .find(|entry| entry.name.to_lowercase().contains(&needle))
        .map(|entry| ProcessHandle {
            matched_name: entry.name.clone(),
            pid: entry.pid,
        })
}

/// Searches for a process by name, then waits for that exact pid to go away.
pub struct ProcessWatcher<T> {
    table: T,
    filter: String,
    interval: Duration,
}

impl<T: ProcessTable> ProcessWatcher<T> {
    pub fn new(table: T, filter: impl Into<String>, interval: Duration) -> Self {
        Self {
            table,
            filter: filter.into(),
            interval,
        }
    }

    /// Advance the state machine by one poll.
    pub fn poll(&mut self, state: WatchState) -> WatchState {
        match state {
            WatchState::Searching => match find_match(&self.table.snapshot(), &self.filter) {
                Some(handle) => WatchState::Found(handle),
                None => WatchState::Searching,
            },
            WatchState::Found(handle) => WatchState::Watching(handle),
            WatchState::Watching(handle) => {
                if self.table.is_alive(handle.pid) {
                    WatchState::Watching(handle)
                } else {
                    WatchState::Terminated(handle)
                }
            }
            done @ (WatchState::Terminated(_) | WatchState::Cancelled) => done,
        }
    }

    /// Poll until the matched process exits or `cancel` fires.
    ///
    /// Returns either `Terminated` or `Cancelled`. `on_found` runs once, when
    /// the match is captured. Cancellation is checked before every poll and
    /// interrupts every sleep, so nothing is reported after it was observed.
    pub async fn run<F>(mut self, cancel: &CancellationToken, mut on_found: F) -> WatchState
    where
        F: FnMut(&ProcessHandle),
    {
        info!(filter = %self.filter, interval = ?self.interval, "Searching for process");
        let mut state = WatchState::Searching;

        loop {
            if cancel.is_cancelled() {
                info!("Process watch cancelled");
                return WatchState::Cancelled;
            }

            state = match self.poll(state) {
                WatchState::Found(handle) => {
                    info!(name = %handle.matched_name, pid = handle.pid, "Process found");
                    on_found(&handle);
                    let watching = self.poll(WatchState::Found(handle));
                    debug!(state = ?watching, "Watching process");
                    watching
                }
                WatchState::Terminated(handle) => {
                    info!(name = %handle.matched_name, pid = handle.pid, "Process exited");
                    return WatchState::Terminated(handle);
                }
                WatchState::Searching => {
                    debug!(filter = %self.filter, "No matching process yet");
                    WatchState::Searching
                }
                other => other,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Process watch cancelled");
                    return WatchState::Cancelled;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays scripted snapshots; the last one repeats forever.
    #[derive(Clone, Default)]
    pub struct FakeTable {
        inner: Arc<Mutex<FakeState>>,
    }

    #[derive(Default)]
    struct FakeState {
        snapshots: VecDeque<Vec<ProcessEntry>>,
        alive_polls: usize,
        snapshot_calls: usize,
        liveness_checks: Vec<u32>,
    }

    impl FakeTable {
        /// `alive_polls` liveness checks answer `true`, every later one `false`.
        pub fn new(snapshots: Vec<Vec<ProcessEntry>>, alive_polls: usize) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    snapshots: snapshots.into(),
                    alive_polls,
                    ..FakeState::default()
                })),
            }
        }

        pub fn snapshot_calls(&self) -> usize {
            self.inner.lock().unwrap().snapshot_calls
        }

        pub fn liveness_checks(&self) -> Vec<u32> {
            self.inner.lock().unwrap().liveness_checks.clone()
        }
    }

    pub fn entry(pid: u32, name: &str) -> ProcessEntry {
        ProcessEntry {
            pid,
            name: name.to_string(),
        }
    }

    impl ProcessTable for FakeTable {
        fn snapshot(&mut self) -> Vec<ProcessEntry> {
            let mut state = self.inner.lock().unwrap();
            state.snapshot_calls += 1;
            if state.snapshots.len() > 1 {
                state.snapshots.pop_front().unwrap_or_default()
            } else {
                state.snapshots.front().cloned().unwrap_or_default()
            }
        }

        fn is_alive(&mut self, pid: u32) -> bool {
            let mut state = self.inner.lock().unwrap();
            state.liveness_checks.push(pid);
            if state.alive_polls > 0 {
                state.alive_polls -= 1;
                true
            } else {
                false
            }
        }
    }
}
