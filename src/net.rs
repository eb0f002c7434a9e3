//! Online/offline presence.
//!
//! [`NetworkMonitor`] only reacts to transition events. Where those events
//! come from is the job of a [`LinkProbe`] and the [`LinkWatcher`] thread.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SYS_CLASS_NET: &str = "/sys/class/net";
const WATCH_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
pub struct NetworkMonitor {
    online: bool,
    transitions: u64,
}

impl NetworkMonitor {
    pub fn activate(initial: bool) -> Self {
        log::info!("network {}", if initial { "online" } else { "offline" });
        Self {
            online: initial,
            transitions: 0,
        }
    }

    /// Records a reported transition. Repeated reports of the same state are
    /// still counted; nothing is debounced.
    pub fn on_transition(&mut self, online: bool) {
        self.online = online;
        self.transitions += 1;
        log::info!("network {}", if online { "online" } else { "offline" });
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Runtime signal
// ═══════════════════════════════════════════════════════════════════════════════

pub trait LinkProbe: Send {
    fn is_online(&self) -> bool;
}

/// Online when any non-loopback interface reports `operstate` `up`.
pub struct SysfsLinkProbe {
    root: PathBuf,
}

impl SysfsLinkProbe {
    pub fn new() -> Self {
        Self::at(SYS_CLASS_NET)
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsLinkProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkProbe for SysfsLinkProbe {
    fn is_online(&self) -> bool {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return false;
        };
        entries.flatten().any(|iface| {
            iface.file_name() != "lo"
                && fs::read_to_string(iface.path().join("operstate"))
                    .map(|s| s.trim() == "up")
                    .unwrap_or(false)
        })
    }
}

/// A signal pinned by the operator (`--online` / `--offline`).
pub struct FixedProbe(pub bool);

impl LinkProbe for FixedProbe {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Background thread that turns a probe into transition events. It sends
/// `f(online)` only when the value differs from the last one seen.
pub struct LinkWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LinkWatcher {
    pub fn spawn<E, F>(probe: Box<dyn LinkProbe>, initial: bool, tx: Sender<E>, f: F) -> Self
    where
        E: Send + 'static,
        F: Fn(bool) -> E + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut last = initial;
            while !stop_flag.load(Ordering::Relaxed) {
                thread::sleep(WATCH_PERIOD);
                let now = probe.is_online();
                if now != last {
                    last = now;
                    if tx.send(f(now)).is_err() {
                        break;
                    }
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for LinkWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
