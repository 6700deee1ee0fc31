use std::{
    fs,
    path::{Path, PathBuf},
};

use super::ConnectivityProbe;

const CELLULAR_PREFIXES: [&str; 4] = ["wwan", "rmnet", "ppp", "ccmni"];

// ARPHRD_ETHER from linux/if_arp.h.
const ARPHRD_ETHER: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
    Cellular,
    Wired,
}

/// Connectivity probe backed by the Linux `/sys/class/net` tree.
#[derive(Debug, Clone)]
pub struct SysfsConnectivityProbe {
    root: PathBuf,
}

impl SysfsConnectivityProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Transports of every interface that is currently up.
    pub fn active_transports(&self) -> Vec<Transport> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %self.root.display(), error = %e, "network capabilities unavailable");
                return Vec::new();
            }
        };

        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let dir = entry.path();
                if name == "lo" || !is_up(&dir) {
                    return None;
                }
                classify(&name, &dir)
            })
            .collect()
    }
}

impl Default for SysfsConnectivityProbe {
    fn default() -> Self {
        Self::new("/sys/class/net")
    }
}

impl ConnectivityProbe for SysfsConnectivityProbe {
    fn is_available(&self) -> bool {
        let transports = self.active_transports();
        tracing::debug!(?transports, "active network transports");
        !transports.is_empty()
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn is_up(dir: &Path) -> bool {
    match read_trimmed(&dir.join("operstate")).as_deref() {
        Some("up") => true,
        // Point-to-point links often report "unknown" while carrying traffic.
        Some("unknown") => read_trimmed(&dir.join("carrier")).as_deref() == Some("1"),
        _ => false,
    }
}

fn classify(name: &str, dir: &Path) -> Option<Transport> {
    if dir.join("wireless").exists() || dir.join("phy80211").exists() {
        Some(Transport::Wifi)
    } else if CELLULAR_PREFIXES.iter().any(|p| name.starts_with(p)) {
        Some(Transport::Cellular)
    } else if read_trimmed(&dir.join("type")).as_deref() == Some(ARPHRD_ETHER) {
        Some(Transport::Wired)
    } else {
        None
    }
}
