//! Utility functions for directory management and system integration
//!
//! Directories follow the XDG Base Directory specification:
//!
//! - Data: `~/.local/share/fwspec/` - Configuration (`config.json`)

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub fn get_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "fwspec", "fwspec").map(|pd| pd.data_dir().to_path_buf())
}

/// Lists network interface names known to the kernel, sorted.
pub fn list_interfaces() -> Vec<String> {
    list_interfaces_in(Path::new("/sys/class/net"))
}

fn list_interfaces_in(dir: &Path) -> Vec<String> {
    let mut interfaces = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(name) = entry.file_name().into_string() {
                interfaces.push(name);
            }
        }
    }
    interfaces.sort();
    interfaces
}
