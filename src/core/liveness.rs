//! Daemon liveness probe
//!
//! Decides whether the managing daemon is running by following its PID file
//! into the process table:
//!
//! 1. the PID file exists and can be read
//! 2. `<proc_root>/<pid>` exists
//! 3. `<proc_root>/<pid>/cmdline` can be read
//! 4. the command line contains the daemon's program name
//!
//! Any failed step means "not running"; nothing is returned as an error and
//! nothing is retried. The final check is a substring match, so an unrelated
//! process whose command line happens to contain the program name (an editor
//! open on the daemon's config, for example) is also reported as running.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Default process table mount point
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Outcome of each probe step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running { pid: u32 },
    NoPidFile,
    PidFileUnreadable,
    InvalidPid,
    ProcessGone,
    CmdlineUnreadable,
    NameMismatch,
    /// The probe task panicked or was cancelled before reporting
    ProbeFailed,
}

impl Liveness {
    pub fn is_running(&self) -> bool {
        matches!(self, Liveness::Running { .. })
    }

    pub const fn describe(&self) -> &'static str {
        match self {
            Liveness::Running { .. } => "running",
            Liveness::NoPidFile => "not running (no PID file)",
            Liveness::PidFileUnreadable => "not running (PID file unreadable)",
            Liveness::InvalidPid => "not running (PID file does not hold a process id)",
            Liveness::ProcessGone => "not running (process no longer exists)",
            Liveness::CmdlineUnreadable => "not running (process command line unreadable)",
            Liveness::NameMismatch => "not running (PID belongs to another program)",
            Liveness::ProbeFailed => "unknown (liveness check did not complete)",
        }
    }
}

/// PID-file based liveness check for one daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessProbe {
    pub pid_file: PathBuf,
    pub proc_root: PathBuf,
    pub program: String,
}

impl LivenessProbe {
    /// Probe for `daemon` using `/var/run/<daemon>.pid` and `/proc`.
    pub fn for_daemon(daemon: &str) -> Self {
        Self {
            pid_file: default_pid_file(daemon),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            program: daemon.to_string(),
        }
    }

    /// Runs every step and reports where it stopped.
    ///
    /// Blocks on two small file reads.
    pub fn probe(&self) -> Liveness {
        if !self.pid_file.exists() {
            debug!("PID file {:?} does not exist", self.pid_file);
            return Liveness::NoPidFile;
        }

        let content = match std::fs::read_to_string(&self.pid_file) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read PID file {:?}: {}", self.pid_file, e);
                return Liveness::PidFileUnreadable;
            }
        };

        let first_line = content.lines().next().unwrap_or_default().trim();
        let pid = match first_line.parse::<u32>() {
            Ok(pid) if pid > 0 => pid,
            _ => {
                debug!("PID file {:?} holds '{}'", self.pid_file, first_line);
                return Liveness::InvalidPid;
            }
        };

        let process_dir = self.proc_root.join(pid.to_string());
        if !process_dir.exists() {
            debug!("Process {} is gone", pid);
            return Liveness::ProcessGone;
        }

        let cmdline = match std::fs::read(process_dir.join("cmdline")) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).replace('\0', " "),
            Err(e) => {
                debug!("Cannot read command line of {}: {}", pid, e);
                return Liveness::CmdlineUnreadable;
            }
        };

        if cmdline.contains(&self.program) {
            Liveness::Running { pid }
        } else {
            debug!("Process {} is '{}', not {}", pid, cmdline.trim(), self.program);
            Liveness::NameMismatch
        }
    }

    pub fn is_running(&self) -> bool {
        self.probe().is_running()
    }

    /// Runs [`probe`](Self::probe) on tokio's blocking pool.
    ///
    /// A panicked or cancelled probe task is [`Liveness::ProbeFailed`].
    pub async fn probe_async(&self) -> Liveness {
        let probe = self.clone();
        settle(tokio::task::spawn_blocking(move || probe.probe()).await)
    }

    pub async fn is_running_async(&self) -> bool {
        self.probe_async().await.is_running()
    }
}

fn settle(joined: Result<Liveness, tokio::task::JoinError>) -> Liveness {
    joined.unwrap_or_else(|e| {
        debug!("Liveness probe task failed: {}", e);
        Liveness::ProbeFailed
    })
}

/// `/var/run/<daemon>.pid`
pub fn default_pid_file(daemon: &str) -> PathBuf {
    Path::new("/var/run").join(format!("{daemon}.pid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FakeSystem {
        dir: TempDir,
    }

    impl FakeSystem {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir(dir.path().join("proc")).unwrap();
            Self { dir }
        }

        fn probe(&self) -> LivenessProbe {
            LivenessProbe {
                pid_file: self.dir.path().join("fwd.pid"),
                proc_root: self.dir.path().join("proc"),
                program: "fwd".to_string(),
            }
        }

        fn write_pid(&self, content: &str) {
            std::fs::write(self.dir.path().join("fwd.pid"), content).unwrap();
        }

        fn spawn(&self, pid: u32, cmdline: &[u8]) {
            let dir = self.dir.path().join("proc").join(pid.to_string());
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join("cmdline"), cmdline).unwrap();
        }
    }

    #[test]
    fn test_no_pid_file() {
        let sys = FakeSystem::new();
        assert_eq!(sys.probe().probe(), Liveness::NoPidFile);
        assert!(!sys.probe().is_running());
    }

    #[test]
    fn test_process_gone() {
        let sys = FakeSystem::new();
        sys.write_pid("4242\n");
        assert_eq!(sys.probe().probe(), Liveness::ProcessGone);
    }

    #[test]
    fn test_running_with_trailing_newline() {
        let sys = FakeSystem::new();
        sys.write_pid("4242\n");
        sys.spawn(4242, b"/usr/bin/python\0/usr/sbin/fwd\0--nofork\0");
        assert_eq!(sys.probe().probe(), Liveness::Running { pid: 4242 });
        assert!(sys.probe().is_running());
    }

    #[test]
    fn test_name_mismatch() {
        let sys = FakeSystem::new();
        sys.write_pid("17");
        sys.spawn(17, b"/usr/sbin/sshd\0-D\0");
        assert_eq!(sys.probe().probe(), Liveness::NameMismatch);
    }

    #[test]
    fn test_invalid_pid() {
        let sys = FakeSystem::new();
        sys.write_pid("not-a-pid\n");
        assert_eq!(sys.probe().probe(), Liveness::InvalidPid);
        sys.write_pid("");
        assert_eq!(sys.probe().probe(), Liveness::InvalidPid);
        sys.write_pid("0\n");
        assert_eq!(sys.probe().probe(), Liveness::InvalidPid);
    }

    #[test]
    fn test_cmdline_unreadable() {
        let sys = FakeSystem::new();
        sys.write_pid("99");
        std::fs::create_dir(sys.dir.path().join("proc").join("99")).unwrap();
        assert_eq!(sys.probe().probe(), Liveness::CmdlineUnreadable);
    }

    #[test]
    fn test_substring_match_is_loose() {
        let sys = FakeSystem::new();
        sys.write_pid("5");
        sys.spawn(5, b"vim\0/etc/fwd/fwd.conf\0");
        assert!(sys.probe().is_running());
    }

    #[tokio::test]
    async fn test_failed_probe_task_is_reported_as_such() {
        let joined = tokio::task::spawn_blocking(|| -> Liveness { panic!("probe aborted") }).await;
        let outcome = settle(joined);
        assert_eq!(outcome, Liveness::ProbeFailed);
        assert!(!outcome.is_running());
        assert!(!outcome.describe().contains("PID file"));
    }

    #[test]
    fn test_for_daemon_paths() {
        let probe = LivenessProbe::for_daemon("firewalld");
        assert_eq!(probe.pid_file, PathBuf::from("/var/run/firewalld.pid"));
        assert_eq!(probe.proc_root, PathBuf::from("/proc"));
        assert_eq!(probe.program, "firewalld");
    }

    #[tokio::test]
    async fn test_probe_async() {
        let sys = FakeSystem::new();
        sys.write_pid("31\n");
        sys.spawn(31, b"fwd\0");
        assert!(sys.probe().is_running_async().await);
    }
}
