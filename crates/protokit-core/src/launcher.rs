//! ProcessLauncher — runs an app file under the dev server as a detached child.
//!
//! Fire-and-forget: no health check and no supervision after launch. Stopping is
//! a best-effort sweep of processes that look like previously launched apps.

use crate::error::LaunchError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use sysinfo::System;

static APP_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{8}_\d{6}\.[A-Za-z0-9]+$").expect("app file pattern"));

/// How the dev server is invoked: `<program> <args…> <app_path> --server.port <port>`.
#[derive(Debug, Clone)]
pub struct LauncherSettings {
    pub program: String,
    pub args: Vec<String>,
    pub port: u16,
    /// Apps directory; processes mentioning it are candidates for `stop_conflicting`.
    pub apps_dir: PathBuf,
    /// How long `launch` watches the child for an immediate exit.
    pub startup_grace: Duration,
}

/// A freshly spawned app server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedApp {
    pub pid: u32,
    pub url: String,
}

pub struct ProcessLauncher {
    settings: LauncherSettings,
    child: Option<Child>,
}

impl ProcessLauncher {
    pub fn new(settings: LauncherSettings) -> Self {
        Self {
            settings,
            child: None,
        }
    }

    /// Well-known local URL of the launched app.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}/", self.settings.port)
    }

    /// Pid of the child spawned by this launcher, if any.
    pub fn child_pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Best-effort termination of earlier app servers. Kills our own child, then any
    /// process whose command line names the apps directory and a timestamped app file.
    /// May miss processes or hit unrelated ones that share the naming convention.
    pub fn stop_conflicting(&mut self) -> usize {
        let mut stopped = 0;

        if let Some(mut child) = self.child.take() {
            let pid = child.id();
            if child.kill().is_ok() {
                let _ = child.wait();
                stopped += 1;
                tracing::info!("[LAUNCHER] Stopped previous app server (pid {})", pid);
            }
        }

        let own_pid = sysinfo::get_current_pid().ok();
        let apps_dir = self.settings.apps_dir.to_string_lossy().to_string();
        let apps_dir = apps_dir.trim_start_matches("./");

        let mut sys = System::new();
        sys.refresh_processes();
        for (pid, process) in sys.processes() {
            if Some(*pid) == own_pid {
                continue;
            }
            if is_app_server_cmdline(process.cmd(), apps_dir) && process.kill() {
                stopped += 1;
                tracing::info!("[LAUNCHER] Stopped stray app server (pid {})", pid);
            }
        }
        stopped
    }

    /// Start the dev server for `app_path`. Blocks for at most the startup grace period.
    pub fn launch(&mut self, app_path: &Path) -> Result<LaunchedApp, LaunchError> {
        if !app_path.is_file() {
            return Err(LaunchError::MissingApp(app_path.to_path_buf()));
        }

        let program = self.settings.program.clone();
        let mut cmd = Command::new(&program);
        cmd.args(&self.settings.args)
            .arg(app_path)
            .arg("--server.port")
            .arg(self.settings.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;

        let deadline = Instant::now() + self.settings.startup_grace;
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(LaunchError::ExitedEarly {
                    program,
                    status: status.to_string(),
                });
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        let pid = child.id();
        self.child = Some(child);
        let url = self.endpoint();
        tracing::info!(
            "[LAUNCHER] Started {} for {} (pid {}) at {}",
            program,
            app_path.display(),
            pid,
            url
        );
        Ok(LaunchedApp { pid, url })
    }
}

/// Command-line heuristic for "an app server we launched earlier".
pub fn is_app_server_cmdline(cmd: &[String], apps_dir: &str) -> bool {
    let mentions_dir = !apps_dir.is_empty() && cmd.iter().any(|a| a.contains(apps_dir));
    let names_app = cmd.iter().any(|a| APP_FILE_RE.is_match(a));
    mentions_dir && names_app
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(program: &str, apps_dir: &Path) -> LauncherSettings {
        LauncherSettings {
            program: program.to_string(),
            args: vec!["run".to_string()],
            port: 8502,
            apps_dir: apps_dir.to_path_buf(),
            startup_grace: Duration::ZERO,
        }
    }

    #[test]
    fn cmdline_heuristic() {
        let cmd = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(is_app_server_cmdline(
            &cmd(&["python", "streamlit", "run", "app_data/20240101_120000.py"]),
            "app_data"
        ));
        assert!(!is_app_server_cmdline(
            &cmd(&["python", "streamlit", "run", "other/20240101_120000.py"]),
            "app_data"
        ));
        assert!(!is_app_server_cmdline(
            &cmd(&["python", "app_data/helper.py"]),
            "app_data"
        ));
        assert!(!is_app_server_cmdline(&cmd(&["python", "20240101_120000.py"]), ""));
    }

    #[test]
    fn launch_missing_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut launcher = ProcessLauncher::new(settings("true", tmp.path()));
        let err = launcher.launch(&tmp.path().join("20240101_120000.py")).unwrap_err();
        assert!(matches!(err, LaunchError::MissingApp(_)));
    }

    #[test]
    fn launch_missing_binary_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("20240101_120000.py");
        std::fs::write(&app, "x = 1").unwrap();
        let mut launcher =
            ProcessLauncher::new(settings("protokit-definitely-missing-binary", tmp.path()));
        let err = launcher.launch(&app).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert!(err.to_string().contains("protokit-definitely-missing-binary"));
        assert!(launcher.child_pid().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn launch_then_stop_own_child() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("20240101_120000.py");
        std::fs::write(&app, "x = 1").unwrap();
        let mut launcher = ProcessLauncher::new(LauncherSettings {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string(), "sh".to_string()],
            port: 8502,
            apps_dir: tmp.path().to_path_buf(),
            startup_grace: Duration::from_millis(100),
        });
        let launched = launcher.launch(&app).unwrap();
        assert_eq!(launched.url, "http://localhost:8502/");
        assert_eq!(launcher.child_pid(), Some(launched.pid));
        assert!(launcher.stop_conflicting() >= 1);
        assert!(launcher.child_pid().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn launch_reports_immediate_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("20240101_120000.py");
        std::fs::write(&app, "x = 1").unwrap();
        let mut launcher = ProcessLauncher::new(LauncherSettings {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string(), "sh".to_string()],
            port: 8502,
            apps_dir: tmp.path().to_path_buf(),
            startup_grace: Duration::from_secs(5),
        });
        let err = launcher.launch(&app).unwrap_err();
        assert!(matches!(err, LaunchError::ExitedEarly { .. }));
        assert!(err.to_string().contains("exited immediately"));
        assert!(err.to_string().contains('3'));
        assert!(launcher.child_pid().is_none());
    }
}
