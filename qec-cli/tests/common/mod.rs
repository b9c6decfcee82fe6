//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builder helpers with isolated settings
//! - Compose project fixtures

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variables that would leak host settings into a test.
const QEC_VARS: [&str; 7] = [
    "QEC_PORT_OFFSET",
    "QEC_MERGED_FILE",
    "QEC_COMPOSE_BINARY",
    "QEC_NAMESPACE_COLLISION",
    "QEC_LOAD_DOTENV",
    "QEC_DATA_DIR",
    "QEC_LOG_MODE",
];

/// Test environment with isolated settings.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the user settings directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let data_dir = temp_path.join("qec-data");

        Self {
            temp_dir,
            temp_path,
            data_dir,
        }
    }

    /// Get a command builder with the data directory pre-configured and
    /// no `QEC_*` variables inherited.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("qec").expect("Failed to find qec binary");
        for var in QEC_VARS {
            cmd.env_remove(var);
        }
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write `<temp>/<dir>/docker-compose.yml` and return its path.
    pub fn project(&self, dir: &str, yaml: &str) -> PathBuf {
        self.write(dir, "docker-compose.yml", yaml)
    }

    /// Write `<temp>/<dir>/<name>` and return its path.
    pub fn write(&self, dir: &str, name: &str, contents: &str) -> PathBuf {
        let dir = self.temp_path.join(dir);
        fs::create_dir_all(&dir).expect("Failed to create test directory");
        let path = dir.join(name);
        fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Install an executable `docker-compose` script that prints its
    /// arguments and exits with `code`.
    #[cfg(unix)]
    pub fn fake_compose(&self, code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = format!("#!/bin/sh\necho \"compose $*\"\nexit {code}\n");
        let path = self.write("bin", "docker-compose", &script);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
        path
    }

    /// Two projects whose `web` services both publish port 80.
    pub fn web_pair(&self) -> (PathBuf, PathBuf) {
        let web = "services:\n  web:\n    image: nginx\n    ports: ['80:80']\n";
        (self.project("alpha", web), self.project("beta", web))
    }
}
