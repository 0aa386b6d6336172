// Common test utilities shared across acceptance tests
//
// ## Test Isolation Strategy
//
// Each test gets its own temporary project directory with:
// - a minimal CMake project (CMakeLists.txt, src/CMakeLists.txt, CMakePresets.json)
// - a fake `cmake` shell script that appends its arguments to `cmake.log`
//   and exits with codes taken from FAKE_CONFIGURE_EXIT / FAKE_BUILD_EXIT
//
// The fake configure step creates `<build dir>/CMakeCache.txt` on success,
// like the real tool does. Nothing outside the temp directory is touched and
// XDG_CONFIG_HOME points into the temp directory so a developer's global
// cmk config never leaks in.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const FAKE_CMAKE: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/cmake.log"
if [ "$1" = "--build" ]; then
    exit "${FAKE_BUILD_EXIT:-0}"
fi
code="${FAKE_CONFIGURE_EXIT:-0}"
if [ "$code" = "0" ]; then
    mkdir -p "$5"
    touch "$5/CMakeCache.txt"
fi
exit "$code"
"#;

pub struct TestProject {
    temp_dir: TempDir,
    tools_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tools_dir = temp_dir.path().join("tools");
        fs::create_dir_all(&tools_dir).expect("Failed to create tools dir");

        let project = Self {
            temp_dir,
            tools_dir,
        };

        fs::create_dir_all(project.path()).expect("Failed to create project dir");
        project.write("CMakeLists.txt", "cmake_minimum_required(VERSION 3.21)\n");
        project.write("src/CMakeLists.txt", "add_executable(app main.cpp)\n");
        project.write("CMakePresets.json", "{\"version\": 3}\n");
        project.install_fake_cmake();
        project
    }

    /// Project root
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("project")
    }

    pub fn fake_cmake(&self) -> PathBuf {
        self.tools_dir.join("cmake")
    }

    fn install_fake_cmake(&self) {
        let script = self.fake_cmake();
        fs::write(&script, FAKE_CMAKE).expect("Failed to write fake cmake");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&script).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&script, perms).unwrap();
        }
    }

    /// `cmk` pointed at this project and the fake cmake
    pub fn cmk(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cmk"));
        cmd.arg("-C")
            .arg(self.path())
            .arg("--cmake")
            .arg(self.fake_cmake())
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("xdg"))
            .env_remove("RUST_LOG")
            .env_remove("CMK_CONFIG")
            .env_remove("CMK_BUILD_DIR")
            .env_remove("CMK_DIRECTORY")
            .env_remove("CMK_CMAKE");
        cmd
    }

    pub fn write(&self, rel: &str, content: &str) {
        let file = self.path().join(rel);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(file, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path().join(rel)).ok()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path().join(rel).exists()
    }

    /// Push a tracked file's mtime forward so the change is visible even on
    /// filesystems with coarse timestamps
    pub fn bump_mtime(&self, rel: &str) {
        let file = self.path().join(rel);
        let current = fs::metadata(&file).unwrap().modified().unwrap();
        let later = current.max(SystemTime::now()) + Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();
    }

    /// Lines the fake cmake recorded, oldest first
    pub fn cmake_calls(&self) -> Vec<String> {
        fs::read_to_string(self.tools_dir.join("cmake.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn clear_cmake_calls(&self) {
        let _ = fs::remove_file(self.tools_dir.join("cmake.log"));
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}
