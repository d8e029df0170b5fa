//! Real git repository fixtures.
//!
//! [`GitFixture`] lays out a bare `origin.git`, a `local` clone with one
//! pushed commit on `main` (`issues/1.json`), and an `other` clone playing
//! the part of a second machine. Everything lives in a temporary directory
//! removed on drop.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Returns true if a `git` executable can be run.
///
/// Tests against real repositories return early when this is false.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Runs `git -C dir args...` and returns its stdout.
///
/// # Panics
///
/// Panics if git cannot be run or exits unsuccessfully.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure(dir: &Path) {
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// A bare origin with two working clones.
pub struct GitFixture {
    temp: TempDir,
    origin: PathBuf,
    local: PathBuf,
    other: PathBuf,
}

impl GitFixture {
    /// Creates the fixture.
    ///
    /// # Panics
    ///
    /// Panics if any git command fails.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let origin = temp.path().join("origin.git");
        let local = temp.path().join("local");
        let other = temp.path().join("other");

        fs::create_dir_all(&origin).expect("failed to create origin dir");
        git(&origin, &["init", "--bare"]);

        fs::create_dir_all(&local).expect("failed to create local dir");
        git(&local, &["init"]);
        configure(&local);
        git(&local, &["checkout", "-b", "main"]);
        fs::create_dir_all(local.join("issues")).expect("failed to create issues dir");
        fs::write(local.join("issues/1.json"), "{\"title\":\"first\"}\n")
            .expect("failed to write issue");
        git(&local, &["add", "-A"]);
        git(&local, &["commit", "-m", "initial"]);
        let origin_url = origin.to_string_lossy().into_owned();
        git(&local, &["remote", "add", "origin", &origin_url]);
        git(&local, &["push", "-u", "origin", "main"]);

        git(temp.path(), &["clone", "-b", "main", &origin_url, "other"]);
        configure(&other);

        Self {
            temp,
            origin,
            local,
            other,
        }
    }

    /// Returns the temporary root.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Returns the bare origin.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Returns the working clone under test.
    pub fn local(&self) -> &Path {
        &self.local
    }

    /// Returns the second working clone.
    pub fn other(&self) -> &Path {
        &self.other
    }

    /// Writes `contents` to `name` in `dir` without committing.
    pub fn write(&self, dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(path, contents).expect("failed to write file");
    }

    /// Writes a file in `dir` and commits everything.
    pub fn commit_file(&self, dir: &Path, name: &str, contents: &str, message: &str) {
        self.write(dir, name, contents);
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-m", message]);
    }

    /// Commits a file in the `other` clone and pushes it to origin.
    pub fn push_from_other(&self, name: &str, contents: &str, message: &str) {
        self.commit_file(&self.other, name, contents, message);
        git(&self.other, &["push", "origin", "main"]);
    }

    /// Reads a file from the `local` clone.
    pub fn read_local(&self, name: &str) -> String {
        fs::read_to_string(self.local.join(name)).expect("failed to read file")
    }

    /// Returns the commit subjects of `dir`, newest first.
    pub fn log(&self, dir: &Path) -> Vec<String> {
        git(dir, &["log", "--format=%s"])
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}
