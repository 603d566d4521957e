#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_user_loader::record::PersistableUser;
use tempfile::{TempDir, tempdir};

/// Scratch directory that cleans up its files on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn database(&self) -> PathBuf {
        self.temp_dir.path().join("users.db")
    }
}

/// A name that violates the `users.name` length check.
pub fn oversized_name() -> String {
    "x".repeat(300)
}

pub fn users(count: usize) -> Vec<PersistableUser> {
    (0..count)
        .map(|idx| PersistableUser::new(format!("User {idx}"), (idx % 90) as i64))
        .collect()
}

/// CSV with `rows` users, one nested address column and one extra column.
pub fn users_csv(rows: usize) -> String {
    let mut out = String::from("name.firstName,name.lastName,age,address.city,gender\n");
    for idx in 0..rows {
        out.push_str(&format!(
            "First{idx},Last{idx},{},City{},{}\n",
            idx % 80,
            idx % 7,
            if idx % 2 == 0 { "f" } else { "m" }
        ));
    }
    out
}
