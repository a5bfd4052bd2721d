use std::path::PathBuf;

use tempfile::TempDir;
use uvfs::{PhysicalFileSystem, UPath};

pub struct Fixture {
    pub tempdir: TempDir,
    pub fs: PhysicalFileSystem,
}

impl Fixture {
    pub fn new() -> Self {
        let tempdir = TempDir::new().expect("create temp dir");
        let fs = PhysicalFileSystem::new(tempdir.path());
        Self { tempdir, fs }
    }

    pub fn host_path(&self, name: &str) -> PathBuf {
        self.tempdir.path().join(name)
    }

    pub fn write_host_file(&self, name: &str, data: &[u8]) {
        std::fs::write(self.host_path(name), data).expect("write fixture file");
    }

    pub fn create_host_dir(&self, name: &str) {
        std::fs::create_dir(self.host_path(name)).expect("create fixture dir");
    }
}

pub fn path(text: &str) -> UPath {
    UPath::new(text).expect("valid path")
}
