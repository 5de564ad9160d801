//! In-memory collaborators for pipeline tests

use crate::error::{Result, ScaffoldError};
use crate::exec::{Invocation, ProcessRunner};
use crate::registry::{Archive, Registry};
use async_trait::async_trait;
use semver::Version;
use std::collections::HashMap;
use std::io::{self, Cursor, Write};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Registry serving archives registered by the test
#[derive(Default)]
pub struct FakeRegistry {
    packages: Mutex<HashMap<String, Vec<(Version, Archive)>>>,
    downloads: Mutex<Vec<(String, Version)>>,
    unreachable: AtomicBool,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, name: &str, version: &str, archive: Archive) {
        self.packages
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push((Version::parse(version).unwrap(), archive));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Every `(name, version)` passed to `download`, in call order
    pub fn downloads(&self) -> Vec<(String, Version)> {
        self.downloads.lock().unwrap().clone()
    }

    fn check_reachable(&self, name: &str) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(ScaffoldError::registry(name, "connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn latest_version(&self, name: &str) -> Result<Version> {
        self.check_reachable(name)?;
        self.packages
            .lock()
            .unwrap()
            .get(name)
            .and_then(|versions| versions.iter().map(|(v, _)| v.clone()).max())
            .ok_or_else(|| ScaffoldError::registry(name, "not found"))
    }

    async fn download(&self, name: &str, version: &Version) -> Result<Archive> {
        self.check_reachable(name)?;
        self.downloads
            .lock()
            .unwrap()
            .push((name.to_string(), version.clone()));
        self.packages
            .lock()
            .unwrap()
            .get(name)
            .and_then(|versions| versions.iter().find(|(v, _)| v == version))
            .map(|(_, archive)| archive.clone())
            .ok_or_else(|| ScaffoldError::registry(name, format!("{}@{} not found", name, version)))
    }
}

/// Runner that records invocations instead of spawning processes
pub struct RecordingRunner {
    code: i32,
    invocations: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::exiting_with(0)
    }

    pub fn exiting_with(code: i32) -> Self {
        Self {
            code,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ExitStatus> {
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(exit_status(self.code))
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Zip archive of a template package with the given `template/` files
pub fn package_archive(name: &str, version: &str, template_files: &[(&str, &str)]) -> Archive {
    package_archive_full(name, version, None, template_files, &[])
}

/// Zip archive of a template package with an optional `main` and extra root files
pub fn package_archive_full(
    name: &str,
    version: &str,
    main: Option<&str>,
    template_files: &[(&str, &str)],
    root_files: &[(&str, &str)],
) -> Archive {
    let manifest = serde_json::json!({
        "name": name,
        "version": version,
        "main": main,
    });

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default();

        zip.start_file("package/package.json", options).unwrap();
        zip.write_all(manifest.to_string().as_bytes()).unwrap();

        for (path, content) in template_files {
            zip.start_file(format!("package/template/{}", path), options)
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        for (path, content) in root_files {
            zip.start_file(format!("package/{}", path), options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    Archive::Zip(buffer)
}
