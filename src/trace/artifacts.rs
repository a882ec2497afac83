use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::driver::adapter::Driver;

/// Writes diagnostic artifacts (screenshots, UI hierarchy dumps) to a directory.
///
/// File names are `{name}_{timestamp}.{ext}` so repeated captures of the same
/// step never overwrite each other.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, name: &str, ext: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y-%m-%dT%H-%M-%S%.3f");
        self.dir
            .join(format!("{}_{}.{}", sanitize_name(name), timestamp, ext))
    }

    /// Write raw bytes as an artifact, creating the directory on demand.
    pub fn save(&self, name: &str, ext: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.artifact_path(name, ext);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Best-effort screenshot. Failures are logged, never raised.
    pub fn capture_screenshot(&self, driver: &mut dyn Driver, name: &str) -> Option<PathBuf> {
        let bytes = match driver.screenshot() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Screenshot '{}' failed: {}", name, e);
                return None;
            }
        };
        self.write_logged(name, "png", &bytes, "Screenshot")
    }

    /// Best-effort page source dump. Failures are logged, never raised.
    pub fn capture_page_source(&self, driver: &mut dyn Driver, name: &str) -> Option<PathBuf> {
        let source = match driver.page_source() {
            Ok(source) => source,
            Err(e) => {
                warn!("Page source '{}' failed: {}", name, e);
                return None;
            }
        };
        self.write_logged(name, "xml", source.as_bytes(), "Page source")
    }

    fn write_logged(&self, name: &str, ext: &str, bytes: &[u8], kind: &str) -> Option<PathBuf> {
        match self.save(name, ext, bytes) {
            Ok(path) => {
                info!("{} saved: {}", kind, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("{} '{}' could not be written: {}", kind, name, e);
                None
            }
        }
    }
}

/// Make a step or element name safe to use in a file name.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
