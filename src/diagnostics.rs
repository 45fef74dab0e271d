//! Recording of intermediate rasters for inspection.
//!
//! The pipeline never depends on a sink succeeding: failures are logged and
//! the page carries on.
use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

/// Destination for labelled intermediate rasters.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, raster: &DynamicImage, label: &str) -> anyhow::Result<()>;

    /// Sinks that drop everything return false so callers can skip conversions.
    fn enabled(&self) -> bool {
        true
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _raster: &DynamicImage, _label: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}

/// Writes `<label>.png` files into a per-session directory.
///
/// The session directory is named after the start time plus a random id,
/// so concurrent sessions under the same root never collide.
#[derive(Debug)]
pub struct DirectorySink {
    session_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DirectorySink {
    pub fn new(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now.format(format_description!("[year][month][day]-[hour][minute][second]"))?;
        let session_dir = root.as_ref().join(format!("{stamp}_{}", uuid::Uuid::new_v4().simple()));

        std::fs::create_dir_all(&session_dir)?;
        debug!(dir = %session_dir.display(), "diagnostic session started");

        Ok(Self {
            session_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }
}

impl DiagnosticSink for DirectorySink {
    fn record(&self, raster: &DynamicImage, label: &str) -> anyhow::Result<()> {
        let file_name = format!("{}.png", label.replace([' ', '/', '\\'], "_"));
        let path = self.session_dir.join(file_name);

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("diagnostic sink lock poisoned"))?;
        raster
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save diagnostic image {}: {}", path.display(), e))?;
        Ok(())
    }
}

/// Cheap, cloneable handle to a sink with a label prefix.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
    prefix: String,
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            prefix: String::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Handle whose labels are prefixed with `prefix`.
    pub fn scoped(&self, prefix: impl AsRef<str>) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            prefix: format!("{}{}", self.prefix, prefix.as_ref()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.enabled()
    }

    pub fn record(&self, raster: &DynamicImage, label: &str) {
        if !self.sink.enabled() {
            return;
        }
        let label = format!("{}{}", self.prefix, label);
        if let Err(e) = self.sink.record(raster, &label) {
            warn!(label = %label, error = %e, "diagnostic sink failed");
        }
    }

    pub fn record_gray(&self, raster: &GrayImage, label: &str) {
        if self.sink.enabled() {
            self.record(&DynamicImage::ImageLuma8(raster.clone()), label);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("prefix", &self.prefix)
            .field("enabled", &self.sink.enabled())
            .finish()
    }
}
