//! Word and PowerPoint to PDF conversion through headless LibreOffice.
//!
//! Every conversion runs a fresh `soffice` process with its own throwaway
//! user profile, so conversions never share LibreOffice state and can run
//! concurrently.

use crate::config::OfficeConfig;
use crate::error::{ConversionError, Result};
use crate::DocumentKind;
use async_process::Command;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Runs LibreOffice to turn office documents into PDF files.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    config: OfficeConfig,
    soffice_path: PathBuf,
}

impl OfficeConverter {
    /// Create a converter, locating the `soffice` binary.
    pub fn new(config: OfficeConfig) -> Result<Self> {
        config.validate()?;
        let soffice_path = find_soffice(&config)?;
        info!("Using LibreOffice at: {:?}", soffice_path);
        Ok(Self {
            config,
            soffice_path,
        })
    }

    pub fn soffice_path(&self) -> &Path {
        &self.soffice_path
    }

    /// Convert `input_path` to a PDF written at `output_path`.
    pub async fn convert_to_pdf(&self, input_path: &Path, output_path: &Path) -> Result<PathBuf> {
        if !input_path.exists() {
            return Err(ConversionError::InputNotFound(input_path.to_path_buf()));
        }

        let kind = DocumentKind::from_path(input_path)?;
        let filter = kind
            .export_filter()
            .ok_or_else(|| ConversionError::UnsupportedFormat {
                extension: crate::extension_of(input_path),
            })?;

        let start = Instant::now();
        let work_dir = self.work_dir()?;
        let profile_dir = work_dir.path().join("profile");
        let out_dir = work_dir.path().join("out");
        std::fs::create_dir_all(&out_dir).map_err(|e| ConversionError::OutputDirError {
            path: out_dir.clone(),
            message: e.to_string(),
        })?;

        debug!("Converting {:?} with filter {}", input_path.file_name(), filter);

        let mut cmd = Command::new(&self.soffice_path);
        cmd.args([
            "--headless",
            "--invisible",
            "--nologo",
            "--nofirststartwizard",
            "--norestore",
        ]);
        cmd.arg(format!(
            "-env:UserInstallation=file://{}",
            profile_dir.display()
        ));
        cmd.args(["--convert-to", &format!("pdf:{}", filter), "--outdir"]);
        cmd.arg(&out_dir);
        cmd.arg(input_path);
        cmd.kill_on_drop(true);

        let output = timeout(self.config.conversion_timeout, cmd.output())
            .await
            .map_err(|_| ConversionError::Timeout {
                path: input_path.to_path_buf(),
                timeout_secs: self.config.conversion_timeout.as_secs(),
            })?
            .map_err(|e| ConversionError::ProcessStartFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "LibreOffice conversion failed for {:?}: {}",
                input_path, stderr
            );
            return Err(ConversionError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: stderr.to_string(),
            });
        }

        let produced = find_output_pdf(&out_dir, input_path).ok_or_else(|| {
            ConversionError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: "PDF output file not found".to_string(),
            }
        })?;

        move_file(&produced, output_path).await?;

        debug!(
            "Converted {:?} in {:?}",
            input_path.file_name(),
            start.elapsed()
        );

        Ok(output_path.to_path_buf())
    }

    fn work_dir(&self) -> Result<TempDir> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("office-to-pdf-");
            b
        };
        let dir = match &self.config.temp_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(|e| ConversionError::ProcessStartFailed(e.to_string()))
    }
}

/// Locate the soffice binary: explicit path, well-known install locations,
/// then `PATH`.
pub fn find_soffice(config: &OfficeConfig) -> Result<PathBuf> {
    if let Some(ref path) = config.soffice_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(ConversionError::LibreOfficeNotFound);
    }

    let candidates = [
        // macOS
        "/Applications/LibreOffice.app/Contents/MacOS/soffice",
        // Linux
        "/usr/bin/soffice",
        "/usr/lib/libreoffice/program/soffice",
        "/opt/libreoffice/program/soffice",
        // Snap (Ubuntu)
        "/snap/bin/libreoffice.soffice",
    ];

    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }

    which::which("soffice")
        .or_else(|_| which::which("libreoffice"))
        .map_err(|_| ConversionError::LibreOfficeNotFound)
}

/// The PDF LibreOffice wrote for `input_path`, or any PDF in `out_dir`
/// when the name differs.
fn find_output_pdf(out_dir: &Path, input_path: &Path) -> Option<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let expected = out_dir.join(format!("{}.pdf", stem));
    if expected.exists() {
        return Some(expected);
    }

    std::fs::read_dir(out_dir).ok().and_then(|entries| {
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().map(|ext| ext == "pdf").unwrap_or(false))
    })
}

async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConversionError::OutputDirError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
    }

    // Rename fails across filesystems; fall back to a copy.
    if tokio::fs::rename(from, to).await.is_err() {
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }
    Ok(())
}
