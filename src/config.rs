//! Build configuration.
//!
//! A build needs a source directory and an output path. The remaining
//! knobs choose between the classic layout (placeholder checksum, no
//! table) and a "complete" image that also carries a real checksum and a
//! name/offset table.
//!
//! Configuration can come from a TOML file:
//!
//! ```toml
//! [image]
//! source_dir = "approot"
//! output_path = "out/image.bin"
//! fidelity = "complete"      # preset: "reference" (default) or "complete"
//! checksum = "placeholder"   # overrides the preset
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::artifact::cramfs::{ChecksumMode, ImageOptions, InodeTableMode};

pub const DEFAULT_SOURCE_DIR: &str = "approot";
pub const DEFAULT_OUTPUT_PATH: &str = "image.bin";

/// Preset for the checksum, table and output-write knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Placeholder checksum, no table, plain overwrite of the output.
    #[default]
    Reference,
    /// CRC-32 checksum, appended name/offset table, atomic output.
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub checksum: ChecksumMode,
    pub inode_table: InodeTableMode,
    pub atomic_write: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_DIR, DEFAULT_OUTPUT_PATH)
    }
}

impl BuildConfig {
    /// A reference-fidelity build of `source_dir` into `output_path`.
    pub fn new(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            checksum: ChecksumMode::Placeholder,
            inode_table: InodeTableMode::Omit,
            atomic_write: false,
        }
    }

    pub fn with_fidelity(mut self, fidelity: Fidelity) -> Self {
        match fidelity {
            Fidelity::Reference => {
                self.checksum = ChecksumMode::Placeholder;
                self.inode_table = InodeTableMode::Omit;
                self.atomic_write = false;
            }
            Fidelity::Complete => {
                self.checksum = ChecksumMode::Crc32;
                self.inode_table = InodeTableMode::Append;
                self.atomic_write = true;
            }
        }
        self
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            checksum: self.checksum,
            inode_table: self.inode_table,
        }
    }

    /// Load a config file. Relative paths inside it resolve against the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_preset(path, None)
    }

    /// Like [`BuildConfig::load`], but `preset` replaces the file's
    /// `fidelity`. Explicit `checksum`, `inode_table` and `atomic_write`
    /// keys in the file still override the preset.
    pub fn load_with_preset(path: &Path, preset: Option<Fidelity>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading build config '{}'", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str_with_preset(&raw, base_dir, preset)
            .with_context(|| format!("parsing build config '{}'", path.display()))
    }

    pub fn from_toml_str(raw: &str, base_dir: &Path) -> Result<Self> {
        Self::from_toml_str_with_preset(raw, base_dir, None)
    }

    pub fn from_toml_str_with_preset(
        raw: &str,
        base_dir: &Path,
        preset: Option<Fidelity>,
    ) -> Result<Self> {
        let parsed: ConfigToml = toml::from_str(raw)?;
        let image = parsed.image;

        let source_dir = resolve_path(
            base_dir,
            image.source_dir.as_deref().unwrap_or(DEFAULT_SOURCE_DIR),
            "source_dir",
        )?;
        let output_path = resolve_path(
            base_dir,
            image.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH),
            "output_path",
        )?;

        let mut config = Self::new(source_dir, output_path)
            .with_fidelity(preset.or(image.fidelity).unwrap_or_default());
        if let Some(checksum) = image.checksum {
            config.checksum = checksum;
        }
        if let Some(inode_table) = image.inode_table {
            config.inode_table = inode_table;
        }
        if let Some(atomic_write) = image.atomic_write {
            config.atomic_write = atomic_write;
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    image: ImageToml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageToml {
    source_dir: Option<String>,
    output_path: Option<String>,
    fidelity: Option<Fidelity>,
    checksum: Option<ChecksumMode>,
    inode_table: Option<InodeTableMode>,
    atomic_write: Option<bool>,
}

fn resolve_path(base_dir: &Path, raw: &str, field: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{field} must not be empty");
    }
    let candidate = Path::new(trimmed);
    if candidate.is_absolute() {
        Ok(candidate.to_path_buf())
    } else {
        Ok(base_dir.join(candidate))
    }
}
