// Runtime settings for extraction, caching and binning
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable pointing at a TOML settings file.
pub const CONFIG_ENV: &str = "RUSTY_EXTRAKTOR_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub binning: BinSettings,
    pub table: TableSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// When false every request re-extracts and nothing is written.
    pub enabled: bool,
    /// Directory for cache blobs. `None` stores each blob next to its source.
    pub root: Option<PathBuf>,
    /// Appended to the source path to name the blob.
    pub suffix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            root: None,
            suffix: default_suffix(),
        }
    }
}

fn default_suffix() -> String {
    ".peaks.json".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BinSettings {
    /// Number of equal-width retention-time bins.
    pub bin_count: usize,
    /// Emit all-zero columns for bins no file touched.
    pub keep_empty_bins: bool,
}

impl Default for BinSettings {
    fn default() -> Self {
        Self {
            bin_count: 400,
            keep_empty_bins: false,
        }
    }
}

/// Tolerances handed to the `pdfplumber` table finder, in PDF points.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableSettings {
    /// Parallel ruling lines closer than this are merged into one.
    pub snap_tolerance: f64,
    /// Collinear line segments with gaps up to this are joined.
    pub join_tolerance: f64,
    /// How far a horizontal and a vertical line may miss and still cross.
    pub intersection_tolerance: f64,
    /// Word alignment slack when a table has no rules.
    pub text_tolerance: f64,
    /// Words that must share a left or right edge to imply a column when a
    /// table has no rules.
    pub min_words_vertical: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            intersection_tolerance: 3.0,
            text_tolerance: 3.0,
            min_words_vertical: 3,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        let settings: Settings = toml::from_str(&text)
            .with_context(|| format!("parsing settings {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Explicit path first, then `RUSTY_EXTRAKTOR_CONFIG`, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.binning.bin_count == 0 {
            bail!("binning.bin_count must be at least 1");
        }
        if self.cache.suffix.is_empty() {
            bail!("cache.suffix must not be empty");
        }
        if self.table.min_words_vertical == 0 {
            bail!("table.min_words_vertical must be at least 1");
        }
        let t = &self.table;
        for (name, value) in [
            ("snap_tolerance", t.snap_tolerance),
            ("join_tolerance", t.join_tolerance),
            ("intersection_tolerance", t.intersection_tolerance),
            ("text_tolerance", t.text_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                bail!("table.{name} must be a non-negative number, got {value}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [cache]
            root = "/var/cache/extraktor"

            [binning]
            bin_count = 50
            "#,
        )
        .unwrap();
        assert_eq!(settings.cache.root, Some(PathBuf::from("/var/cache/extraktor")));
        assert_eq!(settings.cache.suffix, ".peaks.json");
        assert!(settings.cache.enabled);
        assert_eq!(settings.binning.bin_count, 50);
        assert_eq!(settings.table, TableSettings::default());
    }

    #[test]
    fn zero_bins_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[binning]\nbin_count = 0\n").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bin_count"));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let settings: Settings = toml::from_str("[table]\njoin_tolerance = -1.0\n").unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("join_tolerance"));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[cache]\nenabled = false\n").unwrap();
        let settings = Settings::discover(Some(&path)).unwrap();
        assert!(!settings.cache.enabled);
    }
}
