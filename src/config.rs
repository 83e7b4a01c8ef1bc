use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::input::Modifier;
use crate::scan::ScanOrder;
use crate::timing::Speed;

pub const DEFAULT_PATH: &str = "config.txt";
const MAX_DIMENSION: i64 = 9999;

const TEMPLATE: &str = "\
# config.txt
# number of columns/rows in your grid
columns=12
rows=24

# speed: 1 = human-like (default), 2 = ~2x faster
speed=1

# scan_order:
#   1 = top→bottom then left→right  (column-major)
#   2 = left→right then top→bottom  (row-major)
#   3 = random
scan_order=1

# key held down during a run: shift, ctrl or alt
modifier=shift

# jitter: 1 = new offset on every click, 2 = keep one offset per cell
#         until the grid is recalibrated or the config reloaded
jitter=1
";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    #[default]
    PerClick,
    /// One offset per cell, reused across runs until the grid changes.
    Pinned,
}

impl JitterPolicy {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(JitterPolicy::PerClick),
            2 => Some(JitterPolicy::Pinned),
            _ => None,
        }
    }
}

/// Grid settings for one run. A reload replaces the whole value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    pub speed: Speed,
    pub scan_order: ScanOrder,
    pub modifier: Modifier,
    pub jitter: JitterPolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 24,
            speed: Speed::Normal,
            scan_order: ScanOrder::ColumnMajor,
            modifier: Modifier::Shift,
            jitter: JitterPolicy::PerClick,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(Error::Configuration(format!(
                "columns and rows must be positive (got columns={}, rows={})",
                self.columns, self.rows
            )));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "columns={} rows={} speed={} scan_order={} modifier={} jitter={:?}",
            self.columns, self.rows, self.speed.code(), self.scan_order.code(), self.modifier.name(), self.jitter
        )
    }
}

/// Parse `key=value` lines. Keys and values are case-insensitive; unknown keys
/// are ignored and bad values fall back to the default for that key.
pub fn parse(text: &str) -> GridConfig {
    let entries: HashMap<String, String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
        .collect();

    let int = |key: &str, default: i64, min: i64, max: i64| -> i64 {
        entries
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default)
            .clamp(min, max)
    };

    let defaults = GridConfig::default();
    GridConfig {
        columns: int("columns", defaults.columns as i64, 1, MAX_DIMENSION) as u32,
        rows: int("rows", defaults.rows as i64, 1, MAX_DIMENSION) as u32,
        speed: Speed::from_code(int("speed", defaults.speed.code(), 1, 2)).unwrap_or_default(),
        scan_order: ScanOrder::from_code(int("scan_order", defaults.scan_order.code(), 1, 3)).unwrap_or_default(),
        modifier: entries.get("modifier").and_then(|v| Modifier::from_name(v)).unwrap_or_default(),
        jitter: JitterPolicy::from_code(int("jitter", 1, 1, 2)).unwrap_or_default(),
    }
}

/// Where the controller gets a fresh `GridConfig` on startup and reload.
pub trait ConfigSource {
    fn load(&mut self) -> GridConfig;
}

/// `config.txt`-style file. Created with defaults when absent; never fails.
#[derive(Clone, Debug)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl ConfigSource for ConfigFile {
    fn load(&mut self) -> GridConfig {
        if !self.path.exists() {
            match fs::write(&self.path, TEMPLATE) {
                Ok(()) => info!("Created default config at {}", self.path.display()),
                Err(e) => warn!("Could not create {}: {e}", self.path.display()),
            }
        }
        let config = match fs::read_to_string(&self.path) {
            Ok(text) => parse(&text),
            Err(e) => {
                warn!("Could not read {}: {e}; using defaults", self.path.display());
                GridConfig::default()
            }
        };
        info!("Config loaded: {}", config.summary());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        assert_eq!(parse(TEMPLATE), GridConfig::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let cfg = parse("COLUMNS = 8\nrows=5\nSpeed=2\nscan_order=3\nmodifier=CTRL\njitter=2\n");
        assert_eq!(cfg.columns, 8);
        assert_eq!(cfg.rows, 5);
        assert_eq!(cfg.speed, Speed::Fast);
        assert_eq!(cfg.scan_order, ScanOrder::Random);
        assert_eq!(cfg.modifier, Modifier::Control);
        assert_eq!(cfg.jitter, JitterPolicy::Pinned);
    }

    #[test]
    fn test_malformed_values_fall_back_per_key() {
        let cfg = parse("columns=lots\nrows=6\nspeed=\nscan_order=2.5\nmodifier=hyper\n");
        assert_eq!(cfg.columns, 12);
        assert_eq!(cfg.rows, 6);
        assert_eq!(cfg.speed, Speed::Normal);
        assert_eq!(cfg.scan_order, ScanOrder::ColumnMajor);
        assert_eq!(cfg.modifier, Modifier::Shift);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let cfg = parse("columns=0\nrows=100000\nspeed=7\nscan_order=-1\n");
        assert_eq!(cfg.columns, 1);
        assert_eq!(cfg.rows, 9999);
        assert_eq!(cfg.speed, Speed::Fast);
        assert_eq!(cfg.scan_order, ScanOrder::ColumnMajor);
    }

    #[test]
    fn test_comments_and_noise_are_ignored() {
        let cfg = parse("# rows=3\n\n   \njust some words\ncolumns=4 \n");
        assert_eq!(cfg.rows, 24);
        assert_eq!(cfg.columns, 4);
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let cfg = GridConfig { rows: 0, ..GridConfig::default() };
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        let mut source = ConfigFile::new(&path);
        assert_eq!(source.load(), GridConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_reload_picks_up_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, "columns=3\nrows=2\n").unwrap();
        let mut source = ConfigFile::new(&path);
        assert_eq!((source.load().columns, source.load().rows), (3, 2));
        fs::write(&path, "columns=9\nrows=9\nscan_order=2\n").unwrap();
        let cfg = source.load();
        assert_eq!((cfg.columns, cfg.rows, cfg.scan_order), (9, 9, ScanOrder::RowMajor));
    }

    #[test]
    fn test_unreadable_path_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a file
        let mut source = ConfigFile::new(dir.path());
        assert_eq!(source.load(), GridConfig::default());
    }
}
