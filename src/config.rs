//! Session configuration: collection bounds, upscale settings, debug flag.
//!
//! File format is plain `key=value` lines with `#` comments. Unknown keys are
//! ignored and malformed values keep their defaults. Loaded once at startup,
//! read-only afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

pub const CONFIG_FILE: &str = "upv.conf";
const DOT_FILE: &str = ".upvrc";

/// Bounds on the image collection scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Directory entries examined before the scan of one directory stops.
    pub max_files: usize,
    /// Images retained in the browsing set.
    pub max_images: usize,
    /// Subdirectories recorded as recursion candidates per directory.
    pub max_subdirs: usize,
    /// Levels below the root explored when the root holds no images.
    pub max_depth: usize,
    /// Entries between progress log lines.
    pub batch_size: usize,
    /// Image count above which the navigation hint is printed.
    pub suggestion_threshold: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        CollectionConfig {
            max_files: 10_000,
            max_images: 5_000,
            max_subdirs: 100,
            max_depth: 3,
            batch_size: 500,
            suggestion_threshold: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpscaleConfig {
    /// Explicit tool script, tried before the built-in install locations.
    pub tool: Option<PathBuf>,
    pub timeout: Duration,
    pub gpu: bool,
    pub tile_size: Option<u32>,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        UpscaleConfig {
            tool: None,
            timeout: Duration::from_secs(300),
            gpu: true,
            tile_size: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub collection: CollectionConfig,
    pub upscale: UpscaleConfig,
    pub debug: bool,
    /// File the values came from, if any.
    pub source: Option<PathBuf>,
}

impl Config {
    /// Parse config text on top of the defaults.
    pub fn parse(text: &str) -> Self {
        let mut cfg = Config::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            cfg.apply(key.trim(), value.trim());
        }
        cfg
    }

    fn apply(&mut self, key: &str, value: &str) {
        let c = &mut self.collection;
        match key {
            "max_files" => set_usize(&mut c.max_files, value),
            "max_images" => set_usize(&mut c.max_images, value),
            "max_subdirs" => set_usize(&mut c.max_subdirs, value),
            "max_depth" => set_usize(&mut c.max_depth, value),
            "batch_size" => set_usize(&mut c.batch_size, value),
            "suggestion_threshold" => set_usize(&mut c.suggestion_threshold, value),
            "debug_mode" => {
                if let Some(b) = parse_bool(value) {
                    self.debug = b;
                }
            }
            "upscale_tool" => {
                if !value.is_empty() {
                    self.upscale.tool = Some(PathBuf::from(value));
                }
            }
            "upscale_timeout" => {
                if let Ok(secs) = value.parse::<u64>() {
                    if secs > 0 {
                        self.upscale.timeout = Duration::from_secs(secs);
                    }
                }
            }
            "upscale_gpu" => {
                if let Some(b) = parse_bool(value) {
                    self.upscale.gpu = b;
                }
            }
            "upscale_tile_size" => {
                if let Ok(n) = value.parse::<u32>() {
                    self.upscale.tile_size = Some(n);
                }
            }
            _ => {}
        }
    }

    /// Read one config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let mut cfg = Config::parse(&text);
        cfg.source = Some(path.to_path_buf());
        Ok(cfg)
    }

    /// Load from `explicit` if given, else the first file on the search path,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Config::from_file(p);
        }
        match search_path().into_iter().find(|p| p.is_file()) {
            Some(p) => Config::from_file(&p),
            None => Ok(Config::default()),
        }
    }
}

/// Config locations in lookup order.
pub fn search_path() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(proj) = ProjectDirs::from("", "", "upv") {
        paths.push(proj.config_dir().join(CONFIG_FILE));
    }
    if let Some(base) = BaseDirs::new() {
        paths.push(base.home_dir().join(DOT_FILE));
    }
    paths
}

fn set_usize(slot: &mut usize, value: &str) {
    if let Ok(n) = value.parse::<usize>() {
        *slot = n;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
