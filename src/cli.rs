//! CLI subcommand implementations.

use std::path::Path;

use anyhow::Result;

use crate::config::{self, Config};
use crate::scanner::{Collector, StdinChooser};
use crate::upscale::ToolLocator;

/// Collect like a browse session would, print the set, exit.
pub fn scan(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let mut collector = Collector::new(cfg.collection.clone(), cfg.debug, StdinChooser);
    let out = collector.collect(path)?;
    let r = &out.report;

    if out.nav.is_empty() {
        println!("No images found under {}", r.root.display());
        return Ok(());
    }
    for item in out.nav.items() {
        println!("{}", item);
    }
    println!();
    println!("source:  {}", r.source.display());
    println!("scanned: {}{}", r.scanned, if r.truncated { " (max_files reached)" } else { "" });
    println!("images:  {} ({} kept)", r.found, out.nav.len());
    println!("dirs:    {}", r.dirs_considered);
    Ok(())
}

/// Where config, tool and runtime environment were found.
pub fn doctor(cfg: &Config, locator: &ToolLocator) {
    println!("upv doctor ({}-{})", crate::VERSION, crate::GIT_HASH);
    println!("==========");
    println!();

    // ── 1. Config ────────────────────────────────────────────────────────
    println!("Config");
    match &cfg.source {
        Some(p) => println!("  file:    {}", p.display()),
        None => {
            println!("  file:    (defaults)");
            for p in config::search_path() {
                println!("    looked at {}", p.display());
            }
        }
    }
    let c = &cfg.collection;
    println!(
        "  limits:  files={} images={} subdirs={} depth={} batch={} hint>{}",
        c.max_files, c.max_images, c.max_subdirs, c.max_depth, c.batch_size, c.suggestion_threshold
    );
    println!("  debug:   {}", cfg.debug);

    // ── 2. Upscaling tool ────────────────────────────────────────────────
    println!();
    println!("Upscaling tool");
    println!("  timeout: {}s", cfg.upscale.timeout.as_secs());
    match locator.locate() {
        Ok(loc) => {
            let origin = if loc.installed { "install location" } else { "working directory" };
            println!("  script:  {} ({})", loc.script.display(), origin);
            match &loc.env {
                Some(env) => println!("  env:     {}", env.display()),
                None => println!("  env:     (none, bare interpreter)"),
            }
            for launch in locator.launches(&loc) {
                println!(
                    "  run:     {} {} <input> <output> --scale <n>",
                    launch.program.to_string_lossy(),
                    loc.script.display()
                );
            }
        }
        Err(e) => {
            println!("  {}", e);
            println!("  upscaling is unavailable until the tool is installed at one of:");
            for p in &locator.candidates {
                println!("    {}", p.display());
            }
            println!("    {}", locator.fallback().display());
        }
    }
}
