// upv: minimal image browser with an external super-resolution hook.
// Collects images under a directory, shows one at a time, and can run the
// upscaling tool on the current image, appending the result.
// Usage: upv [DIR]  (see --help)

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const GIT_HASH: &str = env!("GIT_HASH");

mod classify;
mod cli;
mod config;
mod nav;
mod scanner;
mod session;
mod shell;
mod upscale;
#[cfg(feature = "window")]
mod window;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::Config;
use scanner::{Collector, StdinChooser};
use shell::Shell;
use upscale::{ToolLocator, Upscaler};

#[derive(Parser, Debug)]
#[command(
    name = "upv",
    version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")),
    about = "Image browser with super-resolution upscaling"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory to browse (default: current directory)
    path: Option<PathBuf>,

    /// Config file (default: first of ./upv.conf, user config dir, ~/.upvrc)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging, including per-file classifier decisions
    #[arg(short, long, global = true)]
    debug: bool,

    /// Upscaling tool script
    #[arg(long, global = true)]
    tool: Option<PathBuf>,

    /// Upscale deadline in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect and print the browsing set without opening a viewer
    Scan { path: Option<PathBuf> },
    /// Show config, tool and runtime environment locations
    Doctor,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();

    let mut cfg = Config::load(args.config.as_deref())?;
    cfg.debug |= args.debug;
    if let Some(tool) = args.tool {
        cfg.upscale.tool = Some(tool);
    }
    if let Some(secs) = args.timeout.filter(|s| *s > 0) {
        cfg.upscale.timeout = Duration::from_secs(secs);
    }
    init_logging(cfg.debug);
    if let Some(src) = &cfg.source {
        log::debug!("config: {}", src.display());
    }

    let locator = ToolLocator::system(cfg.upscale.tool.clone());

    // ── CLI subcommands (no viewer, exit after) ─────────────────────────
    match args.command {
        Some(Commands::Scan { path }) => return cli::scan(&cfg, path.or(args.path).as_deref()),
        Some(Commands::Doctor) => {
            cli::doctor(&cfg, &locator);
            return Ok(());
        }
        None => {}
    }

    // ── Collect ─────────────────────────────────────────────────────────
    let mut collector = Collector::new(cfg.collection.clone(), cfg.debug, StdinChooser);
    let collected = collector.collect(args.path.as_deref())?;
    let mut nav = collected.nav;
    if nav.is_empty() {
        println!("No images found in {}.", collected.report.root.display());
        println!("Run `upv <directory>` with a folder that contains png/jpg/gif/bmp/tiff/webp files.");
        return Ok(());
    }

    // ── Browse ──────────────────────────────────────────────────────────
    let upscaler = Upscaler::new(locator, &cfg.upscale);
    let mut shell = open_shell()?;
    session::run(shell.as_mut(), &mut nav, &upscaler)
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

#[cfg(feature = "window")]
fn open_shell() -> Result<Box<dyn Shell>> {
    Ok(Box::new(window::WindowShell::open()?))
}

#[cfg(not(feature = "window"))]
fn open_shell() -> Result<Box<dyn Shell>> {
    Ok(Box::new(shell::TerminalShell::stdio()))
}
