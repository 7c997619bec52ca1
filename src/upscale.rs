//! Upscale job orchestrator.
//!
//! Runs the external super-resolution tool as a child process
//! (`<interpreter> <tool> <input> <output> --scale <n>`), bounded by a hard
//! deadline, and appends the verified output to the browsing set.
//!
//! Flow for one job:
//!   1. derive `<stem>_upscaledx<n>.<ext>` next to the input
//!   2. locate the tool script and an optional runtime environment beside it
//!   3. spawn; with no environment, fall back to the next interpreter name
//!      only when the spawn itself fails
//!   4. wait with timeout, kill the process group on expiry
//!   5. check exit status, failure markers, then the output file itself

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use directories::ProjectDirs;
use wait_timeout::ChildExt;

use crate::config::UpscaleConfig;
use crate::nav::{ImageRef, NavState};

/// Directory the tool ships in, and its entry script.
pub const TOOL_DIR: &str = "upscale";
pub const TOOL_SCRIPT: &str = "main.py";

/// Runtime environment directory names, checked in order next to the tool.
const ENV_DIRS: &[&str] = &["venv", ".venv", "env"];

/// Bare interpreter commands, tried in order when no environment exists.
const INTERPRETERS: &[&str] = &["python3", "python"];

/// Bytes of stdout/stderr kept for diagnostics (the tail).
const MAX_CAPTURE: usize = 10 * 1024;

/// Output that marks a failed run even with a zero exit status.
const FAILURE_MARKERS: &[&str] = &["Traceback (most recent call last)", "ERROR:", "Error:"];

// ── Scale factor ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScaleFactor {
    X2,
    X3,
    X4,
}

impl ScaleFactor {
    pub const DEFAULT: ScaleFactor = ScaleFactor::X2;

    pub fn value(self) -> u8 {
        match self {
            ScaleFactor::X2 => 2,
            ScaleFactor::X3 => 3,
            ScaleFactor::X4 => 4,
        }
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.value())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported scale factor {0} (expected 2, 3 or 4)")]
pub struct InvalidScale(pub u8);

impl TryFrom<u8> for ScaleFactor {
    type Error = InvalidScale;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            2 => Ok(ScaleFactor::X2),
            3 => Ok(ScaleFactor::X3),
            4 => Ok(ScaleFactor::X4),
            other => Err(InvalidScale(other)),
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum UpscaleError {
    #[error("upscaling tool not found (looked in: {})", join_paths_for_display(.searched))]
    ToolNotFound { searched: Vec<PathBuf> },
    #[error("cannot start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("upscaling timed out after {}s", .limit.as_secs_f64())]
    Timeout { limit: Duration },
    #[error("upscaling failed ({status}): {detail}")]
    UpscalingFailed { status: String, detail: String },
    #[error("tool finished but did not write {}", .0.display())]
    OutputFileMissing(PathBuf),
    #[error("waiting for the upscaling tool: {0}")]
    Io(#[from] io::Error),
}

fn join_paths_for_display(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Job ─────────────────────────────────────────────────────────────────

/// `photo.png` → `photo_upscaledx2.png`; no extension → suffix appended.
pub fn output_path_for(input: &Path, scale: ScaleFactor) -> PathBuf {
    let tag = format!("_upscaledx{}", scale.value());
    let stem = input
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    let mut name = stem;
    name.push(&tag);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// One invocation. Never persisted.
#[derive(Clone, Debug)]
pub struct UpscaleJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub scale: ScaleFactor,
    pub deadline: Instant,
}

impl UpscaleJob {
    pub fn new(input: &Path, scale: ScaleFactor, timeout: Duration) -> Self {
        UpscaleJob {
            input: input.to_path_buf(),
            output: output_path_for(input, scale),
            scale,
            deadline: Instant::now() + timeout,
        }
    }
}

// ── Locating the tool ───────────────────────────────────────────────────

/// Where the tool script was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolLocation {
    pub script: PathBuf,
    /// Found at an install location rather than the working-directory fallback.
    pub installed: bool,
    /// Runtime environment next to the script, if any.
    pub env: Option<PathBuf>,
}

/// How to start the interpreter for one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launch {
    pub program: OsString,
    /// Environment to activate before running.
    pub env: Option<PathBuf>,
}

impl Launch {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(env) = &self.env {
            // Same effect as sourcing the environment's activate script.
            let bin = env_bin_dir(env);
            let mut path = vec![bin];
            if let Some(old) = std::env::var_os("PATH") {
                path.extend(std::env::split_paths(&old));
            }
            if let Ok(joined) = std::env::join_paths(path) {
                cmd.env("PATH", joined);
            }
            cmd.env("VIRTUAL_ENV", env);
            cmd.env_remove("PYTHONHOME");
        }
        cmd
    }
}

#[cfg(windows)]
fn env_bin_dir(env: &Path) -> PathBuf {
    env.join("Scripts")
}

#[cfg(not(windows))]
fn env_bin_dir(env: &Path) -> PathBuf {
    env.join("bin")
}

#[cfg(windows)]
fn env_interpreter(env: &Path) -> PathBuf {
    env_bin_dir(env).join("python.exe")
}

#[cfg(not(windows))]
fn env_interpreter(env: &Path) -> PathBuf {
    env_bin_dir(env).join("python")
}

/// Search rules for the tool, its environment, and interpreter names.
#[derive(Clone, Debug)]
pub struct ToolLocator {
    /// Install locations of the tool script, in priority order.
    pub candidates: Vec<PathBuf>,
    /// Base of the `upscale/main.py` fallback.
    pub work_dir: PathBuf,
    pub env_names: Vec<String>,
    pub interpreters: Vec<OsString>,
}

impl ToolLocator {
    /// Standard install locations, preceded by `explicit` if given.
    pub fn system(explicit: Option<PathBuf>) -> Self {
        let mut candidates: Vec<PathBuf> = explicit.into_iter().collect();
        let rel = Path::new(TOOL_DIR).join(TOOL_SCRIPT);

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|e| e.parent().map(Path::to_path_buf))
        {
            candidates.push(exe_dir.join(&rel));
            // Installed layout: <prefix>/bin/upv + <prefix>/share/upv/upscale
            if let Some(prefix) = exe_dir.parent() {
                candidates.push(prefix.join("share").join("upv").join(&rel));
            }
        }
        if let Some(proj) = ProjectDirs::from("", "", "upv") {
            candidates.push(proj.data_dir().join(&rel));
        }
        if cfg!(unix) {
            for base in ["/usr/local/share/upv", "/usr/share/upv", "/opt/upv"] {
                candidates.push(Path::new(base).join(&rel));
            }
        }

        ToolLocator {
            candidates,
            work_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_names: ENV_DIRS.iter().map(|s| s.to_string()).collect(),
            interpreters: INTERPRETERS.iter().map(OsString::from).collect(),
        }
    }

    /// Working-directory fallback location.
    pub fn fallback(&self) -> PathBuf {
        self.work_dir.join(TOOL_DIR).join(TOOL_SCRIPT)
    }

    /// First existing install location, else the working-directory fallback.
    pub fn locate(&self) -> Result<ToolLocation, UpscaleError> {
        let (script, installed) = match self.candidates.iter().find(|p| p.is_file()) {
            Some(p) => (p.clone(), true),
            None => {
                let fb = self.fallback();
                if !fb.is_file() {
                    let mut searched = self.candidates.clone();
                    searched.push(fb);
                    return Err(UpscaleError::ToolNotFound { searched });
                }
                (fb, false)
            }
        };
        let env = script.parent().and_then(|dir| self.find_env(dir));
        Ok(ToolLocation {
            script,
            installed,
            env,
        })
    }

    fn find_env(&self, base: &Path) -> Option<PathBuf> {
        self.env_names
            .iter()
            .map(|name| base.join(name))
            .find(|p| p.is_dir())
    }

    /// Attempts in order. An environment gives exactly one.
    pub fn launches(&self, loc: &ToolLocation) -> Vec<Launch> {
        match &loc.env {
            Some(env) => vec![Launch {
                program: env_interpreter(env).into_os_string(),
                env: Some(env.clone()),
            }],
            None => self
                .interpreters
                .iter()
                .map(|p| Launch {
                    program: p.clone(),
                    env: None,
                })
                .collect(),
        }
    }
}

// ── Process state machine ───────────────────────────────────────────────

/// Captured result of a process that exited before the deadline.
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

#[derive(Debug)]
enum Outcome {
    Completed(Finished),
    TimedOut,
    SpawnFailed(io::Error),
    WaitFailed(io::Error),
}

struct Running {
    child: Child,
    stdout: Option<Tail>,
    stderr: Option<Tail>,
}

enum RunState {
    NotStarted(Command),
    Running(Running),
    Done(Outcome),
}

impl RunState {
    fn step(self, deadline: Instant) -> RunState {
        match self {
            RunState::NotStarted(mut cmd) => match own_group(&mut cmd).spawn() {
                Ok(mut child) => RunState::Running(Running {
                    stdout: drain("upscale-stdout", child.stdout.take()),
                    stderr: drain("upscale-stderr", child.stderr.take()),
                    child,
                }),
                Err(e) => RunState::Done(Outcome::SpawnFailed(e)),
            },
            RunState::Running(run) => RunState::Done(run.wait(deadline)),
            done @ RunState::Done(_) => done,
        }
    }

    fn run_to_end(mut self, deadline: Instant) -> Outcome {
        loop {
            self = match self.step(deadline) {
                RunState::Done(outcome) => return outcome,
                next => next,
            };
        }
    }
}

impl Running {
    fn wait(mut self, deadline: Instant) -> Outcome {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.child.wait_timeout(remaining) {
            Ok(Some(status)) => {
                // Helpers the tool left behind would hold the pipes open.
                kill_group(&mut self.child);
                if Instant::now() > deadline {
                    return Outcome::TimedOut;
                }
                Outcome::Completed(Finished {
                    status,
                    stdout: take_tail(self.stdout, deadline),
                    stderr: take_tail(self.stderr, deadline),
                })
            }
            Ok(None) => {
                // Runaway: kill and reap. Readers are left to finish on EOF.
                kill_group(&mut self.child);
                self.child.wait().ok();
                Outcome::TimedOut
            }
            Err(e) => {
                kill_group(&mut self.child);
                self.child.wait().ok();
                Outcome::WaitFailed(e)
            }
        }
    }
}

/// Start the child as leader of a new process group.
#[cfg(unix)]
fn own_group(cmd: &mut Command) -> &mut Command {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0)
}

#[cfg(not(unix))]
fn own_group(cmd: &mut Command) -> &mut Command {
    cmd
}

/// Kill the child and everything still running in its process group.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall on a group id we created; ESRCH is fine.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    child.kill().ok();
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    child.kill().ok();
}

/// Last `MAX_CAPTURE` bytes of one pipe, filled by a reader thread.
struct Tail {
    buf: Arc<Mutex<Vec<u8>>>,
    eof: Receiver<()>,
}

/// Read a pipe to EOF on a helper thread, keeping only the last `MAX_CAPTURE`
/// bytes. Keeps a chatty tool from blocking on a full pipe.
fn drain<R: Read + Send + 'static>(name: &str, pipe: Option<R>) -> Option<Tail> {
    let mut pipe = pipe?;
    let buf = Arc::new(Mutex::new(Vec::new()));
    let (tx, eof) = mpsc::channel();
    let shared = Arc::clone(&buf);
    std::thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let mut tail = match shared.lock() {
                            Ok(t) => t,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        tail.extend_from_slice(&chunk[..n]);
                        if tail.len() > MAX_CAPTURE {
                            let cut = tail.len() - MAX_CAPTURE;
                            tail.drain(..cut);
                        }
                    }
                }
            }
            tx.send(()).ok();
        })
        .ok()?;
    Some(Tail { buf, eof })
}

/// Wait for EOF until `until`, then take whatever has been read.
fn take_tail(tail: Option<Tail>, until: Instant) -> Vec<u8> {
    let Some(tail) = tail else {
        return Vec::new();
    };
    let left = until.saturating_duration_since(Instant::now());
    if tail.eof.recv_timeout(left).is_err() {
        log::debug!("tool output still open at the deadline, keeping partial tail");
    }
    let out = match tail.buf.lock() {
        Ok(t) => t.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    out
}

fn failure_marker(out: &[u8]) -> Option<&'static str> {
    let text = String::from_utf8_lossy(out);
    FAILURE_MARKERS.iter().copied().find(|m| text.contains(m))
}

// ── Orchestrator ────────────────────────────────────────────────────────

pub struct Upscaler {
    locator: ToolLocator,
    timeout: Duration,
    extra_args: Vec<OsString>,
}

impl Upscaler {
    pub fn new(locator: ToolLocator, cfg: &UpscaleConfig) -> Self {
        let mut extra_args = Vec::new();
        if !cfg.gpu {
            extra_args.push(OsString::from("--no-gpu"));
        }
        if let Some(tile) = cfg.tile_size {
            extra_args.push(OsString::from("--tile-size"));
            extra_args.push(OsString::from(tile.to_string()));
        }
        Upscaler {
            locator,
            timeout: cfg.timeout,
            extra_args,
        }
    }

    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upscale the current entry and make the result current.
    ///
    /// No-op on an empty set. On any failure `nav` is left untouched.
    pub fn upscale(&self, nav: &mut NavState, scale: ScaleFactor) -> Result<(), UpscaleError> {
        let Some(current) = nav.current() else {
            return Ok(());
        };
        let job = UpscaleJob::new(current.path(), scale, self.timeout);
        let output = self.run(&job)?;
        nav.append(ImageRef::new(output));
        nav.set_current_to_last();
        Ok(())
    }

    /// Run one job to a verified output path.
    pub fn run(&self, job: &UpscaleJob) -> Result<PathBuf, UpscaleError> {
        let loc = self.locator.locate()?;
        log::info!(
            "upscale {} {} -> {} (tool {}{})",
            job.scale,
            job.input.display(),
            job.output.display(),
            loc.script.display(),
            match &loc.env {
                Some(env) => format!(", env {}", env.display()),
                None => String::new(),
            }
        );
        if job.output.exists() {
            log::warn!("{} exists, removing it before the run", job.output.display());
            std::fs::remove_file(&job.output)?;
        }

        let started = Instant::now();
        let mut spawn_error = None;
        for launch in self.locator.launches(&loc) {
            let cmd = self.command(&launch, &loc, job);
            match RunState::NotStarted(cmd).run_to_end(job.deadline) {
                Outcome::SpawnFailed(e) => {
                    log::warn!("cannot start {}: {}", launch.program.to_string_lossy(), e);
                    spawn_error = Some((launch.program, e));
                }
                Outcome::TimedOut => {
                    log::warn!("upscale killed after {:.1}s", started.elapsed().as_secs_f64());
                    return Err(UpscaleError::Timeout {
                        limit: self.timeout,
                    });
                }
                Outcome::WaitFailed(e) => return Err(UpscaleError::Io(e)),
                Outcome::Completed(done) => {
                    log::info!("upscale finished in {:.1}s", started.elapsed().as_secs_f64());
                    return verify(done, job);
                }
            }
        }

        match spawn_error {
            Some((program, source)) => Err(UpscaleError::SpawnFailed {
                program: program.to_string_lossy().into_owned(),
                source,
            }),
            None => Err(UpscaleError::SpawnFailed {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::NotFound, "no interpreter configured"),
            }),
        }
    }

    fn command(&self, launch: &Launch, loc: &ToolLocation, job: &UpscaleJob) -> Command {
        let mut cmd = launch.command();
        cmd.arg(&loc.script)
            .arg(&job.input)
            .arg(&job.output)
            .arg("--scale")
            .arg(job.scale.value().to_string())
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

fn verify(done: Finished, job: &UpscaleJob) -> Result<PathBuf, UpscaleError> {
    let marker = failure_marker(&done.stdout).or_else(|| failure_marker(&done.stderr));
    if !done.status.success() || marker.is_some() {
        let detail = if done.stderr.iter().any(|b| !b.is_ascii_whitespace()) {
            &done.stderr
        } else {
            &done.stdout
        };
        let mut detail = String::from_utf8_lossy(detail).trim().to_string();
        if detail.is_empty() {
            detail = "no output".into();
        }
        return Err(UpscaleError::UpscalingFailed {
            status: match marker {
                Some(m) if done.status.success() => format!("output reported {:?}", m),
                _ => done.status.to_string(),
            },
            detail,
        });
    }
    if !job.output.is_file() {
        return Err(UpscaleError::OutputFileMissing(job.output.clone()));
    }
    log::debug!(
        "tool output:\n{}",
        String::from_utf8_lossy(&done.stdout).trim_end()
    );
    Ok(job.output.clone())
}
