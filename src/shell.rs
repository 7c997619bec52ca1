//! Display shell boundary.
//!
//! A shell shows the current entry and turns user input into [`Command`]s.
//! It only ever reads the navigation state; the session applies commands.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::nav::NavState;
use crate::upscale::ScaleFactor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Quit,
    Upscale(ScaleFactor),
}

/// Default-2x shorthand plus the three explicit factors.
pub const UPSCALE_DEFAULT: Command = Command::Upscale(ScaleFactor::DEFAULT);

pub trait Shell {
    /// Present the current entry. Called after every state change.
    fn show(&mut self, nav: &NavState) -> Result<()>;

    /// Block for the next command. `None` means the input is gone (treat as quit).
    fn next_command(&mut self) -> Result<Option<Command>>;

    /// A long operation is starting; the shell will not be polled until it ends.
    fn busy(&mut self, _what: &str) {}

    /// A command failed; the current entry stays displayed.
    fn report_error(&mut self, msg: &str);
}

/// Terminal line commands.
pub fn parse_line(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Some(Command::Next),
        "p" | "prev" | "previous" => Some(Command::Previous),
        "q" | "quit" | "exit" => Some(Command::Quit),
        "u" => Some(UPSCALE_DEFAULT),
        "2" => Some(Command::Upscale(ScaleFactor::X2)),
        "3" => Some(Command::Upscale(ScaleFactor::X3)),
        "4" => Some(Command::Upscale(ScaleFactor::X4)),
        _ => None,
    }
}

/// Headless shell: one status line per entry, commands read line by line.
pub struct TerminalShell<R, W> {
    input: R,
    out: W,
}

impl TerminalShell<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        TerminalShell {
            input: io::stdin().lock(),
            out: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> TerminalShell<R, W> {
    pub fn new(input: R, out: W) -> Self {
        TerminalShell { input, out }
    }
}

impl<R: BufRead, W: Write> Shell for TerminalShell<R, W> {
    fn show(&mut self, nav: &NavState) -> Result<()> {
        let Some(cur) = nav.current() else {
            writeln!(self.out, "(no images)")?;
            return Ok(());
        };
        let dims = match image::image_dimensions(cur.path()) {
            Ok((w, h)) => format!("{}x{}", w, h),
            Err(_) => "?x?".into(),
        };
        writeln!(
            self.out,
            "[{}/{}] {} ({})",
            nav.index() + 1,
            nav.len(),
            cur,
            dims
        )?;
        write!(self.out, "n/p/q, u or 2/3/4 to upscale> ")?;
        self.out.flush()?;
        Ok(())
    }

    fn next_command(&mut self) -> Result<Option<Command>> {
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match parse_line(&line) {
                Some(cmd) => return Ok(Some(cmd)),
                None => {
                    write!(self.out, "unknown command {:?}> ", line.trim())?;
                    self.out.flush()?;
                }
            }
        }
    }

    fn busy(&mut self, what: &str) {
        writeln!(self.out, "{}...", what).ok();
    }

    fn report_error(&mut self, msg: &str) {
        writeln!(self.out, "error: {}", msg).ok();
    }
}
