//! Browse session: one command at a time, on one thread.
//!
//! Every mutation of the navigation state finishes before the shell is asked
//! to draw again, so a shell never sees a half-applied append.

use anyhow::Result;

use crate::nav::NavState;
use crate::shell::{Command, Shell};
use crate::upscale::Upscaler;

pub fn run(shell: &mut dyn Shell, nav: &mut NavState, upscaler: &Upscaler) -> Result<()> {
    shell.show(nav)?;
    while let Some(cmd) = shell.next_command()? {
        if !apply(cmd, shell, nav, upscaler) {
            break;
        }
        shell.show(nav)?;
    }
    Ok(())
}

/// Apply one command. Returns false on quit.
fn apply(cmd: Command, shell: &mut dyn Shell, nav: &mut NavState, upscaler: &Upscaler) -> bool {
    match cmd {
        Command::Quit => return false,
        Command::Next => {
            nav.next();
        }
        Command::Previous => {
            nav.previous();
        }
        Command::Upscale(scale) => {
            if nav.is_empty() {
                return true;
            }
            shell.busy(&format!("upscaling {}", scale));
            match upscaler.upscale(nav, scale) {
                Ok(()) => {
                    if let Some(cur) = nav.current() {
                        log::info!("upscaled: {}", cur);
                    }
                }
                Err(e) => {
                    log::warn!("upscale failed: {}", e);
                    shell.report_error(&e.to_string());
                }
            }
        }
    }
    true
}
