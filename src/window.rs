//! SDL2 window shell.
//!
//! Decodes the current entry with the `image` crate, sizes the window to it
//! (shrunk to the usable display area), and maps keys to commands. Only the
//! frame on screen is kept in memory.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use image::GenericImageView;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::render::WindowCanvas;
use sdl2::EventPump;

use crate::nav::NavState;
use crate::shell::{Command, Shell, UPSCALE_DEFAULT};
use crate::upscale::ScaleFactor;
use crate::{GIT_HASH, VERSION};

/// Decoded image: raw RGBA pixels ready for upload.
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    /// Decode an image file to RGBA. Returns None on failure.
    pub fn from_file(path: &Path) -> Option<Self> {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("decode {}: {}", path.display(), e);
                return None;
            }
        };
        let (w, h) = img.dimensions();
        let rgba = img.into_rgba8().into_raw();
        Some(DecodedImage {
            rgba,
            width: w,
            height: h,
        })
    }
}

/// Largest size with the image's aspect ratio that fits in `max`.
fn fit(size: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (w, h) = (size.0.max(1), size.1.max(1));
    if w <= max.0 && h <= max.1 {
        return (w, h);
    }
    let scale = f64::min(max.0 as f64 / w as f64, max.1 as f64 / h as f64);
    (
        ((w as f64 * scale).round() as u32).max(1),
        ((h as f64 * scale).round() as u32).max(1),
    )
}

fn command_for(key: Keycode) -> Option<Command> {
    match key {
        Keycode::Right | Keycode::Space | Keycode::N => Some(Command::Next),
        Keycode::Left | Keycode::Backspace | Keycode::P => Some(Command::Previous),
        Keycode::Q | Keycode::Escape => Some(Command::Quit),
        Keycode::U => Some(UPSCALE_DEFAULT),
        Keycode::Num2 | Keycode::Kp2 => Some(Command::Upscale(ScaleFactor::X2)),
        Keycode::Num3 | Keycode::Kp3 => Some(Command::Upscale(ScaleFactor::X3)),
        Keycode::Num4 | Keycode::Kp4 => Some(Command::Upscale(ScaleFactor::X4)),
        _ => None,
    }
}

pub struct WindowShell {
    canvas: WindowCanvas,
    events: EventPump,
    max_size: (u32, u32),
    frame: Option<DecodedImage>,
    shown: Option<PathBuf>,
    title: String,
    _sdl: sdl2::Sdl,
}

impl WindowShell {
    pub fn open() -> Result<Self> {
        let sdl = sdl2::init().map_err(|e| anyhow!("SDL2 init failed: {}", e))?;
        let video = sdl
            .video()
            .map_err(|e| anyhow!("SDL2 video init failed: {}", e))?;
        let max_size = video
            .display_usable_bounds(0)
            .map(|r| (r.width(), r.height()))
            .unwrap_or((1280, 720));

        let window = video
            .window("upv", 640, 480)
            .position_centered()
            .build()
            .map_err(|e| anyhow!("failed to create window: {}", e))?;
        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| anyhow!("failed to create renderer: {}", e))?;
        let events = sdl
            .event_pump()
            .map_err(|e| anyhow!("failed to create event pump: {}", e))?;

        Ok(WindowShell {
            canvas,
            events,
            max_size,
            frame: None,
            shown: None,
            title: String::new(),
            _sdl: sdl,
        })
    }

    fn set_title(&mut self, title: &str) {
        self.canvas.window_mut().set_title(title).ok();
    }

    fn redraw(&mut self) -> Result<()> {
        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();
        if let Some(frame) = &self.frame {
            let creator = self.canvas.texture_creator();
            // ABGR8888 is R,G,B,A byte order on little-endian hosts.
            let mut tex = creator
                .create_texture_static(PixelFormatEnum::ABGR8888, frame.width, frame.height)
                .map_err(|e| anyhow!("texture: {}", e))?;
            tex.update(None, &frame.rgba, frame.width as usize * 4)
                .map_err(|e| anyhow!("texture upload: {}", e))?;
            self.canvas
                .copy(&tex, None, None)
                .map_err(|e| anyhow!("draw: {}", e))?;
        }
        self.canvas.present();
        Ok(())
    }
}

impl Shell for WindowShell {
    fn show(&mut self, nav: &NavState) -> Result<()> {
        let Some(cur) = nav.current() else {
            return Ok(());
        };
        if self.shown.as_deref() != Some(cur.path()) {
            self.frame = DecodedImage::from_file(cur.path());
            self.shown = Some(cur.path().to_path_buf());
            if let Some(frame) = &self.frame {
                let (w, h) = fit((frame.width, frame.height), self.max_size);
                self.canvas
                    .window_mut()
                    .set_size(w, h)
                    .map_err(|e| anyhow!("resize: {}", e))?;
            }
        }

        let broken = if self.frame.is_none() { " (cannot decode)" } else { "" };
        self.title = format!(
            "[{}/{}] {}{} — upv {}-{}",
            nav.index() + 1,
            nav.len(),
            cur.file_name(),
            broken,
            VERSION,
            GIT_HASH,
        );
        let title = self.title.clone();
        self.set_title(&title);
        self.redraw()
    }

    fn next_command(&mut self) -> Result<Option<Command>> {
        loop {
            match self.events.wait_event() {
                Event::Quit { .. } => return Ok(Some(Command::Quit)),
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => {
                    if let Some(cmd) = command_for(key) {
                        return Ok(Some(cmd));
                    }
                }
                Event::Window {
                    win_event: WindowEvent::Exposed | WindowEvent::SizeChanged(..),
                    ..
                } => self.redraw()?,
                _ => {}
            }
        }
    }

    fn busy(&mut self, what: &str) {
        let title = format!("{}… {}", what, self.title);
        self.set_title(&title);
    }

    fn report_error(&mut self, msg: &str) {
        let title = format!("error: {} — {}", msg, self.title);
        self.set_title(&title);
    }
}
