// ABOUTME: Driver contracts used by capture mode
// ABOUTME: Screen, mouse and keyboard collaborators plus the implementations bundled with the CLI

use crate::errors::{CastError, Result};
use log::{debug, info};
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Takes a screenshot and stores it in `image_dir`.
pub trait ScreenDriver {
    /// Returns the file name of the new image, relative to `image_dir`.
    fn take_screen(&mut self, image_dir: &Path, id: &str) -> Result<String>;
}

/// Reports where the pointer is, as fractions of the screen.
pub trait MouseDriver {
    fn pointer_position(&self) -> (f64, f64);
}

/// Installs and removes the global key listener used while capturing.
pub trait KeyboardDriver {
    fn add_key_listener(&mut self) -> Result<()>;
    fn remove_key_listener(&mut self) -> Result<()>;
}

/// Runs an external screenshot program.
///
/// The template is split on whitespace and every `{path}` in it is replaced by
/// the destination file, e.g. `scrot --overwrite {path}` or `screencapture -x {path}`.
#[derive(Debug, Clone)]
pub struct CommandScreenDriver {
    template: String,
}

impl CommandScreenDriver {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl ScreenDriver for CommandScreenDriver {
    fn take_screen(&mut self, image_dir: &Path, id: &str) -> Result<String> {
        let file_name = format!("{}.png", id);
        let target = image_dir.join(&file_name);
        let target_str = target.to_string_lossy();

        let mut parts = self.template.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CastError::DriverError("empty screenshot command".to_string()))?;
        let args: Vec<String> = parts.map(|a| a.replace("{path}", &target_str)).collect();

        debug!("Running screenshot command {} {:?}", program, args);
        let status = Command::new(program)
            .args(&args)
            .status()
            .map_err(|e| CastError::DriverError(format!("failed to run {}: {}", program, e)))?;
        if !status.success() {
            return Err(CastError::DriverError(format!(
                "{} exited with {}",
                program, status
            )));
        }
        if !target.exists() {
            return Err(CastError::PathNotFoundError(target));
        }

        info!("Screenshot written to {:?}", target);
        Ok(file_name)
    }
}

/// Copies an existing image instead of grabbing the screen.
#[derive(Debug, Clone)]
pub struct ImageFileScreenDriver {
    source: PathBuf,
}

impl ImageFileScreenDriver {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl ScreenDriver for ImageFileScreenDriver {
    fn take_screen(&mut self, image_dir: &Path, id: &str) -> Result<String> {
        let extension = self
            .source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "png".to_string());
        let file_name = format!("{}.{}", id, extension);
        let target = image_dir.join(&file_name);
        fs::copy(&self.source, &target).map_err(|e| CastError::io(&self.source, e))?;
        Ok(file_name)
    }
}

/// A pointer that never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMouse {
    pub x: f64,
    pub y: f64,
}

impl FixedMouse {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for FixedMouse {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

impl MouseDriver for FixedMouse {
    fn pointer_position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Keyboard for front ends that feed key events themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullKeyboard {
    pub listening: bool,
}

impl KeyboardDriver for NullKeyboard {
    fn add_key_listener(&mut self) -> Result<()> {
        self.listening = true;
        Ok(())
    }

    fn remove_key_listener(&mut self) -> Result<()> {
        self.listening = false;
        Ok(())
    }
}

/// Key names read one per line. Blank lines are skipped.
pub fn read_key_events<R: BufRead>(reader: R) -> impl Iterator<Item = Result<String>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) => {
            let key = line.trim();
            if key.is_empty() {
                None
            } else {
                Some(Ok(key.to_string()))
            }
        }
        Err(e) => Some(Err(CastError::io("<stdin>", e))),
    })
}
