// ABOUTME: Persistence codec for project files
// ABOUTME: Versioned JSON wire schema converted to and from the in-memory presentation

use crate::errors::{CastError, Result};
use crate::model::{
    is_valid_coordinate, is_valid_speed, Action, ActionTarget, Presentation, Slide,
};
use crate::utils;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Highest project file version this crate reads and the one it writes.
pub const PROJECT_FORMAT_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    #[serde(default = "legacy_version")]
    version: u32,
    output_width: u32,
    output_height: u32,
    #[serde(default)]
    slides: Vec<SlideRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlideRecord {
    id: String,
    image_path: String,
    #[serde(default)]
    actions: Vec<ActionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRecord {
    target: TargetRecord,
    final_abs: f64,
    final_ord: f64,
    speed: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum TargetRecord {
    #[serde(rename = "mouse-cursor")]
    MouseCursor,
}

impl From<TargetRecord> for ActionTarget {
    fn from(target: TargetRecord) -> Self {
        match target {
            TargetRecord::MouseCursor => ActionTarget::MouseCursor,
        }
    }
}

impl From<ActionTarget> for TargetRecord {
    fn from(target: ActionTarget) -> Self {
        match target {
            ActionTarget::MouseCursor => TargetRecord::MouseCursor,
        }
    }
}

impl From<&Presentation> for ProjectFile {
    fn from(p: &Presentation) -> Self {
        Self {
            version: PROJECT_FORMAT_VERSION,
            output_width: p.output_width,
            output_height: p.output_height,
            slides: p
                .slides
                .iter()
                .map(|s| SlideRecord {
                    id: s.id.clone(),
                    image_path: s.image_path.clone(),
                    actions: s
                        .actions
                        .iter()
                        .map(|a| ActionRecord {
                            target: a.target.into(),
                            final_abs: a.final_abs,
                            final_ord: a.final_ord,
                            speed: a.speed,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl ProjectFile {
    /// Check the boundary rules and convert to the in-memory model.
    fn into_presentation(self, path: &Path) -> Result<Presentation> {
        if self.version > PROJECT_FORMAT_VERSION {
            return Err(CastError::UnsupportedVersion {
                found: self.version,
                supported: PROJECT_FORMAT_VERSION,
            });
        }

        let mut seen = HashSet::new();
        let mut slides = Vec::with_capacity(self.slides.len());
        for record in self.slides {
            if !seen.insert(record.id.clone()) {
                return Err(CastError::ValidationError {
                    path: path.to_path_buf(),
                    message: format!("duplicate slide id {}", record.id),
                });
            }

            if !utils::is_contained_path(&record.image_path) {
                return Err(CastError::ValidationError {
                    path: path.to_path_buf(),
                    message: format!(
                        "slide {} has image path {:?} outside the project",
                        record.id, record.image_path
                    ),
                });
            }

            let mut slide = Slide::new(record.id, record.image_path);
            for action in record.actions {
                if !is_valid_speed(action.speed) {
                    return Err(CastError::ValidationError {
                        path: path.to_path_buf(),
                        message: format!(
                            "slide {} has an action with non-positive speed {}",
                            slide.id, action.speed
                        ),
                    });
                }
                slide.actions.push(Action {
                    target: action.target.into(),
                    final_abs: action.final_abs,
                    final_ord: action.final_ord,
                    speed: action.speed,
                });
            }
            slides.push(slide);
        }

        Ok(Presentation {
            output_width: self.output_width,
            output_height: self.output_height,
            slides,
        })
    }
}

/// Decode a presentation from project file text.
pub fn load(text: &str) -> Result<Presentation> {
    parse(text, Path::new("<memory>"))
}

/// Encode a presentation. Field order is fixed, so an unchanged presentation
/// always produces the same text.
///
/// Values JSON cannot hold (non-finite coordinates or speeds) are refused
/// rather than written as `null`.
pub fn save(presentation: &Presentation) -> Result<String> {
    for action in presentation.slides.iter().flat_map(|s| &s.actions) {
        if !is_valid_speed(action.speed) {
            return Err(CastError::InvalidValue {
                what: "speed",
                value: action.speed,
            });
        }
        for value in [action.final_abs, action.final_ord] {
            if !is_valid_coordinate(value) {
                return Err(CastError::InvalidValue {
                    what: "cursor coordinate",
                    value,
                });
            }
        }
    }
    let mut text = serde_json::to_string_pretty(&ProjectFile::from(presentation))?;
    text.push('\n');
    Ok(text)
}

/// Read and decode a project file. Parse failures carry the file path.
pub fn load_file(path: &Path) -> Result<Presentation> {
    info!("Loading project file {:?}", path);
    if !path.exists() {
        return Err(CastError::PathNotFoundError(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| CastError::io(path, e))?;
    parse(&text, path)
}

pub fn save_file(presentation: &Presentation, path: &Path) -> Result<()> {
    info!("Saving project file {:?}", path);
    let text = save(presentation)?;
    fs::write(path, text).map_err(|e| CastError::io(path, e))
}

fn parse(text: &str, path: &Path) -> Result<Presentation> {
    let file: ProjectFile = serde_json::from_str(text).map_err(|source| CastError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    file.into_presentation(path)
}
