// ABOUTME: Data model for screencast presentations
// ABOUTME: Defines the presentation, its ordered slides and their overlay actions

use std::collections::HashSet;
use std::fmt;

/// What an action moves on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    MouseCursor,
}

impl ActionTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTarget::MouseCursor => "mouse-cursor",
        }
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An overlay event on a slide.
///
/// `final_abs` and `final_ord` are fractions of the canvas, not pixels. They are
/// stored as given; callers supply normalised values.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub target: ActionTarget,
    pub final_abs: f64,
    pub final_ord: f64,
    pub speed: f64,
}

impl Action {
    /// Create a mouse-cursor placement.
    pub fn mouse(final_abs: f64, final_ord: f64, speed: f64) -> Self {
        Self {
            target: ActionTarget::MouseCursor,
            final_abs,
            final_ord,
            speed,
        }
    }
}

/// One presentation step, anchored to a single screenshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub id: String,
    /// Path of the screenshot relative to the project root.
    pub image_path: String,
    pub actions: Vec<Action>,
}

impl Slide {
    pub fn new(id: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_path: image_path.into(),
            actions: Vec::new(),
        }
    }

    /// File name component of the image path.
    pub fn image_file_name(&self) -> &str {
        self.image_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.image_path)
    }
}

/// A whole project: output canvas size plus the ordered slides.
///
/// Slide order is the playback order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Presentation {
    pub output_width: u32,
    pub output_height: u32,
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            output_width,
            output_height,
            slides: Vec::new(),
        }
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.slides.iter().any(|s| s.id == id)
    }

    /// Image paths referenced by the slides, in slide order, without duplicates.
    pub fn image_paths(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.slides
            .iter()
            .map(|s| s.image_path.as_str())
            .filter(|path| seen.insert(*path))
            .collect()
    }
}

/// Speeds must be positive and finite to be written and read back.
pub fn is_valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed > 0.0
}

/// Coordinates are unclamped but must be finite; JSON has no infinity.
pub fn is_valid_coordinate(value: f64) -> bool {
    value.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_file_name() {
        let slide = Slide::new("a1b2", "img/a1b2.png");
        assert_eq!(slide.image_file_name(), "a1b2.png");

        let bare = Slide::new("c3d4", "c3d4.png");
        assert_eq!(bare.image_file_name(), "c3d4.png");
    }

    #[test]
    fn test_image_paths_deduplicates_in_order() {
        let mut p = Presentation::new(800, 600);
        p.slides.push(Slide::new("a", "img/x.png"));
        p.slides.push(Slide::new("b", "img/y.png"));
        p.slides.push(Slide::new("c", "img/x.png"));
        assert_eq!(p.image_paths(), vec!["img/x.png", "img/y.png"]);
    }

    #[test]
    fn test_speed_and_coordinate_rules() {
        assert!(is_valid_speed(0.8));
        assert!(!is_valid_speed(0.0));
        assert!(!is_valid_speed(-1.0));
        assert!(!is_valid_speed(f64::INFINITY));
        assert!(!is_valid_speed(f64::NAN));

        assert!(is_valid_coordinate(-3.5));
        assert!(!is_valid_coordinate(f64::NEG_INFINITY));
        assert!(!is_valid_coordinate(f64::NAN));
    }

    #[test]
    fn test_target_names() {
        assert_eq!(ActionTarget::MouseCursor.to_string(), "mouse-cursor");
    }
}
