// ABOUTME: Slide store owning the live presentation
// ABOUTME: Every structural mutation goes through here and is announced on the notification bus

use crate::codec;
use crate::errors::{CastError, Result};
use crate::events::{Event, NotificationBus};
use crate::model::{is_valid_coordinate, is_valid_speed, Action, Presentation, Slide};
use crate::utils;
use log::debug;

/// Owns the single live presentation and the bus its changes are announced on.
///
/// Indices are checked before anything is touched, so a failed call leaves the
/// presentation as it was. Events are published after the mutation completes.
#[derive(Debug, Default)]
pub struct SlideStore {
    presentation: Presentation,
    bus: NotificationBus,
}

impl SlideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store around an already decoded presentation.
    pub fn from_presentation(presentation: Presentation) -> Self {
        Self {
            presentation,
            bus: NotificationBus::new(),
        }
    }

    pub fn bus(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }

    pub fn notify(&mut self, event: Event) {
        self.bus.publish(event);
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Replace the current presentation with an empty one.
    pub fn create_presentation(&mut self, width: u32, height: u32) {
        self.presentation = Presentation::new(width, height);
        self.bus.publish(Event::ProjectCreated);
    }

    /// Replace the current presentation with a loaded one.
    pub fn replace_presentation(&mut self, presentation: Presentation) {
        let slides = presentation.slides.len();
        self.presentation = presentation;
        self.bus.publish(Event::ProjectLoaded { slides });
    }

    /// Insert a slide at `position` (0..=len) whose first action places the
    /// mouse cursor at the given point.
    pub fn add_slide(
        &mut self,
        position: usize,
        id: &str,
        image_path: &str,
        cursor_x: f64,
        cursor_y: f64,
        speed: f64,
    ) -> Result<()> {
        let len = self.presentation.slides.len();
        if position > len {
            return Err(CastError::RangeError {
                index: position,
                len,
            });
        }
        if self.presentation.contains_id(id) {
            return Err(CastError::DuplicateSlideId(id.to_string()));
        }
        if !utils::is_contained_path(image_path) {
            return Err(CastError::UnsafeImagePath(image_path.to_string()));
        }
        check_coordinates(cursor_x, cursor_y)?;
        if !is_valid_speed(speed) {
            return Err(CastError::InvalidValue {
                what: "speed",
                value: speed,
            });
        }

        let mut slide = Slide::new(id, image_path);
        slide.actions.push(Action::mouse(cursor_x, cursor_y, speed));
        self.presentation.slides.insert(position, slide);
        debug!("Inserted slide {} at position {}", id, position);

        self.bus.publish(Event::SlideAdded(position));
        Ok(())
    }

    /// Remove and return the slide at `position`.
    ///
    /// The image file is left alone; use [`SlideStore::is_image_referenced`] to
    /// find out whether it became orphaned.
    pub fn remove_slide(&mut self, position: usize) -> Result<Slide> {
        self.check_index(position)?;
        let removed = self.presentation.slides.remove(position);
        debug!("Removed slide {} from position {}", removed.id, position);

        self.bus.publish(Event::SlideRemoved(position));
        Ok(removed)
    }

    /// Swap two slides. Both indices must be valid.
    pub fn invert_slides(&mut self, i: usize, j: usize) -> Result<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        self.presentation.slides.swap(i, j);

        self.bus.publish(Event::SlidesSwapped(i, j));
        Ok(())
    }

    /// Move an action to new coordinates. Values are stored unclamped but
    /// must be finite.
    pub fn edit_mouse_action(
        &mut self,
        slide_index: usize,
        action_id: usize,
        x: f64,
        y: f64,
    ) -> Result<()> {
        self.check_index(slide_index)?;
        check_coordinates(x, y)?;
        let action = self.presentation.slides[slide_index]
            .actions
            .get_mut(action_id)
            .ok_or(CastError::UnknownAction {
                slide: slide_index,
                action: action_id,
            })?;
        action.final_abs = x;
        action.final_ord = y;

        self.bus.publish(Event::ActionEdited {
            slide: slide_index,
            action: action_id,
        });
        Ok(())
    }

    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.presentation.output_width = width;
        self.presentation.output_height = height;
        self.bus.publish(Event::OutputSizeChanged { width, height });
    }

    pub fn get_slide(&self, index: usize) -> Result<&Slide> {
        self.check_index(index)?;
        Ok(&self.presentation.slides[index])
    }

    pub fn get_action_list(&self, index: usize) -> Result<&[Action]> {
        Ok(&self.get_slide(index)?.actions)
    }

    pub fn get_nb_slide(&self) -> usize {
        self.presentation.slides.len()
    }

    /// Image path of every slide, in slide order.
    pub fn get_image_list(&self) -> Vec<&str> {
        self.presentation
            .slides
            .iter()
            .map(|s| s.image_path.as_str())
            .collect()
    }

    pub fn is_image_referenced(&self, image_path: &str) -> bool {
        self.presentation
            .slides
            .iter()
            .any(|s| s.image_path == image_path)
    }

    /// Any image of the presentation, used to read the capture resolution.
    pub fn get_a_background_image(&self) -> Option<&str> {
        self.presentation
            .slides
            .first()
            .map(|s| s.image_path.as_str())
    }

    pub fn get_image_width(&self) -> u32 {
        self.presentation.output_width
    }

    pub fn get_image_height(&self) -> u32 {
        self.presentation.output_height
    }

    /// Encode the presentation in the project file format.
    pub fn to_json(&self) -> Result<String> {
        codec::save(&self.presentation)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.presentation.slides.len();
        if index >= len {
            return Err(CastError::RangeError { index, len });
        }
        Ok(())
    }
}

fn check_coordinates(x: f64, y: f64) -> Result<()> {
    for value in [x, y] {
        if !is_valid_coordinate(value) {
            return Err(CastError::InvalidValue {
                what: "cursor coordinate",
                value,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store_with(ids: &[&str]) -> SlideStore {
        let mut store = SlideStore::new();
        store.create_presentation(800, 600);
        for (i, id) in ids.iter().enumerate() {
            store
                .add_slide(i, id, &format!("img/{}.png", id), 0.5, 0.5, 0.8)
                .unwrap();
        }
        store
    }

    fn ids(store: &SlideStore) -> Vec<String> {
        store
            .presentation()
            .slides
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    fn record(store: &mut SlideStore) -> Rc<RefCell<Vec<Event>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.bus().subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_add_slide_inserts_with_mouse_action() {
        let mut store = store_with(&["a", "c"]);
        store.add_slide(1, "b", "img/b.png", 0.25, 0.75, 1.5).unwrap();

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        let actions = store.get_action_list(1).unwrap();
        assert_eq!(actions, &[Action::mouse(0.25, 0.75, 1.5)]);
    }

    #[test]
    fn test_add_slide_at_end_is_allowed() {
        let mut store = store_with(&["a"]);
        store.add_slide(1, "b", "img/b.png", 0.0, 0.0, 1.0).unwrap();
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_add_slide_out_of_range_leaves_store_untouched() {
        let mut store = store_with(&["a"]);
        let events = record(&mut store);

        let err = store.add_slide(3, "b", "img/b.png", 0.0, 0.0, 1.0);
        assert!(matches!(err, Err(CastError::RangeError { index: 3, len: 1 })));
        assert_eq!(ids(&store), vec!["a"]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_add_slide_rejects_duplicate_id() {
        let mut store = store_with(&["a"]);
        let err = store.add_slide(0, "a", "img/other.png", 0.0, 0.0, 1.0);
        assert!(matches!(err, Err(CastError::DuplicateSlideId(_))));
        assert_eq!(store.get_nb_slide(), 1);
    }

    #[test]
    fn test_add_slide_rejects_unstorable_values() {
        let mut store = store_with(&["a"]);
        let events = record(&mut store);

        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                store.add_slide(1, "b", "img/b.png", 0.5, 0.5, speed),
                Err(CastError::InvalidValue { what: "speed", .. })
            ));
        }
        assert!(matches!(
            store.add_slide(1, "b", "img/b.png", f64::INFINITY, 0.5, 0.8),
            Err(CastError::InvalidValue { .. })
        ));
        assert!(matches!(
            store.add_slide(1, "b", "../b.png", 0.5, 0.5, 0.8),
            Err(CastError::UnsafeImagePath(_))
        ));

        assert_eq!(ids(&store), vec!["a"]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_edit_rejects_non_finite_coordinates() {
        let mut store = store_with(&["a"]);
        let events = record(&mut store);

        assert!(store.edit_mouse_action(0, 0, f64::INFINITY, 0.5).is_err());
        assert!(store.edit_mouse_action(0, 0, 0.5, f64::NAN).is_err());

        assert_eq!(store.get_action_list(0).unwrap(), &[Action::mouse(0.5, 0.5, 0.8)]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_add_then_remove_restores_order() {
        let mut store = store_with(&["a", "b", "c"]);
        let before = store.presentation().clone();

        store.add_slide(1, "x", "img/x.png", 0.1, 0.2, 0.8).unwrap();
        let removed = store.remove_slide(1).unwrap();

        assert_eq!(removed.id, "x");
        assert_eq!(store.presentation(), &before);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut store = store_with(&["a"]);
        assert!(matches!(
            store.remove_slide(1),
            Err(CastError::RangeError { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let mut store = store_with(&["a", "b", "c", "d"]);
        store.edit_mouse_action(0, 0, 0.9, 0.1).unwrap();
        let before = store.presentation().clone();

        store.invert_slides(0, 3).unwrap();
        assert_eq!(ids(&store), vec!["d", "b", "c", "a"]);
        store.invert_slides(0, 3).unwrap();

        assert_eq!(store.presentation(), &before);
    }

    #[test]
    fn test_invert_rejects_bad_index() {
        let mut store = store_with(&["a", "b"]);
        assert!(store.invert_slides(0, 2).is_err());
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_edit_mouse_action_does_not_clamp() {
        let mut store = store_with(&["a"]);
        store.edit_mouse_action(0, 0, 1.4, -0.2).unwrap();
        let action = &store.get_action_list(0).unwrap()[0];
        assert_eq!(action.final_abs, 1.4);
        assert_eq!(action.final_ord, -0.2);
    }

    #[test]
    fn test_edit_unknown_action() {
        let mut store = store_with(&["a"]);
        assert!(matches!(
            store.edit_mouse_action(0, 4, 0.0, 0.0),
            Err(CastError::UnknownAction { slide: 0, action: 4 })
        ));
    }

    #[test]
    fn test_events_follow_mutations() {
        let mut store = store_with(&["a", "b"]);
        let events = record(&mut store);

        store.add_slide(2, "c", "img/c.png", 0.5, 0.5, 0.8).unwrap();
        store.invert_slides(0, 1).unwrap();
        store.edit_mouse_action(2, 0, 0.3, 0.3).unwrap();
        store.remove_slide(0).unwrap();
        store.set_image_size(1024, 768);

        assert_eq!(
            *events.borrow(),
            vec![
                Event::SlideAdded(2),
                Event::SlidesSwapped(0, 1),
                Event::ActionEdited { slide: 2, action: 0 },
                Event::SlideRemoved(0),
                Event::OutputSizeChanged {
                    width: 1024,
                    height: 768
                },
            ]
        );
    }

    #[test]
    fn test_image_queries() {
        let mut store = store_with(&["a", "b"]);
        assert_eq!(store.get_image_list(), vec!["img/a.png", "img/b.png"]);
        assert_eq!(store.get_a_background_image(), Some("img/a.png"));
        assert!(store.is_image_referenced("img/b.png"));

        store.remove_slide(1).unwrap();
        assert!(!store.is_image_referenced("img/b.png"));
        assert_eq!(store.get_image_width(), 800);
        assert_eq!(store.get_image_height(), 600);
    }

    #[test]
    fn test_create_presentation_discards_slides() {
        let mut store = store_with(&["a", "b"]);
        store.create_presentation(1280, 720);
        assert_eq!(store.get_nb_slide(), 0);
        assert_eq!(store.get_image_width(), 1280);
        assert_eq!(store.get_a_background_image(), None);
    }
}
