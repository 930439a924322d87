// ABOUTME: Capture mode state machine
// ABOUTME: Turns capture-key presses into new slides built from live screenshots

use crate::drivers::{KeyboardDriver, MouseDriver, ScreenDriver};
use crate::errors::Result;
use crate::events::Event;
use crate::session::Session;
use crate::utils::{self, IdGenerator};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

/// What a key event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A slide was created at this index.
    Captured { index: usize, id: String },
    /// Capture mode was left.
    Stopped,
    Ignored,
}

/// Capture mode. While capturing, the capture key appends a slide after the
/// selected one and `escape` leaves the mode.
///
/// Whether capture may start at all (an open project, no other structural edit
/// in flight) is decided by the caller.
pub struct CaptureController {
    state: CaptureState,
    capture_key: String,
    default_speed: f64,
    ids: IdGenerator,
    screen: Box<dyn ScreenDriver>,
    mouse: Box<dyn MouseDriver>,
    keyboard: Box<dyn KeyboardDriver>,
}

impl CaptureController {
    pub fn new(
        capture_key: &str,
        default_speed: f64,
        screen: Box<dyn ScreenDriver>,
        mouse: Box<dyn MouseDriver>,
        keyboard: Box<dyn KeyboardDriver>,
    ) -> Self {
        Self {
            state: CaptureState::Idle,
            capture_key: capture_key.to_lowercase(),
            default_speed,
            ids: IdGenerator::new(),
            screen,
            mouse,
            keyboard,
        }
    }

    /// Replace the identifier generator, e.g. with a seeded one.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    pub fn capture_key(&self) -> &str {
        &self.capture_key
    }

    pub fn set_capture_key(&mut self, key: &str) {
        self.capture_key = key.to_lowercase();
    }

    pub fn set_default_speed(&mut self, speed: f64) {
        self.default_speed = speed;
    }

    /// Enter capture mode when idle, leave it when capturing.
    pub fn toggle(&mut self, session: &mut Session) -> Result<CaptureState> {
        match self.state {
            CaptureState::Idle => {
                self.keyboard.add_key_listener()?;
                self.state = CaptureState::Capturing;
                info!(
                    "Capture mode ON ({} to take a screenshot / ESC to exit capture mode)",
                    self.capture_key.to_uppercase()
                );
            }
            CaptureState::Capturing => {
                self.keyboard.remove_key_listener()?;
                self.state = CaptureState::Idle;
                info!("Capture mode OFF");
            }
        }
        session
            .store_mut()
            .notify(Event::CaptureModeChanged(self.is_capturing()));
        Ok(self.state)
    }

    /// Handle a key event delivered by the key listener.
    pub fn handle_key(&mut self, key_name: &str, session: &mut Session) -> Result<KeyOutcome> {
        if self.state != CaptureState::Capturing {
            return Ok(KeyOutcome::Ignored);
        }

        let key = key_name.to_lowercase();
        if key == self.capture_key {
            self.capture(session)
        } else if key == "escape" {
            self.toggle(session)?;
            Ok(KeyOutcome::Stopped)
        } else {
            debug!("Ignoring key {} in capture mode", key_name);
            Ok(KeyOutcome::Ignored)
        }
    }

    fn capture(&mut self, session: &mut Session) -> Result<KeyOutcome> {
        let image_dir = session.image_dir();
        utils::ensure_directory_exists(&image_dir)?;

        let id = self.ids.next_id();
        let file_name = self.screen.take_screen(&image_dir, &id)?;
        let image_path = format!("{}/{}", session.config().image_dir_name, file_name);
        let (x, y) = self.mouse.pointer_position();

        let index = session.selected_slide().map_or(0, |s| s + 1);
        let added = session
            .store_mut()
            .add_slide(index, &id, &image_path, x, y, self.default_speed);
        if let Err(e) = added {
            let image = image_dir.join(&file_name);
            if let Err(cleanup) = utils::remove_path(&image) {
                warn!("Could not remove screenshot {:?}: {}", image, cleanup);
            }
            return Err(e);
        }
        session.set_selected_slide(Some(index));
        session.mark_dirty();

        info!("Captured slide {} at position {}", id, index);
        Ok(KeyOutcome::Captured { index, id })
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.state)
            .field("capture_key", &self.capture_key)
            .field("default_speed", &self.default_speed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::errors::CastError;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FakeScreen {
        shots: Rc<RefCell<Vec<String>>>,
    }

    impl ScreenDriver for FakeScreen {
        fn take_screen(&mut self, image_dir: &Path, id: &str) -> Result<String> {
            let name = format!("{}.png", id);
            fs::write(image_dir.join(&name), b"png").map_err(|e| CastError::io(image_dir, e))?;
            self.shots.borrow_mut().push(id.to_string());
            Ok(name)
        }
    }

    struct FakeMouse;

    impl MouseDriver for FakeMouse {
        fn pointer_position(&self) -> (f64, f64) {
            (0.25, 0.75)
        }
    }

    struct FakeKeyboard {
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl KeyboardDriver for FakeKeyboard {
        fn add_key_listener(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("add");
            Ok(())
        }

        fn remove_key_listener(&mut self) -> Result<()> {
            self.calls.borrow_mut().push("remove");
            Ok(())
        }
    }

    struct Harness {
        _temp: TempDir,
        session: Session,
        controller: CaptureController,
        shots: Rc<RefCell<Vec<String>>>,
        keyboard: Rc<RefCell<Vec<&'static str>>>,
        events: Rc<RefCell<Vec<Event>>>,
    }

    fn harness(existing: &[&str], selected: Option<usize>) -> Harness {
        let temp = TempDir::new().unwrap();
        let mut session = Session::create(temp.path(), 800, 600, BuildConfig::default()).unwrap();
        for (i, id) in existing.iter().enumerate() {
            session
                .store_mut()
                .add_slide(i, id, &format!("img/{}.png", id), 0.5, 0.5, 0.8)
                .unwrap();
        }
        if let Some(s) = selected {
            session.select_slide(s).unwrap();
        }

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        session.bus().subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let shots = Rc::new(RefCell::new(Vec::new()));
        let keyboard = Rc::new(RefCell::new(Vec::new()));
        let controller = CaptureController::new(
            "F7",
            0.8,
            Box::new(FakeScreen {
                shots: shots.clone(),
            }),
            Box::new(FakeMouse),
            Box::new(FakeKeyboard {
                calls: keyboard.clone(),
            }),
        );

        Harness {
            _temp: temp,
            session,
            controller,
            shots,
            keyboard,
            events,
        }
    }

    #[test]
    fn test_keys_are_ignored_when_idle() {
        let mut h = harness(&[], None);
        let outcome = h.controller.handle_key("f7", &mut h.session).unwrap();
        assert_eq!(outcome, KeyOutcome::Ignored);
        assert_eq!(h.session.store().get_nb_slide(), 0);
        assert!(h.events.borrow().is_empty());
    }

    #[test]
    fn test_toggle_installs_and_removes_listener() {
        let mut h = harness(&[], None);
        assert_eq!(
            h.controller.toggle(&mut h.session).unwrap(),
            CaptureState::Capturing
        );
        assert_eq!(h.controller.toggle(&mut h.session).unwrap(), CaptureState::Idle);
        assert_eq!(*h.keyboard.borrow(), vec!["add", "remove"]);
        assert_eq!(
            *h.events.borrow(),
            vec![
                Event::CaptureModeChanged(true),
                Event::CaptureModeChanged(false)
            ]
        );
    }

    #[test]
    fn test_capture_then_escape_inserts_after_selection() {
        let mut h = harness(&["a", "b", "c"], Some(1));
        h.events.borrow_mut().clear();

        h.controller.toggle(&mut h.session).unwrap();
        let outcome = h.controller.handle_key("F7", &mut h.session).unwrap();
        let stopped = h.controller.handle_key("Escape", &mut h.session).unwrap();

        let id = h.shots.borrow()[0].clone();
        assert_eq!(
            outcome,
            KeyOutcome::Captured {
                index: 2,
                id: id.clone()
            }
        );
        assert_eq!(stopped, KeyOutcome::Stopped);
        assert_eq!(h.controller.state(), CaptureState::Idle);
        assert_eq!(h.session.selected_slide(), Some(2));
        assert_eq!(h.session.store().get_nb_slide(), 4);
        assert!(h.session.has_unsaved_changes());

        let slide = h.session.store().get_slide(2).unwrap();
        assert_eq!(slide.id, id);
        assert_eq!(slide.image_path, format!("img/{}.png", id));
        assert_eq!(slide.actions[0].final_abs, 0.25);
        assert_eq!(slide.actions[0].final_ord, 0.75);
        assert_eq!(slide.actions[0].speed, 0.8);
        assert!(utils::is_generated_id(&slide.id));

        assert_eq!(
            *h.events.borrow(),
            vec![
                Event::CaptureModeChanged(true),
                Event::SlideAdded(2),
                Event::SelectionChanged(Some(2)),
                Event::CaptureModeChanged(false),
            ]
        );
    }

    #[test]
    fn test_first_capture_in_empty_project_goes_to_front() {
        let mut h = harness(&[], None);
        h.controller.toggle(&mut h.session).unwrap();
        h.controller.handle_key("f7", &mut h.session).unwrap();
        h.controller.handle_key("f7", &mut h.session).unwrap();

        assert_eq!(h.session.store().get_nb_slide(), 2);
        assert_eq!(h.session.selected_slide(), Some(1));
        assert!(h.session.image_dir().is_dir());
        let shots = h.shots.borrow();
        assert_eq!(h.session.store().get_slide(0).unwrap().id, shots[0]);
        assert_eq!(h.session.store().get_slide(1).unwrap().id, shots[1]);
    }

    #[test]
    fn test_other_keys_change_nothing() {
        let mut h = harness(&["a"], Some(0));
        h.controller.toggle(&mut h.session).unwrap();
        h.events.borrow_mut().clear();

        for key in ["a", "f8", "Enter", "space"] {
            let outcome = h.controller.handle_key(key, &mut h.session).unwrap();
            assert_eq!(outcome, KeyOutcome::Ignored);
        }

        assert!(h.controller.is_capturing());
        assert_eq!(h.session.store().get_nb_slide(), 1);
        assert!(h.events.borrow().is_empty());
        assert!(h.shots.borrow().is_empty());
    }

    #[test]
    fn test_failed_insert_removes_screenshot() {
        let taken = IdGenerator::with_seed(7).next_id();
        let mut h = harness(&[taken.as_str()], Some(0));
        h.controller = h.controller.with_id_generator(IdGenerator::with_seed(7));
        h.controller.toggle(&mut h.session).unwrap();
        h.events.borrow_mut().clear();

        let err = h.controller.handle_key("f7", &mut h.session).unwrap_err();

        assert!(matches!(err, CastError::DuplicateSlideId(_)));
        assert_eq!(*h.shots.borrow(), vec![taken.clone()]);
        assert!(!h.session.image_dir().join(format!("{}.png", taken)).exists());
        assert_eq!(h.session.store().get_nb_slide(), 1);
        assert!(h.events.borrow().is_empty());
        assert!(h.controller.is_capturing());
    }

    #[test]
    fn test_capture_key_can_be_changed() {
        let mut h = harness(&[], None);
        h.controller.set_capture_key("F9");
        h.controller.toggle(&mut h.session).unwrap();

        assert_eq!(
            h.controller.handle_key("f7", &mut h.session).unwrap(),
            KeyOutcome::Ignored
        );
        assert!(matches!(
            h.controller.handle_key("f9", &mut h.session).unwrap(),
            KeyOutcome::Captured { index: 0, .. }
        ));
    }
}
