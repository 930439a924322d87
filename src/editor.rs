// ABOUTME: Top-level editor controller
// ABOUTME: Owns settings, the open session and capture mode, and gates actions on their state

use crate::capture::{CaptureController, CaptureState, KeyOutcome};
use crate::config::{BuildConfig, SettingsStore};
use crate::drivers::{KeyboardDriver, MouseDriver, ScreenDriver};
use crate::errors::{CastError, Result};
use crate::events::{Event, NotificationBus, SubscriptionId};
use crate::generate::{self, BuildReport};
use crate::session::Session;
use log::info;
use std::path::Path;

const CAPTURE_MODE_ALERT: &str = "Please turn capture mode off before doing that.";
const NO_PROJECT_ALERT: &str = "Please open or create a project before doing that.";
const UNSAVED_ALERT: &str = "Please save your project before generating it.";

/// Front-end facing controller. Structural edits are refused while capturing
/// and everything project-related needs an open project.
pub struct Editor {
    settings: SettingsStore,
    build_config: BuildConfig,
    session: Option<Session>,
    capture: CaptureController,
    /// Holds subscribers while no project is open.
    idle_bus: NotificationBus,
}

fn require(session: &mut Option<Session>) -> Result<&mut Session> {
    session
        .as_mut()
        .ok_or_else(|| CastError::StateError(NO_PROJECT_ALERT.to_string()))
}

impl Editor {
    pub fn new(
        settings: SettingsStore,
        build_config: BuildConfig,
        screen: Box<dyn ScreenDriver>,
        mouse: Box<dyn MouseDriver>,
        keyboard: Box<dyn KeyboardDriver>,
    ) -> Self {
        let capture = CaptureController::new(
            settings.capture_key(),
            settings.settings().default_speed,
            screen,
            mouse,
            keyboard,
        );
        Self {
            settings,
            build_config,
            session: None,
            capture,
            idle_bus: NotificationBus::new(),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn capture_mut(&mut self) -> &mut CaptureController {
        &mut self.capture
    }

    /// The bus observers should subscribe to. Subscribers survive project changes.
    pub fn bus(&mut self) -> &mut NotificationBus {
        match self.session.as_mut() {
            Some(session) => session.bus(),
            None => &mut self.idle_bus,
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus().subscribe(callback)
    }

    fn require_idle(&self) -> Result<()> {
        if self.capture.is_capturing() {
            return Err(CastError::StateError(CAPTURE_MODE_ALERT.to_string()));
        }
        Ok(())
    }

    fn take_bus(&mut self) -> NotificationBus {
        match self.session.take() {
            Some(session) => session.into_bus(),
            None => std::mem::take(&mut self.idle_bus),
        }
    }

    /// Start an empty project in `dir`, sized from the default settings.
    /// Refused when `dir` already holds a project file.
    pub fn new_project(&mut self, dir: &Path) -> Result<()> {
        self.require_idle()?;
        let project_file = dir.join(&self.build_config.project_file_name);
        if project_file.exists() {
            return Err(CastError::StateError(format!(
                "A project already exists in {:?}, open it instead.",
                dir
            )));
        }
        crate::utils::ensure_directory_exists(dir)?;

        let defaults = self.settings.settings();
        let (width, height) = (defaults.default_width, defaults.default_height);
        let bus = self.take_bus();
        self.session = Some(Session::new_project(
            dir,
            width,
            height,
            self.build_config.clone(),
            bus,
        ));
        Ok(())
    }

    /// Open the project in `dir`. The current project stays open if this fails.
    pub fn open_project(&mut self, dir: &Path) -> Result<()> {
        self.require_idle()?;
        let presentation = Session::read_project(dir, &self.build_config)?;
        let bus = self.take_bus();
        self.session = Some(Session::from_loaded(
            dir,
            self.build_config.clone(),
            presentation,
            bus,
        ));
        Ok(())
    }

    /// Open the project in `dir` if there is one, otherwise create it.
    pub fn open_or_create(&mut self, dir: &Path) -> Result<()> {
        if dir.join(&self.build_config.project_file_name).exists() {
            self.open_project(dir)
        } else {
            self.new_project(dir)
        }
    }

    pub fn close_project(&mut self) -> Result<()> {
        self.require_idle()?;
        self.idle_bus = self.take_bus();
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.session
            .as_ref()
            .map(Session::has_unsaved_changes)
            .unwrap_or(false)
    }

    pub fn toggle_capture_mode(&mut self) -> Result<CaptureState> {
        let session = require(&mut self.session)?;
        self.capture.toggle(session)
    }

    /// Deliver a key event. Ignored without an open project.
    pub fn handle_key(&mut self, key_name: &str) -> Result<KeyOutcome> {
        match self.session.as_mut() {
            Some(session) => self.capture.handle_key(key_name, session),
            None => Ok(KeyOutcome::Ignored),
        }
    }

    pub fn select_slide(&mut self, index: usize) -> Result<()> {
        require(&mut self.session)?.select_slide(index)
    }

    pub fn select_action(&mut self, index: usize) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.select_action(index)
    }

    pub fn save(&mut self) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.save()
    }

    pub fn reload(&mut self) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.reload()
    }

    pub fn remove_selected_slide(&mut self) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.remove_selected_slide()
    }

    pub fn move_selected_up(&mut self) -> Result<bool> {
        self.require_idle()?;
        require(&mut self.session)?.move_selected_up()
    }

    pub fn move_selected_down(&mut self) -> Result<bool> {
        self.require_idle()?;
        require(&mut self.session)?.move_selected_down()
    }

    pub fn drag_mouse_action(&mut self, action: usize, x: f64, y: f64) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.drag_mouse_action(action, x, y)
    }

    pub fn commit_mouse_action(&mut self, action: usize, x: f64, y: f64) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.commit_mouse_action(action, x, y)
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.set_output_size(width, height)
    }

    pub fn clean(&mut self) -> Result<()> {
        self.require_idle()?;
        require(&mut self.session)?.clean_build()
    }

    /// Clean the build directory and regenerate it from the saved project.
    pub fn generate(&mut self) -> Result<BuildReport> {
        self.require_idle()?;
        let session = require(&mut self.session)?;
        if session.has_unsaved_changes() {
            return Err(CastError::StateError(UNSAVED_ALERT.to_string()));
        }

        session.clean_build()?;
        let report = generate::generate_build(
            session.presentation(),
            &session.image_dir(),
            &session.build_dir(),
            session.config(),
        )?;
        info!("Project successfully built in {:?}", session.build_dir());
        Ok(report)
    }

    pub fn set_capture_key(&mut self, key: &str) -> Result<()> {
        self.require_idle()?;
        self.settings.set_capture_key(key)?;
        self.capture.set_capture_key(key);
        Ok(())
    }

    pub fn set_default_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.require_idle()?;
        self.settings.set_default_size(width, height)
    }

    pub fn set_default_speed(&mut self, speed: f64) -> Result<()> {
        self.require_idle()?;
        self.settings.set_default_speed(speed)?;
        self.capture.set_default_speed(speed);
        Ok(())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("session", &self.session)
            .field("capture", &self.capture)
            .finish()
    }
}
