// ABOUTME: Editing session for one open project
// ABOUTME: Holds the project directory, slide store, selection and unsaved-changes flag

use crate::codec;
use crate::config::BuildConfig;
use crate::errors::{CastError, Result};
use crate::events::{Event, NotificationBus};
use crate::generate::resized_dimensions;
use crate::model::Presentation;
use crate::store::SlideStore;
use crate::utils;
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// State of one open project. Created when a project is opened or created and
/// dropped when another one replaces it.
#[derive(Debug)]
pub struct Session {
    project_dir: PathBuf,
    config: BuildConfig,
    store: SlideStore,
    selected_slide: Option<usize>,
    selected_action: Option<usize>,
    dirty: bool,
}

impl Session {
    /// Create a new empty project in `dir`, creating the directory if needed.
    /// Refused when `dir` already holds a project file.
    pub fn create(dir: &Path, width: u32, height: u32, config: BuildConfig) -> Result<Self> {
        if dir.join(&config.project_file_name).exists() {
            return Err(CastError::StateError(format!(
                "A project already exists in {:?}, open it instead.",
                dir
            )));
        }
        utils::ensure_directory_exists(dir)?;
        Ok(Self::new_project(dir, width, height, config, NotificationBus::new()))
    }

    /// Start an empty project in an existing directory, announcing on `bus`.
    pub fn new_project(
        dir: &Path,
        width: u32,
        height: u32,
        config: BuildConfig,
        bus: NotificationBus,
    ) -> Self {
        let mut session = Self::with_store(dir, config, SlideStore::new(), bus);
        session.store.create_presentation(width, height);
        info!("Project created in {:?}", dir);
        session
    }

    /// Open the project stored in `dir`.
    pub fn open(dir: &Path, config: BuildConfig) -> Result<Self> {
        let presentation = Self::read_project(dir, &config)?;
        Ok(Self::from_loaded(dir, config, presentation, NotificationBus::new()))
    }

    /// Read the project file of `dir` without touching any session.
    pub fn read_project(dir: &Path, config: &BuildConfig) -> Result<Presentation> {
        if dir.exists() && !dir.is_dir() {
            return Err(CastError::ValidationError {
                path: dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        codec::load_file(&dir.join(&config.project_file_name))
    }

    /// Wrap an already loaded presentation. The last slide becomes selected.
    pub fn from_loaded(
        dir: &Path,
        config: BuildConfig,
        presentation: Presentation,
        bus: NotificationBus,
    ) -> Self {
        let mut session = Self::with_store(dir, config, SlideStore::new(), bus);
        session.store.replace_presentation(presentation);
        let last = session.store.get_nb_slide().checked_sub(1);
        session.set_selected_slide(last);
        info!("Project loaded from {:?}", dir);
        session
    }

    fn with_store(dir: &Path, config: BuildConfig, mut store: SlideStore, bus: NotificationBus) -> Self {
        *store.bus() = bus;
        Self {
            project_dir: dir.to_path_buf(),
            config,
            store,
            selected_slide: None,
            selected_action: None,
            dirty: false,
        }
    }

    /// Hand the bus and its subscribers over to the next session.
    pub fn into_bus(mut self) -> NotificationBus {
        std::mem::take(self.store.bus())
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn project_file(&self) -> PathBuf {
        self.project_dir.join(&self.config.project_file_name)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.project_dir.join(&self.config.image_dir_name)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.project_dir.join(&self.config.build_dir_name)
    }

    pub fn store(&self) -> &SlideStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SlideStore {
        &mut self.store
    }

    pub fn bus(&mut self) -> &mut NotificationBus {
        self.store.bus()
    }

    pub fn presentation(&self) -> &Presentation {
        self.store.presentation()
    }

    pub fn selected_slide(&self) -> Option<usize> {
        self.selected_slide
    }

    pub fn selected_action(&self) -> Option<usize> {
        self.selected_action
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Set the slide selection and always announce it.
    pub(crate) fn set_selected_slide(&mut self, slide: Option<usize>) {
        self.selected_slide = slide;
        self.selected_action = None;
        self.store.notify(Event::SelectionChanged(slide));
    }

    /// Select a slide. Announced only when the selection actually changes.
    pub fn select_slide(&mut self, index: usize) -> Result<()> {
        self.store.get_slide(index)?;
        if self.selected_slide != Some(index) {
            self.set_selected_slide(Some(index));
        }
        Ok(())
    }

    /// Select an action on the selected slide.
    pub fn select_action(&mut self, action: usize) -> Result<()> {
        let slide = self.require_selection()?;
        if action >= self.store.get_action_list(slide)?.len() {
            return Err(CastError::UnknownAction { slide, action });
        }
        if self.selected_action != Some(action) {
            self.selected_action = Some(action);
            self.store.notify(Event::ActionSelectionChanged(Some(action)));
        }
        Ok(())
    }

    /// Remove the selected slide and delete its image when no other slide uses it.
    ///
    /// The selection is settled before the file is touched, so a failed
    /// deletion still leaves a consistent session. Image paths leaving the
    /// project directory are never deleted.
    pub fn remove_selected_slide(&mut self) -> Result<()> {
        let selected = self.require_selection()?;
        let removed = self.store.remove_slide(selected)?;
        self.dirty = true;
        info!("Removed slide {} ({})", removed.id, removed.image_path);

        let remaining = self.store.get_nb_slide();
        let next = if selected >= remaining {
            remaining.checked_sub(1)
        } else {
            Some(selected)
        };
        self.set_selected_slide(next);

        if self.store.is_image_referenced(&removed.image_path) {
            return Ok(());
        }
        if !utils::is_contained_path(&removed.image_path) {
            warn!(
                "Not deleting {:?}: it is outside the project",
                removed.image_path
            );
            return Ok(());
        }
        let image = self.project_dir.join(&removed.image_path);
        info!("Deleting orphaned image {:?}", image);
        utils::remove_path(&image)
    }

    /// Swap the selected slide with the previous one. Returns false at the top.
    pub fn move_selected_up(&mut self) -> Result<bool> {
        let selected = self.require_selection()?;
        if selected == 0 {
            return Ok(false);
        }
        self.store.invert_slides(selected, selected - 1)?;
        self.dirty = true;
        self.set_selected_slide(Some(selected - 1));
        Ok(true)
    }

    /// Swap the selected slide with the next one. Returns false at the bottom.
    pub fn move_selected_down(&mut self) -> Result<bool> {
        let selected = self.require_selection()?;
        if selected + 1 >= self.store.get_nb_slide() {
            return Ok(false);
        }
        self.store.invert_slides(selected, selected + 1)?;
        self.dirty = true;
        self.set_selected_slide(Some(selected + 1));
        Ok(true)
    }

    /// Intermediate position while the cursor of `action` is being dragged.
    pub fn drag_mouse_action(&mut self, action: usize, x: f64, y: f64) -> Result<()> {
        let slide = self.require_selection()?;
        self.store.edit_mouse_action(slide, action, x, y)?;
        self.dirty = true;
        Ok(())
    }

    /// Final position at the end of a drag. Overwrites any intermediate one.
    pub fn commit_mouse_action(&mut self, action: usize, x: f64, y: f64) -> Result<()> {
        let slide = self.require_selection()?;
        self.store.edit_mouse_action(slide, action, x, y)?;
        self.dirty = true;
        info!(
            "[slide {}; action {}] mouse cursor moved to {}, {}",
            slide, action, x, y
        );
        Ok(())
    }

    /// Set the output canvas size. A zero dimension is derived from the aspect
    /// ratio of the captured screenshots when there are any.
    pub fn set_output_size(&mut self, width: u32, height: u32) -> Result<()> {
        let (mut width, mut height) = (width, height);
        if width == 0 || height == 0 {
            let background = self
                .store
                .get_a_background_image()
                .filter(|path| utils::is_contained_path(path));
            if let Some(background) = background {
                let path = self.project_dir.join(background);
                let source = image::image_dimensions(&path)
                    .map_err(|source| CastError::ImageError { path, source })?;
                (width, height) = resized_dimensions(source, (width, height));
            }
        }
        self.store.set_image_size(width, height);
        self.dirty = true;
        Ok(())
    }

    pub fn save(&mut self) -> Result<()> {
        codec::save_file(self.presentation(), &self.project_file())?;
        self.dirty = false;
        info!("Saved in {:?} successfully", self.project_dir);
        Ok(())
    }

    /// Reload the project file, dropping unsaved changes. On failure the
    /// session is left as it was.
    pub fn reload(&mut self) -> Result<()> {
        let presentation = Self::read_project(&self.project_dir, &self.config)?;
        self.store.replace_presentation(presentation);
        let last = self.store.get_nb_slide().checked_sub(1);
        self.set_selected_slide(last);
        self.dirty = false;
        Ok(())
    }

    /// Delete the build directory.
    pub fn clean_build(&self) -> Result<()> {
        let build_dir = self.build_dir();
        info!("Cleaning build directory {:?}", build_dir);
        utils::remove_path(&build_dir)
    }

    /// Delete files in the image directory that no slide references.
    pub fn prune_orphan_images(&self) -> Result<Vec<PathBuf>> {
        let image_dir = self.image_dir();
        if !image_dir.is_dir() {
            return Ok(Vec::new());
        }

        let referenced: HashSet<&str> = self
            .presentation()
            .slides
            .iter()
            .map(|s| s.image_file_name())
            .collect();

        let pattern = format!("{}/*", glob::Pattern::escape(&image_dir.to_string_lossy()));
        let entries = glob::glob(&pattern).map_err(|e| CastError::ValidationError {
            path: image_dir.clone(),
            message: format!("invalid glob pattern: {}", e),
        })?;

        let mut removed = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if !referenced.contains(name.as_str()) {
                info!("Removing orphaned image {:?}", path);
                utils::remove_path(&path)?;
                removed.push(path);
            }
        }
        Ok(removed)
    }

    fn require_selection(&self) -> Result<usize> {
        self.selected_slide
            .ok_or_else(|| CastError::StateError("No slide is selected.".to_string()))
    }
}
