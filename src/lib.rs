// ABOUTME: Library module for the clickcast editor.
// ABOUTME: Contains the presentation model, capture mode, persistence and the build pipeline.

pub mod capture;
pub mod codec;
pub mod config;
pub mod drivers;
pub mod editor;
pub mod errors;
pub mod events;
pub mod generate;
pub mod html;
pub mod model;
pub mod preview;
pub mod resources;
pub mod session;
pub mod store;
pub mod utils;

// Reexport common types and functions
pub use capture::{CaptureController, CaptureState, KeyOutcome};
pub use config::{BuildConfig, Settings, SettingsStore};
pub use editor::Editor;
pub use errors::{CastError, Result};
pub use events::{Event, NotificationBus, SubscriptionId};
pub use generate::{generate_build, resized_dimensions, BuildReport};
pub use model::{Action, ActionTarget, Presentation, Slide};
pub use session::Session;
pub use store::SlideStore;
