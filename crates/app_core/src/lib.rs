//! Gallery viewer core: media navigation and synchronization engine
//!
//! This crate contains:
//! - Media catalog of the current folder
//! - View mode state machine (grid, single item, slideshow)
//! - Touch gesture recognition
//! - Slideshow autoplay timer
//! - Change detection against the backend
//! - Commands, configuration and error types

pub mod autoplay;
pub mod catalog;
pub mod change;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod gesture;
pub mod media;
pub mod presentation;
pub mod source;
pub mod state;
pub mod view;

pub use autoplay::{Autoplay, AutoplayTick};
pub use catalog::{MediaCatalog, Removal};
pub use change::{ChangeDetector, ChangeSignature, ChangeStatus};
pub use command::{Command, KeyMap};
pub use config::{
    AppConfig, GalleryConfig, GeneralConfig, GestureConfig, LogConfig, SlideshowConfig,
    SyncConfig, ThumbnailSize,
};
pub use error::AppError;
pub use events::{EventBus, GalleryEvent, SubscriptionId, Topic};
pub use gesture::{Gesture, GestureAction, GestureRecognizer, SwipeDirection, TouchTarget};
pub use media::{MediaItem, MediaKind};
pub use presentation::{
    select_presentation, FullscreenHost, NativePresentation, OverlayPresentation, Presentation,
    PresentationKind,
};
pub use source::MediaSource;
pub use state::{
    DeleteOutcome, DeleteRequest, Gallery, PendingWork, PollRequest, ReloadReason, ReloadRequest,
};
pub use view::{shuffled, SlideshowStart, ViewMode, ViewState};
