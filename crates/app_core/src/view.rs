//! View mode state machine: grid, single item, slideshow

use crate::autoplay::{Autoplay, AutoplayTick};
use crate::catalog::MediaCatalog;
use crate::config::SlideshowConfig;
use crate::media::{MediaItem, MediaKind};
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    SingleView,
    Slideshow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideshowStart {
    Started,
    NoImages,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Backward,
}

/// Which item is on screen and how it got there.
///
/// In single view `current_index` points into the full catalog. In a
/// slideshow it points into `playback_order`, an image-only copy taken at
/// start.
pub struct ViewState {
    mode: ViewMode,
    current_index: usize,
    playback_order: Vec<MediaItem>,
    interval_secs: u32,
    slideshow: SlideshowConfig,
    autoplay: Autoplay,
}

impl ViewState {
    pub fn new(slideshow: SlideshowConfig, ticks: UnboundedSender<AutoplayTick>) -> Self {
        let interval_secs = slideshow.clamp_interval(slideshow.interval_secs);
        Self {
            mode: ViewMode::Grid,
            current_index: 0,
            playback_order: Vec::new(),
            interval_secs,
            slideshow,
            autoplay: Autoplay::new(ticks),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn playback_order(&self) -> &[MediaItem] {
        &self.playback_order
    }

    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    pub fn shuffle(&self) -> bool {
        self.slideshow.shuffle
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.slideshow.shuffle = shuffle;
    }

    /// Slideshow active with its timer stopped
    pub fn is_paused(&self) -> bool {
        self.mode == ViewMode::Slideshow && !self.autoplay.is_running()
    }

    /// Item on screen, if any
    pub fn current_item<'a>(&'a self, catalog: &'a MediaCatalog) -> Option<&'a MediaItem> {
        match self.mode {
            ViewMode::Grid => None,
            ViewMode::SingleView => catalog.get(self.current_index),
            ViewMode::Slideshow => self.playback_order.get(self.current_index),
        }
    }

    /// Number of positions navigation cycles through in the current mode
    pub fn total(&self, catalog: &MediaCatalog) -> usize {
        match self.mode {
            ViewMode::Grid => 0,
            ViewMode::SingleView => catalog.len(),
            ViewMode::Slideshow => self.playback_order.len(),
        }
    }

    // ===== Single view =====

    /// Open the viewer on `(kind, path)`, resolved against the full catalog
    pub fn open_item(&mut self, catalog: &MediaCatalog, kind: MediaKind, path: &str) -> Option<usize> {
        if self.mode == ViewMode::Slideshow {
            tracing::debug!("Open ignored while slideshow is running");
            return None;
        }
        if catalog.is_empty() {
            return None;
        }

        let index = catalog.index_of(kind, path);
        self.current_index = index;
        self.mode = ViewMode::SingleView;
        Some(index)
    }

    pub fn next(&mut self, catalog: &MediaCatalog) -> Option<usize> {
        self.step(catalog, Step::Forward)
    }

    pub fn previous(&mut self, catalog: &MediaCatalog) -> Option<usize> {
        self.step(catalog, Step::Backward)
    }

    /// Circular scan skipping folders. At most `len` probes, so a catalog
    /// without media is a no-op.
    fn step(&mut self, catalog: &MediaCatalog, step: Step) -> Option<usize> {
        if self.mode != ViewMode::SingleView || catalog.is_empty() {
            return None;
        }

        let len = catalog.len();
        let mut index = self.current_index.min(len - 1);
        for _ in 0..len {
            index = match step {
                Step::Forward => (index + 1) % len,
                Step::Backward => (index + len - 1) % len,
            };
            if catalog.items()[index].is_navigable() {
                self.current_index = index;
                return Some(index);
            }
        }
        None
    }

    /// Show a specific catalog index in single view
    pub(crate) fn show(&mut self, index: usize) {
        if self.mode == ViewMode::SingleView {
            self.current_index = index;
        }
    }

    /// Back to the grid. No-op while a slideshow owns the surface.
    pub fn close(&mut self) -> bool {
        match self.mode {
            ViewMode::SingleView => {
                self.mode = ViewMode::Grid;
                self.current_index = 0;
                true
            }
            ViewMode::Slideshow => {
                tracing::debug!("Close ignored while slideshow is running");
                false
            }
            ViewMode::Grid => false,
        }
    }

    // ===== Slideshow =====

    pub fn start_slideshow(&mut self, catalog: &MediaCatalog) -> SlideshowStart {
        self.start_slideshow_with(catalog, &mut rand::rng())
    }

    pub fn start_slideshow_with<R: Rng + ?Sized>(&mut self, catalog: &MediaCatalog, rng: &mut R) -> SlideshowStart {
        if self.mode == ViewMode::Slideshow {
            return SlideshowStart::AlreadyRunning;
        }

        let images = catalog.images_only();
        if images.is_empty() {
            return SlideshowStart::NoImages;
        }

        self.playback_order = if self.slideshow.shuffle {
            shuffled(&images, rng)
        } else {
            images
        };
        self.current_index = 0;
        self.mode = ViewMode::Slideshow;
        self.autoplay.start(self.interval());

        tracing::info!(
            "Slideshow started: {} images, {}s, shuffle={}",
            self.playback_order.len(),
            self.interval_secs,
            self.slideshow.shuffle
        );
        SlideshowStart::Started
    }

    pub fn next_slide(&mut self) -> Option<usize> {
        if self.mode != ViewMode::Slideshow || self.playback_order.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.playback_order.len();
        Some(self.current_index)
    }

    pub fn previous_slide(&mut self) -> Option<usize> {
        if self.mode != ViewMode::Slideshow || self.playback_order.is_empty() {
            return None;
        }
        let len = self.playback_order.len();
        self.current_index = (self.current_index + len - 1) % len;
        Some(self.current_index)
    }

    pub fn stop_slideshow(&mut self) -> bool {
        if self.mode != ViewMode::Slideshow {
            return false;
        }
        self.autoplay.cancel();
        self.playback_order.clear();
        self.current_index = 0;
        self.mode = ViewMode::Grid;
        tracing::info!("Slideshow stopped");
        true
    }

    /// Pause or resume autoplay. Returns the new paused state.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        if self.mode != ViewMode::Slideshow {
            return None;
        }
        if self.autoplay.is_running() {
            self.autoplay.cancel();
            Some(true)
        } else {
            self.autoplay.start(self.interval());
            Some(false)
        }
    }

    /// Update the interval, clamped to the configured range. A running
    /// timer restarts at the same position with the new period.
    pub fn set_interval(&mut self, secs: u32) -> u32 {
        self.interval_secs = self.slideshow.clamp_interval(secs);
        if self.mode == ViewMode::Slideshow && self.autoplay.is_running() {
            self.autoplay.start(self.interval());
        }
        self.interval_secs
    }

    /// Handle a timer tick; stale ticks are ignored
    pub fn on_tick(&mut self, tick: AutoplayTick) -> Option<usize> {
        if self.mode != ViewMode::Slideshow || !self.autoplay.accepts(tick) {
            tracing::debug!("Stale autoplay tick {:?}", tick);
            return None;
        }
        self.next_slide()
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }

    // ===== Catalog replacement =====

    /// Re-resolve the view after the catalog was replaced. `shown` is the
    /// item displayed before the replacement. Returns true if the view had
    /// to fall back to the grid.
    pub fn reconcile(&mut self, catalog: &MediaCatalog, shown: Option<&MediaItem>) -> bool {
        match self.mode {
            ViewMode::Grid => false,
            ViewMode::SingleView => {
                let found = shown.and_then(|item| catalog.find(item.kind, &item.path));
                match found {
                    Some(index) => {
                        self.current_index = index;
                        false
                    }
                    None => {
                        tracing::debug!("Displayed item gone after reload, closing viewer");
                        self.close()
                    }
                }
            }
            ViewMode::Slideshow => {
                self.playback_order
                    .retain(|item| catalog.find(item.kind, &item.path).is_some());
                if self.playback_order.is_empty() {
                    return self.stop_slideshow();
                }

                let kept = shown.and_then(|item| {
                    self.playback_order.iter().position(|p| p.same_identity(item))
                });
                self.current_index = kept.unwrap_or(self.current_index.min(self.playback_order.len() - 1));
                false
            }
        }
    }

    /// Leave whatever mode is active
    pub fn reset(&mut self) -> bool {
        match self.mode {
            ViewMode::Grid => false,
            ViewMode::SingleView => self.close(),
            ViewMode::Slideshow => self.stop_slideshow(),
        }
    }
}

/// Fisher-Yates shuffle of a copy of `items`
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}
