//! Gallery context: catalog, view state and collaborators in one place

use crate::autoplay::AutoplayTick;
use crate::catalog::{MediaCatalog, Removal};
use crate::change::{ChangeDetector, ChangeSignature, ChangeStatus};
use crate::command::{Command, KeyMap};
use crate::config::{AppConfig, ThumbnailSize};
use crate::error::AppError;
use crate::events::{EventBus, GalleryEvent};
use crate::gesture::{GestureAction, GestureRecognizer, TouchTarget};
use crate::media::{MediaItem, MediaKind};
use crate::presentation::Presentation;
use crate::source::MediaSource;
use crate::view::{SlideshowStart, ViewMode, ViewState};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Why a reload was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// Folder navigation, size change, manual refresh
    User,
    /// Follow-up to a successful deletion
    AfterDelete,
    /// The change detector saw the backend move
    Background,
}

/// A folder listing the driver should fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    pub generation: u64,
    pub folder: String,
    pub size_hint: u32,
    pub reason: ReloadReason,
}

/// A deletion the driver should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub item: MediaItem,
}

/// A change-signature check the driver should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub sequence: u64,
    pub folder: String,
}

/// Network work for the driver to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWork {
    Reload(ReloadRequest),
    Delete(DeleteRequest),
    Poll(PollRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The viewer now shows this catalog index
    Showing(usize),
    /// Nothing left to show, back on the grid
    ReturnedToGrid,
    /// Deleted, but the viewer was no longer on it
    Detached,
    Failed,
}

/// The viewer engine.
///
/// Network calls are split in two halves: `request_*` records what is in
/// flight and hands back a request, `complete_*` applies the result. The
/// driver may run calls concurrently; late or superseded results are
/// discarded at completion time.
pub struct Gallery {
    config: AppConfig,
    folder: String,
    thumbnail_size: ThumbnailSize,
    catalog: MediaCatalog,
    view: ViewState,
    detector: ChangeDetector,
    gestures: GestureRecognizer,
    keys: KeyMap,
    presentation: Box<dyn Presentation>,
    source: Arc<dyn MediaSource>,
    events: EventBus,

    reload_generation: u64,
    reload_in_flight: Option<u64>,
    delete_in_flight: Option<MediaItem>,

    poll_sequence: u64,
    poll_applied: u64,
    polls_in_flight: usize,
    seed_wanted: bool,
}

impl Gallery {
    /// Build the engine. The receiver yields autoplay ticks to feed back via [`Gallery::on_tick`].
    pub fn new(
        config: AppConfig,
        source: Arc<dyn MediaSource>,
        presentation: Box<dyn Presentation>,
    ) -> (Self, UnboundedReceiver<AutoplayTick>) {
        let (tick_tx, tick_rx) = unbounded_channel();
        let folder = config.general.start_folder.clone();

        let gallery = Self {
            thumbnail_size: config.gallery.thumbnail_size,
            catalog: MediaCatalog::new(),
            view: ViewState::new(config.slideshow.clone(), tick_tx),
            detector: ChangeDetector::new(&folder),
            gestures: GestureRecognizer::new(config.gestures.clone()),
            keys: KeyMap::new(&config.keybindings),
            presentation,
            source,
            events: EventBus::new(),
            reload_generation: 0,
            reload_in_flight: None,
            delete_in_flight: None,
            poll_sequence: 0,
            poll_applied: 0,
            polls_in_flight: 0,
            seed_wanted: false,
            folder,
            config,
        };
        (gallery, tick_rx)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn presentation(&self) -> &dyn Presentation {
        self.presentation.as_ref()
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn source(&self) -> Arc<dyn MediaSource> {
        Arc::clone(&self.source)
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.view.current_item(&self.catalog)
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_in_flight.is_some()
    }

    pub fn is_deleting(&self) -> bool {
        self.delete_in_flight.is_some()
    }

    pub fn is_polling(&self) -> bool {
        self.polls_in_flight > 0
    }

    /// Current settings, including runtime changes to size, interval and shuffle
    pub fn settings(&self) -> AppConfig {
        let mut config = self.config.clone();
        config.general.start_folder = self.folder.clone();
        config.gallery.thumbnail_size = self.thumbnail_size;
        config.slideshow.interval_secs = self.view.interval_secs();
        config.slideshow.shuffle = self.view.shuffle();
        config
    }

    // ===== Folder loading =====

    /// Switch to another folder. Any open view is closed.
    pub fn navigate_to(&mut self, folder: &str) -> Option<ReloadRequest> {
        tracing::info!("Navigating to folder {:?}", folder);
        self.leave_view();
        self.folder = folder.to_string();
        self.detector.reset(folder);
        self.seed_wanted = false;
        self.request_reload(ReloadReason::User)
    }

    pub fn set_thumbnail_size(&mut self, size: ThumbnailSize) -> Option<ReloadRequest> {
        if size == self.thumbnail_size {
            return None;
        }
        tracing::info!("Thumbnail size {} ({}px)", size.name(), size.pixels());
        self.thumbnail_size = size;
        self.request_reload(ReloadReason::User)
    }

    /// Start a reload. Background reloads are dropped while another is in
    /// flight; any other request supersedes the one in flight.
    pub fn request_reload(&mut self, reason: ReloadReason) -> Option<ReloadRequest> {
        if reason == ReloadReason::Background {
            if let Some(generation) = self.reload_in_flight {
                tracing::debug!("Background reload coalesced into in-flight reload #{}", generation);
                return None;
            }
        }

        self.reload_generation += 1;
        self.reload_in_flight = Some(self.reload_generation);

        Some(ReloadRequest {
            generation: self.reload_generation,
            folder: self.folder.clone(),
            size_hint: self.thumbnail_size.pixels(),
            reason,
        })
    }

    /// Apply a listing. Returns false if the result was superseded.
    pub fn complete_reload(&mut self, generation: u64, result: Result<Vec<MediaItem>, AppError>) -> bool {
        if self.reload_in_flight != Some(generation) {
            tracing::debug!("Discarding superseded reload #{}", generation);
            return false;
        }
        self.reload_in_flight = None;

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Failed to load folder {:?}: {}", self.folder, e);
                self.publish_error(&e);
                return true;
            }
        };

        let shown = self.current_item().cloned();
        self.catalog.load(items);
        let closed = self.view.reconcile(&self.catalog, shown.as_ref());

        tracing::info!(
            "Loaded {:?}: {} items, {} media",
            self.folder,
            self.catalog.len(),
            self.catalog.media_only().len()
        );
        if self.detector.baseline().is_none() {
            self.seed_wanted = true;
        }
        self.events.publish(GalleryEvent::CatalogReplaced {
            folder: self.folder.clone(),
            items: self.catalog.items().to_vec(),
        });

        if closed {
            self.exit_presentation();
            self.publish_mode();
        }
        true
    }

    // ===== Change polling =====

    /// Periodic check of the current folder. Skipped while another check is outstanding.
    pub fn request_poll(&mut self) -> Option<PollRequest> {
        if self.is_polling() {
            tracing::debug!("Change check still in flight, skipping");
            return None;
        }
        Some(self.issue_poll())
    }

    /// Check that seeds the baseline right after a folder finished loading.
    /// Yields at most one request per unseeded load.
    pub fn take_seed_poll(&mut self) -> Option<PollRequest> {
        if !std::mem::take(&mut self.seed_wanted) || self.detector.baseline().is_some() {
            return None;
        }
        Some(self.issue_poll())
    }

    fn issue_poll(&mut self) -> PollRequest {
        self.poll_sequence += 1;
        self.polls_in_flight += 1;
        PollRequest {
            sequence: self.poll_sequence,
            folder: self.folder.clone(),
        }
    }

    /// Feed a change-signature result. A detected change yields a background
    /// reload. Results older than one already applied are discarded.
    pub fn complete_poll(
        &mut self,
        request: &PollRequest,
        result: Result<ChangeSignature, AppError>,
    ) -> Option<ReloadRequest> {
        self.polls_in_flight = self.polls_in_flight.saturating_sub(1);
        if request.sequence < self.poll_applied {
            tracing::debug!("Discarding out-of-order change check #{}", request.sequence);
            return None;
        }
        self.poll_applied = request.sequence;

        match self.detector.observe(&request.folder, result) {
            ChangeStatus::Changed => self.request_reload(ReloadReason::Background),
            ChangeStatus::Unchanged => None,
        }
    }

    // ===== Single view =====

    pub fn open_item(&mut self, kind: MediaKind, path: &str) -> Option<usize> {
        let index = self.view.open_item(&self.catalog, kind, path)?;
        self.gestures.cancel();
        self.publish_mode();
        Some(index)
    }

    pub fn next(&mut self) -> Option<usize> {
        let index = self.view.next(&self.catalog)?;
        self.publish_advanced();
        Some(index)
    }

    pub fn previous(&mut self) -> Option<usize> {
        let index = self.view.previous(&self.catalog)?;
        self.publish_advanced();
        Some(index)
    }

    /// Close the single view. No-op while a slideshow is running.
    pub fn close(&mut self) -> bool {
        if !self.view.close() {
            return false;
        }
        self.gestures.cancel();
        self.exit_presentation();
        self.publish_mode();
        true
    }

    // ===== Slideshow =====

    pub fn start_slideshow(&mut self) -> SlideshowStart {
        if self.view.mode() == ViewMode::SingleView {
            self.view.close();
        }

        let started = self.view.start_slideshow(&self.catalog);
        match started {
            SlideshowStart::Started => {
                if let Err(e) = self.presentation.enter() {
                    tracing::warn!("Could not enter presentation: {}", e);
                }
                self.publish_mode();
            }
            SlideshowStart::NoImages => {
                tracing::info!("No images in {:?} for a slideshow", self.folder);
                self.events.publish(GalleryEvent::NoMedia {
                    folder: self.folder.clone(),
                });
            }
            SlideshowStart::AlreadyRunning => {}
        }
        started
    }

    pub fn stop_slideshow(&mut self) -> bool {
        if !self.view.stop_slideshow() {
            return false;
        }
        self.exit_presentation();
        self.publish_mode();
        true
    }

    pub fn next_slide(&mut self) -> Option<usize> {
        let index = self.view.next_slide()?;
        self.publish_advanced();
        Some(index)
    }

    pub fn previous_slide(&mut self) -> Option<usize> {
        let index = self.view.previous_slide()?;
        self.publish_advanced();
        Some(index)
    }

    pub fn toggle_pause(&mut self) -> Option<bool> {
        let paused = self.view.toggle_pause()?;
        tracing::info!("Slideshow {}", if paused { "paused" } else { "resumed" });
        Some(paused)
    }

    pub fn set_interval(&mut self, secs: u32) -> u32 {
        self.view.set_interval(secs)
    }

    /// Applies from the next slideshow start
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.view.set_shuffle(shuffle);
    }

    /// Autoplay tick from the receiver returned by [`Gallery::new`]
    pub fn on_tick(&mut self, tick: AutoplayTick) -> Option<usize> {
        let index = self.view.on_tick(tick)?;
        self.publish_advanced();
        Some(index)
    }

    // ===== Deletion =====

    /// Begin deleting the displayed item. Rejected while another deletion is outstanding.
    pub fn request_delete(&mut self) -> Result<DeleteRequest, AppError> {
        if self.delete_in_flight.is_some() {
            tracing::debug!("Delete rejected: another deletion is in flight");
            return Err(AppError::DeleteInProgress);
        }
        if self.view.mode() != ViewMode::SingleView {
            return Err(AppError::NothingToDelete);
        }

        let item = self
            .current_item()
            .filter(|item| item.is_navigable())
            .cloned()
            .ok_or(AppError::NothingToDelete)?;

        tracing::info!("Deleting {:?}", item.path);
        self.delete_in_flight = Some(item.clone());
        Ok(DeleteRequest { item })
    }

    /// Apply a deletion result. A success always requests a catalog reload.
    pub fn complete_delete(
        &mut self,
        request: &DeleteRequest,
        result: Result<(), AppError>,
    ) -> (DeleteOutcome, Option<ReloadRequest>) {
        self.delete_in_flight = None;

        if let Err(e) = result {
            tracing::error!("Delete of {:?} failed: {}", request.item.path, e);
            self.publish_error(&e);
            return (DeleteOutcome::Failed, None);
        }

        let outcome = self.remove_deleted(&request.item);
        let reload = self.request_reload(ReloadReason::AfterDelete);
        (outcome, reload)
    }

    fn remove_deleted(&mut self, item: &MediaItem) -> DeleteOutcome {
        // The catalog may have been replaced while the call was in flight
        let Some(index) = self.catalog.find(item.kind, &item.path) else {
            return DeleteOutcome::Detached;
        };

        let viewing = self.view.mode() == ViewMode::SingleView && self.view.current_index() == index;
        let removal = self.catalog.remove(index);

        if !viewing {
            if self.view.mode() == ViewMode::SingleView && self.view.current_index() > index {
                self.view.show(self.view.current_index() - 1);
            }
            return DeleteOutcome::Detached;
        }

        match removal {
            Removal::Show(next) => {
                self.view.show(next);
                self.publish_advanced();
                DeleteOutcome::Showing(next)
            }
            Removal::Exhausted => {
                self.close();
                DeleteOutcome::ReturnedToGrid
            }
        }
    }

    // ===== Input =====

    pub fn touch_start(&mut self, x: f64, y: f64) {
        if self.view.mode() == ViewMode::SingleView {
            self.gestures.start(x, y);
        }
    }

    /// Returns true when default scrolling should be suppressed
    pub fn touch_move(&mut self, x: f64, y: f64) -> bool {
        if self.view.mode() != ViewMode::SingleView {
            return false;
        }
        self.gestures.move_to(x, y)
    }

    pub fn touch_end(&mut self, x: f64, y: f64, target: TouchTarget) -> Option<GestureAction> {
        if self.view.mode() != ViewMode::SingleView {
            self.gestures.cancel();
            return None;
        }

        let action = self.gestures.end(x, y, target)?.action()?;
        match action {
            GestureAction::Dismiss => {
                self.close();
            }
            GestureAction::Next => {
                self.next();
            }
            GestureAction::Previous => {
                self.previous();
            }
        }
        Some(action)
    }

    /// Resolve and dispatch a key by name
    pub fn handle_key(&mut self, key: &str) -> Option<PendingWork> {
        let command = self.keys.resolve(key)?;
        self.dispatch(command)
    }

    /// Run a command in the context of the current mode
    pub fn dispatch(&mut self, command: Command) -> Option<PendingWork> {
        let mode = self.view.mode();
        match (command, mode) {
            (Command::Next, ViewMode::SingleView) => {
                self.next();
            }
            (Command::Previous, ViewMode::SingleView) => {
                self.previous();
            }
            (Command::Next, ViewMode::Slideshow) => {
                self.next_slide();
            }
            (Command::Previous, ViewMode::Slideshow) => {
                self.previous_slide();
            }
            (Command::Exit, ViewMode::SingleView) => {
                self.close();
            }
            (Command::Exit, ViewMode::Slideshow) => {
                self.stop_slideshow();
            }
            (Command::ToggleFullscreen, ViewMode::SingleView | ViewMode::Slideshow) => {
                if let Err(e) = self.presentation.toggle() {
                    tracing::warn!("Fullscreen toggle failed: {}", e);
                }
            }
            (Command::Delete, ViewMode::SingleView) => match self.request_delete() {
                Ok(request) => return Some(PendingWork::Delete(request)),
                Err(e) => tracing::debug!("Delete not started: {}", e),
            },
            (Command::ToggleSlideshow, ViewMode::Slideshow) => {
                self.stop_slideshow();
            }
            (Command::ToggleSlideshow, _) => {
                self.start_slideshow();
            }
            (Command::TogglePause, ViewMode::Slideshow) => {
                self.toggle_pause();
            }
            (Command::Faster, ViewMode::Slideshow) => {
                let secs = self.view.interval_secs().saturating_sub(1);
                self.set_interval(secs);
            }
            (Command::Slower, ViewMode::Slideshow) => {
                let secs = self.view.interval_secs().saturating_add(1);
                self.set_interval(secs);
            }
            (command, mode) => {
                tracing::debug!("Command {} has no effect in {:?}", command.id(), mode);
            }
        }
        None
    }

    // ===== Async conveniences =====

    /// Navigate and load in one step
    pub async fn load_folder(&mut self, folder: &str) -> bool {
        match self.navigate_to(folder) {
            Some(request) => self.fetch(request).await,
            None => false,
        }
    }

    pub async fn reload(&mut self, reason: ReloadReason) -> bool {
        match self.request_reload(reason) {
            Some(request) => self.fetch(request).await,
            None => false,
        }
    }

    /// Poll once; reload when the folder changed
    pub async fn poll_changes(&mut self) -> bool {
        let Some(request) = self.request_poll() else {
            return false;
        };
        match self.run_poll(request).await {
            Some(reload) => self.fetch(reload).await,
            None => false,
        }
    }

    pub async fn delete_current(&mut self) -> Result<DeleteOutcome, AppError> {
        let request = self.request_delete()?;
        let source = self.source();
        let result = source.delete_item(&request.item.path).await;
        let (outcome, reload) = self.complete_delete(&request, result);
        if let Some(reload) = reload {
            self.fetch(reload).await;
        }
        Ok(outcome)
    }

    async fn fetch(&mut self, request: ReloadRequest) -> bool {
        let source = self.source();
        let result = source.list_folder(&request.folder, request.size_hint).await;
        let applied = self.complete_reload(request.generation, result);
        if let Some(seed) = self.take_seed_poll() {
            // Seeding never reports a change
            self.run_poll(seed).await;
        }
        applied
    }

    async fn run_poll(&mut self, request: PollRequest) -> Option<ReloadRequest> {
        let source = self.source();
        let result = source.change_signature(&request.folder).await;
        self.complete_poll(&request, result)
    }

    // ===== Helpers =====

    fn leave_view(&mut self) {
        if self.view.reset() {
            self.gestures.cancel();
            self.exit_presentation();
            self.publish_mode();
        }
    }

    /// Always attempted, never gates the mode transition
    fn exit_presentation(&mut self) {
        if let Err(e) = self.presentation.exit() {
            tracing::warn!("Error exiting presentation: {}", e);
        }
    }

    fn publish_mode(&self) {
        let mode = self.view.mode();
        let item = self.current_item().cloned();
        let index = item.as_ref().map(|_| self.view.current_index());
        self.events.publish(GalleryEvent::ModeChanged { mode, index, item });
    }

    fn publish_advanced(&self) {
        if let Some(item) = self.current_item() {
            self.events.publish(GalleryEvent::Advanced {
                index: self.view.current_index(),
                total: self.view.total(&self.catalog),
                item: item.clone(),
            });
        }
    }

    fn publish_error(&self, error: &AppError) {
        self.events.publish(GalleryEvent::Error {
            message: error.user_message(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use crate::presentation::OverlayPresentation;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        listing: Mutex<Vec<MediaItem>>,
        signatures: Mutex<VecDeque<Result<ChangeSignature, AppError>>>,
        fail_delete: Mutex<bool>,
        list_calls: Mutex<Vec<(String, u32)>>,
    }

    impl FakeSource {
        fn with(items: Vec<MediaItem>) -> Arc<Self> {
            let source = Self::default();
            *source.listing.lock().unwrap() = items;
            Arc::new(source)
        }
    }

    #[async_trait]
    impl MediaSource for FakeSource {
        async fn list_folder(&self, path: &str, size_hint: u32) -> Result<Vec<MediaItem>, AppError> {
            self.list_calls.lock().unwrap().push((path.to_string(), size_hint));
            Ok(self.listing.lock().unwrap().clone())
        }

        async fn change_signature(&self, _path: &str) -> Result<ChangeSignature, AppError> {
            self.signatures
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Transport("no answer".into())))
        }

        async fn delete_item(&self, path: &str) -> Result<(), AppError> {
            if *self.fail_delete.lock().unwrap() {
                return Err(AppError::DeleteFailed {
                    path: path.to_string(),
                    reason: "read-only".into(),
                });
            }
            self.listing.lock().unwrap().retain(|item| item.path != path);
            Ok(())
        }
    }

    fn gallery(source: Arc<FakeSource>) -> Gallery {
        let (gallery, _ticks) = Gallery::new(AppConfig::default(), source, Box::new(OverlayPresentation::default()));
        gallery
    }

    fn recorder(gallery: &mut Gallery) -> Arc<Mutex<Vec<GalleryEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        gallery.events_mut().subscribe_all(move |event| sink.lock().unwrap().push(event.clone()));
        log
    }

    #[tokio::test]
    async fn test_load_folder_publishes_catalog() {
        let source = FakeSource::with(vec![MediaItem::folder("sub"), MediaItem::image("a.jpg")]);
        let mut g = gallery(source.clone());
        let events = recorder(&mut g);

        assert!(g.load_folder("trips").await);
        assert_eq!(g.catalog().len(), 2);
        assert_eq!(source.list_calls.lock().unwrap()[0], ("trips".to_string(), 180));

        let events = events.lock().unwrap();
        assert!(matches!(&events[0], GalleryEvent::CatalogReplaced { folder, items } if folder == "trips" && items.len() == 2));
    }

    #[tokio::test]
    async fn test_delete_clamps_to_previous_item() {
        let source = FakeSource::with(vec![MediaItem::image("img0.jpg"), MediaItem::image("img1.jpg")]);
        let mut g = gallery(source);
        g.load_folder("").await;
        g.open_item(MediaKind::Image, "img1.jpg");

        let outcome = g.delete_current().await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Showing(0));
        assert_eq!(g.mode(), ViewMode::SingleView);
        assert_eq!(g.current_item().unwrap().path, "img0.jpg");
        assert_eq!(g.catalog().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_last_item_returns_to_grid() {
        let source = FakeSource::with(vec![MediaItem::image("only.jpg")]);
        let mut g = gallery(source);
        g.load_folder("").await;
        g.open_item(MediaKind::Image, "only.jpg");

        assert_eq!(g.delete_current().await.unwrap(), DeleteOutcome::ReturnedToGrid);
        assert_eq!(g.mode(), ViewMode::Grid);
        assert!(g.catalog().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_reports_error() {
        let source = FakeSource::with(vec![MediaItem::image("a.jpg")]);
        *source.fail_delete.lock().unwrap() = true;
        let mut g = gallery(source);
        g.load_folder("").await;
        g.open_item(MediaKind::Image, "a.jpg");
        let events = recorder(&mut g);

        assert_eq!(g.delete_current().await.unwrap(), DeleteOutcome::Failed);
        assert_eq!(g.catalog().len(), 1);
        assert!(!g.is_deleting());
        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| e.topic() == Topic::Error));
    }

    #[tokio::test]
    async fn test_second_delete_rejected_while_outstanding() {
        let source = FakeSource::with(vec![MediaItem::image("a.jpg"), MediaItem::image("b.jpg")]);
        let mut g = gallery(source);
        g.load_folder("").await;
        g.open_item(MediaKind::Image, "a.jpg");

        let first = g.request_delete().unwrap();
        assert!(matches!(g.request_delete(), Err(AppError::DeleteInProgress)));
        assert_eq!(g.dispatch(Command::Delete), None);

        let (outcome, reload) = g.complete_delete(&first, Ok(()));
        assert_eq!(outcome, DeleteOutcome::Showing(0));
        assert_eq!(reload.unwrap().reason, ReloadReason::AfterDelete);
        assert!(g.request_delete().is_ok());
    }

    #[tokio::test]
    async fn test_delete_requires_single_view() {
        let mut g = gallery(FakeSource::with(vec![MediaItem::image("a.jpg")]));
        g.load_folder("").await;
        assert!(matches!(g.request_delete(), Err(AppError::NothingToDelete)));
    }

    #[test]
    fn test_background_reload_coalesced() {
        let mut g = gallery(FakeSource::with(vec![]));
        let user = g.navigate_to("a").unwrap();
        assert!(g.request_reload(ReloadReason::Background).is_none());

        assert!(g.complete_reload(user.generation, Ok(vec![MediaItem::image("x.jpg")])));
        assert!(g.request_reload(ReloadReason::Background).is_some());
    }

    #[test]
    fn test_latest_reload_wins() {
        let mut g = gallery(FakeSource::with(vec![]));
        let first = g.navigate_to("a").unwrap();
        let second = g.navigate_to("b").unwrap();

        assert!(g.complete_reload(second.generation, Ok(vec![MediaItem::image("b.jpg")])));
        assert!(!g.complete_reload(first.generation, Ok(vec![MediaItem::image("a.jpg")])));
        assert_eq!(g.catalog().items()[0].path, "b.jpg");
        assert_eq!(second.folder, "b");
    }

    #[test]
    fn test_failed_reload_keeps_catalog_and_reports() {
        let mut g = gallery(FakeSource::with(vec![]));
        let events = recorder(&mut g);
        let req = g.navigate_to("a").unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::image("keep.jpg")]));

        let req = g.request_reload(ReloadReason::User).unwrap();
        g.complete_reload(req.generation, Err(AppError::Status { status: 500, url: "/api".into() }));
        assert_eq!(g.catalog().len(), 1);
        assert!(!g.is_reloading());
        assert!(events.lock().unwrap().iter().any(|e| matches!(e, GalleryEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_poll_triggers_single_reload() {
        let source = FakeSource::with(vec![MediaItem::image("a.jpg")]);
        {
            let mut sigs = source.signatures.lock().unwrap();
            sigs.push_back(Ok(ChangeSignature::new(100.0, 5)));
            sigs.push_back(Ok(ChangeSignature::new(100.0, 5)));
            sigs.push_back(Ok(ChangeSignature::new(105.0, 5)));
        }
        let mut g = gallery(source.clone());
        g.load_folder("").await;
        assert_eq!(g.detector().baseline(), Some(ChangeSignature::new(100.0, 5)));

        assert!(!g.poll_changes().await);
        assert!(g.poll_changes().await);
        assert!(!g.poll_changes().await);
        assert!(!g.is_polling());
        assert_eq!(source.list_calls.lock().unwrap().len(), 2);
        assert_eq!(g.detector().baseline(), Some(ChangeSignature::new(105.0, 5)));
    }

    #[test]
    fn test_load_hands_out_one_seed_poll() {
        let mut g = gallery(FakeSource::with(vec![]));
        let req = g.navigate_to("a").unwrap();
        assert_eq!(g.take_seed_poll(), None);

        g.complete_reload(req.generation, Ok(vec![MediaItem::image("x.jpg")]));
        let seed = g.take_seed_poll().unwrap();
        assert_eq!(seed.folder, "a");
        assert_eq!(g.take_seed_poll(), None);

        assert_eq!(g.complete_poll(&seed, Ok(ChangeSignature::new(1.0, 1))), None);
        assert_eq!(g.detector().baseline(), Some(ChangeSignature::new(1.0, 1)));

        // Already seeded, later loads need no seed
        let req = g.request_reload(ReloadReason::User).unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::image("x.jpg")]));
        assert_eq!(g.take_seed_poll(), None);
    }

    #[test]
    fn test_change_before_first_periodic_poll_reloads() {
        let mut g = gallery(FakeSource::with(vec![]));
        let req = g.navigate_to("a").unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::image("x.jpg")]));
        let seed = g.take_seed_poll().unwrap();
        g.complete_poll(&seed, Ok(ChangeSignature::new(1.0, 1)));

        // Backend gains an item before the timer fires
        let poll = g.request_poll().unwrap();
        let reload = g.complete_poll(&poll, Ok(ChangeSignature::new(2.0, 2))).unwrap();
        assert_eq!(reload.reason, ReloadReason::Background);

        g.complete_reload(reload.generation, Ok(vec![MediaItem::image("x.jpg"), MediaItem::image("y.jpg")]));
        assert_eq!(g.catalog().len(), 2);
    }

    #[test]
    fn test_out_of_order_poll_result_is_discarded() {
        let mut g = gallery(FakeSource::with(vec![]));
        let req = g.navigate_to("a").unwrap();

        // Timer check goes out while the listing is still loading
        let older = g.request_poll().unwrap();
        assert_eq!(g.request_poll(), None);

        g.complete_reload(req.generation, Ok(vec![MediaItem::image("x.jpg")]));
        let seed = g.take_seed_poll().unwrap();
        assert!(seed.sequence > older.sequence);

        assert_eq!(g.complete_poll(&seed, Ok(ChangeSignature::new(2.0, 2))), None);
        assert_eq!(g.complete_poll(&older, Ok(ChangeSignature::new(1.0, 1))), None);
        assert_eq!(g.detector().baseline(), Some(ChangeSignature::new(2.0, 2)));
        assert!(!g.is_reloading());
        assert!(!g.is_polling());

        let next = g.request_poll().unwrap();
        assert_eq!(g.complete_poll(&next, Ok(ChangeSignature::new(2.0, 2))), None);
    }

    #[test]
    fn test_settings_reflect_runtime_changes() {
        let mut g = gallery(FakeSource::with(vec![]));
        g.navigate_to("trips");
        g.set_thumbnail_size(ThumbnailSize::try_from(5).unwrap());
        g.set_interval(12);
        g.set_shuffle(true);

        let settings = g.settings();
        assert_eq!(settings.general.start_folder, "trips");
        assert_eq!(settings.gallery.thumbnail_size.pixels(), 400);
        assert_eq!(settings.slideshow.interval_secs, 12);
        assert!(settings.slideshow.shuffle);
    }

    #[test]
    fn test_navigation_resets_baseline_and_closes_view() {
        let mut g = gallery(FakeSource::with(vec![]));
        let req = g.navigate_to("a").unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::image("x.jpg")]));
        let seed = g.take_seed_poll().unwrap();
        g.complete_poll(&seed, Ok(ChangeSignature::new(1.0, 1)));
        g.open_item(MediaKind::Image, "x.jpg");

        g.navigate_to("b");
        assert_eq!(g.mode(), ViewMode::Grid);
        assert_eq!(g.detector().baseline(), None);
        assert_eq!(g.detector().folder(), "b");
    }

    #[test]
    fn test_reload_reresolves_open_item() {
        let mut g = gallery(FakeSource::with(vec![]));
        let req = g.navigate_to("").unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::image("a.jpg"), MediaItem::image("b.jpg")]));
        g.open_item(MediaKind::Image, "b.jpg");

        let req = g.request_reload(ReloadReason::User).unwrap();
        g.complete_reload(
            req.generation,
            Ok(vec![MediaItem::image("new.jpg"), MediaItem::image("a.jpg"), MediaItem::image("b.jpg")]),
        );
        assert_eq!(g.view().current_index(), 2);
        assert_eq!(g.current_item().unwrap().path, "b.jpg");
    }

    #[test]
    fn test_gestures_drive_single_view() {
        let mut g = gallery(FakeSource::with(vec![]));
        let req = g.navigate_to("").unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::image("a.jpg"), MediaItem::video("b.mp4")]));

        // Ignored on the grid
        g.touch_start(100.0, 100.0);
        assert_eq!(g.touch_end(100.0, 100.0, TouchTarget::Other), None);

        g.open_item(MediaKind::Image, "a.jpg");
        g.touch_start(100.0, 100.0);
        assert!(g.touch_move(40.0, 110.0));
        assert_eq!(g.touch_end(40.0, 110.0, TouchTarget::Media), Some(GestureAction::Next));
        assert_eq!(g.view().current_index(), 1);

        g.touch_start(100.0, 100.0);
        assert_eq!(g.touch_end(100.0, 100.0, TouchTarget::Other), Some(GestureAction::Dismiss));
        assert_eq!(g.mode(), ViewMode::Grid);
    }

    #[test]
    fn test_slideshow_without_images_reports_no_media() {
        let mut g = gallery(FakeSource::with(vec![]));
        let events = recorder(&mut g);
        let req = g.navigate_to("").unwrap();
        g.complete_reload(req.generation, Ok(vec![MediaItem::video("v.mp4")]));

        assert_eq!(g.start_slideshow(), SlideshowStart::NoImages);
        assert_eq!(g.mode(), ViewMode::Grid);
        assert!(events.lock().unwrap().iter().any(|e| e.topic() == Topic::NoMedia));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slideshow_keys_and_presentation() {
        let source = FakeSource::with(vec![MediaItem::image("a.jpg"), MediaItem::image("b.jpg")]);
        let (mut g, mut ticks) = Gallery::new(AppConfig::default(), source, Box::new(OverlayPresentation::default()));
        g.load_folder("").await;

        g.handle_key("s");
        assert_eq!(g.mode(), ViewMode::Slideshow);
        assert!(g.presentation().is_active());

        let tick = ticks.recv().await.unwrap();
        assert_eq!(g.on_tick(tick), Some(1));

        g.handle_key("ArrowRight");
        assert_eq!(g.view().current_index(), 0);
        g.handle_key(" ");
        assert!(g.view().is_paused());
        g.handle_key("+");
        assert_eq!(g.view().interval_secs(), 6);

        // Close is ignored, Escape stops the slideshow
        assert!(!g.close());
        g.handle_key("Escape");
        assert_eq!(g.mode(), ViewMode::Grid);
        assert!(!g.presentation().is_active());
        assert_eq!(g.on_tick(tick), None);
    }
}
