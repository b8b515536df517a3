//! Gallery viewer - headless driver for the navigation and sync engine
//!
//! Reads one input per line from stdin: a key name (`ArrowRight`, `Escape`,
//! `s`, ...) or one of `cd <folder>`, `open <image|video> <path>`,
//! `size <1-5>`, `interval <secs>`, `shuffle <on|off>`,
//! `swipe <x0> <y0> <x1> <y1>`, `tap [media]`, `reload`, `save`.

use anyhow::Result;
use app_core::{
    select_presentation, AppConfig, AppError, ChangeSignature, DeleteRequest, FullscreenHost,
    Gallery, GalleryEvent, MediaItem, MediaKind, PendingWork, PollRequest, ReloadReason,
    ReloadRequest, ThumbnailSize, TouchTarget,
};
use app_net::HttpMediaSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::time::MissedTickBehavior;

/// A network call finished
enum Completion {
    Reload { generation: u64, result: Result<Vec<MediaItem>, AppError> },
    Poll { request: PollRequest, result: Result<ChangeSignature, AppError> },
    Delete { request: DeleteRequest, result: Result<(), AppError> },
}

/// No native fullscreen without a display
struct HeadlessHost;

impl FullscreenHost for HeadlessHost {
    fn is_supported(&self) -> bool {
        false
    }

    fn request_fullscreen(&mut self) -> Result<(), AppError> {
        Err(AppError::Init("no display".into()))
    }

    fn exit_fullscreen(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::config_path);
    let (config, config_error) = AppConfig::load_or_default(&config_path);

    // Logging comes up before anything else reports
    let _log_guard = app_log::init(&config.log.level, config.log.file)?;
    match config_error {
        None => tracing::info!("Configuration: {}", config_path.display()),
        Some(e) => tracing::warn!("Ignoring unreadable configuration {}: {:#}", config_path.display(), e),
    }
    if config.log.file {
        if let Err(e) = app_log::cleanup_old_logs(&app_log::log_dir(), config.log.retention_days) {
            tracing::warn!("Failed to cleanup old logs: {}", e);
        }
    }

    tracing::info!("Gallery viewer starting against {}", config.general.server_url);

    let source = Arc::new(HttpMediaSource::new(&config.general.server_url)?);
    let (mut gallery, mut ticks) = Gallery::new(config.clone(), source, select_presentation(HeadlessHost));
    gallery.events_mut().subscribe_all(log_event);

    let (done_tx, mut done_rx) = unbounded_channel();
    if let Some(request) = gallery.navigate_to(&config.general.start_folder) {
        spawn_reload(&gallery, request, &done_tx);
    }

    let mut poll = tokio::time::interval(Duration::from_secs(config.sync.poll_interval_secs.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line == "save" {
                    save_settings(&gallery, &config_path);
                    continue;
                }
                if let Some(work) = handle_line(&mut gallery, line) {
                    spawn_work(&gallery, work, &done_tx);
                }
            }
            Some(tick) = ticks.recv() => {
                gallery.on_tick(tick);
            }
            _ = poll.tick(), if config.sync.enabled => {
                if let Some(request) = gallery.request_poll() {
                    spawn_work(&gallery, PendingWork::Poll(request), &done_tx);
                }
            }
            Some(done) = done_rx.recv() => {
                if let Some(work) = complete(&mut gallery, done) {
                    spawn_work(&gallery, work, &done_tx);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("Gallery viewer exiting");
    Ok(())
}

fn handle_line(gallery: &mut Gallery, line: &str) -> Option<PendingWork> {
    let mut parts = line.split_whitespace();
    let word = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    match (word, rest.as_slice()) {
        ("cd", args) => gallery.navigate_to(&args.join(" ")).map(PendingWork::Reload),
        ("reload", []) => gallery.request_reload(ReloadReason::User).map(PendingWork::Reload),
        ("open", [kind, path @ ..]) => {
            let kind = match *kind {
                "image" => MediaKind::Image,
                "video" => MediaKind::Video,
                other => {
                    tracing::warn!("Unknown media kind {:?}", other);
                    return None;
                }
            };
            gallery.open_item(kind, &path.join(" "));
            None
        }
        ("size", [preset]) => match preset.parse::<u8>().map_err(|e| e.to_string()).and_then(ThumbnailSize::try_from) {
            Ok(size) => gallery.set_thumbnail_size(size).map(PendingWork::Reload),
            Err(e) => {
                tracing::warn!("Bad size: {}", e);
                None
            }
        },
        ("interval", [secs]) => {
            if let Ok(secs) = secs.parse() {
                let applied = gallery.set_interval(secs);
                tracing::info!("Slideshow interval {}s", applied);
            }
            None
        }
        ("shuffle", [flag]) => {
            gallery.set_shuffle(*flag == "on");
            None
        }
        ("swipe", [x0, y0, x1, y1]) => {
            let coords: Vec<f64> = [x0, y0, x1, y1].iter().filter_map(|v| v.parse().ok()).collect();
            if let [x0, y0, x1, y1] = coords[..] {
                gallery.touch_start(x0, y0);
                gallery.touch_move(x1, y1);
                gallery.touch_end(x1, y1, TouchTarget::Media);
            }
            None
        }
        ("tap", args) => {
            let target = if args.first() == Some(&"media") {
                TouchTarget::Media
            } else {
                TouchTarget::Other
            };
            gallery.touch_start(0.0, 0.0);
            gallery.touch_end(0.0, 0.0, target);
            None
        }
        (key, []) => gallery.handle_key(key),
        _ => {
            tracing::warn!("Unrecognized input {:?}", line);
            None
        }
    }
}

fn complete(gallery: &mut Gallery, done: Completion) -> Option<PendingWork> {
    match done {
        Completion::Reload { generation, result } => {
            gallery.complete_reload(generation, result);
            gallery.take_seed_poll().map(PendingWork::Poll)
        }
        Completion::Poll { request, result } => gallery.complete_poll(&request, result).map(PendingWork::Reload),
        Completion::Delete { request, result } => {
            let (outcome, reload) = gallery.complete_delete(&request, result);
            tracing::info!("Delete of {:?}: {:?}", request.item.path, outcome);
            reload.map(PendingWork::Reload)
        }
    }
}

fn spawn_work(gallery: &Gallery, work: PendingWork, done: &UnboundedSender<Completion>) {
    match work {
        PendingWork::Reload(request) => spawn_reload(gallery, request, done),
        PendingWork::Delete(request) => {
            let source = gallery.source();
            let done = done.clone();
            tokio::spawn(async move {
                let result = source.delete_item(&request.item.path).await;
                let _ = done.send(Completion::Delete { request, result });
            });
        }
        PendingWork::Poll(request) => {
            let source = gallery.source();
            let done = done.clone();
            tokio::spawn(async move {
                let result = source.change_signature(&request.folder).await;
                let _ = done.send(Completion::Poll { request, result });
            });
        }
    }
}

fn spawn_reload(gallery: &Gallery, request: ReloadRequest, done: &UnboundedSender<Completion>) {
    let source = gallery.source();
    let done = done.clone();
    tokio::spawn(async move {
        let result = source.list_folder(&request.folder, request.size_hint).await;
        let _ = done.send(Completion::Reload {
            generation: request.generation,
            result,
        });
    });
}

fn save_settings(gallery: &Gallery, path: &Path) {
    match gallery.settings().save_to(path) {
        Ok(()) => tracing::info!("Settings saved"),
        Err(e) => tracing::error!("Failed to save settings: {:#}", e),
    }
}

fn log_event(event: &GalleryEvent) {
    match event {
        GalleryEvent::CatalogReplaced { folder, items } => {
            let media = items.iter().filter(|i| i.is_navigable()).count();
            tracing::info!("[catalog] {:?}: {} entries, {} media", folder, items.len(), media);
        }
        GalleryEvent::ModeChanged { mode, index, item } => {
            let name = item.as_ref().map(|i| i.display_name()).unwrap_or("-");
            tracing::info!("[mode] {:?} at {:?}: {}", mode, index, name);
        }
        GalleryEvent::Advanced { index, total, item } => {
            tracing::info!("[show] {} / {} {} ({})", index + 1, total, item.display_name(), item.kind);
        }
        GalleryEvent::Error { message } => tracing::error!("[error] {}", message),
        GalleryEvent::NoMedia { folder } => {
            tracing::info!("[notice] No images found in {:?} to start a slideshow", folder)
        }
    }
}
