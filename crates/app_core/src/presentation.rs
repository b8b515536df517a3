//! Full-viewport presentation, native or overlay-emulated

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationKind {
    Native,
    Overlay,
}

/// Full-viewport display surface used by the single view and slideshows
pub trait Presentation: Send {
    fn enter(&mut self) -> Result<(), AppError>;

    /// Leave presentation. The surface is considered inactive afterwards even on error.
    fn exit(&mut self) -> Result<(), AppError>;

    fn is_active(&self) -> bool;

    fn kind(&self) -> PresentationKind;

    fn toggle(&mut self) -> Result<bool, AppError> {
        if self.is_active() {
            self.exit()?;
        } else {
            self.enter()?;
        }
        Ok(self.is_active())
    }
}

/// Host side of a native fullscreen API
pub trait FullscreenHost: Send {
    fn is_supported(&self) -> bool;
    fn request_fullscreen(&mut self) -> Result<(), AppError>;
    fn exit_fullscreen(&mut self) -> Result<(), AppError>;
}

/// Emulated fullscreen: the overlay simply covers the viewport
#[derive(Debug, Default)]
pub struct OverlayPresentation {
    active: bool,
}

impl Presentation for OverlayPresentation {
    fn enter(&mut self) -> Result<(), AppError> {
        self.active = true;
        Ok(())
    }

    fn exit(&mut self) -> Result<(), AppError> {
        self.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn kind(&self) -> PresentationKind {
        PresentationKind::Overlay
    }
}

/// Native fullscreen through a host, degrading to the overlay when a request fails
pub struct NativePresentation<H: FullscreenHost> {
    host: H,
    native_active: bool,
    overlay: OverlayPresentation,
}

impl<H: FullscreenHost> NativePresentation<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            native_active: false,
            overlay: OverlayPresentation::default(),
        }
    }
}

impl<H: FullscreenHost> Presentation for NativePresentation<H> {
    fn enter(&mut self) -> Result<(), AppError> {
        match self.host.request_fullscreen() {
            Ok(()) => {
                self.native_active = true;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Native fullscreen refused, using overlay: {}", e);
                self.overlay.enter()
            }
        }
    }

    fn exit(&mut self) -> Result<(), AppError> {
        self.overlay.exit()?;
        if !self.native_active {
            return Ok(());
        }
        self.native_active = false;
        self.host.exit_fullscreen()
    }

    fn is_active(&self) -> bool {
        self.native_active || self.overlay.is_active()
    }

    fn kind(&self) -> PresentationKind {
        PresentationKind::Native
    }
}

/// Pick a backend once for the lifetime of the viewer
pub fn select_presentation<H: FullscreenHost + 'static>(host: H) -> Box<dyn Presentation> {
    if host.is_supported() {
        tracing::info!("Using native fullscreen presentation");
        Box::new(NativePresentation::new(host))
    } else {
        tracing::info!("Native fullscreen unavailable, using overlay presentation");
        Box::new(OverlayPresentation::default())
    }
}
