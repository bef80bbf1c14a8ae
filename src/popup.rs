//! Popup dedup layer.
//!
//! The geofence re-confirms the active cluster every frame. Forwarding each
//! confirmation to the renderer would reposition the popup sixty times a second and
//! make it visibly vibrate, so [`PopupLayer`] remembers what is on screen and only
//! calls through when the anchor changes.

use log::trace;

use crate::marks::MarkCategory;
use crate::GpsPoint;

/// One line of popup content.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopupEntry {
    pub name: String,
    pub category: MarkCategory,
}

/// Structured popup body; the renderer decides how to lay it out.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopupContent {
    pub title: String,
    pub entries: Vec<PopupEntry>,
}

/// Host capability that draws a single popup.
pub trait PopupRenderer {
    /// Show the popup at `anchor`, replacing any popup currently shown.
    fn show_at(&mut self, anchor: GpsPoint, content: &PopupContent);

    fn hide(&mut self);
}

/// Stable identity of a popup anchor: the exact bit pattern of its coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorKey(u64, u64);

impl AnchorKey {
    pub fn of(anchor: &GpsPoint) -> Self {
        Self(anchor.latitude.to_bits(), anchor.longitude.to_bits())
    }
}

/// Wraps a [`PopupRenderer`], suppressing repeated shows at the same anchor.
#[derive(Debug)]
pub struct PopupLayer<R: PopupRenderer> {
    renderer: R,
    visible: bool,
    anchor_key: Option<AnchorKey>,
}

impl<R: PopupRenderer> PopupLayer<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer, visible: false, anchor_key: None }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn anchor_key(&self) -> Option<AnchorKey> {
        self.anchor_key
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Show `content` at `anchor`. No-op when already visible at the same anchor.
    pub fn show(&mut self, anchor: GpsPoint, content: &PopupContent) {
        let key = AnchorKey::of(&anchor);
        if self.visible && self.anchor_key == Some(key) {
            return;
        }
        trace!("[Popup] Showing '{}'", content.title);
        self.renderer.show_at(anchor, content);
        self.visible = true;
        self.anchor_key = Some(key);
    }

    /// Hide the popup. No-op when nothing is visible.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.renderer.hide();
        self.visible = false;
        self.anchor_key = None;
    }
}
