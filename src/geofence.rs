//! # Geofence Engine
//!
//! Decides which cluster popup is showing as the head moves along the route.
//!
//! Clusters are ordered by route fraction and walked with a sequential cursor:
//!
//! - `next_index` only moves forward during playback. Clusters behind it are never
//!   examined again, so a route that passes an earlier marker a second time cannot
//!   re-open its popup.
//! - `active_index` is the cluster whose popup is open. It closes once the phase
//!   leaves the window widened by the exit buffer, and the cursor moves past it.
//! - The cursor is re-derived from the phase only on an inactive → active
//!   transition (resume) or an explicit [`GeofenceEngine::recalibrate`] (seek).

use log::debug;

use crate::cluster::Cluster;
use crate::popup::{PopupLayer, PopupRenderer};

/// Popup transition caused by a geofence update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceEvent {
    Shown { cluster: usize },
    Hidden { cluster: usize },
}

/// Sequential-cursor geofence over an ordered cluster list.
#[derive(Debug, Clone)]
pub struct GeofenceEngine {
    clusters: Vec<Cluster>,
    exit_buffer: f64,
    next_index: usize,
    active_index: Option<usize>,
    active: bool,
}

impl GeofenceEngine {
    /// `clusters` must be ordered by route fraction (as produced by
    /// [`cluster_marks`](crate::cluster_marks)). `exit_buffer` is in route fraction.
    pub fn new(clusters: Vec<Cluster>, exit_buffer: f64) -> Self {
        Self {
            clusters,
            exit_buffer: exit_buffer.max(0.0),
            next_index: 0,
            active_index: None,
            active: false,
        }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn active_cluster(&self) -> Option<&Cluster> {
        self.active_index.map(|i| &self.clusters[i])
    }

    /// Evaluate the geofences for the head at `phase`.
    ///
    /// `active` is false while playback is paused: the popup closes and the cursor
    /// stays where it is.
    pub fn update_head_position<R: PopupRenderer>(
        &mut self,
        phase: f64,
        active: bool,
        popup: &mut PopupLayer<R>,
    ) -> Option<GeofenceEvent> {
        if !active {
            self.active = false;
            popup.hide();
            return self
                .active_index
                .take()
                .map(|cluster| GeofenceEvent::Hidden { cluster });
        }

        if !self.active {
            self.active = true;
            self.seek_cursor(phase);
        }

        if let Some(i) = self.active_index {
            let cluster = &self.clusters[i];
            if cluster.window.expanded(self.exit_buffer).contains(phase) {
                // Still inside: the dedup layer turns this into a no-op.
                popup.show(cluster.anchor(), &cluster.popup_content());
                return None;
            }

            popup.hide();
            self.active_index = None;
            self.next_index = i + 1;
            debug!("[Geofence] Left cluster {} at phase {:.4}", i, phase);
            return Some(GeofenceEvent::Hidden { cluster: i });
        }

        while let Some(cluster) = self.clusters.get(self.next_index) {
            if cluster.window.contains(phase) {
                popup.show(cluster.anchor(), &cluster.popup_content());
                self.active_index = Some(self.next_index);
                debug!("[Geofence] Entered cluster {} at phase {:.4}", self.next_index, phase);
                return Some(GeofenceEvent::Shown { cluster: self.next_index });
            }
            if phase > cluster.window.end {
                self.next_index += 1;
            } else {
                break;
            }
        }
        None
    }

    /// Close the popup and re-derive the cursor from `phase` (after a seek).
    pub fn recalibrate<R: PopupRenderer>(&mut self, phase: f64, popup: &mut PopupLayer<R>) {
        popup.hide();
        self.seek_cursor(phase);
    }

    /// Close the popup and rewind the cursor to the first cluster.
    pub fn reset_popup<R: PopupRenderer>(&mut self, popup: &mut PopupLayer<R>) {
        popup.hide();
        self.next_index = 0;
        self.active_index = None;
        self.active = false;
    }

    fn seek_cursor(&mut self, phase: f64) {
        self.active_index = None;
        self.next_index = self
            .clusters
            .iter()
            .position(|c| c.window.end >= phase)
            .unwrap_or(self.clusters.len());
        debug!("[Geofence] Cursor recalibrated to {} at phase {:.4}", self.next_index, phase);
    }
}
