//! Objects that may take over the whole screen.
//!
//! At most one artist should draw fullscreen at a time. Artists are held
//! weakly, so registering one never extends its lifetime; handles to
//! destroyed artists are pruned as they are found.

use tracing::{debug, warn};
use vizkit_core::{retain_valid, WeakHandle};

pub trait FullscreenArtist {
    fn disable_fullscreen_drawing(&mut self);
}

#[derive(Default)]
pub struct FullscreenArtists {
    artists: Vec<WeakHandle<dyn FullscreenArtist>>,
}

impl FullscreenArtists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, artist: WeakHandle<dyn FullscreenArtist>) {
        self.prune();
        if self.artists.iter().any(|a| a.unique_id() == artist.unique_id()) {
            return;
        }
        self.artists.push(artist);
    }

    /// Drop handles whose artist no longer exists.
    pub fn prune(&mut self) {
        let before = self.artists.len();
        retain_valid(&mut self.artists);
        let pruned = before - self.artists.len();
        if pruned > 0 {
            debug!(pruned, "dropped expired fullscreen artists");
        }
    }

    /// Number of artists still alive.
    pub fn len(&self) -> usize {
        self.artists.iter().filter(|a| a.is_valid()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn disable_all(&mut self) {
        self.disable_where(|_| true);
    }

    /// Disable every artist but the one with ID `keep`, typically the artist
    /// that is about to go fullscreen.
    pub fn disable_all_except(&mut self, keep: u64) {
        self.disable_where(|id| id != keep);
    }

    fn disable_where(&mut self, mut pred: impl FnMut(u64) -> bool) {
        self.prune();
        for artist in &self.artists {
            if !pred(artist.unique_id()) {
                continue;
            }
            if let Err(err) = artist.with_mut(|a| a.disable_fullscreen_drawing()) {
                // Typically the artist is mid-call and asked for this itself.
                warn!(id = artist.unique_id(), %err, "could not disable fullscreen artist");
            }
        }
    }
}
