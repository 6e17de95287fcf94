use std::sync::Arc;

use image::RgbaImage;

use crate::snapshot::{ImageSnapshot, SnapshotId, SnapshotResult};

/// Decoded pixels for the snapshot currently on screen.
///
/// Holds at most one buffer; asking for another snapshot releases the old one first.
#[derive(Debug, Default)]
pub struct DisplayCache {
    entry: Option<(SnapshotId, Arc<RgbaImage>)>,
}

impl DisplayCache {
    pub fn pixels_for(&mut self, snapshot: &ImageSnapshot) -> SnapshotResult<Arc<RgbaImage>> {
        if let Some((id, pixels)) = &self.entry {
            if *id == snapshot.id() {
                return Ok(Arc::clone(pixels));
            }
        }

        if let Some((previous, _)) = self.entry.take() {
            tracing::trace!(snapshot = %previous, "display buffer released");
        }
        let pixels = Arc::new(snapshot.decode()?);
        self.entry = Some((snapshot.id(), Arc::clone(&pixels)));
        Ok(pixels)
    }

    pub fn cached_id(&self) -> Option<SnapshotId> {
        self.entry.as_ref().map(|(id, _)| *id)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::solid_snapshot;

    #[test]
    fn repeated_requests_reuse_the_decoded_buffer() {
        let snapshot = solid_snapshot(2, 2, [1, 1, 1, 255]);
        let mut cache = DisplayCache::default();
        let first = cache.pixels_for(&snapshot).expect("decode");
        let second = cache.pixels_for(&snapshot).expect("decode");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn switching_snapshot_releases_previous_buffer() {
        let first = solid_snapshot(2, 2, [1, 1, 1, 255]);
        let second = solid_snapshot(2, 2, [2, 2, 2, 255]);
        let mut cache = DisplayCache::default();

        let held = cache.pixels_for(&first).expect("decode");
        cache.pixels_for(&second).expect("decode");
        assert_eq!(Arc::strong_count(&held), 1);
        assert_eq!(cache.cached_id(), Some(second.id()));

        cache.clear();
        assert_eq!(cache.cached_id(), None);
    }
}
