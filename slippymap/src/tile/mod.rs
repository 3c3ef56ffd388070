//! The tile entity: immutable identity plus a mutable display handle.
//!
//! A `Tile` is created once by the [`TileRegistry`](crate::registry::TileRegistry)
//! and lives for the rest of the process. Its identity never changes; its
//! texture handle starts as the placeholder and is swapped in by the
//! fetch/decode pipeline. Both the handle and the load state are atomics:
//! workers write them, the render thread reads them every frame.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use crate::coord::TileId;
use crate::registry::TileRegistry;
use crate::texture::TextureHandle;

/// Pipeline state of a tile's image.
///
/// `Unloaded → Fetching → Decoding → Ready`, with `Failed` absorbing any
/// error. A failed tile keeps the placeholder handle for the rest of the
/// session; there is no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadState {
    /// No load has been scheduled yet.
    Unloaded = 0,
    /// A download task is queued or running on a worker.
    Fetching = 1,
    /// Bytes are on disk, waiting for the render thread to decode.
    Decoding = 2,
    /// A real texture handle is assigned.
    Ready = 3,
    /// Fetch or decode failed; the placeholder handle is terminal.
    Failed = 4,
}

impl LoadState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LoadState::Unloaded,
            1 => LoadState::Fetching,
            2 => LoadState::Decoding,
            3 => LoadState::Ready,
            _ => LoadState::Failed,
        }
    }
}

/// One map tile: identity, display handle, load state.
#[derive(Debug)]
pub struct Tile {
    id: TileId,
    texture: AtomicU32,
    state: AtomicU8,
}

impl Tile {
    /// Creates a tile in the `Unloaded` state with the placeholder handle.
    pub fn new(id: TileId) -> Self {
        Self {
            id,
            texture: AtomicU32::new(TextureHandle::PLACEHOLDER.0),
            state: AtomicU8::new(LoadState::Unloaded as u8),
        }
    }

    /// The tile's immutable identity.
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Current display handle; the placeholder until the pipeline is `Ready`.
    pub fn texture(&self) -> TextureHandle {
        TextureHandle(self.texture.load(Ordering::Acquire))
    }

    /// Assigns the decoded display handle.
    pub fn set_texture(&self, handle: TextureHandle) {
        self.texture.store(handle.0, Ordering::Release);
    }

    /// Current pipeline state.
    pub fn state(&self) -> LoadState {
        LoadState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Unconditionally moves to `state`.
    pub fn set_state(&self, state: LoadState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Moves from `from` to `to` if the tile is currently in `from`.
    ///
    /// Returns true if this caller performed the transition. Concurrent
    /// schedulers racing on the same tile serialize here: exactly one wins.
    pub fn transition(&self, from: LoadState, to: LoadState) -> bool {
        self.state
            .compare_exchange(
                from as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Terminal failure: revert to the placeholder handle.
    pub fn fail(&self) {
        self.set_texture(TextureHandle::PLACEHOLDER);
        self.set_state(LoadState::Failed);
    }

    /// The tile at `(x + dx, y + dy)` on the same zoom level, created
    /// through the registry if it does not exist yet. Never returns null;
    /// ids outside `[0, 2^zoom)` are a caller error.
    pub fn neighbor(&self, registry: &TileRegistry, dx: i32, dy: i32) -> Arc<Tile> {
        registry.get_or_create(self.id.zoom, self.id.x + dx, self.id.y + dy)
    }

    /// Neighbor toward decreasing x.
    ///
    /// Note the sign convention: "east" moves toward decreasing x and
    /// "west" toward increasing x. The renderer's screen-offset math is
    /// tuned to this screen-space axis flip; it is deliberate.
    pub fn east(&self, registry: &TileRegistry) -> Arc<Tile> {
        self.neighbor(registry, -1, 0)
    }

    /// Neighbor toward increasing x.
    pub fn west(&self, registry: &TileRegistry) -> Arc<Tile> {
        self.neighbor(registry, 1, 0)
    }

    /// Neighbor toward decreasing y.
    pub fn north(&self, registry: &TileRegistry) -> Arc<Tile> {
        self.neighbor(registry, 0, -1)
    }

    /// Neighbor toward increasing y.
    pub fn south(&self, registry: &TileRegistry) -> Arc<Tile> {
        self.neighbor(registry, 0, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_tile_has_placeholder() {
        let tile = Tile::new(TileId::new(16, 34150, 22508));
        assert_eq!(tile.texture(), TextureHandle::PLACEHOLDER);
        assert_eq!(tile.state(), LoadState::Unloaded);
    }

    #[test]
    fn test_transition_is_exclusive() {
        let tile = Tile::new(TileId::new(5, 1, 1));
        assert!(tile.transition(LoadState::Unloaded, LoadState::Fetching));
        // Second scheduler loses the race.
        assert!(!tile.transition(LoadState::Unloaded, LoadState::Fetching));
        assert_eq!(tile.state(), LoadState::Fetching);
    }

    #[test]
    fn test_fail_reverts_to_placeholder() {
        let tile = Tile::new(TileId::new(5, 1, 1));
        tile.set_texture(TextureHandle(42));
        tile.fail();
        assert_eq!(tile.texture(), TextureHandle::PLACEHOLDER);
        assert_eq!(tile.state(), LoadState::Failed);
    }

    #[test]
    fn test_state_roundtrip() {
        let tile = Tile::new(TileId::new(3, 0, 0));
        for state in [
            LoadState::Fetching,
            LoadState::Decoding,
            LoadState::Ready,
            LoadState::Failed,
        ] {
            tile.set_state(state);
            assert_eq!(tile.state(), state);
        }
    }
}
