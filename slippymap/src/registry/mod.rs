//! Process-wide tile registry.
//!
//! Maps [`TileId`] to its single [`Tile`] instance with get-or-create
//! semantics. The registry owns every tile it creates for the life of the
//! process (no eviction); other components hold `Arc` references that never
//! outlive the registry's guarantees.
//!
//! The map is a sharded concurrent map, and load scheduling rides on the
//! tile's own state CAS, so concurrent calls racing on a new id create
//! exactly one `Tile` and enqueue exactly one download.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::coord::{self, CoordError, TileId};
use crate::pipeline::TileLoader;
use crate::tile::Tile;

/// Identity-keyed tile cache with get-or-create semantics.
///
/// Constructed explicitly at process start and torn down before the loader,
/// so worker threads drain while the tiles they reference are still alive.
pub struct TileRegistry {
    tiles: DashMap<TileId, Arc<Tile>>,
    loader: Arc<TileLoader>,
}

impl TileRegistry {
    /// Creates an empty registry backed by the given loader.
    pub fn new(loader: Arc<TileLoader>) -> Self {
        Self {
            tiles: DashMap::new(),
            loader,
        }
    }

    /// Returns the tile for `(zoom, x, y)`, creating and scheduling its
    /// load on first reference.
    ///
    /// Two calls with the same id return the identical instance, whether
    /// sequential or concurrent.
    pub fn get_or_create(&self, zoom: u8, x: i32, y: i32) -> Arc<Tile> {
        let id = TileId::new(zoom, x, y);
        let tile = self
            .tiles
            .entry(id)
            .or_insert_with(|| {
                debug!(tile = %id, "registering tile");
                Arc::new(Tile::new(id))
            })
            .value()
            .clone();
        // The Unloaded -> Fetching CAS inside schedule() makes this a no-op
        // for every caller but the first.
        self.loader.schedule(&tile);
        tile
    }

    /// Looks up the tile covering a geographic coordinate.
    pub fn get_or_create_by_coordinate(
        &self,
        zoom: u8,
        lat: f64,
        lon: f64,
    ) -> Result<Arc<Tile>, CoordError> {
        let id = coord::to_tile_id(lat, lon, zoom)?;
        Ok(self.get_or_create(id.zoom, id.x, id.y))
    }

    /// Returns the tile for `id` if it has been created.
    pub fn get(&self, id: TileId) -> Option<Arc<Tile>> {
        self.tiles.get(&id).map(|t| t.value().clone())
    }

    /// Number of tiles registered so far.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True if no tile has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The loader driving this registry's tiles.
    pub fn loader(&self) -> &Arc<TileLoader> {
        &self.loader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::LoaderConfig;
    use crate::provider::{MockHttpClient, ProviderError};
    use crate::texture::TextureHandle;

    fn test_registry(dir: &std::path::Path) -> (TileRegistry, Arc<MockHttpClient>) {
        let client = Arc::new(MockHttpClient::new(Err(ProviderError::Http(
            "offline".to_string(),
        ))));
        let loader = Arc::new(TileLoader::new(
            LoaderConfig {
                cache_dir: dir.to_path_buf(),
                remote_base_url: "http://tiles.test/osm".to_string(),
                workers: 2,
            },
            client.clone(),
        ));
        (TileRegistry::new(loader), client)
    }

    #[test]
    fn test_identity_stability_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, client) = test_registry(dir.path());

        let a = registry.get_or_create(16, 34150, 22508);
        let b = registry.get_or_create(16, 34150, 22508);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        registry.loader().shutdown();
        // One tile, one download, no matter how often it was requested.
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn test_identity_stability_concurrent() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, client) = test_registry(dir.path());
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.get_or_create(12, 2134, 1407))
            })
            .collect();
        let tiles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for tile in &tiles[1..] {
            assert!(Arc::ptr_eq(&tiles[0], tile));
        }
        assert_eq!(registry.len(), 1);

        registry.loader().shutdown();
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn test_get_or_create_by_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _client) = test_registry(dir.path());

        let tile = registry
            .get_or_create_by_coordinate(16, 50.356718, 7.599485)
            .unwrap();
        assert_eq!(tile.id(), TileId::new(16, 34150, 22508));

        // Same coordinate resolves to the same instance.
        let again = registry
            .get_or_create_by_coordinate(16, 50.356718, 7.599485)
            .unwrap();
        assert!(Arc::ptr_eq(&tile, &again));
    }

    #[test]
    fn test_by_coordinate_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _client) = test_registry(dir.path());

        assert!(registry.get_or_create_by_coordinate(16, 89.0, 0.0).is_err());
        assert!(registry.get_or_create_by_coordinate(0, 50.0, 7.0).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_neighbor_symmetry() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _client) = test_registry(dir.path());

        let center = registry.get_or_create(16, 34150, 22508);
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1), (3, -2), (-5, 4)] {
            let there = center.neighbor(&registry, dx, dy);
            let back = there.neighbor(&registry, -dx, -dy);
            assert_eq!(back.id(), center.id());
            assert!(Arc::ptr_eq(&back, &center));
        }
    }

    #[test]
    fn test_neighbor_sign_convention() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _client) = test_registry(dir.path());

        let center = registry.get_or_create(16, 100, 100);
        // "West" moves toward increasing x, "east" toward decreasing x;
        // north/south follow the y-grows-southward grid.
        assert_eq!(center.west(&registry).id(), TileId::new(16, 101, 100));
        assert_eq!(center.east(&registry).id(), TileId::new(16, 99, 100));
        assert_eq!(center.north(&registry).id(), TileId::new(16, 100, 99));
        assert_eq!(center.south(&registry).id(), TileId::new(16, 100, 101));
    }

    #[test]
    fn test_fresh_tiles_expose_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _client) = test_registry(dir.path());

        let tile = registry.get_or_create(16, 34150, 22508);
        assert_eq!(tile.texture(), TextureHandle::PLACEHOLDER);
    }

    #[test]
    fn test_get_returns_only_existing() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _client) = test_registry(dir.path());

        let id = TileId::new(10, 1, 2);
        assert!(registry.get(id).is_none());
        let created = registry.get_or_create(10, 1, 2);
        let found = registry.get(id).unwrap();
        assert!(Arc::ptr_eq(&created, &found));
    }
}
