//! Shortest-path routing over the [`RoadNetwork`].
//!
//! [`RoutingEngine`] owns the network and answers distance queries with
//! Dijkstra's algorithm (all road costs are positive). Answers are memoised in
//! a bounded LRU cache keyed by the unordered location pair, so
//! `shortest_distance(a, b)` and `shortest_distance(b, a)` always agree.
//!
//! An unreachable destination is reported as `None`. Callers treat it as
//! "ineligible", never as a distance.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use pathfinding::prelude::dijkstra;

use crate::network::{LocationId, Minutes, RoadNetwork};

/// Default number of memoised location pairs.
pub const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 1_024;

#[derive(Resource)]
pub struct RoutingEngine {
    network: RoadNetwork,
    cache: Mutex<LruCache<(LocationId, LocationId), Option<Minutes>>>,
}

impl RoutingEngine {
    pub fn new(network: RoadNetwork) -> Self {
        Self::with_cache_capacity(network, DEFAULT_ROUTE_CACHE_CAPACITY)
    }

    /// Build an engine memoising at most `capacity` pairs (minimum one).
    pub fn with_cache_capacity(network: RoadNetwork, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            network,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Minimum total road cost between two locations, or `None` if either
    /// location is unknown or no path joins them.
    pub fn shortest_distance(&self, from: LocationId, to: LocationId) -> Option<Minutes> {
        if !self.network.contains(from) || !self.network.contains(to) {
            return None;
        }
        if from == to {
            return Some(0);
        }

        let key = if from <= to { (from, to) } else { (to, from) };
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return *hit;
            }
        }

        let distance = self.shortest_path(key.0, key.1).map(|(_, cost)| cost);
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, distance);
        }
        distance
    }

    /// Full path (both endpoints included) and its cost. Not cached.
    pub fn shortest_path(
        &self,
        from: LocationId,
        to: LocationId,
    ) -> Option<(Vec<LocationId>, Minutes)> {
        if !self.network.contains(from) || !self.network.contains(to) {
            return None;
        }
        dijkstra(
            &from,
            |node: &LocationId| {
                self.network
                    .neighbors(*node)
                    .iter()
                    .map(|road| (road.to, road.minutes))
            },
            |node| *node == to,
        )
    }

    /// Number of memoised pairs (for diagnostics and tests).
    pub fn cached_pairs(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("locations", &self.network.location_count())
            .field("cached_pairs", &self.cached_pairs())
            .finish()
    }
}
