//! Road network: named locations joined by undirected weighted roads.
//!
//! The network is built once from configuration and never mutated. Roads are
//! stored as an adjacency table (one edge list per location) so shortest-path
//! queries only ever borrow it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Travel cost and durations, in simulated minutes (one tick each).
pub type Minutes = u32;

/// Dense index of a location inside a [`RoadNetwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub usize);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A named place on the map. Coordinates are for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Location {
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

/// One direction of an undirected road, as stored in the adjacency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Road {
    pub to: LocationId,
    pub minutes: Minutes,
}

#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    locations: Vec<Location>,
    adjacency: Vec<Vec<Road>>,
}

impl RoadNetwork {
    /// Build the network from locations and `(from, to, minutes)` road triples.
    ///
    /// Each triple adds the road in both directions. Roads must join two
    /// distinct known locations and cost at least one minute.
    pub fn new<I>(locations: Vec<Location>, roads: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (usize, usize, Minutes)>,
    {
        if locations.is_empty() {
            return Err(ConfigError::NoLocations);
        }

        let mut adjacency = vec![Vec::new(); locations.len()];
        for (from, to, minutes) in roads {
            if from >= locations.len() || to >= locations.len() {
                return Err(ConfigError::UnknownRoadEndpoint { from, to });
            }
            if from == to {
                return Err(ConfigError::SelfLoop(from));
            }
            if minutes == 0 {
                return Err(ConfigError::NonPositiveRoadCost { from, to });
            }
            adjacency[from].push(Road {
                to: LocationId(to),
                minutes,
            });
            adjacency[to].push(Road {
                to: LocationId(from),
                minutes,
            });
        }

        Ok(Self {
            locations,
            adjacency,
        })
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn contains(&self, id: LocationId) -> bool {
        id.0 < self.locations.len()
    }

    /// Resolve a raw index into a [`LocationId`], if it names a location.
    pub fn location_id(&self, index: usize) -> Option<LocationId> {
        (index < self.locations.len()).then_some(LocationId(index))
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.0)
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Roads leaving `id`. Empty for unknown locations.
    pub fn neighbors(&self, id: LocationId) -> &[Road] {
        self.adjacency.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every road once, as `(lower, higher, minutes)`.
    pub fn roads(&self) -> impl Iterator<Item = (LocationId, LocationId, Minutes)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(from, edges)| {
            edges
                .iter()
                .filter(move |road| from < road.to.0)
                .map(move |road| (LocationId(from), road.to, road.minutes))
        })
    }
}
