use serde::{Deserialize, Serialize};

use crate::network::{Location, Minutes};
use crate::priority::Disease;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadConfig {
    pub from: usize,
    pub to: usize,
    pub minutes: Minutes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalConfig {
    pub name: String,
    pub location: usize,
    pub capacity: u32,
    pub specialty: Disease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbulanceConfig {
    pub location: usize,
    /// Index into [`CityConfig::hospitals`].
    pub base_hospital: usize,
}

/// Static description of a city: map, hospitals and the starting fleet.
/// Ambulance ids are assigned from 1 in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityConfig {
    pub locations: Vec<Location>,
    #[serde(default)]
    pub roads: Vec<RoadConfig>,
    #[serde(default)]
    pub hospitals: Vec<HospitalConfig>,
    #[serde(default)]
    pub ambulances: Vec<AmbulanceConfig>,
}

impl CityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, name: impl Into<String>, x: i32, y: i32) -> Self {
        self.locations.push(Location::new(name, x, y));
        self
    }

    pub fn with_road(mut self, from: usize, to: usize, minutes: Minutes) -> Self {
        self.roads.push(RoadConfig { from, to, minutes });
        self
    }

    pub fn with_hospital(
        mut self,
        name: impl Into<String>,
        location: usize,
        capacity: u32,
        specialty: Disease,
    ) -> Self {
        self.hospitals.push(HospitalConfig {
            name: name.into(),
            location,
            capacity,
            specialty,
        });
        self
    }

    pub fn with_ambulance(mut self, location: usize, base_hospital: usize) -> Self {
        self.ambulances.push(AmbulanceConfig {
            location,
            base_hospital,
        });
        self
    }

    /// Ten-location demo city with four hospitals and five ambulances.
    pub fn sample() -> Self {
        let mut city = Self::new()
            .with_location("City Center", 0, 0)
            .with_location("Main Street", 4, 0)
            .with_location("Park Avenue", 10, 0)
            .with_location("Shopping Mall", 15, 0)
            .with_location("University", 18, 0)
            .with_location("Airport", 25, 0)
            .with_location("North Market", 0, 8)
            .with_location("Residential", 4, 8)
            .with_location("Industrial Zone", 30, 0)
            .with_location("Tech Park", 33, 0);
        for (from, to, minutes) in [
            (0, 1, 4),
            (1, 2, 6),
            (2, 3, 5),
            (3, 4, 3),
            (4, 5, 7),
            (1, 5, 10),
            (0, 6, 8),
            (6, 7, 4),
            (7, 3, 6),
            (5, 8, 5),
            (8, 9, 3),
        ] {
            city = city.with_road(from, to, minutes);
        }
        city.with_hospital("City General", 0, 10, Disease::General)
            .with_hospital("Heart Center", 5, 5, Disease::Cardiac)
            .with_hospital("Trauma Unit", 9, 8, Disease::Trauma)
            .with_hospital("Children's Hospital", 6, 6, Disease::Respiratory)
            .with_ambulance(1, 0)
            .with_ambulance(4, 0)
            .with_ambulance(7, 0)
            .with_ambulance(0, 0)
            .with_ambulance(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_city_shape() {
        let city = CityConfig::sample();
        assert_eq!(city.locations.len(), 10);
        assert_eq!(city.roads.len(), 11);
        assert_eq!(city.hospitals.len(), 4);
        assert_eq!(city.ambulances.len(), 5);
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{
            "locations": [{ "name": "Depot" }, { "name": "Harbor", "x": 3, "y": 1 }],
            "roads": [{ "from": 0, "to": 1, "minutes": 6 }],
            "hospitals": [{ "name": "Bay", "location": 1, "capacity": 4, "specialty": "trauma" }],
            "ambulances": [{ "location": 0, "base_hospital": 0 }]
        }"#;
        let city: CityConfig = serde_json::from_str(json).expect("city");
        assert_eq!(city.locations[1], Location::new("Harbor", 3, 1));
        assert_eq!(city.hospitals[0].specialty, Disease::Trauma);
        assert_eq!(city.roads[0].minutes, 6);
    }
}
