//! Hospitals, bed accounting and hospital selection.

use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::network::LocationId;
use crate::priority::Disease;
use crate::routing::RoutingEngine;

/// Score per minute of travel from the scene.
const DISTANCE_WEIGHT: i64 = 10;
/// Score discount when the hospital's specialty matches the case.
const SPECIALTY_BONUS: i64 = 50;

/// Position of a hospital in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HospitalIndex(pub usize);

impl fmt::Display for HospitalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hospital {
    pub name: String,
    pub location: LocationId,
    pub specialty: Disease,
    capacity: u32,
    occupied: u32,
}

impl Hospital {
    pub fn new(name: impl Into<String>, location: LocationId, capacity: u32, specialty: Disease) -> Self {
        Self {
            name: name.into(),
            location,
            specialty,
            capacity,
            occupied: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupied(&self) -> u32 {
        self.occupied
    }

    pub fn has_free_bed(&self) -> bool {
        self.occupied < self.capacity
    }
}

/// Every hospital in the city, in configuration order.
#[derive(Debug, Clone, Default, Resource)]
pub struct HospitalRegistry {
    hospitals: Vec<Hospital>,
}

impl HospitalRegistry {
    pub fn new(hospitals: Vec<Hospital>) -> Self {
        Self { hospitals }
    }

    pub fn get(&self, index: HospitalIndex) -> Option<&Hospital> {
        self.hospitals.get(index.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HospitalIndex, &Hospital)> {
        self.hospitals
            .iter()
            .enumerate()
            .map(|(i, hospital)| (HospitalIndex(i), hospital))
    }

    pub fn len(&self) -> usize {
        self.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hospitals.is_empty()
    }

    /// Claim a bed. Returns `false` (and changes nothing) when the hospital is
    /// full or unknown.
    pub fn reserve_bed(&mut self, index: HospitalIndex) -> bool {
        match self.hospitals.get_mut(index.0) {
            Some(hospital) if hospital.has_free_bed() => {
                hospital.occupied += 1;
                true
            }
            _ => false,
        }
    }

    /// Give back a bed, never going below zero.
    pub fn release_bed(&mut self, index: HospitalIndex) {
        if let Some(hospital) = self.hospitals.get_mut(index.0) {
            hospital.occupied = hospital.occupied.saturating_sub(1);
        }
    }

    /// Discharge one patient from every occupied hospital.
    pub fn discharge_one_each(&mut self) -> Vec<HospitalIndex> {
        let mut discharged = Vec::new();
        for (i, hospital) in self.hospitals.iter_mut().enumerate() {
            if hospital.occupied > 0 {
                hospital.occupied -= 1;
                discharged.push(HospitalIndex(i));
            }
        }
        discharged
    }

    pub fn total_beds(&self) -> u32 {
        self.hospitals.iter().map(Hospital::capacity).sum()
    }

    pub fn used_beds(&self) -> u32 {
        self.hospitals.iter().map(Hospital::occupied).sum()
    }
}

/// Best hospital for a case at `location`.
///
/// Only hospitals with a free bed and a road route are considered. Score is
/// `distance * 10`, minus 50 for a specialty match; lowest wins and ties go
/// to the first hospital in registry order.
pub fn select_best_hospital(
    registry: &HospitalRegistry,
    routing: &RoutingEngine,
    location: LocationId,
    disease: Disease,
) -> Option<HospitalIndex> {
    let mut best: Option<(HospitalIndex, i64)> = None;
    for (index, hospital) in registry.iter() {
        if !hospital.has_free_bed() {
            continue;
        }
        let Some(distance) = routing.shortest_distance(location, hospital.location) else {
            continue;
        };
        let mut score = i64::from(distance) * DISTANCE_WEIGHT;
        if hospital.specialty == disease {
            score -= SPECIALTY_BONUS;
        }
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}
