//! Emergencies and the active (dispatched) roster.

use std::fmt;

use bevy_ecs::prelude::{Entity, Resource};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::network::{LocationId, Minutes};
use crate::priority::{Criticality, Disease, Priority};

/// Monotonic, unique case number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmergencyId(pub u64);

impl fmt::Display for EmergencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:03}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emergency {
    pub id: EmergencyId,
    pub caller: String,
    pub location: LocationId,
    pub disease: Disease,
    pub age: u32,
    pub criticality: Option<Criticality>,
    pub priority: Priority,
    /// Ambulance entity currently assigned, once dispatched.
    pub assigned_ambulance: Option<Entity>,
    /// Cleared when the crew reaches the scene; a locked case is never reassigned.
    pub reassignable: bool,
    pub reported_at: u64,
    pub service_minutes: Minutes,
    /// Travel minutes credited to the response-time total at dispatch.
    pub response_minutes: Option<Minutes>,
}

/// Inbound call, before validation and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyReport {
    pub caller: String,
    pub location: usize,
    pub disease: Disease,
    pub age: u32,
    #[serde(default)]
    pub criticality: Option<Criticality>,
}

impl EmergencyReport {
    pub fn new(caller: impl Into<String>, location: usize, disease: Disease, age: u32) -> Self {
        Self {
            caller: caller.into(),
            location,
            disease,
            age,
            criticality: None,
        }
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = Some(criticality);
        self
    }
}

/// Hands out case numbers, starting at 1.
#[derive(Debug, Resource)]
pub struct EmergencyIdGenerator {
    next: u64,
}

impl Default for EmergencyIdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EmergencyIdGenerator {
    pub fn next_id(&mut self) -> EmergencyId {
        let id = EmergencyId(self.next);
        self.next += 1;
        id
    }
}

/// Dispatched cases, kept in dispatch order until delivered.
#[derive(Debug, Resource)]
pub struct ActiveEmergencies {
    entries: Vec<Emergency>,
    capacity: usize,
}

impl ActiveEmergencies {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn insert(&mut self, emergency: Emergency) -> Result<(), DispatchError> {
        if self.is_full() {
            return Err(DispatchError::ActiveSetFull {
                capacity: self.capacity,
            });
        }
        debug_assert!(
            self.get(emergency.id).is_none(),
            "emergency {} is already active",
            emergency.id
        );
        self.entries.push(emergency);
        Ok(())
    }

    /// Remove a case, preserving the order of the rest.
    pub fn remove(&mut self, id: EmergencyId) -> Option<Emergency> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: EmergencyId) -> Option<&Emergency> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EmergencyId) -> Option<&mut Emergency> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Emergency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
pub(crate) fn sample_emergency(id: u64, priority: Priority) -> Emergency {
    Emergency {
        id: EmergencyId(id),
        caller: format!("caller-{id}"),
        location: LocationId(0),
        disease: Disease::General,
        age: 40,
        criticality: None,
        priority,
        assigned_ambulance: None,
        reassignable: true,
        reported_at: 0,
        service_minutes: 3,
        response_minutes: None,
    }
}
