//! Pending emergencies: a bounded binary max-heap on priority.
//!
//! Equal priorities resolve to the lower (earlier) emergency id, so calls of
//! the same urgency are served in the order they came in.

use bevy_ecs::prelude::Resource;

use crate::emergency::Emergency;
use crate::error::DispatchError;

#[derive(Debug, Clone, Resource)]
pub struct EmergencyQueue {
    heap: Vec<Emergency>,
    capacity: usize,
}

/// `a` belongs above `b` in the heap.
fn outranks(a: &Emergency, b: &Emergency) -> bool {
    a.priority > b.priority || (a.priority == b.priority && a.id < b.id)
}

impl EmergencyQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert and sift up. Fails without touching the queue when it is full.
    pub fn enqueue(&mut self, emergency: Emergency) -> Result<(), DispatchError> {
        if self.is_full() {
            return Err(DispatchError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.heap.push(emergency);
        self.sift_up(self.heap.len() - 1);
        Ok(())
    }

    /// Remove the most urgent case: the last element replaces the root and
    /// sifts down.
    pub fn dequeue(&mut self) -> Result<Emergency, DispatchError> {
        if self.heap.is_empty() {
            return Err(DispatchError::EmptyQueue);
        }
        let top = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok(top)
    }

    pub fn peek(&self) -> Option<&Emergency> {
        self.heap.first()
    }

    /// Entries in heap (array) order, not sorted.
    pub fn iter(&self) -> impl Iterator<Item = &Emergency> {
        self.heap.iter()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every parent has priority at least that of its children.
    pub fn satisfies_heap_order(&self) -> bool {
        (1..self.heap.len()).all(|i| self.heap[(i - 1) / 2].priority >= self.heap[i].priority)
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !outranks(&self.heap[i], &self.heap[parent]) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut top = i;
            if left < len && outranks(&self.heap[left], &self.heap[top]) {
                top = left;
            }
            if right < len && outranks(&self.heap[right], &self.heap[top]) {
                top = right;
            }
            if top == i {
                break;
            }
            self.heap.swap(i, top);
            i = top;
        }
    }
}
