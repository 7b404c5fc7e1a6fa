use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{NetworkError, Result};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one `WeightArena`. Two arenas never share an id, even when one
/// was produced by duplicating the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArenaId(u64);

/// Stable handle to one scalar parameter inside a `WeightArena`.
///
/// Nodes hold handles rather than values, so two nodes holding the same
/// `WeightId` genuinely share the parameter (tied weights, convolution kernels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeightId(usize);

impl WeightId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Slot storage for every trainable scalar of one or more networks.
///
/// Not `Clone`: use [`WeightArena::duplicate`], which hands out a
/// fresh identity so a copy can never be mistaken for the original.
#[derive(Debug)]
pub struct WeightArena {
    id: ArenaId,
    values: Vec<f64>,
}

impl WeightArena {
    pub fn new() -> WeightArena {
        WeightArena {
            id: ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed)),
            values: Vec::new(),
        }
    }

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Allocates a new slot holding `value`.
    pub fn alloc(&mut self, value: f64) -> WeightId {
        self.values.push(value);
        WeightId(self.values.len() - 1)
    }

    pub fn get(&self, id: WeightId) -> Result<f64> {
        self.values
            .get(id.0)
            .copied()
            .ok_or_else(|| dangling(id, self.values.len()))
    }

    pub fn get_mut(&mut self, id: WeightId) -> Result<&mut f64> {
        let len = self.values.len();
        self.values.get_mut(id.0).ok_or_else(|| dangling(id, len))
    }

    pub fn set(&mut self, id: WeightId, value: f64) -> Result<()> {
        *self.get_mut(id)? = value;
        Ok(())
    }

    /// Copies every value into a new arena with its own identity.
    pub fn duplicate(&self) -> WeightArena {
        WeightArena {
            values: self.values.clone(),
            ..WeightArena::new()
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Default for WeightArena {
    fn default() -> Self {
        WeightArena::new()
    }
}

fn dangling(id: WeightId, len: usize) -> NetworkError {
    NetworkError::InvariantViolation(format!(
        "weight handle {} points outside an arena of {} slots",
        id.0, len
    ))
}
