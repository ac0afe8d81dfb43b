//! Render Resource Arena
//!
//! Every GPU-side or listener resource a backend creates is registered here
//! and referenced by a typed handle. Teardown drains the arena in one pass, so
//! nothing acquired during start can outlive the scene.

use serde::{Deserialize, Serialize};

/// What a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
    Font,
    RenderTarget,
    /// Input or resize listener.
    Listener,
}

/// Generational index into a [`ResourceArena`].
///
/// A handle stays invalid after its slot is released, even if the slot is
/// later reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    index: u32,
    generation: u32,
}

impl ResourceHandle {
    pub fn index(self) -> u32 {
        self.index
    }
}

/// A live resource as recorded by the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub handle: ResourceHandle,
    pub kind: ResourceKind,
    /// Human-readable label, used in logs.
    pub label: String,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<(ResourceKind, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ResourceKind, label: impl Into<String>) -> ResourceHandle {
        let entry = Some((kind, label.into()));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            return ResourceHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry,
        });
        ResourceHandle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: ResourceHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.entry.is_some())
    }

    pub fn is_live(&self, handle: ResourceHandle) -> bool {
        self.slot(handle).is_some()
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<ResourceEntry> {
        self.slot(handle).and_then(|slot| {
            slot.entry.as_ref().map(|(kind, label)| ResourceEntry {
                handle,
                kind: *kind,
                label: label.clone(),
            })
        })
    }

    /// Release a single resource. Returns `None` for stale handles.
    pub fn release(&mut self, handle: ResourceHandle) -> Option<ResourceEntry> {
        let entry = self.get(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(entry)
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn count_by_kind(&self, kind: ResourceKind) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(&s.entry, Some((k, _)) if *k == kind))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Release everything, returning what was live in registration-slot order.
    pub fn drain(&mut self) -> Vec<ResourceEntry> {
        let mut drained = Vec::with_capacity(self.live_count());
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some((kind, label)) = slot.entry.take() {
                drained.push(ResourceEntry {
                    handle: ResourceHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    kind,
                    label,
                });
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        drained
    }
}
