/// Dense `u32` index allocator backing one registry's slot array.
///
/// Shaders, compute shaders, pipeline layouts, graphics states and vertex
/// input declarations each own an allocator, so a `RenderHandle` index is
/// only meaningful together with its kind. Released indices are handed out
/// again most-recent-first. There is no generation counter: a stale handle
/// whose index was recycled resolves to the new occupant.
#[derive(Debug, Default)]
pub struct SlotAllocator {
    occupied: Vec<bool>,
    recycled: Vec<u32>,
    live_count: u32,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a recycled index if one is waiting, otherwise grow by one
    pub fn alloc(&mut self) -> u32 {
        let index = match self.recycled.pop() {
            Some(index) => index,
            None => {
                self.occupied.push(false);
                self.high_water_mark() - 1
            }
        };
        self.occupied[index as usize] = true;
        self.live_count += 1;
        index
    }

    /// Release `index` for reuse.
    ///
    /// Releasing an index that is not live is refused and returns false, so a
    /// double destroy never queues the same index twice.
    pub fn free(&mut self, index: u32) -> bool {
        let Some(slot) = self.occupied.get_mut(index as usize) else {
            return false;
        };
        if !*slot {
            return false;
        }
        *slot = false;
        self.live_count -= 1;
        self.recycled.push(index);
        true
    }

    pub fn is_live(&self, index: u32) -> bool {
        matches!(self.occupied.get(index as usize), Some(true))
    }

    /// One past the largest index ever handed out; registries size their
    /// slot arrays to this.
    pub fn high_water_mark(&self) -> u32 {
        self.occupied.len() as u32
    }

    pub fn len(&self) -> u32 {
        self.live_count
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
