use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Bytes served from the pool before falling back to the heap.
pub const POOL_SIZE: usize = 1024;
/// Largest single request the heap fallback accepts.
pub const HEAP_LIMIT: usize = 0x10000;
const ALIGN: usize = 8;

/// ## Scoped node pool
///
/// Values live in generation-checked slots. Each allocation also
/// reserves its size in a fixed budget of `POOL_SIZE` bytes managed
/// with a best-fit free list; a request which does not fit is served
/// from the heap when it is smaller than `HEAP_LIMIT`. Dropping the
/// pool releases everything it still holds.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Pool,
    Heap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Allocations served by the pool so far.
    pub pool: usize,
    /// Allocations which fell back to the heap so far.
    pub heap: usize,
    /// Allocations not yet freed.
    pub live: usize,
    /// Pool bytes currently reserved.
    pub used: usize,
}

#[derive(Debug)]
struct Block {
    offset: usize,
    len: usize,
    free: bool,
}

#[derive(Debug, Clone, Copy)]
enum Region {
    Pool(usize),
    Heap(usize),
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<(T, Region)>,
}

#[derive(Debug)]
pub struct Pool<T> {
    blocks: Vec<Block>,
    slots: Vec<Slot<T>>,
    vacant: Vec<u32>,
    stats: Stats,
}

impl<T> Default for Pool<T> {
    fn default() -> Pool<T> {
        Pool::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Pool<T> {
        Pool {
            blocks: vec![Block {
                offset: 0,
                len: POOL_SIZE,
                free: true,
            }],
            slots: vec![],
            vacant: vec![],
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn alloc(&mut self, value: T, size: usize) -> Result<Handle> {
        let len = (size.max(1) + ALIGN - 1) & !(ALIGN - 1);
        let region = match self.reserve(len) {
            Some(offset) => {
                self.stats.pool += 1;
                self.stats.used += len;
                Region::Pool(offset)
            }
            None if len < HEAP_LIMIT => {
                self.stats.heap += 1;
                Region::Heap(len)
            }
            None => return Err(error!(NoMem)),
        };
        self.stats.live += 1;
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.entry = Some((value, region));
        Ok(Handle {
            index,
            generation: slot.generation,
        })
    }

    pub fn free(&mut self, handle: Handle) -> Result<T> {
        let slot = match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => slot,
            _ => return Err(error!(InvalidOperation; "STALE POOL HANDLE")),
        };
        let (value, region) = match slot.entry.take() {
            Some(entry) => entry,
            None => return Err(error!(InvalidOperation; "STALE POOL HANDLE")),
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(handle.index);
        self.stats.live -= 1;
        if let Region::Pool(offset) = region {
            self.release(offset);
        }
        Ok(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => {
                slot.entry.as_ref().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => {
                slot.entry.as_mut().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn source(&self, handle: Handle) -> Option<Source> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => {
                slot.entry.as_ref().map(|(_, region)| match region {
                    Region::Pool(_) => Source::Pool,
                    Region::Heap(_) => Source::Heap,
                })
            }
            _ => None,
        }
    }

    fn reserve(&mut self, len: usize) -> Option<usize> {
        let best = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.free && block.len >= len)
            .min_by_key(|(_, block)| block.len)
            .map(|(index, _)| index)?;
        let offset = self.blocks[best].offset;
        let rest = self.blocks[best].len - len;
        self.blocks[best].len = len;
        self.blocks[best].free = false;
        if rest > 0 {
            self.blocks.insert(
                best + 1,
                Block {
                    offset: offset + len,
                    len: rest,
                    free: true,
                },
            );
        }
        Some(offset)
    }

    fn release(&mut self, offset: usize) {
        let index = match self.blocks.binary_search_by_key(&offset, |b| b.offset) {
            Ok(index) => index,
            Err(_) => return,
        };
        self.stats.used -= self.blocks[index].len;
        self.blocks[index].free = true;
        if index + 1 < self.blocks.len() && self.blocks[index + 1].free {
            let next = self.blocks.remove(index + 1);
            self.blocks[index].len += next.len;
        }
        if index > 0 && self.blocks[index - 1].free {
            let this = self.blocks.remove(index);
            self.blocks[index - 1].len += this.len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_capacity_never_uses_heap() {
        let mut pool = Pool::new();
        let mut handles = vec![];
        for round in 0..10 {
            for i in 0..8 {
                handles.push(pool.alloc(round * 8 + i, 100).unwrap());
            }
            for handle in handles.drain(..) {
                pool.free(handle).unwrap();
            }
        }
        let stats = pool.stats();
        assert_eq!(stats.heap, 0);
        assert_eq!(stats.pool, 80);
        assert_eq!(stats.live, 0);
        assert_eq!(stats.used, 0);
    }

    #[test]
    fn test_heap_fallback() {
        let mut pool = Pool::new();
        let small = pool.alloc("small", 200).unwrap();
        let big = pool.alloc("big", 900).unwrap();
        assert_eq!(pool.source(small), Some(Source::Pool));
        assert_eq!(pool.source(big), Some(Source::Heap));
        assert_eq!(pool.free(big).unwrap(), "big");
        assert_eq!(pool.stats().heap, 1);
        assert_eq!(pool.stats().live, 1);
        assert_eq!(pool.free(small).unwrap(), "small");
        assert_eq!(pool.stats().used, 0);
    }

    #[test]
    fn test_too_large() {
        let mut pool = Pool::new();
        let error = pool.alloc((), HEAP_LIMIT).unwrap_err();
        assert_eq!(error.code(), crate::lang::ErrorCode::NoMem);
    }

    #[test]
    fn test_best_fit() {
        let mut pool = Pool::new();
        let a = pool.alloc(1, 64).unwrap();
        let _b = pool.alloc(2, 8).unwrap();
        let c = pool.alloc(3, 32).unwrap();
        let _d = pool.alloc(4, 8).unwrap();
        let _rest = pool.alloc(5, POOL_SIZE - 112).unwrap();
        assert_eq!(pool.stats().used, POOL_SIZE);
        pool.free(a).unwrap();
        pool.free(c).unwrap();
        // The 24 byte request takes the 32 byte hole so 64 bytes still fit.
        let e = pool.alloc(6, 24).unwrap();
        let f = pool.alloc(7, 64).unwrap();
        assert_eq!(pool.source(e), Some(Source::Pool));
        assert_eq!(pool.source(f), Some(Source::Pool));
        assert_eq!(pool.stats().heap, 0);
    }

    #[test]
    fn test_stale_handle() {
        let mut pool = Pool::new();
        let a = pool.alloc('a', 8).unwrap();
        pool.free(a).unwrap();
        let b = pool.alloc('b', 8).unwrap();
        assert!(pool.get(a).is_none());
        assert!(pool.free(a).is_err());
        assert_eq!(pool.get(b), Some(&'b'));
    }
}
