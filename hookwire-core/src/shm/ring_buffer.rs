// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Fixed-capacity circular buffer of plain slots.
//!
//! The buffer has no synchronization of its own: it is placed in shared
//! memory and every caller must already hold the channel lock. Full buffers
//! reject the newest item, nothing is ever overwritten.

use crate::error::RingError;

/// Ring buffer with `N` slots, `#[repr(C)]` so every process sees the same layout.
///
/// `count` is the number of stored items, `tail` the index of the oldest one.
/// Invariant: `count <= N` and `tail < N`.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct EventRing<T: Copy, const N: usize> {
    count: u32,
    tail: u32,
    slots: [T; N],
}

impl<T: Copy, const N: usize> EventRing<T, N> {
    /// Create an empty ring with every slot set to `fill`.
    pub const fn new(fill: T) -> Self {
        Self {
            count: 0,
            tail: 0,
            slots: [fill; N],
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count as usize == N
    }

    /// Index of the oldest unread item.
    pub fn tail(&self) -> usize {
        self.tail as usize
    }

    /// Drop all items and rewind to slot 0.
    pub fn clear(&mut self) {
        self.count = 0;
        self.tail = 0;
    }

    /// Check the header invariants.
    ///
    /// The header lives in memory other processes write to, so it is checked
    /// before every operation instead of being trusted.
    pub fn validate(&self) -> Result<(), RingError> {
        if N == 0 || self.count as usize > N || self.tail as usize >= N {
            return Err(RingError::Corrupted {
                count: self.count,
                tail: self.tail,
                capacity: N,
            });
        }
        Ok(())
    }

    /// Append an item at the head.
    ///
    /// Returns `RingError::Full` and leaves the ring untouched when all slots are used.
    pub fn push(&mut self, item: T) -> Result<(), RingError> {
        self.validate()?;

        if self.is_full() {
            return Err(RingError::Full);
        }

        let head = (self.tail as usize + self.count as usize) % N;
        self.slots[head] = item;
        self.count += 1;

        Ok(())
    }

    /// Remove and return the oldest item.
    pub fn pop(&mut self) -> Result<T, RingError> {
        self.validate()?;

        if self.is_empty() {
            return Err(RingError::Empty);
        }

        let item = self.slots[self.tail as usize];
        self.tail = ((self.tail as usize + 1) % N) as u32;
        self.count -= 1;

        Ok(item)
    }

    /// Peek at the oldest item without removing it.
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() || self.validate().is_err() {
            return None;
        }
        Some(&self.slots[self.tail as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_across_wraparound() {
        let mut ring: EventRing<u32, 4> = EventRing::new(0);
        let mut next_in = 0u32;
        let mut next_out = 0u32;

        // Interleave pushes and pops so the tail wraps several times.
        for round in 0..10 {
            let pushes = 1 + round % 4;
            for _ in 0..pushes {
                if ring.push(next_in).is_ok() {
                    next_in += 1;
                }
            }
            let pops = 1 + (round + 1) % 3;
            for _ in 0..pops {
                match ring.pop() {
                    Ok(item) => {
                        assert_eq!(item, next_out);
                        next_out += 1;
                    }
                    Err(err) => assert_eq!(err, RingError::Empty),
                }
            }
        }

        while let Ok(item) = ring.pop() {
            assert_eq!(item, next_out);
            next_out += 1;
        }
        assert_eq!(next_in, next_out);
    }

    #[test]
    fn test_push_when_full_leaves_state_unchanged() {
        let mut ring: EventRing<u32, 3> = EventRing::new(0);
        ring.push(10).unwrap();
        ring.pop().unwrap();
        for item in [11, 12, 13] {
            ring.push(item).unwrap();
        }
        assert!(ring.is_full());

        let before = ring.clone();
        assert_eq!(ring.push(99), Err(RingError::Full));
        assert_eq!(ring.len(), before.len());
        assert_eq!(ring.tail(), before.tail());
        assert_eq!(ring.slots, before.slots);

        assert_eq!(ring.pop(), Ok(11));
        assert_eq!(ring.pop(), Ok(12));
        assert_eq!(ring.pop(), Ok(13));
    }

    #[test]
    fn test_pop_when_empty() {
        let mut ring: EventRing<u8, 2> = EventRing::new(0);
        assert_eq!(ring.pop(), Err(RingError::Empty));
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.tail(), 0);
    }

    #[test]
    fn test_tail_wraps_to_zero() {
        let mut ring: EventRing<u8, 2> = EventRing::new(0);
        ring.push(1).unwrap();
        ring.push(2).unwrap();
        ring.pop().unwrap();
        ring.pop().unwrap();
        assert_eq!(ring.tail(), 0);

        ring.push(3).unwrap();
        assert_eq!(ring.front(), Some(&3));
    }

    #[test]
    fn test_corrupted_header_rejected() {
        let mut ring: EventRing<u8, 2> = EventRing::new(0);
        ring.count = 3;
        assert!(matches!(ring.push(1), Err(RingError::Corrupted { .. })));

        ring.count = 0;
        ring.tail = 2;
        assert!(matches!(ring.pop(), Err(RingError::Corrupted { .. })));
        assert_eq!(ring.front(), None);
    }

    #[test]
    fn test_clear() {
        let mut ring: EventRing<u8, 2> = EventRing::new(0);
        ring.push(1).unwrap();
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 2);
    }
}
