//! Counter modules.

/// Circular pointer over `len` slots.
///
/// Advancing past the last slot wraps to zero. A pointer over zero slots never moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircularPointer {
    value: usize,
    len: usize,
}

impl CircularPointer {
    /// Creates a pointer at slot zero.
    pub fn new(len: usize) -> Self { Self { value: 0, len } }

    /// Current slot.
    pub fn get(&self) -> usize { self.value }

    /// Number of slots.
    pub fn len(&self) -> usize { self.len }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Advances the pointer by `by` slots, wrapping to zero once it reaches `len`.
    ///
    /// It returns the pair of current counter value and next counter value.
    pub fn advance(&mut self, by: usize) -> (usize, usize) {
        let current = self.value;
        if self.len != 0 {
            let next = current + by;
            self.value = if next >= self.len { 0 } else { next };
        }
        (current, self.value)
    }

    /// Moves back to slot zero over `len` slots.
    pub fn reset(&mut self, len: usize) { *self = Self::new(len); }

    /// Changes the number of slots, keeping the current slot if it is still in range.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.value >= len {
            self.value = 0;
        }
    }
}
