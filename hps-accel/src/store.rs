//! Windowed stores for input and filter words.

use cfuflow_std::CircularPointer;

use crate::constants::WINDOW_WORDS;

/// Stores words one at a time and presents them four at a time.
///
/// Designed for use in this sequence:
/// (1) Set the number of words, which clears the store.
/// (2) Append that many words; the write index wraps after the last one.
/// (3) Read the current window and advance it until done; the window wraps to the start.
/// (4) Go back to step (1).
///
/// The backing arena is allocated once with the store's depth and never grows.
#[derive(Debug, Clone)]
pub struct WindowedStore {
    name: &'static str,
    arena: Box<[u32]>,
    num_words: usize,
    write: CircularPointer,
    window: CircularPointer,
}

impl WindowedStore {
    /// Creates an empty store able to hold `depth` words.
    pub fn new(name: &'static str, depth: usize) -> Self {
        Self {
            name,
            arena: vec![0; depth].into_boxed_slice(),
            num_words: 0,
            write: CircularPointer::new(0),
            window: CircularPointer::new(0),
        }
    }

    /// Store name, used in diagnostics.
    pub fn name(&self) -> &'static str { self.name }

    /// Maximum number of words.
    pub fn depth(&self) -> usize { self.arena.len() }

    /// Number of words declared by the last [`configure`](Self::configure).
    pub fn num_words(&self) -> usize { self.num_words }

    /// Index the next appended word is written to.
    pub fn write_pos(&self) -> usize { self.write.get() }

    /// Index of the first word of the current window.
    pub fn window_pos(&self) -> usize { self.window.get() }

    /// Declares that the store holds `num_words` words, clearing its contents and both indices.
    ///
    /// Counts above the depth are clamped to the depth.
    pub fn configure(&mut self, num_words: u32) {
        let requested = usize::try_from(num_words).unwrap_or(usize::MAX);
        if requested > self.depth() {
            tracing::warn!(store = self.name, requested, depth = self.depth(), "word count clamped to store depth");
        }
        self.num_words = requested.min(self.depth());
        self.arena.fill(0);
        self.write.reset(self.num_words);
        self.window.reset(self.num_words);
        tracing::info!(store = self.name, num_words = self.num_words, "store configured");
    }

    /// Writes `word` at the write index and advances it. Does nothing while the store is empty.
    pub fn append(&mut self, word: u32) {
        if self.write.is_empty() {
            tracing::warn!(store = self.name, word, "append to empty store dropped");
            return;
        }
        let (index, _) = self.write.advance(1);
        self.arena[index] = word;
        tracing::trace!(store = self.name, index, word, "append");
    }

    /// Word `index` of the current window.
    ///
    /// Words beyond the declared count, including every word of an empty store, read as zero.
    pub fn read(&self, index: usize) -> u32 {
        if index >= WINDOW_WORDS {
            return 0;
        }
        let slot = self.window.get() + index;
        if slot < self.num_words {
            self.arena[slot]
        } else {
            0
        }
    }

    /// All words of the current window.
    pub fn window(&self) -> [u32; WINDOW_WORDS] { std::array::from_fn(|index| self.read(index)) }

    /// Moves the window to the next group of words, wrapping to the first group at the end.
    pub fn advance_window(&mut self) {
        let (from, to) = self.window.advance(WINDOW_WORDS);
        tracing::trace!(store = self.name, from, to, "window advanced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_in_groups_of_four() {
        let mut store = WindowedStore::new("input", 256);
        store.configure(20);
        (100..120).for_each(|word| store.append(word));
        assert_eq!(store.write_pos(), 0);

        for first in (100..120).step_by(4) {
            assert_eq!(store.window(), [first, first + 1, first + 2, first + 3]);
            store.advance_window();
        }
        assert_eq!(store.window_pos(), 0);
        assert_eq!(store.read(0), 100);
    }

    #[test]
    fn empty_store_reads_zero() {
        let mut store = WindowedStore::new("filter", 8);
        store.configure(0);
        store.append(5);
        store.advance_window();
        assert_eq!(store.window(), [0; WINDOW_WORDS]);
        assert_eq!(store.window_pos(), 0);
    }

    #[test]
    fn write_index_wraps_over_declared_words() {
        let mut store = WindowedStore::new("filter", 8);
        store.configure(4);
        (1..=6).for_each(|word| store.append(word));
        assert_eq!(store.window(), [5, 6, 3, 4]);
    }

    #[test]
    fn partial_window_reads_zero_past_end() {
        let mut store = WindowedStore::new("input", 16);
        store.configure(6);
        (1..=6).for_each(|word| store.append(word));
        store.advance_window();
        assert_eq!(store.window(), [5, 6, 0, 0]);
        store.advance_window();
        assert_eq!(store.window_pos(), 0);
        assert_eq!(store.read(WINDOW_WORDS), 0);
    }

    #[test]
    fn configure_clears_and_clamps() {
        let mut store = WindowedStore::new("input", 8);
        store.configure(8);
        (1..=8).for_each(|word| store.append(word));
        store.advance_window();

        store.configure(100);
        assert_eq!(store.num_words(), 8);
        assert_eq!(store.window_pos(), 0);
        assert_eq!(store.window(), [0; WINDOW_WORDS]);
    }

    #[test]
    fn out_of_window_index_reads_zero() {
        let mut store = WindowedStore::new("input", 8);
        store.configure(8);
        (1..=8).for_each(|word| store.append(word));
        store.advance_window();
        assert_eq!(store.read(3), 8);
        assert_eq!(store.read(WINDOW_WORDS + 1), 0);
        assert_eq!(store.read(usize::MAX), 0);
    }
}
