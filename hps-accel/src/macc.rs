//! Multiply-accumulate unit.

use arrayvec::ArrayVec;
use cfuflow_std::{unpack_words, Latch};
use itertools::Itertools;

use crate::constants::{WINDOW_LANES, WINDOW_WORDS};
use crate::store::WindowedStore;

/// Computes `sum((offset + input[n]) * filter[n])` over the 16 signed lanes of a window.
///
/// Arithmetic wraps in 32 bits.
pub fn dot_window(offset: i32, inputs: &[u32; WINDOW_WORDS], filters: &[u32; WINDOW_WORDS]) -> i32 {
    let inputs: ArrayVec<i8, WINDOW_LANES> = unpack_words(inputs);
    let filters: ArrayVec<i8, WINDOW_LANES> = unpack_words(filters);
    inputs.iter().zip_eq(filters.iter()).fold(0, |acc: i32, (input, filter)| {
        let product = offset.wrapping_add(i32::from(*input)).wrapping_mul(i32::from(*filter));
        acc.wrapping_add(product)
    })
}

/// A 16-wide multiply-accumulate unit over the current windows of the input and filter stores.
///
/// The unit is pipelined: each trigger computes the product of the windows current at that
/// trigger, and the result becomes visible once the trigger completes. Until the first trigger
/// the result reads as zero.
#[derive(Debug, Default)]
pub struct MaccUnit {
    result: Latch<i32>,
}

impl MaccUnit {
    /// Creates an idle unit.
    pub fn new() -> Self { Self::default() }

    /// Latched result.
    pub fn result(&self) -> i32 { *self.result.value() }

    /// Advances the pipeline by one trigger.
    pub fn trigger(&mut self, offset: i32, input: &WindowedStore, filter: &WindowedStore) {
        let value = dot_window(offset, &input.window(), &filter.window());
        let previous = self.result.capture(value);
        tracing::debug!(
            input_window = input.window_pos(),
            filter_window = filter.window_pos(),
            offset,
            value,
            previous,
            "macc"
        );
    }

    /// Number of triggers since creation or the last reset.
    pub fn triggers(&self) -> u64 { self.result.captures() }

    /// Drops the latched result.
    pub fn reset(&mut self) { self.result.reset() }
}
