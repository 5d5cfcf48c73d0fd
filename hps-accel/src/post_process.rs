//! Post-processing: requantizes 32-bit accumulators into 8-bit activations.
//!
//! Each accumulator passes through three pipelined stages:
//! (1) add the channel bias, then saturating rounding doubling high multiply by the channel multiplier;
//! (2) rounding divide by a power of two given by the channel shift;
//! (3) add the output offset and clamp to the activation range.
//!
//! Channel parameters come from an [`OutputParamsStore`], one entry consumed per accumulator.

use arrayvec::ArrayVec;
use cfuflow::*;
use cfuflow_std::{sign_extend, CircularPointer};

use crate::constants::MAX_CHANNELS;

/// Latency of the multiply stage.
pub const SRDHM_CYCLES: usize = 3;
/// Latency of the divide stage.
pub const RDBPOT_CYCLES: usize = 3;
/// Latency of the saturate stage.
pub const SATURATE_CYCLES: usize = 1;
/// Latency of the whole pipeline.
pub const POST_PROCESS_CYCLES: usize = SRDHM_CYCLES + RDBPOT_CYCLES + SATURATE_CYCLES;

/// Saturating rounding doubling high multiply: the high 32 bits of `2 * a * b`, rounded to nearest.
///
/// The magnitude of `a` is multiplied, so rounding is symmetric around zero.
pub fn srdhm(a: i32, b: i32) -> i32 {
    let positive = a >= 0;
    let product = i64::from(a).abs() * i64::from(b);
    let nudge = if positive { 1 << 30 } else { (1 << 30) - 1 };
    let high = ((product + nudge) >> 31) as i32;
    if positive {
        high
    } else {
        high.wrapping_neg()
    }
}

/// Divides by `2^shift`, rounding to nearest with ties away from zero.
pub fn rounding_divide_by_pot(dividend: i32, shift: u8) -> i32 {
    let mask = (1_i32 << shift) - 1;
    let remainder = dividend & mask;
    let threshold = (mask >> 1) + i32::from(dividend < 0);
    (dividend >> shift) + i32::from(remainder > threshold)
}

/// Output offset and activation range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activation {
    /// Added before clamping.
    pub offset: i32,
    /// Lower bound.
    pub min: i8,
    /// Upper bound.
    pub max: i8,
}

impl Activation {
    /// Adds the offset to `value` and clamps the sum into `min..=max`. The upper bound is checked first.
    pub fn saturate(&self, value: i32) -> i8 {
        let with_offset = value.wrapping_add(self.offset);
        if with_offset > i32::from(self.max) {
            self.max
        } else if with_offset < i32::from(self.min) {
            self.min
        } else {
            with_offset as i8
        }
    }
}

/// Per-channel requantization parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputParams {
    #[allow(missing_docs)]
    pub bias: i16,
    #[allow(missing_docs)]
    pub multiplier: i32,
    /// Right shift, 4 bits.
    pub shift: u8,
}

/// Converts one accumulator. The divide stage hands only its low 16 bits to the saturate stage.
pub fn post_process(acc: i32, params: &OutputParams, activation: &Activation) -> i8 {
    let scaled = srdhm(acc.wrapping_add(i32::from(params.bias)), params.multiplier);
    let shifted = rounding_divide_by_pot(scaled, params.shift);
    activation.saturate(sign_extend(shifted as u32, 16))
}

/// Circular store of output parameters, one entry per channel.
///
/// Writes go to consecutive slots, wrapping after [`MAX_CHANNELS`]. Reads cycle over the slots before
/// the write index, so a layer's parameters are replayed for every output pixel.
#[derive(Debug, Clone)]
pub struct OutputParamsStore {
    params: ArrayVec<OutputParams, MAX_CHANNELS>,
    write: CircularPointer,
    read: CircularPointer,
}

impl Default for OutputParamsStore {
    fn default() -> Self { Self::new() }
}

impl OutputParamsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { params: ArrayVec::new(), write: CircularPointer::new(MAX_CHANNELS), read: CircularPointer::new(0) }
    }

    /// Number of slots written since the last reset, at most [`MAX_CHANNELS`].
    pub fn len(&self) -> usize { self.params.len() }

    /// Whether nothing was written since the last reset.
    pub fn is_empty(&self) -> bool { self.params.is_empty() }

    /// Slot the next read returns.
    pub fn read_pos(&self) -> usize { self.read.get() }

    /// Appends one channel's parameters.
    pub fn push(&mut self, params: OutputParams) {
        let (index, next) = self.write.advance(1);
        match self.params.get_mut(index) {
            Some(slot) => *slot = params,
            None => self.params.push(params),
        }
        self.read.resize(if next == 0 { MAX_CHANNELS } else { next });
        tracing::trace!(index, ?params, "output params");
    }

    /// Returns the parameters at the read index and advances it. An empty store returns zeros.
    pub fn read_next(&mut self) -> OutputParams {
        let params = self.params.get(self.read.get()).copied().unwrap_or_default();
        self.read.advance(1);
        params
    }

    /// Empties the store.
    pub fn reset(&mut self) {
        tracing::info!(len = self.len(), "output params reset");
        *self = Self::new();
    }
}

/// One accumulator with everything needed to convert it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessInput {
    #[allow(missing_docs)]
    pub acc: i32,
    #[allow(missing_docs)]
    pub params: OutputParams,
    #[allow(missing_docs)]
    pub activation: Activation,
}

type Stages = [Valid<i8>; POST_PROCESS_CYCLES];

type PostProcessFsm = Fsm<VrChannel<PostProcessInput>, VrChannel<i8>, Stages>;

/// Always ready; neither provides nor respects backpressure.
fn m() -> PostProcessFsm {
    Fsm::new(
        "post_process",
        |ingress_fwd: &Valid<PostProcessInput>, _egress_bwd: &Ready, stages: &Stages| {
            let mut stages_next = *stages;
            stages_next.rotate_right(1);
            stages_next[0] = ingress_fwd.map_inner(|input| post_process(input.acc, &input.params, &input.activation));
            (stages[POST_PROCESS_CYCLES - 1], Ready::new(true), stages_next)
        },
        Default::default(),
    )
}

/// Post-process pipeline driven one accumulator at a time.
#[derive(Debug)]
pub struct PostProcessUnit {
    pipeline: PostProcessFsm,
}

impl Default for PostProcessUnit {
    fn default() -> Self { Self { pipeline: m() } }
}

impl PostProcessUnit {
    /// Creates an empty pipeline.
    pub fn new() -> Self { Self::default() }

    /// Issues `input` and steps the pipeline until its activation comes out.
    pub fn run(&mut self, input: PostProcessInput) -> Result<i8, FsmError> {
        let mut output = 0;
        let steps = self.pipeline.run_until(
            POST_PROCESS_CYCLES as u64 + 1,
            move |step| (if step == 0 { Valid::valid(input) } else { Valid::invalid() }, Ready::new(true)),
            |_, egress: &VrChannel<i8>| {
                output = *some_or!(egress.transfer(), return false);
                true
            },
        )?;
        tracing::debug!(acc = input.acc, params = ?input.params, output, steps, "post process");
        Ok(output)
    }

    /// Total steps taken since creation.
    pub fn cycles(&self) -> u64 { self.pipeline.cycle() }
}
