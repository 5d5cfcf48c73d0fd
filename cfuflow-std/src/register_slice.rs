//! Register slice that captures its input on trigger steps.

use cfuflow::*;

fn m<V: Signal>() -> Fsm<VrChannel<V>, UniChannel<V>, V> {
    Fsm::new(
        "latch",
        |ingress_fwd: &Valid<V>, _egress_bwd: &(), state: &V| {
            let state_next = if ingress_fwd.valid { ingress_fwd.inner.clone() } else { state.clone() };
            (state.clone(), Ready::new(true), state_next)
        },
        V::default(),
    )
}

/// A register that is always ready and outputs the value captured on the last valid step.
///
/// The output trails the input by exactly one valid step, so a value presented on step `t` is
/// observed from step `t + 1` on. It reads as `V::default()` until the first capture.
#[derive(Debug)]
pub struct Latch<V: Signal> {
    fsm: Fsm<VrChannel<V>, UniChannel<V>, V>,
}

impl<V: Signal> Default for Latch<V> {
    fn default() -> Self { Self::new() }
}

impl<V: Signal> Latch<V> {
    /// Creates a latch holding `V::default()`.
    pub fn new() -> Self { Self { fsm: m() } }

    /// Value currently visible at the output.
    pub fn value(&self) -> &V { self.fsm.state() }

    /// Captures `value`, returning the output visible during this step.
    pub fn capture(&mut self, value: V) -> V { self.fsm.step(&Valid::valid(value), &()).0 }

    /// Number of captures since creation or the last reset.
    pub fn captures(&self) -> u64 { self.fsm.cycle() }

    /// Drops the captured value.
    pub fn reset(&mut self) { self.fsm.reset() }
}
