//! Credit-gated flow control.

use cfuflow::*;

/// Ingress interface of the flow restrictor: the element stream and the release request stream.
pub type FlowI<V> = (VrChannel<V>, VrChannel<u32>);

/// Egress interface of the flow restrictor.
pub type FlowO<V> = VrChannel<V>;

/// Signals driven by the flow restrictor on one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStep<V> {
    /// Forward signals of the output stream.
    pub output: Valid<V>,
    /// Backward signals of the input stream.
    pub input: Ready,
    /// Backward signals of the release stream, i.e. whether a release request is accepted.
    pub release: Ready,
}

fn m<V: Signal>() -> Fsm<FlowI<V>, FlowO<V>, u32> {
    Fsm::new(
        "flow_restrictor",
        |ingress_fwd: &(Valid<V>, Valid<u32>), egress_bwd: &Ready, credit: &u32| {
            let (input, release) = ingress_fwd;
            let is_open = *credit > 0;

            // Elements wait at the boundary while closed: neither valid nor ready is passed on.
            let egress_fwd = Valid::new(is_open && input.valid, input.inner.clone());
            let input_bwd = Ready::new(is_open && egress_bwd.ready);
            let release_bwd = Ready::new(!is_open);

            let credit_next = if release.valid && release_bwd.ready {
                release.inner
            } else if egress_fwd.valid && egress_bwd.ready {
                credit - 1
            } else {
                *credit
            };

            (egress_fwd, (input_bwd, release_bwd), credit_next)
        },
        0,
    )
}

/// Forwards a stream only as far as released by the caller.
///
/// A release request of `n` is accepted only while idle (no credit left); after that exactly `n`
/// elements are forwarded in arrival order, one per step at most, and the restrictor goes back to
/// idle. Requests that arrive while credit remains are refused, not queued.
#[derive(Debug)]
pub struct FlowRestrictor<V: Signal> {
    fsm: Fsm<FlowI<V>, FlowO<V>, u32>,
}

impl<V: Signal> Default for FlowRestrictor<V> {
    fn default() -> Self { Self::new() }
}

impl<V: Signal> FlowRestrictor<V> {
    /// Creates an idle flow restrictor.
    pub fn new() -> Self { Self { fsm: m() } }

    /// Remaining number of elements that may pass.
    pub fn credit(&self) -> u32 { *self.fsm.state() }

    /// Whether a release request would be accepted on the next step.
    pub fn release_ready(&self) -> bool { self.credit() == 0 }

    /// Advances one step.
    ///
    /// `input` and `release` are driven by the producers, `output` by the consumer.
    pub fn step(&mut self, input: &Valid<V>, release: &Valid<u32>, output: &Ready) -> FlowStep<V> {
        let (egress_fwd, (input_bwd, release_bwd)) = self.fsm.step(&(input.clone(), *release), output);
        if release.valid {
            tracing::debug!(count = release.inner, accepted = release_bwd.ready, "release request");
        }
        if egress_fwd.valid && output.ready {
            tracing::trace!(element = ?egress_fwd.inner, credit = self.credit(), "forwarded");
        }
        FlowStep { output: egress_fwd, input: input_bwd, release: release_bwd }
    }

    /// Requests the release of `count` elements, spending one step with no element offered.
    ///
    /// Returns whether the request was accepted.
    pub fn release(&mut self, count: u32) -> bool {
        self.step(&Valid::invalid(), &Valid::valid(count), &Ready::new(false)).release.ready
    }

    /// Drops all credit.
    pub fn reset(&mut self) { self.fsm.reset() }
}
