//! Finite state machine (Mealy machine).

use std::fmt;

use thiserror::Error;

use crate::*;

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsmError {
    #[error("module `{module}` did not reach the condition within {steps} steps")]
    StepBudgetExhausted { module: String, steps: u64 },
}

type FsmFn<I, O, S> = dyn Fn(
    &<I as Interface>::Fwd,
    &<O as Interface>::Bwd,
    &S,
) -> (<O as Interface>::Fwd, <I as Interface>::Bwd, S);

/// Finite state machine (Mealy machine).
///
/// The FSM is described by a function that computes (1) the current-step outputs, i.e. the egress
/// forward and ingress backward signals; and (2) the next-step state. Outputs may depend on the
/// current-step inputs, so the function is evaluated once per step after all inputs are settled.
pub struct Fsm<I: Interface, O: Interface, S: Signal> {
    /// Module name.
    module_name: String,
    /// FSM function.
    f: Box<FsmFn<I, O, S>>,
    /// Initial value of registers in the FSM.
    init: S,
    /// Current value of registers in the FSM.
    state: S,
    /// Number of committed steps since creation or the last reset.
    cycle: u64,
}

impl<I: Interface, O: Interface, S: Signal> fmt::Debug for Fsm<I, O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("module_name", &self.module_name)
            .field("init", &self.init)
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .finish()
    }
}

impl<I: Interface, O: Interface, S: Signal> Fsm<I, O, S> {
    /// Creates a new FSM.
    pub fn new<F>(module_name: &str, f: F, init: S) -> Self
    where F: 'static + Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S) {
        Self { module_name: module_name.to_string(), f: Box::new(f), state: init.clone(), init, cycle: 0 }
    }

    /// Returns the module name.
    pub fn module_name(&self) -> &str { &self.module_name }

    /// Returns the current state.
    pub fn state(&self) -> &S { &self.state }

    /// Returns the number of steps committed since creation or the last reset.
    pub fn cycle(&self) -> u64 { self.cycle }

    /// Computes the current-step outputs and commits the next state.
    pub fn step(&mut self, ingress_fwd: &I::Fwd, egress_bwd: &O::Bwd) -> (O::Fwd, I::Bwd) {
        let (egress_fwd, ingress_bwd, state_next) = (self.f)(ingress_fwd, egress_bwd, &self.state);
        tracing::trace!(module = %self.module_name, cycle = self.cycle, state = ?state_next, "step");
        self.state = state_next;
        self.cycle += 1;
        (egress_fwd, ingress_bwd)
    }

    /// Steps the FSM and returns the observation of both interfaces on that step.
    pub fn step_channels(&mut self, ingress_fwd: I::Fwd, egress_bwd: O::Bwd) -> (I, O) {
        let (egress_fwd, ingress_bwd) = self.step(&ingress_fwd, &egress_bwd);
        (I::from_parts(ingress_fwd, ingress_bwd), O::from_parts(egress_fwd, egress_bwd))
    }

    /// Steps the FSM with the inputs given by `drive` until `done` holds for the observed interfaces.
    ///
    /// Returns the number of steps taken, including the step on which `done` held.
    pub fn run_until(
        &mut self, max_steps: u64, mut drive: impl FnMut(u64) -> (I::Fwd, O::Bwd), mut done: impl FnMut(&I, &O) -> bool,
    ) -> Result<u64, FsmError> {
        for step in 0..max_steps {
            let (ingress_fwd, egress_bwd) = drive(step);
            let (ingress, egress) = self.step_channels(ingress_fwd, egress_bwd);
            if done(&ingress, &egress) {
                return Ok(step + 1);
            }
        }
        Err(FsmError::StepBudgetExhausted { module: self.module_name.clone(), steps: max_steps })
    }

    /// Restores the initial state.
    pub fn reset(&mut self) {
        self.state = self.init.clone();
        self.cycle = 0;
    }
}

impl<I: Signal, O: Signal, S: Signal> Fsm<VrChannel<I>, VrChannel<O>, S> {
    /// Creates an FSM that maps each element of a valid-ready channel.
    ///
    /// `f` computes the output element and the next state from the input element and the current
    /// state. The state is updated only on transfer steps; backpressure passes straight through.
    pub fn fsm_map<F>(module_name: &str, init: S, f: F) -> Self
    where F: 'static + Fn(&I, &S) -> (O, S) {
        Self::new(
            module_name,
            move |ingress_fwd: &Valid<I>, egress_bwd: &Ready, state: &S| {
                let (egress_inner, state_next) = f(&ingress_fwd.inner, state);
                let state_next = if ingress_fwd.valid && egress_bwd.ready { state_next } else { state.clone() };
                (Valid::new(ingress_fwd.valid, egress_inner), *egress_bwd, state_next)
            },
            init,
        )
    }
}
