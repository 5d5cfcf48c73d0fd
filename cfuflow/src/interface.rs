//! Channel interfaces.

use std::fmt::Debug;

/// A value that can be carried on the wires of a channel.
///
/// `Default` gives the value that idle wires hold.
pub trait Signal: 'static + Clone + Debug + Default {}

impl<T: 'static + Clone + Debug + Default> Signal for T {}

/// Interface of channels.
///
/// A value of an interface is the observation of all of its wires during one step: the forward
/// signals driven by the producer and the backward signals driven by the consumer.
pub trait Interface: 'static + Sized + Debug {
    /// Forward signals.
    type Fwd: Signal;

    /// Backward signals.
    type Bwd: Signal;

    /// Assembles an observation from the forward and backward signals of one step.
    fn from_parts(fwd: Self::Fwd, bwd: Self::Bwd) -> Self;

    /// Splits an observation into its forward and backward signals.
    fn into_parts(self) -> (Self::Fwd, Self::Bwd);
}

impl Interface for () {
    type Bwd = ();
    type Fwd = ();

    fn from_parts(_fwd: (), _bwd: ()) -> Self {}

    fn into_parts(self) -> ((), ()) { ((), ()) }
}

macro_rules! impl_interface_tuple {
    ($($a:ident $idx:tt)+) => {
        impl<$($a: Interface,)+> Interface for ($($a,)+) {
            type Fwd = ($($a::Fwd,)+);
            type Bwd = ($($a::Bwd,)+);

            fn from_parts(fwd: Self::Fwd, bwd: Self::Bwd) -> Self { ($($a::from_parts(fwd.$idx, bwd.$idx),)+) }

            fn into_parts(self) -> (Self::Fwd, Self::Bwd) {
                let parts = ($(self.$idx.into_parts(),)+);
                (($(parts.$idx.0,)+), ($(parts.$idx.1,)+))
            }
        }
    };
}

impl_interface_tuple! { B1 0 }
impl_interface_tuple! { B1 0 B2 1 }
impl_interface_tuple! { B1 0 B2 1 B3 2 }
impl_interface_tuple! { B1 0 B2 1 B3 2 B4 3 }

/// Valid/ready channel's forward signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Valid<V> {
    /// Inner data
    pub inner: V,

    /// Valid bit
    pub valid: bool,
}

impl<V> Valid<V> {
    /// Creates a new forward signal.
    pub fn new(valid: bool, inner: V) -> Self { Self { inner, valid } }

    /// Creates a valid forward signal.
    pub fn valid(inner: V) -> Self { Self::new(true, inner) }

    /// Maps the inner value.
    pub fn map_inner<W>(self, f: impl FnOnce(V) -> W) -> Valid<W> { Valid { inner: f(self.inner), valid: self.valid } }
}

impl<V: Default> Valid<V> {
    /// Creates an invalid forward signal.
    pub fn invalid() -> Self { Self::new(false, V::default()) }
}

/// Ready signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ready {
    /// Ready bit
    pub ready: bool,
}

impl Ready {
    /// Creates a new ready signal.
    pub fn new(ready: bool) -> Self { Self { ready } }
}

/// Valid-ready channel.
///
/// A transfer happens on a step exactly when the producer asserts `valid` and the consumer asserts
/// `ready`. The producer must hold its payload stable while `valid` is asserted and not yet
/// transferred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VrChannel<V: Signal> {
    /// Forward signals, driven by the producer.
    pub fwd: Valid<V>,

    /// Backward signals, driven by the consumer.
    pub bwd: Ready,
}

impl<V: Signal> Interface for VrChannel<V> {
    type Bwd = Ready;
    type Fwd = Valid<V>;

    fn from_parts(fwd: Valid<V>, bwd: Ready) -> Self { Self { fwd, bwd } }

    fn into_parts(self) -> (Valid<V>, Ready) { (self.fwd, self.bwd) }
}

impl<V: Signal> VrChannel<V> {
    /// Returns whether the channel transfers an element on this step.
    pub fn is_transferring(&self) -> bool { self.fwd.valid && self.bwd.ready }

    /// Returns the element transferred on this step, if any.
    pub fn transfer(&self) -> Option<&V> { self.is_transferring().then_some(&self.fwd.inner) }
}

/// Unidirectional channel. The consumer cannot apply backpressure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniChannel<V: Signal> {
    /// Forward signals, driven by the producer.
    pub fwd: V,
}

impl<V: Signal> Interface for UniChannel<V> {
    type Bwd = ();
    type Fwd = V;

    fn from_parts(fwd: V, _bwd: ()) -> Self { Self { fwd } }

    fn into_parts(self) -> (V, ()) { (self.fwd, ()) }
}
