//! Diagnostic registers: verification and ping.

use cfuflow::*;

use crate::constants::VERIFY_RESET_VALUE;

/// Gateware verification register.
///
/// Every written value is added to the stored value, so a read-back only matches when both the
/// write path and the previous state are wired correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRegister {
    value: u32,
}

impl Default for VerifyRegister {
    fn default() -> Self { Self { value: VERIFY_RESET_VALUE } }
}

impl VerifyRegister {
    /// Creates the register with its reset value.
    pub fn new() -> Self { Self::default() }

    /// Adds `value` to the stored value.
    pub fn write(&mut self, value: u32) { self.value = self.value.wrapping_add(value); }

    /// Stored value.
    pub fn read(&self) -> u32 { self.value }
}

type PingFsm = Fsm<VrChannel<(u32, u32)>, VrChannel<u32>, u32>;

fn m_ping() -> PingFsm {
    PingFsm::fsm_map("ping", 0, |operands: &(u32, u32), stored: &u32| {
        let (in0, in1) = *operands;
        (*stored, in0.wrapping_add(in1))
    })
}

/// Adds the two operands and stores the result. The previously stored value is returned.
#[derive(Debug)]
pub struct PingRegister {
    fsm: PingFsm,
}

impl Default for PingRegister {
    fn default() -> Self { Self { fsm: m_ping() } }
}

impl PingRegister {
    /// Creates the register holding zero.
    pub fn new() -> Self { Self::default() }

    /// Returns the sum stored by the previous call and stores `in0 + in1`.
    pub fn call(&mut self, in0: u32, in1: u32) -> u32 {
        self.fsm.step(&Valid::valid((in0, in1)), &Ready::new(true)).0.inner
    }

    /// Sum that the next call returns.
    pub fn stored(&self) -> u32 { *self.fsm.state() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accumulates_from_one() {
        let mut reg = VerifyRegister::new();
        assert_eq!(reg.read(), 1);
        reg.write(0);
        assert_eq!(reg.read(), 1);
        reg.write(10);
        assert_eq!(reg.read(), 11);
        assert_eq!(reg.read(), 11);
        reg.write(u32::MAX);
        assert_eq!(reg.read(), 10);
    }

    #[test]
    fn ping_returns_previous_sum() {
        let mut reg = PingRegister::new();
        assert_eq!(reg.call(1, 2), 0);
        assert_eq!(reg.call(12, 4), 3);
        assert_eq!(reg.call(0, 0), 16);
        assert_eq!(reg.call(7, 8), 0);
        assert_eq!(reg.stored(), 15);
    }
}
