//! Constants shared with host software: op codes, register ids and size limits.
//!
//! Register ids for readable and writable registers are allocated from one pool of values 0-127.
//! Generally a register is either readable or writable; exceptions are noted per register.

use std::fmt;

use cfuflow_std::LANES;
use itertools::Itertools;
use linked_hash_map::LinkedHashMap;
use paste::paste;
use static_assertions::const_assert;
use static_assertions::const_assert_eq;

use crate::CfuError;

/// Funct3 code of the SET instruction.
pub const INS_SET: u32 = 0;
/// Funct3 code of the GET instruction.
pub const INS_GET: u32 = 1;
/// Funct3 code of the POST_PROCESS instruction.
pub const INS_POST_PROCESS: u32 = 2;
/// Funct3 code of the PING instruction.
pub const INS_PING: u32 = 7;

/// Operation selected by an instruction's funct3 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Writes a register.
    Set,
    /// Reads a register.
    Get,
    /// Converts an accumulator to an 8-bit activation.
    PostProcess,
    /// Echoes the previous operands and steps the MAC pipeline.
    Ping,
}

impl TryFrom<u32> for Op {
    type Error = CfuError;

    fn try_from(funct3: u32) -> Result<Self, CfuError> {
        match funct3 {
            INS_SET => Ok(Op::Set),
            INS_GET => Ok(Op::Get),
            INS_POST_PROCESS => Ok(Op::PostProcess),
            INS_PING => Ok(Op::Ping),
            _ => Err(CfuError::UnknownOp(funct3)),
        }
    }
}

/// How the host may access a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// GET only.
    Read,
    /// SET only.
    Write,
    /// Both GET and SET.
    ReadWrite,
}

impl Access {
    /// Whether GET returns the register's value.
    pub fn is_readable(self) -> bool { matches!(self, Access::Read | Access::ReadWrite) }

    /// Whether SET has an effect.
    pub fn is_writable(self) -> bool { matches!(self, Access::Write | Access::ReadWrite) }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Read => "R",
            Access::Write => "W",
            Access::ReadWrite => "RW",
        })
    }
}

macro_rules! registers {
    ($($(#[doc = $doc:literal])+ $variant:ident / $name:ident = $id:literal, $access:ident;)+) => {
        paste! {
            $(
                #[allow(missing_docs)]
                pub const [<REG_ $name>]: u32 = $id;
            )+
        }

        /// Register ids.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum RegisterId {
            $($(#[doc = $doc])+ $variant = $id,)+
        }

        impl RegisterId {
            /// All registers, in id order.
            pub const ALL: &'static [RegisterId] = &[$(RegisterId::$variant,)+];

            /// Name shared with host software.
            pub fn name(self) -> &'static str {
                match self {
                    $(RegisterId::$variant => stringify!($name),)+
                }
            }

            /// How the host may access the register.
            pub fn access(self) -> Access {
                match self {
                    $(RegisterId::$variant => Access::$access,)+
                }
            }
        }

        impl TryFrom<u32> for RegisterId {
            type Error = CfuError;

            fn try_from(id: u32) -> Result<Self, CfuError> {
                match id {
                    $($id => Ok(RegisterId::$variant),)+
                    _ => Err(CfuError::UnknownRegister(id)),
                }
            }
        }
    };
}

registers! {
    /// A write of any value resets the accelerator and loses all state.
    Reset / RESET = 0x00, Write;
    /// Number of 32 bit filter words. Setting this register resets the filter store.
    FilterNumWords / FILTER_NUM_WORDS = 0x01, Write;
    /// Number of 32 bit input words. Setting this register resets the input store.
    InputNumWords / INPUT_NUM_WORDS = 0x02, Write;
    /// Input offset for the multiply-accumulate unit, signed 9 bits.
    InputOffset / INPUT_OFFSET = 0x03, Write;
    /// Sets the next filter word and advances the write index.
    SetFilter / SET_FILTER = 0x04, Write;
    /// Sets the next input word and advances the write index.
    SetInput / SET_INPUT = 0x05, Write;
    /// Offset added to post-processed activations, signed 9 bits.
    OutputOffset / OUTPUT_OFFSET = 0x06, Write;
    /// Minimum post-processed activation, signed 8 bits.
    OutputMin / OUTPUT_MIN = 0x07, Write;
    /// Maximum post-processed activation, signed 8 bits.
    OutputMax / OUTPUT_MAX = 0x08, Write;
    /// Word 0 of the current filter window.
    Filter0 / FILTER_0 = 0x10, Read;
    /// Word 1 of the current filter window.
    Filter1 / FILTER_1 = 0x11, Read;
    /// Word 2 of the current filter window.
    Filter2 / FILTER_2 = 0x12, Read;
    /// Word 3 of the current filter window.
    Filter3 / FILTER_3 = 0x13, Read;
    /// Word 0 of the current input window.
    Input0 / INPUT_0 = 0x18, Read;
    /// Word 1 of the current input window.
    Input1 / INPUT_1 = 0x19, Read;
    /// Word 2 of the current input window.
    Input2 / INPUT_2 = 0x1a, Read;
    /// Word 3 of the current input window.
    Input3 / INPUT_3 = 0x1b, Read;
    /// A write of any value advances the window of both the filter store and the input store.
    FilterInputNext / FILTER_INPUT_NEXT = 0x1f, Write;
    /// Result of the multiply-accumulate unit, as latched by the last PING.
    MaccOut / MACC_OUT = 0x30, Read;
    /// A write of any value empties the output parameter store.
    OutputParamsReset / OUTPUT_PARAMS_RESET = 0x40, Write;
    /// Bias of the next output parameters, signed 16 bits.
    OutputBias / OUTPUT_BIAS = 0x41, Write;
    /// Multiplier of the next output parameters.
    OutputMultiplier / OUTPUT_MULTIPLIER = 0x42, Write;
    /// Shift of the next output parameters, 4 bits. Setting the shift appends bias, multiplier and
    /// shift to the output parameter store.
    OutputShift / OUTPUT_SHIFT = 0x43, Write;
    /// Gateware verification register. Readable and writable: every value set is added to the
    /// value read back, which starts at one.
    Verify / VERIFY = 0x70, ReadWrite;
}

/// Id guaranteed not to be a register id.
pub const REG_INVALID: u32 = 0x7f;

/// POST_PROCESS function code: post-process an accumulator.
pub const PP_POST_PROCESS: u32 = 0x03;

/// Name to id table of all registers, in id order.
pub fn register_table() -> LinkedHashMap<&'static str, RegisterId> {
    RegisterId::ALL.iter().map(|reg| (reg.name(), *reg)).collect()
}

/// Human-readable listing of the op codes and the register map, one register per line.
pub fn register_listing() -> String {
    let ops = format!("ops: set={INS_SET} get={INS_GET} post_process={INS_POST_PROCESS} ping={INS_PING}");
    let rows = register_table()
        .iter()
        .map(|(name, reg)| format!("  {:#04x}  {:<3} {}", reg.id(), reg.access().to_string(), name))
        .join("\n");
    format!("{ops}\n{rows}")
}

impl RegisterId {
    /// Numeric id.
    pub fn id(self) -> u32 { self as u32 }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Maximum number of words in filter.
pub const MAX_FILTER_WORDS: usize = 2048;

/// Maximum number of words in input.
pub const MAX_INPUT_WORDS: usize = 256;

/// Maximum number of channels in a layer, i.e. of output parameter sets.
pub const MAX_CHANNELS: usize = 64;

/// Width of the input offset register.
pub const INPUT_OFFSET_BITS: u32 = 9;

/// Number of words in a store window.
pub const WINDOW_WORDS: usize = 4;

/// Number of lanes multiplied per window.
pub const WINDOW_LANES: usize = WINDOW_WORDS * LANES;

/// Value of the verification register after reset.
pub const VERIFY_RESET_VALUE: u32 = 1;

const_assert_eq!(WINDOW_LANES, 16);
const_assert!(MAX_FILTER_WORDS % WINDOW_WORDS == 0);
const_assert!(MAX_INPUT_WORDS % WINDOW_WORDS == 0);
const_assert!((REG_INVALID as usize) < 128);
