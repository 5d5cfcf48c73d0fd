//! Command processor: dispatches host operations to the accelerator's registers and stores.

use std::fmt;

use cfuflow_std::sign_extend;

use crate::config::CfuConfig;
use crate::constants::{Op, RegisterId, INPUT_OFFSET_BITS, PP_POST_PROCESS};
use crate::macc::MaccUnit;
use crate::post_process::{Activation, OutputParams, OutputParamsStore, PostProcessInput, PostProcessUnit};
use crate::registers::{PingRegister, VerifyRegister};
use crate::store::WindowedStore;
use crate::CfuError;

/// One host operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Reads a register.
    Get(RegisterId),
    /// Writes a register.
    Set(RegisterId, u32),
    /// Post-processes an accumulator with the next output parameters.
    PostProcess(u32),
    /// Pings with two operands.
    Ping(u32, u32),
}

impl Command {
    /// Creates a GET, checking that the register is readable.
    pub fn get(reg: RegisterId) -> Result<Self, CfuError> {
        if !reg.access().is_readable() {
            return Err(CfuError::NotReadable(reg));
        }
        Ok(Command::Get(reg))
    }

    /// Creates a SET, checking that the register is writable.
    pub fn set(reg: RegisterId, value: u32) -> Result<Self, CfuError> {
        if !reg.access().is_writable() {
            return Err(CfuError::NotWritable(reg));
        }
        Ok(Command::Set(reg, value))
    }

    /// Operation of the command.
    pub fn op(&self) -> Op {
        match self {
            Command::Get(_) => Op::Get,
            Command::Set(..) => Op::Set,
            Command::PostProcess(_) => Op::PostProcess,
            Command::Ping(..) => Op::Ping,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Get(reg) => write!(f, "get {reg}"),
            Command::Set(reg, value) => write!(f, "set {reg} {value:#x}"),
            Command::PostProcess(acc) => write!(f, "post_process {}", *acc as i32),
            Command::Ping(in0, in1) => write!(f, "ping {in0} {in1}"),
        }
    }
}

/// The accelerator as seen by the host: one command is issued and fully resolved per step.
#[derive(Debug)]
pub struct CommandProcessor {
    config: CfuConfig,
    verify: VerifyRegister,
    ping: PingRegister,
    input_store: WindowedStore,
    filter_store: WindowedStore,
    input_offset: i32,
    macc: MaccUnit,
    activation: Activation,
    output_bias: i16,
    output_multiplier: i32,
    output_params: OutputParamsStore,
    post_process: PostProcessUnit,
    cycle: u64,
}

impl Default for CommandProcessor {
    fn default() -> Self { Self::new(CfuConfig::default()) }
}

impl CommandProcessor {
    /// Creates an accelerator in its reset state.
    pub fn new(config: CfuConfig) -> Self {
        Self {
            verify: VerifyRegister::new(),
            ping: PingRegister::new(),
            input_store: WindowedStore::new("input", config.input_store_depth),
            filter_store: WindowedStore::new("filter", config.filter_store_depth),
            input_offset: 0,
            macc: MaccUnit::new(),
            activation: Activation::default(),
            output_bias: 0,
            output_multiplier: 0,
            output_params: OutputParamsStore::new(),
            post_process: PostProcessUnit::new(),
            cycle: 0,
            config,
        }
    }

    /// Configuration the accelerator was created with.
    pub fn config(&self) -> &CfuConfig { &self.config }

    /// Number of commands executed since creation or the last reset.
    pub fn cycle(&self) -> u64 { self.cycle }

    /// Input store.
    pub fn input_store(&self) -> &WindowedStore { &self.input_store }

    /// Filter store.
    pub fn filter_store(&self) -> &WindowedStore { &self.filter_store }

    /// Multiply-accumulate unit.
    pub fn macc(&self) -> &MaccUnit { &self.macc }

    /// Input offset applied by the multiply-accumulate unit.
    pub fn input_offset(&self) -> i32 { self.input_offset }

    /// Output offset and activation range applied by post-processing.
    pub fn activation(&self) -> &Activation { &self.activation }

    /// Output parameter store.
    pub fn output_params(&self) -> &OutputParamsStore { &self.output_params }

    /// Executes one command and returns its result.
    ///
    /// A SET of [`RegisterId::Reset`] leaves the cycle count at zero.
    pub fn execute(&mut self, command: Command) -> u32 {
        let result = match command {
            Command::Get(reg) => self.get(reg),
            Command::Set(reg, value) => self.set(reg, value),
            Command::PostProcess(acc) => self.post_process(acc),
            Command::Ping(in0, in1) => self.ping(in0, in1),
        };
        tracing::debug!(cycle = self.cycle, %command, result, "execute");
        if !matches!(command, Command::Set(RegisterId::Reset, _)) {
            self.cycle += 1;
        }
        result
    }

    /// Executes a raw instruction given by its funct3 code, register id and operands.
    ///
    /// Unknown op codes and register ids have no effect and return zero. PING ignores the register
    /// id; POST_PROCESS takes a function code in its place.
    pub fn execute_raw(&mut self, funct3: u32, reg_id: u32, in0: u32, in1: u32) -> u32 {
        let op = match Op::try_from(funct3) {
            Ok(op) => op,
            Err(error) => {
                tracing::warn!(%error, "instruction ignored");
                return 0;
            }
        };
        let command = match op {
            Op::Ping => Command::Ping(in0, in1),
            Op::PostProcess if reg_id == PP_POST_PROCESS => Command::PostProcess(in0),
            Op::PostProcess => {
                tracing::warn!(function = reg_id, "unknown post-process function ignored");
                return 0;
            }
            Op::Get | Op::Set => match RegisterId::try_from(reg_id) {
                Ok(reg) if op == Op::Get => Command::Get(reg),
                Ok(reg) => Command::Set(reg, in0),
                Err(error) => {
                    tracing::warn!(%error, ?op, "instruction ignored");
                    return 0;
                }
            },
        };
        self.execute(command)
    }

    /// Returns the value of a register. Reads never change state.
    ///
    /// Write-only registers read as zero.
    pub fn get(&self, reg: RegisterId) -> u32 {
        match reg {
            RegisterId::Verify => self.verify.read(),
            RegisterId::Input0 => self.input_store.read(0),
            RegisterId::Input1 => self.input_store.read(1),
            RegisterId::Input2 => self.input_store.read(2),
            RegisterId::Input3 => self.input_store.read(3),
            RegisterId::Filter0 => self.filter_store.read(0),
            RegisterId::Filter1 => self.filter_store.read(1),
            RegisterId::Filter2 => self.filter_store.read(2),
            RegisterId::Filter3 => self.filter_store.read(3),
            RegisterId::MaccOut => self.macc.result() as u32,
            RegisterId::Reset
            | RegisterId::FilterNumWords
            | RegisterId::InputNumWords
            | RegisterId::InputOffset
            | RegisterId::SetFilter
            | RegisterId::SetInput
            | RegisterId::OutputOffset
            | RegisterId::OutputMin
            | RegisterId::OutputMax
            | RegisterId::FilterInputNext
            | RegisterId::OutputParamsReset
            | RegisterId::OutputBias
            | RegisterId::OutputMultiplier
            | RegisterId::OutputShift => {
                tracing::warn!(register = reg.name(), "read of write-only register");
                0
            }
        }
    }

    /// Writes a register. Always returns zero.
    ///
    /// Writes to read-only registers are ignored.
    pub fn set(&mut self, reg: RegisterId, value: u32) -> u32 {
        match reg {
            RegisterId::Reset => self.reset(),
            RegisterId::FilterNumWords => self.filter_store.configure(value),
            RegisterId::InputNumWords => self.input_store.configure(value),
            RegisterId::InputOffset => self.input_offset = sign_extend(value, INPUT_OFFSET_BITS),
            RegisterId::SetFilter => self.filter_store.append(value),
            RegisterId::SetInput => self.input_store.append(value),
            RegisterId::OutputOffset => self.activation.offset = sign_extend(value, 9),
            RegisterId::OutputMin => self.activation.min = sign_extend(value, 8) as i8,
            RegisterId::OutputMax => self.activation.max = sign_extend(value, 8) as i8,
            RegisterId::FilterInputNext => {
                self.input_store.advance_window();
                self.filter_store.advance_window();
            }
            RegisterId::OutputParamsReset => self.output_params.reset(),
            RegisterId::OutputBias => self.output_bias = sign_extend(value, 16) as i16,
            RegisterId::OutputMultiplier => self.output_multiplier = value as i32,
            RegisterId::OutputShift => self.output_params.push(OutputParams {
                bias: self.output_bias,
                multiplier: self.output_multiplier,
                shift: (value & 0xf) as u8,
            }),
            RegisterId::Verify => self.verify.write(value),
            RegisterId::Input0
            | RegisterId::Input1
            | RegisterId::Input2
            | RegisterId::Input3
            | RegisterId::Filter0
            | RegisterId::Filter1
            | RegisterId::Filter2
            | RegisterId::Filter3
            | RegisterId::MaccOut => {
                tracing::warn!(register = reg.name(), value, "write to read-only register ignored");
            }
        }
        0
    }

    /// Returns the sum of the previous ping's operands and steps the multiply-accumulate pipeline.
    pub fn ping(&mut self, in0: u32, in1: u32) -> u32 {
        let previous = self.ping.call(in0, in1);
        self.macc.trigger(self.input_offset, &self.input_store, &self.filter_store);
        previous
    }

    /// Converts an accumulator to an activation with the next output parameters. The activation is
    /// returned sign-extended.
    pub fn post_process(&mut self, acc: u32) -> u32 {
        let params = self.output_params.read_next();
        let input = PostProcessInput { acc: acc as i32, params, activation: self.activation };
        match self.post_process.run(input) {
            Ok(output) => i32::from(output) as u32,
            Err(error) => {
                tracing::warn!(%error, "post-process dropped");
                0
            }
        }
    }

    /// Restores every register and store to its reset state.
    pub fn reset(&mut self) {
        tracing::info!(cycle = self.cycle, "reset");
        *self = Self::new(self.config.clone());
    }
}
