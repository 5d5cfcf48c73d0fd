//! Host command scripts.
//!
//! One command per line; `#` starts a comment. Register names are case-insensitive and may also be
//! given as numeric ids. Values are decimal, negative decimal (two's complement) or `0x` hex.
//!
//! ```text
//! set verify 10
//! get verify = 11
//! ping 1 2
//! ping 12 4 = 3
//! post_process -432 = -125
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use cfuflow::some_or;

use crate::cfu::{Command, CommandProcessor};
use crate::config::CfuConfig;
use crate::constants::{register_table, RegisterId};
use crate::CfuError;

/// A parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOp {
    /// One-based line number.
    pub line: usize,
    /// Command to execute.
    pub command: Command,
    /// Expected result, if the line checks one.
    pub expected: Option<u32>,
}

fn script_error(line: usize, message: impl Into<String>) -> CfuError {
    CfuError::Script { line, message: message.into() }
}

/// Parses a value: decimal, negative decimal or `0x` hex.
pub fn parse_value(token: &str) -> Option<u32> {
    let token = token.replace('_', "");
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    if token.starts_with('-') {
        return token.parse::<i32>().ok().map(|value| value as u32);
    }
    token.parse::<u32>().ok()
}

/// Resolves a register name or numeric id.
pub fn parse_register(token: &str) -> Result<RegisterId, CfuError> {
    if let Some(reg) = register_table().get(token.to_ascii_uppercase().as_str()) {
        return Ok(*reg);
    }
    let id = some_or!(parse_value(token), return Err(CfuError::UnknownRegisterName(token.to_string())));
    RegisterId::try_from(id)
}

fn parse_line(line: &str) -> Result<Option<(Command, Option<u32>)>, String> {
    let line = line.split_once('#').map_or(line, |(code, _)| code).trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (lhs, expected) = match line.split_once('=') {
        Some((lhs, rhs)) => {
            let rhs = rhs.trim();
            (lhs, Some(some_or!(parse_value(rhs), return Err(format!("invalid expected value `{rhs}`")))))
        }
        None => (line, None),
    };

    let value = |token: &str| parse_value(token).ok_or_else(|| format!("invalid value `{token}`"));
    let register = |token: &str| parse_register(token).map_err(|error| error.to_string());

    let tokens = lhs.split_whitespace().collect::<Vec<&str>>();
    let command = match *tokens.as_slice() {
        [op, reg] if op.eq_ignore_ascii_case("get") => Command::get(register(reg)?).map_err(|e| e.to_string())?,
        [op, reg, v] if op.eq_ignore_ascii_case("set") => {
            Command::set(register(reg)?, value(v)?).map_err(|e| e.to_string())?
        }
        [op, in0, in1] if op.eq_ignore_ascii_case("ping") => Command::Ping(value(in0)?, value(in1)?),
        [op, acc] if op.eq_ignore_ascii_case("post_process") => Command::PostProcess(value(acc)?),
        _ => return Err(format!("malformed command `{}`", lhs.trim())),
    };
    Ok(Some((command, expected)))
}

/// Parses a whole script.
pub fn parse_script(source: &str) -> Result<Vec<ScriptOp>, CfuError> {
    let mut ops = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let parsed = parse_line(text).map_err(|message| script_error(line, message))?;
        let (command, expected) = some_or!(parsed, continue);
        ops.push(ScriptOp { line, command, expected });
    }
    Ok(ops)
}

/// A checked result that differed from its expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// One-based line number.
    pub line: usize,
    /// Command that produced the result.
    pub command: Command,
    /// Expected result.
    pub expected: u32,
    /// Actual result.
    pub actual: u32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: `{}` returned {} ({:#010x}), expected {} ({:#010x})",
            self.line, self.command, self.actual as i32, self.actual, self.expected as i32, self.expected
        )
    }
}

/// Outcome of a script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Number of commands executed.
    pub executed: usize,
    /// Number of results checked against an expectation.
    pub checked: usize,
    /// Failed checks, in line order.
    pub mismatches: Vec<Mismatch>,
}

impl ScriptReport {
    /// Whether every check passed.
    pub fn is_success(&self) -> bool { self.mismatches.is_empty() }

    /// Process exit status: failure if any check failed.
    pub fn exit_code(&self) -> ExitCode { if self.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE } }
}

impl fmt::Display for ScriptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mismatch in &self.mismatches {
            writeln!(f, "FAIL {mismatch}")?;
        }
        write!(f, "{} commands, {} checks, {} failed", self.executed, self.checked, self.mismatches.len())
    }
}

/// Executes every op in order and records the checks that failed.
pub fn run_script(cfu: &mut CommandProcessor, ops: &[ScriptOp]) -> ScriptReport {
    let mut report = ScriptReport::default();
    for op in ops {
        let actual = cfu.execute(op.command);
        report.executed += 1;

        let expected = some_or!(op.expected, continue);
        report.checked += 1;
        if actual != expected {
            let mismatch = Mismatch { line: op.line, command: op.command, expected, actual };
            tracing::warn!(%mismatch, "check failed");
            report.mismatches.push(mismatch);
        }
    }
    report
}

/// Reads, parses and runs a script file on a fresh accelerator.
pub fn run_script_file(path: impl AsRef<Path>, config: CfuConfig) -> Result<ScriptReport, CfuError> {
    let ops = parse_script(&fs::read_to_string(path)?)?;
    let mut cfu = CommandProcessor::new(config);
    Ok(run_script(&mut cfu, &ops))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values() {
        assert_eq!(parse_value("10"), Some(10));
        assert_eq!(parse_value("0x8000_0000"), Some(0x8000_0000));
        assert_eq!(parse_value("-1"), Some(u32::MAX));
        assert_eq!(parse_value("-0x1"), None);
        assert_eq!(parse_value("ten"), None);
    }

    #[test]
    fn registers_by_name_or_id() {
        assert_eq!(parse_register("macc_out").unwrap(), RegisterId::MaccOut);
        assert_eq!(parse_register("0x70").unwrap(), RegisterId::Verify);
        assert!(matches!(parse_register("0x7f"), Err(CfuError::UnknownRegister(0x7f))));
        assert!(matches!(parse_register("bogus"), Err(CfuError::UnknownRegisterName(_))));
    }

    #[test]
    fn parses_commands_and_skips_comments() {
        let source = "# header\n\nSET verify 10  # add\nget VERIFY = 11\nping 1 -2\npost_process -3 = -128\n";
        let ops = parse_script(source).unwrap();
        assert_eq!(ops, vec![
            ScriptOp { line: 3, command: Command::Set(RegisterId::Verify, 10), expected: None },
            ScriptOp { line: 4, command: Command::Get(RegisterId::Verify), expected: Some(11) },
            ScriptOp { line: 5, command: Command::Ping(1, u32::MAX - 1), expected: None },
            ScriptOp { line: 6, command: Command::PostProcess((-3_i32) as u32), expected: Some((-128_i32) as u32) },
        ]);
    }

    #[test]
    fn reports_line_of_bad_command() {
        let error = parse_script("ping 1 2\nget set_input\n").unwrap_err();
        assert!(matches!(error, CfuError::Script { line: 2, .. }), "{error}");
        assert!(matches!(parse_script("poke 1"), Err(CfuError::Script { line: 1, .. })));
        assert!(matches!(parse_script("set macc_out 1"), Err(CfuError::Script { line: 1, .. })));
        assert!(matches!(parse_script("get verify = x"), Err(CfuError::Script { line: 1, .. })));
    }

    #[test]
    fn run_collects_mismatches() {
        let ops = parse_script("set verify 1\nget verify = 2\nping 1 2\nping 0 0 = 4\n").unwrap();
        let mut cfu = CommandProcessor::default();
        let report = run_script(&mut cfu, &ops);
        assert_eq!(report.executed, 4);
        assert_eq!(report.checked, 2);
        assert!(!report.is_success());
        assert_eq!(report.mismatches, vec![Mismatch {
            line: 4,
            command: Command::Ping(0, 0),
            expected: 4,
            actual: 3
        }]);
        assert_eq!(
            report.to_string(),
            "FAIL line 4: `ping 0 0` returned 3 (0x00000003), expected 4 (0x00000004)\n4 commands, 2 checks, 1 failed"
        );
    }

    #[test]
    fn clean_run_exits_successfully() {
        let report = run_script(&mut CommandProcessor::default(), &parse_script("get verify = 1").unwrap());
        assert!(report.is_success());
        assert_eq!(report.to_string(), "1 commands, 1 checks, 0 failed");
    }

    #[test]
    fn missing_script_file_is_fs_error() {
        assert!(matches!(run_script_file("/nonexistent/script.txt", CfuConfig::default()), Err(CfuError::Fs(_))));
    }
}
