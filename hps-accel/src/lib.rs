//! Behavioral model of the HPS quantized multiply-accumulate accelerator.
//!
//! The host drives the accelerator with three instructions: SET writes a register, GET reads one and
//! PING echoes the previous operands while stepping the multiply-accumulate pipeline. Input and
//! filter words are streamed into windowed stores and multiplied sixteen 8-bit lanes at a time.
//! A fourth instruction requantizes accumulators into 8-bit activations.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
//
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]
#![warn(unreachable_pub)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::type_complexity)]
#![allow(elided_lifetimes_in_paths)]

mod cfu;
mod config;
pub mod constants;
mod error;
mod macc;
pub mod post_process;
mod registers;
pub mod script;
mod store;

pub use cfu::*;
pub use config::*;
pub use constants::{Access, Op, RegisterId};
pub use error::*;
pub use macc::*;
pub use post_process::{Activation, OutputParams, OutputParamsStore, PostProcessUnit};
pub use registers::*;
pub use store::*;
