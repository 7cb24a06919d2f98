//! Presentation layer for the tontine ledger: terminal listings and
//! print-ready report documents. The binary in `main.rs` wires these to
//! the clap command tree.

#![deny(unsafe_code)]

pub mod render;
pub mod report;
