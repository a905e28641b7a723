//! Extract per-system reservation status from Beaker job results.
//!
//! The `bkr job-results` XML is parsed into an element tree
//! ([`document`]), every `recipe`/`guestrecipe` is enumerated
//! ([`extract`]), and each one's reservation status is derived from
//! the two Beaker reservation mechanisms ([`reserve`]).

pub mod cli;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod report;
pub mod reserve;
pub mod util;
