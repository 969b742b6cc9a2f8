//! Reconcile the local beatmap catalog against the collection index and
//! download whatever sets are missing.

pub mod cli;
pub mod config;
pub mod prompt;
pub mod run;
