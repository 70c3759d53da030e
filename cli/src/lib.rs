//! Command-line client for the eduflow admin API.

pub mod cli;
pub mod commands;
