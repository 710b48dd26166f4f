//! postgoose CLI - reconcile a PostgreSQL database with a directory of
//! numbered SQL migrations.
//!
//! This crate provides the `postgoose` binary: argument and configuration
//! file handling, logging setup, styled output and exit codes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
