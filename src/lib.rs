//! Subtran - SRT Subtitle Translation
//!
//! Reads an SRT file, translates the text of every caption block with a
//! pretrained sequence-to-sequence model, and writes a new SRT file that
//! keeps the original indices and timestamps.

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod subtitle;
pub mod translate;
pub mod workflow;
