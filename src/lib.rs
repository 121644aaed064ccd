//! SiteCheck library - website monitoring with voice-call escalation
//!
//! This module exports internal components for integration testing.

pub mod checker;
pub mod cli;
pub mod config;
pub mod escalate;
pub mod monitor;
pub mod redact;
pub mod tls;
pub mod voice;
