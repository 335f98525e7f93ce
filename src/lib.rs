//! `stmtscan`: credit card statement extraction from email.
//!
//! This crate walks MIME message trees, pulls statement text out of PDF
//! attachments or the plain-text body, extracts transaction lines,
//! categorizes them, and stores one record per statement email.

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod source;
pub mod statement;
pub mod store;
