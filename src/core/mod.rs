//! Core types shared by every tool: configuration, errors and geometry.

pub mod config;
pub mod error;
pub mod geometry;
