//! Stagehand - Desktop control MCP server
//!
//! This library provides an MCP (Model Context Protocol) server that lets an
//! AI assistant observe and drive a desktop.
//!
//! ## Features
//!
//! - Screen size and cursor position
//! - Mouse movement, clicks, scrolling and drags
//! - Keyboard typing (with a clipboard fallback for Unicode), keys and shortcuts
//! - Screenshots of the screen or a region, optionally at half resolution
//!
//! ## Supported Environments
//!
//! - macOS (Accessibility and Screen Recording permissions required)
//! - Windows
//! - Linux on X11 (`xclip` needed for Unicode typing)

pub mod backend;
pub mod core;
pub mod input;
pub mod platform;
pub mod screenshot;
pub mod server;

#[cfg(test)]
mod testing;
