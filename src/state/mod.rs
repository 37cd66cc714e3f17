//! State management module
//!
//! This module handles all application state, including:
//! - The bounded image gallery database (gallery.rs)
//! - Shared data structures (data.rs)
//! - The analyze → generate → store workflow (controller.rs)

pub mod controller;
pub mod data;
pub mod gallery;
