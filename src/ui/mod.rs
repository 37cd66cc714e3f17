//! UI building blocks
//!
//! - `form.rs` - profile form with suggestion buttons
//! - `result.rs` - loader, error, analysis and generated image
//! - `gallery.rs` - grid of stored images, plus data URL decoding

pub mod form;
pub mod gallery;
pub mod result;
