//! RFB pixel buffer types and utilities.
//!
//! This crate provides pixel format descriptions, buffer management and the
//! [`DisplaySurface`] sink that framebuffer decoders write into.
//!
//! - [`format`] - [`PixelFormat`] and RGB conversions
//! - [`buffer`] - [`PixelBuffer`] / [`MutablePixelBuffer`] traits
//! - [`managed`] - [`ManagedPixelBuffer`], a `Vec`-backed framebuffer
//! - [`surface`] - [`DisplaySurface`], implemented for [`ManagedPixelBuffer`]

pub mod buffer;
pub mod format;
pub mod managed;
pub mod surface;

pub use buffer::{MutablePixelBuffer, PixelBuffer};
pub use format::PixelFormat;
pub use managed::ManagedPixelBuffer;
pub use surface::DisplaySurface;
