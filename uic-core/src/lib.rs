//! Core types and utilities for UIC railway ticket barcodes
//!
//! This crate provides the error taxonomy, the bit-addressable buffer every
//! codec is built on, and the frame classification type shared by the
//! higher layers.

pub mod bit_buffer;
pub mod error;
pub mod frame_type;

pub use bit_buffer::BitBuffer;
pub use error::{UicError, UicResult};
pub use frame_type::FrameType;
