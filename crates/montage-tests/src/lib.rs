//! Integration test crate for Montage.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every montage crate to verify they work together.

#[cfg(test)]
mod timeline;

#[cfg(test)]
mod editing;

#[cfg(test)]
mod playback;
