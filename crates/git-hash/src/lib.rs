//! Hash computation and object identity for the merge engine.
//!
//! This crate provides the `ObjectId` type, hash computation, and hex
//! encoding/decoding used throughout the object model and merge engine.

mod error;
pub mod hex;
mod oid;
pub mod hasher;

pub use error::HashError;
pub use oid::ObjectId;
