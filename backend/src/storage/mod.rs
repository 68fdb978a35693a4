//! Storage and collaborator abstractions.
//!
//! The core never talks to Firebase (or any backend) directly; it goes
//! through the traits defined here. `memory` is the reference in-memory
//! implementation used by the domain tests.

pub mod memory;
pub mod traits;

pub use memory::MemoryConnection;
pub use traits::*;
