//! passage-vector
//!
//! Vector-index backends behind the `VectorBackend` capability trait:
//! an exact in-memory collection and, with the `lance` feature, a LanceDB
//! table adapter.
pub mod memory;
pub mod similarity;

#[cfg(feature = "lance")]
pub mod lance;

pub use memory::MemoryBackend;

#[cfg(feature = "lance")]
pub use lance::LanceBackend;
