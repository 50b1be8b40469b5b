//! Crate options behind Cargo features.

#[cfg(feature = "async")]
mod stream;

#[cfg(feature = "async")]
pub use stream::read_smf;
