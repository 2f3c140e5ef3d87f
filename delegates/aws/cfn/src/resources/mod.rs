//! AWS SDK implementations of the provider traits.

pub mod cloudformation;
pub mod s3;
