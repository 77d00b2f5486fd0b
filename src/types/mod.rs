//! Data types shared across the pipeline.

pub mod device;

pub use device::SerialEndpoint;
