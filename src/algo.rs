//! The collection of implemented algorithms.

pub mod projected_gradient;

pub use projected_gradient::ProjectedGradient;
