//! Core abstractions and types for hydrosolver.
//!
//! *Users* are mainly interested in [`Composition`] and [`Solution`], and in
//! assigning the target composition they want to reach.
//!
//! Algorithm *developers* are interested in the [`Objective`] trait and the
//! [`Domain`] of feasible formulations.

mod composition;
mod domain;
mod error;
mod nutrient;
mod objective;
mod solution;

pub use composition::*;
pub use domain::*;
pub use error::*;
pub use nutrient::*;
pub use objective::*;
pub use solution::*;
