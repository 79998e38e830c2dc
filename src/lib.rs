#![allow(clippy::many_single_char_names)]
#![warn(missing_docs)]

//! # Hydrosolver
//!
//! Optimization of fertilizer formulations for hydroponic nutrient solutions.
//!
//! Given a set of fertilizers and the water they are dissolved in, the library
//! finds the masses of the fertilizers (the *formulation*) such that the
//! resulting solution is as close as possible to the desired nutrient
//! composition. The masses must be non-negative and together cannot exceed the
//! total mass of the solution.
//!
//! ## Problem
//!
//! A [`Composition`] is a vector of mass ratios of 13 [nutrients](Nutrient).
//! A [`Solution`] of total mass *m* made of water with composition *w* and
//! fertilizers *f1, ..., fn* with masses *x1, ..., xn* has the composition
//!
//! ```text
//! c(x) = (F x + w (m - sum(x))) / m
//! ```
//!
//! where columns of *F* are the fertilizer compositions. Reaching the target
//! composition *t* is the linear system *A x = b* with *A = F - W* and
//! *b = m (t - w)*, which generally has no exact solution. Instead, the least
//! squares cost
//!
//! ```text
//! || A x - b ||^2
//! ```
//!
//! is minimized over the domain
//!
//! ```text
//! x >= 0 and sum(x) <= m.
//! ```
//!
//! ## Optimizing
//!
//! The [driver](OptimizerDriver) runs the [projected gradient
//! descent](algo::projected_gradient) until the gradient vanishes, no feasible
//! descent direction exists or the iteration budget is exhausted.
//!
//! ```rust
//! use hydrosolver::{optimize, Composition, Nutrient, Solution};
//!
//! let water = Composition::new("RO water");
//! let fertilizers = vec![
//!     Composition::from_nutrients(
//!         "Calcium nitrate",
//!         [(Nutrient::NitrateN, 0.1186), (Nutrient::Ca, 0.1697)],
//!     ),
//!     Composition::from_nutrients(
//!         "Potassium nitrate",
//!         [(Nutrient::NitrateN, 0.1385), (Nutrient::K, 0.3867)],
//!     ),
//!     Composition::from_nutrients(
//!         "Magnesium sulfate",
//!         [(Nutrient::Mg, 0.0986), (Nutrient::S, 0.1301)],
//!     ),
//! ];
//!
//! let solution = Solution::dissolve(10.0, water, fertilizers)?;
//!
//! let target = Composition::from_nutrients(
//!     "Target",
//!     [
//!         (Nutrient::NitrateN, 2.0e-4),
//!         (Nutrient::K, 3.0e-4),
//!         (Nutrient::Mg, 5.0e-5),
//!         (Nutrient::Ca, 1.9e-4),
//!     ],
//! );
//!
//! let optimized = optimize(&solution, &target, None)?;
//!
//! println!("{}", optimized);
//! # Ok::<(), hydrosolver::Error>(())
//! ```
//!
//! Custom cost functionals are supported through the [`Objective`] trait and
//! the progress can be observed through the [`Observer`](observer::Observer)
//! trait. See [`driver`] module for more details.

pub mod algo;
mod core;
pub mod driver;
pub mod observer;

pub use core::*;
pub use driver::{optimize, CancelToken, Descent, OptimizerDriver, Termination};
pub use observer::{Event, LogObserver, Observer};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
