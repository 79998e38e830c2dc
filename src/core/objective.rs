use nalgebra::DVector;

use super::{error::Error, nutrient::Nutrients, solution::Solution};

/// The trait for objective functionals minimized by the optimizer.
///
/// An objective assigns a cost to a [`Solution`] (with the target composition
/// assigned) and provides its gradient with respect to the formulation.
///
/// ## Defining an objective
///
/// ```rust
/// use hydrosolver::nalgebra as na;
/// use hydrosolver::{Error, Nutrient, Objective, Solution};
///
/// // Cares about nitrogen only.
/// struct Nitrogen;
///
/// impl Objective for Nitrogen {
///     fn cost(&self, solution: &Solution) -> Result<f64, Error> {
///         let r = solution.residual()?;
///         Ok(r[Nutrient::NitrateN.index()].powi(2) + r[Nutrient::AmmoniumN.index()].powi(2))
///     }
///
///     fn gradient(&self, solution: &Solution) -> Result<na::DVector<f64>, Error> {
///         let mut r = *solution.residual()?;
///         for (i, ri) in r.iter_mut().enumerate() {
///             if i > Nutrient::AmmoniumN.index() {
///                 *ri = 0.0;
///             }
///         }
///         Ok(solution.matrix().tr_mul(&r) * 2.0)
///     }
/// }
/// ```
pub trait Objective {
    /// Cost of the solution.
    fn cost(&self, solution: &Solution) -> Result<f64, Error>;

    /// Gradient of the cost with respect to the formulation.
    fn gradient(&self, solution: &Solution) -> Result<DVector<f64>, Error>;
}

/// Weighted least squares objective *sum_i w_i (A x - b)_i^2*.
///
/// The default has all weights equal to one, which is the ordinary least
/// squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSquares {
    weights: Option<Nutrients>,
}

impl LeastSquares {
    /// Ordinary (unweighted) least squares.
    pub fn new() -> Self {
        Self { weights: None }
    }

    /// Least squares with a weight per nutrient.
    pub fn weighted(weights: Nutrients) -> Self {
        Self {
            weights: Some(weights),
        }
    }

    /// The weights, all ones if unweighted.
    pub fn weights(&self) -> Nutrients {
        self.weights.unwrap_or_else(|| Nutrients::repeat(1.0))
    }
}

impl Default for LeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl Objective for LeastSquares {
    fn cost(&self, solution: &Solution) -> Result<f64, Error> {
        match &self.weights {
            Some(weights) => solution.weighted_cost(weights),
            None => solution.cost(),
        }
    }

    fn gradient(&self, solution: &Solution) -> Result<DVector<f64>, Error> {
        match &self.weights {
            Some(weights) => solution.weighted_gradient(weights),
            None => solution.gradient().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        core::{composition::Composition, nutrient::Nutrient},
        testing::*,
    };

    use approx::assert_relative_eq;

    #[test]
    fn weights_scale_cost() {
        let solution = Solution::new(
            10.0,
            ro_water(),
            vec![potassium_nitrate()],
            vec![0.01],
        )
        .unwrap()
        .with_composition_target(tomato_target());

        let plain = LeastSquares::new();
        let doubled = LeastSquares::weighted(Nutrients::repeat(2.0));

        assert_eq!(plain.weights(), Nutrients::repeat(1.0));
        assert_relative_eq!(
            doubled.cost(&solution).unwrap(),
            2.0 * plain.cost(&solution).unwrap()
        );
        assert_relative_eq!(
            doubled.gradient(&solution).unwrap(),
            plain.gradient(&solution).unwrap() * 2.0
        );
    }

    #[test]
    fn zero_weight_ignores_nutrient() {
        let solution = Solution::new(10.0, ro_water(), vec![potassium_nitrate()], vec![0.0])
            .unwrap()
            .with_composition_target(Composition::from_nutrients(
                "Potassium only",
                [(Nutrient::K, 0.001)],
            ));

        let mut weights = Nutrients::repeat(1.0);
        weights[Nutrient::K.index()] = 0.0;

        assert_eq!(LeastSquares::weighted(weights).cost(&solution).unwrap(), 0.0);
        assert!(LeastSquares::new().cost(&solution).unwrap() > 0.0);
    }
}
