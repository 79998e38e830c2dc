//! Projected gradient descent.
//!
//! The method takes a step in the negative gradient direction and projects
//! the result back to the [domain](crate::Domain) of feasible formulations.
//! The step size is found by backtracking line search: it is shrunk until the
//! trial point satisfies the [Armijo
//! condition](https://en.wikipedia.org/wiki/Backtracking_line_search)
//!
//! ```text
//! f(x_trial) <= f(x) - sigma * step * || grad f(x) ||^2
//! ```
//!
//! After an iteration that needed no shrinking, the step size grows again.
//!
//! If the projected trial point coincides with the current point, there is no
//! feasible descent direction along the negative gradient and the process
//! [stalls](Step::Stalled).
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [Two-Point Step Size Gradient
//! Methods](https://academic.oup.com/imajna/article-abstract/8/1/141/802460)

use approx::RelativeEq;
use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::DVector;

use crate::{
    core::{Domain, Error, Objective, Solution},
    observer::{Event, Observer},
};

/// Options for [`ProjectedGradient`] optimizer.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct ProjectedGradientOptions {
    /// Maximum number of outer iterations. Default: `100`.
    iter_max: usize,
    /// Initial step size. Default: `0.1`.
    step_init: f64,
    /// The process converges when the gradient norm drops below this value.
    /// Default: `1e-10`.
    tolerance: f64,
    /// Coefficient of the Armijo condition. Default: `0.01`.
    sigma: f64,
    /// Factor for shrinking the step size (and the inverse for growing it).
    /// Default: `0.5`.
    beta: f64,
    /// Whether to scale the step size by the ratio of squared gradient norms
    /// before and after a step. Default: `false`.
    step_prediction: bool,
    /// Relative elementwise tolerance for considering the trial point equal to
    /// the current point. Default: `1e-12`.
    stall_tolerance: f64,
    /// Maximum number of step reductions in one iteration. Exceeding it
    /// stalls the process. Default: `64`.
    backtrack_max: usize,
}

impl Default for ProjectedGradientOptions {
    fn default() -> Self {
        Self {
            iter_max: 100,
            step_init: 0.1,
            tolerance: 1e-10,
            sigma: 1e-2,
            beta: 0.5,
            step_prediction: false,
            stall_tolerance: 1e-12,
            backtrack_max: 64,
        }
    }
}

/// A point of the process: the solution with its cost and gradient.
#[derive(Debug, Clone)]
pub struct Waypoint {
    solution: Solution,
    cost: f64,
    gradient: DVector<f64>,
    gradient_norm2: f64,
}

impl Waypoint {
    /// Evaluates the solution.
    pub fn new<O: Objective>(solution: Solution, objective: &O) -> Result<Self, Error> {
        let cost = objective.cost(&solution)?;
        Self::with_cost(solution, cost, objective)
    }

    fn with_cost<O: Objective>(solution: Solution, cost: f64, objective: &O) -> Result<Self, Error> {
        let gradient = objective.gradient(&solution)?;
        let gradient_norm2 = gradient.norm_squared();

        Ok(Self {
            solution,
            cost,
            gradient,
            gradient_norm2,
        })
    }

    /// The solution.
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// Cost of the solution.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Gradient of the cost.
    pub fn gradient(&self) -> &DVector<f64> {
        &self.gradient
    }

    /// Norm of the gradient.
    pub fn gradient_norm(&self) -> f64 {
        self.gradient_norm2.sqrt()
    }

    /// Consumes the waypoint, returning the solution.
    pub fn into_solution(self) -> Solution {
        self.solution
    }
}

/// Outcome of one iteration of [`ProjectedGradient`].
#[derive(Debug, Clone)]
pub enum Step {
    /// The trial point satisfied the Armijo condition.
    Accepted {
        /// The next point.
        point: Waypoint,
        /// Number of step reductions before acceptance.
        backtracks: usize,
        /// Step size that produced the point.
        step: f64,
    },
    /// No progress can be made from the current point.
    Stalled {
        /// Number of step reductions before stalling.
        backtracks: usize,
    },
}

/// Projected gradient descent optimizer.
///
/// See [module](self) documentation for more details.
#[derive(Debug, Clone)]
pub struct ProjectedGradient {
    options: ProjectedGradientOptions,
    step: f64,
}

impl ProjectedGradient {
    /// Initializes the optimizer with default options.
    pub fn new() -> Self {
        Self::with_options(ProjectedGradientOptions::default())
    }

    /// Initializes the optimizer with given options.
    pub fn with_options(options: ProjectedGradientOptions) -> Self {
        Self {
            options,
            step: options.step_init,
        }
    }

    /// Options of the optimizer.
    pub fn options(&self) -> &ProjectedGradientOptions {
        &self.options
    }

    /// Step size for the next iteration.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Resets the internal state of the optimizer.
    pub fn reset(&mut self) {
        self.step = self.options.step_init;
    }

    /// Performs one outer iteration from `point`.
    ///
    /// The convergence test is not part of the iteration, the caller decides
    /// when to stop based on [`Waypoint::gradient_norm`].
    pub fn next<O, B>(
        &mut self,
        iter: usize,
        objective: &O,
        dom: &Domain,
        point: &Waypoint,
        observer: &mut B,
    ) -> Result<Step, Error>
    where
        O: Objective,
        B: Observer,
    {
        let ProjectedGradientOptions {
            sigma,
            beta,
            step_prediction,
            stall_tolerance,
            backtrack_max,
            ..
        } = self.options;

        let x = point.solution.formulation();
        let mut backtracks = 0;

        loop {
            let step = self.step;

            let x_trial = dom.project(&(x - &point.gradient * step));

            if RelativeEq::relative_eq(&x_trial, x, stall_tolerance, stall_tolerance) {
                debug!("projected step does not move the point (step = {})", step);
                return Ok(Step::Stalled { backtracks });
            }

            let trial = point.solution.spawn(x_trial);
            let cost = objective.cost(&trial)?;

            if cost <= point.cost - sigma * step * point.gradient_norm2 {
                let trial = Waypoint::with_cost(trial, cost, objective)?;

                if step_prediction && trial.gradient_norm2 > 0.0 {
                    self.step *= point.gradient_norm2 / trial.gradient_norm2;
                }

                if backtracks == 0 {
                    self.step /= beta;
                }

                return Ok(Step::Accepted {
                    point: trial,
                    backtracks,
                    step,
                });
            }

            observer.observe(&Event::Rejected {
                iter,
                backtrack: backtracks,
                step,
                cost,
            });

            if backtracks >= backtrack_max {
                debug!("maximum number of step reductions exceeded");
                return Ok(Step::Stalled { backtracks });
            }

            backtracks += 1;
            self.step *= beta;
        }
    }
}

impl Default for ProjectedGradient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{core::LeastSquares, testing::*};

    use approx::assert_relative_eq;
    use nalgebra::dvector;

    #[test]
    fn large_step_backtracks_analytically() {
        // The cost is 0.04 || x - x* ||^2 with x* = (0.5, 0.5). A trial step
        // s moves x to x* + (1 - 0.08 s)(x - x*), which stays feasible for
        // s < 25 and satisfies Armijo iff s <= 2 (1 - sigma) / 0.08 = 24.75.
        // Starting from 1000, the first accepted step is 1000 / 2^6 = 15.625.
        let solution = orthogonal_pair(vec![1.0, 1.0]);
        let objective = LeastSquares::new();
        let dom = Domain::new(solution.mass_total());
        let point = Waypoint::new(solution, &objective).unwrap();

        let mut options = ProjectedGradientOptions::default();
        options.set_step_init(1000.0);
        let mut algo = ProjectedGradient::with_options(options);

        let mut rejected = Vec::new();
        let mut observer = |event: &Event| {
            if let Event::Rejected { step, .. } = event {
                rejected.push(*step);
            }
        };

        match algo.next(1, &objective, &dom, &point, &mut observer).unwrap() {
            Step::Accepted {
                point: next,
                backtracks,
                step,
            } => {
                assert_eq!(backtracks, 6);
                assert_eq!(step, 15.625);
                assert!(next.cost() < point.cost());

                let expected = 0.5 + 0.5 * (1.0 - 0.08 * 15.625);
                assert_relative_eq!(
                    next.solution().formulation(),
                    &dvector![expected, expected],
                    epsilon = 1e-12
                );
            }
            step => panic!("unexpected step {:?}", step),
        }

        assert_eq!(rejected, vec![1000.0, 500.0, 250.0, 125.0, 62.5, 31.25]);

        // No growth after backtracking.
        assert_eq!(algo.step(), 15.625);
    }

    #[test]
    fn step_grows_without_backtracking() {
        let solution = orthogonal_pair(vec![0.0, 0.0]);
        let objective = LeastSquares::new();
        let dom = Domain::new(solution.mass_total());
        let point = Waypoint::new(solution, &objective).unwrap();

        let mut algo = ProjectedGradient::new();

        match algo.next(1, &objective, &dom, &point, &mut ()).unwrap() {
            Step::Accepted {
                backtracks, step, ..
            } => {
                assert_eq!(backtracks, 0);
                assert_eq!(step, 0.1);
            }
            step => panic!("unexpected step {:?}", step),
        }

        assert_relative_eq!(algo.step(), 0.2);

        algo.reset();
        assert_eq!(algo.step(), 0.1);
    }

    #[test]
    fn stalls_at_vertex() {
        // Even the whole mass of the fertilizer cannot reach the target, the
        // optimum is the vertex x = mass_total.
        let solution = unreachable_single(vec![10.0]);
        let objective = LeastSquares::new();
        let dom = Domain::new(solution.mass_total());
        let point = Waypoint::new(solution, &objective).unwrap();

        let mut algo = ProjectedGradient::new();

        assert!(matches!(
            algo.next(1, &objective, &dom, &point, &mut ()).unwrap(),
            Step::Stalled { backtracks: 0 }
        ));
    }

    #[test]
    fn step_prediction_scales_step() {
        let solution = orthogonal_pair(vec![0.0, 0.0]);
        let objective = LeastSquares::new();
        let dom = Domain::new(solution.mass_total());
        let point = Waypoint::new(solution, &objective).unwrap();

        let mut options = ProjectedGradientOptions::default();
        options.set_step_prediction(true);
        let mut algo = ProjectedGradient::with_options(options);

        let next = match algo.next(1, &objective, &dom, &point, &mut ()).unwrap() {
            Step::Accepted { point, .. } => point,
            step => panic!("unexpected step {:?}", step),
        };

        let ratio = point.gradient_norm().powi(2) / next.gradient_norm().powi(2);
        assert_relative_eq!(algo.step(), 0.1 * ratio / 0.5, max_relative = 1e-12);
    }

    #[test]
    fn backtracking_limit_stalls() {
        // Same setup as the analytic backtracking, but the limit is hit
        // before the step becomes acceptable.
        let solution = orthogonal_pair(vec![1.0, 1.0]);
        let objective = LeastSquares::new();
        let dom = Domain::new(solution.mass_total());
        let point = Waypoint::new(solution, &objective).unwrap();

        let mut options = ProjectedGradientOptions::default();
        options.set_step_init(1000.0).set_backtrack_max(2);
        let mut algo = ProjectedGradient::with_options(options);

        let mut rejected = Vec::new();
        let mut observer = |event: &Event| {
            if let Event::Rejected {
                backtrack, step, ..
            } = event
            {
                rejected.push((*backtrack, *step));
            }
        };

        assert!(matches!(
            algo.next(1, &objective, &dom, &point, &mut observer).unwrap(),
            Step::Stalled { backtracks: 2 }
        ));
        assert_eq!(rejected, vec![(0, 1000.0), (1, 500.0), (2, 250.0)]);
    }

    #[test]
    fn stall_tolerance_decides_stalling() {
        // Near the optimum the step moves the point by 8e-6 only.
        let solution = orthogonal_pair(vec![0.501, 0.501]);
        let objective = LeastSquares::new();
        let dom = Domain::new(solution.mass_total());
        let point = Waypoint::new(solution, &objective).unwrap();

        let mut algo = ProjectedGradient::new();
        assert!(matches!(
            algo.next(1, &objective, &dom, &point, &mut ()).unwrap(),
            Step::Accepted { backtracks: 0, .. }
        ));

        let mut options = ProjectedGradientOptions::default();
        options.set_stall_tolerance(1e-4);
        let mut algo = ProjectedGradient::with_options(options);
        assert!(matches!(
            algo.next(1, &objective, &dom, &point, &mut ()).unwrap(),
            Step::Stalled { backtracks: 0 }
        ));
    }
}
