//! High-level API for optimization.
//!
//! The driver encapsulates all internal state and runs the iterative process
//! until one of the terminal states is reached. The simplest way of using the
//! driver is to initialize it with the defaults:
//!
//! ```rust
//! use hydrosolver::{Composition, Nutrient, OptimizerDriver, Solution};
//!
//! let water = Composition::new("RO water");
//! let fertilizers = vec![
//!     Composition::from_nutrients("Calcium nitrate", [(Nutrient::NitrateN, 0.155), (Nutrient::Ca, 0.19)]),
//!     Composition::from_nutrients("Potassium sulfate", [(Nutrient::K, 0.415), (Nutrient::S, 0.17)]),
//! ];
//! let solution = Solution::dissolve(10.0, water, fertilizers)?;
//!
//! let target = Composition::from_nutrients(
//!     "Target",
//!     [(Nutrient::NitrateN, 1.55e-4), (Nutrient::Ca, 1.9e-4), (Nutrient::K, 4.15e-4), (Nutrient::S, 1.7e-4)],
//! );
//!
//! let descent = OptimizerDriver::builder(&solution, &target).build().run()?;
//!
//! println!("{}", descent.termination());
//! println!("{}", descent.optimized());
//! # Ok::<(), hydrosolver::Error>(())
//! ```
//!
//! If you need to specify additional settings, use the builder methods:
//!
//! ```rust
//! use hydrosolver::algo::projected_gradient::ProjectedGradientOptions;
//! use hydrosolver::{CancelToken, Composition, Event, Nutrients, OptimizerDriver, Solution};
//! # use hydrosolver::Nutrient;
//! #
//! # let fertilizers = vec![
//! #     Composition::from_nutrients("Calcium nitrate", [(Nutrient::NitrateN, 0.155), (Nutrient::Ca, 0.19)]),
//! # ];
//! # let solution = Solution::dissolve(10.0, Composition::new("RO water"), fertilizers)?;
//! # let target = Composition::from_nutrients("Target", [(Nutrient::NitrateN, 1.5e-4)]);
//!
//! let mut options = ProjectedGradientOptions::default();
//! options.set_iter_max(500).set_step_prediction(true);
//!
//! let mut weights = Nutrients::repeat(1.0);
//! weights[Nutrient::Ca.index()] = 0.1;
//!
//! let cancel = CancelToken::new();
//!
//! let mut driver = OptimizerDriver::builder(&solution, &target)
//!     .with_options(options)
//!     .with_weights(weights)
//!     .with_cancel(cancel.clone())
//!     .with_observer(|event: &Event| {
//!         if let Event::Accepted { iter, cost, .. } = event {
//!             println!("iter = {}\tcost = {:e}", iter, cost);
//!         }
//!     })
//!     .build();
//!
//! let descent = driver.run()?;
//! # Ok::<(), hydrosolver::Error>(())
//! ```

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use getset::{CopyGetters, Getters};
use log::{debug, warn};

use crate::{
    algo::{
        projected_gradient::{ProjectedGradientOptions, Step, Waypoint},
        ProjectedGradient,
    },
    core::{Composition, Domain, Error, LeastSquares, Nutrients, Objective, Solution},
    observer::{Event, LogObserver, Observer},
};

/// Reason why the optimization process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The gradient norm dropped below the tolerance.
    Converged,
    /// The projected step does not move the point, there is no feasible
    /// descent direction along the negative gradient.
    Stalled,
    /// The maximum number of iterations was reached.
    MaxIterReached,
    /// The process was interrupted through the [`CancelToken`].
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Termination::Converged => "tolerance reached",
            Termination::Stalled => "no feasible descent direction",
            Termination::MaxIterReached => "maximum number of iterations reached",
            Termination::Cancelled => "cancelled",
        };

        f.write_str(reason)
    }
}

/// Flag for interrupting a running optimization from elsewhere (e.g., a signal
/// handler). The flag is checked once per iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of the optimization process.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Descent {
    /// All accepted points, starting with the initial one. Never empty.
    #[getset(get = "pub")]
    trajectory: Vec<Solution>,
    /// Reason of the termination.
    #[getset(get_copy = "pub")]
    termination: Termination,
}

impl Descent {
    /// The last point of the trajectory.
    pub fn optimized(&self) -> &Solution {
        &self.trajectory[self.trajectory.len() - 1]
    }

    /// Consumes the result, returning the last point of the trajectory.
    pub fn into_optimized(mut self) -> Solution {
        let last = self.trajectory.len() - 1;
        self.trajectory.swap_remove(last)
    }

    /// Consumes the result, returning the trajectory.
    pub fn into_trajectory(self) -> Vec<Solution> {
        self.trajectory
    }

    /// Number of accepted steps.
    pub fn iterations(&self) -> usize {
        self.trajectory.len() - 1
    }
}

/// Builder for the [`OptimizerDriver`].
pub struct OptimizerBuilder<O, B> {
    solution: Solution,
    options: ProjectedGradientOptions,
    objective: O,
    observer: B,
    cancel: Option<CancelToken>,
    warm_start: bool,
}

impl OptimizerBuilder<LeastSquares, LogObserver> {
    fn new(solution: &Solution, target: &Composition) -> Self {
        Self {
            solution: solution.clone().with_composition_target(target.clone()),
            options: ProjectedGradientOptions::default(),
            objective: LeastSquares::new(),
            observer: LogObserver,
            cancel: None,
            warm_start: false,
        }
    }
}

impl<O, B> OptimizerBuilder<O, B> {
    /// Sets the options of the algorithm.
    pub fn with_options(mut self, options: ProjectedGradientOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses weighted least squares objective with given weight per nutrient.
    pub fn with_weights(self, weights: Nutrients) -> OptimizerBuilder<LeastSquares, B> {
        self.with_objective(LeastSquares::weighted(weights))
    }

    /// Sets a custom objective.
    pub fn with_objective<O2>(self, objective: O2) -> OptimizerBuilder<O2, B> {
        OptimizerBuilder {
            solution: self.solution,
            options: self.options,
            objective,
            observer: self.observer,
            cancel: self.cancel,
            warm_start: self.warm_start,
        }
    }

    /// Sets the receiver of progress events. Default: [`LogObserver`].
    pub fn with_observer<B2>(self, observer: B2) -> OptimizerBuilder<O, B2> {
        OptimizerBuilder {
            solution: self.solution,
            options: self.options,
            objective: self.objective,
            observer,
            cancel: self.cancel,
            warm_start: self.warm_start,
        }
    }

    /// Sets the token through which the process can be cancelled.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Whether to start from the projected least squares solution of the
    /// unconstrained system instead of the formulation of the given solution.
    /// Default: `false`.
    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    /// Builds the [`OptimizerDriver`].
    ///
    /// The initial formulation is projected into the domain if it is not
    /// feasible.
    pub fn build(self) -> OptimizerDriver<O, B> {
        let Self {
            solution,
            options,
            objective,
            observer,
            cancel,
            warm_start,
        } = self;

        let dom = Domain::new(solution.mass_total());

        let initial = if warm_start {
            match solution.unconstrained_formulation() {
                Ok(x) => solution.spawn(dom.project(&x)),
                Err(error) => {
                    warn!("warm start not possible: {}", error);
                    solution
                }
            }
        } else {
            solution
        };

        let initial = if dom.contains(initial.formulation()) {
            initial
        } else {
            debug!("initial formulation is not feasible, performing the projection");
            initial.spawn(dom.project(initial.formulation()))
        };

        OptimizerDriver {
            objective,
            observer,
            dom,
            algo: ProjectedGradient::with_options(options),
            cancel,
            initial,
        }
    }
}

/// The driver for the process of optimizing a formulation.
///
/// For default settings, use [`OptimizerDriver::new`]. For more flexibility,
/// use [`OptimizerDriver::builder`]. For the usage of the driver, see
/// [module](self) documentation.
pub struct OptimizerDriver<O, B> {
    objective: O,
    observer: B,
    dom: Domain,
    algo: ProjectedGradient,
    cancel: Option<CancelToken>,
    initial: Solution,
}

impl OptimizerDriver<LeastSquares, LogObserver> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(solution: &Solution, target: &Composition) -> OptimizerBuilder<LeastSquares, LogObserver> {
        OptimizerBuilder::new(solution, target)
    }

    /// Initializes the driver with the default settings.
    pub fn new(solution: &Solution, target: &Composition) -> Self {
        OptimizerDriver::builder(solution, target).build()
    }
}

impl<O, B> OptimizerDriver<O, B> {
    /// The starting point with the target assigned.
    pub fn initial(&self) -> &Solution {
        &self.initial
    }

    /// The domain of feasible formulations.
    pub fn domain(&self) -> &Domain {
        &self.dom
    }

    /// Returns the name of the used optimizer.
    pub fn name(&self) -> &str {
        "Projected gradient descent"
    }
}

impl<O: Objective, B: Observer> OptimizerDriver<O, B> {
    /// Runs the iterative process from the initial point until a terminal
    /// state is reached.
    ///
    /// Stalling, exhausting the iterations and cancellation are not errors,
    /// they are reported by [`Descent::termination`]. An error is returned
    /// only if the objective fails to evaluate.
    pub fn run(&mut self) -> Result<Descent, Error> {
        let iter_max = self.algo.options().iter_max();
        let tolerance = self.algo.options().tolerance();

        self.algo.reset();

        let mut point = Waypoint::new(self.initial.clone(), &self.objective)?;
        self.observer.observe(&Event::Started {
            cost: point.cost(),
            gradient_norm: point.gradient_norm(),
        });

        let mut trajectory = vec![point.solution().clone()];
        let mut iter = 0;

        let termination = loop {
            if self.cancel.as_ref().map_or(false, CancelToken::is_cancelled) {
                break Termination::Cancelled;
            }

            if point.gradient_norm() < tolerance {
                break Termination::Converged;
            }

            if iter == iter_max {
                break Termination::MaxIterReached;
            }

            iter += 1;

            match self
                .algo
                .next(iter, &self.objective, &self.dom, &point, &mut self.observer)?
            {
                Step::Accepted {
                    point: next,
                    backtracks,
                    step,
                } => {
                    self.observer.observe(&Event::Accepted {
                        iter,
                        backtracks,
                        step,
                        step_next: self.algo.step(),
                        cost: next.cost(),
                        gradient_norm: next.gradient_norm(),
                    });

                    trajectory.push(next.solution().clone());
                    point = next;
                }
                Step::Stalled { .. } => break Termination::Stalled,
            }
        };

        self.observer.observe(&Event::Terminated {
            iter: trajectory.len() - 1,
            termination,
        });

        Ok(Descent {
            trajectory,
            termination,
        })
    }
}

/// Optimizes the formulation of the solution towards the target composition
/// with default settings, returning the optimized solution.
///
/// The total mass, the water and the fertilizers are the same as in the given
/// solution. Without weights, the ordinary least squares objective is used.
pub fn optimize(
    solution: &Solution,
    target: &Composition,
    weights: Option<Nutrients>,
) -> Result<Solution, Error> {
    let builder = OptimizerDriver::builder(solution, target);
    let builder = match weights {
        Some(weights) => builder.with_weights(weights),
        None => builder,
    };

    Ok(builder.build().run()?.into_optimized())
}
