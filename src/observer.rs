//! Progress reporting of the optimization process.
//!
//! The optimizer does not print or log anything by itself. Instead, it sends
//! [events](Event) to an [`Observer`] injected by the caller. Closures taking
//! `&Event` are observers, `()` ignores everything and [`LogObserver`] forwards
//! the events to the [`log`] facade.

use log::{debug, info};

use crate::driver::Termination;

/// An event in the optimization process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The initial point was evaluated.
    Started {
        /// Cost of the initial point.
        cost: f64,
        /// Norm of the gradient in the initial point.
        gradient_norm: f64,
    },
    /// A trial step did not satisfy the Armijo condition and the step size
    /// is going to be reduced.
    Rejected {
        /// Outer iteration, starting from 1.
        iter: usize,
        /// Index of the rejected trial within the iteration, starting from 0.
        backtrack: usize,
        /// Step size of the rejected trial.
        step: f64,
        /// Cost of the rejected trial.
        cost: f64,
    },
    /// A trial step was accepted as the next point.
    Accepted {
        /// Outer iteration, starting from 1.
        iter: usize,
        /// Number of step reductions before the acceptance.
        backtracks: usize,
        /// Step size that produced the point.
        step: f64,
        /// Step size for the next iteration.
        step_next: f64,
        /// Cost of the new point.
        cost: f64,
        /// Norm of the gradient in the new point.
        gradient_norm: f64,
    },
    /// The process terminated.
    Terminated {
        /// Number of accepted steps.
        iter: usize,
        /// Reason of the termination.
        termination: Termination,
    },
}

/// Receiver of the optimization [events](Event).
pub trait Observer {
    /// Called for every event in the order of occurrence.
    fn observe(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> Observer for F {
    fn observe(&mut self, event: &Event) {
        self(event)
    }
}

impl Observer for () {
    fn observe(&mut self, _: &Event) {}
}

/// Observer that writes the progress through the [`log`] facade.
///
/// Steps are logged on `debug` level in a table-like format, start and
/// termination on `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn observe(&mut self, event: &Event) {
        match *event {
            Event::Started {
                cost,
                gradient_norm,
            } => {
                info!("starting projected gradient descent");
                debug!("{:>3}.{:<2}{:>15}{:>15}{:>15}", "i", "j", "step", "cost", "norm(grad)");
                debug!("{:>36.7e}{:>15.7e}", cost, gradient_norm);
            }
            Event::Rejected {
                iter,
                backtrack,
                step,
                cost,
            } => {
                debug!(
                    "{:>3}.{:<2}{:>15.7e}{:>15.7e}{:>15}",
                    iter, backtrack, step, cost, "-------------"
                );
            }
            Event::Accepted {
                iter,
                backtracks,
                step,
                cost,
                gradient_norm,
                ..
            } => {
                debug!(
                    "{:>3}.{:<2}{:>15.7e}{:>15.7e}{:>15.7e}",
                    iter, backtracks, step, cost, gradient_norm
                );
            }
            Event::Terminated { iter, termination } => {
                info!("terminated after {} iterations: {}", iter, termination);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_observer() {
        let mut events = Vec::new();
        let mut observer = |event: &Event| events.push(*event);

        observer.observe(&Event::Started {
            cost: 1.0,
            gradient_norm: 2.0,
        });
        observer.observe(&Event::Terminated {
            iter: 0,
            termination: Termination::Converged,
        });

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Started { cost, .. } if cost == 1.0));
    }

    #[test]
    fn log_observer_accepts_all_events() {
        let mut observer = LogObserver;

        observer.observe(&Event::Rejected {
            iter: 1,
            backtrack: 0,
            step: 0.1,
            cost: 1.0,
        });
        observer.observe(&Event::Accepted {
            iter: 1,
            backtracks: 1,
            step: 0.05,
            step_next: 0.05,
            cost: 0.5,
            gradient_norm: 0.1,
        });
        ().observe(&Event::Terminated {
            iter: 1,
            termination: Termination::Stalled,
        });
    }
}
