//! Feasible set of formulations and the simplex projection.

use nalgebra::DVector;

/// Euclidean projection of `v` onto the scaled probability simplex, that is,
/// the set of vectors with non-negative entries summing to `mass`.
///
/// Non-positive `mass` projects everything to zero.
///
/// # References
///
/// \[1\] [Large-scale Multiclass Support Vector Machine Training via Euclidean
/// Projection onto the Simplex](https://mblondel.org/publications/mblondel-icpr2014.pdf)
/// (Algorithm 2)
pub fn project_simplex(v: &DVector<f64>, mass: f64) -> DVector<f64> {
    if v.is_empty() || mass <= 0.0 {
        return DVector::zeros(v.len());
    }

    let mut sorted = v.iter().copied().collect::<Vec<_>>();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));

    // Find the last k for which u_k - (S_k - m) / k stays positive. The
    // condition holds on a prefix and always for k = 1 when m > 0.
    let mut cumsum = 0.0;
    let mut theta = sorted[0] - mass;
    for (k, uk) in sorted.iter().enumerate() {
        cumsum += uk;
        let candidate = (cumsum - mass) / (k + 1) as f64;
        if uk - candidate > 0.0 {
            theta = candidate;
        } else {
            break;
        }
    }

    v.map(|vi| (vi - theta).max(0.0))
}

/// Feasible formulations of a solution with given total mass.
///
/// A formulation is feasible when all fertilizer masses are non-negative and
/// together they do not exceed the total mass, so that the remaining water
/// mass is non-negative too.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    mass_total: f64,
}

impl Domain {
    /// Creates the domain for given total mass.
    pub fn new(mass_total: f64) -> Self {
        Self { mass_total }
    }

    /// Total mass of the solution.
    pub fn mass_total(&self) -> f64 {
        self.mass_total
    }

    /// Checks whether the formulation is feasible.
    pub fn contains(&self, x: &DVector<f64>) -> bool {
        x.iter().all(|xi| *xi >= 0.0) && x.sum() <= self.mass_total
    }

    /// Euclidean projection of `x` into the domain.
    ///
    /// Clipping negative entries is the projection as long as the clipped
    /// masses fit into the total mass. Otherwise the mass budget is binding
    /// and the projection lies on the simplex of the total mass.
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        let clipped = x.map(|xi| xi.max(0.0));

        if clipped.sum() <= self.mass_total {
            clipped
        } else {
            project_simplex(x, self.mass_total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::dvector;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn assert_on_simplex(x: &DVector<f64>, mass: f64) {
        assert!(x.iter().all(|xi| *xi >= 0.0), "negative entry in {:?}", x);
        assert_abs_diff_eq!(x.sum(), mass, epsilon = 1e-9);
    }

    #[test]
    fn simplex_random_vectors() {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Normal::new(0.0, 10.0).unwrap();

        for _ in 0..500 {
            let n = rng.gen_range(1..20);
            let mass = rng.gen_range(0.0..100.0);
            let v = DVector::from_iterator(n, normal.sample_iter(&mut rng).take(n));

            assert_on_simplex(&project_simplex(&v, mass), mass);
        }
    }

    #[test]
    fn simplex_idempotent_on_feasible() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let n = rng.gen_range(1..10);
            let v = DVector::from_fn(n, |_, _| rng.gen_range(0.0..1.0));
            let mass = v.sum();

            assert_relative_eq!(project_simplex(&v, mass), v, epsilon = 1e-12);
        }

        let vertex = dvector![0.0, 3.0, 0.0];
        assert_eq!(project_simplex(&vertex, 3.0), vertex);
    }

    #[test]
    fn simplex_zero_mass() {
        let v = dvector![1.0, -2.0, 3.0];
        assert_eq!(project_simplex(&v, 0.0), DVector::zeros(3));
    }

    #[test]
    fn simplex_uniform_split() {
        let v = dvector![4.0, 4.0, 4.0, 4.0];
        assert_relative_eq!(project_simplex(&v, 2.0), dvector![0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn simplex_one_dimensional() {
        for value in [-5.0, 0.0, 0.3, 10.0] {
            assert_relative_eq!(project_simplex(&dvector![value], 2.0), dvector![2.0]);
        }
    }

    #[test]
    fn simplex_known_projection() {
        // theta = (3 + 1 - 2) / 2 = 1
        let v = dvector![3.0, 1.0, -1.0];
        assert_relative_eq!(project_simplex(&v, 2.0), dvector![2.0, 0.0, 0.0]);

        // theta = (0.5 + 0.4 - 1) / 2 = -0.05
        let v = dvector![0.5, 0.4, -0.3];
        assert_relative_eq!(project_simplex(&v, 1.0), dvector![0.55, 0.45, 0.0]);
    }

    #[test]
    fn domain_clips_inside_budget() {
        let dom = Domain::new(10.0);
        let x = dvector![-1.0, 2.0, 3.0];

        assert!(!dom.contains(&x));
        assert_eq!(dom.project(&x), dvector![0.0, 2.0, 3.0]);
        assert!(dom.contains(&dom.project(&x)));
    }

    #[test]
    fn domain_binding_budget() {
        let dom = Domain::new(10.0);
        let x = dvector![8.0, 6.0, -1.0];
        let projected = dom.project(&x);

        assert_on_simplex(&projected, 10.0);
        assert_relative_eq!(projected, dvector![6.0, 4.0, 0.0]);
    }

    #[test]
    fn domain_one_dimensional_clips() {
        let dom = Domain::new(2.0);

        assert_eq!(dom.project(&dvector![-5.0]), dvector![0.0]);
        assert_eq!(dom.project(&dvector![0.3]), dvector![0.3]);
        assert_relative_eq!(dom.project(&dvector![10.0]), dvector![2.0]);
    }

    #[test]
    fn domain_idempotent() {
        let dom = Domain::new(1.0);
        let x = dvector![0.2, 0.0, 0.3];

        assert!(dom.contains(&x));
        assert_eq!(dom.project(&x), x);
    }
}
