//! Nutrient solutions and their linear system.
//!
//! A [`Solution`] dissolves *n* fertilizers in water. The fertilizer masses
//! (the *formulation*) are the unknowns *x* of the linear system
//!
//! ```text
//! A x = b,
//!
//! where A = F - W
//!       b = m (t - w)
//! ```
//!
//! Columns of *F* are the fertilizer vectors, every column of *W* is the water
//! vector *w*, *m* is the total mass and *t* the target composition. Adding a
//! unit of fertilizer mass removes a unit of water mass, so the columns of *A*
//! are the net effect of that substitution on the nutrient masses.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use nalgebra::{Const, DMatrix, DVector, Dyn, OMatrix};

use super::{
    composition::Composition,
    error::{Error, ValidationError},
    nutrient::{Nutrients, STENCIL_LEN},
};

/// Matrix with one row per nutrient and one column per fertilizer.
pub type SystemMatrix = OMatrix<f64, Const<STENCIL_LEN>, Dyn>;

#[derive(Debug)]
struct Mixture {
    mass_total: f64,
    water: Composition,
    fertilizers: Vec<Composition>,
    fertilizer_matrix: OnceLock<SystemMatrix>,
    matrix: OnceLock<SystemMatrix>,
}

#[derive(Debug, Clone, Default)]
struct Cache {
    rhs: OnceLock<Nutrients>,
    composition: OnceLock<Composition>,
    residual: OnceLock<Nutrients>,
    gradient: OnceLock<DVector<f64>>,
}

/// A nutrient solution: fertilizers dissolved in water.
///
/// The solution is immutable. A different formulation of the same fertilizers
/// is obtained by [`spawn`](Solution::spawn), which shares the water, the
/// fertilizers and the target with the original. Derived quantities are
/// computed on first access and cached in the instance.
///
/// ```rust
/// use hydrosolver::{Composition, Nutrient, Solution};
///
/// let water = Composition::new("RO water");
/// let kno3 = Composition::from_nutrients(
///     "Potassium nitrate",
///     [(Nutrient::NitrateN, 0.1385), (Nutrient::K, 0.3867)],
/// );
///
/// let solution = Solution::new(10.0, water, vec![kno3], vec![0.01])?;
///
/// assert!((solution.mass_water() - 9.99).abs() < 1e-12);
/// assert!((solution.composition().get(Nutrient::K) - 0.0003867).abs() < 1e-12);
/// # Ok::<(), hydrosolver::ValidationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Solution {
    mixture: Arc<Mixture>,
    formulation: DVector<f64>,
    target: Option<Arc<Composition>>,
    cache: Cache,
}

impl Solution {
    /// Creates a solution of given total mass (kg) with masses of the
    /// fertilizers given by the formulation (kg). The rest is water.
    ///
    /// Fails if the formulation length does not match the number of
    /// fertilizers or if the fertilizers weigh more than the total mass.
    pub fn new(
        mass_total: f64,
        water: Composition,
        fertilizers: Vec<Composition>,
        formulation: impl Into<DVector<f64>>,
    ) -> Result<Self, ValidationError> {
        let formulation = formulation.into();

        if !mass_total.is_finite() || mass_total < 0.0 {
            return Err(ValidationError::InvalidMass(mass_total));
        }

        if fertilizers.len() != formulation.len() {
            return Err(ValidationError::FormulationMismatch {
                fertilizers: fertilizers.len(),
                formulation: formulation.len(),
            });
        }

        let mass_fertilizers = formulation.sum();
        if mass_fertilizers > mass_total {
            return Err(ValidationError::MassExceeded {
                formulation: mass_fertilizers,
                total: mass_total,
            });
        }

        let mixture = Mixture {
            mass_total,
            water,
            fertilizers,
            fertilizer_matrix: OnceLock::new(),
            matrix: OnceLock::new(),
        };

        Ok(Self {
            mixture: Arc::new(mixture),
            formulation,
            target: None,
            cache: Cache::default(),
        })
    }

    /// Creates a solution of pure water with given fertilizers available,
    /// that is, with zero formulation.
    pub fn dissolve(
        mass_total: f64,
        water: Composition,
        fertilizers: Vec<Composition>,
    ) -> Result<Self, ValidationError> {
        let n = fertilizers.len();
        Self::new(mass_total, water, fertilizers, DVector::zeros(n))
    }

    /// Creates a solution with the same water, fertilizers and target but
    /// with a different formulation.
    ///
    /// Nothing is computed until a derived quantity is requested. The
    /// formulation is not validated against the total mass.
    ///
    /// # Panics
    ///
    /// If the length of the formulation does not match the number of
    /// fertilizers.
    pub fn spawn(&self, formulation: DVector<f64>) -> Self {
        assert_eq!(
            formulation.len(),
            self.mixture.fertilizers.len(),
            "formulation has invalid dimension"
        );

        Self {
            mixture: Arc::clone(&self.mixture),
            formulation,
            target: self.target.clone(),
            cache: Cache {
                // Independent of the formulation.
                rhs: self.cache.rhs.clone(),
                ..Cache::default()
            },
        }
    }

    /// Total mass of the solution in kg.
    pub fn mass_total(&self) -> f64 {
        self.mixture.mass_total
    }

    /// Composition of the water.
    pub fn water(&self) -> &Composition {
        &self.mixture.water
    }

    /// Fertilizers in the order of the formulation.
    pub fn fertilizers(&self) -> &[Composition] {
        &self.mixture.fertilizers
    }

    /// Masses of the fertilizers in kg.
    pub fn formulation(&self) -> &DVector<f64> {
        &self.formulation
    }

    /// Mass of the water in kg.
    pub fn mass_water(&self) -> f64 {
        self.mixture.mass_total - self.formulation.sum()
    }

    /// The composition the solution should have, if assigned.
    pub fn composition_target(&self) -> Option<&Composition> {
        self.target.as_deref()
    }

    /// Assigns the target composition.
    pub fn set_composition_target(&mut self, target: Composition) {
        self.target = Some(Arc::new(target));
        self.cache = Cache::default();
    }

    /// Returns the solution with the target composition assigned.
    pub fn with_composition_target(mut self, target: Composition) -> Self {
        self.set_composition_target(target);
        self
    }

    /// Matrix *F* whose columns are the fertilizer vectors.
    pub fn fertilizer_matrix(&self) -> &SystemMatrix {
        let Mixture {
            fertilizers,
            fertilizer_matrix,
            ..
        } = &*self.mixture;

        fertilizer_matrix.get_or_init(|| {
            SystemMatrix::from_fn_generic(Const::<STENCIL_LEN>, Dyn(fertilizers.len()), |i, j| {
                fertilizers[j].vector()[i]
            })
        })
    }

    /// Matrix *W* whose columns all equal the water vector.
    pub fn water_matrix(&self) -> SystemMatrix {
        let water = self.mixture.water.vector();
        SystemMatrix::from_fn_generic(
            Const::<STENCIL_LEN>,
            Dyn(self.mixture.fertilizers.len()),
            |i, _| water[i],
        )
    }

    /// System matrix *A = F - W*.
    pub fn matrix(&self) -> &SystemMatrix {
        self.mixture
            .matrix
            .get_or_init(|| self.fertilizer_matrix() - self.water_matrix())
    }

    /// Right-hand side *b = m (t - w)* of the system.
    pub fn rhs(&self) -> Result<&Nutrients, Error> {
        let target = self.target.as_ref().ok_or(Error::TargetNotSet)?;

        Ok(self.cache.rhs.get_or_init(|| {
            (target.vector() - self.mixture.water.vector()) * self.mixture.mass_total
        }))
    }

    /// The resulting composition of the solution.
    ///
    /// Solution of zero mass has zero composition.
    pub fn composition(&self) -> &Composition {
        self.cache.composition.get_or_init(|| {
            let name = "Resulting composition";
            let mass_total = self.mixture.mass_total;

            if mass_total == 0.0 {
                Composition::new(name)
            } else {
                let vector = (self.fertilizer_matrix() * &self.formulation
                    + self.mixture.water.vector() * self.mass_water())
                    / mass_total;
                Composition::from_vector(name, vector)
            }
        })
    }

    /// Residual *A x - b* of the system.
    pub fn residual(&self) -> Result<&Nutrients, Error> {
        let rhs = self.rhs()?;

        Ok(self
            .cache
            .residual
            .get_or_init(|| self.matrix() * &self.formulation - rhs))
    }

    /// Least squares cost *|| A x - b ||^2*.
    pub fn cost(&self) -> Result<f64, Error> {
        self.residual().map(|r| r.norm_squared())
    }

    /// Gradient *2 A^T (A x - b)* of the least squares cost.
    pub fn gradient(&self) -> Result<&DVector<f64>, Error> {
        let residual = self.residual()?;

        Ok(self
            .cache
            .gradient
            .get_or_init(|| self.matrix().tr_mul(residual) * 2.0))
    }

    /// Weighted least squares cost *sum_i w_i (A x - b)_i^2*.
    pub fn weighted_cost(&self, weights: &Nutrients) -> Result<f64, Error> {
        let residual = self.residual()?;
        Ok(weights.dot(&residual.component_mul(residual)))
    }

    /// Gradient *2 A^T (w ⊙ (A x - b))* of the weighted least squares cost.
    pub fn weighted_gradient(&self, weights: &Nutrients) -> Result<DVector<f64>, Error> {
        let residual = self.residual()?;
        Ok(self.matrix().tr_mul(&weights.component_mul(residual)) * 2.0)
    }

    /// Combines two batches of the same water and fertilizers into one.
    ///
    /// Total masses and formulations are added, the target is kept from
    /// `self`. Fails with [`ValidationError::MixtureMismatch`] if the water or
    /// the fertilizers differ.
    pub fn mix(&self, other: &Solution) -> Result<Self, ValidationError> {
        if !Arc::ptr_eq(&self.mixture, &other.mixture)
            && (self.water() != other.water() || self.fertilizers() != other.fertilizers())
        {
            return Err(ValidationError::MixtureMismatch);
        }

        self.rebuild(
            self.mass_total() + other.mass_total(),
            &self.formulation + &other.formulation,
        )
    }

    /// Scales the batch, that is, the total mass and the formulation, by
    /// given factor.
    ///
    /// Fails with [`ValidationError::InvalidMass`] for negative or non-finite
    /// factor.
    pub fn scale(&self, factor: f64) -> Result<Self, ValidationError> {
        let mass_total = self.mass_total() * factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(ValidationError::InvalidMass(mass_total));
        }

        self.rebuild(mass_total, &self.formulation * factor)
    }

    fn rebuild(
        &self,
        mass_total: f64,
        formulation: DVector<f64>,
    ) -> Result<Self, ValidationError> {
        let solution = Solution::new(
            mass_total,
            self.mixture.water.clone(),
            self.mixture.fertilizers.clone(),
            formulation,
        )?;

        Ok(Self {
            target: self.target.clone(),
            ..solution
        })
    }

    /// Least squares solution of *A x = b* ignoring the constraints.
    ///
    /// The result may contain negative masses or exceed the total mass. It is
    /// mostly useful as an initial guess after projecting it to the
    /// [domain](super::Domain).
    pub fn unconstrained_formulation(&self) -> Result<DVector<f64>, Error> {
        let rhs = self.rhs()?;
        let n = self.mixture.fertilizers.len();

        if n == 0 {
            return Ok(DVector::zeros(0));
        }

        let a = DMatrix::from_iterator(STENCIL_LEN, n, self.matrix().iter().copied());
        let b = DVector::from_iterator(STENCIL_LEN, rhs.iter().copied());

        a.svd(true, true)
            .solve(&b, f64::EPSILON)
            .map_err(Error::Decomposition)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .mixture
            .fertilizers
            .iter()
            .map(|c| c.name().len())
            .chain([self.mixture.water.name().len(), 12])
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:<width$}{:>15}{:>15}",
            "Composition", "Amount in kg", "Amount in g"
        )?;
        writeln!(f, "{}", "-".repeat(width + 30))?;

        let rows = self
            .mixture
            .fertilizers
            .iter()
            .zip(self.formulation.iter().copied())
            .chain([(&self.mixture.water, self.mass_water())]);

        for (composition, mass) in rows {
            writeln!(
                f,
                "{:<width$}{:>15.7}{:>15.4}",
                composition.name(),
                mass,
                mass * 1e3
            )?;
        }

        writeln!(
            f,
            "{:<width$}{:>15.7}{:>15.4}",
            "Total:",
            self.mixture.mass_total,
            self.mixture.mass_total * 1e3
        )?;
        writeln!(f)?;

        write!(f, "{}", self.composition())
    }
}
