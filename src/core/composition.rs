//! Nutrient compositions of fertilizers, water and solutions.

use std::{
    fmt,
    ops::{Add, Mul, Neg, Sub},
};

use super::{
    error::ValidationError,
    nutrient::{Nutrient, Nutrients, STENCIL_LEN},
};

/// Immutable vector of nutrient ratios (mass of nutrient per mass of
/// substance) with a name.
///
/// ```rust
/// use hydrosolver::{Composition, Nutrient};
///
/// let can = Composition::from_nutrients(
///     "Calcium ammonium nitrate",
///     [
///         (Nutrient::NitrateN, 0.144),
///         (Nutrient::AmmoniumN, 0.011),
///         (Nutrient::Ca, 0.19),
///     ],
/// );
///
/// assert_eq!(can.get(Nutrient::Ca), 0.19);
/// assert_eq!(can.get(Nutrient::Fe), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Composition {
    name: String,
    vector: Nutrients,
}

impl Composition {
    /// Creates a composition with all ratios zero, e.g., pure (reverse
    /// osmosis) water.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_vector(name, Nutrients::zeros())
    }

    /// Creates a composition from the full vector of ratios.
    pub fn from_vector(name: impl Into<String>, vector: Nutrients) -> Self {
        Self {
            name: name.into(),
            vector,
        }
    }

    /// Creates a composition from a sparse mapping. Unspecified nutrients are
    /// zero, repeated nutrients are overwritten by the last occurrence.
    pub fn from_nutrients<I>(name: impl Into<String>, nutrients: I) -> Self
    where
        I: IntoIterator<Item = (Nutrient, f64)>,
    {
        let mut vector = Nutrients::zeros();
        for (nutrient, ratio) in nutrients {
            vector[nutrient.index()] = ratio;
        }

        Self::from_vector(name, vector)
    }

    /// Creates a composition from raw data ordered by the stencil.
    ///
    /// Fails if the slice length is not equal to the stencil length.
    pub fn from_slice(name: impl Into<String>, ratios: &[f64]) -> Result<Self, ValidationError> {
        if ratios.len() != STENCIL_LEN {
            return Err(ValidationError::InvalidShape {
                expected: STENCIL_LEN,
                actual: ratios.len(),
            });
        }

        Ok(Self::from_vector(name, Nutrients::from_column_slice(ratios)))
    }

    /// Returns the same composition under a different name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Name of the composition.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The vector of ratios ordered by the stencil.
    pub fn vector(&self) -> &Nutrients {
        &self.vector
    }

    /// Ratio of given nutrient.
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        self.vector[nutrient.index()]
    }

    /// Ratios of macronutrients.
    pub fn macronutrients(&self) -> &[f64] {
        &self.vector.as_slice()[..Nutrient::MACRO_LEN]
    }

    /// Ratios of micronutrients.
    pub fn micronutrients(&self) -> &[f64] {
        &self.vector.as_slice()[Nutrient::MACRO_LEN..]
    }

    /// Iterates over all nutrients and their ratios in the stencil order.
    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.iter().copied().zip(self.vector.iter().copied())
    }
}

impl PartialEq for Composition {
    fn eq(&self, other: &Self) -> bool {
        self.vector == other.vector
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Composition: {}", self.name)?;

        for (title, nutrients) in [
            ("Macronutrient", &Nutrient::ALL[..Nutrient::MACRO_LEN]),
            ("Micronutrient", &Nutrient::ALL[Nutrient::MACRO_LEN..]),
        ] {
            writeln!(f)?;
            writeln!(f, "{:<14}{:>15}{:>15}", title, "Ratio", "Amount mg/kg")?;
            writeln!(f, "{}", "-".repeat(44))?;
            for nutrient in nutrients {
                let ratio = self.get(*nutrient);
                writeln!(f, "{:<14}{:>15.7e}{:>15.4}", nutrient.label(), ratio, ratio * 1e6)?;
            }
        }

        Ok(())
    }
}

/// Average of the two compositions, that is, the composition of their
/// mixture in equal masses.
impl Add for &Composition {
    type Output = Composition;

    fn add(self, rhs: Self) -> Self::Output {
        Composition::from_vector(
            format!("{} + {}", self.name, rhs.name),
            (self.vector + rhs.vector) * 0.5,
        )
    }
}

impl Add for Composition {
    type Output = Composition;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Neg for &Composition {
    type Output = Composition;

    fn neg(self) -> Self::Output {
        Composition::from_vector(format!("-({})", self.name), -self.vector)
    }
}

impl Neg for Composition {
    type Output = Composition;

    fn neg(self) -> Self::Output {
        -&self
    }
}

impl Sub for &Composition {
    type Output = Composition;

    fn sub(self, rhs: Self) -> Self::Output {
        Composition::from_vector(
            format!("{} - {}", self.name, rhs.name),
            self.vector - rhs.vector,
        )
    }
}

impl Sub for Composition {
    type Output = Composition;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Mul<f64> for &Composition {
    type Output = Composition;

    fn mul(self, rhs: f64) -> Self::Output {
        Composition::from_vector(format!("{} * ({})", rhs, self.name), self.vector * rhs)
    }
}

impl Mul<f64> for Composition {
    type Output = Composition;

    fn mul(self, rhs: f64) -> Self::Output {
        &self * rhs
    }
}

impl Mul<&Composition> for f64 {
    type Output = Composition;

    fn mul(self, rhs: &Composition) -> Self::Output {
        rhs * self
    }
}

impl Mul<Composition> for f64 {
    type Output = Composition;

    fn mul(self, rhs: Composition) -> Self::Output {
        &rhs * self
    }
}
