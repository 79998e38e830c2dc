//! The nutrient stencil.

use std::{fmt, str::FromStr};

use nalgebra::SVector;

use super::error::ValidationError;

/// Number of nutrients tracked in every composition.
pub const STENCIL_LEN: usize = 13;

/// Vector of nutrient ratios ordered by the stencil.
pub type Nutrients = SVector<f64, STENCIL_LEN>;

/// A nutrient identifier.
///
/// The declaration order is the canonical order of the stencil, that is, the
/// order of entries in every [`Nutrients`] vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nutrient {
    /// Nitrogen in the nitrate form.
    NitrateN,
    /// Nitrogen in the ammonium form.
    AmmoniumN,
    /// Phosphorus.
    P,
    /// Potassium.
    K,
    /// Magnesium.
    Mg,
    /// Calcium.
    Ca,
    /// Sulfur.
    S,
    /// Iron.
    Fe,
    /// Zinc.
    Zn,
    /// Boron.
    B,
    /// Manganese.
    Mn,
    /// Copper.
    Cu,
    /// Molybdenum.
    Mo,
}

impl Nutrient {
    /// All nutrients in the stencil order.
    pub const ALL: [Nutrient; STENCIL_LEN] = [
        Nutrient::NitrateN,
        Nutrient::AmmoniumN,
        Nutrient::P,
        Nutrient::K,
        Nutrient::Mg,
        Nutrient::Ca,
        Nutrient::S,
        Nutrient::Fe,
        Nutrient::Zn,
        Nutrient::B,
        Nutrient::Mn,
        Nutrient::Cu,
        Nutrient::Mo,
    ];

    /// Position of the nutrient in the stencil.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::NitrateN => "N (NO3-)",
            Nutrient::AmmoniumN => "N (NH4+)",
            Nutrient::P => "P",
            Nutrient::K => "K",
            Nutrient::Mg => "Mg",
            Nutrient::Ca => "Ca",
            Nutrient::S => "S",
            Nutrient::Fe => "Fe",
            Nutrient::Zn => "Zn",
            Nutrient::B => "B",
            Nutrient::Mn => "Mn",
            Nutrient::Cu => "Cu",
            Nutrient::Mo => "Mo",
        }
    }

    /// Whether the nutrient is a macronutrient (the first seven entries of
    /// the stencil). The rest are micronutrients.
    pub fn is_macro(self) -> bool {
        self.index() < Self::MACRO_LEN
    }

    pub(crate) const MACRO_LEN: usize = 7;
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Nutrient {
    type Err = ValidationError;

    /// Parses either the label (`N (NO3-)`) or a short identifier (`no3`,
    /// `nh4`, `p`, `fe`, ...). Case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();

        let nutrient = match key.as_str() {
            "n (no3-)" | "no3" | "no3-" | "nitrate" | "nitrate-n" => Nutrient::NitrateN,
            "n (nh4+)" | "nh4" | "nh4+" | "ammonium" | "ammonium-n" => Nutrient::AmmoniumN,
            _ => Nutrient::ALL
                .iter()
                .copied()
                .find(|nutrient| nutrient.label().eq_ignore_ascii_case(&key))
                .ok_or_else(|| ValidationError::UnknownNutrient(s.to_string()))?,
        };

        Ok(nutrient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stencil_order() {
        for (i, nutrient) in Nutrient::ALL.iter().enumerate() {
            assert_eq!(nutrient.index(), i);
        }

        assert_eq!(Nutrient::ALL.iter().filter(|n| n.is_macro()).count(), 7);
        assert!(!Nutrient::Fe.is_macro());
    }

    #[test]
    fn parse_labels_and_identifiers() {
        assert_eq!("N (NO3-)".parse::<Nutrient>(), Ok(Nutrient::NitrateN));
        assert_eq!("nh4".parse::<Nutrient>(), Ok(Nutrient::AmmoniumN));
        assert_eq!("mg".parse::<Nutrient>(), Ok(Nutrient::Mg));
        assert_eq!(" Mo ".parse::<Nutrient>(), Ok(Nutrient::Mo));

        for nutrient in Nutrient::ALL {
            assert_eq!(nutrient.label().parse::<Nutrient>(), Ok(nutrient));
        }
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            "Se".parse::<Nutrient>(),
            Err(ValidationError::UnknownNutrient("Se".to_string()))
        );
    }
}
