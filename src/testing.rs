//! Compositions and solutions useful for benchmarking, debugging and smoke
//! testing.
//!
//! The fertilizers are pure salts with mass ratios computed from their molar
//! masses, or commercial products with ratios taken from their labels. The
//! targets are common recipes from the hydroponic literature.
//!
//! [`orthogonal_pair`] and [`unreachable_single`] are small problems with known
//! optima, recommended for first tests of an optimizer.
//!
//! # References
//!
//! \[1\] [Hydroponic Food
//! Production](https://www.routledge.com/Hydroponic-Food-Production/Resh/p/book/9780367678227)

#![allow(unused)]

use crate::core::{Composition, Nutrient, Solution};

use Nutrient::*;

/// Calcium nitrate tetrahydrate, Ca(NO3)2 · 4 H2O.
pub fn calcium_nitrate() -> Composition {
    Composition::from_nutrients(
        "Calcium nitrate tetrahydrate",
        [(NitrateN, 0.118624), (Ca, 0.169717)],
    )
}

/// Calcium ammonium nitrate decahydrate, 5 Ca(NO3)2 · NH4NO3 · 10 H2O.
pub fn calcium_ammonium_nitrate() -> Composition {
    Composition::from_nutrients(
        "Calcium ammonium nitrate decahydrate",
        [(NitrateN, 0.144), (AmmoniumN, 0.011), (Ca, 0.19)],
    )
}

/// Potassium nitrate, KNO3.
pub fn potassium_nitrate() -> Composition {
    Composition::from_nutrients("Potassium nitrate", [(NitrateN, 0.138539), (K, 0.386717)])
}

/// Monopotassium phosphate, KH2PO4.
pub fn monopotassium_phosphate() -> Composition {
    Composition::from_nutrients("Monopotassium phosphate", [(P, 0.227606), (K, 0.287307)])
}

/// Magnesium sulfate heptahydrate (Epsom salt), MgSO4 · 7 H2O.
pub fn magnesium_sulfate() -> Composition {
    Composition::from_nutrients(
        "Magnesium sulfate heptahydrate",
        [(Mg, 0.098612), (S, 0.130096)],
    )
}

/// Boric acid, H3BO3.
pub fn boric_acid() -> Composition {
    Composition::from_nutrients("Boric acid", [(B, 0.174835)])
}

/// Iron chelate with 13.3 % of iron.
pub fn iron_chelate() -> Composition {
    Composition::from_nutrients("Fe-EDTA 13.3%", [(Fe, 0.133)])
}

/// Zinc chelate with 15 % of zinc.
pub fn zinc_chelate() -> Composition {
    Composition::from_nutrients("Zn-EDTA 15%", [(Zn, 0.15)])
}

/// Commercial complex fertilizer 3-15-36 with magnesium and trace elements.
pub fn complex_fertilizer() -> Composition {
    Composition::from_nutrients(
        "Complex fertilizer 3-15-36",
        [
            (NitrateN, 0.03),
            (P, 0.065464),
            (K, 0.298855),
            (Mg, 0.024119),
            (S, 0.07),
            (Fe, 0.0005),
            (Zn, 0.00015),
            (B, 0.0001),
            (Mn, 0.0005),
            (Cu, 0.0002),
            (Mo, 0.00005),
        ],
    )
}

/// Water after reverse osmosis, containing nothing.
pub fn ro_water() -> Composition {
    Composition::new("RO water")
}

/// Hard tap water.
pub fn berlin_water() -> Composition {
    Composition::from_nutrients(
        "Tap water (Berlin)",
        [
            (NitrateN, 1.0e-6),
            (K, 5.0e-6),
            (Mg, 1.1e-5),
            (Ca, 1.1e-4),
            (S, 4.0e-5),
            (Fe, 1.0e-7),
        ],
    )
}

/// Target composition for tomatoes.
pub fn tomato_target() -> Composition {
    Composition::from_nutrients(
        "Tomatoes",
        [
            (NitrateN, 1.9e-4),
            (AmmoniumN, 1.0e-5),
            (P, 5.0e-5),
            (K, 3.5e-4),
            (Mg, 5.0e-5),
            (Ca, 1.9e-4),
            (S, 7.0e-5),
            (Fe, 2.0e-6),
            (Zn, 3.0e-7),
            (B, 3.0e-7),
            (Mn, 5.5e-7),
            (Cu, 5.0e-8),
            (Mo, 5.0e-8),
        ],
    )
}

/// Target composition for peppers.
pub fn pepper_target() -> Composition {
    Composition::from_nutrients(
        "Peppers",
        [
            (NitrateN, 1.88e-4),
            (AmmoniumN, 1.2e-5),
            (P, 5.0e-5),
            (K, 3.0e-4),
            (Mg, 5.0e-5),
            (Ca, 1.9e-4),
            (S, 6.5e-5),
            (Fe, 3.0e-6),
            (Zn, 3.0e-7),
            (B, 5.0e-7),
            (Mn, 8.0e-7),
            (Cu, 7.0e-8),
            (Mo, 5.0e-8),
        ],
    )
}

/// Four pure salts covering all macronutrients, in hard tap water, 10 kg.
///
/// The fertilizers are calcium nitrate, potassium nitrate, magnesium sulfate
/// and monopotassium phosphate, in this order.
pub fn realistic_solution(formulation: Vec<f64>) -> Solution {
    Solution::new(
        10.0,
        berlin_water(),
        vec![
            calcium_nitrate(),
            potassium_nitrate(),
            magnesium_sulfate(),
            monopotassium_phosphate(),
        ],
        formulation,
    )
    .expect("valid formulation")
}

/// Mixture of six fertilizers in RO water, 150 kg, with the target set to
/// [`pepper_target`].
pub fn peppers(formulation: Vec<f64>) -> Solution {
    Solution::new(
        150.0,
        ro_water(),
        vec![
            complex_fertilizer(),
            calcium_ammonium_nitrate(),
            magnesium_sulfate(),
            iron_chelate(),
            zinc_chelate(),
            boric_acid(),
        ],
        formulation,
    )
    .expect("valid formulation")
    .with_composition_target(pepper_target())
}

/// Two fertilizers, each providing a different single nutrient, in RO water,
/// 10 kg.
///
/// The cost is *0.04 || x - x* ||^2* with the optimum *x* = (0.5, 0.5)*
/// reachable exactly.
pub fn orthogonal_pair(formulation: Vec<f64>) -> Solution {
    let target = Composition::from_nutrients("Target", [(NitrateN, 0.01), (K, 0.01)]);

    Solution::new(
        10.0,
        ro_water(),
        vec![
            Composition::from_nutrients("Nitrogen", [(NitrateN, 0.2)]),
            Composition::from_nutrients("Potassium", [(K, 0.2)]),
        ],
        formulation,
    )
    .expect("valid formulation")
    .with_composition_target(target)
}

/// Single fertilizer in RO water, 10 kg, that is too weak to reach the target
/// even when the whole mass is the fertilizer.
///
/// The constrained optimum is the vertex *x = 10*.
pub fn unreachable_single(formulation: Vec<f64>) -> Solution {
    let target = Composition::from_nutrients("Target", [(NitrateN, 1.0)]);

    Solution::new(
        10.0,
        ro_water(),
        vec![Composition::from_nutrients("Nitrogen", [(NitrateN, 0.2)])],
        formulation,
    )
    .expect("valid formulation")
    .with_composition_target(target)
}
