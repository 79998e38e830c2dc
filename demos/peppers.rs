use hydrosolver::algo::projected_gradient::ProjectedGradientOptions;
use hydrosolver::{Composition, Event, Nutrient, OptimizerDriver, Solution, Termination};

use Nutrient::*;

fn main() -> Result<(), String> {
    let fertilizers = vec![
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
        ),
        Composition::from_nutrients(
            "Calcium ammonium nitrate",
            [(NitrateN, 0.144), (AmmoniumN, 0.011), (Ca, 0.19)],
        ),
        Composition::from_nutrients("Epsom salt", [(Mg, 0.098612), (S, 0.130096)]),
        Composition::from_nutrients("Fe-EDTA 13.3%", [(Fe, 0.133)]),
        Composition::from_nutrients("Zn-EDTA 15%", [(Zn, 0.15)]),
        Composition::from_nutrients("Boric acid", [(B, 0.174835)]),
    ];

    // Resh, Hydroponic Food Production.
    let target = Composition::from_nutrients(
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
    );

    let solution = Solution::dissolve(150.0, Composition::new("RO water"), fertilizers)
        .map_err(|error| format!("{error}"))?;

    let mut options = ProjectedGradientOptions::default();
    options.set_iter_max(1000).set_step_prediction(true);

    let mut driver = OptimizerDriver::builder(&solution, &target)
        .with_options(options)
        .with_observer(|event: &Event| {
            if let Event::Accepted {
                iter,
                step,
                cost,
                gradient_norm,
                ..
            } = event
            {
                println!(
                    "iter = {}\tstep = {:e}\tcost = {:e}\t|| grad || = {:e}",
                    iter, step, cost, gradient_norm
                );
            }
        })
        .build();

    let descent = driver.run().map_err(|error| format!("{error}"))?;

    println!();
    println!("{}", descent.optimized());
    println!("Target:");
    println!("{}", target);

    match descent.termination() {
        Termination::Cancelled => Err("cancelled".to_string()),
        termination => {
            println!("terminated: {}", termination);
            Ok(())
        }
    }
}
