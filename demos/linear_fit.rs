//! Example of fitting a system of equations to data.
//!
//! Fits a straight line to noisy data with both fit adapters, then fits two
//! datasets that share a slope.

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use smitfit::numeric::bindings;
use smitfit::{Fit, LeastSquaresFit, MinimizeFit, Model, SquaredErrorLoss};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Linear fit example");
    println!("==================\n");

    let mut rng = ChaCha8Rng::seed_from_u64(43);
    let normal = Normal::new(0.0, 1.0)?;

    // y = 0.15 * x + 2.5 + noise
    let x = Array1::linspace(0.0, 11.0, 100);
    let y = x.mapv(|x_val| {
        let y_val = 0.15 * x_val + 2.5;
        y_val + normal.sample(&mut rng) * (y_val / 10.0 + 0.2)
    });

    // 1. Bounded least squares
    println!("1. Least squares");
    println!("----------------");
    let model = Model::parse(["y == a*x + b"])?;
    println!("Model: {}", model);

    let mut params = model.define_parameters([("a", 0.2), ("b", 2.0)])?;
    params.set_bounds([("b", (0.0, 5.0))])?;
    println!("{}", params);

    let loss = SquaredErrorLoss::new(model, [("y", y)])?;
    let xdata = bindings([("x", x.clone())]);

    let result = LeastSquaresFit::new(&loss, &params, xdata.clone()).fit()?;
    println!("{}", result);

    // 2. The same fit through the named-variable minimizer
    println!("2. Minimizer");
    println!("------------");
    let result = MinimizeFit::new(&loss, &params, xdata).fit()?;
    println!("{}", result);

    // 3. Two datasets sharing a slope, with one intercept held fixed
    println!("3. Global fit");
    println!("-------------");
    let model = Model::parse(["y1 == k*x + c1", "y2 == k*x + c2"])?;
    let mut params = model.define_parameters([("k", 1.0), ("c1", 0.0), ("c2", -1.0)])?;
    params.fix("c2")?;

    let y1 = x.mapv(|x_val| 0.4 * x_val + 1.0 + 0.05 * normal.sample(&mut rng));
    let y2 = x.mapv(|x_val| 0.4 * x_val - 1.0 + 0.05 * normal.sample(&mut rng));
    let loss = SquaredErrorLoss::new(model, [("y1", y1), ("y2", y2)])?;

    let result = LeastSquaresFit::new(&loss, &params, bindings([("x", x)])).fit()?;
    println!("{}", result);
    println!("As JSON:\n{}", result.to_json()?);

    Ok(())
}
