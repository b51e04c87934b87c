use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use smpc::config::{Anneal, Plant, Weights};
use smpc::driver::Controller;
use smpc::State;

// cargo run --bin stabilize --release

const H: usize = 20;
const SAMPLES: usize = 1000;
const CYCLES: usize = 100;

fn main() -> Result<()> {
    SimpleLogger::new().with_level(LevelFilter::Info).init()?;

    let plant = Plant::default();
    let weights = Weights::default();
    let anneal = Anneal::default();

    // Start at rest; the target asks for one full turn while holding position.
    let mut controller = Controller::<H>::new(plant, weights, anneal, State::zeros(), SAMPLES)?;

    std::fs::create_dir_all("logs")?;
    let mut wtr = csv::Writer::from_path("logs/stabilize.csv")?;
    wtr.write_record(["t", "u1", "u2", "px", "py", "theta", "vx", "vy", "omega", "cost"])?;

    let now = std::time::Instant::now();
    controller.run(CYCLES, |i, out| {
        let t = (i + 1) as f64 * plant.dt;
        let x = out.state;
        println!(
            "t: {:4.1}, u: [{:5.2}, {:5.2}], x: [{:6.2}, {:6.2}, {:6.2}, {:5.2}, {:5.2}, {:5.2}], J: {:.3e}",
            t, out.control[0], out.control[1], x[0], x[1], x[2], x[3], x[4], x[5], out.best_cost
        );
        wtr.write_record(&[
            t.to_string(),
            out.control[0].to_string(),
            out.control[1].to_string(),
            x[0].to_string(),
            x[1].to_string(),
            x[2].to_string(),
            x[3].to_string(),
            x[4].to_string(),
            x[5].to_string(),
            out.best_cost.to_string(),
        ])
        .expect("write error");
        wtr.flush().expect("flush error");
    });
    println!("elapsed: {:.2} sec", now.elapsed().as_secs_f64());
    Ok(())
}
