use dotenv::dotenv;
use gas_forecast::config::PipelineConfig;
use gas_forecast::pipeline::run_pipeline;
use log::info;
use std::process;

fn run() -> gas_forecast::error::Result<()> {
    let config = PipelineConfig::from_env()?;
    info!("Using data file {}", config.data_path.display());

    let output = run_pipeline(&config)?;

    println!("{}", output.accuracy);

    let svg = output.plot.with_size(1200, 700).render_svg();
    info!(
        "Rendered forecast plot ({} bytes, {} forecast rows)",
        svg.len(),
        output.forecast.len()
    );
    Ok(())
}

fn main() {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the gas price forecast...");

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
