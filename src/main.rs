use anyhow::Context;
use classweep::{Dataset, SweepConfig, SweepRunner, logging, report, split};
use tracing::info;

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = SweepConfig::default();
    let dataset = Dataset::reference();
    info!(examples = dataset.len(), "dataset loaded");

    let split = split(&dataset, config.test_fraction, config.seed)
        .context("splitting the dataset")?;
    let report = SweepRunner::new(config).run(&split.training, &split.evaluation)?;

    let stdout = std::io::stdout();
    report::write_report(&mut stdout.lock(), &report).context("writing the report")?;
    Ok(())
}
