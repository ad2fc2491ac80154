//! Collect and emit the report

use std::io::Write;
use std::path::Path;

use service_facts::{Collector, Config, Format, HostProfile, SystemRunner};

pub async fn collect(
    config: Config,
    output: Option<&Path>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let profile = HostProfile::detect(&config.root);
    let runner = SystemRunner::new(config.command_timeout);
    let collector = Collector::new(profile, runner, config);

    let report = collector.collect().await;
    let bytes = report.encode(format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            log::info!("Wrote report to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
