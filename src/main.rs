use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use bestseller_finder::BestsellerFinder;
use bestseller_finder::config::Config;
use bestseller_finder::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(&config.output_dir)?;

    info!("Starting Bestseller Finder");

    let schedule = config.schedule.clone();
    let finder = BestsellerFinder::new(config).await?;

    // Run once immediately
    let first_run = finder.run().await;
    match &first_run {
        Ok(summary) => info!(
            categories = summary.categories,
            records = summary.records,
            "Run finished"
        ),
        Err(e) => error!("Scraper failed: {e}"),
    }

    let Some(schedule) = schedule else {
        info!("Scraper finished");
        return first_run.map(|_| ());
    };

    let sched = JobScheduler::new().await?;

    let job_finder = finder.clone();
    sched
        .add(Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let finder = job_finder.clone();
            Box::pin(async move {
                match finder.run().await {
                    Ok(summary) => info!(
                        categories = summary.categories,
                        records = summary.records,
                        "Scheduled run finished"
                    ),
                    Err(e) => error!("Scheduled run failed: {e}"),
                }
            })
        })?)
        .await?;

    info!(%schedule, "Scheduler started");
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}
