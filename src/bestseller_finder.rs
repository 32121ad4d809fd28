use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::error::RunError;
use crate::scraper::BestsellerScraper;
use crate::scrapers::amazon;
use crate::session::HttpSession;
use crate::sink::{CsvSink, JsonSink, RunAccumulator};
use crate::traits::{RecordSink, SessionGate};

/// Snapshot of the landing page written when no categories are found
pub const CATEGORIES_SNAPSHOT: &str = "categories_error.html";

/// Totals for one finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub categories: usize,
    pub records: usize,
}

#[derive(Clone)]
pub struct BestsellerFinder {
    scraper: BestsellerScraper,
    gate: Arc<dyn SessionGate>,
    config: Config,
    database: Option<Database>,
}

impl BestsellerFinder {
    /// Wires a live HTTP session into the Amazon profile.
    pub async fn new(config: Config) -> Result<Self> {
        let session = Arc::new(
            HttpSession::new(amazon::config(), &config.user_agent, config.request_timeout)?
                .with_step_delay(config.delay),
        );
        let scraper = BestsellerScraper::new(session.clone(), amazon::config(), config.pacing())?
            .with_min_discount_filter(config.enforce_min_discount);

        let database = match &config.database_url {
            Some(url) => Some(Database::new(url).await?),
            None => None,
        };

        Ok(Self::from_parts(scraper, session, config, database))
    }

    pub fn from_parts(
        scraper: BestsellerScraper,
        gate: Arc<dyn SessionGate>,
        config: Config,
        database: Option<Database>,
    ) -> Self {
        Self {
            scraper,
            gate,
            config,
            database,
        }
    }

    /// Fresh sinks for one run
    fn sinks(&self) -> Vec<Box<dyn RecordSink>> {
        let mut sinks: Vec<Box<dyn RecordSink>> =
            vec![Box::new(CsvSink::new(self.config.csv_path()))];

        if let Some(path) = self.config.json_path() {
            sinks.push(Box::new(JsonSink::new(path)));
        }
        if let Some(database) = &self.database {
            sinks.push(Box::new(database.sink_for_run()));
        }

        sinks
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let mut run = RunAccumulator::new(self.sinks());
        self.run_with(&mut run).await
    }

    /// Logs in, discovers categories and walks each one into `run`.
    ///
    /// # Errors
    /// * `RunError::AuthenticationFailed` - Login was refused; nothing is fetched
    /// * `RunError::NoCategoriesFound` - Discovery came back empty
    pub async fn run_with(&self, run: &mut RunAccumulator) -> Result<RunSummary> {
        info!("Starting bestseller scraper for {}", self.scraper.config().name);

        let email = self.config.email.as_deref().unwrap_or_default();
        let password = self.config.password.as_deref().unwrap_or_default();
        if !self.gate.login(email, password).await {
            error!("Failed to login. Exiting...");
            return Err(RunError::AuthenticationFailed.into());
        }

        let categories = self.scraper.discover(self.config.category_limit).await;
        if categories.is_empty() {
            error!("Failed to get categories. Exiting...");
            self.save_landing_snapshot().await;
            return Err(RunError::NoCategoriesFound.into());
        }

        let delay = self.scraper.pacing().delay;
        for (index, category) in categories.iter().enumerate() {
            if index > 0 {
                delay.pause().await;
            }

            info!(category = %category.name, "Scraping category");
            let records = self
                .scraper
                .walk(
                    category,
                    self.config.max_records_per_category,
                    self.config.min_discount,
                    run,
                )
                .await;
            info!(category = %category.name, found = records.len(), "Finished category");
        }

        info!(total = run.len(), "Scraping completed");
        Ok(RunSummary {
            categories: categories.len(),
            records: run.len(),
        })
    }

    async fn save_landing_snapshot(&self) {
        let html = match self.scraper.source().current().await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "no landing page to snapshot");
                return;
            }
        };

        let path = self.config.output_dir.join(CATEGORIES_SNAPSHOT);
        let written = async {
            tokio::fs::create_dir_all(&self.config.output_dir).await?;
            tokio::fs::write(&path, html).await
        }
        .await;

        match written {
            Ok(()) => info!(path = %path.display(), "Saved landing page snapshot"),
            Err(e) => warn!(error = %e, "Failed to save landing page snapshot"),
        }
    }
}
