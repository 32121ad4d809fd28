//! Live HTTP session against the storefront
//!
//! One cookie-carrying client serves both as the page source the scraper
//! walks and as the session gate that signs in before a run.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use scraper::Html;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::FetchError;
use crate::scraper::PolitenessDelay;
use crate::scraper::extract::{clean_text, element_text};
use crate::traits::{Locator, PageSource, ScraperConfig, SessionGate};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    html: String,
}

/// A sign-in form ready to submit
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormSubmission {
    action: String,
    fields: Vec<(String, String)>,
}

pub struct HttpSession {
    client: Client,
    config: ScraperConfig,
    page: RwLock<Option<LoadedPage>>,
    sign_in_link: Locator,
    sign_in_form: Locator,
    account_greeting: Locator,
    step_delay: PolitenessDelay,
}

impl HttpSession {
    /// Create a session with its own cookie store.
    ///
    /// # Arguments
    /// * `config` - Storefront profile; its sign-in selectors are compiled here
    /// * `user_agent` - User agent sent with every request
    /// * `timeout` - Page load timeout per request
    pub fn new(config: ScraperConfig, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        let selectors = &config.selectors;
        let sign_in_link = Locator::parse("sign-in link", &selectors.sign_in_link)?;
        let sign_in_form = Locator::parse("sign-in form", &selectors.sign_in_form)?;
        let account_greeting = Locator::parse("account greeting", &selectors.account_greeting)?;

        Ok(Self {
            client,
            config,
            page: RwLock::new(None),
            sign_in_link,
            sign_in_form,
            account_greeting,
            step_delay: PolitenessDelay::disabled(),
        })
    }

    /// Pause between sign-in steps
    #[must_use]
    pub fn with_step_delay(mut self, delay: PolitenessDelay) -> Self {
        self.step_delay = delay;
        self
    }

    /// Reads a response into the current page.
    async fn load(&self, response: Response) -> Result<String, FetchError> {
        let url = response.url().to_string();
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let html = response.text().await?;
        *self.page.write().await = Some(LoadedPage {
            url,
            html: html.clone(),
        });
        Ok(html)
    }

    async fn current_page(&self) -> Result<LoadedPage, FetchError> {
        self.page.read().await.clone().ok_or(FetchError::NoPage)
    }

    async fn submit(&self, form: &FormSubmission) -> Result<String, FetchError> {
        let response = self
            .client
            .post(&form.action)
            .form(&form.fields)
            .send()
            .await?;
        self.load(response).await
    }

    /// Fills `field` in the sign-in form on the current page and submits it.
    async fn submit_step(&self, step: &str, field: &str, value: &str) -> bool {
        let page = match self.current_page().await {
            Ok(page) => page,
            Err(e) => {
                error!(step, error = %e, "no page to sign in from");
                return false;
            }
        };

        let Some(mut form) = read_form(&page.html, &page.url, &self.sign_in_form) else {
            error!(step, url = %page.url, "sign-in form not found");
            return false;
        };
        set_field(&mut form.fields, field, value);

        self.step_delay.pause().await;
        if let Err(e) = self.submit(&form).await {
            error!(step, error = %e, "failed to submit sign-in form");
            return false;
        }

        info!(step, "submitted sign-in step");
        true
    }
}

#[async_trait]
impl PageSource for HttpSession {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        self.load(response).await
    }

    async fn current(&self) -> Result<String, FetchError> {
        Ok(self.current_page().await?.html)
    }

    /// A fetched document never renders further, so this checks once.
    async fn wait_until_present(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<String, FetchError> {
        let html = self.current().await?;
        if locator.matches_in(&html) {
            Ok(html)
        } else {
            Err(FetchError::WaitTimeout {
                locator: locator.css().to_string(),
                waited_ms: 0,
            })
        }
    }
}

#[async_trait]
impl SessionGate for HttpSession {
    async fn login(&self, email: &str, password: &str) -> bool {
        info!("Starting login process");

        if email.is_empty() || password.is_empty() {
            error!("Missing login credentials");
            return false;
        }
        info!(email = %mask_email(email), "attempting to log in");

        let home = match self.get(&self.config.sign_in_url).await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "failed to open storefront");
                return false;
            }
        };

        let Some(account_url) = link_href(&home, &self.sign_in_link)
            .and_then(|href| self.config.absolute_url(&href))
        else {
            error!("account link not found");
            return false;
        };

        self.step_delay.pause().await;
        if let Err(e) = self.get(&account_url).await {
            error!(error = %e, "failed to open sign-in page");
            return false;
        }

        if !self.submit_step("email", &self.config.email_field, email).await {
            return false;
        }
        if !self
            .submit_step("password", &self.config.password_field, password)
            .await
        {
            return false;
        }

        if self.is_authenticated().await {
            info!("Successfully logged in");
            true
        } else {
            error!("Failed to verify login");
            false
        }
    }

    async fn is_authenticated(&self) -> bool {
        let Ok(html) = self.current().await else {
            return false;
        };
        let document = Html::parse_document(&html);
        document
            .select(self.account_greeting.selector())
            .next()
            .is_some_and(|greeting| !clean_text(&element_text(greeting)).contains("Sign in"))
    }
}

/// First three and last ten characters, never the whole address
fn mask_email(email: &str) -> String {
    let chars: Vec<char> = email.chars().collect();
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len().saturating_sub(10)..].iter().collect();
    format!("{head}...{tail}")
}

fn link_href(html: &str, locator: &Locator) -> Option<String> {
    let document = Html::parse_document(html);
    let link = document.select(locator.selector()).next()?;
    link.value().attr("href").map(str::to_string)
}

/// Collects the named inputs of the form matching `locator`, resolving its
/// action against the page URL.
fn read_form(html: &str, page_url: &str, locator: &Locator) -> Option<FormSubmission> {
    let document = Html::parse_document(html);
    let form = document.select(locator.selector()).next()?;
    let input = scraper::Selector::parse("input[name]").ok()?;

    let base = Url::parse(page_url).ok()?;
    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base.join(action).ok()?.to_string(),
        _ => base.to_string(),
    };

    let fields = form
        .select(&input)
        .filter_map(|el| {
            let name = el.value().attr("name")?;
            let value = el.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Some(FormSubmission { action, fields })
}

fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    match fields.iter_mut().find(|(key, _)| key == name) {
        Some((_, existing)) => *existing = value.to_string(),
        None => fields.push((name.to_string(), value.to_string())),
    }
}
