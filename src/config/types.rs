use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Job-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Listing site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Listing URL; `page=N` is set per page, replacing any `page` pair already present
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Number of consecutive failed listing pages after which the walk gives up; 0 means
    /// keep walking on the last readable marker
    #[serde(
        rename = "max-consecutive-page-failures",
        default = "default_max_page_failures"
    )]
    pub max_consecutive_page_failures: u32,

    /// Number of detail pages fetched at once
    #[serde(rename = "detail-concurrency", default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Whole-run retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per run, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (seconds)
    #[serde(rename = "delay-secs", default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

/// CSS selectors used by the extractors
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub listing: ListingSelectors,
    #[serde(default)]
    pub detail: DetailSelectors,
}

/// Selectors for listing pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One element per posting
    pub item: String,

    /// Attribute of the item element holding the detail page URL
    #[serde(rename = "reference-attribute")]
    pub reference_attribute: String,

    /// Present while more pages are available
    #[serde(rename = "next-page-marker")]
    pub next_page_marker: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: ".job-description-wrapper".to_string(),
            reference_attribute: "data-href".to_string(),
            next_page_marker: "li.pager-item.active".to_string(),
        }
    }
}

/// Selectors for detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub title: String,
    pub employer: String,
    pub location: String,
    #[serde(rename = "employment-type")]
    pub employment_type: String,
    pub experience: String,
    pub qualification: String,
    #[serde(rename = "description-items")]
    pub description_items: String,
    #[serde(rename = "requirement-items")]
    pub requirement_items: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title: ".job-adtitle h1".to_string(),
            employer: ".job-ad-company .company-title".to_string(),
            location: ".job-ad-criteria .field-name-field-offre-region .field-item".to_string(),
            employment_type: ".job-ad-criteria .field-name-field-offre-contrat-type .field-item"
                .to_string(),
            experience: ".job-ad-criteria .field-name-field-offre-niveau-experience .field-item"
                .to_string(),
            qualification: ".job-ad-criteria .field-name-field-offre-niveau-etude .field-item"
                .to_string(),
            description_items: ".job-description ul li".to_string(),
            requirement_items: ".job-qualifications ul li".to_string(),
        }
    }
}

impl DetailSelectors {
    /// Returns every selector paired with its config key, for validation
    pub fn named(&self) -> [(&'static str, &str); 8] {
        [
            ("title", &self.title),
            ("employer", &self.employer),
            ("location", &self.location),
            ("employment-type", &self.employment_type),
            ("experience", &self.experience),
            ("qualification", &self.qualification),
            ("description-items", &self.description_items),
            ("requirement-items", &self.requirement_items),
        ]
    }
}

fn default_max_page_failures() -> u32 {
    5
}

fn default_detail_concurrency() -> usize {
    1
}

fn default_max_attempts() -> u32 {
    5
}

fn default_delay_secs() -> u64 {
    10
}
