//! FBref scraper for squad match logs
//!
//! Each squad page carries a "Scores & Fixtures" table (`id="matchlogs_for"`)
//! with one row per match. Supports caching HTML files for offline runs and
//! reduced load on the site.

use super::MatchLogSource;
use crate::data::RawTable;
use crate::{FootballError, Result, ScrapeConfig};
use rand::Rng;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scraper for FBref squad pages
pub struct FbrefScraper {
    client: reqwest::blocking::Client,
    table_id: String,
    /// Politeness delay range in seconds, applied before every network request
    delay_secs: (f64, f64),
    /// Optional cache directory for offline HTML files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl FbrefScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Build around an existing HTTP client
    pub fn with_client(config: &ScrapeConfig, client: reqwest::blocking::Client) -> Self {
        FbrefScraper {
            client,
            table_id: config.table_id.clone(),
            delay_secs: (config.delay_min_secs, config.delay_max_secs),
            cache_dir: config.cache_dir.as_ref().map(PathBuf::from),
            offline_only: config.offline,
        }
    }

    /// Keep fetched pages under `cache_dir` and read them back on later runs
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Never touch the network; every page must already be cached
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Cached copy of `url`: scheme dropped, separators flattened to `_`
    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let stem = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .replace(['/', '?', '&', '=', ':'], "_");
        Some(self.cache_dir.as_ref()?.join(format!("{}.html", stem)))
    }

    fn cached_page(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        let html = std::fs::read_to_string(&path).ok()?;
        log::debug!("Cache hit for {} at {}", url, path.display());
        Some(html)
    }

    fn store_page(&self, url: &str, html: &str) -> Result<()> {
        let Some(path) = self.cache_path(url) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, html)?;
        log::debug!("Cached {} at {}", url, path.display());
        Ok(())
    }

    fn politeness_delay(&self) {
        let (lo, hi) = self.delay_secs;
        if hi <= 0.0 {
            return;
        }
        let secs = if hi > lo {
            rand::thread_rng().gen_range(lo..hi)
        } else {
            lo
        };
        log::debug!("Waiting {:.1}s before request", secs);
        std::thread::sleep(Duration::from_secs_f64(secs));
    }

    /// Download a page body, mapping 429 and other non-success statuses to errors
    fn download(&self, url: &str) -> Result<String> {
        self.politeness_delay();
        log::info!("Fetching {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FootballError::RateLimited {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FootballError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }
}

impl MatchLogSource for FbrefScraper {
    fn fetch(&self, url: &str) -> Result<RawTable> {
        if let Some(html) = self.cached_page(url) {
            return parse_table(&html, &self.table_id);
        }

        if self.offline_only {
            let path = self
                .cache_path(url)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no cache dir>".to_string());
            return Err(FootballError::NotCached {
                url: url.to_string(),
                path,
            });
        }

        let html = self.download(url)?;
        let table = parse_table(&html, &self.table_id)?;
        // Cache only pages that held the table
        if let Err(e) = self.store_page(url, &html) {
            log::warn!("Failed to cache {}: {}", url, e);
        }
        Ok(table)
    }
}

fn table_selector(table_id: &str) -> Result<Selector> {
    Selector::parse(&format!("table[id=\"{}\"]", table_id))
        .map_err(|e| FootballError::Parse(format!("Bad table id {:?}: {}", table_id, e)))
}

/// Extract the table with the given id into a [`RawTable`].
///
/// The header comes from the last row of `thead` (the first row made of `th`
/// cells when there is no `thead`). Repeated header rows and spacer rows in
/// the body are skipped.
pub fn parse_table(html: &str, table_id: &str) -> Result<RawTable> {
    let document = Html::parse_document(html);
    let table_sel = table_selector(table_id)?;
    let head_row_sel = Selector::parse("thead tr").unwrap();
    let body_row_sel = Selector::parse("tbody tr").unwrap();
    let any_row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| FootballError::Parse(format!("No table with id {:?}", table_id)))?;

    let header_row = table.select(&head_row_sel).last().or_else(|| {
        table
            .select(&any_row_sel)
            .find(|row| row.select(&cell_sel).all(|c| c.value().name() == "th"))
    });
    let header_row = header_row
        .ok_or_else(|| FootballError::Parse(format!("Table {:?} has no header row", table_id)))?;

    let headers: Vec<String> = header_row
        .select(&cell_sel)
        .map(|c| cell_text(&c).unwrap_or_default())
        .collect();
    if headers.is_empty() {
        return Err(FootballError::Parse(format!(
            "Table {:?} has an empty header row",
            table_id
        )));
    }

    let mut raw = RawTable::new(headers);
    let mut body_rows: Vec<ElementRef> = table.select(&body_row_sel).collect();
    if body_rows.is_empty() {
        body_rows = table
            .select(&any_row_sel)
            .filter(|row| *row != header_row)
            .collect();
    }

    for row in body_rows {
        if is_filler_row(&row, &cell_sel) {
            continue;
        }
        raw.push_row(row.select(&cell_sel).map(|c| cell_text(&c)).collect());
    }

    log::debug!("Parsed {} rows from table {:?}", raw.len(), table_id);
    Ok(raw)
}

fn cell_text(cell: &ElementRef) -> Option<String> {
    let text = cell.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Repeated header rows ("thead" class) and spacer rows inside the body
fn is_filler_row(row: &ElementRef, cell_sel: &Selector) -> bool {
    let class = row.value().attr("class").unwrap_or("");
    if class.contains("thead") || class.contains("spacer") {
        return true;
    }
    let mut cells = row.select(cell_sel).peekable();
    cells.peek().is_none() || cells.all(|c| c.value().name() == "th")
}
