//! Request orchestration: cache lookup, fetch, extract, store.

use std::sync::Arc;
use std::time::Instant;

use armory_core::{CacheKey, CacheStore, Error, ScrapeResult};

use crate::extract::Extractor;
use crate::fetch::Fetcher;

/// Where a scrape result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeSource {
    Cache,
    Fresh,
}

/// Outcome of a successful scrape.
#[derive(Debug, Clone)]
pub struct Scrape {
    pub result: Arc<ScrapeResult>,
    pub source: ScrapeSource,
}

/// Serves character data from the cache, scraping on a miss.
pub struct Scraper {
    cache: Arc<CacheStore>,
    fetcher: Fetcher,
    extractor: Arc<dyn Extractor>,
}

impl Scraper {
    pub fn new(cache: Arc<CacheStore>, fetcher: Fetcher, extractor: Arc<dyn Extractor>) -> Self {
        Self { cache, fetcher, extractor }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Return the equipment of `character`.
    ///
    /// A fresh cached result is returned without touching the browser.
    /// Otherwise exactly one fetch is attempted; only successful results are
    /// cached.
    pub async fn scrape(&self, character: &str) -> Result<Scrape, Error> {
        let key = CacheKey::new(character)?;

        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!(character = %key, "cache hit");
            return Ok(Scrape { result: entry.payload, source: ScrapeSource::Cache });
        }

        let start = Instant::now();
        let (result, fetch_ms) = self.scrape_fresh(character).await.inspect_err(|e| {
            tracing::warn!(
                character = %key,
                stage = ?e.stage(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "scrape failed: {e}"
            );
        })?;

        tracing::info!(
            character = %key,
            elapsed_ms = start.elapsed().as_millis() as u64,
            fetch_ms,
            records = result.record_count(),
            left = result.left.len(),
            right = result.right.len(),
            bottom = result.bottom.len(),
            "character scraped"
        );

        let result = self.cache.put(key, result);
        Ok(Scrape { result, source: ScrapeSource::Fresh })
    }

    /// Fetch and extract; returns the result with the page fetch time in ms.
    async fn scrape_fresh(&self, character: &str) -> Result<(ScrapeResult, u64), Error> {
        let page = self.fetcher.fetch(character).await?;
        let fetch_ms = page.fetch_ms;
        let extracted = match page.content().await {
            Ok(html) => self.extractor.extract(&html),
            Err(e) => Err(e),
        };
        page.close().await;
        extracted.map(|result| (result, fetch_ms))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::extract::ZoneExtractor;
    use crate::fetch::FetchConfig;
    use crate::render::{NavigationOutcome, ScriptedDriver, ScriptedPage};

    const FROSTBITE: &str = r#"
        <html><head><title>Frostbite - Icecrown - Armory</title></head><body>
            <div class="item-left">
                <div><div><a href="/item/51290" rel="item=51290"><img src="/icons/helm.jpg" alt="Helm"></a></div></div>
            </div>
            <div class="item-right">
                <div><div><a href="/item/50604"><img src="/icons/gloves.jpg"></a></div></div>
            </div>
        </body></html>
    "#;

    struct BrokenExtractor;

    impl Extractor for BrokenExtractor {
        fn extract(&self, _html: &str) -> Result<ScrapeResult, Error> {
            Err(Error::ExtractFailed("zone selector could not be evaluated".into()))
        }
    }

    fn scraper_with(driver: &ScriptedDriver, extractor: Arc<dyn Extractor>) -> Scraper {
        let fetcher = Fetcher::new(Arc::new(driver.clone()), FetchConfig::default());
        Scraper::new(Arc::new(CacheStore::default()), fetcher, extractor)
    }

    fn scraper(driver: &ScriptedDriver) -> Scraper {
        scraper_with(driver, Arc::new(ZoneExtractor::new()))
    }

    #[tokio::test]
    async fn test_scrape_then_cache_hit() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = scraper(&driver);

        let first = scraper.scrape("Frostbite").await.unwrap();
        assert_eq!(first.source, ScrapeSource::Fresh);
        assert_eq!(first.result.left.len(), 1);
        assert_eq!(first.result.left[0]["href"], "/item/51290");
        assert_eq!(first.result.left[0]["src"], "/icons/helm.jpg");
        assert_eq!(first.result.right.len(), 1);
        assert!(first.result.bottom.is_empty());
        assert_eq!(scraper.cache().len(), 1);

        let second = scraper.scrape("frostbite ").await.unwrap();
        assert_eq!(second.source, ScrapeSource::Cache);
        assert!(Arc::ptr_eq(&first.result, &second.result));
        assert_eq!(driver.launches(), 1);
        assert_eq!(driver.closes(), 1);
    }

    #[tokio::test]
    async fn test_empty_character_rejected() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let result = scraper(&driver).scrape("   ").await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(driver.launches(), 0);
    }

    #[tokio::test]
    async fn test_extract_failure_not_cached() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = scraper_with(&driver, Arc::new(BrokenExtractor));

        let result = scraper.scrape("Frostbite").await;
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
        assert!(scraper.cache().is_empty());
        assert_eq!(driver.closes(), 1);

        let _ = scraper.scrape("Frostbite").await;
        assert_eq!(driver.launches(), 2);
        assert_eq!(driver.closes(), 2);
    }

    #[tokio::test]
    async fn test_content_failure_closes_session() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE).with_content_error("target crashed"));
        let scraper = scraper(&driver);

        let result = scraper.scrape("Frostbite").await;
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
        assert!(scraper.cache().is_empty());
        assert_eq!(driver.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_content_released_and_not_cached() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE).with_hanging_content());
        let scraper = scraper(&driver);

        let result = tokio::time::timeout(Duration::from_secs(600), scraper.scrape("Frostbite"))
            .await
            .expect("scrape stays within its bounds");
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
        assert!(scraper.cache().is_empty());
        assert_eq!(driver.closes(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_characters_get_own_sessions() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = scraper(&driver);

        let (frostbite, arthas) = tokio::join!(scraper.scrape("Frostbite"), scraper.scrape("Arthas"));

        assert_eq!(frostbite.unwrap().source, ScrapeSource::Fresh);
        assert_eq!(arthas.unwrap().source, ScrapeSource::Fresh);
        assert_eq!(driver.launches(), 2);
        assert_eq!(driver.closes(), 2);
        assert_eq!(scraper.cache().len(), 2);

        let mut visited = driver.visited();
        visited.sort();
        assert_eq!(
            visited,
            vec![
                "https://armory.warmane.com/character/Arthas/Icecrown/summary".to_string(),
                "https://armory.warmane.com/character/Frostbite/Icecrown/summary".to_string(),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_each_release_session() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = Arc::new(scraper(&driver));

        let names = ["Frostbite", "Arthas", "Jaina", "Thrall", "Sylvanas", "Uther"];
        let tasks: Vec<_> = names
            .iter()
            .map(|&name| {
                let scraper = Arc::clone(&scraper);
                tokio::spawn(async move { scraper.scrape(name).await.map(|s| s.source) })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), ScrapeSource::Fresh);
        }

        assert_eq!(driver.launches(), names.len());
        assert_eq!(driver.closes(), names.len());
        assert_eq!(scraper.cache().len(), names.len());
    }

    #[tokio::test]
    async fn test_dot_segment_rejected_before_launch() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = scraper(&driver);

        for name in [".", ".."] {
            let result = scraper.scrape(name).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }
        assert!(driver.last_options().is_none());
        assert!(scraper.cache().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_not_cached() {
        let driver = ScriptedDriver::new(
            ScriptedPage::ready(FROSTBITE).with_navigation(NavigationOutcome::Fail("net::ERR_CONNECTION_RESET".into())),
        );
        let scraper = scraper(&driver);

        let result = scraper.scrape("Frostbite").await;
        assert!(matches!(result, Err(Error::NavigationFailed(_))));
        assert!(scraper.cache().is_empty());
        assert_eq!(driver.launches(), 1);
        assert_eq!(driver.closes(), 1);
    }

    #[tokio::test]
    async fn test_challenge_not_cached() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE).with_title("Attention Required! | Cloudflare"));
        let scraper = scraper(&driver);

        let result = scraper.scrape("Frostbite").await;
        assert!(matches!(result, Err(Error::ChallengeDetected(_))));
        assert!(scraper.cache().is_empty());
        assert_eq!(driver.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_triggers_refetch() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = scraper(&driver);

        scraper.scrape("Frostbite").await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(scraper.scrape("Frostbite").await.unwrap().source, ScrapeSource::Cache);

        tokio::time::advance(Duration::from_secs(1)).await;
        let again = scraper.scrape("Frostbite").await.unwrap();
        assert_eq!(again.source, ScrapeSource::Fresh);
        assert_eq!(driver.launches(), 2);
        assert_eq!(scraper.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_characters_cached_separately() {
        let driver = ScriptedDriver::new(ScriptedPage::ready(FROSTBITE));
        let scraper = scraper(&driver);

        scraper.scrape("Frostbite").await.unwrap();
        scraper.scrape("Arthas").await.unwrap();

        assert_eq!(scraper.cache().len(), 2);
        assert_eq!(driver.launches(), 2);
        assert_eq!(
            driver.visited(),
            vec![
                "https://armory.warmane.com/character/Frostbite/Icecrown/summary".to_string(),
                "https://armory.warmane.com/character/Arthas/Icecrown/summary".to_string(),
            ]
        );
    }
}
