//! Deterministic in-memory browser for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::app::{Result, StaywatchError};
use crate::scraper::{
    BrowserSession, Launcher, PageHandle, PageMode, ScraperConfig, SelectorConfig,
};

/// Short timeouts and plain selectors matching [`PageFixture::priced`].
pub(crate) fn test_config() -> ScraperConfig {
    ScraperConfig {
        navigation_timeout_ms: 300,
        resolve_timeout_ms: 150,
        poll_interval_ms: 5,
        selectors: SelectorConfig {
            label: "h1".into(),
            host_name: ".host".into(),
            price: ".price".into(),
            fee: ".fee".into(),
            special_offer: ".offer".into(),
            unavailable_dates: ".unavailable".into(),
            sidebar: ".sidebar".into(),
            host_prefix: "Anfitriã(o):".into(),
        },
        ..Default::default()
    }
}

#[derive(Debug, Clone)]
enum Navigation {
    Loads,
    Fails(String),
    Hangs,
}

#[derive(Debug, Clone)]
struct FixtureElement {
    text: String,
    html: String,
    appears_after: Duration,
}

/// A rendered listing page: which selectors match and what they contain.
#[derive(Debug, Clone)]
pub(crate) struct PageFixture {
    elements: HashMap<String, FixtureElement>,
    failing_reads: HashSet<String>,
    navigation: Navigation,
}

impl PageFixture {
    pub(crate) fn blank() -> Self {
        Self {
            elements: HashMap::new(),
            failing_reads: HashSet::new(),
            navigation: Navigation::Loads,
        }
    }

    pub(crate) fn priced(price: &str, fee: &str) -> Self {
        Self::blank()
            .with_text("h1", "Casa na praia")
            .with_text(".host", "Anfitriã(o): Maria")
            .with_text(".price", price)
            .with_text(".fee", fee)
            .with_html(".sidebar", &format!("<span>{}</span>", price))
    }

    pub(crate) fn unavailable() -> Self {
        Self::blank()
            .with_text("h1", "Casa na praia")
            .with_text(".host", "Anfitriã(o): Maria")
            .with_text(".unavailable", "Essas datas não estão disponíveis")
    }

    pub(crate) fn navigation_error(message: &str) -> Self {
        Self {
            navigation: Navigation::Fails(message.to_string()),
            ..Self::blank()
        }
    }

    pub(crate) fn navigation_hang() -> Self {
        Self {
            navigation: Navigation::Hangs,
            ..Self::blank()
        }
    }

    pub(crate) fn with_text(self, selector: &str, text: &str) -> Self {
        self.with_delayed_text(selector, text, Duration::ZERO)
    }

    pub(crate) fn with_delayed_text(mut self, selector: &str, text: &str, delay: Duration) -> Self {
        self.elements.insert(
            selector.to_string(),
            FixtureElement {
                text: text.to_string(),
                html: text.to_string(),
                appears_after: delay,
            },
        );
        self
    }

    pub(crate) fn with_html(mut self, selector: &str, html: &str) -> Self {
        self.elements.insert(
            selector.to_string(),
            FixtureElement {
                text: String::new(),
                html: html.to_string(),
                appears_after: Duration::ZERO,
            },
        );
        self
    }

    pub(crate) fn with_failing_read(mut self, selector: &str) -> Self {
        self.failing_reads.insert(selector.to_string());
        self
    }
}

type Fixtures = Arc<HashMap<String, PageFixture>>;

/// A page that serves fixtures by URL; reusable across navigations.
pub(crate) struct FixturePage {
    fixtures: Fixtures,
    loaded: Mutex<Option<(PageFixture, Instant)>>,
    referrer: Mutex<Option<String>>,
    on_release: Option<Arc<SessionStats>>,
}

impl FixturePage {
    fn new(fixtures: Fixtures, on_release: Option<Arc<SessionStats>>) -> Self {
        Self {
            fixtures,
            loaded: Mutex::new(None),
            referrer: Mutex::new(None),
            on_release,
        }
    }

    pub(crate) fn single(url: &str, fixture: PageFixture) -> Self {
        let fixtures = HashMap::from([(url.to_string(), fixture)]);
        Self::new(Arc::new(fixtures), None)
    }

    pub(crate) fn last_referrer(&self) -> Option<String> {
        self.referrer.lock().unwrap().clone()
    }

    fn visible(&self, selector: &str) -> Option<FixtureElement> {
        let loaded = self.loaded.lock().unwrap();
        let (fixture, loaded_at) = loaded.as_ref()?;
        fixture
            .elements
            .get(selector)
            .filter(|el| loaded_at.elapsed() >= el.appears_after)
            .cloned()
    }

    fn check_read(&self, selector: &str) -> Result<()> {
        let loaded = self.loaded.lock().unwrap();
        match loaded.as_ref() {
            Some((fixture, _)) if fixture.failing_reads.contains(selector) => Err(
                StaywatchError::Browser(format!("Could not read {}", selector)),
            ),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PageHandle for FixturePage {
    async fn navigate(&self, url: &str, referrer: &str) -> Result<()> {
        *self.referrer.lock().unwrap() = Some(referrer.to_string());
        *self.loaded.lock().unwrap() = None;

        let fixture = self
            .fixtures
            .get(url)
            .cloned()
            .ok_or_else(|| StaywatchError::Browser(format!("No fixture for {}", url)))?;

        match &fixture.navigation {
            Navigation::Loads => {}
            Navigation::Fails(message) => return Err(StaywatchError::Browser(message.clone())),
            Navigation::Hangs => tokio::time::sleep(Duration::from_secs(3600)).await,
        }

        *self.loaded.lock().unwrap() = Some((fixture, Instant::now()));
        Ok(())
    }

    async fn has_element(&self, selector: &str) -> Result<bool> {
        Ok(self.visible(selector).is_some())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        self.check_read(selector)?;
        Ok(self.visible(selector).map(|el| el.text))
    }

    async fn inner_html(&self, selector: &str) -> Result<Option<String>> {
        self.check_read(selector)?;
        Ok(self.visible(selector).map(|el| el.html))
    }
}

/// Counters shared by a launcher, its session and its pages.
#[derive(Debug, Default)]
pub(crate) struct SessionStats {
    pub launched: AtomicUsize,
    pub isolated_opened: AtomicUsize,
    pub shared_opened: AtomicUsize,
    pub released: AtomicUsize,
    pub active: AtomicUsize,
    pub peak_active: AtomicUsize,
    pub shut_down: AtomicBool,
}

impl SessionStats {
    pub(crate) fn opened(&self) -> usize {
        self.isolated_opened.load(Ordering::SeqCst) + self.shared_opened.load(Ordering::SeqCst)
    }
}

pub(crate) struct FixtureSession {
    fixtures: Fixtures,
    stats: Arc<SessionStats>,
    fail_open: bool,
}

#[async_trait]
impl BrowserSession for FixtureSession {
    type Page = FixturePage;

    async fn open_page(&self, mode: PageMode) -> Result<FixturePage> {
        if self.fail_open {
            return Err(StaywatchError::Browser("Target.createTarget failed".into()));
        }
        match mode {
            PageMode::Isolated => self.stats.isolated_opened.fetch_add(1, Ordering::SeqCst),
            PageMode::Shared => self.stats.shared_opened.fetch_add(1, Ordering::SeqCst),
        };
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_active.fetch_max(active, Ordering::SeqCst);
        Ok(FixturePage::new(self.fixtures.clone(), Some(self.stats.clone())))
    }

    async fn release_page(&self, page: FixturePage) -> Result<()> {
        if let Some(stats) = &page.on_release {
            stats.active.fetch_sub(1, Ordering::SeqCst);
            stats.released.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn shutdown(self) -> Result<()> {
        self.stats.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FixtureLauncher {
    fixtures: Fixtures,
    pub stats: Arc<SessionStats>,
    fail_launch: bool,
    fail_open: bool,
}

impl FixtureLauncher {
    pub(crate) fn new<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = (String, PageFixture)>,
    {
        Self {
            fixtures: Arc::new(pages.into_iter().collect()),
            stats: Arc::new(SessionStats::default()),
            fail_launch: false,
            fail_open: false,
        }
    }

    pub(crate) fn failing_launch() -> Self {
        Self {
            fail_launch: true,
            ..Self::new([])
        }
    }

    pub(crate) fn failing_pages(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Session without going through [`Launcher::launch`].
    pub(crate) fn session(&self) -> FixtureSession {
        FixtureSession {
            fixtures: self.fixtures.clone(),
            stats: self.stats.clone(),
            fail_open: self.fail_open,
        }
    }
}

#[async_trait]
impl Launcher for FixtureLauncher {
    type Session = FixtureSession;

    async fn launch(&self) -> Result<FixtureSession> {
        if self.fail_launch {
            return Err(StaywatchError::Browser(
                "Failed to launch browser: no Chrome executable found".into(),
            ));
        }
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        Ok(self.session())
    }
}
