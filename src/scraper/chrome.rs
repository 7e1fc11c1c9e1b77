use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::app::{Result, StaywatchError};
use crate::scraper::{BrowserSession, Launcher, PageHandle, PageMode, ScraperConfig};

/// Launches headless Chrome through chromiumoxide
pub struct ChromeLauncher {
    config: ScraperConfig,
}

impl ChromeLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        ChromeSession::launch(&self.config).await
    }
}

/// A running Chrome process shared by every task of a run
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: Option<String>,
}

impl ChromeSession {
    /// Launch a browser with the given configuration
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| StaywatchError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            StaywatchError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Drive the CDP connection for the lifetime of the session
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        info!("Browser launched");

        Ok(Self {
            browser,
            handler,
            user_agent: config.user_agent.clone(),
        })
    }

    async fn new_page_in(&self, context: Option<BrowserContextId>) -> Result<Page> {
        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = context;

        let page = self.browser.new_page(params).await?;

        if let Some(ref ua) = self.user_agent {
            page.set_user_agent(ua.as_str()).await?;
        }

        Ok(page)
    }

    async fn dispose_context(&self, context: BrowserContextId) -> Result<()> {
        self.browser
            .execute(DisposeBrowserContextParams::new(context))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Page = ChromePage;

    async fn open_page(&self, mode: PageMode) -> Result<ChromePage> {
        match mode {
            PageMode::Shared => Ok(ChromePage {
                page: self.new_page_in(None).await?,
                context: None,
            }),
            PageMode::Isolated => {
                let context = self
                    .browser
                    .execute(CreateBrowserContextParams::default())
                    .await?
                    .result
                    .browser_context_id;

                match self.new_page_in(Some(context.clone())).await {
                    Ok(page) => Ok(ChromePage {
                        page,
                        context: Some(context),
                    }),
                    Err(e) => {
                        if let Err(dispose_err) = self.dispose_context(context).await {
                            debug!("Failed to dispose browser context: {}", dispose_err);
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    async fn release_page(&self, page: ChromePage) -> Result<()> {
        let closed = page.page.close().await.map_err(StaywatchError::from);

        if let Some(context) = page.context {
            self.dispose_context(context).await?;
        }

        closed
    }

    async fn shutdown(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        info!("Browser closed");

        closed.map(|_| ()).map_err(StaywatchError::from)
    }
}

/// A chromiumoxide page, optionally inside its own browser context
pub struct ChromePage {
    page: Page,
    context: Option<BrowserContextId>,
}

#[async_trait]
impl PageHandle for ChromePage {
    async fn navigate(&self, url: &str, referrer: &str) -> Result<()> {
        let params = NavigateParams::builder()
            .url(url)
            .referrer(referrer)
            .build()
            .map_err(StaywatchError::Browser)?;

        self.page.goto(params).await?;
        Ok(())
    }

    async fn has_element(&self, selector: &str) -> Result<bool> {
        Ok(!self.page.find_elements(selector).await?.is_empty())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        match self.page.find_elements(selector).await?.first() {
            Some(element) => Ok(element.inner_text().await?),
            None => Ok(None),
        }
    }

    async fn inner_html(&self, selector: &str) -> Result<Option<String>> {
        match self.page.find_elements(selector).await?.first() {
            Some(element) => Ok(element.inner_html().await?),
            None => Ok(None),
        }
    }
}
