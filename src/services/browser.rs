use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};

/// One browser tab, navigated by a single run at a time.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, give client-side rendering `settle` to finish, and
    /// return the rendered markup.
    async fn open_page(&mut self, url: &str, settle: Duration) -> Result<String>;

    /// Release the browser. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Opens a fresh [`BrowserSession`] for each source run.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    no_sandbox: bool,
    chrome_path: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(headless: bool, no_sandbox: bool, chrome_path: Option<PathBuf>) -> Self {
        Self {
            headless,
            no_sandbox,
            chrome_path,
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(AppError::Config)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The CDP connection only makes progress while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "browser handler event");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut session = ChromeSession {
                    browser: Some(browser),
                    page: None,
                    handler_task,
                };
                if let Err(close_err) = session.close().await {
                    tracing::warn!(error = %close_err, "failed to close browser after launch error");
                }
                return Err(e.into());
            }
        };

        tracing::debug!("browser session opened");
        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page: Some(page),
            handler_task,
        }))
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn open_page(&mut self, url: &str, settle: Duration) -> Result<String> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| AppError::Config("browser session already closed".to_string()))?;

        page.goto(url).await?;
        tokio::time::sleep(settle).await;
        let html = page.content().await?;

        tracing::debug!(%url, bytes = html.len(), "page rendered");
        Ok(html)
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            let closed = browser.close().await;
            if let Err(e) = browser.wait().await {
                tracing::debug!(error = %e, "waiting for browser process");
            }
            self.handler_task.abort();
            closed?;
            tracing::debug!("browser session closed");
        }
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // close() was skipped (panic or early return); the child process is
        // killed by Browser's own Drop, only the handler task is left.
        self.handler_task.abort();
    }
}
