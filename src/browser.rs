//! Session acquisition through a scripted browser sign-in.
//!
//! The platform only offers Google sign-in, so the cookie jar is obtained by
//! driving a real browser over WebDriver and reading its cookies once the
//! dashboard has loaded.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::{config::BrowserConfig, platform::CookieJar};

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

const GOOGLE_BUTTONS: &[&str] = &[
    "//button[contains(., 'Sign in with Google')]",
    "//button[contains(., 'Continue with Google')]",
    "//a[contains(., 'Sign in with Google')]",
    "//*[contains(@aria-label, 'Google')]",
];
const NEXT_BUTTON: &str = "//button[contains(., 'Next')]";
const EMAIL_INPUT: &str = r#"input[type="email"]"#;
const PASSWORD_INPUT: &str = r#"input[type="password"]"#;

#[async_trait]
pub trait BrowserLogin: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<CookieJar>;
}

pub struct WebDriverLogin {
    config: BrowserConfig,
    login_url: String,
    platform_host: String,
}

impl WebDriverLogin {
    pub fn new(config: BrowserConfig, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let authority = base.split("://").nth(1).unwrap_or(base);
        let platform_host = authority
            .split(['/', ':'])
            .next()
            .unwrap_or(authority)
            .to_string();
        Self {
            config,
            login_url: format!("{base}/login"),
            platform_host,
        }
    }

    async fn connect(&self) -> anyhow::Result<Client> {
        let mut args = vec![
            "--window-size=1280,720".to_string(),
            format!("--user-agent={USER_AGENT}"),
        ];
        if self.config.headless {
            args.push("--headless=new".into());
        }
        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".into(), json!({ "args": args }));
        ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.config.webdriver_url)
            .await
            .with_context(|| format!("connect to webdriver at {}", self.config.webdriver_url))
    }

    async fn drive(&self, client: &Client, email: &str, password: &str) -> anyhow::Result<CookieJar> {
        let timeout = Duration::from_millis(self.config.login_timeout_ms);

        info!("opening platform login page");
        client.goto(&self.login_url).await.context("open login page")?;
        sleep(Duration::from_secs(2)).await;

        info!("clicking Google sign-in");
        click_first(client, GOOGLE_BUTTONS, Duration::from_secs(5))
            .await
            .context("could not find Google sign-in button")?;
        sleep(Duration::from_secs(3)).await;

        info!("entering email");
        let field = client
            .wait()
            .at_most(Duration::from_secs(10))
            .for_element(Locator::Css(EMAIL_INPUT))
            .await
            .context("email field")?;
        field.send_keys(email).await?;
        client.find(Locator::XPath(NEXT_BUTTON)).await?.click().await?;
        sleep(Duration::from_secs(3)).await;

        info!("entering password");
        let field = client
            .wait()
            .at_most(Duration::from_secs(10))
            .for_element(Locator::Css(PASSWORD_INPUT))
            .await
            .context("password field")?;
        field.send_keys(password).await?;
        client.find(Locator::XPath(NEXT_BUTTON)).await?.click().await?;
        sleep(Duration::from_secs(3)).await;

        info!("waiting for dashboard redirect");
        self.wait_for_platform(client, timeout).await?;

        let cookies = client.get_all_cookies().await.context("read cookies")?;
        let jar: CookieJar = cookies
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        info!(count = jar.len(), "retrieved cookies");
        Ok(jar)
    }

    async fn wait_for_platform(&self, client: &Client, timeout: Duration) -> anyhow::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let url = client.current_url().await?;
            if is_signed_in(url.host_str(), url.path(), &self.platform_host) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("timed out waiting for sign-in to complete (at {url})");
            }
            sleep(Duration::from_millis(500)).await;
        }
    }
}

/// Dashboard first; any non-login page on the platform host also counts.
fn is_signed_in(host: Option<&str>, path: &str, platform_host: &str) -> bool {
    if host != Some(platform_host) {
        return false;
    }
    path.contains("/dashboard") || !path.to_lowercase().starts_with("/login")
}

async fn click_first(client: &Client, xpaths: &[&str], each: Duration) -> anyhow::Result<()> {
    for xpath in xpaths {
        let found = client
            .wait()
            .at_most(each)
            .for_element(Locator::XPath(xpath))
            .await;
        if let Ok(el) = found {
            if el.click().await.is_ok() {
                return Ok(());
            }
        }
    }
    Err(anyhow!("none of {} locators matched", xpaths.len()))
}

#[async_trait]
impl BrowserLogin for WebDriverLogin {
    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<CookieJar> {
        let client = self.connect().await?;
        let result = self.drive(&client, email, password).await;
        if let Err(e) = client.close().await {
            warn!(error = %e, "closing browser session failed");
        }
        result.map_err(|e| anyhow!("Authentication failed: {e:#}"))
    }
}
