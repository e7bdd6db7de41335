//! Headless Chrome implementation of [`BrowsingSurface`].
//!
//! Comment nodes are read out of the live page as `outerHTML` in one script
//! call and parsed locally with `scraper`, so a node re-rendered by the page
//! between listing and extraction cannot go stale under us. Which elements
//! count as comments, text, author and "load more" is configuration
//! ([`CommentMarkup`]), not code.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, SurfaceError};
use crate::surface::{Author, BrowsingSurface, Extracted};

pub const DEFAULT_NODE_SELECTOR: &str = "article";
pub const DEFAULT_TEXT_SELECTOR: &str = "span[dir='ltr']";
pub const DEFAULT_AUTHOR_SELECTOR: &str = "a.comments-post-meta__actor-link";
pub const DEFAULT_LOAD_MORE_SELECTOR: &str = "button.comments-comments-list__load-more-comments-button";

/// Selector strategy for finding comments in a page.
#[derive(Debug, Clone)]
pub struct CommentMarkup {
    /// One match per comment. Evaluated in the page.
    pub node: String,
    /// "Load more" controls. Evaluated in the page.
    pub load_more: String,
    text: Selector,
    author: Selector,
}

impl CommentMarkup {
    /// Validates all four selectors up front.
    pub fn new(node: &str, text: &str, author: &str, load_more: &str) -> Result<Self, ConfigError> {
        compile("node", node)?;
        compile("load-more", load_more)?;
        Ok(Self {
            node: node.to_string(),
            load_more: load_more.to_string(),
            text: compile("text", text)?,
            author: compile("author", author)?,
        })
    }

    /// Comment text: all text inside the first text match, trimmed.
    pub fn text_of(&self, html: &str) -> Extracted<String> {
        let fragment = Html::parse_fragment(html);
        match fragment.select(&self.text).next() {
            Some(el) => Extracted::Found(el.text().collect::<String>().trim().to_string()),
            None => Extracted::Missing,
        }
    }

    /// Author name is the first non-blank line of the author element (the
    /// rest is usually a headline); the profile link is its `href`.
    pub fn author_of(&self, html: &str) -> Extracted<Author> {
        let fragment = Html::parse_fragment(html);
        let Some(el) = fragment.select(&self.author).next() else {
            return Extracted::Missing;
        };

        let name = el
            .text()
            .flat_map(str::lines)
            .map(str::trim)
            .find(|line| !line.is_empty());

        match name {
            Some(name) => Extracted::Found(Author {
                name: name.to_string(),
                profile_link: el.value().attr("href").unwrap_or_default().to_string(),
            }),
            None => Extracted::Missing,
        }
    }
}

#[cfg(test)]
impl Default for CommentMarkup {
    fn default() -> Self {
        Self::new(
            DEFAULT_NODE_SELECTOR,
            DEFAULT_TEXT_SELECTOR,
            DEFAULT_AUTHOR_SELECTOR,
            DEFAULT_LOAD_MORE_SELECTOR,
        )
        .expect("default selectors are valid")
    }
}

fn compile(name: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        name,
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// A comment node snapshot.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub html: String,
}

/// Chrome launch and pacing options.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Existing Chrome profile, e.g. one that is already logged in.
    pub user_data_dir: Option<PathBuf>,
    pub window_size: (u32, u32),
    pub page_load_timeout: Duration,
    pub scroll_step_px: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            user_data_dir: None,
            window_size: (1920, 1080),
            page_load_timeout: Duration::from_secs(15),
            scroll_step_px: 500,
        }
    }
}

pub struct ChromeSurface {
    // Dropping the browser kills Chrome, so it lives as long as the tab.
    _browser: Browser,
    tab: Arc<Tab>,
    markup: CommentMarkup,
    options: BrowserOptions,
}

impl ChromeSurface {
    pub fn launch(options: BrowserOptions, markup: CommentMarkup) -> anyhow::Result<Self> {
        let mut args = vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--window-position=0,0"),
            OsStr::new("--log-level=3"),
        ];
        if options.headless {
            // Modern headless mode via args; the launcher flag selects the old one.
            args.push(OsStr::new("--headless=new"));
        }

        info!(headless = options.headless, profile = ?options.user_data_dir, "Launching Chrome");
        let browser = Browser::new(LaunchOptions {
            headless: false,
            window_size: Some(options.window_size),
            user_data_dir: options.user_data_dir.clone(),
            idle_browser_timeout: Duration::from_secs(600),
            args,
            ..Default::default()
        })?;

        let tab = browser.new_tab()?;

        Ok(Self {
            _browser: browser,
            tab,
            markup,
            options,
        })
    }

    /// Evaluates `script` and returns its primitive result.
    fn eval(&self, script: &str) -> Result<serde_json::Value, SurfaceError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| SurfaceError::Transient(e.to_string()))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

/// Embeds `value` in a script as a JS string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl BrowsingSurface for ChromeSurface {
    type Node = CommentNode;

    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| SurfaceError::Transient(format!("navigation to {url} failed: {e}")))?;

        // Softer than waiting for the load event, which ads and trackers can hold up.
        match self
            .tab
            .wait_for_element_with_custom_timeout(&self.markup.node, self.options.page_load_timeout)
        {
            Ok(_) => info!("Comment section loaded."),
            Err(e) => warn!(error = %e, "No comment node yet; continuing anyway"),
        }
        Ok(())
    }

    fn expand_pending_content(&mut self) -> Result<usize, SurfaceError> {
        let script = format!(
            r#"(() => {{
                let clicked = 0;
                for (const btn of document.querySelectorAll({})) {{
                    if (btn.offsetParent !== null) {{
                        btn.click();
                        clicked++;
                    }}
                }}
                return clicked;
            }})()"#,
            js_string(&self.markup.load_more)
        );
        let clicked = self.eval(&script)?.as_u64().unwrap_or(0);
        Ok(clicked as usize)
    }

    fn list_comment_nodes(&mut self) -> Result<Vec<CommentNode>, SurfaceError> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({}), n => n.outerHTML))",
            js_string(&self.markup.node)
        );
        let value = self.eval(&script)?;
        let json = value
            .as_str()
            .ok_or_else(|| SurfaceError::Transient(format!("unexpected node list result: {value}")))?;
        let nodes: Vec<String> = serde_json::from_str(json)
            .map_err(|e| SurfaceError::Transient(format!("bad node list JSON: {e}")))?;

        debug!(count = nodes.len(), "Comment nodes in page");
        Ok(nodes.into_iter().map(|html| CommentNode { html }).collect())
    }

    fn extract_text(&self, node: &CommentNode) -> Extracted<String> {
        if node.html.trim().is_empty() {
            return Extracted::Failed("empty node snapshot".to_string());
        }
        self.markup.text_of(&node.html)
    }

    fn extract_author(&self, node: &CommentNode) -> Extracted<Author> {
        if node.html.trim().is_empty() {
            return Extracted::Failed("empty node snapshot".to_string());
        }
        self.markup.author_of(&node.html)
    }

    fn scroll_forward(&mut self) -> Result<(), SurfaceError> {
        self.eval(&format!("window.scrollBy(0, {});", self.options.scroll_step_px))?;
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        self.tab.evaluate("document.readyState", false).is_ok()
    }
}
