//! HTML → PDF via a headless Chromium instance.
//!
//! The browser is launched and torn down per request. No pooling; fine at
//! this scale, a known ceiling under load.

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use tracing::{debug, info};

/// Page margins applied through the print call, in inches.
const PAGE_MARGIN_IN: f64 = 0.5;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  @page { size: letter; }
  body {
    font-family: 'Helvetica Neue', Arial, sans-serif;
    font-size: 11pt;
    line-height: 1.4;
    color: #1a1a1a;
    margin: 0;
  }
  h1, h2, h3 { margin: 0.4em 0 0.2em; }
  @media print {
    body { -webkit-print-color-adjust: exact; }
  }
</style>
</head>
<body>
"#;

const PAGE_FOOT: &str = "\n</body>\n</html>\n";

/// Wraps a filled HTML fragment in the fixed document shell.
pub fn wrap_fragment(fragment: &str) -> String {
    format!("{PAGE_HEAD}{fragment}{PAGE_FOOT}")
}

/// One-shot render of a filled HTML fragment to PDF bytes.
pub async fn render_html(fragment: &str) -> Result<Vec<u8>> {
    let html = wrap_fragment(fragment);

    let config = BrowserConfig::builder()
        .build()
        .map_err(|e| anyhow!("browser configuration failed: {e}"))?;
    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .context("failed to launch headless browser")?;

    // The handler stream must be polled for the browser connection to work.
    let event_loop = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });
    debug!("Headless browser launched");

    let result = print_page(&browser, &html).await;

    // Teardown regardless of the render outcome.
    let _ = browser.close().await;
    let _ = browser.wait().await;
    event_loop.abort();

    let bytes = result?;
    info!("Rendered {} bytes via headless browser", bytes.len());
    Ok(bytes)
}

async fn print_page(browser: &Browser, html: &str) -> Result<Vec<u8>> {
    let page = browser
        .new_page("about:blank")
        .await
        .context("failed to open a browser page")?;
    page.set_content(html)
        .await
        .context("failed to set page content")?;

    let params = PrintToPdfParams {
        print_background: Some(true),
        prefer_css_page_size: Some(true),
        margin_top: Some(PAGE_MARGIN_IN),
        margin_bottom: Some(PAGE_MARGIN_IN),
        margin_left: Some(PAGE_MARGIN_IN),
        margin_right: Some(PAGE_MARGIN_IN),
        ..Default::default()
    };

    page.pdf(params).await.context("print-to-PDF call failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_fragment_produces_full_document() {
        let html = wrap_fragment("<p>Jane Doe</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p>Jane Doe</p>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_wrap_fragment_keeps_shell_styles() {
        let html = wrap_fragment("");
        assert!(html.contains("@page"));
        assert!(html.contains("@media print"));
    }
}
