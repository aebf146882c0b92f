//! HTTP handlers, one module per page/endpoint group.

pub mod dashboard;
pub mod diagnose;
pub mod ingestion;
pub mod kg;
pub mod metrics;
pub mod symptoms;

/// Navigation bar shared across all pages.
pub const NAV_HTML: &str = r#"<nav class="nav">
  <span class="brand">symdx</span>
  <a href="/">Dashboard</a>
  <a href="/diagnose">Diagnose</a>
  <a href="/kg">Knowledge Graph</a>
  <a href="/ingestion">Ingestion</a>
  <a href="/metrics">Evaluation</a>
</nav>"#;

/// Minimal shared styling; pages embed it so the server stays
/// single-binary with no static file tree.
pub const STYLE_HTML: &str = r#"<style>
  body { font-family: system-ui, sans-serif; margin: 0; background: #11151c; color: #e6e6e6; }
  .nav { display: flex; gap: 1rem; padding: 0.8rem 1.2rem; background: #1a2029; align-items: center; }
  .nav a { color: #9db4d0; text-decoration: none; }
  .nav .brand { font-weight: 700; color: #e6e6e6; margin-right: 1rem; }
  main { padding: 1.2rem; max-width: 960px; margin: 0 auto; }
  .card { background: #1a2029; border-radius: 8px; padding: 1rem; margin-bottom: 1rem; }
  table { width: 100%; border-collapse: collapse; }
  th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #2a3240; }
  textarea, select, input { background: #11151c; color: #e6e6e6; border: 1px solid #2a3240; border-radius: 4px; padding: 0.4rem; }
  button { background: #2b6cb0; color: white; border: none; border-radius: 4px; padding: 0.5rem 1rem; cursor: pointer; }
  .muted { color: #8a97a8; }
  .score { font-variant-numeric: tabular-nums; }
</style>"#;

/// Wrap page content in the shared chrome.
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{} — symdx</title>
{}
</head>
<body>
{}
<main>
{}
</main>
</body>
</html>"#,
        title, STYLE_HTML, NAV_HTML, body
    )
}

/// Escape user-controlled text before inlining it into HTML.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<b>&"x"</b>"#), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_page_contains_nav_and_title() {
        let html = page("Test", "<p>hi</p>");
        assert!(html.contains("<title>Test — symdx</title>"));
        assert!(html.contains("Knowledge Graph"));
        assert!(html.contains("<p>hi</p>"));
    }
}
