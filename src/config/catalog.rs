//! Benchmark test catalog and concurrency steps.
//!
//! Catalog order is significant: the classifier tries test ids in this order
//! and the first prefix match wins.

use serde::Deserialize;

/// One benchmarked page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestSpec {
    /// Identifier used in filenames (`{configuration}_{id}_c{n}.dat`).
    pub id: String,

    pub url: String,

    /// Number of requests the load generator issues per concurrency step.
    pub requests: u32,

    /// Chart title.
    #[serde(default)]
    pub title: Option<String>,
}

impl TestSpec {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

const MIN_CONCURRENCY: u32 = 10;
const MAX_CONCURRENCY: u32 = 40;
const CONCURRENCY_STEP: usize = 5;

/// 10, 15, ..., 40.
pub fn default_steps() -> Vec<u32> {
    (MIN_CONCURRENCY..=MAX_CONCURRENCY)
        .step_by(CONCURRENCY_STEP)
        .collect()
}

/// MediaWiki pages covering cached views, parses and ResourceLoader.
pub fn default_tests() -> Vec<TestSpec> {
    fn test(id: &str, url: &str, requests: u32, title: &str) -> TestSpec {
        TestSpec {
            id: id.to_string(),
            url: url.to_string(),
            requests,
            title: Some(title.to_string()),
        }
    }

    vec![
        test(
            "view_mainpage",
            "https://en.wikipedia.org/wiki/Main_Page",
            10000,
            "View enwiki:Main Page",
        ),
        test(
            "view_short",
            "https://it.wikipedia.org/wiki/Nemico_pubblico_(film_1998)",
            10000,
            "View itwiki:Nemico pubblico (film_1998)",
        ),
        // Views are served from the parser cache.
        test(
            "view_long",
            "https://en.wikipedia.org/wiki/Barack_Obama",
            10000,
            "View enwiki:Barack Obama",
        ),
        test(
            "reparse_light",
            "https://nl.wikipedia.org/w/api.php?format=json&action=parse&title=Atoom&text={{:Atoom}}",
            500,
            "Re-parse nlwiki:Atoom",
        ),
        test(
            "reparse_heavy",
            "https://en.wikipedia.org/w/api.php?format=json&action=parse&title=Australia&text={{:Australia}}",
            500,
            "Re-parse enwiki:Australia",
        ),
        test(
            "rl_startup",
            "https://nl.wikipedia.org/w/load.php?lang=nl&modules=startup&only=scripts&raw=1&skin=vector",
            30000,
            "load.php startup JS for nlwiki",
        ),
        test(
            "rl_css",
            "https://kk.wikipedia.org/w/load.php?lang=en&modules=ext.echo.styles.badge%7Cext.uls.interlanguage%7Cext.visualEditor.desktopArticleTarget.noscript%7Cext.wikimediaBadges%7Cmediawiki.ui.button%7Coojs-ui.styles.icons-alerts%7Cskins.vector.styles.legacy&only=styles&skin=vector",
            30000,
            "load.php styles for kkwiki",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_steps_span_ten_to_forty() {
        assert_eq!(default_steps(), vec![10, 15, 20, 25, 30, 35, 40]);
    }

    #[test]
    fn default_catalog_keeps_declaration_order() {
        let ids: Vec<String> = default_tests().into_iter().map(|t| t.id).collect();
        assert_eq!(ids.first().map(String::as_str), Some("view_mainpage"));
        assert_eq!(ids.last().map(String::as_str), Some("rl_css"));
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn title_falls_back_to_id() {
        let t = TestSpec {
            id: "plain".to_string(),
            url: "http://example.org/".to_string(),
            requests: 1,
            title: None,
        };
        assert_eq!(t.title(), "plain");
    }
}
