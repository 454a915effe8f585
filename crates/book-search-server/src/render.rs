//! Plain-text rendering of fan-out results: one panel per site.

use std::fmt::Write;

use book_search::{SiteRegistry, SiteResult};

use crate::fanout::FanOutState;

const NO_RESULTS: &str = "无结果";
const UNKNOWN_AUTHOR: &str = "未知作者";
const SEARCHING: &str = "搜索中";
const SITE_ERROR: &str = "访问该网站出错";
const IDLE: &str = "请输入关键字开始搜索";

/// Header line for one site: name, book count, and elapsed time.
pub fn panel_header(site: &str, result: Option<&SiteResult>) -> String {
    match result {
        Some(r) => {
            let status = if r.success { "ok" } else { "error" };
            format!("{site} ({})  {} ms [{status}]", r.books.len(), r.time)
        }
        None => site.to_string(),
    }
}

/// Render every site panel in index order.
pub fn render_state(sites: &[String], state: &FanOutState) -> String {
    let mut out = String::new();
    for (index, site) in sites.iter().enumerate() {
        let result = state.result(index);
        let _ = writeln!(out, "{}", panel_header(site, result));
        match result {
            None if state.searching => {
                let _ = writeln!(out, "  {SEARCHING}");
            }
            None => {
                let _ = writeln!(out, "  {IDLE}");
            }
            Some(r) if !r.success => {
                let _ = writeln!(out, "  {SITE_ERROR}: {}", r.message.trim());
            }
            Some(r) if r.books.is_empty() => {
                let _ = writeln!(out, "  {NO_RESULTS}");
            }
            Some(r) => {
                for book in &r.books {
                    let author = if book.author.is_empty() {
                        UNKNOWN_AUTHOR
                    } else {
                        book.author.as_str()
                    };
                    let _ = writeln!(out, "  {} - {author}", book.name);
                    let _ = writeln!(out, "    {}", book.url);
                    if !book.summary.is_empty() {
                        let _ = writeln!(out, "    {}", book.summary);
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

/// "Jump to site" links: each site's own search page for `query`.
pub fn render_links(registry: &SiteRegistry, query: &str) -> String {
    let mut out = String::new();
    for rule in registry.iter() {
        let _ = writeln!(
            out,
            "{}  {}",
            rule.short_name(),
            rule.direct_search_url_for(query)
        );
    }
    out
}
