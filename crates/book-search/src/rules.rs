//! Static per-site scraping rules.
//!
//! Each [`SiteRule`] is plain data: URL templates, a charset, a response
//! format, and CSS selectors. [`crate::SiteSearcher`] interprets every rule
//! the same way. The position of a rule in the [`SiteRegistry`] is the public
//! site identifier used by the HTTP API.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::encoding::encode_query;

/// Placeholder replaced by the encoded query or the raw URL fragment.
const PLACEHOLDER: &str = "{}";

/// Charset a site uses for query parameters and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    Gbk,
}

/// Format of a site's search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Html,
    Json,
}

/// How to query and parse one third-party book-search source.
#[derive(Debug, Clone)]
pub struct SiteRule {
    /// Display name, optionally suffixed with `" - <engine>"`.
    pub site: String,
    pub encoding: TextEncoding,
    pub kind: ResponseKind,
    /// Search URL template; `{}` receives the encoded query.
    pub search_url: String,
    /// Book URL template; `{}` receives the extracted fragment.
    pub book_url: String,
    /// Human-facing search page, when it differs from `search_url`.
    pub direct_search_url: Option<String>,
    pub book_list_selector: String,
    pub name_selector: String,
    pub url_selector: String,
    pub author_selector: Option<String>,
    pub summary_selector: Option<String>,
}

impl SiteRule {
    /// A UTF-8 HTML rule with the book URL used verbatim.
    pub fn new(
        site: &str,
        search_url: &str,
        book_list_selector: &str,
        name_selector: &str,
        url_selector: &str,
    ) -> Self {
        Self {
            site: site.to_string(),
            encoding: TextEncoding::Utf8,
            kind: ResponseKind::Html,
            search_url: search_url.to_string(),
            book_url: PLACEHOLDER.to_string(),
            direct_search_url: None,
            book_list_selector: book_list_selector.to_string(),
            name_selector: name_selector.to_string(),
            url_selector: url_selector.to_string(),
            author_selector: None,
            summary_selector: None,
        }
    }

    pub fn gbk(mut self) -> Self {
        self.encoding = TextEncoding::Gbk;
        self
    }

    pub fn json(mut self) -> Self {
        self.kind = ResponseKind::Json;
        self
    }

    pub fn book_url(mut self, template: &str) -> Self {
        self.book_url = template.to_string();
        self
    }

    pub fn direct_search_url(mut self, template: &str) -> Self {
        self.direct_search_url = Some(template.to_string());
        self
    }

    pub fn author(mut self, selector: &str) -> Self {
        self.author_selector = Some(selector.to_string());
        self
    }

    pub fn summary(mut self, selector: &str) -> Self {
        self.summary_selector = Some(selector.to_string());
        self
    }

    /// Point the rule at a different search endpoint, keeping everything else.
    pub fn with_search_url(mut self, template: impl Into<String>) -> Self {
        self.search_url = template.into();
        self
    }

    /// Request URL for `query`, encoded in the site's charset.
    pub fn search_url_for(&self, query: &str) -> String {
        fill(&self.search_url, &encode_query(query, self.encoding))
    }

    /// Canonical book URL built from a raw extracted fragment.
    pub fn canonical_url(&self, fragment: &str) -> String {
        fill(&self.book_url, fragment)
    }

    /// Link to the site's own search page for `query`.
    pub fn direct_search_url_for(&self, query: &str) -> String {
        let template = self.direct_search_url.as_ref().unwrap_or(&self.search_url);
        fill(template, &encode_query(query, self.encoding))
    }

    /// Display name without the provenance suffix.
    pub fn short_name(&self) -> &str {
        self.site.split(" - ").next().unwrap_or(&self.site)
    }

    pub fn is_json(&self) -> bool {
        self.kind == ResponseKind::Json
    }
}

fn fill(template: &str, value: &str) -> String {
    template.replacen(PLACEHOLDER, value, 1)
}

/// Public description of a rule, served to fan-out clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub index: usize,
    pub site: String,
    pub name: String,
    pub encoding: TextEncoding,
    pub kind: ResponseKind,
}

/// Ordered, immutable list of site rules.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    rules: Vec<SiteRule>,
}

impl SiteRegistry {
    pub fn new(rules: Vec<SiteRule>) -> Self {
        Self { rules }
    }

    /// The compiled-in rule table, built once per process.
    pub fn builtin() -> &'static SiteRegistry {
        static REGISTRY: OnceLock<SiteRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| SiteRegistry::new(builtin_rules()))
    }

    pub fn get(&self, index: usize) -> Option<&SiteRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteRule> {
        self.rules.iter()
    }

    /// Site display names in index order.
    pub fn names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.site.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<SiteSummary> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| SiteSummary {
                index,
                site: rule.site.clone(),
                name: rule.short_name().to_string(),
                encoding: rule.encoding,
                kind: rule.kind,
            })
            .collect()
    }
}

const AO3_SEARCH: &str = "https://archiveofourown.org/works/search?utf8=%E2%9C%93&commit=Search\
&work_search%5Bquery%5D=&work_search%5Btitle%5D={}&work_search%5Bcreators%5D=\
&work_search%5Brevised_at%5D=&work_search%5Bcomplete%5D=&work_search%5Bcrossover%5D=\
&work_search%5Bsingle_chapter%5D=0&work_search%5Bword_count%5D=&work_search%5Blanguage_id%5D=\
&work_search%5Bfandom_names%5D=&work_search%5Brating_ids%5D=&work_search%5Bcharacter_names%5D=\
&work_search%5Brelationship_names%5D=&work_search%5Bfreeform_names%5D=&work_search%5Bhits%5D=\
&work_search%5Bkudos_count%5D=&work_search%5Bcomments_count%5D=&work_search%5Bbookmarks_count%5D=\
&work_search%5Bsort_column%5D=_score&work_search%5Bsort_direction%5D=desc";

const HAITANG_SEARCH: &str = "https://jp.myhtlmebook.com/searchlist.php?fixlangsnd=FsedAjjT6\
&fixlangact=edit&searchkeyword={}&searchmode=book&selbooktype=all&selbooktypeb=all\
&selsexytype=all&selages=all&selstylesa=all&selstylesb=all&selbookpoststats=all";

fn builtin_rules() -> Vec<SiteRule> {
    vec![
        SiteRule::new(
            "晋江文学城",
            "http://www.jjwxc.net/bookbase.php?searchkeywords={}",
            "body > table > tbody > tr",
            "td:nth-child(2) > a",
            "td:nth-child(2) > a",
        )
        .gbk()
        .book_url("http://www.jjwxc.net/{}")
        .author("td:nth-child(1) > a")
        .summary("td:nth-child(3)"),
        SiteRule::new(
            "长佩",
            "https://m.gongzicp.com/novel/searchNovelOnlyByName?keyword={}&searchType=1\
&finishType=0&novelType=0&sortType=1&page=1",
            "data > list",
            "novel_name",
            "novel_id",
        )
        .json()
        .book_url("https://www.gongzicp.com/novel-{}.html")
        .author("novel_author")
        .summary("novel_desc"),
        SiteRule::new(
            "海棠",
            HAITANG_SEARCH,
            "body > table > tbody > tr",
            "td > a:nth-child(1) > font > b",
            "td > a:nth-child(1)",
        )
        .book_url("https://jp.myhtlmebook.com{}")
        .author("td > a:nth-child(6) > font")
        .summary("td"),
        SiteRule::new(
            "废文网 - DuckDuckGo",
            "https://duckduckgo.com/html/?q={}%20site%3Asosad.fun",
            "#links > div",
            "div > h2 > a > b",
            "div > h2 > a",
        )
        .direct_search_url("https://sosad.fun/search?search={}")
        .summary("a.result__snippet"),
        SiteRule::new(
            "爱奇艺文学",
            "http://wenxue.iqiyi.com/book/search-{}-1.html",
            "li.stacksBook",
            "div > div.stacksBook-info > h3 > a > span",
            "div > div.stacksBook-info > h3 > a",
        )
        .author("div > div.stacksBook-info > p.stacksBook-about > em.writerName")
        .summary("div > div.stacksBook-info > p.stacksBook-details"),
        SiteRule::new(
            "豆腐",
            "https://www.doufu.la/search?kd={}",
            "div.category_bd > div",
            "div.book_mn > h3 > a",
            "div.book_mn > h3 > a",
        )
        .author("div.book_sd > div")
        .summary("div.book_mn > div.book_ct"),
        SiteRule::new(
            "Lofter - DuckDuckGo",
            "https://duckduckgo.com/html/?q={}%20site%3Alofter.com",
            "#links > div",
            "div > h2 > a > b",
            "div > h2 > a",
        )
        .summary("a.result__snippet"),
        SiteRule::new(
            "Ao3",
            AO3_SEARCH,
            "#main > ol > li",
            "div > h4 > a:nth-child(1)",
            "div > h4 > a:nth-child(1)",
        )
        // Extracted hrefs are root-relative (`/works/1`), so no slash here.
        .book_url("https://archiveofourown.org{}")
        .author("div > h4 > a:nth-child(2)")
        .summary("blockquote"),
    ]
}
