//! Wikipedia tools backed by the MediaWiki action API

use super::http::{failed, get_json, tool_http_client, trim_base_url};
use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolExample, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

pub const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Upper bound on summary length, in sentences
pub const MAX_SUMMARY_SENTENCES: usize = 10;

const SEARCH_LIMIT: usize = 10;
const DISAMBIGUATION_OPTIONS: usize = 3;

/// Thin client over the MediaWiki query endpoint
#[derive(Clone)]
pub struct WikipediaApi {
    client: reqwest::Client,
    endpoint: String,
}

/// A page as returned by `action=query`
#[derive(Debug, Clone, PartialEq)]
pub struct WikiPage {
    pub title: String,
    pub missing: bool,
    pub disambiguation: bool,
    pub extract: Option<String>,
    pub coordinates: Option<(f64, f64)>,
}

impl WikipediaApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: tool_http_client(),
            endpoint: trim_base_url(endpoint),
        }
    }

    async fn query(&self, tool: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut query = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let body = get_json(&self.client, tool, &self.endpoint, &query).await?;
        if let Some(error) = body.get("error") {
            let info = error
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(failed(tool, format!("Wikipedia API error: {}", info)).into());
        }
        Ok(body)
    }

    /// Titles matching a full-text search
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let body = self
            .query(
                "search_wikipedia_page",
                &[
                    ("list", "search".to_string()),
                    ("srsearch", query.to_string()),
                    ("srlimit", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        Ok(body
            .pointer("/query/search")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| r.get("title").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Fetch one page, following redirects
    pub async fn page(&self, tool: &str, title: &str, props: &str) -> Result<WikiPage> {
        let body = self
            .query(
                tool,
                &[
                    ("titles", title.to_string()),
                    ("redirects", "1".to_string()),
                    ("prop", props.to_string()),
                    ("exintro", "1".to_string()),
                    ("explaintext", "1".to_string()),
                    ("ppprop", "disambiguation".to_string()),
                ],
            )
            .await?;

        let page = body
            .pointer("/query/pages/0")
            .ok_or_else(|| failed(tool, "response contains no pages"))?;

        Ok(WikiPage {
            title: page
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(title)
                .to_string(),
            missing: page.get("missing").is_some() || page.get("invalid").is_some(),
            disambiguation: page.pointer("/pageprops/disambiguation").is_some(),
            extract: page
                .get("extract")
                .and_then(Value::as_str)
                .map(str::to_string),
            coordinates: page.pointer("/coordinates/0").and_then(|c| {
                Some((c.get("lat")?.as_f64()?, c.get("lon")?.as_f64()?))
            }),
        })
    }

    /// Article links of a page, in the order the API returns them
    pub async fn links(&self, tool: &str, title: &str, limit: usize) -> Result<Vec<String>> {
        let body = self
            .query(
                tool,
                &[
                    ("titles", title.to_string()),
                    ("redirects", "1".to_string()),
                    ("prop", "links".to_string()),
                    ("plnamespace", "0".to_string()),
                    ("pllimit", limit.to_string()),
                ],
            )
            .await?;

        Ok(body
            .pointer("/query/pages/0/links")
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .filter_map(|l| l.get("title").and_then(Value::as_str))
                    .map(str::to_string)
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl Default for WikipediaApi {
    fn default() -> Self {
        Self::new(WIKIPEDIA_API_URL)
    }
}

/// Keep the first `count` sentences of `text`
pub fn first_sentences(text: &str, count: usize) -> String {
    let text = text.trim();
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                seen += 1;
                if seen == count {
                    return text[..i + c.len_utf8()].to_string();
                }
            }
        }
    }

    text.to_string()
}

fn not_found(title: &str) -> String {
    format!("Wikipedia page for '{}' not found.", title)
}

/// `search_wikipedia_page(query)`
pub struct SearchWikipediaPageTool {
    api: WikipediaApi,
}

impl SearchWikipediaPageTool {
    pub fn new(api: WikipediaApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for SearchWikipediaPageTool {
    fn name(&self) -> &str {
        "search_wikipedia_page"
    }

    fn description(&self) -> &str {
        "Searches Wikipedia for a given query and returns a list of relevant page titles. \
         Use it to find the page_title needed by wikipedia_coordinates, or when a page \
         is reported as not found."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search term or question for Wikipedia"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let query: String = call.get_parameter("query")?;
        debug!("Searching Wikipedia for '{}'", query);

        let titles = self.api.search(&query).await?;
        if titles.is_empty() {
            return Ok(ToolResult::success(call.id, not_found(&query)));
        }

        let content = serde_json::to_string(&titles)?;
        Ok(ToolResult::success(call.id, content).with_data(json!(titles)))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Find pages about World War II casualties".to_string(),
            parameters: json!({"query": "WW2 casualties"}),
            expected_result: r#"["World War II casualties", ...]"#.to_string(),
        }]
    }
}

/// `wikipedia_coordinates(page_title)`
pub struct WikipediaCoordinatesTool {
    api: WikipediaApi,
}

impl WikipediaCoordinatesTool {
    pub fn new(api: WikipediaApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WikipediaCoordinatesTool {
    fn name(&self) -> &str {
        "wikipedia_coordinates"
    }

    fn description(&self) -> &str {
        "Provides the latitude and longitude of a Wikipedia page that describes a location. \
         Use search_wikipedia_page first to get the exact page_title."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "page_title": {
                    "type": "string",
                    "description": "The title of the Wikipedia page"
                }
            },
            "required": ["page_title"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let title: String = call.get_parameter("page_title")?;
        let page = self.api.page(self.name(), &title, "coordinates").await?;

        if page.missing {
            return Ok(ToolResult::success(call.id, not_found(&title)));
        }

        match page.coordinates {
            Some((lat, lon)) => Ok(ToolResult::success(call.id, format!("({}, {})", lat, lon))
                .with_data(json!({"latitude": lat, "longitude": lon}))),
            None => Ok(ToolResult::success(
                call.id,
                format!("Wikipedia page '{}' has no coordinates.", page.title),
            )),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Coordinates of Tallahassee".to_string(),
            parameters: json!({"page_title": "Tallahassee, Florida"}),
            expected_result: "(30.45, -84.27)".to_string(),
        }]
    }
}

/// `wikipedia_summary(query, sentences=10)`
pub struct WikipediaSummaryTool {
    api: WikipediaApi,
}

impl WikipediaSummaryTool {
    pub fn new(api: WikipediaApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WikipediaSummaryTool {
    fn name(&self) -> &str {
        "wikipedia_summary"
    }

    fn description(&self) -> &str {
        "Returns the introduction of the Wikipedia page matching the query, \
         up to 10 sentences."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The page title or search term"
                },
                "sentences": {
                    "type": "integer",
                    "description": "Number of sentences to return (1-10)",
                    "default": MAX_SUMMARY_SENTENCES
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let query: String = call.get_parameter("query")?;
        let sentences = match call.parameters.get("sentences") {
            None | Some(Value::Null) => MAX_SUMMARY_SENTENCES,
            Some(_) => call.get_number("sentences")?.round().max(1.0) as usize,
        }
        .min(MAX_SUMMARY_SENTENCES);

        let page = self
            .api
            .page(self.name(), &query, "extracts|pageprops")
            .await?;

        if page.missing {
            return Ok(ToolResult::success(call.id, not_found(&query)));
        }

        if page.disambiguation {
            let options = self
                .api
                .links(self.name(), &page.title, DISAMBIGUATION_OPTIONS)
                .await?;
            let content = format!(
                "The query '{}' is ambiguous. Did you mean: {}? Or try a more specific query.",
                query,
                options.join(", ")
            );
            return Ok(ToolResult::success(call.id, content).with_data(json!(options)));
        }

        match page.extract.as_deref().map(str::trim) {
            Some(extract) if !extract.is_empty() => Ok(ToolResult::success(
                call.id,
                first_sentences(extract, sentences),
            )),
            _ => Ok(ToolResult::success(call.id, not_found(&query))),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Five sentence summary about the US president".to_string(),
            parameters: json!({"query": "President of the United States", "sentences": 5}),
            expected_result: "The president of the United States (POTUS) is ...".to_string(),
        }]
    }
}

impl_tool_factory!(
    SearchWikipediaPageToolFactory,
    SearchWikipediaPageTool::new(WikipediaApi::default()),
    "search_wikipedia_page",
    "Searches Wikipedia and returns relevant page titles."
);

impl_tool_factory!(
    WikipediaCoordinatesToolFactory,
    WikipediaCoordinatesTool::new(WikipediaApi::default()),
    "wikipedia_coordinates",
    "Provides the coordinates of a Wikipedia page."
);

impl_tool_factory!(
    WikipediaSummaryToolFactory,
    WikipediaSummaryTool::new(WikipediaApi::default()),
    "wikipedia_summary",
    "Returns a summary of a Wikipedia page."
);

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> WikipediaApi {
        WikipediaApi::new(server.uri())
    }

    #[test]
    fn test_first_sentences() {
        let text = "One. Two has 3.5 units! Three? Four.";
        assert_eq!(first_sentences(text, 1), "One.");
        assert_eq!(first_sentences(text, 2), "One. Two has 3.5 units!");
        assert_eq!(first_sentences(text, 10), text);
    }

    #[tokio::test]
    async fn test_search_lists_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "WW2 casualties"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"search": [
                    {"ns": 0, "title": "World War II casualties"},
                    {"ns": 0, "title": "World War I casualties"}
                ]}
            })))
            .mount(&server)
            .await;

        let tool = SearchWikipediaPageTool::new(api(&server));
        let result = tool
            .execute(ToolCall::new("search_wikipedia_page", json!({"query": "WW2 casualties"})))
            .await
            .unwrap();
        assert_eq!(
            result.content,
            r#"["World War II casualties","World War I casualties"]"#
        );
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"query": {"search": []}})),
            )
            .mount(&server)
            .await;

        let tool = SearchWikipediaPageTool::new(api(&server));
        let result = tool
            .execute(ToolCall::new("search_wikipedia_page", json!({"query": "zzqx"})))
            .await
            .unwrap();
        assert_eq!(result.content, "Wikipedia page for 'zzqx' not found.");
    }

    #[tokio::test]
    async fn test_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("prop", "coordinates"))
            .and(query_param("titles", "Tallahassee, Florida"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{
                    "pageid": 1, "ns": 0, "title": "Tallahassee, Florida",
                    "coordinates": [{"lat": 30.45, "lon": -84.27, "primary": true, "globe": "earth"}]
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("prop", "coordinates"))
            .and(query_param("titles", "Nowhere"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{"ns": 0, "title": "Nowhere", "missing": true}]}
            })))
            .mount(&server)
            .await;

        let tool = WikipediaCoordinatesTool::new(api(&server));
        let found = tool
            .execute(ToolCall::new(
                "wikipedia_coordinates",
                json!({"page_title": "Tallahassee, Florida"}),
            ))
            .await
            .unwrap();
        assert_eq!(found.content, "(30.45, -84.27)");

        let missing = tool
            .execute(ToolCall::new("wikipedia_coordinates", json!({"page_title": "Nowhere"})))
            .await
            .unwrap();
        assert_eq!(missing.content, "Wikipedia page for 'Nowhere' not found.");
    }

    #[tokio::test]
    async fn test_summary_truncates_sentences() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("prop", "extracts|pageprops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{
                    "title": "Chicago",
                    "extract": "Chicago is a city. It is in Illinois. It is large."
                }]}
            })))
            .mount(&server)
            .await;

        let tool = WikipediaSummaryTool::new(api(&server));
        let result = tool
            .execute(ToolCall::new(
                "wikipedia_summary",
                json!({"query": "Chicago", "sentences": 2}),
            ))
            .await
            .unwrap();
        assert_eq!(result.content, "Chicago is a city. It is in Illinois.");
    }

    #[tokio::test]
    async fn test_summary_reports_disambiguation_options() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("prop", "extracts|pageprops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{
                    "title": "Mercury",
                    "extract": "Mercury may refer to:",
                    "pageprops": {"disambiguation": ""}
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("prop", "links"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{
                    "title": "Mercury",
                    "links": [
                        {"ns": 0, "title": "Mercury (planet)"},
                        {"ns": 0, "title": "Mercury (element)"},
                        {"ns": 0, "title": "Mercury (mythology)"},
                        {"ns": 0, "title": "Freddie Mercury"}
                    ]
                }]}
            })))
            .mount(&server)
            .await;

        let tool = WikipediaSummaryTool::new(api(&server));
        let result = tool
            .execute(ToolCall::new("wikipedia_summary", json!({"query": "Mercury"})))
            .await
            .unwrap();
        assert_eq!(
            result.content,
            "The query 'Mercury' is ambiguous. Did you mean: Mercury (planet), \
             Mercury (element), Mercury (mythology)? Or try a more specific query."
        );
    }

    #[tokio::test]
    async fn test_api_error_is_a_tool_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": "badvalue", "info": "Unrecognized value"}
            })))
            .mount(&server)
            .await;

        let tool = WikipediaSummaryTool::new(api(&server));
        let err = tool
            .execute(ToolCall::new("wikipedia_summary", json!({"query": "x"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unrecognized value"));
    }
}
