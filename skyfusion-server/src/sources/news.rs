//! News article-list client (§6): `{articles: [{url, title, seendate:
//! "YYYYMMDDThhmmssZ", language?, socialimage?, tone?}]}`. `skyfusion_core`
//! only knows `NewsEvent`; this module owns the wire shape and timestamp
//! parsing.

use serde::Deserialize;

use skyfusion_core::types::NewsEvent;

use crate::errors::FetchError;

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    url: String,
    title: String,
    seendate: String,
    #[allow(dead_code)]
    language: Option<String>,
    #[allow(dead_code)]
    socialimage: Option<String>,
    tone: Option<f64>,
}

/// Parses GDELT-style `YYYYMMDDThhmmssZ` into epoch seconds.
fn parse_seendate(s: &str) -> Option<f64> {
    if s.len() != 16 || !s.ends_with('Z') {
        return None;
    }
    let year: i64 = s[0..4].parse().ok()?;
    let month: i64 = s[4..6].parse().ok()?;
    let day: i64 = s[6..8].parse().ok()?;
    let hour: i64 = s[9..11].parse().ok()?;
    let minute: i64 = s[11..13].parse().ok()?;
    let second: i64 = s[13..15].parse().ok()?;

    // Days since epoch via a civil-calendar formula (Howard Hinnant's
    // days_from_civil), avoiding a chrono dependency for this one
    // conversion.
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146097 + doe - 719468;

    Some((days * 86400 + hour * 3600 + minute * 60 + second) as f64)
}

fn to_news_event(a: Article) -> Option<NewsEvent> {
    let published_at = parse_seendate(&a.seendate)?;
    Some(NewsEvent {
        title: a.title,
        published_at,
        url: a.url,
        source_domain: String::new(),
        countries: Vec::new(),
        located_places: Vec::new(),
        entities: Vec::new(),
        categories: Vec::new(),
        tone: a.tone.unwrap_or(0.0),
        credibility: 0.5,
    })
}

pub struct NewsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        NewsClient { client: reqwest::Client::new(), base_url, api_key }
    }

    pub async fn fetch_region(&self, query: &str) -> Result<Vec<NewsEvent>, FetchError> {
        let mut req = self.client.get(&self.base_url).query(&[("query", query)]).timeout(std::time::Duration::from_secs(10));
        if let Some(key) = &self.api_key {
            req = req.query(&[("apikey", key)]);
        }
        let resp = req.send().await.map_err(|e| FetchError::TransientUpstream { source: e, attempt: 1 })?;
        let body: ArticleResponse = resp.json().await.map_err(|e| FetchError::BadPayload(e.to_string()))?;
        Ok(body.articles.into_iter().filter_map(to_news_event).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seendate() {
        let ts = parse_seendate("20231115T120000Z").unwrap();
        // 2023-11-15T12:00:00Z
        assert_eq!(ts, 1700049600.0);
    }

    #[test]
    fn test_parse_seendate_rejects_malformed() {
        assert!(parse_seendate("not-a-date").is_none());
    }
}
