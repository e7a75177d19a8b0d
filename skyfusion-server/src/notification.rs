//! Webhook notification dispatch for intelligence alerts.
//!
//! Fire-and-forget HTTP POST of `IntelligenceAlert`s as JSON.

use skyfusion_core::types::{icao_to_string, IntelligenceAlert};

#[derive(Clone)]
pub struct WebhookDispatcher {
    url: String,
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(url: &str) -> Self {
        WebhookDispatcher { url: url.to_string(), client: reqwest::Client::new() }
    }

    /// Fire-and-forget POST of an alert as JSON. Never blocks the caller
    /// and never retries — the alert is already persisted by the time
    /// this runs, so a dropped webhook delivery is not a data-loss event.
    pub fn notify(&self, alert: &IntelligenceAlert) {
        let payload = serde_json::json!({
            "kind": format!("{:?}", alert.kind),
            "title": alert.title,
            "description": alert.description,
            "severity": format!("{:?}", alert.severity),
            "aircraft": alert.aircraft.iter().map(icao_to_string).collect::<Vec<_>>(),
            "regions": alert.regions,
            "news_refs": alert.news_refs,
            "timestamp": alert.timestamp,
        });

        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&payload).send().await {
                tracing::warn!(error = %e, "webhook delivery failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfusion_core::types::{AlertKind, Severity};

    #[test]
    fn test_webhook_dispatcher_creation() {
        let wh = WebhookDispatcher::new("https://example.com/hook");
        assert_eq!(wh.url, "https://example.com/hook");
    }

    #[test]
    fn test_alert_payload_serialization() {
        let alert = IntelligenceAlert {
            kind: AlertKind::Formation,
            title: "Strike package formed".to_string(),
            description: "4 aircraft in strike package formation".to_string(),
            severity: Severity::Critical,
            aircraft: vec![[0xAD, 0xF7, 0xC8]],
            regions: vec!["eastern-europe".to_string()],
            news_refs: vec![],
            timestamp: 1_700_000_000.0,
        };

        let payload = serde_json::json!({
            "kind": format!("{:?}", alert.kind),
            "title": alert.title,
            "severity": format!("{:?}", alert.severity),
            "aircraft": alert.aircraft.iter().map(icao_to_string).collect::<Vec<_>>(),
        });

        assert_eq!(payload["kind"], "Formation");
        assert_eq!(payload["severity"], "Critical");
        assert_eq!(payload["aircraft"][0], "ADF7C8");
    }
}
