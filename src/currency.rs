//! Currency rate lookup used for product price conversion.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Canonical form of a currency code: trimmed, upper case.
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn same_currency(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Multiplier turning an amount in `from` into an amount in `to`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, ServiceError>;
}

/// Fixed table of rates keyed by currency pair.
#[derive(Debug, Clone, Default)]
pub struct StaticRateProvider {
    rates: HashMap<(String, String), Decimal>,
}

impl StaticRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: Decimal) -> Self {
        self.rates
            .insert((normalize_currency(from), normalize_currency(to)), rate);
        self
    }

    /// Builds a table from rates quoted against a single base currency.
    pub fn from_base(base: &str, rates: &HashMap<String, Decimal>) -> Self {
        rates
            .iter()
            .fold(Self::new(), |provider, (to, rate)| {
                provider.with_rate(base, to, *rate)
            })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
impl CurrencyRateProvider for StaticRateProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, ServiceError> {
        if same_currency(from, to) {
            return Ok(Decimal::ONE);
        }

        let key = (normalize_currency(from), normalize_currency(to));
        self.rates.get(&key).copied().ok_or_else(|| {
            ServiceError::ExternalServiceError(format!(
                "No conversion rate configured for {} -> {}",
                key.0, key.1
            ))
        })
    }
}

/// Rates fetched from an HTTP service exposing `GET /latest?from=..&to=..`.
pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, Decimal>,
}

impl HttpRateProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rene-shop/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CurrencyRateProvider for HttpRateProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, ServiceError> {
        let from = normalize_currency(from);
        let to = normalize_currency(to);
        let url = format!("{}/latest", self.base_url);
        debug!("Requesting currency rate {} -> {} from {}", from, to, url);

        let response = self
            .client
            .get(&url)
            .query(&[("from", from.as_str()), ("to", to.as_str())])
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "Request error: {} for currency pair: {}{}",
                    e, from, to
                ))
            })?;

        if !response.status().is_success() {
            warn!("Rate service returned {} for {}{}", response.status(), from, to);
            return Err(ServiceError::ExternalServiceError(format!(
                "HTTP error: {} for currency pair: {}{}",
                response.status(),
                from,
                to
            )));
        }

        let body: LatestRatesResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!(
                "Failed to parse rate response for {}{}: {}",
                from, to, e
            ))
        })?;

        let rate = body
            .rates
            .into_iter()
            .find(|(code, _)| same_currency(code, &to))
            .map(|(_, rate)| rate)
            .ok_or_else(|| {
                ServiceError::ExternalServiceError(format!(
                    "No rate data found for currency pair: {}{}",
                    from, to
                ))
            })?;

        if rate <= Decimal::ZERO {
            return Err(ServiceError::ExternalServiceError(format!(
                "Rate service returned non-positive rate {} for {}{}",
                rate, from, to
            )));
        }

        Ok(rate)
    }
}

/// Picks the HTTP provider when a URL is configured, else the pinned rates.
pub fn provider_from_config(cfg: &AppConfig) -> Result<Arc<dyn CurrencyRateProvider>, ServiceError> {
    match &cfg.rates.provider_url {
        Some(url) => Ok(Arc::new(HttpRateProvider::new(
            url,
            Duration::from_secs(cfg.rates.timeout_secs),
        )?)),
        None => {
            let provider = StaticRateProvider::from_base(&cfg.base_currency, &cfg.rates.fixed);
            if provider.is_empty() {
                warn!(
                    "No currency rates configured; prices convert only to {}",
                    normalize_currency(&cfg.base_currency)
                );
            } else {
                debug!("Using {} pinned currency rates", provider.len());
            }
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn static_provider_normalizes_codes() {
        let provider = StaticRateProvider::new().with_rate("usd", " eur", dec!(0.92));
        assert_eq!(provider.get_rate("USD", "EUR").await.unwrap(), dec!(0.92));
        assert_eq!(provider.get_rate("EUR", "eur").await.unwrap(), Decimal::ONE);
        assert!(provider.get_rate("EUR", "USD").await.is_err());
    }

    #[tokio::test]
    async fn static_provider_from_lowercased_config_keys() {
        let mut fixed = HashMap::new();
        fixed.insert("eur".to_string(), dec!(0.92));
        fixed.insert("jpy".to_string(), dec!(151.37));

        let provider = StaticRateProvider::from_base("USD", &fixed);
        assert_eq!(provider.len(), 2);
        assert_eq!(provider.get_rate("USD", "JPY").await.unwrap(), dec!(151.37));
    }

    #[tokio::test]
    async fn http_provider_reads_rate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "EUR"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "rates": { "EUR": "0.92" } })),
            )
            .mount(&server)
            .await;

        let provider = HttpRateProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let rate = provider.get_rate("usd", "eur").await.unwrap();
        assert_eq!(rate, dec!(0.92));
    }

    #[tokio::test]
    async fn http_provider_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = HttpRateProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = provider.get_rate("USD", "EUR").await.unwrap_err();
        assert!(matches!(err, ServiceError::ExternalServiceError(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn http_provider_rejects_missing_or_bad_rates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("to", "GBP"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": {} })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("to", "CHF"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "rates": { "CHF": "0" } })),
            )
            .mount(&server)
            .await;

        let provider = HttpRateProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert!(provider.get_rate("USD", "GBP").await.is_err());
        assert!(provider.get_rate("USD", "CHF").await.is_err());
    }

    #[test]
    fn config_without_url_uses_fixed_rates() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.rates.fixed.insert("EUR".into(), dec!(0.92));
        assert!(provider_from_config(&cfg).is_ok());

        cfg.rates.provider_url = Some("https://rates.example.com".into());
        assert!(provider_from_config(&cfg).is_ok());
    }
}
