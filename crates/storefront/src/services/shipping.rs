//! Shipping-rate API client.
//!
//! Quotes are requested per courier from the rate API's `/cost` endpoint and
//! cached with `moka` for 30 minutes, keyed by destination, weight and courier.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ShippingConfig;

/// How long a quote stays cached.
const RATE_TTL: Duration = Duration::from_secs(30 * 60);

/// Errors from the shipping-rate API.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Courier is not one we ship with.
    #[error("unsupported courier: {0}")]
    UnknownCourier(String),

    /// The courier does not offer this service to the destination.
    #[error("{courier} does not offer service {service} for this destination")]
    UnknownService { courier: String, service: String },

    /// Every configured courier failed.
    #[error("no courier returned shipping rates")]
    AllCouriersFailed,
}

/// One quoted delivery option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingRate {
    pub courier: String,
    pub service: String,
    pub description: String,
    pub cost: Decimal,
    /// Estimated days in transit, e.g. "2-3".
    pub etd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateKey {
    destination: String,
    weight_grams: i32,
    courier: String,
}

/// Client for the shipping-rate API.
#[derive(Clone)]
pub struct ShippingClient {
    inner: Arc<ShippingClientInner>,
}

struct ShippingClientInner {
    client: reqwest::Client,
    cost_url: String,
    api_key: SecretString,
    origin_city_id: String,
    couriers: Vec<String>,
    cache: Cache<RateKey, Vec<ShippingRate>>,
}

impl ShippingClient {
    /// Create a new shipping client.
    #[must_use]
    pub fn new(config: &ShippingConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(5_000)
            .time_to_live(RATE_TTL)
            .build();

        Self {
            inner: Arc::new(ShippingClientInner {
                client: reqwest::Client::new(),
                cost_url: format!("{}/cost", config.api_url),
                api_key: config.api_key.clone(),
                origin_city_id: config.origin_city_id.clone(),
                couriers: config.couriers.clone(),
                cache,
            }),
        }
    }

    /// Couriers quoted by [`Self::rates_for_all_couriers`].
    #[must_use]
    pub fn couriers(&self) -> &[String] {
        &self.inner.couriers
    }

    /// Rates from one courier, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError` if the courier is not configured or the API
    /// call fails.
    #[instrument(skip(self))]
    pub async fn rates(
        &self,
        destination: &str,
        weight_grams: i32,
        courier: &str,
    ) -> Result<Vec<ShippingRate>, ShippingError> {
        let courier = courier.trim().to_lowercase();
        if !self.inner.couriers.contains(&courier) {
            return Err(ShippingError::UnknownCourier(courier));
        }

        let key = RateKey {
            destination: destination.to_string(),
            weight_grams: weight_grams.max(1),
            courier,
        };

        if let Some(rates) = self.inner.cache.get(&key).await {
            debug!("Shipping rate cache hit");
            return Ok(rates);
        }

        let rates = self.fetch(&key).await?;
        self.inner.cache.insert(key, rates.clone()).await;
        Ok(rates)
    }

    /// Rates from every configured courier.
    ///
    /// A courier that fails is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::AllCouriersFailed` when no courier answered.
    #[instrument(skip(self))]
    pub async fn rates_for_all_couriers(
        &self,
        destination: &str,
        weight_grams: i32,
    ) -> Result<Vec<ShippingRate>, ShippingError> {
        let mut all = Vec::new();
        let mut answered = false;

        for courier in &self.inner.couriers {
            match self.rates(destination, weight_grams, courier).await {
                Ok(rates) => {
                    answered = true;
                    all.extend(rates);
                }
                Err(e) => warn!(courier = %courier, error = %e, "Courier rate lookup failed"),
            }
        }

        if !answered {
            return Err(ShippingError::AllCouriersFailed);
        }
        Ok(all)
    }

    /// The quote for one courier service.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::UnknownService` if the courier does not offer
    /// `service` to the destination.
    pub async fn find_rate(
        &self,
        destination: &str,
        weight_grams: i32,
        courier: &str,
        service: &str,
    ) -> Result<ShippingRate, ShippingError> {
        let rates = self.rates(destination, weight_grams, courier).await?;
        rates
            .into_iter()
            .find(|r| r.service.eq_ignore_ascii_case(service.trim()))
            .ok_or_else(|| ShippingError::UnknownService {
                courier: courier.to_string(),
                service: service.to_string(),
            })
    }

    async fn fetch(&self, key: &RateKey) -> Result<Vec<ShippingRate>, ShippingError> {
        let weight = key.weight_grams.to_string();
        let response = self
            .inner
            .client
            .post(&self.inner.cost_url)
            .header("key", self.inner.api_key.expose_secret())
            .form(&[
                ("origin", self.inner.origin_city_id.as_str()),
                ("destination", key.destination.as_str()),
                ("weight", weight.as_str()),
                ("courier", key.courier.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ShippingError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        parse_rates(&key.courier, &body)
    }
}

#[derive(Debug, Deserialize)]
struct CostEnvelope {
    rajaongkir: CostBody,
}

#[derive(Debug, Deserialize)]
struct CostBody {
    #[serde(default)]
    results: Vec<CourierResult>,
}

#[derive(Debug, Deserialize)]
struct CourierResult {
    #[serde(default)]
    costs: Vec<ServiceCost>,
}

#[derive(Debug, Deserialize)]
struct ServiceCost {
    service: String,
    #[serde(default)]
    description: String,
    cost: Vec<CostValue>,
}

#[derive(Debug, Deserialize)]
struct CostValue {
    value: Decimal,
    #[serde(default)]
    etd: String,
}

/// Parse a `/cost` response body into rates for `courier`.
fn parse_rates(courier: &str, body: &str) -> Result<Vec<ShippingRate>, ShippingError> {
    let envelope: CostEnvelope =
        serde_json::from_str(body).map_err(|e| ShippingError::Parse(e.to_string()))?;

    let rates = envelope
        .rajaongkir
        .results
        .into_iter()
        .flat_map(|result| result.costs)
        .filter_map(|service| {
            let first = service.cost.into_iter().next()?;
            Some(ShippingRate {
                courier: courier.to_string(),
                service: service.service,
                description: service.description,
                cost: first.value,
                etd: first.etd,
            })
        })
        .collect();

    Ok(rates)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "rajaongkir": {
            "status": {"code": 200, "description": "OK"},
            "results": [{
                "code": "jne",
                "name": "Jalur Nugraha Ekakurir (JNE)",
                "costs": [
                    {"service": "OKE", "description": "Ongkos Kirim Ekonomis",
                     "cost": [{"value": 38000, "etd": "4-5", "note": ""}]},
                    {"service": "REG", "description": "Layanan Reguler",
                     "cost": [{"value": 44000, "etd": "2-3", "note": ""}]},
                    {"service": "JTR", "description": "Trucking", "cost": []}
                ]
            }]
        }
    }"#;

    #[test]
    fn test_parse_rates() {
        let rates = parse_rates("jne", SAMPLE).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].service, "OKE");
        assert_eq!(rates[0].cost, Decimal::from(38000));
        assert_eq!(rates[1].etd, "2-3");
        assert!(rates.iter().all(|r| r.courier == "jne"));
    }

    #[test]
    fn test_parse_rates_empty_results() {
        let rates = parse_rates("pos", r#"{"rajaongkir": {"results": []}}"#).unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_parse_rates_malformed() {
        assert!(matches!(
            parse_rates("jne", "<html>"),
            Err(ShippingError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_rates_rejects_unconfigured_courier() {
        let client = ShippingClient::new(&ShippingConfig {
            api_key: SecretString::from("k"),
            api_url: "http://127.0.0.1:9".to_string(),
            origin_city_id: "152".to_string(),
            couriers: vec!["jne".to_string()],
        });
        let err = client.rates("501", 1000, "dhl").await.unwrap_err();
        assert!(matches!(err, ShippingError::UnknownCourier(c) if c == "dhl"));
    }
}
