//! Quote service client.
//!
//! One request per symbol ([`QuoteSource::fetch_one`]) or one request for a
//! comma-joined symbol list ([`QuoteSource::fetch_batch`]). Responses are
//! classified per symbol into [`QuoteStatus`]; only a failure to connect at
//! all escapes as [`FetchError::TransportFatal`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{QuoteClientConfig, API_KEY_HEADER};
use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::{PriceQuote, PriceTable, QuoteStatus, Symbol};

pub type QuoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Source of per-symbol prices consumed by fetch strategies.
///
/// Implementations must be `Send + Sync`; the concurrent strategies share
/// one session across their fan-out.
pub trait QuoteSource: Send + Sync {
    /// Open a session that owns its own connections. Strategies open one per
    /// resolution and drop it before returning, which closes them.
    fn open_session(&self) -> Arc<dyn QuoteSource>;

    /// Price a single symbol with one request.
    fn fetch_one<'a>(&'a self, symbol: &'a Symbol) -> QuoteFuture<'a, PriceQuote>;

    /// Price every symbol in `symbols` with one request. The returned table
    /// holds exactly one entry per requested symbol.
    fn fetch_batch<'a>(&'a self, symbols: &'a [Symbol]) -> QuoteFuture<'a, PriceTable>;
}

/// Client for the remote quote service.
#[derive(Clone)]
pub struct QuoteClient {
    http_client: Arc<dyn HttpClient>,
    config: QuoteClientConfig,
}

impl QuoteClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: QuoteClientConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Client backed by reqwest; each session gets its own connection pool.
    pub fn with_reqwest(config: QuoteClientConfig) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), config)
    }

    fn build_request(&self, symbols: &[Symbol]) -> HttpRequest {
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");

        HttpRequest::get(self.config.endpoint())
            .with_query("symbol", joined)
            .with_query("convert", self.config.currency())
            .with_header("accept", "application/json")
            .with_header(API_KEY_HEADER, self.config.api_key())
            .with_timeout_ms(self.config.timeout_ms())
    }

    async fn request_quotes(&self, symbols: &[Symbol]) -> Result<Vec<PriceQuote>, FetchError> {
        debug!(count = symbols.len(), "requesting quotes");
        let outcome = self.http_client.execute(self.build_request(symbols)).await;
        classify_response(symbols, self.config.currency(), outcome)
    }
}

impl QuoteSource for QuoteClient {
    fn open_session(&self) -> Arc<dyn QuoteSource> {
        Arc::new(Self {
            http_client: self.http_client.open_session(),
            config: self.config.clone(),
        })
    }

    fn fetch_one<'a>(&'a self, symbol: &'a Symbol) -> QuoteFuture<'a, PriceQuote> {
        Box::pin(async move {
            let quotes = self.request_quotes(std::slice::from_ref(symbol)).await?;
            Ok(quotes
                .into_iter()
                .next()
                .unwrap_or_else(|| PriceQuote::malformed(symbol.clone())))
        })
    }

    fn fetch_batch<'a>(&'a self, symbols: &'a [Symbol]) -> QuoteFuture<'a, PriceTable> {
        Box::pin(async move {
            if symbols.is_empty() {
                return Ok(PriceTable::new());
            }
            let quotes = self.request_quotes(symbols).await?;
            Ok(quotes.into_iter().collect())
        })
    }
}

/// Classify a transport outcome into one quote per requested symbol.
pub fn classify_response(
    symbols: &[Symbol],
    currency: &str,
    outcome: Result<HttpResponse, HttpError>,
) -> Result<Vec<PriceQuote>, FetchError> {
    let response = match outcome {
        Ok(response) => response,
        Err(error) if error.is_connect() => {
            return Err(FetchError::transport_fatal(error.message()));
        }
        Err(error) => {
            warn!(error = %error, count = symbols.len(), "quote request failed");
            return Ok(degrade_all(symbols, QuoteStatus::Malformed));
        }
    };

    let body: Value = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(error) => {
            warn!(
                status = response.status,
                error = %error,
                "quote response is not valid JSON"
            );
            return Ok(degrade_all(symbols, QuoteStatus::Malformed));
        }
    };

    let Some(data) = body.get("data").and_then(Value::as_object) else {
        let service_message = body
            .pointer("/status/error_message")
            .and_then(Value::as_str)
            .unwrap_or("no data in response");
        warn!(
            status = response.status,
            message = service_message,
            "quote service returned no data"
        );
        let status = if response.status == 400 {
            QuoteStatus::NotFound
        } else {
            QuoteStatus::Malformed
        };
        return Ok(degrade_all(symbols, status));
    };

    let price_path = format!("/quote/{currency}/price");
    let quotes = symbols
        .iter()
        .map(|symbol| {
            let entry = data.get(symbol.as_str()).and_then(|entry| match entry {
                Value::Array(items) => items.first(),
                other => Some(other),
            });

            let Some(entry) = entry else {
                warn!(symbol = %symbol, "price not found");
                return PriceQuote::not_found(symbol.clone());
            };

            match entry.pointer(&price_path).and_then(Value::as_f64) {
                Some(price) if price.is_finite() && price >= 0.0 => {
                    PriceQuote::found(symbol.clone(), price)
                }
                _ => {
                    warn!(symbol = %symbol, currency, "price entry is malformed");
                    PriceQuote::malformed(symbol.clone())
                }
            }
        })
        .collect();

    Ok(quotes)
}

fn degrade_all(symbols: &[Symbol], status: QuoteStatus) -> Vec<PriceQuote> {
    symbols
        .iter()
        .map(|symbol| {
            warn!(symbol = %symbol, status = %status, "symbol left unpriced");
            match status {
                QuoteStatus::NotFound => PriceQuote::not_found(symbol.clone()),
                QuoteStatus::Found | QuoteStatus::Malformed => {
                    PriceQuote::malformed(symbol.clone())
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::FixtureHttpClient;

    fn sym(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    fn client(http: FixtureHttpClient) -> (Arc<FixtureHttpClient>, QuoteClient) {
        let http = Arc::new(http);
        let config = QuoteClientConfig::new("test-key").expect("valid config");
        (http.clone(), QuoteClient::new(http, config))
    }

    #[tokio::test]
    async fn fetch_one_returns_found_price() {
        let (_, client) = client(FixtureHttpClient::new("USD").with_price("BTC", 50_000.0));

        let quote = client.fetch_one(&sym("BTC")).await.expect("no fatal error");

        assert_eq!(quote, PriceQuote::found(sym("BTC"), 50_000.0));
    }

    #[tokio::test]
    async fn session_owns_a_transport_session_until_dropped() {
        let (http, client) = client(FixtureHttpClient::new("USD").with_price("BTC", 1.0));

        let session = client.open_session();
        let quote = session
            .fetch_one(&sym("BTC"))
            .await
            .expect("no fatal error");
        assert_eq!(quote.status, QuoteStatus::Found);
        assert_eq!((http.sessions_opened(), http.sessions_closed()), (1, 0));

        drop(session);

        assert_eq!(http.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn fetch_one_missing_symbol_is_not_found() {
        let (_, client) = client(FixtureHttpClient::new("USD"));

        let quote = client.fetch_one(&sym("NOPE")).await.expect("no fatal error");

        assert_eq!(quote.status, QuoteStatus::NotFound);
        assert_eq!(quote.price, 0.0);
    }

    #[tokio::test]
    async fn fetch_one_garbled_body_is_malformed() {
        let (_, client) = client(FixtureHttpClient::new("USD").with_garbled_symbol("BTC"));

        let quote = client.fetch_one(&sym("BTC")).await.expect("no fatal error");

        assert_eq!(quote.status, QuoteStatus::Malformed);
    }

    #[tokio::test]
    async fn fetch_one_unreachable_is_fatal() {
        let (_, client) = client(FixtureHttpClient::new("USD").unreachable());

        let error = client.fetch_one(&sym("BTC")).await.expect_err("must fail");

        assert!(matches!(error, FetchError::TransportFatal { .. }));
    }

    #[tokio::test]
    async fn fetch_batch_classifies_each_symbol_independently() {
        let (http, client) = client(
            FixtureHttpClient::new("USD")
                .with_price("BTC", 50_000.0)
                .with_null_price("ETH"),
        );
        let symbols = vec![sym("BTC"), sym("ETH"), sym("XYZ")];

        let table = client.fetch_batch(&symbols).await.expect("no fatal error");

        assert_eq!(http.calls(), 1);
        assert_eq!(http.requested(), vec![String::from("BTC,ETH,XYZ")]);
        assert_eq!(table.status(&sym("BTC")), QuoteStatus::Found);
        assert_eq!(table.status(&sym("ETH")), QuoteStatus::Malformed);
        assert_eq!(table.status(&sym("XYZ")), QuoteStatus::NotFound);
    }

    #[tokio::test]
    async fn fetch_batch_transport_failure_degrades_whole_batch() {
        let (_, client) = client(
            FixtureHttpClient::new("USD")
                .with_price("BTC", 50_000.0)
                .with_broken_symbol("ETH"),
        );
        let symbols = vec![sym("BTC"), sym("ETH")];

        let table = client.fetch_batch(&symbols).await.expect("no fatal error");

        assert_eq!(table.count(QuoteStatus::Malformed), 2);
        assert_eq!(table.price(&sym("BTC")), 0.0);
    }

    #[tokio::test]
    async fn fetch_batch_of_nothing_issues_no_request() {
        let (http, client) = client(FixtureHttpClient::new("USD"));

        let table = client.fetch_batch(&[]).await.expect("no fatal error");

        assert!(table.is_empty());
        assert_eq!(http.calls(), 0);
    }

    #[test]
    fn rejected_symbol_list_is_not_found() {
        let body = serde_json::json!({
            "status": {
                "error_code": 400,
                "error_message": "Invalid value for \"symbol\": \"XYZ\""
            }
        });
        let outcome = Ok(HttpResponse {
            status: 400,
            body: body.to_string(),
        });

        let quotes = classify_response(&[sym("XYZ")], "USD", outcome).expect("no fatal error");

        assert_eq!(quotes, vec![PriceQuote::not_found(sym("XYZ"))]);
    }

    #[test]
    fn server_error_without_data_is_malformed() {
        let outcome = Ok(HttpResponse {
            status: 500,
            body: String::from(r#"{"status":{"error_code":500}}"#),
        });

        let quotes = classify_response(&[sym("BTC")], "USD", outcome).expect("no fatal error");

        assert_eq!(quotes, vec![PriceQuote::malformed(sym("BTC"))]);
    }

    #[test]
    fn array_shaped_entries_use_first_element() {
        let body = serde_json::json!({
            "data": {
                "BTC": [
                    { "quote": { "USD": { "price": 42.5 } } },
                    { "quote": { "USD": { "price": 1.0 } } }
                ]
            }
        });
        let outcome = Ok(HttpResponse::ok_json(body.to_string()));

        let quotes = classify_response(&[sym("BTC")], "USD", outcome).expect("no fatal error");

        assert_eq!(quotes, vec![PriceQuote::found(sym("BTC"), 42.5)]);
    }

    #[test]
    fn negative_price_is_malformed() {
        let body = r#"{"data":{"BTC":{"quote":{"USD":{"price":-3.0}}}}}"#;

        let quotes = classify_response(&[sym("BTC")], "USD", Ok(HttpResponse::ok_json(body)))
            .expect("no fatal error");

        assert_eq!(quotes[0].status, QuoteStatus::Malformed);
    }

    #[test]
    fn price_in_other_currency_is_malformed() {
        let body = r#"{"data":{"BTC":{"quote":{"EUR":{"price":3.0}}}}}"#;

        let quotes = classify_response(&[sym("BTC")], "USD", Ok(HttpResponse::ok_json(body)))
            .expect("no fatal error");

        assert_eq!(quotes[0].status, QuoteStatus::Malformed);
    }
}
