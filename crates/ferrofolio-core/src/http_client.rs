use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Map, Value};

/// Minimal HTTP method set needed by the quote client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

/// HTTP request envelope used by quote transport calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub base_url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(base_url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            base_url: base_url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            timeout_ms: 3_000,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// First value of query parameter `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Full URL with percent-encoded query string.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.base_url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.base_url)
    }
}

/// HTTP response envelope returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Transport failure classification.
///
/// `Connect` means no connection could be established at all; the quote
/// client escalates only this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Connect,
    Timeout,
    Other,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Other, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_connect(&self) -> bool {
        matches!(self.kind, HttpErrorKind::Connect)
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Transport contract that supports async execution and scoped sessions.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;

    /// Open a session with its own connections. They are closed once the
    /// last handle to the session is dropped.
    fn open_session(&self) -> Arc<dyn HttpClient>;
}

/// Production HTTP client using reqwest for real API calls.
///
/// Every session builds a fresh `reqwest::Client`, so keep-alive sockets
/// never outlive the session that opened them.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default configuration.
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("ferrofolio/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(request.url()),
            };

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            builder = builder.timeout(Duration::from_millis(request.timeout_ms));

            let response = builder.send().await.map_err(|e| {
                if e.is_connect() {
                    HttpError::connect(format!("connection failed: {e}"))
                } else if e.is_timeout() {
                    HttpError::timeout(format!("request timeout: {e}"))
                } else {
                    HttpError::other(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::other(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }

    fn open_session(&self) -> Arc<dyn HttpClient> {
        Arc::new(Self::new())
    }
}

/// Canned answers and injected faults served by [`FixtureHttpClient`].
#[derive(Debug, Clone, Default)]
struct FixtureScript {
    currency: String,
    prices: BTreeMap<String, f64>,
    null_prices: BTreeSet<String>,
    broken: BTreeSet<String>,
    garbled: BTreeSet<String>,
    unreachable: bool,
    latency: Duration,
    symbol_latency: BTreeMap<String, Duration>,
}

/// Request counters shared by a fixture and every session it opens.
#[derive(Debug, Default)]
struct FixtureLedger {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    settled: AtomicUsize,
    completed: AtomicUsize,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    requested: Mutex<Vec<String>>,
    responded: Mutex<Vec<String>>,
}

/// Marks one request in flight until dropped, whether it finished or was
/// abandoned mid-await.
struct InFlight<'a> {
    ledger: &'a FixtureLedger,
}

impl<'a> InFlight<'a> {
    fn enter(ledger: &'a FixtureLedger) -> Self {
        let current = ledger.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        ledger.max_in_flight.fetch_max(current, Ordering::SeqCst);
        Self { ledger }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ledger.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.ledger.settled.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-process transport that answers like the quote service.
///
/// Serves `data.<SYMBOL>.quote.<CURRENCY>.price` bodies for the `symbol`
/// query parameter, and can inject latency and failures. Used for offline
/// runs (`--mock`) and tests.
#[derive(Debug, Default)]
pub struct FixtureHttpClient {
    script: Arc<FixtureScript>,
    ledger: Arc<FixtureLedger>,
}

impl FixtureHttpClient {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            script: Arc::new(FixtureScript {
                currency: currency.into().to_ascii_uppercase(),
                ..FixtureScript::default()
            }),
            ledger: Arc::default(),
        }
    }

    fn script_mut(&mut self) -> &mut FixtureScript {
        Arc::make_mut(&mut self.script)
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.script_mut()
            .prices
            .insert(symbol.to_ascii_uppercase(), price);
        self
    }

    pub fn with_prices<'s>(mut self, prices: impl IntoIterator<Item = (&'s str, f64)>) -> Self {
        let script = self.script_mut();
        for (symbol, price) in prices {
            script.prices.insert(symbol.to_ascii_uppercase(), price);
        }
        self
    }

    /// Symbol is listed in `data` but its price is `null`.
    pub fn with_null_price(mut self, symbol: &str) -> Self {
        self.script_mut()
            .null_prices
            .insert(symbol.to_ascii_uppercase());
        self
    }

    /// Any request naming `symbol` fails with a timeout.
    pub fn with_broken_symbol(mut self, symbol: &str) -> Self {
        self.script_mut().broken.insert(symbol.to_ascii_uppercase());
        self
    }

    /// Any request naming `symbol` receives a non-JSON body.
    pub fn with_garbled_symbol(mut self, symbol: &str) -> Self {
        self.script_mut()
            .garbled
            .insert(symbol.to_ascii_uppercase());
        self
    }

    /// Every request fails with a connect error.
    pub fn unreachable(mut self) -> Self {
        self.script_mut().unreachable = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.script_mut().latency = latency;
        self
    }

    /// Requests naming `symbol` take at least `latency` to answer.
    pub fn with_symbol_latency(mut self, symbol: &str, latency: Duration) -> Self {
        self.script_mut()
            .symbol_latency
            .insert(symbol.to_ascii_uppercase(), latency);
        self
    }

    /// Total requests received.
    pub fn calls(&self) -> usize {
        self.ledger.calls.load(Ordering::SeqCst)
    }

    /// Requests currently awaiting their answer.
    pub fn in_flight(&self) -> usize {
        self.ledger.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.ledger.max_in_flight.load(Ordering::SeqCst)
    }

    /// Requests that either answered or were dropped before answering.
    pub fn settled(&self) -> usize {
        self.ledger.settled.load(Ordering::SeqCst)
    }

    /// Requests that produced an answer.
    pub fn completed(&self) -> usize {
        self.ledger.completed.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.ledger.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.ledger.sessions_closed.load(Ordering::SeqCst)
    }

    /// Raw `symbol` parameter of every request, in arrival order.
    pub fn requested(&self) -> Vec<String> {
        snapshot(&self.ledger.requested)
    }

    /// Raw `symbol` parameter of every answered request, in answer order.
    pub fn responded(&self) -> Vec<String> {
        snapshot(&self.ledger.responded)
    }
}

fn snapshot(log: &Mutex<Vec<String>>) -> Vec<String> {
    log.lock().map(|guard| guard.clone()).unwrap_or_default()
}

fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|symbol| symbol.trim().to_ascii_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect()
}

impl FixtureScript {
    fn latency_for(&self, symbols: &[String]) -> Duration {
        symbols
            .iter()
            .filter_map(|symbol| self.symbol_latency.get(symbol).copied())
            .fold(self.latency, Duration::max)
    }

    fn respond(
        &self,
        request: &HttpRequest,
        symbols: &[String],
    ) -> Result<HttpResponse, HttpError> {
        if self.unreachable {
            return Err(HttpError::connect(format!(
                "connection refused: {}",
                request.base_url
            )));
        }

        if symbols.iter().any(|symbol| self.broken.contains(symbol)) {
            return Err(HttpError::timeout(format!(
                "request timeout for '{}'",
                symbols.join(",")
            )));
        }
        if symbols.iter().any(|symbol| self.garbled.contains(symbol)) {
            return Ok(HttpResponse::ok_json("<html>bad gateway</html>"));
        }

        let currency = request
            .query_value("convert")
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| self.currency.clone());

        let mut data = Map::new();
        for symbol in symbols {
            let price = if self.null_prices.contains(symbol) {
                Value::Null
            } else if let Some(price) = self.prices.get(symbol) {
                json!(price)
            } else {
                continue;
            };
            data.insert(
                symbol.clone(),
                json!({ "symbol": symbol, "quote": { currency.as_str(): { "price": price } } }),
            );
        }

        let body = json!({
            "status": { "error_code": 0, "error_message": Value::Null },
            "data": data,
        });
        Ok(HttpResponse::ok_json(body.to_string()))
    }
}

async fn serve(
    script: &FixtureScript,
    ledger: &FixtureLedger,
    request: HttpRequest,
) -> Result<HttpResponse, HttpError> {
    ledger.calls.fetch_add(1, Ordering::SeqCst);
    let raw = request.query_value("symbol").unwrap_or_default().to_owned();
    if let Ok(mut requested) = ledger.requested.lock() {
        requested.push(raw.clone());
    }

    let _in_flight = InFlight::enter(ledger);
    let symbols = split_symbols(&raw);
    let latency = script.latency_for(&symbols);
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let response = script.respond(&request, &symbols);
    ledger.completed.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut responded) = ledger.responded.lock() {
        responded.push(raw);
    }
    response
}

fn open_fixture_session(
    script: &Arc<FixtureScript>,
    ledger: &Arc<FixtureLedger>,
) -> Arc<dyn HttpClient> {
    ledger.sessions_opened.fetch_add(1, Ordering::SeqCst);
    Arc::new(FixtureSession {
        script: Arc::clone(script),
        ledger: Arc::clone(ledger),
    })
}

impl HttpClient for FixtureHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(serve(&self.script, &self.ledger, request))
    }

    fn open_session(&self) -> Arc<dyn HttpClient> {
        open_fixture_session(&self.script, &self.ledger)
    }
}

/// Session handle of a [`FixtureHttpClient`]; counts itself closed on drop.
#[derive(Debug)]
struct FixtureSession {
    script: Arc<FixtureScript>,
    ledger: Arc<FixtureLedger>,
}

impl HttpClient for FixtureSession {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(serve(&self.script, &self.ledger, request))
    }

    fn open_session(&self) -> Arc<dyn HttpClient> {
        open_fixture_session(&self.script, &self.ledger)
    }
}

impl Drop for FixtureSession {
    fn drop(&mut self) {
        self.ledger.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}
