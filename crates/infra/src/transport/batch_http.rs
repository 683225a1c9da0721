//! Batching HTTP transport
//!
//! Operations that arrive within one interval and share a batch key (their
//! header map) are POSTed together as a JSON array. The server answers with
//! an array of envelopes in the same order, which is demultiplexed back to
//! the individual callers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gqlink_core::Transport;
use gqlink_domain::{BatchConfig, GqlinkError, GraphqlResponse, Operation, Result};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;
use crate::http::HttpClient;

type Reply = oneshot::Sender<Result<GraphqlResponse>>;

struct Pending {
    operation: Operation,
    reply: Reply,
}

struct Queue {
    id: u64,
    pending: Vec<Pending>,
}

#[derive(Default)]
struct Queues {
    next_id: u64,
    by_key: HashMap<String, Queue>,
}

struct Inner {
    http: HttpClient,
    endpoint: String,
    max_batch_size: usize,
    interval: Duration,
    queues: Mutex<Queues>,
}

/// [`Transport`] that coalesces operations into batched HTTP calls.
///
/// A batch is dispatched when it reaches `max_batch_size` or when
/// `interval` has passed since its first operation, whichever comes first.
/// Dispatch runs on a spawned task, so a caller that stops waiting does not
/// cancel the call for the others.
#[derive(Clone)]
pub struct BatchHttpTransport {
    inner: Arc<Inner>,
}

impl BatchHttpTransport {
    /// Transport posting batches to `endpoint` under the bounds in `batch`.
    ///
    /// A `max_batch_size` of zero is treated as one.
    pub fn new(http: HttpClient, endpoint: impl Into<String>, batch: &BatchConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                endpoint: endpoint.into(),
                max_batch_size: batch.max_batch_size.max(1),
                interval: batch.interval(),
                queues: Mutex::new(Queues::default()),
            }),
        }
    }

    /// URL every batch is posted to
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Number of operations accumulated but not yet dispatched
    pub fn pending(&self) -> usize {
        self.inner.queues.lock().by_key.values().map(|queue| queue.pending.len()).sum()
    }

    fn enqueue(&self, operation: Operation, reply: Reply) {
        let key = operation.context.batch_key();
        let mut queues = self.inner.queues.lock();
        let Queues { next_id, by_key } = &mut *queues;

        let queue = by_key.entry(key.clone()).or_insert_with(|| {
            *next_id += 1;
            Queue { id: *next_id, pending: Vec::new() }
        });
        queue.pending.push(Pending { operation, reply });

        if queue.pending.len() >= self.inner.max_batch_size {
            if let Some(full) = by_key.remove(&key) {
                self.spawn_dispatch(full.pending);
            }
        } else if queue.pending.len() == 1 {
            self.spawn_timer(key, queue.id);
        }
    }

    fn spawn_timer(&self, key: String, id: u64) {
        let transport = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(transport.inner.interval).await;
            let due = {
                let mut queues = transport.inner.queues.lock();
                // The batch may already have left on the size bound.
                if queues.by_key.get(&key).is_some_and(|queue| queue.id == id) {
                    queues.by_key.remove(&key)
                } else {
                    None
                }
            };
            if let Some(queue) = due {
                transport.inner.dispatch(queue.pending).await;
            }
        });
    }

    fn spawn_dispatch(&self, batch: Vec<Pending>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.dispatch(batch).await });
    }
}

impl Inner {
    async fn dispatch(&self, batch: Vec<Pending>) {
        let (operations, replies): (Vec<Operation>, Vec<Reply>) =
            batch.into_iter().map(|pending| (pending.operation, pending.reply)).unzip();

        match self.send_batch(&operations).await {
            Ok(responses) => {
                for (reply, response) in replies.into_iter().zip(responses) {
                    // The caller may have gone away; nothing to deliver to.
                    let _ = reply.send(Ok(response));
                }
            }
            Err(err) => {
                warn!(size = operations.len(), error = %err, "Batched request failed");
                for reply in replies {
                    let _ = reply.send(Err(err.clone()));
                }
            }
        }
    }

    #[instrument(skip(self, operations), fields(size = operations.len()))]
    async fn send_batch(&self, operations: &[Operation]) -> Result<Vec<GraphqlResponse>> {
        let Some(first) = operations.first() else {
            return Ok(Vec::new());
        };

        debug!(endpoint = %self.endpoint, "Dispatching batch");
        let response =
            self.http.post_json(&self.endpoint, operations, first.context.headers()).await?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| GqlinkError::from(InfraError::from(err)))?;
        if !status.is_success() {
            return Err(GqlinkError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let envelopes = match serde_json::from_slice::<Value>(&body)
            .map_err(|err| GqlinkError::from(InfraError::from(err)))?
        {
            Value::Array(items) => items,
            other => {
                return Err(GqlinkError::Protocol(format!(
                    "expected a JSON array of results, got {}",
                    json_kind(&other)
                )))
            }
        };

        if envelopes.len() != operations.len() {
            return Err(GqlinkError::Protocol(format!(
                "batch of {} operations answered with {} results",
                operations.len(),
                envelopes.len()
            )));
        }

        envelopes
            .into_iter()
            .map(|envelope| {
                serde_json::from_value::<GraphqlResponse>(envelope)
                    .map_err(|err| GqlinkError::from(InfraError::from(err)))
            })
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl Transport for BatchHttpTransport {
    async fn execute(&self, operation: Operation) -> Result<GraphqlResponse> {
        let (reply, receiver) = oneshot::channel();
        self.enqueue(operation, reply);
        receiver
            .await
            .map_err(|_| GqlinkError::Internal("batch dispatcher dropped the operation".into()))?
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;

    /// Answers every batch entry with its position and operation name.
    fn echo(request: &Request) -> ResponseTemplate {
        let batch: Vec<Value> = request.body_json().unwrap();
        let results: Vec<Value> = batch
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                json!({ "data": { "index": index, "name": entry["operationName"] } })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(results)
    }

    fn transport(server: &MockServer, max_batch_size: usize, interval_ms: u64) -> BatchHttpTransport {
        BatchHttpTransport::new(
            HttpClient::new().unwrap(),
            server.uri(),
            &BatchConfig { max_batch_size, interval_ms },
        )
    }

    fn named(name: &str) -> Operation {
        Operation::new(format!("query {name} {{ a }}")).with_operation_name(name)
    }

    #[tokio::test]
    async fn operations_within_interval_share_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(echo).expect(1).mount(&server).await;

        let transport = transport(&server, 100, 20);
        let (a, b, c) = tokio::join!(
            transport.execute(named("A")),
            transport.execute(named("B")),
            transport.execute(named("C")),
        );

        for (result, (index, name)) in [a, b, c].into_iter().zip([(0, "A"), (1, "B"), (2, "C")]) {
            let data = result.unwrap().data.unwrap();
            assert_eq!(data["index"], index);
            assert_eq!(data["name"], name);
        }
        assert_eq!(transport.pending(), 0);
    }

    #[tokio::test]
    async fn wire_format_is_array_of_operations() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(echo).mount(&server).await;

        let transport = transport(&server, 100, 1);
        transport
            .execute(named("Only").with_variables(json!({ "id": 1 })))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        assert_eq!(
            body,
            json!([{ "query": "query Only { a }", "variables": { "id": 1 }, "operationName": "Only" }])
        );
    }

    #[tokio::test]
    async fn size_bound_splits_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(echo).mount(&server).await;

        let transport = transport(&server, 2, 20);
        let results = futures::future::join_all(
            ["A", "B", "C", "D", "E"].into_iter().map(|name| transport.execute(named(name))),
        )
        .await;

        assert!(results.iter().all(Result::is_ok));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
        let sizes: Vec<usize> =
            requests.iter().map(|r| r.body_json::<Vec<Value>>().unwrap().len()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 5);
        assert!(sizes.iter().all(|size| *size <= 2));
    }

    #[tokio::test]
    async fn different_headers_never_share_a_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer alice"))
            .respond_with(echo)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer bob"))
            .respond_with(echo)
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server, 100, 20);
        let (alice, bob) = tokio::join!(
            transport.execute(named("A").with_header("Authorization", "Bearer alice")),
            transport.execute(named("B").with_header("Authorization", "Bearer bob")),
        );

        assert_eq!(alice.unwrap().data.unwrap()["index"], 0);
        assert_eq!(bob.unwrap().data.unwrap()["index"], 0);
    }

    #[tokio::test]
    async fn result_count_mismatch_fails_every_operation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "data": {} }])))
            .mount(&server)
            .await;

        let transport = transport(&server, 100, 20);
        let (a, b) = tokio::join!(transport.execute(named("A")), transport.execute(named("B")));

        assert!(matches!(a, Err(GqlinkError::Protocol(_))));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn http_failure_fails_every_operation_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server, 100, 20);
        let (a, b) = tokio::join!(transport.execute(named("A")), transport.execute(named("B")));

        assert_eq!(a, Err(GqlinkError::Status { status: 502, body: "upstream down".into() }));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn non_array_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errors": [] })))
            .mount(&server)
            .await;

        let transport = transport(&server, 100, 1);
        let result = transport.execute(named("A")).await;

        assert!(matches!(result, Err(GqlinkError::Protocol(message)) if message.contains("object")));
    }

    #[tokio::test]
    async fn graphql_errors_are_delivered_per_operation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "data": { "ok": true } },
                { "data": null, "errors": [{ "message": "nope" }] }
            ])))
            .mount(&server)
            .await;

        let transport = transport(&server, 100, 20);
        let (a, b) = tokio::join!(transport.execute(named("A")), transport.execute(named("B")));

        assert!(a.unwrap().is_ok());
        let b = b.unwrap();
        assert_eq!(b.errors[0].message, "nope");
    }
}
