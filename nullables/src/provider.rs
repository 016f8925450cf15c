//! Scripted fake of both provider groups.
//!
//! Replies are queued per [`CheckKind`]. The encrypt phase pops the next
//! reply and hides it behind an opaque blob; verify and decrypt then play it
//! back, echoing the caller's transaction id the way the real provider does.
//! An unscripted check is rejected with a provider error.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bgv_protocol::{ProviderGroup, Transport, TransportError, TransportResponse};
use bgv_types::CheckKind;
use serde_json::{json, Value};

/// One scripted provider answer.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Decrypt returns this status and `msg` payload.
    Decrypt { status: i64, msg: Value },
    /// Verify answers with this HTTP status and no `responseData`.
    HttpError(u16),
    /// The encrypt call cannot connect.
    Unreachable,
}

impl Reply {
    /// Status 1 with `result` as the payload.
    pub fn success(result: Value) -> Self {
        Self::Decrypt {
            status: 1,
            msg: result,
        }
    }

    /// A failure status with a plain-text message.
    pub fn status(status: i64, message: &str) -> Self {
        Self::Decrypt {
            status,
            msg: json!(message),
        }
    }

    /// A resolved company, spelled the way the employment provider spells it.
    pub fn company(establishment_id: &str, name: &str, secret: &str) -> Self {
        Self::success(json!([{
            "Establishment ID": establishment_id,
            "Establishment Name": name,
            "Secret Token": secret,
            "TS Transaction ID": format!("ts-{secret}"),
        }]))
    }

    /// A confirmed employee.
    pub fn employee(name: &str, establishment: &str) -> Self {
        Self::success(json!({
            "employee_name": name,
            "establishment_name": establishment,
            "member_id": "MH/BAN/0001",
            "doj": "01-01-2020",
            "date_of_exit": "NA",
        }))
    }

    /// Registry segments, each `(establishment, joined, exit)`.
    pub fn registry(segments: &[(&str, &str, &str)]) -> Self {
        let rows: Vec<Value> = segments
            .iter()
            .map(|(name, joined, exit)| {
                json!({
                    "EstablishmentName": name,
                    "Doj": joined,
                    "DateOfExitEpf": exit,
                    "Overlapping": "N",
                })
            })
            .collect();
        Self::success(Value::Array(rows))
    }

    /// Status 9: nothing on record.
    pub fn no_record() -> Self {
        Self::status(9, "No record found")
    }

    /// The employee provider's invalidated-token sentinel.
    pub fn token_expired() -> Self {
        Self::status(2, "Token expired, please re-authenticate")
    }

    /// A provider-side outage that should be retried.
    pub fn source_down() -> Self {
        Self::status(3, "Source not responding")
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<CheckKind, VecDeque<Reply>>,
    fallback: HashMap<CheckKind, Reply>,
    in_transit: HashMap<String, (String, Reply)>,
    requests: HashMap<CheckKind, Vec<Value>>,
    next_blob: u64,
}

/// Scripted fake provider implementing [`Transport`].
#[derive(Default)]
pub struct NullProvider {
    state: Mutex<State>,
    latency: Option<Duration>,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every decrypt call by `latency` (tokio time).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue `reply` for the next `kind` check.
    pub fn script(&self, kind: CheckKind, reply: Reply) -> &Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .entry(kind)
            .or_default()
            .push_back(reply);
        self
    }

    /// Answer every `kind` check with `reply` once the queue is empty.
    pub fn always(&self, kind: CheckKind, reply: Reply) -> &Self {
        self.state.lock().unwrap().fallback.insert(kind, reply);
        self
    }

    /// Number of `kind` checks started (encrypt calls).
    pub fn calls(&self, kind: CheckKind) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Encrypt request bodies received for `kind`, oldest first.
    pub fn requests(&self, kind: CheckKind) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .requests
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Scripted replies not yet consumed for `kind`.
    pub fn remaining(&self, kind: CheckKind) -> usize {
        self.state
            .lock()
            .unwrap()
            .scripts
            .get(&kind)
            .map_or(0, VecDeque::len)
    }

    fn encrypt(&self, body: &Value) -> Result<TransportResponse, TransportError> {
        let doc_type = body["docType"].as_str().unwrap_or_default();
        let kind = CheckKind::ALL
            .into_iter()
            .find(|k| k.document_type() == doc_type);
        let Some(kind) = kind else {
            return Ok(TransportResponse {
                status: 400,
                body: Some(json!({"error": format!("unknown docType {doc_type:?}")})),
            });
        };
        let txn = body["transID"].as_str().unwrap_or_default().to_string();

        let mut state = self.state.lock().unwrap();
        state.requests.entry(kind).or_default().push(body.clone());
        let reply = state
            .scripts
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .or_else(|| state.fallback.get(&kind).cloned())
            .unwrap_or_else(|| Reply::status(0, "no scripted reply"));

        if reply == Reply::Unreachable {
            return Err(TransportError::Connect(format!("{kind} provider unreachable")));
        }
        state.next_blob += 1;
        let blob = format!("blob-{}", state.next_blob);
        state.in_transit.insert(blob.clone(), (txn, reply));
        Ok(TransportResponse::ok(json!({ "requestData": blob })))
    }

    fn verify(&self, body: &Value) -> TransportResponse {
        let blob = body["requestData"].as_str().unwrap_or_default();
        let state = self.state.lock().unwrap();
        match state.in_transit.get(blob) {
            Some((_, Reply::HttpError(status))) => TransportResponse {
                status: *status,
                body: Some(json!({"error": "upstream failure"})),
            },
            Some(_) => TransportResponse::ok(json!({ "responseData": blob })),
            None => TransportResponse {
                status: 400,
                body: Some(json!({"error": "unknown requestData"})),
            },
        }
    }

    fn decrypt(&self, body: &Value) -> TransportResponse {
        let blob = body["responseData"].as_str().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        match state.in_transit.remove(blob) {
            Some((txn, Reply::Decrypt { status, msg })) => TransportResponse::ok(json!({
                "status": status,
                "transId": txn,
                "msg": msg,
            })),
            _ => TransportResponse {
                status: 400,
                body: Some(json!({"error": "unknown responseData"})),
            },
        }
    }
}

#[async_trait]
impl Transport for NullProvider {
    async fn post(
        &self,
        _group: ProviderGroup,
        path: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        if path.ends_with("encrypt") && !path.ends_with("decrypt") {
            self.encrypt(body)
        } else if path.ends_with("verify") {
            Ok(self.verify(body))
        } else {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            Ok(self.decrypt(body))
        }
    }
}
