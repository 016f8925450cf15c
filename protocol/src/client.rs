//! The three-phase protocol client.

use bgv_types::{
    CheckKind, CompanyMatchToken, EmployeeRecord, RegistryIdentifier, RegistryResult,
    TransactionId, ValidationError,
};
use serde_json::{json, Map, Value};

use crate::endpoint::{self, Phase, ProviderGroup};
use crate::normalizer::{self, fold_key};
use crate::{NormalizeError, ProtocolError, Transport, TransportResponse};

/// Decrypt status: match found.
pub const STATUS_SUCCESS: i64 = 1;
/// Decrypt status: no record for the supplied identifier. Not an error.
pub const STATUS_NO_RECORD: i64 = 9;

/// Phrases the employee provider uses when the company token was invalidated.
const TOKEN_EXPIRED_MARKERS: &[&str] = &[
    "token expired",
    "token has expired",
    "token is expired",
    "invalid token",
    "token invalid",
    "token is invalid",
    "re-authenticate",
    "reauthenticate",
];

/// Failure messages that mean "try again later" rather than "no".
const TRANSIENT_MARKERS: &[&str] = &[
    "source not responding",
    "source unavailable",
    "service unavailable",
    "temporarily unavailable",
    "timed out",
    "timeout",
    "try again later",
];

const NOT_FOUND_MARKERS: &[&str] = &[
    "not found",
    "no record",
    "no match",
    "no employee",
    "does not exist",
];

/// Decrypt keys that carry the result payload (or, on failure, a message).
const RESULT_KEYS: &[&str] = &["msg", "result", "data"];

/// Plaintext input of one check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckPayload {
    Company { company_name: String },
    Employee {
        employee_name: String,
        token: CompanyMatchToken,
    },
    Registry(RegistryIdentifier),
}

/// Canonical result of a completed check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedResult {
    Company(CompanyMatchToken),
    Employee(EmployeeRecord),
    Registry(RegistryResult),
}

/// Decrypt response after envelope parsing, before interpretation.
#[derive(Debug)]
struct Decrypted {
    status: i64,
    result: Option<Value>,
    message: Option<String>,
}

/// Runs encrypt → verify → decrypt against a [`Transport`].
pub struct ProtocolClient<T> {
    transport: T,
}

impl<T: Transport> ProtocolClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform one complete check.
    ///
    /// Input is validated before the first network call. Every failure is
    /// returned classified; nothing is swallowed.
    pub async fn call(
        &self,
        kind: CheckKind,
        payload: &CheckPayload,
    ) -> Result<NormalizedResult, ProtocolError> {
        let fields = request_fields(kind, payload)?;
        let txn = TransactionId::generate();
        tracing::debug!(%kind, txn = %txn, "starting provider check");

        let request_data = self.encrypt(kind, &txn, fields).await?;
        let response_data = self.verify(kind, &request_data).await?;
        let decrypted = self.decrypt(kind, &response_data, &txn).await?;
        interpret(kind, decrypted)
    }

    /// Resolve a free-form employer name to an establishment token.
    pub async fn resolve_company(
        &self,
        company_name: &str,
    ) -> Result<CompanyMatchToken, ProtocolError> {
        let payload = CheckPayload::Company {
            company_name: company_name.to_string(),
        };
        match self.call(CheckKind::Company, &payload).await? {
            NormalizedResult::Company(token) => Ok(token),
            _ => Err(ProtocolError::PayloadMismatch(CheckKind::Company)),
        }
    }

    /// Confirm `employee_name` works at the establishment behind `token`.
    pub async fn confirm_employee(
        &self,
        employee_name: &str,
        token: &CompanyMatchToken,
    ) -> Result<EmployeeRecord, ProtocolError> {
        let payload = CheckPayload::Employee {
            employee_name: employee_name.to_string(),
            token: token.clone(),
        };
        match self.call(CheckKind::Employee, &payload).await? {
            NormalizedResult::Employee(record) => Ok(record),
            _ => Err(ProtocolError::PayloadMismatch(CheckKind::Employee)),
        }
    }

    async fn post(
        &self,
        kind: CheckKind,
        phase: Phase,
        body: &Value,
    ) -> Result<TransportResponse, ProtocolError> {
        let path = endpoint::path(kind, phase);
        self.transport
            .post(ProviderGroup::for_kind(kind), &path, body)
            .await
            .map_err(|source| ProtocolError::Transport {
                kind,
                phase,
                source,
            })
    }

    async fn encrypt(
        &self,
        kind: CheckKind,
        txn: &TransactionId,
        fields: Map<String, Value>,
    ) -> Result<String, ProtocolError> {
        let mut body = Map::new();
        body.insert("transID".into(), json!(txn.as_str()));
        body.insert("docType".into(), json!(kind.document_type()));
        body.extend(fields);

        let response = self.post(kind, Phase::Encrypt, &Value::Object(body)).await?;
        if let Some(err) = response.string_field("error") {
            return Err(ProtocolError::Encryption {
                kind,
                reason: err.to_string(),
            });
        }
        response
            .string_field("requestData")
            .map(str::to_string)
            .ok_or_else(|| ProtocolError::Encryption {
                kind,
                reason: format!("no requestData in response (HTTP {})", response.status),
            })
    }

    async fn verify(&self, kind: CheckKind, request_data: &str) -> Result<String, ProtocolError> {
        let response = self
            .post(kind, Phase::Verify, &json!({ "requestData": request_data }))
            .await?;

        // Business failures arrive as HTTP errors that still carry a
        // responseData blob; those must be decrypted, not treated as outages.
        match response.string_field("responseData") {
            Some(data) => {
                if !response.is_success() {
                    tracing::debug!(%kind, status = response.status, "decrypting error-status response");
                }
                Ok(data.to_string())
            }
            None if response.is_success() => Err(ProtocolError::ProviderUnavailable {
                kind,
                message: "verify returned no responseData".to_string(),
            }),
            None => Err(ProtocolError::ProviderUnavailable {
                kind,
                message: format!("verify failed with HTTP {}", response.status),
            }),
        }
    }

    async fn decrypt(
        &self,
        kind: CheckKind,
        response_data: &str,
        txn: &TransactionId,
    ) -> Result<Decrypted, ProtocolError> {
        let response = self
            .post(kind, Phase::Decrypt, &json!({ "responseData": response_data }))
            .await?;
        let body = response.body.ok_or_else(|| ProtocolError::Decryption {
            kind,
            reason: format!("empty decrypt response (HTTP {})", response.status),
        })?;
        parse_decrypted(kind, &body, txn)
    }
}

/// Kind-specific plaintext fields, validated.
fn request_fields(
    kind: CheckKind,
    payload: &CheckPayload,
) -> Result<Map<String, Value>, ProtocolError> {
    let mut fields = Map::new();
    match (kind, payload) {
        (CheckKind::Company, CheckPayload::Company { company_name }) => {
            let name = non_empty(company_name, "company name")?;
            fields.insert("companyName".into(), json!(name));
        }
        (
            CheckKind::Employee,
            CheckPayload::Employee {
                employee_name,
                token,
            },
        ) => {
            let name = non_empty(employee_name, "employee name")?;
            fields.insert("employeeName".into(), json!(name));
            fields.insert("establishmentId".into(), json!(token.establishment_id));
            fields.insert("establishmentName".into(), json!(token.company_name));
            fields.insert("secretToken".into(), json!(token.secret_token));
            fields.insert("tsTransID".into(), json!(token.transaction_id));
        }
        (CheckKind::RegistryFull, CheckPayload::Registry(id @ RegistryIdentifier::Uan(_)))
        | (
            CheckKind::RegistryBasic,
            CheckPayload::Registry(id @ (RegistryIdentifier::Mobile(_) | RegistryIdentifier::Pan(_))),
        ) => {
            id.validate()?;
            fields.insert(id.field_name().into(), json!(id.value()));
        }
        _ => return Err(ProtocolError::PayloadMismatch(kind)),
    }
    Ok(fields)
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(trimmed)
    }
}

fn parse_decrypted(
    kind: CheckKind,
    body: &Value,
    txn: &TransactionId,
) -> Result<Decrypted, ProtocolError> {
    let decryption = |reason: String| ProtocolError::Decryption { kind, reason };
    let obj = body
        .as_object()
        .ok_or_else(|| decryption("decrypt response is not an object".to_string()))?;
    let field = |names: &[&str]| {
        obj.iter()
            .find(|(k, v)| !v.is_null() && names.contains(&fold_key(k).as_str()))
            .map(|(_, v)| v)
    };

    let status = field(&["status", "statuscode"])
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .ok_or_else(|| decryption("missing status".to_string()))?;

    let echoed = field(&["transid", "transactionid"])
        .and_then(Value::as_str)
        .ok_or_else(|| decryption("missing transaction id".to_string()))?;
    if echoed != txn.as_str() {
        return Err(decryption(format!(
            "transaction id mismatch: sent {txn}, got {echoed}"
        )));
    }

    // `msg`, `result` and `data` may each carry the payload or a plain
    // message, and a response can carry both side by side.
    let mut result = None;
    let mut message = field(&["message", "error", "errormessage"])
        .and_then(Value::as_str)
        .map(str::to_string);
    let carriers = obj
        .iter()
        .filter(|(k, _)| RESULT_KEYS.contains(&fold_key(k).as_str()))
        .map(|(_, v)| v);
    for value in carriers {
        match value {
            Value::Object(_) | Value::Array(_) => {
                result.get_or_insert_with(|| value.clone());
            }
            Value::String(s) => {
                message.get_or_insert_with(|| s.clone());
            }
            _ => {}
        }
    }

    if status == STATUS_SUCCESS && result.is_none() && !mentions_token_expiry(kind, &message) {
        return Err(decryption("missing result payload".to_string()));
    }
    Ok(Decrypted {
        status,
        result,
        message,
    })
}

fn mentions_token_expiry(kind: CheckKind, message: &Option<String>) -> bool {
    kind == CheckKind::Employee
        && message
            .as_deref()
            .is_some_and(|m| contains_any(m, TOKEN_EXPIRED_MARKERS))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_ascii_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

fn interpret(kind: CheckKind, decrypted: Decrypted) -> Result<NormalizedResult, ProtocolError> {
    if mentions_token_expiry(kind, &decrypted.message) {
        tracing::debug!(%kind, "provider reported an invalidated company token");
        return Err(ProtocolError::TokenExpired);
    }

    let malformed = |e: NormalizeError| ProtocolError::Decryption {
        kind,
        reason: e.to_string(),
    };

    match decrypted.status {
        STATUS_SUCCESS => {
            let result = decrypted.result.unwrap_or(Value::Null);
            match kind {
                CheckKind::Company => normalizer::normalize_company(&result)
                    .map(NormalizedResult::Company)
                    .map_err(malformed),
                CheckKind::Employee => normalizer::normalize_employee(&result)
                    .map(NormalizedResult::Employee)
                    .map_err(malformed),
                CheckKind::RegistryBasic | CheckKind::RegistryFull => {
                    let mut segments = normalizer::normalize_registry(&result).map_err(malformed)?;
                    if kind == CheckKind::RegistryBasic {
                        segments.truncate(1);
                    }
                    Ok(NormalizedResult::Registry(if segments.is_empty() {
                        RegistryResult::NoRecord
                    } else {
                        RegistryResult::Records(segments)
                    }))
                }
            }
        }
        STATUS_NO_RECORD if kind.is_registry() => {
            Ok(NormalizedResult::Registry(RegistryResult::NoRecord))
        }
        STATUS_NO_RECORD => Err(ProtocolError::NotFound {
            kind,
            message: decrypted
                .message
                .unwrap_or_else(|| "no record found".to_string()),
        }),
        status => {
            let message = decrypted
                .message
                .unwrap_or_else(|| format!("provider returned status {status}"));
            if contains_any(&message, TRANSIENT_MARKERS) {
                Err(ProtocolError::ProviderUnavailable { kind, message })
            } else if contains_any(&message, NOT_FOUND_MARKERS) {
                Err(ProtocolError::NotFound { kind, message })
            } else {
                Err(ProtocolError::Rejected {
                    kind,
                    status,
                    message,
                })
            }
        }
    }
}
