//! Maps provider result payloads onto canonical records.
//!
//! Providers name the same attribute several ways (`"Establishment Name"`,
//! `"establishmentName"`, `"establishment_name"`, sometimes a different word
//! entirely such as `Doj` for the joining date). Keys are folded to lower-case
//! alphanumerics before lookup, and each canonical field carries a short alias
//! list for the genuinely different labels. Keys that map to nothing are
//! dropped. Every function here is pure.

use bgv_types::{CompanyMatchToken, EmployeeRecord, EmploymentEnd, NationalRegistryRecord};
use serde_json::{Map, Value};

use crate::NormalizeError;

// Alias lists are already folded.
const ESTABLISHMENT_ID: &[&str] = &["establishmentid", "estid", "establishmentcode", "estcode"];
const ESTABLISHMENT_NAME: &[&str] = &[
    "establishmentname",
    "companyname",
    "estname",
    "employername",
    "nameofestablishment",
];
const SECRET_TOKEN: &[&str] = &["secrettoken", "secret", "token"];
const PROVIDER_TRANSACTION_ID: &[&str] = &["tstransactionid", "tstransid", "transactionid"];
const EMPLOYEE_NAME: &[&str] = &["employeename", "nameofemployee", "membername", "name"];
const MEMBER_ID: &[&str] = &["memberid", "memberno", "pfnumber"];
const JOINED: &[&str] = &["doj", "dateofjoining", "joiningdate", "dojepf"];
const EXITED: &[&str] = &["dateofexitepf", "dateofexit", "doe", "doeepf", "exitdate"];
const OVERLAPPING: &[&str] = &["overlapping", "overlap", "isoverlapping", "overlapflag"];
const SEGMENT_LISTS: &[&str] = &[
    "employmenthistory",
    "employmentdetails",
    "establishments",
    "records",
    "data",
];

/// Fold a provider key: lower-case, alphanumerics only.
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalize a company-resolution payload into a match token.
///
/// A list of candidate establishments resolves to its first element.
pub fn normalize_company(payload: &Value) -> Result<CompanyMatchToken, NormalizeError> {
    let obj = first_object(payload)?;
    Ok(CompanyMatchToken {
        establishment_id: required(obj, ESTABLISHMENT_ID, "establishment_id")?,
        company_name: required(obj, ESTABLISHMENT_NAME, "company_name")?,
        secret_token: required(obj, SECRET_TOKEN, "secret_token")?,
        transaction_id: required(obj, PROVIDER_TRANSACTION_ID, "transaction_id")?,
    })
}

/// Normalize an employee-confirmation payload.
pub fn normalize_employee(payload: &Value) -> Result<EmployeeRecord, NormalizeError> {
    let obj = first_object(payload)?;
    Ok(EmployeeRecord {
        employee_name: text_or_empty(obj, EMPLOYEE_NAME),
        establishment_name: text_or_empty(obj, ESTABLISHMENT_NAME),
        member_id: text(obj, MEMBER_ID),
        joined: text(obj, JOINED),
        exit: EmploymentEnd::from_provider(text(obj, EXITED).as_deref()),
    })
}

/// Normalize a registry payload into its ordered segments.
///
/// Accepts a bare list of segments, an object wrapping such a list, or a
/// single segment object.
pub fn normalize_registry(payload: &Value) -> Result<Vec<NationalRegistryRecord>, NormalizeError> {
    match payload {
        Value::Array(items) => items.iter().map(normalize_segment).collect(),
        Value::Object(obj) => match lookup(obj, SEGMENT_LISTS) {
            Some(Value::Array(items)) => items.iter().map(normalize_segment).collect(),
            _ => Ok(vec![normalize_segment(payload)?]),
        },
        other => Err(NormalizeError::NotAnObject(json_type(other))),
    }
}

/// Normalize one registry segment.
pub fn normalize_segment(payload: &Value) -> Result<NationalRegistryRecord, NormalizeError> {
    let obj = payload
        .as_object()
        .ok_or(NormalizeError::NotAnObject(json_type(payload)))?;
    Ok(NationalRegistryRecord {
        establishment_name: required(obj, ESTABLISHMENT_NAME, "establishment_name")?,
        member_id: text(obj, MEMBER_ID),
        joined: text(obj, JOINED),
        exit: EmploymentEnd::from_provider(text(obj, EXITED).as_deref()),
        overlapping: lookup(obj, OVERLAPPING).map(flag).unwrap_or(false),
    })
}

fn first_object(payload: &Value) -> Result<&Map<String, Value>, NormalizeError> {
    match payload {
        Value::Object(obj) => Ok(obj),
        Value::Array(items) => match items.first() {
            Some(Value::Object(obj)) => Ok(obj),
            Some(other) => Err(NormalizeError::NotAnObject(json_type(other))),
            None => Err(NormalizeError::NotAnObject("empty array")),
        },
        other => Err(NormalizeError::NotAnObject(json_type(other))),
    }
}

/// First value whose folded key matches an alias, in alias order.
fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        obj.iter()
            .find(|(key, value)| !value.is_null() && fold_key(key) == *alias)
            .map(|(_, value)| value)
    })
}

fn text(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    lookup(obj, aliases).and_then(scalar_text)
}

fn text_or_empty(obj: &Map<String, Value>, aliases: &[&str]) -> String {
    text(obj, aliases).unwrap_or_default()
}

fn required(
    obj: &Map<String, Value>,
    aliases: &[&str],
    canonical: &'static str,
) -> Result<String, NormalizeError> {
    text(obj, aliases).ok_or(NormalizeError::MissingField(canonical))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "y" | "yes" | "true" | "1"
        ),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
