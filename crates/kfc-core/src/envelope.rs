//! Envelope validation and record extraction.
//!
//! Providers signal failure inside a `200 OK` body and put their record list
//! under differently named keys. This module checks embedded status codes and
//! probes candidate keys for the record array.

use serde_json::Value;
use tracing::debug;

use crate::coercion::RawRecord;
use crate::{KfcError, ProviderId};

/// Record-array keys seen across providers, in probe order.
pub const RECORD_KEYS: &[&str] = &["output", "block1", "OutBlock_1", "list"];

/// Outcome of probing one candidate key.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Found(Vec<RawRecord>),
    NotFound,
}

/// OPENDART success codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDartStatus {
    /// `000`, or no status field at all.
    Success,
    /// `013`: the query is valid but there is nothing to return.
    NoData,
}

pub fn decode_json(provider: ProviderId, body: &[u8]) -> Result<Value, KfcError> {
    serde_json::from_slice(body)
        .map_err(|error| KfcError::decode_with(provider, "response body is not valid JSON", error))
}

/// Probes `key` on a decoded top-level object.
pub fn probe(provider: ProviderId, body: &Value, key: &str) -> Result<Probe, KfcError> {
    let Some(value) = top_level(provider, body)?.get(key) else {
        return Ok(Probe::NotFound);
    };
    let Value::Array(items) = value else {
        return Err(KfcError::decode(
            provider,
            format!("'{key}' is not an array"),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record.clone()),
            _ => Err(KfcError::decode(
                provider,
                format!("'{key}'[{index}] is not an object"),
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Probe::Found)
}

/// Returns the records under the first candidate key that is present.
/// No candidate present yields an empty list.
pub fn extract_records(
    provider: ProviderId,
    body: &Value,
    candidates: &[&str],
) -> Result<Vec<RawRecord>, KfcError> {
    for key in candidates {
        if let Probe::Found(records) = probe(provider, body, key)? {
            debug!(provider = %provider, key, count = records.len(), "extracted records");
            return Ok(records);
        }
    }
    debug!(provider = %provider, ?candidates, "no record key present, treating as empty");
    Ok(Vec::new())
}

/// Checks the OPENDART `status` / `message` pair.
pub fn check_opendart_status(body: &Value) -> Result<OpenDartStatus, KfcError> {
    let object = top_level(ProviderId::OpenDart, body)?;
    let Some(status) = object.get("status").and_then(scalar_text) else {
        return Ok(OpenDartStatus::Success);
    };
    match status.as_str() {
        "000" => Ok(OpenDartStatus::Success),
        "013" => Ok(OpenDartStatus::NoData),
        _ => {
            let message = object
                .get("message")
                .and_then(scalar_text)
                .unwrap_or_default();
            Err(KfcError::provider_reported(
                ProviderId::OpenDart,
                status,
                message,
            ))
        }
    }
}

/// Checks the KRX `result.status` error marker.
pub fn check_krx_result(body: &Value) -> Result<(), KfcError> {
    let Some(result) = top_level(ProviderId::Krx, body)?
        .get("result")
        .and_then(Value::as_object)
    else {
        return Ok(());
    };
    let is_error = result
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status.eq_ignore_ascii_case("error"));
    if !is_error {
        return Ok(());
    }

    let code = result
        .get("error_code")
        .and_then(scalar_text)
        .unwrap_or_else(|| String::from("unknown"));
    let message = result
        .get("error_message")
        .and_then(scalar_text)
        .unwrap_or_default();
    Err(KfcError::provider_reported(ProviderId::Krx, code, message))
}

fn top_level(provider: ProviderId, body: &Value) -> Result<&serde_json::Map<String, Value>, KfcError> {
    body.as_object()
        .ok_or_else(|| KfcError::decode(provider, "top-level response is not a JSON object"))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn first_present_candidate_wins() {
        let body = json!({
            "block1": [{"a": "1"}],
            "output": [{"b": "2"}, {"b": "3"}]
        });

        let records = extract_records(ProviderId::Krx, &body, RECORD_KEYS).expect("records");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("b"), Some(&json!("2")));
    }

    #[test]
    fn missing_every_candidate_is_empty_success() {
        let body = json!({"CURRENT_DATETIME": "2024.01.02 PM 04:00:00"});

        let records = extract_records(ProviderId::Krx, &body, &["output"]).expect("empty");

        assert!(records.is_empty());
    }

    #[test]
    fn present_key_with_wrong_shape_is_a_decode_failure() {
        let not_array = json!({"output": {"a": "1"}});
        let not_objects = json!({"output": ["a", "b"]});

        let first = extract_records(ProviderId::Krx, &not_array, &["output"]).expect_err("object");
        let second =
            extract_records(ProviderId::Krx, &not_objects, &["output"]).expect_err("strings");

        assert_eq!(first.kind(), ErrorKind::DecodeFailure);
        assert!(second.to_string().contains("'output'[0]"));
    }

    #[test]
    fn probe_distinguishes_empty_array_from_absence() {
        let body = json!({"list": []});

        assert_eq!(
            probe(ProviderId::OpenDart, &body, "list").expect("lookup succeeds"),
            Probe::Found(Vec::new())
        );
        assert_eq!(
            probe(ProviderId::OpenDart, &body, "output").expect("lookup succeeds"),
            Probe::NotFound
        );
    }

    #[test]
    fn opendart_status_codes() {
        assert_eq!(
            check_opendart_status(&json!({"status": "000", "message": "정상"})).expect("ok"),
            OpenDartStatus::Success
        );
        assert_eq!(
            check_opendart_status(&json!({"status": "013", "message": "조회된 데이타가 없습니다."}))
                .expect("no data"),
            OpenDartStatus::NoData
        );
        assert_eq!(
            check_opendart_status(&json!({"list": []})).expect("absent"),
            OpenDartStatus::Success
        );

        let error = check_opendart_status(&json!({"status": "020", "message": "요청 제한을 초과하였습니다."}))
            .expect_err("limit");
        assert!(matches!(
            error,
            KfcError::ProviderReportedError { ref code, .. } if code == "020"
        ));
    }

    #[test]
    fn krx_embedded_error_is_reported() {
        let body = json!({
            "result": {"status": "ERROR", "error_code": "LOGOUT", "error_message": "session expired"}
        });

        let error = check_krx_result(&body).expect_err("embedded error");

        assert_eq!(error.code(), 3001);
        assert_eq!(error.to_string(), "krx reported error LOGOUT: session expired");
        assert!(check_krx_result(&json!({"output": []})).is_ok());
        assert!(check_krx_result(&json!({"result": {"status": "ok"}})).is_ok());
    }

    #[test]
    fn non_object_body_is_a_decode_failure() {
        let error = check_opendart_status(&json!([1, 2])).expect_err("array body");
        assert_eq!(error.kind(), ErrorKind::DecodeFailure);

        let error = decode_json(ProviderId::Krx, b"<html>").expect_err("html body");
        assert_eq!(error.code(), 2001);
    }
}
