//! JSON and URL-encoded body parsing.
//!
//! Bodies with a JSON or form content type are read in full, bounded by the
//! configured limit, and parsed before any router sees the request. The parsed
//! value is attached as a [`ParsedBody`] extension and the raw bytes are put
//! back so handlers may still use axum's own extractors.
//!
//! # Design Decisions
//! - Declared `Content-Length` above the limit is rejected before reading
//! - JSON is strict: the top-level value must be an object or an array
//! - An empty body parses to `{}`
//! - Other content types pass through untouched

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use futures_util::StreamExt;
use serde_json::{Map, Value};

use crate::http::error::AppError;

/// Parsed request body, available to handlers through `Extension<ParsedBody>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_bytes: usize,
}

impl BodyLimits {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
}

pub async fn body_parser(
    State(limits): State<BodyLimits>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(kind) = body_kind(req.headers())? else {
        return Ok(next.run(req).await);
    };

    if declared_length(req.headers()).is_some_and(|len| len > limits.max_bytes) {
        return Err(AppError::PayloadTooLarge { limit: limits.max_bytes });
    }

    let (mut parts, body) = req.into_parts();
    let bytes = read_limited(body, limits.max_bytes).await?;

    let value = match kind {
        BodyKind::Json => parse_json(&bytes)?,
        BodyKind::UrlEncoded => parse_urlencoded(&bytes),
    };
    parts.extensions.insert(ParsedBody(value));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Classify the content type; unsupported charsets are an error.
fn body_kind(headers: &HeaderMap) -> Result<Option<BodyKind>, AppError> {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };

    let mut params = content_type.split(';');
    let essence = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    let kind = match essence.as_str() {
        "application/json" => BodyKind::Json,
        "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
        _ => return Ok(None),
    };

    let charset = params.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
    });
    match charset.as_deref() {
        None | Some("utf-8") | Some("utf8") => Ok(Some(kind)),
        Some(other) => Err(AppError::UnsupportedCharset(other.to_ascii_uppercase())),
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

async fn read_limited(body: Body, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::MalformedBody(format!("request aborted: {e}")))?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn parse_json(bytes: &[u8]) -> Result<Value, AppError> {
    let Some(first) = bytes.iter().find(|b| !b.is_ascii_whitespace()) else {
        return Ok(Value::Object(Map::new()));
    };
    if *first != b'{' && *first != b'[' {
        return Err(AppError::MalformedBody(format!(
            "Unexpected token {:?}: JSON body must be an object or an array",
            char::from(*first)
        )));
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::MalformedBody(format!("Invalid JSON body: {e}")))
}

/// Repeated keys collect into an array, in order of appearance.
fn parse_urlencoded(bytes: &[u8]) -> Value {
    let mut fields = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match fields.get_mut(&*key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        map
    }

    #[test]
    fn classifies_content_types() {
        assert_eq!(body_kind(&headers("application/json")).unwrap(), Some(BodyKind::Json));
        assert_eq!(
            body_kind(&headers("Application/JSON; charset=UTF-8")).unwrap(),
            Some(BodyKind::Json)
        );
        assert_eq!(
            body_kind(&headers("application/x-www-form-urlencoded")).unwrap(),
            Some(BodyKind::UrlEncoded)
        );
        assert_eq!(body_kind(&headers("text/plain")).unwrap(), None);
        assert_eq!(body_kind(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn rejects_foreign_charset() {
        let err = body_kind(&headers("application/json; charset=latin1")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedCharset(ref c) if c == "LATIN1"));
    }

    #[test]
    fn json_must_be_object_or_array() {
        assert_eq!(parse_json(b" {\"a\":1}").unwrap(), json!({"a": 1}));
        assert_eq!(parse_json(b"[1,2]").unwrap(), json!([1, 2]));
        assert_eq!(parse_json(b"  ").unwrap(), json!({}));
        assert!(parse_json(b"\"text\"").is_err());
        assert!(parse_json(b"{\"a\":").is_err());
    }

    #[test]
    fn urlencoded_collects_repeated_keys() {
        let value = parse_urlencoded(b"tag=drept&tag=civil&tag=penal&q=contract+de+vanzare");
        assert_eq!(
            value,
            json!({"tag": ["drept", "civil", "penal"], "q": "contract de vanzare"})
        );
    }

    #[tokio::test]
    async fn stops_reading_past_the_limit() {
        let err = read_limited(Body::from(vec![b'a'; 64]), 16).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { limit: 16 }));

        let bytes = read_limited(Body::from("small"), 16).await.unwrap();
        assert_eq!(bytes, b"small");
    }
}
