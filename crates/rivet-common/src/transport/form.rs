//! URL-encoded form binding.
//!
//! Form values are collected from the request body (when it is
//! `application/x-www-form-urlencoded`) followed by the URL query. Generated
//! code binds each scalar field from the key of the same name through
//! [`FormValues::bind`] and [`FormValues::bind_repeated`]; message and bytes
//! fields are not form-bindable and keep their defaults.

use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::Request;
use std::collections::BTreeMap;
use url::form_urlencoded;

use crate::protocol::error::RpcError;
use crate::transport::codec::FORM_CONTENT_TYPE;

/// Multi-valued form data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the body (if it is form-encoded) and then the query string.
    pub fn from_request(req: &Request<Bytes>) -> Self {
        let is_form_body = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
            .unwrap_or(false);

        let mut form = FormValues::new();
        if is_form_body {
            form.extend_from(req.body());
        }
        if let Some(query) = req.uri().query() {
            form.extend_from(query.as_bytes());
        }
        form
    }

    pub fn parse(input: &str) -> Self {
        let mut form = FormValues::new();
        form.extend_from(input.as_bytes());
        form
    }

    fn extend_from(&mut self, encoded: &[u8]) {
        for (key, value) in form_urlencoded::parse(encoded) {
            self.append(key.into_owned(), value.into_owned());
        }
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn all(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Values for a repeated field.
    ///
    /// A key given once is split on commas; a key given several times is
    /// taken as-is.
    pub fn repeated(&self, key: &str) -> Option<Vec<&str>> {
        let values = self.values.get(key)?;
        Some(match values.as_slice() {
            [single] => single.split(',').collect(),
            many => many.iter().map(String::as_str).collect(),
        })
    }

    /// Binds a singular scalar field if its key is present.
    pub fn bind<T: FormScalar>(&self, field: &str, target: &mut T) -> Result<(), RpcError> {
        if let Some(raw) = self.first(field) {
            *target = T::parse_form(raw).map_err(|reason| RpcError::invalid_argument(field, reason))?;
        }
        Ok(())
    }

    /// Binds a repeated scalar field if its key is present.
    pub fn bind_repeated<T: FormScalar>(&self, field: &str, target: &mut Vec<T>) -> Result<(), RpcError> {
        if let Some(raws) = self.repeated(field) {
            *target = raws
                .into_iter()
                .map(|raw| T::parse_form(raw).map_err(|reason| RpcError::invalid_argument(field, reason)))
                .collect::<Result<Vec<T>, RpcError>>()?;
        }
        Ok(())
    }

    /// Re-encodes the values, skipping `redacted` keys.
    pub fn encode_without(&self, redacted: &[String]) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.values {
            if redacted.iter().any(|r| r == key) {
                continue;
            }
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// A scalar that can be parsed from a single form value.
pub trait FormScalar: Sized {
    fn parse_form(raw: &str) -> Result<Self, String>;
}

impl FormScalar for String {
    fn parse_form(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

macro_rules! impl_form_scalar_from_str {
    ($($ty:ty),*) => {
        $(
            impl FormScalar for $ty {
                fn parse_form(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>()
                        .map_err(|e| format!("parsing {:?}: {}", raw, e))
                }
            }
        )*
    };
}

impl_form_scalar_from_str!(i32, i64, u32, u64, f32, f64);

impl FormScalar for bool {
    fn parse_form(raw: &str) -> Result<Self, String> {
        parse_bool(raw)
    }
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("parsing {:?}: invalid boolean", raw)),
    }
}

/// Records that can be bound from form values.
pub trait FromForm: Sized {
    fn from_form(form: &FormValues) -> Result<Self, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorCode;

    fn form_request(uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test]
    fn test_body_and_query_are_merged() {
        let req = form_request("/svc/M?page=2&name=query", "name=body&tag=a");
        let form = FormValues::from_request(&req);
        assert_eq!(form.first("name"), Some("body"));
        assert_eq!(form.all("name").unwrap().len(), 2);
        assert_eq!(form.first("page"), Some("2"));
        assert_eq!(form.first("tag"), Some("a"));
    }

    #[test]
    fn test_non_form_body_is_ignored() {
        let req = Request::builder()
            .uri("/svc/M?page=2")
            .header("content-type", "text/plain")
            .body(Bytes::from_static(b"name=body"))
            .unwrap();
        let form = FormValues::from_request(&req);
        assert_eq!(form.first("name"), None);
        assert_eq!(form.first("page"), Some("2"));
    }

    #[test]
    fn test_repeated_single_value_splits_on_commas() {
        let form = FormValues::parse("ids=1,2,3");
        let mut ids: Vec<i64> = Vec::new();
        form.bind_repeated("ids", &mut ids).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_repeated_multiple_values_are_not_split() {
        let form = FormValues::parse("tags=a,b&tags=c");
        let mut tags: Vec<String> = Vec::new();
        form.bind_repeated("tags", &mut tags).unwrap();
        assert_eq!(tags, vec!["a,b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_bind_parse_failure_is_field_scoped() {
        let form = FormValues::parse("age=old");
        let mut age = 0u32;
        let err = form.bind("age", &mut age).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.meta("argument"), Some("age"));
        assert_eq!(age, 0);
    }

    #[test]
    fn test_missing_key_keeps_default() {
        let form = FormValues::parse("other=1");
        let mut name = String::from("unchanged");
        form.bind("name", &mut name).unwrap();
        assert_eq!(name, "unchanged");
    }

    #[test]
    fn test_bool_spellings() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(raw), Ok(true), "{}", raw);
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(raw), Ok(false), "{}", raw);
        }
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_encode_without_redacts_keys() {
        let form = FormValues::parse("sign=secret&page=1");
        assert_eq!(form.encode_without(&["sign".to_string()]), "page=1");
    }
}
