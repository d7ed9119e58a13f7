use crate::error::RenderError;
use crate::record::ErrorInfo;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Named fields of a structured value, in insertion order.
pub type Fields = Vec<(String, Value)>;

/// Field names starting with this prefix are internal to the RPC runtime
/// and never rendered.
pub const INTERNAL_PREFIX: &str = "__";

/// Format used for temporal values, modeled on an en-US locale string.
pub const LOCALE_DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Upper bound on nesting for any container kind. Plain objects are
/// flattened long before this; it only trips on maps, sequences and
/// domain values that keep producing children.
pub const MAX_DEPTH: usize = 64;

/// A value attached to a log record.
///
/// Core shapes are closed variants. Anything owned by an RPC framework
/// (wide integers, enums, identities, proxies, typed exceptions) goes
/// through [`Value::Domain`] and is recognized through [`DomainValue`].
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<FixedOffset>),
    /// Ordered sequence.
    Seq(Vec<Value>),
    /// Unordered unique collection, in the source collection's iteration order.
    Set(Vec<Value>),
    /// Associative mapping with arbitrary keys.
    Map(Vec<(Value, Value)>),
    /// A generic (non-domain) error.
    Error(Box<ErrorInfo>),
    /// Plain structured object.
    Object(Fields),
    Domain(Arc<dyn DomainValue>),
}

/// Capabilities a framework-owned value can expose to the renderer.
///
/// Every method defaults to "not this kind". The renderer asks in a fixed
/// order (wide integer, exception, enum, identity, reference, type tag,
/// fields) and uses the first answer, so a value that is both an exception
/// and a structured object renders as an exception.
pub trait DomainValue: fmt::Debug + Send + Sync {
    /// Integer too wide for the host's native numbers.
    fn wide_int(&self) -> Option<i128> {
        None
    }

    /// Typed failure with a symbolic name and cause.
    fn exception(&self) -> Option<ErrorInfo> {
        None
    }

    /// Symbolic name of an enumerator.
    fn enum_name(&self) -> Option<&str> {
        None
    }

    /// Canonical string form of an identity.
    fn identity(&self) -> Option<String> {
        None
    }

    /// String form of a remote reference or opaque servant.
    fn reference(&self) -> Option<String> {
        None
    }

    /// Type tag of a structured value, rendered as `iceId`.
    fn type_tag(&self) -> Option<&str> {
        None
    }

    fn fields(&self) -> Result<Fields, RenderError> {
        Ok(Vec::new())
    }

    /// Fallback text for values exposing none of the above.
    fn describe(&self) -> Result<String, RenderError> {
        Ok(format!("{self:?}"))
    }
}

impl Value {
    pub fn domain<T: DomainValue + 'static>(value: T) -> Value {
        Value::Domain(Arc::new(value))
    }

    pub fn error(info: ErrorInfo) -> Value {
        Value::Error(Box::new(info))
    }

    pub fn object<K, V, I>(fields: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn seq<T: Into<Value>, I: IntoIterator<Item = T>>(items: I) -> Value {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Convert to plain JSON, the form used for flattened output.
    pub fn to_plain(&self) -> Result<serde_json::Value, RenderError> {
        self.to_plain_at(0)
    }

    fn to_plain_at(&self, depth: usize) -> Result<serde_json::Value, RenderError> {
        use serde_json::Value as Json;

        if depth > MAX_DEPTH {
            return Err(RenderError::TooDeep(MAX_DEPTH));
        }
        let next = depth + 1;
        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::UInt(n) => Json::from(*n),
            Value::Float(f) => Json::from(*f),
            Value::Str(s) => Json::String(s.clone()),
            Value::Timestamp(t) => Json::String(format_locale(t)),
            Value::Seq(items) | Value::Set(items) => Json::Array(
                items
                    .iter()
                    .map(|item| item.to_plain_at(next))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(entries) => {
                let mut out = serde_json::Map::new();
                for (key, value) in entries {
                    let key = match key.to_plain_at(next)? {
                        Json::String(s) => s,
                        other => other.to_string(),
                    };
                    out.insert(key, value.to_plain_at(next)?);
                }
                Json::Object(out)
            }
            Value::Error(info) => {
                let mut out = serde_json::Map::new();
                out.insert("name".into(), Json::String(info.name.clone()));
                out.insert("message".into(), Json::String(info.message.clone()));
                if let Some(stack) = &info.stack {
                    out.insert("stack".into(), Json::String(stack.clone()));
                }
                Json::Object(out)
            }
            Value::Object(fields) => plain_fields(fields.iter().map(|(k, v)| (k.as_str(), v)), next)?,
            Value::Domain(d) => plain_domain(d.as_ref(), next)?,
        })
    }
}

pub(crate) fn plain_fields<'v, I>(fields: I, depth: usize) -> Result<serde_json::Value, RenderError>
where
    I: IntoIterator<Item = (&'v str, &'v Value)>,
{
    let mut out = serde_json::Map::new();
    for (key, value) in fields {
        out.insert(key.to_string(), value.to_plain_at(depth)?);
    }
    Ok(serde_json::Value::Object(out))
}

fn plain_domain(value: &dyn DomainValue, depth: usize) -> Result<serde_json::Value, RenderError> {
    use serde_json::Value as Json;

    if let Some(n) = value.wide_int() {
        return Ok(i64::try_from(n)
            .map(Json::from)
            .unwrap_or_else(|_| Json::String(n.to_string())));
    }
    if let Some(info) = value.exception() {
        let mut out = serde_json::Map::new();
        if let Some(stack) = &info.stack {
            out.insert("stack".into(), Json::String(stack.clone()));
        }
        if let Some(cause_name) = &info.cause_name {
            out.insert("causeName".into(), Json::String(cause_name.clone()));
        }
        if let Some(detail) = &info.cause_detail {
            out.insert("causeDetail".into(), Json::String(detail.clone()));
        }
        out.insert("message".into(), Json::String(info.message.clone()));
        for (key, field) in &info.fields {
            out.insert(key.clone(), field.to_plain_at(depth)?);
        }
        return Ok(Json::Object(out));
    }
    if let Some(name) = value.enum_name() {
        return Ok(Json::String(name.to_string()));
    }
    if let Some(identity) = value.identity() {
        return Ok(Json::String(identity));
    }
    if let Some(reference) = value.reference() {
        return Ok(Json::String(reference));
    }
    let fields = value.fields()?;
    if let Some(tag) = value.type_tag() {
        let mut out = serde_json::Map::new();
        out.insert("iceId".into(), Json::String(tag.to_string()));
        for (key, field) in fields.iter().filter(|(k, _)| !k.starts_with(INTERNAL_PREFIX)) {
            out.insert(key.clone(), field.to_plain_at(depth)?);
        }
        return Ok(Json::Object(out));
    }
    if fields.is_empty() {
        return Ok(Json::String(value.describe()?));
    }
    plain_fields(fields.iter().map(|(k, v)| (k.as_str(), v)), depth)
}

/// Render a timestamp the way a console user expects to read it.
pub fn format_locale<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    t.format(LOCALE_DATE_FORMAT).to_string()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(t: DateTime<Tz>) -> Self {
        Value::Timestamp(t.fixed_offset())
    }
}

impl From<ErrorInfo> for Value {
    fn from(info: ErrorInfo) -> Self {
        Value::error(info)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::seq(items)
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(items: BTreeSet<T>) -> Self {
        Value::Set(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashSet<T>> for Value {
    fn from(items: HashSet<T>) -> Self {
        Value::Set(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Value::map(entries)
    }
}

impl<K: Into<Value>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(entries: HashMap<K, V>) -> Self {
        Value::map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::seq(items),
            Json::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    #[test]
    fn json_objects_keep_document_order() {
        let value = Value::from(json!({"zeta": 1, "alpha": [true, null], "mid": {"x": 1.5}}));
        let Value::Object(fields) = &value else {
            panic!("expected object, got {value:?}");
        };
        let keys: Vec<_> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(
            value.to_plain().unwrap(),
            json!({"zeta": 1, "alpha": [true, null], "mid": {"x": 1.5}})
        );
    }

    #[test]
    fn map_keys_flatten_to_strings() {
        let value = Value::map([(Value::Int(7), "seven"), (Value::from("k"), "v")]);
        assert_eq!(value.to_plain().unwrap(), json!({"7": "seven", "k": "v"}));
    }

    #[test]
    fn timestamps_use_locale_format() {
        let t = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .unwrap();
        assert_eq!(format_locale(&t), "3/5/2024, 2:07:09 PM");
    }

    #[derive(Debug)]
    struct Huge;

    impl DomainValue for Huge {
        fn wide_int(&self) -> Option<i128> {
            Some(i128::from(i64::MAX) + 1)
        }
    }

    #[test]
    fn wide_ints_beyond_i64_flatten_to_strings() {
        assert_eq!(
            Value::domain(Huge).to_plain().unwrap(),
            json!("9223372036854775808")
        );
    }
}
