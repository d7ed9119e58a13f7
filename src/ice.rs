//! Value types of the RPC framework, exposed to the renderer through
//! [`DomainValue`]. Nothing outside this module names them.

use crate::error::RenderError;
use crate::record::ErrorInfo;
use crate::value::{DomainValue, Fields, Value};
use std::fmt;

/// 64-bit integer carried as a wide value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Long(pub i64);

impl DomainValue for Long {
    fn wide_int(&self) -> Option<i128> {
        Some(self.0.into())
    }
}

impl From<Long> for Value {
    fn from(value: Long) -> Self {
        Value::domain(value)
    }
}

/// Object identity: a name within an optional category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identity {
    pub name: String,
    pub category: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

fn escape_identity_part(part: &str, out: &mut String) {
    for c in part.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}

/// Canonical `category/name` form, with `/` and `\` escaped inside parts.
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if !self.category.is_empty() {
            escape_identity_part(&self.category, &mut out);
            out.push('/');
        }
        escape_identity_part(&self.name, &mut out);
        f.write_str(&out)
    }
}

impl DomainValue for Identity {
    fn identity(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl From<Identity> for Value {
    fn from(value: Identity) -> Self {
        Value::domain(value)
    }
}

/// Enumerator of a generated enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i32,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl DomainValue for EnumValue {
    fn enum_name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::domain(value)
    }
}

/// Remote object reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPrx {
    pub identity: Identity,
    pub facet: String,
    pub endpoints: Vec<String>,
}

impl ObjectPrx {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            facet: String::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }
}

/// Stringified proxy, e.g. `hello -t -e 1.1:tcp -h localhost -p 10000`.
impl fmt::Display for ObjectPrx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.identity.to_string();
        if identity.contains(' ') {
            write!(f, "\"{identity}\"")?;
        } else {
            f.write_str(&identity)?;
        }
        if !self.facet.is_empty() {
            write!(f, " -f {}", self.facet)?;
        }
        f.write_str(" -t -e 1.1")?;
        for endpoint in &self.endpoints {
            write!(f, ":{endpoint}")?;
        }
        Ok(())
    }
}

impl DomainValue for ObjectPrx {
    fn reference(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl From<ObjectPrx> for Value {
    fn from(value: ObjectPrx) -> Self {
        Value::domain(value)
    }
}

/// Typed exception raised by a remote operation.
#[derive(Debug, Clone, Default)]
pub struct UserException {
    /// Scoped type name, e.g. `Demo::NotFound`.
    pub ice_name: String,
    pub message: String,
    pub cause: Option<String>,
    pub stack: Option<String>,
    pub fields: Fields,
}

impl UserException {
    pub fn new(ice_name: impl Into<String>) -> Self {
        Self {
            ice_name: ice_name.into(),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

impl DomainValue for UserException {
    fn exception(&self) -> Option<ErrorInfo> {
        Some(ErrorInfo::from(self))
    }

    fn fields(&self) -> Result<Fields, RenderError> {
        Ok(self.fields.clone())
    }
}

impl From<&UserException> for ErrorInfo {
    fn from(ex: &UserException) -> Self {
        ErrorInfo {
            name: ex.ice_name.clone(),
            message: ex.message.clone(),
            stack: ex.stack.clone(),
            cause_name: Some(ex.ice_name.clone()),
            cause_detail: ex.cause.clone(),
            fields: ex.fields.clone(),
        }
    }
}

impl From<UserException> for Value {
    fn from(value: UserException) -> Self {
        Value::domain(value)
    }
}

/// Instance of a generated class: a type id plus data members.
///
/// Members whose names start with `__` belong to the runtime and are
/// hidden when rendered.
#[derive(Debug, Clone, Default)]
pub struct IceValue {
    pub ice_id: String,
    pub fields: Fields,
}

impl IceValue {
    pub fn new(ice_id: impl Into<String>) -> Self {
        Self {
            ice_id: ice_id.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

impl DomainValue for IceValue {
    fn type_tag(&self) -> Option<&str> {
        Some(self.ice_id.as_str())
    }

    fn fields(&self) -> Result<Fields, RenderError> {
        Ok(self.fields.clone())
    }
}

impl From<IceValue> for Value {
    fn from(value: IceValue) -> Self {
        Value::domain(value)
    }
}

/// Dispatch information for the request currently being served.
#[derive(Debug, Clone, Default)]
pub struct Current {
    pub id: Identity,
    pub facet: String,
    pub operation: String,
    pub request_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Renderer;

    fn render(value: impl Into<Value>) -> String {
        Renderer::new("").unwrap().render(&value.into(), 0).unwrap()
    }

    #[test]
    fn identity_escapes_separators() {
        assert_eq!(Identity::new("hello", "").to_string(), "hello");
        assert_eq!(Identity::new("a/b", "cat").to_string(), "cat/a\\/b");
    }

    #[test]
    fn proxy_renders_its_string_form() {
        let prx = ObjectPrx::new(Identity::new("printer", ""))
            .with_endpoint("tcp -h localhost -p 10000");
        assert_eq!(render(prx), "printer -t -e 1.1:tcp -h localhost -p 10000");
    }

    #[test]
    fn long_and_enum_render_as_scalars() {
        assert_eq!(render(Long(-9_007_199_254_740_993)), "-9007199254740993");
        assert_eq!(render(EnumValue::new("Green", 1)), "Green");
    }

    #[test]
    fn ice_value_hides_internal_members() {
        let value = IceValue::new("::Demo::Point")
            .with_field("x", 1)
            .with_field("__slicedData", "raw")
            .with_field("y", 2);
        assert_eq!(render(value), "iceId: ::Demo::Point\nx: 1\ny: 2\n");
    }
}
