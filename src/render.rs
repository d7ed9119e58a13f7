use crate::error::{ConfigError, RenderError};
use crate::record::ErrorInfo;
use crate::value::{format_locale, plain_fields, DomainValue, Fields, Value, INTERNAL_PREFIX, MAX_DEPTH};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::borrow::Cow;

/// Plain objects at this depth or deeper render as single-line JSON.
pub const FLATTEN_DEPTH: usize = 3;

const INDENT: &str = "  ";

/// Recursive, depth-limited value renderer.
///
/// Holds the compiled base-path pattern used when formatting stack traces;
/// everything else is a pure function of the value and depth.
#[derive(Debug, Clone)]
pub struct Renderer {
    pub(crate) base_path: Option<Regex>,
}

/// Where a value sits while rendering.
///
/// `layout` decides indentation and flattening and starts over inside an
/// error's `errorData` block. `nesting` only grows and bounds recursion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Depth {
    layout: usize,
    nesting: usize,
}

impl Depth {
    pub(crate) fn at(depth: usize) -> Self {
        Depth {
            layout: depth,
            nesting: depth,
        }
    }

    pub(crate) fn child(self) -> Self {
        Depth {
            layout: self.layout + 1,
            nesting: self.nesting + 1,
        }
    }

    /// Lay out from the top again, keeping the recursion count.
    pub(crate) fn restart(self) -> Self {
        Depth {
            layout: 0,
            nesting: self.nesting,
        }
    }
}

/// What a value renders as, resolved in precedence order.
enum Shape<'a> {
    WideInt(i128),
    Temporal(&'a DateTime<FixedOffset>),
    Mapping(&'a [(Value, Value)]),
    Exception(ErrorInfo),
    Error(&'a ErrorInfo),
    Symbol(&'a str),
    Text(String),
    Items(&'a [Value]),
    Tagged { tag: &'a str, fields: Fields },
    Object(Cow<'a, [(String, Value)]>),
    Scalar(&'a Value),
}

impl<'a> Shape<'a> {
    fn of(value: &'a Value) -> Result<Shape<'a>, RenderError> {
        Ok(match value {
            Value::Timestamp(t) => Shape::Temporal(t),
            Value::Map(entries) => Shape::Mapping(entries.as_slice()),
            Value::Error(info) => Shape::Error(&**info),
            Value::Seq(items) | Value::Set(items) => Shape::Items(items.as_slice()),
            Value::Object(fields) => Shape::Object(Cow::Borrowed(fields.as_slice())),
            Value::Domain(domain) => Shape::of_domain(domain.as_ref())?,
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Float(_)
            | Value::Str(_) => Shape::Scalar(value),
        })
    }

    // First capability that answers wins.
    fn of_domain(domain: &'a dyn DomainValue) -> Result<Shape<'a>, RenderError> {
        if let Some(n) = domain.wide_int() {
            return Ok(Shape::WideInt(n));
        }
        if let Some(info) = domain.exception() {
            return Ok(Shape::Exception(info));
        }
        if let Some(name) = domain.enum_name() {
            return Ok(Shape::Symbol(name));
        }
        if let Some(identity) = domain.identity() {
            return Ok(Shape::Text(identity));
        }
        if let Some(reference) = domain.reference() {
            return Ok(Shape::Text(reference));
        }
        if let Some(tag) = domain.type_tag() {
            return Ok(Shape::Tagged {
                tag,
                fields: domain.fields()?,
            });
        }
        let fields = domain.fields()?;
        if fields.is_empty() {
            Ok(Shape::Text(domain.describe()?))
        } else {
            Ok(Shape::Object(Cow::Owned(fields)))
        }
    }
}

impl Renderer {
    /// Build a renderer that strips every literal occurrence of `base_path`
    /// from stack trace lines. An empty base path disables stripping.
    pub fn new(base_path: &str) -> Result<Self, ConfigError> {
        let base_path = if base_path.is_empty() {
            None
        } else {
            Some(Regex::new(&regex::escape(base_path))?)
        };
        Ok(Renderer { base_path })
    }

    /// Render a value as an indented text fragment.
    ///
    /// Containers render one entry per line with a trailing newline; an
    /// empty result means the value has nothing to show and its key should
    /// be dropped by the caller.
    pub fn render(&self, value: &Value, depth: usize) -> Result<String, RenderError> {
        self.render_at(value, Depth::at(depth))
    }

    pub(crate) fn render_at(&self, value: &Value, depth: Depth) -> Result<String, RenderError> {
        if depth.nesting > MAX_DEPTH {
            return Err(RenderError::TooDeep(MAX_DEPTH));
        }

        Ok(match Shape::of(value)? {
            Shape::WideInt(n) => n.to_string(),
            Shape::Temporal(t) => format_locale(t),
            Shape::Mapping(entries) => {
                let mut out = String::new();
                for (key, value) in entries {
                    let rendered = self.render_at(value, depth.child())?;
                    if rendered.is_empty() {
                        continue;
                    }
                    let key = self.render_at(key, depth.child())?;
                    push_entry(&mut out, key.trim_end_matches('\n'), &rendered);
                }
                out
            }
            Shape::Exception(info) => self.format_error_at(&info, depth, true)?,
            Shape::Error(info) => self.format_error_at(info, depth, false)?,
            Shape::Symbol(name) => name.to_string(),
            Shape::Text(text) => text,
            Shape::Items(items) => self.render_items(items, depth)?,
            Shape::Tagged { tag, fields } => {
                let visible: Vec<_> = fields
                    .iter()
                    .filter(|(key, _)| !key.starts_with(INTERNAL_PREFIX))
                    .map(|(key, value)| (key.as_str(), value))
                    .collect();
                let mut out = format!("iceId: {tag}\n");
                out.push_str(&self.render_fields(&visible, depth)?);
                out
            }
            Shape::Object(fields) => {
                let refs: Vec<_> = fields.iter().map(|(key, value)| (key.as_str(), value)).collect();
                self.object_at(&refs, depth)?
            }
            Shape::Scalar(value) => scalar(value),
        })
    }

    /// Render named fields as a plain object: empty renders empty, shallow
    /// objects render field by field, deep ones collapse to one JSON line.
    pub fn render_object(&self, fields: &[(&str, &Value)], depth: usize) -> Result<String, RenderError> {
        self.object_at(fields, Depth::at(depth))
    }

    pub(crate) fn object_at(&self, fields: &[(&str, &Value)], depth: Depth) -> Result<String, RenderError> {
        if fields.is_empty() {
            return Ok(String::new());
        }
        if depth.layout < FLATTEN_DEPTH {
            return self.render_fields(fields, depth);
        }
        let plain = plain_fields(fields.iter().copied(), depth.nesting)?;
        Ok(serde_json::to_string(&plain)?)
    }

    fn render_fields(&self, fields: &[(&str, &Value)], depth: Depth) -> Result<String, RenderError> {
        let mut out = String::new();
        for (key, value) in fields {
            let rendered = self.render_at(value, depth.child())?;
            if rendered.is_empty() {
                continue;
            }
            push_entry(&mut out, key, &rendered);
        }
        Ok(out)
    }

    fn render_items(&self, items: &[Value], depth: Depth) -> Result<String, RenderError> {
        let mut out = String::new();
        for item in items {
            let rendered = self.render_at(item, depth.child())?;
            let rendered = rendered.trim_end_matches('\n');
            out.push_str("- ");
            if rendered.is_empty() {
                out.push_str("\"\"");
            } else {
                out.push_str(&hanging_indent(rendered));
            }
            out.push('\n');
        }
        Ok(out)
    }
}

/// Append `key: value`, or `key:` followed by the indented block when the
/// value spans several lines.
pub(crate) fn push_entry(out: &mut String, key: &str, rendered: &str) {
    out.push_str(key);
    if is_block(rendered) {
        out.push_str(":\n");
        out.push_str(&indent(rendered.trim_end_matches('\n')));
    } else {
        out.push_str(": ");
        out.push_str(rendered);
    }
    out.push('\n');
}

pub(crate) fn is_block(rendered: &str) -> bool {
    rendered.contains('\n')
}

/// Indent every non-empty line by one level.
pub fn indent(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                Cow::Borrowed(line)
            } else {
                Cow::Owned(format!("{INDENT}{line}"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the first line in place and indent the rest, for blocks that follow
/// an inline prefix such as `- ` or `Error: `.
pub fn hanging_indent(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{}", indent(rest)),
        None => text.to_string(),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Float(f) if f.is_infinite() => {
            let label = if f.is_sign_positive() { "Infinity" } else { "-Infinity" };
            label.to_string()
        }
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> Renderer {
        Renderer::new("/app").unwrap()
    }

    #[test]
    fn scalars_render_literally() {
        let r = renderer();
        assert_eq!(r.render(&Value::Null, 0).unwrap(), "null");
        assert_eq!(r.render(&Value::Bool(false), 0).unwrap(), "false");
        assert_eq!(r.render(&Value::Float(1.5), 0).unwrap(), "1.5");
        assert_eq!(r.render(&Value::Float(2.0), 0).unwrap(), "2");
        assert_eq!(r.render(&Value::Float(f64::NEG_INFINITY), 0).unwrap(), "-Infinity");
        assert_eq!(r.render(&Value::from("plain"), 0).unwrap(), "plain");
    }

    #[test]
    fn indent_skips_empty_lines() {
        assert_eq!(indent("a\n\nb"), "  a\n\n  b");
        assert_eq!(indent(""), "");
    }

    #[test]
    fn hanging_indent_keeps_first_line() {
        assert_eq!(hanging_indent("a: 1\nb: 2"), "a: 1\n  b: 2");
        assert_eq!(hanging_indent("single"), "single");
    }

    #[test]
    fn empty_base_path_disables_stripping() {
        assert!(Renderer::new("").unwrap().base_path.is_none());
    }

    #[test]
    fn base_path_is_matched_literally() {
        let r = Renderer::new("/opt/app(1).v2").unwrap();
        let re = r.base_path.as_ref().unwrap();
        assert!(re.is_match("at /opt/app(1).v2/x.js"));
        assert!(!re.is_match("at /opt/app1xv2/x.js"));
    }
}
