use crate::error::RenderError;
use crate::record::ErrorInfo;
use crate::render::{push_entry, Depth, Renderer};
use std::borrow::Cow;

/// Key the extra error fields are rendered under.
pub const ERROR_DATA_KEY: &str = "errorData";

/// Label preceding the cleaned stack trace lines.
pub const STACK_TRACE_LABEL: &str = "stackTrace:";

/// Field names that are part of the header or trace and never repeated in
/// the `errorData` block.
pub const ERROR_RESERVED_KEYS: [&str; 5] = ["stack", "message", "name", "causeName", "causeDetail"];

impl Renderer {
    /// Format a record's error: header, optional `errorData` block and the
    /// stack trace with the base path removed. Absent errors format empty.
    pub fn format_error(&self, error: Option<&ErrorInfo>) -> Result<String, RenderError> {
        match error {
            Some(error) => self.format_error_at(error, Depth::at(0), true),
            None => Ok(String::new()),
        }
    }

    pub(crate) fn format_error_at(
        &self,
        error: &ErrorInfo,
        depth: Depth,
        with_fields: bool,
    ) -> Result<String, RenderError> {
        let mut stack_lines = error.stack.as_deref().unwrap_or_default().lines();
        let header = error_header(error, stack_lines.next());

        let mut body: Vec<String> = Vec::new();

        if with_fields {
            let extra: Vec<_> = error
                .fields
                .iter()
                .filter(|(key, _)| !ERROR_RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.as_str(), value))
                .collect();
            let data = self.object_at(&extra, depth.restart().child())?;
            if !data.is_empty() {
                let mut block = String::new();
                push_entry(&mut block, ERROR_DATA_KEY, &data);
                body.push(block.trim_end_matches('\n').to_string());
            }
        }

        let trace: Vec<String> = stack_lines
            .map(|line| self.strip_base_path(line).into_owned())
            .collect();
        if !trace.is_empty() {
            body.push(STACK_TRACE_LABEL.to_string());
            body.extend(trace);
        }

        if body.is_empty() {
            Ok(header)
        } else {
            Ok(format!("{header}\n\n{}", body.join("\n")))
        }
    }

    /// Remove every literal occurrence of the configured base path.
    pub fn strip_base_path<'l>(&self, line: &'l str) -> Cow<'l, str> {
        match &self.base_path {
            Some(pattern) => pattern.replace_all(line, ""),
            None => Cow::Borrowed(line),
        }
    }
}

/// Header line for an error.
///
/// A domain cause wins (`cause: detail`, falling back to the message);
/// otherwise the trace's own first line, or `name: message` when there is
/// no trace.
pub fn error_header(error: &ErrorInfo, first_stack_line: Option<&str>) -> String {
    if let Some(cause_name) = &error.cause_name {
        let detail = error
            .cause_detail
            .as_deref()
            .filter(|detail| !detail.is_empty())
            .unwrap_or(&error.message);
        return format!("{cause_name}: {detail}");
    }
    match first_stack_line.filter(|line| !line.trim().is_empty()) {
        Some(line) => line.to_string(),
        None => format!("{}: {}", error.name, error.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn renderer() -> Renderer {
        Renderer::new("/app").unwrap()
    }

    #[test]
    fn absent_error_formats_empty() {
        assert_eq!(renderer().format_error(None).unwrap(), "");
    }

    #[test]
    fn header_uses_first_stack_line_and_strips_base_path() {
        let err = ErrorInfo::new("Err", "bad thing")
            .with_stack("Err: bad thing\n    at run (/app/x.js:1:1)\n    at /app/lib/y.js:2:3");
        let text = renderer().format_error(Some(&err)).unwrap();
        assert_eq!(
            text,
            "Err: bad thing\n\nstackTrace:\n    at run (/x.js:1:1)\n    at /lib/y.js:2:3"
        );
    }

    #[test]
    fn cause_replaces_header_and_first_line() {
        let err = ErrorInfo::new("UserException", "lookup failed")
            .with_stack("UserException: lookup failed\n    at /app/svc.js:9:9")
            .with_cause("Demo::NotFound", Some("no such user".into()));
        let text = renderer().format_error(Some(&err)).unwrap();
        assert_eq!(text, "Demo::NotFound: no such user\n\nstackTrace:\n    at /svc.js:9:9");
        assert_eq!(text.matches("lookup failed").count(), 0);
    }

    #[test]
    fn cause_without_detail_falls_back_to_message() {
        let err = ErrorInfo::new("E", "msg").with_cause("Demo::Busy", None);
        assert_eq!(error_header(&err, None), "Demo::Busy: msg");
    }

    #[test]
    fn missing_stack_uses_name_and_message() {
        let err = ErrorInfo::new("Timeout", "after 5s");
        assert_eq!(renderer().format_error(Some(&err)).unwrap(), "Timeout: after 5s");
    }

    #[test]
    fn extra_fields_render_under_error_data() {
        let err = ErrorInfo::new("E", "m")
            .with_stack("E: m\n    at f (/app/a.js:1:1)")
            .with_field("code", 42)
            .with_field("stack", "duplicate")
            .with_field("empty", Value::Object(Vec::new()));
        let text = renderer().format_error(Some(&err)).unwrap();
        assert_eq!(
            text,
            "E: m\n\nerrorData:\n  code: 42\nstackTrace:\n    at f (/a.js:1:1)"
        );
    }

    #[test]
    fn reserved_only_fields_omit_error_data() {
        let err = ErrorInfo::new("E", "m").with_field("message", "again");
        let text = renderer().format_error(Some(&err)).unwrap();
        assert!(!text.contains(ERROR_DATA_KEY));
    }
}
