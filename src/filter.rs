//! Server-side document filters for listing calls.
//!
//! A filter narrows a listing to the documents the server matches against
//! it; the client never evaluates filters locally. On the wire a filter is
//! a small tagged map: the `_t` field names the filter kind and the
//! remaining fields are kind-specific. The tag dispatch keeps the set of
//! kinds open: a map with an absent or unrecognized tag parses to "no
//! filter" rather than an error, so servers and clients can add kinds
//! independently.
use serde_json::{Value, json};

/// A server-evaluated predicate over documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches documents whose content is a structural superset of
    /// `reference`: every map entry and list element of the reference must
    /// appear in the content. Comparison descends at most `depth` levels;
    /// 0 means unrestricted. Scalars are never supersets of one another.
    SuperOf { reference: Value, depth: i64 },
}

impl Filter {
    pub fn super_of(reference: Value, depth: i64) -> Self {
        Filter::SuperOf { reference, depth }
    }

    /// The short tag string naming this filter kind on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Filter::SuperOf { .. } => "so",
        }
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Filter::SuperOf { reference, depth } => json!({
                "_t": self.tag(),
                "s": reference,
                "l": depth,
            }),
        }
    }

    /// Interpret a wire map as a filter. An absent or unrecognized `_t`
    /// means no filter.
    pub fn parse(wire: &Value) -> Option<Filter> {
        match wire.get("_t")?.as_str()? {
            "so" => Some(Filter::SuperOf {
                reference: wire.get("s").cloned().unwrap_or(Value::Null),
                depth: wire.get("l").and_then(Value::as_i64).unwrap_or(0),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_of_round_trips() {
        let filter = Filter::super_of(json!({"status": "open", "tags": ["a"]}), 2);
        assert_eq!(Some(filter.clone()), Filter::parse(&filter.to_wire()));
    }

    #[test]
    fn wire_form_is_the_tagged_map() {
        let filter = Filter::super_of(json!({"k": 1}), 0);
        assert_eq!(json!({"_t": "so", "s": {"k": 1}, "l": 0}), filter.to_wire());
    }

    #[test]
    fn unrecognized_tag_is_no_filter() {
        assert_eq!(None, Filter::parse(&json!({"_t": "??", "s": 1})));
        assert_eq!(None, Filter::parse(&json!({"s": 1, "l": 0})));
        assert_eq!(None, Filter::parse(&json!({"_t": 3})));
        assert_eq!(None, Filter::parse(&Value::Null));
    }

    #[test]
    fn depth_defaults_to_unrestricted() {
        let parsed = Filter::parse(&json!({"_t": "so", "s": [1, 2]})).unwrap();
        assert_eq!(Filter::super_of(json!([1, 2]), 0), parsed);
    }

    #[test]
    fn missing_reference_parses_to_null() {
        let parsed = Filter::parse(&json!({"_t": "so", "l": 1})).unwrap();
        assert_eq!(Filter::super_of(Value::Null, 1), parsed);
    }
}
