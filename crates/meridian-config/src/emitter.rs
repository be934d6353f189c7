//! Grammar-faithful text emitter for the declarative object configuration
//! dialect (spec §4.5). The grammar itself -- parsing, the expression
//! evaluator -- is out of scope; this module only ever produces text, never
//! reads it back.

use serde_json::{Map, Value};

const RESERVED_WORDS: &[&str] = &[
    "object", "template", "import", "apply", "to", "where", "true", "false", "null", "var",
    "const", "if", "else", "for", "while", "function", "return", "globals", "locals", "this",
];

/// Renders an identifier as it may appear on the left of an assignment:
/// bare if it matches `[A-Za-z_][A-Za-z0-9_]*` and is not reserved,
/// `@`-prefixed if it collides with a reserved keyword, quoted otherwise.
pub fn emit_identifier(name: &str) -> String {
    if is_bare_identifier(name) {
        if RESERVED_WORDS.contains(&name) {
            format!("@{name}")
        } else {
            name.to_string()
        }
    } else {
        emit_string(name)
    }
}

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Double-quoted string literal with the grammar's escape set.
pub fn emit_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Renders a JSON value as a grammar literal.
pub fn emit_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => emit_string(s),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(emit_value).collect();
            format!("[ {} ]", rendered.join(", "))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} = {}", emit_identifier(k), emit_value(v)))
                .collect();
            format!("{{ {} }}", rendered.join(", "))
        }
    }
}

/// Renders the left-hand side of an assignment for a dotted attribute path.
/// `a.b.c` becomes `a["b"]["c"]`.
pub fn emit_lhs(dotted_key: &str) -> String {
    let mut tokens = dotted_key.split('.');
    let head = tokens.next().unwrap_or_default();
    let mut out = emit_identifier(head);
    for tok in tokens {
        out.push('[');
        out.push_str(&emit_string(tok));
        out.push(']');
    }
    out
}

/// Renders a full `object <Type> "<name>" { ... }` (or `template`) item.
///
/// `attrs` keys may be dotted (`vars.os`); each becomes its own assignment
/// line using [`emit_lhs`]. Order follows `attrs`' own iteration order
/// (a `serde_json::Map` built with the `preserve_order` feature would be
/// needed for stable output across runs; this emitter does not require it,
/// only that `Parse ∘ Emit` round-trips the same key/value pairs).
pub fn emit_object_item(
    keyword: &str,
    type_name: &str,
    full_name: &str,
    templates: &[String],
    attrs: &Map<String, Value>,
) -> String {
    let mut out = format!("{keyword} {type_name} {} {{\n", emit_string(full_name));
    for template in templates {
        out.push_str(&format!("\timport {}\n", emit_string(template)));
    }
    for (key, value) in attrs {
        out.push_str(&format!("\t{} = {}\n", emit_lhs(key), emit_value(value)));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("address", "address"; "plain identifier is bare")]
    #[test_case("import", "@import"; "reserved keyword gets @ prefix")]
    #[test_case("host-name", "\"host-name\""; "hyphenated name is quoted")]
    fn identifier_rendering(input: &str, expected: &str) {
        assert_eq!(emit_identifier(input), expected);
    }

    #[test]
    fn string_escapes_the_full_set() {
        assert_eq!(
            emit_string("a\\b\"c\nd\te\rf\u{8}g\u{c}"),
            "\"a\\\\b\\\"c\\nd\\te\\rf\\bg\\f\""
        );
    }

    #[test]
    fn nested_keys_render_with_bracket_notation() {
        assert_eq!(emit_lhs("vars.os"), "vars[\"os\"]");
        assert_eq!(emit_lhs("vars.net.ip"), "vars[\"net\"][\"ip\"]");
        assert_eq!(emit_lhs("address"), "address");
    }

    #[test]
    fn object_item_includes_imports_and_assignments() {
        let mut attrs = Map::new();
        attrs.insert("address".to_string(), Value::String("10.0.0.1".into()));
        let rendered =
            emit_object_item("object", "Host", "h1", &["generic-host".to_string()], &attrs);
        assert!(rendered.starts_with("object Host \"h1\" {\n"));
        assert!(rendered.contains("\timport \"generic-host\"\n"));
        assert!(rendered.contains("\taddress = \"10.0.0.1\"\n"));
        assert!(rendered.ends_with("}\n"));
    }

    #[test]
    fn array_and_object_values_render_inline() {
        assert_eq!(emit_value(&serde_json::json!([1, 2, 3])), "[ 1, 2, 3 ]");
        assert_eq!(
            emit_value(&serde_json::json!({"os": "linux"})),
            "{ os = \"linux\" }"
        );
    }
}
