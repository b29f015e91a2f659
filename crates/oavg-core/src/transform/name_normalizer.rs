use heck::{ToLowerCamelCase, ToPascalCase};

use crate::ir::NormalizedName;

/// Case `name` for use in TypeScript identifiers.
pub fn normalize_name(name: &str) -> NormalizedName {
    let words = split_words(name);
    NormalizedName {
        original: name.to_string(),
        pascal_case: words.to_pascal_case(),
        camel_case: words.to_lower_camel_case(),
    }
}

/// Derive a camelCase operation name from an HTTP method and a path.
///
/// Literal segments are joined in PascalCase after a verb picked from the
/// method. A path ending in a parameter addresses one resource, so `GET`
/// becomes `get` instead of `list` and the last literal is singularized:
/// `GET /users/{id}/messages` is `listUsersMessages`, `DELETE /users/{id}`
/// is `deleteUser`.
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let single = segments.last().is_some_and(|s| is_parameter(s));
    let literals: Vec<&str> = segments.into_iter().filter(|s| !is_parameter(s)).collect();

    let method = method.to_ascii_lowercase();
    let verb = match method.as_str() {
        "get" if single => "get",
        "get" => "list",
        "post" => "create",
        "put" => "update",
        other => other,
    };

    let mut name = verb.to_string();
    for (i, literal) in literals.iter().enumerate() {
        let word = if single && i + 1 == literals.len() {
            singularize(literal)
        } else {
            (*literal).to_string()
        };
        name.push_str(&split_words(&word).to_pascal_case());
    }
    name
}

fn is_parameter(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        return format!("{stem}y");
    }
    for suffix in ["ses", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Turn a schema key into an exported type identifier.
///
/// Segments separated by anything other than ASCII alphanumerics, `_` or `$`
/// are capitalized and joined. A name that is already a valid identifier in
/// PascalCase comes back unchanged.
pub fn sanitize_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for segment in name
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .filter(|s| !s.is_empty())
    {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }

    if out.is_empty() {
        return "Unnamed".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Replace every run of non-alphanumerics with a single `_` so heck sees word
/// boundaries; `unnamed` when nothing remains.
fn split_words(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect();
    if words.is_empty() {
        "unnamed".to_string()
    } else {
        words.join("_")
    }
}
