//! Name inflection for the derived schema: DB identifiers are snake_case, GraphQL
//! field names are camelCase, GraphQL type names are PascalCase singular.

/// Convert a single identifier from snake_case to camelCase.
/// e.g. "user_id" -> "userId", "created_at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from snake_case to PascalCase.
/// e.g. "user_facilities" -> "UserFacilities"
pub fn to_pascal_case(s: &str) -> String {
    let camel = to_camel_case(s);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => camel,
    }
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "userId" -> "user_id", "createdAt" -> "created_at"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Singular form of a table name, e.g. "users" -> "user",
/// "user_facilities" -> "user_facility". Covers the suffix patterns that
/// occur in table names; irregulars fall through unchanged.
pub fn singularize(s: &str) -> String {
    if let Some(stem) = s.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = s.strip_suffix("sses") {
        return format!("{}ss", stem);
    }
    if let Some(stem) = s.strip_suffix("xes") {
        return format!("{}x", stem);
    }
    if s.ends_with("ss") {
        return s.to_string();
    }
    if let Some(stem) = s.strip_suffix('s') {
        return stem.to_string();
    }
    s.to_string()
}

/// Plural form of an identifier. Inverse of [`singularize`] for the same patterns.
pub fn pluralize(s: &str) -> String {
    if s.ends_with('y') && !s.ends_with("ay") && !s.ends_with("ey") && !s.ends_with("oy") {
        return format!("{}ies", &s[..s.len() - 1]);
    }
    if s.ends_with('s') || s.ends_with('x') {
        return format!("{}es", s);
    }
    format!("{}s", s)
}
