// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Names that end up as identifiers in generated source.

/// Strict and reserved keywords of the 2021 edition, plus `union`.
const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Why `name` can not be emitted as a member identifier, if it can't.
///
/// Fields, methods, parameters, policies and tests become members of
/// generated types, so keywords are refused as well as malformed names.
/// A leading `__` is reserved for generated members.
pub fn member_name_problem(name: &str) -> Option<&'static str> {
    type_name_problem(name).or_else(|| {
        if KEYWORDS.contains(&name) {
            Some("it is a Rust keyword")
        } else if name.starts_with("__") {
            Some("names starting with '__' are reserved")
        } else {
            None
        }
    })
}

/// Why `name` can not be used as a type name, if it can't. Type names are
/// always emitted behind a prefix (`RTx`, `Msg`), so keywords are fine.
pub fn type_name_problem(name: &str) -> Option<&'static str> {
    let mut chars = name.chars();
    match chars.next() {
        None => Some("it is empty"),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            Some("it must start with a letter or '_'")
        }
        _ if name == "_" => Some("'_' alone is not a name"),
        _ if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Some("it may only contain ASCII letters, digits and '_'")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass() {
        for name in ["id", "total_2", "_hidden", "Counter"] {
            assert_eq!(member_name_problem(name), None, "{name}");
        }
    }

    #[test]
    fn test_bad_member_names() {
        assert_eq!(member_name_problem("type"), Some("it is a Rust keyword"));
        assert!(member_name_problem("adds one").is_some());
        assert!(member_name_problem("2nd").is_some());
        assert!(member_name_problem("").is_some());
        assert!(member_name_problem("_").is_some());
        assert!(member_name_problem("__owner").is_some());
        assert!(member_name_problem("x: i32 } fn evil() {").is_some());
    }

    #[test]
    fn test_type_names_allow_keywords() {
        assert_eq!(type_name_problem("type"), None);
        assert!(type_name_problem("Foo-Bar").is_some());
    }
}
