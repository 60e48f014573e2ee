//! Declared types from the Stan `data` block.
//!
//! This is a line-oriented text scan, not a Stan parser. Known limitations:
//!
//! - Only the first `data {` is read, and the block ends at the first `}`,
//!   so braces inside the block cut it short.
//! - Size annotations are stripped with `\[[^>]+\]`, the same "up to the
//!   next `>`" shape as bound stripping. A line with several bracket groups
//!   loses everything between the first `[` and the last `]`.
//!
//! Callers depend only on [`extract_types`], so a grammar-aware reader can
//! replace this without touching them.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

fn data_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"data \{([^}]*)").expect("static regex"))
}

fn bounds() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

fn sizes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^>]+\]").expect("static regex"))
}

fn identifiers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("static regex"))
}

/// Variable name → declared type token (`int`, `real`, `vector`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTypeMap {
    types: HashMap<String, String>,
}

impl VariableTypeMap {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.types.get(name).map(String::as_str)
    }

    /// Whether `name` is declared `int`.
    pub fn is_int(&self, name: &str) -> bool {
        self.get(name) == Some("int")
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableTypeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            types: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Read the declared type of every variable in the program's data block.
///
/// A program without a data block yields an empty map.
pub fn extract_types(program: &str) -> VariableTypeMap {
    let Some(block) = data_block()
        .captures(program)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        log::debug!("no data block found");
        return VariableTypeMap::default();
    };

    let mut types = HashMap::new();
    for line in block.split('\n') {
        if let Some((name, ty)) = declaration(line) {
            // Repeated names: last one wins.
            types.insert(name, ty);
        }
    }
    log::debug!("recovered {} data declaration(s)", types.len());
    VariableTypeMap { types }
}

/// `(name, type)` for one declaration line, or `None` for blank and
/// structural lines.
fn declaration(line: &str) -> Option<(String, String)> {
    let code = line.split("//").next().unwrap_or_default();
    let code = bounds().replace_all(code, "");
    let code = sizes().replace_all(&code, "");

    let tokens: Vec<&str> = identifiers().find_iter(&code).map(|m| m.as_str()).collect();
    let (first, last) = (tokens.first()?, tokens.last()?);

    // `array[N] int y;` declares an array of int: the element type follows
    // the `array` keyword.
    let ty = match tokens.as_slice() {
        ["array", element, _, ..] => element,
        _ => first,
    };
    Some((last.to_string(), ty.to_string()))
}
