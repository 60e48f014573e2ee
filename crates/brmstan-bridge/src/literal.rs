//! R source literals.

use std::fmt::Write;

use brmstan_core::Column;

/// Quote a string as an R double-quoted literal.
pub fn r_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a name for use as an argument or list element name.
///
/// Syntactic names pass through; anything else is backquoted.
pub fn r_name(name: &str) -> String {
    let syntactic = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
    if syntactic {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Render a real as an R numeric literal.
pub fn r_real(x: f64) -> String {
    if x.is_nan() {
        "NA_real_".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "Inf" } else { "-Inf" }.to_string()
    } else {
        // Debug formatting round-trips exactly.
        format!("{x:?}")
    }
}

/// Render an integer as an R literal. Values outside R's 32-bit integer
/// range fall back to doubles.
pub fn r_int(i: i64) -> String {
    if i32::try_from(i).is_ok() {
        format!("{i}L")
    } else {
        format!("{i}")
    }
}

/// Render a column as an R atomic vector (factors wrapped in `factor()`,
/// missing levels as `NA_character_`).
pub fn r_vector(column: &Column) -> String {
    match column {
        Column::Real(v) if v.is_empty() => "numeric(0)".to_string(),
        Column::Int(v) if v.is_empty() => "integer(0)".to_string(),
        Column::Factor(v) if v.is_empty() => "factor(character(0))".to_string(),
        Column::Real(v) => combine(v.iter().map(|x| r_real(*x))),
        Column::Int(v) => {
            if v.iter().all(|i| i32::try_from(*i).is_ok()) {
                combine(v.iter().map(|i| r_int(*i)))
            } else {
                combine(v.iter().map(|i| format!("{i}")))
            }
        }
        Column::Factor(v) => format!(
            "factor({})",
            combine(v.iter().map(|s| match s {
                Some(s) => r_string(s),
                None => "NA_character_".to_string(),
            }))
        ),
    }
}

fn combine(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    format!("c({})", items.join(", "))
}
