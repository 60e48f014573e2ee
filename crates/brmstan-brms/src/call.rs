//! R function call rendering.

use std::fmt;

use brmstan_bridge::r_name;

/// An R function call with positional and named arguments, kept in order.
///
/// Argument values are R source and are spliced in verbatim; quote strings
/// with [`brmstan_bridge::r_string`] first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RCall {
    function: String,
    args: Vec<(Option<String>, String)>,
}

impl RCall {
    /// A call to `function` (may be namespaced, e.g. `brms::bf`).
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn positional(mut self, expr: impl Into<String>) -> Self {
        self.args.push((None, expr.into()));
        self
    }

    /// Append a named argument.
    pub fn arg(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.args.push((Some(name.into()), expr.into()));
        self
    }

    /// Append a named argument only when `expr` is present.
    pub fn arg_opt(self, name: impl Into<String>, expr: Option<impl Into<String>>) -> Self {
        match expr {
            Some(expr) => self.arg(name, expr),
            None => self,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Whether a named argument is present.
    pub fn has_arg(&self, name: &str) -> bool {
        self.args.iter().any(|(n, _)| n.as_deref() == Some(name))
    }

    /// The expression bound to a named argument.
    pub fn get_arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, e)| e.as_str())
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for RCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, (name, expr)) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match name {
                Some(name) => write!(f, "{} = {expr}", r_name(name))?,
                None => write!(f, "{expr}")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_mixed_arguments() {
        let call = RCall::new("brms::prior_string")
            .positional("\"normal(0, 1)\"")
            .arg("class", "\"b\"");
        assert_eq!(
            call.to_string(),
            r#"brms::prior_string("normal(0, 1)", class = "b")"#
        );
        assert!(call.has_arg("class"));
        assert!(!call.has_arg("coef"));
    }

    #[test]
    fn optional_arguments_are_omitted() {
        let call = RCall::new("f").arg_opt("prior", None::<String>).arg("x", "1");
        assert_eq!(call.to_string(), "f(x = 1)");
        assert_eq!(call.arg_count(), 1);
    }
}
