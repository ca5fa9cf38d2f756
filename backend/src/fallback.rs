//! Ordered fallback chains for optional order fields.
//!
//! A chain is a list of `(source, validity)` pairs. The first source that is
//! present and passes its predicate wins; otherwise the caller's literal
//! placeholder is used.

/// Predicate deciding whether a candidate value is usable
pub type Validity = fn(&str) -> bool;

/// Present and not just whitespace
pub fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// At least one digit, e.g. for phone numbers
pub fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

/// Contains an `@` with text on both sides
pub fn looks_like_email(value: &str) -> bool {
    value
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct FallbackChain<'a> {
    steps: Vec<(Option<&'a str>, Validity)>,
}

impl<'a> FallbackChain<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends a source accepted when non-blank
    pub fn then(self, source: Option<&'a str>) -> Self {
        self.then_if(source, non_blank)
    }

    /// Appends a source accepted when `valid` returns true
    pub fn then_if(mut self, source: Option<&'a str>, valid: Validity) -> Self {
        self.steps.push((source, valid));
        self
    }

    /// First valid source, trimmed
    pub fn resolve(&self) -> Option<&'a str> {
        self.steps.iter().find_map(|&(source, valid)| {
            let value = source?.trim();
            (non_blank(value) && valid(value)).then_some(value)
        })
    }

    /// First valid source, or `placeholder`
    pub fn or(&self, placeholder: &'a str) -> &'a str {
        self.resolve().unwrap_or(placeholder)
    }
}
