//! Route template compilation.
//!
//! A template such as `/sub/{a:d}/{b:d}` is compiled once into an anchored
//! regex plus an ordered list of segment specs. Each spec carries the
//! converter that decides both the character class the segment accepts and
//! how the captured text is turned into a [`ParamValue`].
//!
//! | Code            | Matches               | Value                  |
//! |-----------------|-----------------------|------------------------|
//! | *(none)*, `s`   | `[^/]+`               | [`ParamValue::Str`]    |
//! | `d`, `int`      | `[0-9]+`              | [`ParamValue::Int`]    |
//! | `f`, `float`    | `[0-9]+(\.[0-9]+)?`   | [`ParamValue::Float`]  |
//!
//! `{{` and `}}` produce literal braces.

use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::error::PatternError;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Type converter attached to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// Any non-slash text, kept as a string
    Str,
    /// One or more ASCII digits, converted to `i64`
    Int,
    /// Digits with an optional fraction, converted to `f64`
    Float,
}

impl SegmentType {
    fn parse(code: &str) -> Option<Self> {
        match code {
            "" | "s" | "str" => Some(SegmentType::Str),
            "d" | "int" => Some(SegmentType::Int),
            "f" | "float" => Some(SegmentType::Float),
            _ => None,
        }
    }

    fn class(self) -> &'static str {
        match self {
            SegmentType::Str => "([^/]+)",
            SegmentType::Int => "([0-9]+)",
            SegmentType::Float => r"([0-9]+(?:\.[0-9]+)?)",
        }
    }

    /// Convert captured text. `None` means the segment does not match.
    fn convert(self, raw: &str) -> Option<ParamValue> {
        match self {
            SegmentType::Str => Some(ParamValue::Str(raw.to_string())),
            SegmentType::Int => raw.parse().ok().map(ParamValue::Int),
            SegmentType::Float => raw.parse().ok().map(ParamValue::Float),
        }
    }
}

/// One `{name[:type]}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    /// Parameter name as written in the template
    pub name: Arc<str>,
    /// Converter applied to the captured text
    pub ty: SegmentType,
}

/// Typed value captured from a path segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Str(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Parameters extracted by a successful match, in template order.
///
/// Names are `Arc<str>` shared with the compiled pattern so a match only
/// allocates for the values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParams(SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>);

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: ParamValue) {
        self.0.push((name, value));
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<SegmentSpec>,
    /// `None` for templates without segments; those compare by string equality
    regex: Option<Regex>,
    /// Unescaped literal text, used when `regex` is `None`
    literal: String,
}

impl PathPattern {
    /// Compile a route template.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut pattern = String::with_capacity(template.len() + 8);
        pattern.push('^');
        let mut literal = String::with_capacity(template.len());
        let mut segments: Vec<SegmentSpec> = Vec::with_capacity(template.matches('{').count());

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(PatternError::UnopenedSegment {
                        template: template.to_string(),
                    })
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(PatternError::UnclosedSegment {
                            template: template.to_string(),
                        });
                    }
                    let spec = Self::parse_segment(template, &body)?;
                    if segments.iter().any(|s| s.name == spec.name) {
                        return Err(PatternError::DuplicateName {
                            template: template.to_string(),
                            name: spec.name.to_string(),
                        });
                    }

                    pattern.push_str(&regex::escape(&literal));
                    literal.clear();
                    pattern.push_str(spec.ty.class());
                    segments.push(spec);
                }
                c => literal.push(c),
            }
        }

        if segments.is_empty() {
            return Ok(Self {
                template: template.to_string(),
                segments,
                regex: None,
                literal,
            });
        }

        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');
        let regex = Regex::new(&pattern).map_err(|e| PatternError::Regex {
            template: template.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            segments,
            regex: Some(regex),
            literal: String::new(),
        })
    }

    fn parse_segment(template: &str, body: &str) -> Result<SegmentSpec, PatternError> {
        let (name, code) = match body.split_once(':') {
            Some((name, code)) => (name.trim(), code.trim()),
            None => (body.trim(), ""),
        };

        let valid_name = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(PatternError::InvalidName {
                template: template.to_string(),
                name: name.to_string(),
            });
        }

        let ty = SegmentType::parse(code).ok_or_else(|| PatternError::UnknownType {
            template: template.to_string(),
            ty: code.to_string(),
        })?;

        Ok(SegmentSpec {
            name: Arc::from(name),
            ty,
        })
    }

    /// The template exactly as registered.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn segments(&self) -> &[SegmentSpec] {
        &self.segments
    }

    /// True when the template has no `{...}` segments.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.regex.is_none()
    }

    /// Test a concrete path against the whole template.
    ///
    /// Returns `None` on a literal mismatch, a segment count mismatch, or a
    /// capture that fails its type conversion.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let Some(regex) = &self.regex else {
            return (self.literal == path).then(PathParams::new);
        };

        let caps = regex.captures(path)?;
        let mut params = PathParams::new();
        for (idx, spec) in self.segments.iter().enumerate() {
            let raw = caps.get(idx + 1)?.as_str();
            let value = spec.ty.convert(raw)?;
            params.push(Arc::clone(&spec.name), value);
        }
        Some(params)
    }
}
