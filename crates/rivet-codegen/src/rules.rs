//! Validation rule compiler.
//!
//! Rules arrive as `@keyword: argument` lines in a field's leading comment.
//! This module turns each line into a typed [`Rule`], checking the argument
//! syntax and the rule's compatibility with the field kind. Code emission
//! lives in [`crate::emit::validation`]; nothing downstream looks at comment
//! text again.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{GenError, Result};
use crate::naming::string_literal;
use crate::schema::{FieldKind, FieldSchema};

/// The fixed rule vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    Range,
    In,
    NotIn,
    Len,
    MinLen,
    MaxLen,
    MinItems,
    MaxItems,
    Pattern,
    Prefix,
    Suffix,
    Contains,
    NotContains,
    Unique,
    Type,
}

impl RuleKind {
    pub const ALL: [RuleKind; 20] = [
        RuleKind::Eq,
        RuleKind::Lt,
        RuleKind::Lte,
        RuleKind::Gt,
        RuleKind::Gte,
        RuleKind::Range,
        RuleKind::In,
        RuleKind::NotIn,
        RuleKind::Len,
        RuleKind::MinLen,
        RuleKind::MaxLen,
        RuleKind::MinItems,
        RuleKind::MaxItems,
        RuleKind::Pattern,
        RuleKind::Prefix,
        RuleKind::Suffix,
        RuleKind::Contains,
        RuleKind::NotContains,
        RuleKind::Unique,
        RuleKind::Type,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            RuleKind::Eq => "eq",
            RuleKind::Lt => "lt",
            RuleKind::Lte => "lte",
            RuleKind::Gt => "gt",
            RuleKind::Gte => "gte",
            RuleKind::Range => "range",
            RuleKind::In => "in",
            RuleKind::NotIn => "not_in",
            RuleKind::Len => "len",
            RuleKind::MinLen => "min_len",
            RuleKind::MaxLen => "max_len",
            RuleKind::MinItems => "min_items",
            RuleKind::MaxItems => "max_items",
            RuleKind::Pattern => "pattern",
            RuleKind::Prefix => "prefix",
            RuleKind::Suffix => "suffix",
            RuleKind::Contains => "contains",
            RuleKind::NotContains => "not_contains",
            RuleKind::Unique => "unique",
            RuleKind::Type => "type",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<RuleKind> {
        RuleKind::ALL.iter().copied().find(|k| k.keyword() == keyword)
    }

    /// Rules checked against the whole collection of a repeated field rather
    /// than each element.
    pub fn is_collection_rule(self) -> bool {
        matches!(self, RuleKind::Unique | RuleKind::MinItems | RuleKind::MaxItems)
    }
}

/// Semantic string checks for the `type` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Url,
    Ip,
    Phone,
    Email,
}

impl TypeTag {
    fn parse(raw: &str) -> Option<TypeTag> {
        match raw {
            "url" => Some(TypeTag::Url),
            "ip" => Some(TypeTag::Ip),
            "phone" => Some(TypeTag::Phone),
            "email" => Some(TypeTag::Email),
            _ => None,
        }
    }

    /// Runtime helper in `rivet_common::validate`.
    pub fn checker(self) -> &'static str {
        match self {
            TypeTag::Url => "is_url",
            TypeTag::Ip => "is_ip",
            TypeTag::Phone => "is_phone",
            TypeTag::Email => "is_email",
        }
    }

    pub fn failure(self) -> &'static str {
        match self {
            TypeTag::Url => "value must be a valid URL",
            TypeTag::Ip => "value must be a valid IP address",
            TypeTag::Phone => "value must be a valid phone number",
            TypeTag::Email => "value must be a valid email address",
        }
    }
}

/// A typed rule argument. Literals are stored as Rust tokens already typed
/// for the field (`3i32`, `2.5f64`, `"abc"`).
#[derive(Debug, Clone, PartialEq)]
pub enum RuleArg {
    Literal(String),
    Range {
        lo: String,
        lo_inclusive: bool,
        hi: String,
        hi_inclusive: bool,
    },
    List(Vec<String>),
    Count(usize),
    Text(String),
    Unique,
    Type(TypeTag),
}

/// One compiled rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    pub arg: RuleArg,
    /// The argument as written, minus quotes; used in failure messages.
    pub display: String,
}

impl Rule {
    /// Human-readable failure reason emitted into the validator.
    pub fn failure_reason(&self, kind: FieldKind) -> String {
        let unit = if kind == FieldKind::Bytes { "bytes" } else { "runes" };
        let d = &self.display;
        match (&self.kind, &self.arg) {
            (RuleKind::Eq, _) => format!("value must equal {}", d),
            (RuleKind::Lt, _) => format!("value must be less than {}", d),
            (RuleKind::Lte, _) => format!("value must be less than or equal to {}", d),
            (RuleKind::Gt, _) => format!("value must be greater than {}", d),
            (RuleKind::Gte, _) => format!("value must be greater than or equal to {}", d),
            (RuleKind::Range, _) => format!("value must be in range {}", d),
            (RuleKind::In, _) => format!("value must be in list {}", d),
            (RuleKind::NotIn, _) => format!("value must not be in list {}", d),
            (RuleKind::Len, _) => format!("value length must be {} {}", d, unit),
            (RuleKind::MinLen, _) => format!("value length must be at least {} {}", d, unit),
            (RuleKind::MaxLen, _) => format!("value length must be at most {} {}", d, unit),
            (RuleKind::MinItems, _) => format!("value must contain at least {} item(s)", d),
            (RuleKind::MaxItems, _) => format!("value must contain at most {} item(s)", d),
            (RuleKind::Pattern, _) => format!("value does not match regex pattern {}", d),
            (RuleKind::Prefix, _) => format!("value does not have prefix {}", d),
            (RuleKind::Suffix, _) => format!("value does not have suffix {}", d),
            (RuleKind::Contains, _) => format!("value does not contain {}", d),
            (RuleKind::NotContains, _) => format!("value contains {}", d),
            (RuleKind::Unique, _) => "repeated value must contain unique items".to_string(),
            (RuleKind::Type, RuleArg::Type(tag)) => tag.failure().to_string(),
            (RuleKind::Type, _) => format!("value must be a valid {}", d),
        }
    }
}

/// Rules per (record, field), built once when the schema is loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: BTreeMap<(String, String), Vec<Rule>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: &str, field: &str, rules: Vec<Rule>) {
        if !rules.is_empty() {
            self.rules.insert((record.to_string(), field.to_string()), rules);
        }
    }

    pub fn get(&self, record: &str, field: &str) -> &[Rule] {
        self.rules
            .get(&(record.to_string(), field.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn annotation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z_]+):\s*(.+)").expect("static regex"))
}

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\(\[])\s*([^,]+?)\s*,\s*([^,]+?)\s*([\)\]])$").expect("static regex"))
}

/// Extracts `(keyword, argument)` pairs from a comment, one per line.
pub fn extract_annotations(comment: &str) -> Vec<(String, String)> {
    comment
        .lines()
        .filter_map(|line| annotation_regex().captures(line))
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

/// Compiles the annotations of one field.
///
/// With `strict` set an unknown keyword is an error; otherwise it is logged
/// and skipped.
pub fn compile_field_rules(record: &str, field: &FieldSchema, strict: bool) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for (keyword, argument) in extract_annotations(&field.comment) {
        let kind = match RuleKind::from_keyword(&keyword) {
            Some(kind) => kind,
            None if strict => {
                return Err(GenError::UnknownRule {
                    record: record.to_string(),
                    field: field.name.clone(),
                    keyword,
                })
            }
            None => {
                tracing::warn!(
                    "Skipping unknown validation rule @{} on {}.{}",
                    keyword,
                    record,
                    field.name
                );
                continue;
            }
        };

        let ctx = RuleContext {
            record,
            field,
            kind,
            argument: &argument,
        };
        ctx.check_compatible()?;
        rules.push(ctx.compile()?);
    }

    Ok(rules)
}

struct RuleContext<'a> {
    record: &'a str,
    field: &'a FieldSchema,
    kind: RuleKind,
    argument: &'a str,
}

impl RuleContext<'_> {
    fn malformed(&self, reason: impl Into<String>) -> GenError {
        GenError::MalformedRule {
            record: self.record.to_string(),
            field: self.field.name.clone(),
            rule: self.kind.keyword().to_string(),
            argument: self.argument.to_string(),
            reason: reason.into(),
        }
    }

    fn incompatible(&self) -> GenError {
        let kind = if self.field.repeated {
            format!("repeated {}", self.field.kind.name())
        } else {
            self.field.kind.name().to_string()
        };
        GenError::IncompatibleRule {
            record: self.record.to_string(),
            field: self.field.name.clone(),
            rule: self.kind.keyword().to_string(),
            kind,
        }
    }

    fn check_compatible(&self) -> Result<()> {
        let kind = self.field.kind;
        let ok = match self.kind {
            RuleKind::MinItems | RuleKind::MaxItems => self.field.repeated,
            RuleKind::Unique => self.field.repeated && kind != FieldKind::Message,
            RuleKind::Eq => kind.is_numeric() || matches!(kind, FieldKind::String | FieldKind::Bool),
            RuleKind::Lt | RuleKind::Lte | RuleKind::Gt | RuleKind::Gte | RuleKind::Range => {
                kind.is_numeric()
            }
            RuleKind::In | RuleKind::NotIn => kind.is_numeric() || kind == FieldKind::String,
            RuleKind::Len | RuleKind::MinLen | RuleKind::MaxLen => {
                matches!(kind, FieldKind::String | FieldKind::Bytes)
            }
            RuleKind::Pattern
            | RuleKind::Prefix
            | RuleKind::Suffix
            | RuleKind::Contains
            | RuleKind::NotContains
            | RuleKind::Type => kind == FieldKind::String,
        };
        if ok {
            Ok(())
        } else {
            Err(self.incompatible())
        }
    }

    fn compile(&self) -> Result<Rule> {
        let display = unquote(self.argument).to_string();
        let arg = match self.kind {
            RuleKind::Eq | RuleKind::Lt | RuleKind::Lte | RuleKind::Gt | RuleKind::Gte => {
                RuleArg::Literal(self.literal(self.argument)?)
            }
            RuleKind::Range => self.range()?,
            RuleKind::In | RuleKind::NotIn => RuleArg::List(self.list()?),
            RuleKind::Len
            | RuleKind::MinLen
            | RuleKind::MaxLen
            | RuleKind::MinItems
            | RuleKind::MaxItems => RuleArg::Count(
                self.argument
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| self.malformed(format!("expected a non-negative integer: {}", e)))?,
            ),
            RuleKind::Pattern => {
                let pattern = unquote(self.argument);
                Regex::new(pattern).map_err(|e| GenError::InvalidPattern {
                    record: self.record.to_string(),
                    field: self.field.name.clone(),
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                RuleArg::Text(pattern.to_string())
            }
            RuleKind::Prefix | RuleKind::Suffix | RuleKind::Contains | RuleKind::NotContains => {
                RuleArg::Text(unquote(self.argument).to_string())
            }
            RuleKind::Unique => {
                let flag = self.argument.trim();
                if flag != "true" {
                    return Err(self.malformed("expected `true`"));
                }
                RuleArg::Unique
            }
            RuleKind::Type => RuleArg::Type(
                TypeTag::parse(unquote(self.argument))
                    .ok_or_else(|| self.malformed("expected one of url, ip, phone, email"))?,
            ),
        };
        Ok(Rule {
            kind: self.kind,
            arg,
            display,
        })
    }

    fn range(&self) -> Result<RuleArg> {
        let caps = range_regex()
            .captures(self.argument.trim())
            .ok_or_else(|| self.malformed("expected [lo,hi], [lo,hi), (lo,hi] or (lo,hi)"))?;
        let lo = self.literal(&caps[2])?;
        let hi = self.literal(&caps[3])?;
        Ok(RuleArg::Range {
            lo,
            lo_inclusive: &caps[1] == "[",
            hi,
            hi_inclusive: &caps[4] == "]",
        })
    }

    fn list(&self) -> Result<Vec<String>> {
        let inner = self
            .argument
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| self.malformed("expected a bracketed list like [a,b]"))?;
        if inner.trim().is_empty() {
            return Err(self.malformed("list must not be empty"));
        }
        inner.split(',').map(|item| self.literal(item)).collect()
    }

    /// Parses a literal as the field's kind and renders it as a typed token.
    fn literal(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        let kind = self.field.kind;
        let token = match kind {
            FieldKind::Int32 => raw.parse::<i32>().map(|v| format!("{}i32", v)).map_err(|e| e.to_string()),
            FieldKind::Int64 => raw.parse::<i64>().map(|v| format!("{}i64", v)).map_err(|e| e.to_string()),
            FieldKind::Uint32 => raw.parse::<u32>().map(|v| format!("{}u32", v)).map_err(|e| e.to_string()),
            FieldKind::Uint64 => raw.parse::<u64>().map(|v| format!("{}u64", v)).map_err(|e| e.to_string()),
            FieldKind::Float => match raw.parse::<f32>() {
                Ok(v) if v.is_finite() => Ok(format!("{:?}f32", v)),
                Ok(_) => Err("value must be finite".to_string()),
                Err(e) => Err(e.to_string()),
            },
            FieldKind::Double => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(format!("{:?}f64", v)),
                Ok(_) => Err("value must be finite".to_string()),
                Err(e) => Err(e.to_string()),
            },
            FieldKind::Bool => match raw {
                "true" | "false" => Ok(raw.to_string()),
                _ => Err("expected true or false".to_string()),
            },
            FieldKind::String => Ok(string_literal(unquote(raw))),
            FieldKind::Bytes | FieldKind::Message => Err(format!("no literals for {} fields", kind.name())),
        };
        token.map_err(|reason| self.malformed(format!("{:?} is not a valid {}: {}", raw, kind.name(), reason)))
    }
}

/// Strips one pair of surrounding double quotes.
fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind, repeated: bool, comment: &str) -> FieldSchema {
        FieldSchema {
            name: "value".to_string(),
            kind,
            repeated,
            message: None,
            comment: comment.to_string(),
        }
    }

    fn compile(kind: FieldKind, repeated: bool, comment: &str) -> Result<Vec<Rule>> {
        compile_field_rules("demo.v1.Req", &field(kind, repeated, comment), true)
    }

    #[test]
    fn test_extracts_one_rule_per_line() {
        let found = extract_annotations("The user's name.\n@min_len: 1\n  @max_len: 3\nnot a rule: 4");
        assert_eq!(
            found,
            vec![
                ("min_len".to_string(), "1".to_string()),
                ("max_len".to_string(), "3".to_string())
            ]
        );
    }

    #[test]
    fn test_numeric_literals_are_typed() {
        let rules = compile(FieldKind::Int32, false, "@gt: 5").unwrap();
        assert_eq!(rules[0].arg, RuleArg::Literal("5i32".to_string()));

        let rules = compile(FieldKind::Double, false, "@lte: 2").unwrap();
        assert_eq!(rules[0].arg, RuleArg::Literal("2.0f64".to_string()));

        let rules = compile(FieldKind::Uint64, false, "@eq: 7").unwrap();
        assert_eq!(rules[0].arg, RuleArg::Literal("7u64".to_string()));
    }

    #[test]
    fn test_negative_literal_for_unsigned_field_is_malformed() {
        let err = compile(FieldKind::Uint32, false, "@gte: -1").unwrap_err();
        assert!(matches!(err, GenError::MalformedRule { .. }));
    }

    #[test]
    fn test_range_forms() {
        let rules = compile(FieldKind::Int64, false, "@range: [1, 10)").unwrap();
        assert_eq!(
            rules[0].arg,
            RuleArg::Range {
                lo: "1i64".to_string(),
                lo_inclusive: true,
                hi: "10i64".to_string(),
                hi_inclusive: false,
            }
        );
        let rules = compile(FieldKind::Float, false, "@range: (0.5,1]").unwrap();
        assert!(matches!(
            rules[0].arg,
            RuleArg::Range { lo_inclusive: false, hi_inclusive: true, .. }
        ));
    }

    #[test]
    fn test_malformed_range_fails() {
        for bad in ["@range: 1,10", "@range: [1;10]", "@range: [a,10]", "@range: [1,10"] {
            let err = compile(FieldKind::Int32, false, bad).unwrap_err();
            assert!(matches!(err, GenError::MalformedRule { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_in_lists() {
        let rules = compile(FieldKind::String, false, r#"@in: ["a", "b"]"#).unwrap();
        assert_eq!(
            rules[0].arg,
            RuleArg::List(vec![r#""a""#.to_string(), r#""b""#.to_string()])
        );
        let rules = compile(FieldKind::Int32, false, "@not_in: [1,2,3]").unwrap();
        assert_eq!(rules[0].arg, RuleArg::List(vec!["1i32".into(), "2i32".into(), "3i32".into()]));
        assert!(compile(FieldKind::Int32, false, "@in: []").is_err());
    }

    #[test]
    fn test_incompatible_rules() {
        let cases = [
            (FieldKind::String, false, "@gt: 1"),
            (FieldKind::Int32, false, "@max_len: 3"),
            (FieldKind::String, false, "@min_items: 1"),
            (FieldKind::Int32, false, "@pattern: ^a$"),
            (FieldKind::Message, true, "@unique: true"),
            (FieldKind::Bool, false, "@range: [0,1]"),
        ];
        for (kind, repeated, comment) in cases {
            let err = compile(kind, repeated, comment).unwrap_err();
            assert!(matches!(err, GenError::IncompatibleRule { .. }), "{}", comment);
        }
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let err = compile(FieldKind::String, false, "@pattern: ([a-z]").unwrap_err();
        assert!(matches!(err, GenError::InvalidPattern { .. }));
    }

    #[test]
    fn test_unknown_keyword_strict_and_lenient() {
        let f = field(FieldKind::String, false, "@max_len: 3\n@shout: loud");
        let err = compile_field_rules("demo.v1.Req", &f, true).unwrap_err();
        assert!(matches!(err, GenError::UnknownRule { ref keyword, .. } if keyword == "shout"));

        let rules = compile_field_rules("demo.v1.Req", &f, false).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, RuleKind::MaxLen);
    }

    #[test]
    fn test_type_tags() {
        let rules = compile(FieldKind::String, true, "@type: email").unwrap();
        assert_eq!(rules[0].arg, RuleArg::Type(TypeTag::Email));
        assert!(compile(FieldKind::String, false, "@type: uuid").is_err());
    }

    #[test]
    fn test_failure_reasons() {
        let rules = compile(FieldKind::String, false, "@max_len: 3\n@prefix: \"ab\"").unwrap();
        assert_eq!(
            rules[0].failure_reason(FieldKind::String),
            "value length must be at most 3 runes"
        );
        assert_eq!(
            rules[1].failure_reason(FieldKind::String),
            "value does not have prefix ab"
        );
        let rules = compile(FieldKind::Bytes, false, "@len: 16").unwrap();
        assert_eq!(rules[0].failure_reason(FieldKind::Bytes), "value length must be 16 bytes");
    }

    #[test]
    fn test_rule_table_lookup() {
        let mut table = RuleTable::new();
        table.insert("demo.v1.Req", "name", compile(FieldKind::String, false, "@min_len: 1").unwrap());
        table.insert("demo.v1.Req", "empty", Vec::new());

        assert_eq!(table.get("demo.v1.Req", "name").len(), 1);
        assert!(table.get("demo.v1.Req", "empty").is_empty());
        assert_eq!(table.len(), 1);
    }
}
