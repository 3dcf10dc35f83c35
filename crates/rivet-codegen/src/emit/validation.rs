//! `Validate` implementations from compiled rules.
//!
//! Each field's checks run in a block where `v` is a reference to the value
//! (or, for repeated fields, to each element). Collection rules look at the
//! whole `Vec`. Message fields validate the embedded record after their own
//! rules.

use super::{field_ident, CodeWriter, EmitContext};
use crate::error::Result;
use crate::naming::string_literal;
use crate::rules::{Rule, RuleArg, RuleKind};
use crate::schema::{FieldKind, FieldSchema, RecordSchema};

pub fn emit(cx: &EmitContext<'_>, w: &mut CodeWriter) -> Result<()> {
    w.banner(&format!("{} Validation", cx.service()));

    for record in cx.schema.records.values() {
        emit_record(cx, record, w)?;
        w.blank();
    }
    Ok(())
}

fn emit_record(cx: &EmitContext<'_>, record: &RecordSchema, w: &mut CodeWriter) -> Result<()> {
    let name = cx.record_name(&record.name)?;

    w.open(format!("impl Validate for {} {{", name));
    w.open("fn validate(&self) -> Result<(), ValidationError> {");
    for field in &record.fields {
        let rules = cx.schema.rules.get(&record.name, &field.name);
        emit_field(cx, name, field, rules, w);
    }
    w.line("Ok(())");
    w.close("}");
    w.close("}");
    Ok(())
}

fn emit_field(cx: &EmitContext<'_>, record: &str, field: &FieldSchema, rules: &[Rule], w: &mut CodeWriter) {
    let ident = field_ident(field);
    let fail = |reason: String| {
        format!(
            "return Err(ValidationError::new({}, {}, {}));",
            string_literal(record),
            string_literal(&field.name),
            string_literal(&reason)
        )
    };

    let (collection, element): (Vec<&Rule>, Vec<&Rule>) = rules
        .iter()
        .partition(|rule| field.repeated && rule.kind.is_collection_rule());

    for rule in collection {
        if rule.kind == RuleKind::Unique {
            let key = if field.kind.is_float() { "v.to_bits()" } else { "v" };
            w.open("{");
            w.line("let mut seen = std::collections::HashSet::new();");
            w.open(format!("if !self.{}.iter().all(|v| seen.insert({})) {{", ident, key));
        } else {
            w.open(format!("if {} {{", collection_condition(rule, &ident)));
        }
        w.line(fail(rule.failure_reason(field.kind)));
        w.close("}");
        if rule.kind == RuleKind::Unique {
            w.close("}");
        }
    }

    if !element.is_empty() {
        if field.repeated {
            w.open(format!("for v in &self.{} {{", ident));
        } else {
            w.open("{");
            w.line(format!("let v = &self.{};", ident));
        }
        for (i, rule) in element.iter().enumerate() {
            if rule.kind == RuleKind::Pattern {
                w.line(format!(
                    "static PATTERN_{}: {}::validate::Pattern = {}::validate::Pattern::new({});",
                    i,
                    cx.common(),
                    cx.common(),
                    string_literal(&rule.display)
                ));
            }
            w.open(format!("if {} {{", element_condition(cx, rule, field.kind, i)));
            w.line(fail(rule.failure_reason(field.kind)));
            w.close("}");
        }
        w.close("}");
    }

    if field.kind == FieldKind::Message {
        let embedded = format!(
            "m.validate().map_err(|e| ValidationError::embedded({}, {}, e))?;",
            string_literal(record),
            string_literal(&field.name)
        );
        if field.repeated {
            w.open(format!("for m in &self.{} {{", ident));
        } else {
            w.open(format!("if let Some(m) = &self.{} {{", ident));
        }
        w.line(embedded);
        w.close("}");
    }
}

/// Failure condition of an item-count rule.
fn collection_condition(rule: &Rule, ident: &str) -> String {
    match (&rule.kind, &rule.arg) {
        (RuleKind::MinItems, RuleArg::Count(n)) => format!("self.{}.len() < {}", ident, n),
        (_, RuleArg::Count(n)) => format!("self.{}.len() > {}", ident, n),
        _ => "false".to_string(),
    }
}

/// Failure condition of a rule on one value `v`.
fn element_condition(cx: &EmitContext<'_>, rule: &Rule, kind: FieldKind, index: usize) -> String {
    let is_string = kind == FieldKind::String;
    let value = if is_string { "v.as_str()" } else { "*v" };
    let length = if is_string { "v.chars().count()" } else { "v.len()" };

    match &rule.arg {
        RuleArg::Literal(lit) => match rule.kind {
            RuleKind::Eq => format!("{} != {}", value, lit),
            RuleKind::Lt => format!("!({} < {})", value, lit),
            RuleKind::Lte => format!("!({} <= {})", value, lit),
            RuleKind::Gt => format!("!({} > {})", value, lit),
            _ => format!("!({} >= {})", value, lit),
        },
        RuleArg::Range {
            lo,
            lo_inclusive,
            hi,
            hi_inclusive,
        } => {
            let lo_op = if *lo_inclusive { ">=" } else { ">" };
            let hi_op = if *hi_inclusive { "<=" } else { "<" };
            format!("!(*v {} {} && *v {} {})", lo_op, lo, hi_op, hi)
        }
        RuleArg::List(items) => {
            let needle = if is_string { "&v.as_str()" } else { "v" };
            let contains = format!("[{}].contains({})", items.join(", "), needle);
            if rule.kind == RuleKind::In {
                format!("!{}", contains)
            } else {
                contains
            }
        }
        RuleArg::Count(n) => match rule.kind {
            RuleKind::Len => format!("{} != {}", length, n),
            RuleKind::MinLen => format!("{} < {}", length, n),
            _ => format!("{} > {}", length, n),
        },
        RuleArg::Text(text) => {
            let text = string_literal(text);
            match rule.kind {
                RuleKind::Pattern => format!("!PATTERN_{}.is_match(v)", index),
                RuleKind::Prefix => format!("!v.starts_with({})", text),
                RuleKind::Suffix => format!("!v.ends_with({})", text),
                RuleKind::Contains => format!("!v.contains({})", text),
                _ => format!("v.contains({})", text),
            }
        }
        RuleArg::Type(tag) => format!("!{}::validate::{}(v)", cx.common(), tag.checker()),
        RuleArg::Unique => "false".to_string(),
    }
}
