//! Records, route constants and the service trait.

use super::{doc_text, field_ident, method_ident, CodeWriter, EmitContext};
use crate::error::Result;
use crate::naming::string_literal;
use crate::schema::RecordSchema;

pub fn emit(cx: &EmitContext<'_>, w: &mut CodeWriter) -> Result<()> {
    w.banner(&format!("{} Interface", cx.service()));

    for record in cx.schema.records.values() {
        emit_record(cx, record, w)?;
        w.blank();
    }

    emit_routes(cx, w);
    w.blank();
    emit_trait(cx, w)
}

fn emit_record(cx: &EmitContext<'_>, record: &RecordSchema, w: &mut CodeWriter) -> Result<()> {
    let common = cx.common();
    w.line(format!(
        "#[derive(Debug, Clone, Default, PartialEq, {0}::serde::Serialize, {0}::serde::Deserialize)]",
        common
    ));
    w.line(format!("#[serde(crate = \"{}::serde\", default)]", common));
    w.open(format!("pub struct {} {{", cx.record_name(&record.name)?));

    for field in &record.fields {
        w.doc(&doc_text(&field.comment));
        let ident = field_ident(field);
        if ident.trim_start_matches("r#") != field.name {
            w.line(format!("#[serde(rename = {})]", string_literal(&field.name)));
        }
        w.line(format!("pub {}: {},", ident, cx.field_type(field)?));
    }

    w.close("}");
    Ok(())
}

fn emit_routes(cx: &EmitContext<'_>, w: &mut CodeWriter) {
    let routes = cx.schema.routes();

    w.line(format!("/// Path prefix of the {} service.", cx.service()));
    w.line(format!(
        "pub const {}: &str = {};",
        cx.prefix_const(),
        string_literal(&cx.schema.path_prefix())
    ));
    w.blank();
    w.line("/// Route paths, one per method in declaration order.");
    w.open(format!("pub const {}: [&str; {}] = [", cx.routes_const(), routes.len()));
    for route in &routes {
        w.line(format!("{},", string_literal(route)));
    }
    w.close("];");
}

fn emit_trait(cx: &EmitContext<'_>, w: &mut CodeWriter) -> Result<()> {
    w.doc(&cx.schema.comment);
    w.line(format!("#[{}::async_trait]", cx.server()));
    w.open(format!("pub trait {}: Send + Sync + 'static {{", cx.service()));

    for (i, method) in cx.schema.methods.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        w.doc(&method.comment);
        w.line(format!(
            "async fn {}(&self, ctx: &mut CallContext, req: {}) -> Result<Reply<{}>, BoxError>;",
            method_ident(method),
            cx.record_name(&method.input)?,
            cx.record_name(&method.output)?
        ));
    }

    w.close("}");
    Ok(())
}
