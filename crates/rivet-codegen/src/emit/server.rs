//! Server handler: routing, content negotiation and the hook lifecycle.
//!
//! The generated server only stamps routing data into the call context and
//! decodes the input. Every shared stage is a call into
//! `rivet_server::pipeline`.

use super::{field_ident, method_ident, CodeWriter, EmitContext};
use crate::error::Result;
use crate::naming::{string_literal, to_snake_case};
use crate::schema::MethodSchema;

pub fn emit(cx: &EmitContext<'_>, w: &mut CodeWriter) -> Result<()> {
    let svc = cx.service();
    let name = format!("{}Server", svc);

    w.banner(&format!("{} Server Handler", svc));

    w.line(format!("/// Serves a [`{}`] implementation over HTTP.", svc));
    w.open(format!("pub struct {}<S> {{", name));
    w.line("service: S,");
    w.line("hooks: ServerHooks,");
    w.close("}");
    w.blank();

    w.open(format!("impl<S: {}> {}<S> {{", svc, name));
    w.open("pub fn new(service: S) -> Self {");
    w.open("Self {");
    w.line("service,");
    w.line("hooks: ServerHooks::default(),");
    w.close("}");
    w.close("}");
    w.blank();
    w.open("pub fn with_hooks(mut self, hooks: ServerHooks) -> Self {");
    w.line("self.hooks = hooks;");
    w.line("self");
    w.close("}");
    w.blank();
    w.open("pub fn routes(&self) -> &'static [&'static str] {");
    w.line(format!("&{}", cx.routes_const()));
    w.close("}");

    for method in &cx.schema.methods {
        w.blank();
        emit_serve_method(cx, method, w)?;
    }
    w.close("}");
    w.blank();

    emit_dispatch(cx, w);
    w.blank();

    for fqn in cx.schema.input_records() {
        emit_from_form(cx, fqn, w)?;
        w.blank();
    }

    Ok(())
}

fn emit_serve_method(cx: &EmitContext<'_>, method: &MethodSchema, w: &mut CodeWriter) -> Result<()> {
    let input = cx.record_name(&method.input)?;
    let option = match &method.option {
        Some(option) => format!("Some({})", string_literal(option)),
        None => "None".to_string(),
    };

    w.open(format!(
        "async fn serve_{}(&self, mut ctx: CallContext, req: RpcRequest) -> Handled {{",
        to_snake_case(&method.name)
    ));
    w.line(format!("ctx.set_method({}, {});", string_literal(&method.name), option));
    w.open("if let Err(err) = pipeline::route(&self.hooks, &mut ctx) {");
    w.line("return pipeline::write_error(&self.hooks, &mut ctx, err);");
    w.close("}");
    w.blank();

    w.line("let encoding = Encoding::from_content_type(ctx.content_type());");
    w.open("let decoded = match encoding {");
    w.line(format!(
        "Encoding::Json => JsonCodec::decode::<{}>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),",
        input
    ));
    w.line(format!(
        "Encoding::Binary => BinaryCodec::decode::<{}>(req.body()).map_err(|err| pipeline::decode_error(encoding, err)),",
        input
    ));
    w.line(format!(
        "Encoding::Form => {}::from_form(&FormValues::from_request(&req)),",
        input
    ));
    w.close("};");
    w.open("let input = match decoded {");
    w.line("Ok(input) => input,");
    w.line("Err(err) => return pipeline::write_error(&self.hooks, &mut ctx, err),");
    w.close("};");

    if cx.config.emit_validation {
        w.open("if let Err(err) = input.validate() {");
        w.line("return pipeline::write_error(&self.hooks, &mut ctx, err.into());");
        w.close("}");
    }
    w.blank();

    w.line(format!(
        "let outcome = pipeline::invoke(self.service.{}(&mut ctx, input)).await;",
        method_ident(method)
    ));
    w.line("pipeline::finish(&self.hooks, &mut ctx, encoding, outcome)");
    w.close("}");
    Ok(())
}

fn emit_dispatch(cx: &EmitContext<'_>, w: &mut CodeWriter) {
    let svc = cx.service();
    let server = cx.server();

    w.line(format!("#[{}::async_trait]", server));
    w.open(format!(
        "impl<S: {}> {}::RpcServer for {}Server<S> {{",
        svc, server, svc
    ));
    w.open("fn path_prefix(&self) -> &'static str {");
    w.line(cx.prefix_const());
    w.close("}");
    w.blank();
    w.open("fn routes(&self) -> &'static [&'static str] {");
    w.line(format!("&{}", cx.routes_const()));
    w.close("}");
    w.blank();

    w.open("async fn handle(&self, req: RpcRequest) -> Handled {");
    w.line(format!(
        "let mut ctx = CallContext::from_request(&req).with_service({}, {});",
        string_literal(&cx.schema.package),
        string_literal(svc)
    ));
    w.open("if let Err(err) = pipeline::receive(&self.hooks, &mut ctx) {");
    w.line("return pipeline::write_error(&self.hooks, &mut ctx, err);");
    w.close("}");
    w.blank();
    w.line("let path = ctx.path().to_string();");
    w.open("match path.as_str() {");
    for (method, route) in cx.schema.methods.iter().zip(cx.schema.routes()) {
        w.line(format!(
            "{} => self.serve_{}(ctx, req).await,",
            string_literal(&route),
            to_snake_case(&method.name)
        ));
    }
    w.open("_ => {");
    w.line("let err = pipeline::bad_route(&ctx);");
    w.line("pipeline::write_error(&self.hooks, &mut ctx, err)");
    w.close("}");
    w.close("}");
    w.close("}");
    w.close("}");
}

fn emit_from_form(cx: &EmitContext<'_>, fqn: &str, w: &mut CodeWriter) -> Result<()> {
    let name = cx.record_name(fqn)?;
    let bindable: Vec<_> = cx
        .schema
        .record(fqn)
        .map(|r| r.fields.iter().filter(|f| f.kind.is_form_bindable()).collect())
        .unwrap_or_default();

    w.open(format!("impl FromForm for {} {{", name));
    if bindable.is_empty() {
        w.open("fn from_form(_form: &FormValues) -> Result<Self, RpcError> {");
        w.line("Ok(Self::default())");
        w.close("}");
    } else {
        w.open("fn from_form(form: &FormValues) -> Result<Self, RpcError> {");
        w.line("let mut record = Self::default();");
        for field in bindable {
            let bind = if field.repeated { "bind_repeated" } else { "bind" };
            w.line(format!(
                "form.{}({}, &mut record.{})?;",
                bind,
                string_literal(&field.name),
                field_ident(field)
            ));
        }
        w.line("Ok(record)");
        w.close("}");
    }
    w.close("}");
    Ok(())
}
