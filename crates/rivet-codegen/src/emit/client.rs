//! Binary and JSON clients.

use super::{method_ident, CodeWriter, EmitContext};
use crate::error::Result;
use crate::naming::string_literal;
use crate::schema::MethodSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientFlavor {
    Binary,
    Json,
}

impl ClientFlavor {
    fn title(self) -> &'static str {
        match self {
            ClientFlavor::Binary => "Binary",
            ClientFlavor::Json => "JSON",
        }
    }

    fn type_suffix(self) -> &'static str {
        match self {
            ClientFlavor::Binary => "BinaryClient",
            ClientFlavor::Json => "JsonClient",
        }
    }

    fn request_fn(self) -> &'static str {
        match self {
            ClientFlavor::Binary => "do_binary_request",
            ClientFlavor::Json => "do_json_request",
        }
    }
}

/// Client method name. `new` is taken by the constructor.
pub fn client_method_ident(method: &MethodSchema) -> String {
    let ident = method_ident(method);
    if ident == "new" {
        "new_".to_string()
    } else {
        ident
    }
}

pub fn emit(cx: &EmitContext<'_>, flavor: ClientFlavor, w: &mut CodeWriter) -> Result<()> {
    let client = cx.client();
    let name = format!("{}{}", cx.service(), flavor.type_suffix());
    let count = cx.schema.methods.len();

    w.banner(&format!("{} {} Client", cx.service(), flavor.title()));

    w.line(format!(
        "/// {} client for the {} service.",
        flavor.title(),
        cx.service()
    ));
    w.open(format!("pub struct {}<C = {}::ReqwestClient> {{", name, client));
    w.line("transport: C,");
    w.line(format!("urls: [String; {}],", count));
    w.close("}");
    w.blank();

    w.open(format!("impl<C: {}::HttpClient> {}<C> {{", client, name));
    w.line("/// `base_url` is the server root, for example `http://127.0.0.1:8080`.");
    w.open("pub fn new(base_url: &str, transport: C) -> Self {");
    w.line("let base = base_url.trim_end_matches('/');");
    w.open("Self {");
    w.line("transport,");
    w.open("urls: [");
    for i in 0..count {
        w.line(format!("format!(\"{{}}{{}}\", base, {}[{}]),", cx.routes_const(), i));
    }
    w.close("],");
    w.close("}");
    w.close("}");

    for (i, method) in cx.schema.methods.iter().enumerate() {
        w.blank();
        w.doc(&method.comment);
        w.open(format!(
            "pub async fn {}(&self, ctx: {}::ClientContext, req: &{}) -> Result<{}, RpcError> {{",
            client_method_ident(method),
            client,
            cx.record_name(&method.input)?,
            cx.record_name(&method.output)?
        ));
        w.line(format!(
            "let ctx = ctx.with_route({}, {}, {});",
            string_literal(&cx.schema.package),
            string_literal(cx.service()),
            string_literal(&method.name)
        ));
        w.line(format!(
            "{}::{}(&self.transport, &ctx, &self.urls[{}], req).await",
            client,
            flavor.request_fn(),
            i
        ));
        w.close("}");
    }

    w.close("}");
    Ok(())
}
