//! Curly-brace + JSX family adapter (TypeScript/JavaScript, with or without
//! JSX), spec §4.1.
//!
//! One adapter instance per flavor (TS uses `tree-sitter-typescript`'s TSX
//! grammar so JSX always parses; JS uses `tree-sitter-javascript`, which
//! already accepts JSX).

use super::{LanguageAdapter, ParseResult};
use crate::model::{
    ComponentDecl, ComponentKind, EndpointDecl, ExportDecl, ExportKind, ImportEdge, LanguageTag,
    OutlineEntry, Position, SymbolKind, SymbolNode,
};
use tree_sitter::{Node, Parser};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];
const FILE_ROUTE_NAMES: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

pub struct CurlyBraceAdapter {
    typescript: bool,
}

impl CurlyBraceAdapter {
    pub fn new(typescript: bool) -> Self {
        Self { typescript }
    }

    fn make_parser(&self) -> Option<Parser> {
        let mut parser = Parser::new();
        if self.typescript {
            parser
                .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
                .ok()?;
        } else {
            parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).ok()?;
        }
        Some(parser)
    }
}

impl LanguageAdapter for CurlyBraceAdapter {
    fn language(&self) -> LanguageTag {
        if self.typescript {
            LanguageTag::Typescript
        } else {
            LanguageTag::Javascript
        }
    }

    fn parse(&self, source: &str, _path: &str) -> ParseResult {
        let mut parser = match self.make_parser() {
            Some(p) => p,
            None => return ParseResult::default(),
        };
        let tree = match parser.parse(source, None) {
            Some(t) => t,
            None => return ParseResult::default(),
        };

        let mut result = ParseResult::default();
        let root = tree.root_node();

        collect_imports(root, source, &mut result.imports);
        collect_top_level(root, source, &mut result);
        result.outline = build_outline(&result.symbols);

        let has_view_import = result
            .imports
            .iter()
            .any(|i| i.module.contains("react") || i.module.contains("preact"));
        if has_view_import {
            result.ui_components = detect_components(root, source);
        }

        let has_server_import = result.imports.iter().any(|i| {
            ["express", "fastify", "koa", "hapi", "@hapi"]
                .iter()
                .any(|fw| i.module.contains(fw))
        });
        if has_server_import || result.exports.iter().any(|e| FILE_ROUTE_NAMES.contains(&e.name.as_str())) {
            result.api_endpoints = detect_endpoints(root, source, &result.exports, has_server_import);
        }

        result
    }
}

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn position(node: Node) -> Position {
    let start = node.start_position();
    let end = node.end_position();
    Position {
        line: start.row as u32 + 1,
        column: start.column as u32,
        end_line: end.row as u32 + 1,
        end_column: end.column as u32,
    }
}

fn leading_doc_comment(node: Node, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "comment" {
            let t = text(s, source);
            if t.starts_with("/**") || t.starts_with("//") {
                lines.push(t.trim_start_matches('/').trim_start_matches('*').trim().to_string());
                sibling = s.prev_sibling();
                continue;
            }
        }
        break;
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

// ---- imports -------------------------------------------------------------

fn collect_imports(root: Node, source: &str, out: &mut Vec<ImportEdge>) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        collect_imports_node(node, source, out);
    }
    find_dynamic_imports(root, source, out);
}

fn collect_imports_node(node: Node, source: &str, out: &mut Vec<ImportEdge>) {
    if node.kind() != "import_statement" {
        return;
    }
    let module = node
        .child_by_field_name("source")
        .map(|s| strip_quotes(text(s, source)))
        .unwrap_or_default();

    let mut edge = ImportEdge {
        module,
        names: Vec::new(),
        default_import: false,
        alias: None,
    };

    if let Some(clause) = find_child_kind(node, "import_clause") {
        let mut ccursor = clause.walk();
        for part in clause.children(&mut ccursor) {
            match part.kind() {
                "identifier" => {
                    edge.default_import = true;
                    edge.names.push(text(part, source).to_string());
                }
                "namespace_import" => {
                    if let Some(ident) = part.children(&mut part.walk()).find(|c| c.kind() == "identifier") {
                        edge.alias = Some(text(ident, source).to_string());
                    }
                }
                "named_imports" => {
                    let mut ncursor = part.walk();
                    for spec in part.children(&mut ncursor) {
                        if spec.kind() == "import_specifier" {
                            let name = spec.child_by_field_name("name").map(|n| text(n, source).to_string());
                            let alias = spec.child_by_field_name("alias").map(|n| text(n, source).to_string());
                            if let Some(name) = name {
                                match alias {
                                    Some(a) => edge.names.push(format!("{name} as {a}")),
                                    None => edge.names.push(name),
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    out.push(edge);
}

fn find_dynamic_imports(node: Node, source: &str, out: &mut Vec<ImportEdge>) {
    walk(node, &mut |n| {
        if n.kind() == "call_expression" {
            if let Some(func) = n.child_by_field_name("function") {
                if func.kind() == "import" {
                    if let Some(args) = n.child_by_field_name("arguments") {
                        if let Some(arg) = args.named_child(0) {
                            if arg.kind() == "string" {
                                out.push(ImportEdge {
                                    module: strip_quotes(text(arg, source)),
                                    names: vec!["dynamic".to_string()],
                                    default_import: false,
                                    alias: None,
                                });
                            }
                            // Non-literal dynamic import arguments are ignored (spec §8).
                        }
                    }
                }
            }
        }
        true
    });
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches(|c| c == '\'' || c == '"' || c == '`').to_string()
}

fn find_child_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

fn walk<F: FnMut(Node) -> bool>(node: Node, f: &mut F) {
    if !f(node) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

// ---- top-level exports + symbols -----------------------------------------

fn collect_top_level(root: Node, source: &str, result: &mut ParseResult) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        match node.kind() {
            "export_statement" => handle_export_statement(node, source, result),
            _ => {
                if let Some(sym) = symbol_from_declaration(node, source, None) {
                    result.symbols.push(sym);
                }
            }
        }
    }
}

fn handle_export_statement(node: Node, source: &str, result: &mut ParseResult) {
    let is_default = find_child_kind(node, "default").is_some()
        || node.children(&mut node.walk()).any(|c| text(c, source) == "default");

    if let Some(decl) = node.child_by_field_name("declaration") {
        if let Some(mut sym) = symbol_from_declaration(decl, source, None) {
            let kind = export_kind_for(decl.kind());
            result.exports.push(ExportDecl {
                name: if is_default { "default".to_string() } else { sym.name.clone() },
                kind: if is_default { ExportKind::Default } else { kind },
                line: position(node).line,
                signature: sym.signature.clone(),
            });
            if is_default {
                sym.name = if sym.name.is_empty() { "default".to_string() } else { sym.name };
            }
            result.symbols.push(sym);
        }
        return;
    }

    // Re-export: `export { a, b as c } from './mod'` or `export * from './mod'`.
    if let Some(clause) = find_child_kind(node, "export_clause") {
        let mut cursor = clause.walk();
        for spec in clause.children(&mut cursor) {
            if spec.kind() == "export_specifier" {
                let name = spec.child_by_field_name("name").map(|n| text(n, source).to_string());
                let alias = spec.child_by_field_name("alias").map(|n| text(n, source).to_string());
                if let Some(name) = name {
                    result.exports.push(ExportDecl {
                        name: alias.unwrap_or(name),
                        kind: ExportKind::Const,
                        line: position(node).line,
                        signature: None,
                    });
                }
            }
        }
    }
}

fn export_kind_for(kind: &str) -> ExportKind {
    match kind {
        "function_declaration" | "generator_function_declaration" => ExportKind::Function,
        "class_declaration" => ExportKind::Class,
        "interface_declaration" => ExportKind::Interface,
        "type_alias_declaration" => ExportKind::Type,
        "enum_declaration" => ExportKind::Type,
        "lexical_declaration" => ExportKind::Const,
        "variable_declaration" => ExportKind::Var,
        _ => ExportKind::Const,
    }
}

fn symbol_from_declaration(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => build_function(node, source, parent),
        "class_declaration" => build_class(node, source, parent),
        "interface_declaration" => build_interface(node, source, parent),
        "enum_declaration" => build_enum(node, source, parent),
        "type_alias_declaration" => build_type_alias(node, source, parent),
        "lexical_declaration" | "variable_declaration" => build_variable(node, source, parent),
        _ => None,
    }
}

fn build_function(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let params = node.child_by_field_name("parameters").map(|p| text(p, source)).unwrap_or("()");
    let ret = node
        .child_by_field_name("return_type")
        .map(|r| format!(": {}", text(r, source).trim_start_matches(':').trim()))
        .unwrap_or_default();

    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Function, position(node));
    sym.signature = Some(format!("{}{}{}", sym.name, params, ret));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let calls = collect_calls(body, source);
        for c in calls {
            sym.push_call(c);
        }
    }

    Some(sym)
}

fn build_class(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Class, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_definition" => {
                    if let Some(mname) = member.child_by_field_name("name") {
                        let kind = if text(mname, source) == "constructor" {
                            SymbolKind::Constructor
                        } else {
                            SymbolKind::Method
                        };
                        let params = member.child_by_field_name("parameters").map(|p| text(p, source)).unwrap_or("()");
                        let mut msym = SymbolNode::new(text(mname, source), kind, position(member));
                        msym.signature = Some(format!("{}{}", msym.name, params));
                        msym.parent = Some(sym.name.clone());
                        if let Some(mbody) = member.child_by_field_name("body") {
                            for c in collect_calls(mbody, source) {
                                msym.push_call(c);
                            }
                        }
                        sym.children.push(msym);
                    }
                }
                "public_field_definition" | "field_definition" => {
                    if let Some(pname) = member.child_by_field_name("name") {
                        let mut psym = SymbolNode::new(text(pname, source), SymbolKind::Property, position(member));
                        psym.parent = Some(sym.name.clone());
                        sym.children.push(psym);
                    }
                }
                _ => {}
            }
        }
    }

    Some(sym)
}

fn build_interface(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Interface, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_signature" => {
                    if let Some(mname) = member.child_by_field_name("name") {
                        let mut msym = SymbolNode::new(text(mname, source), SymbolKind::Method, position(member));
                        msym.parent = Some(sym.name.clone());
                        sym.children.push(msym);
                    }
                }
                "property_signature" => {
                    if let Some(pname) = member.child_by_field_name("name") {
                        let mut psym = SymbolNode::new(text(pname, source), SymbolKind::Property, position(member));
                        psym.parent = Some(sym.name.clone());
                        sym.children.push(psym);
                    }
                }
                _ => {}
            }
        }
    }

    Some(sym)
}

fn build_enum(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Enum, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "property_identifier" || member.kind() == "enum_assignment" {
                let name_node = if member.kind() == "enum_assignment" {
                    member.child(0)
                } else {
                    Some(member)
                };
                if let Some(n) = name_node {
                    let mut msym = SymbolNode::new(text(n, source), SymbolKind::EnumMember, position(member));
                    msym.parent = Some(sym.name.clone());
                    sym.children.push(msym);
                }
            }
        }
    }

    Some(sym)
}

fn build_type_alias(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::TypeAlias, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());
    Some(sym)
}

fn build_variable(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let keyword = node.child(0).map(|c| text(c, source)).unwrap_or("var");
    let kind = if keyword == "const" { SymbolKind::Constant } else { SymbolKind::Variable };

    let mut cursor = node.walk();
    let declarator = node.children(&mut cursor).find(|c| c.kind() == "variable_declarator")?;
    let name_node = declarator.child_by_field_name("name")?;

    let mut sym = SymbolNode::new(text(name_node, source), kind, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());
    Some(sym)
}

// ---- calls -----------------------------------------------------------

fn collect_calls(body: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    collect_calls_inner(body, body, source, &mut out);
    out
}

fn collect_calls_inner(node: Node, scope_root: Node, source: &str, out: &mut Vec<String>) {
    if node != scope_root
        && matches!(
            node.kind(),
            "function_declaration" | "function" | "generator_function_declaration"
        )
    {
        return;
    }

    match node.kind() {
        "call_expression" => {
            if let Some(func) = node.child_by_field_name("function") {
                if let Some(name) = call_name(func, source) {
                    out.push(name);
                }
            }
        }
        "new_expression" => {
            if let Some(ctor) = node.child_by_field_name("constructor") {
                out.push(text(ctor, source).to_string());
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls_inner(child, scope_root, source, out);
    }
}

fn call_name(func: Node, source: &str) -> Option<String> {
    match func.kind() {
        "identifier" => Some(text(func, source).to_string()),
        "member_expression" => {
            let prop = func.child_by_field_name("property")?;
            let method = text(prop, source).to_string();
            let object = func.child_by_field_name("object")?;
            if object.kind() == "this" {
                Some(method)
            } else {
                Some(format!("{}.{}", text(object, source), method))
            }
        }
        _ => None,
    }
}

// ---- outline -----------------------------------------------------------

fn build_outline(symbols: &[SymbolNode]) -> Vec<OutlineEntry> {
    let mut out = Vec::new();
    fn walk_outline(sym: &SymbolNode, level: u32, out: &mut Vec<OutlineEntry>) {
        out.push(OutlineEntry {
            title: sym.name.clone(),
            level,
            line: sym.position.line,
        });
        for child in &sym.children {
            walk_outline(child, level + 1, out);
        }
    }
    for sym in symbols {
        walk_outline(sym, 0, &mut out);
    }
    out.sort_by_key(|e| e.line);
    out
}

// ---- view-framework detection -------------------------------------------

fn detect_components(root: Node, source: &str) -> Vec<ComponentDecl> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        let inner = if node.kind() == "export_statement" {
            node.child_by_field_name("declaration").unwrap_or(node)
        } else {
            node
        };

        match inner.kind() {
            "function_declaration" => {
                if let Some(name_node) = inner.child_by_field_name("name") {
                    let name = text(name_node, source).to_string();
                    if starts_uppercase(&name) || returns_jsx(inner) {
                        let hooks = inner
                            .child_by_field_name("body")
                            .map(|b| detect_hooks(b, source))
                            .unwrap_or_default();
                        out.push(ComponentDecl {
                            name,
                            kind: ComponentKind::Functional,
                            line: position(inner).line,
                            hooks,
                            wraps: None,
                        });
                    }
                }
            }
            "class_declaration" => {
                if let Some(name_node) = inner.child_by_field_name("name") {
                    if let Some(heritage) = find_child_kind(inner, "class_heritage") {
                        let text_h = text(heritage, source);
                        if text_h.contains("Component") || text_h.contains("PureComponent") {
                            out.push(ComponentDecl {
                                name: text(name_node, source).to_string(),
                                kind: ComponentKind::Class,
                                line: position(inner).line,
                                hooks: Vec::new(),
                                wraps: None,
                            });
                        }
                    }
                }
            }
            "lexical_declaration" => {
                let mut dcursor = inner.walk();
                for declarator in inner.children(&mut dcursor).filter(|c| c.kind() == "variable_declarator") {
                    let (Some(name_node), Some(value)) = (
                        declarator.child_by_field_name("name"),
                        declarator.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    if value.kind() != "call_expression" {
                        continue;
                    }
                    let Some(callee) = value.child_by_field_name("function") else { continue };
                    let callee_name = text(callee, source);
                    let var_name = text(name_node, source).to_string();

                    match callee_name {
                        "forwardRef" => out.push(ComponentDecl {
                            name: var_name,
                            kind: ComponentKind::ForwardRef,
                            line: position(declarator).line,
                            hooks: Vec::new(),
                            wraps: None,
                        }),
                        "memo" => out.push(ComponentDecl {
                            name: var_name,
                            kind: ComponentKind::Memo,
                            line: position(declarator).line,
                            hooks: Vec::new(),
                            wraps: None,
                        }),
                        other if other.starts_with("with") && starts_uppercase(&other[4..]) => {
                            let inner_name = value
                                .child_by_field_name("arguments")
                                .and_then(|a| a.named_child(0))
                                .map(|a| text(a, source).to_string());
                            out.push(ComponentDecl {
                                name: var_name,
                                kind: ComponentKind::HigherOrder,
                                line: position(declarator).line,
                                hooks: Vec::new(),
                                wraps: inner_name,
                            });
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

fn returns_jsx(fn_node: Node) -> bool {
    let mut found = false;
    if let Some(body) = fn_node.child_by_field_name("body") {
        walk(body, &mut |n| {
            if n.kind() == "return_statement" {
                let mut c = n.walk();
                if n.children(&mut c).any(|ch| matches!(ch.kind(), "jsx_element" | "jsx_self_closing_element" | "jsx_fragment")) {
                    found = true;
                }
            }
            !found
        });
    }
    found
}

fn detect_hooks(body: Node, source: &str) -> Vec<String> {
    let mut hooks = Vec::new();
    walk(body, &mut |n| {
        if n.kind() == "call_expression" {
            if let Some(func) = n.child_by_field_name("function") {
                if func.kind() == "identifier" {
                    let name = text(func, source);
                    if name.starts_with("use") && name.len() > 3 {
                        hooks.push(name.to_string());
                    }
                }
            }
        }
        true
    });
    hooks.sort();
    hooks.dedup();
    hooks
}

// ---- HTTP endpoint detection ---------------------------------------------

fn detect_endpoints(root: Node, source: &str, exports: &[ExportDecl], has_server_import: bool) -> Vec<EndpointDecl> {
    let mut out = Vec::new();

    if has_server_import {
        walk(root, &mut |n| {
            if n.kind() == "call_expression" {
                if let Some(func) = n.child_by_field_name("function") {
                    if func.kind() == "member_expression" {
                        let method_node = func.child_by_field_name("property");
                        let receiver_node = func.child_by_field_name("object");
                        if let (Some(method_node), Some(receiver_node)) = (method_node, receiver_node) {
                            let method_name = text(method_node, source).to_lowercase();
                            if HTTP_METHODS.contains(&method_name.as_str()) {
                                let receiver = text(receiver_node, source);
                                if matches!(receiver, "router" | "app" | "server") {
                                    if let Some(args) = n.child_by_field_name("arguments") {
                                        let path = args.named_child(0).filter(|a| a.kind() == "string").map(|a| strip_quotes(text(a, source)));
                                        let handler = args
                                            .named_child(1)
                                            .map(|h| handler_label(h, source))
                                            .unwrap_or_else(|| "anonymous".to_string());
                                        out.push(EndpointDecl {
                                            method: method_name.to_uppercase(),
                                            path,
                                            handler,
                                            line: position(n).line,
                                            framework: infer_framework(n, source),
                                            middleware: Vec::new(),
                                        });
                                    }
                                }
                            }
                        }
                    }
                }
            }
            true
        });
    }

    for export in exports {
        if FILE_ROUTE_NAMES.contains(&export.name.as_str()) {
            out.push(EndpointDecl {
                method: export.name.clone(),
                path: None,
                handler: export.name.clone(),
                line: export.line,
                framework: None,
                middleware: Vec::new(),
            });
        }
    }

    out
}

fn handler_label(node: Node, source: &str) -> String {
    match node.kind() {
        "identifier" => text(node, source).to_string(),
        "arrow_function" | "function" => {
            let params = node.child_by_field_name("parameters").map(|p| text(p, source)).unwrap_or("()");
            if params.contains("ctx") {
                format!("anonymous({params})")
            } else {
                format!("anonymous{params}")
            }
        }
        _ => "anonymous".to_string(),
    }
}

fn infer_framework(call: Node, source: &str) -> Option<String> {
    if let Some(func) = call.child_by_field_name("function") {
        if let Some(receiver) = func.child_by_field_name("object") {
            let params_hint = call
                .child_by_field_name("arguments")
                .and_then(|a| a.named_child(1))
                .and_then(|h| h.child_by_field_name("parameters"))
                .map(|p| text(p, source).to_string())
                .unwrap_or_default();
            if params_hint.contains("ctx") {
                return Some("koa".to_string());
            }
            if params_hint.contains("reply") {
                return Some("fastify".to_string());
            }
            if params_hint.contains("req") && params_hint.contains("res") {
                return Some("express".to_string());
            }
            let _ = receiver;
        }
    }
    Some("express".to_string())
}
