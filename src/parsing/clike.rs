//! C-like systems family adapter (Go), spec §4.1.

use super::{LanguageAdapter, ParseResult};
use crate::model::{ExportDecl, ExportKind, ImportEdge, OutlineEntry, LanguageTag, Position, SymbolKind, SymbolNode};
use tree_sitter::{Node, Parser};

pub struct CLikeAdapter;

impl CLikeAdapter {
    pub fn new() -> Self {
        Self
    }

    fn make_parser() -> Option<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_go::LANGUAGE.into()).ok()?;
        Some(parser)
    }
}

impl Default for CLikeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for CLikeAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::Go
    }

    fn parse(&self, source: &str, _path: &str) -> ParseResult {
        let mut parser = match Self::make_parser() {
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
        collect_symbols_and_exports(root, source, &mut result);
        result.outline = build_outline(&result.symbols);
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

fn is_exported_name(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn leading_doc_comment(node: Node, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "comment" {
            let t = text(s, source);
            lines.push(t.trim_start_matches('/').trim().to_string());
            sibling = s.prev_sibling();
            continue;
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

// ---- imports -----------------------------------------------------------

fn collect_imports(root: Node, source: &str, out: &mut Vec<ImportEdge>) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        if node.kind() != "import_declaration" {
            continue;
        }
        let mut icursor = node.walk();
        for child in node.children(&mut icursor) {
            collect_import_spec(child, source, out);
        }
    }
}

fn collect_import_spec(node: Node, source: &str, out: &mut Vec<ImportEdge>) {
    match node.kind() {
        "import_spec" => {
            let path_node = node.child_by_field_name("path");
            let name_node = node.child_by_field_name("name");
            if let Some(path_node) = path_node {
                let module = strip_quotes(text(path_node, source));
                let alias = name_node.map(|n| text(n, source).to_string());
                let default_import = alias.as_deref() == Some("_");
                out.push(ImportEdge {
                    module,
                    names: Vec::new(),
                    default_import,
                    alias: alias.filter(|a| a != "." && a != "_"),
                });
            }
        }
        "import_spec_list" => {
            let mut cursor = node.walk();
            for spec in node.children(&mut cursor) {
                collect_import_spec(spec, source, out);
            }
        }
        _ => {}
    }
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches('"').to_string()
}

// ---- symbols + exports ---------------------------------------------------

fn collect_symbols_and_exports(root: Node, source: &str, result: &mut ParseResult) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        match node.kind() {
            "function_declaration" => {
                if let Some(sym) = build_function(node, source) {
                    if is_exported_name(&sym.name) {
                        result.exports.push(ExportDecl {
                            name: sym.name.clone(),
                            kind: ExportKind::Function,
                            line: sym.position.line,
                            signature: sym.signature.clone(),
                        });
                    }
                    result.symbols.push(sym);
                }
            }
            "method_declaration" => {
                if let Some(sym) = build_method(node, source) {
                    if is_exported_name(&sym.name) {
                        result.exports.push(ExportDecl {
                            name: sym.name.clone(),
                            kind: ExportKind::Function,
                            line: sym.position.line,
                            signature: sym.signature.clone(),
                        });
                    }
                    result.symbols.push(sym);
                }
            }
            "type_declaration" => {
                let mut tcursor = node.walk();
                for spec in node.children(&mut tcursor) {
                    if spec.kind() == "type_spec" {
                        if let Some(sym) = build_type_spec(spec, source) {
                            if is_exported_name(&sym.name) {
                                result.exports.push(ExportDecl {
                                    name: sym.name.clone(),
                                    kind: ExportKind::Type,
                                    line: sym.position.line,
                                    signature: None,
                                });
                            }
                            result.symbols.push(sym);
                        }
                    }
                }
            }
            "const_declaration" | "var_declaration" => {
                let kind = if node.kind() == "const_declaration" { SymbolKind::Constant } else { SymbolKind::Variable };
                for sym in build_decl_group(node, source, kind) {
                    if is_exported_name(&sym.name) {
                        result.exports.push(ExportDecl {
                            name: sym.name.clone(),
                            kind: if kind == SymbolKind::Constant { ExportKind::Const } else { ExportKind::Var },
                            line: sym.position.line,
                            signature: None,
                        });
                    }
                    result.symbols.push(sym);
                }
            }
            _ => {}
        }
    }
}

fn build_function(node: Node, source: &str) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let params = node.child_by_field_name("parameters").map(|p| text(p, source)).unwrap_or("()");
    let result_ty = node.child_by_field_name("result").map(|r| format!(" {}", text(r, source))).unwrap_or_default();

    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Function, position(node));
    sym.signature = Some(format!("func {}{}{}", sym.name, params, result_ty));
    sym.docstring = leading_doc_comment(node, source);

    if let Some(body) = node.child_by_field_name("body") {
        for c in collect_calls(body, source) {
            sym.push_call(c);
        }
    }

    Some(sym)
}

fn build_method(node: Node, source: &str) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let receiver = node.child_by_field_name("receiver").map(|r| text(r, source).to_string());
    let params = node.child_by_field_name("parameters").map(|p| text(p, source)).unwrap_or("()");

    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Method, position(node));
    sym.signature = Some(format!("func {}{}", sym.name, params));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = receiver.map(|r| receiver_type_name(&r));

    if let Some(body) = node.child_by_field_name("body") {
        for c in collect_calls(body, source) {
            sym.push_call(c);
        }
    }

    Some(sym)
}

/// Strip a receiver parameter's pointer star and binding name, leaving the
/// bare type (`(w *Widget)` -> `Widget`).
fn receiver_type_name(receiver_text: &str) -> String {
    let inner = receiver_text.trim_matches(|c| c == '(' || c == ')');
    let ty = inner.split_whitespace().last().unwrap_or(inner);
    ty.trim_start_matches('*').to_string()
}

fn build_type_spec(node: Node, source: &str) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let ty = node.child_by_field_name("type")?;

    let kind = match ty.kind() {
        "struct_type" => SymbolKind::Struct,
        "interface_type" => SymbolKind::Interface,
        _ => SymbolKind::TypeAlias,
    };

    let mut sym = SymbolNode::new(text(name_node, source), kind, position(node));
    sym.docstring = leading_doc_comment(node, source);

    match ty.kind() {
        "struct_type" => {
            if let Some(field_list) = find_child_kind(ty, "field_declaration_list") {
                let mut fcursor = field_list.walk();
                for field in field_list.children(&mut fcursor) {
                    if field.kind() == "field_declaration" {
                        if let Some(fname) = field.child_by_field_name("name") {
                            let mut fsym = SymbolNode::new(text(fname, source), SymbolKind::Field, position(field));
                            fsym.parent = Some(sym.name.clone());
                            sym.children.push(fsym);
                        }
                    }
                }
            }
        }
        "interface_type" => {
            let mut icursor = ty.walk();
            for member in ty.children(&mut icursor) {
                if member.kind() == "method_elem" {
                    if let Some(mname) = member.child_by_field_name("name") {
                        let mut msym = SymbolNode::new(text(mname, source), SymbolKind::Method, position(member));
                        msym.parent = Some(sym.name.clone());
                        sym.children.push(msym);
                    }
                }
            }
        }
        _ => {}
    }

    Some(sym)
}

fn build_decl_group(node: Node, source: &str, kind: SymbolKind) -> Vec<SymbolNode> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for spec in node.children(&mut cursor) {
        if spec.kind() == "const_spec" || spec.kind() == "var_spec" {
            let mut ncursor = spec.walk();
            for child in spec.children(&mut ncursor) {
                if child.kind() == "identifier" {
                    out.push(SymbolNode::new(text(child, source), kind, position(spec)));
                }
            }
        }
    }
    out
}

fn find_child_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

// ---- calls -------------------------------------------------------------

fn collect_calls(body: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    collect_calls_inner(body, body, source, &mut out);
    out
}

fn collect_calls_inner(node: Node, scope_root: Node, source: &str, out: &mut Vec<String>) {
    if node != scope_root && matches!(node.kind(), "function_declaration" | "func_literal") {
        return;
    }

    if node.kind() == "call_expression" {
        if let Some(func) = node.child_by_field_name("function") {
            if let Some(name) = call_name(func, source) {
                out.push(name);
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls_inner(child, scope_root, source, out);
    }
}

fn call_name(func: Node, source: &str) -> Option<String> {
    match func.kind() {
        "identifier" => Some(text(func, source).to_string()),
        "selector_expression" => {
            let field = func.child_by_field_name("field")?;
            let operand = func.child_by_field_name("operand")?;
            Some(format!("{}.{}", text(operand, source), text(field, source)))
        }
        _ => None,
    }
}

// ---- outline -------------------------------------------------------------

fn build_outline(symbols: &[SymbolNode]) -> Vec<OutlineEntry> {
    let mut out = Vec::new();
    fn walk(sym: &SymbolNode, level: u32, out: &mut Vec<OutlineEntry>) {
        out.push(OutlineEntry {
            title: sym.name.clone(),
            level,
            line: sym.position.line,
        });
        for child in &sym.children {
            walk(child, level + 1, out);
        }
    }
    for sym in symbols {
        walk(sym, 0, &mut out);
    }
    out.sort_by_key(|e| e.line);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_function_by_case_convention() {
        let adapter = CLikeAdapter::new();
        let src = "package main\n\nimport \"fmt\"\n\nfunc Greet(name string) string {\n\treturn fmt.Sprintf(\"hi %s\", name)\n}\n\nfunc helper() {}\n";
        let result = adapter.parse(src, "main.go");

        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].module, "fmt");

        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "Greet");
        assert_eq!(result.symbols[0].calls, vec!["fmt.Sprintf".to_string()]);
    }

    #[test]
    fn method_parent_is_bare_receiver_type() {
        let adapter = CLikeAdapter::new();
        let src = "package main\n\ntype Widget struct {\n\tName string\n}\n\nfunc (w *Widget) Render() string {\n\treturn w.Name\n}\n";
        let result = adapter.parse(src, "widget.go");

        let method = result.symbols.iter().find(|s| s.name == "Render").unwrap();
        assert_eq!(method.parent.as_deref(), Some("Widget"));
    }
}
