//! Indentation family adapter (Python), spec §4.1.

use super::{LanguageAdapter, ParseResult};
use crate::model::{ExportDecl, ExportKind, ImportEdge, OutlineEntry, LanguageTag, Position, SymbolKind, SymbolNode};
use tree_sitter::{Node, Parser};

pub struct IndentationAdapter;

impl IndentationAdapter {
    pub fn new() -> Self {
        Self
    }

    fn make_parser() -> Option<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into()).ok()?;
        Some(parser)
    }
}

impl Default for IndentationAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for IndentationAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::Python
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
        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            if let Some(sym) = symbol_from_item(node, source, None) {
                if is_exported(node, &sym.name) {
                    result.exports.push(ExportDecl {
                        name: sym.name.clone(),
                        kind: export_kind_for(node.kind()),
                        line: sym.position.line,
                        signature: sym.signature.clone(),
                    });
                }
                result.symbols.push(sym);
            }
        }

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

fn is_exported(node: Node, name: &str) -> bool {
    let is_top_level_decl = matches!(node.kind(), "function_definition" | "class_definition" | "expression_statement");
    is_top_level_decl && !name.starts_with('_')
}

fn export_kind_for(kind: &str) -> ExportKind {
    match kind {
        "function_definition" => ExportKind::Function,
        "class_definition" => ExportKind::Class,
        _ => ExportKind::Var,
    }
}

// ---- imports --------------------------------------------------------------

fn collect_imports(root: Node, source: &str, out: &mut Vec<ImportEdge>) {
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        match node.kind() {
            "import_statement" => {
                let mut ncursor = node.walk();
                for child in node.children(&mut ncursor) {
                    match child.kind() {
                        "dotted_name" => out.push(ImportEdge {
                            module: text(child, source).to_string(),
                            names: Vec::new(),
                            default_import: false,
                            alias: None,
                        }),
                        "aliased_import" => {
                            let module = child.child_by_field_name("name").map(|n| text(n, source).to_string()).unwrap_or_default();
                            let alias = child.child_by_field_name("alias").map(|n| text(n, source).to_string());
                            out.push(ImportEdge {
                                module,
                                names: Vec::new(),
                                default_import: false,
                                alias,
                            });
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|n| text(n, source).to_string())
                    .unwrap_or_default();

                let mut names = Vec::new();
                let mut ncursor = node.walk();
                for child in node.children(&mut ncursor) {
                    match child.kind() {
                        "dotted_name" if text(child, source) != module => {
                            names.push(text(child, source).to_string());
                        }
                        "aliased_import" => {
                            let n = child.child_by_field_name("name").map(|n| text(n, source).to_string()).unwrap_or_default();
                            let a = child.child_by_field_name("alias").map(|n| text(n, source).to_string());
                            match a {
                                Some(a) => names.push(format!("{n} as {a}")),
                                None => names.push(n),
                            }
                        }
                        "wildcard_import" => names.push("*".to_string()),
                        _ => {}
                    }
                }

                out.push(ImportEdge {
                    module,
                    names,
                    default_import: false,
                    alias: None,
                });
            }
            _ => {}
        }
    }
}

// ---- symbols ---------------------------------------------------------------

fn symbol_from_item(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    match node.kind() {
        "function_definition" => build_function(node, source, parent),
        "class_definition" => build_class(node, source, parent),
        "expression_statement" => build_assignment(node, source, parent),
        _ => None,
    }
}

fn build_function(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let params = node.child_by_field_name("parameters").map(|p| text(p, source)).unwrap_or("()");
    let ret = node
        .child_by_field_name("return_type")
        .map(|r| format!(" -> {}", text(r, source)))
        .unwrap_or_default();

    let kind = if parent.is_some() { SymbolKind::Method } else { SymbolKind::Function };
    let mut sym = SymbolNode::new(text(name_node, source), kind, position(node));
    sym.signature = Some(format!("def {}{}{}", sym.name, params, ret));
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        sym.docstring = leading_docstring(body, source);
        for c in collect_calls(body, source) {
            sym.push_call(c);
        }
    }

    Some(sym)
}

fn build_class(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Class, position(node));
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        sym.docstring = leading_docstring(body, source);
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if let Some(msym) = symbol_from_item(member, source, Some(&sym.name)) {
                sym.children.push(msym);
            }
        }
    }

    Some(sym)
}

fn build_assignment(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let assignment = find_child_kind(node, "assignment")?;
    let name_node = assignment.child_by_field_name("left")?;
    if name_node.kind() != "identifier" {
        return None;
    }

    let name = text(name_node, source);
    let is_const = name.chars().all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit());
    let kind = if is_const { SymbolKind::Constant } else { SymbolKind::Variable };

    let mut sym = SymbolNode::new(name, kind, position(node));
    sym.parent = parent.map(|p| p.to_string());
    Some(sym)
}

fn find_child_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

fn leading_docstring(body: Node, source: &str) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    let raw = text(string_node, source);
    Some(raw.trim_matches(|c| c == '"' || c == '\'').trim().to_string())
}

// ---- calls -------------------------------------------------------------

/// Extract outgoing call names from a function/method body. A call through
/// `self.` is recorded under its bare method name; any other attribute chain
/// is recorded as `receiver.method` using the immediate receiver's text
/// (spec §9 open question: nested chains are not fully resolved).
fn collect_calls(body: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    collect_calls_inner(body, body, source, &mut out);
    out
}

fn collect_calls_inner(node: Node, scope_root: Node, source: &str, out: &mut Vec<String>) {
    if node != scope_root && node.kind() == "function_definition" {
        return;
    }

    if node.kind() == "call" {
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
        "attribute" => {
            let attr = func.child_by_field_name("attribute")?;
            let method = text(attr, source).to_string();
            let object = func.child_by_field_name("object")?;
            if object.kind() == "identifier" && text(object, source) == "self" {
                Some(method)
            } else {
                Some(format!("{}.{}", text(object, source), method))
            }
        }
        _ => None,
    }
}

// ---- outline ----------------------------------------------------------

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
    fn extracts_imports_and_top_level_function() {
        let adapter = IndentationAdapter::new();
        let src = "import os\nfrom typing import Optional, List as L\n\ndef greet(name):\n    \"\"\"Say hello.\"\"\"\n    return helper(name)\n";
        let result = adapter.parse(src, "mod.py");

        assert_eq!(result.imports.len(), 2);
        assert_eq!(result.imports[0].module, "os");
        assert_eq!(result.imports[1].module, "typing");
        assert!(result.imports[1].names.contains(&"Optional".to_string()));
        assert!(result.imports[1].names.contains(&"List as L".to_string()));

        assert_eq!(result.symbols.len(), 1);
        let func = &result.symbols[0];
        assert_eq!(func.name, "greet");
        assert_eq!(func.kind, SymbolKind::Function);
        assert_eq!(func.docstring.as_deref(), Some("Say hello."));
        assert_eq!(func.calls, vec!["helper".to_string()]);

        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "greet");
    }

    #[test]
    fn class_methods_nest_and_self_calls_strip_receiver() {
        let adapter = IndentationAdapter::new();
        let src = "class Widget:\n    def render(self):\n        return self.paint()\n\n    def paint(self):\n        pass\n";
        let result = adapter.parse(src, "widget.py");

        assert_eq!(result.symbols.len(), 1);
        let class = &result.symbols[0];
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.children.len(), 2);
        let render = &class.children[0];
        assert_eq!(render.kind, SymbolKind::Method);
        assert_eq!(render.calls, vec!["paint".to_string()]);
    }

    #[test]
    fn private_function_not_exported() {
        let adapter = IndentationAdapter::new();
        let src = "def _helper():\n    pass\n\ndef public():\n    pass\n";
        let result = adapter.parse(src, "mod.py");

        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "public");
    }
}
