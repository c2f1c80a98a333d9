//! Ownership-typed family adapter (Rust-style), spec §4.1.
//!
//! Grounded on `examples/bartolli-codanna/src/parsing/rust.rs`'s recursive
//! tree-sitter walk, generalized to cover imports, exports, nested symbols,
//! and call extraction in one pass.

use super::{LanguageAdapter, ParseResult};
use crate::model::{ExportDecl, ExportKind, ImportEdge, LanguageTag, OutlineEntry, Position, SymbolKind, SymbolNode};
use std::cell::RefCell;
use tree_sitter::{Node, Parser};

pub struct OwnershipAdapter;

impl OwnershipAdapter {
    pub fn new() -> Self {
        Self
    }

    fn make_parser() -> Option<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_rust::LANGUAGE.into()).ok()?;
        Some(parser)
    }
}

impl Default for OwnershipAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for OwnershipAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::Rust
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
        result.symbols = collect_symbols(root, source);
        collect_exports(root, source, &mut result.exports);
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

fn has_pub_visibility(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier")
}

fn leading_doc_comment(node: Node, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "line_comment" {
            let t = text(s, source);
            if let Some(stripped) = t.strip_prefix("///").or_else(|| t.strip_prefix("//!")) {
                lines.push(stripped.trim().to_string());
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

// ---- imports --------------------------------------------------------

fn collect_imports(root: Node, source: &str, out: &mut Vec<ImportEdge>) {
    walk(root, &mut |node| {
        match node.kind() {
            "use_declaration" => {
                if let Some(arg) = node.child_by_field_name("argument") {
                    collect_use_tree(arg, source, String::new(), out);
                }
            }
            "extern_crate_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.push(ImportEdge {
                        module: text(name, source).to_string(),
                        names: Vec::new(),
                        default_import: false,
                        alias: node
                            .child_by_field_name("alias")
                            .map(|a| text(a, source).to_string()),
                    });
                }
            }
            _ => {}
        }
        true
    });
}

fn collect_use_tree(node: Node, source: &str, prefix: String, out: &mut Vec<ImportEdge>) {
    match node.kind() {
        "identifier" | "scoped_identifier" | "crate" | "self" | "super" => {
            let segment = text(node, source);
            let module = join_path(&prefix, segment);
            out.push(ImportEdge {
                module,
                names: Vec::new(),
                default_import: false,
                alias: None,
            });
        }
        "use_as_clause" => {
            let path_node = node.child_by_field_name("path");
            let alias_node = node.child_by_field_name("alias");
            let module = path_node
                .map(|p| join_path(&prefix, text(p, source)))
                .unwrap_or(prefix);
            out.push(ImportEdge {
                module,
                names: Vec::new(),
                default_import: false,
                alias: alias_node.map(|a| text(a, source).to_string()),
            });
        }
        "use_wildcard" => {
            let path = node.child(0).map(|p| text(p, source)).unwrap_or("");
            out.push(ImportEdge {
                module: join_path(&prefix, path),
                names: vec!["*".to_string()],
                default_import: false,
                alias: None,
            });
        }
        "scoped_use_list" => {
            let base = node
                .child_by_field_name("path")
                .map(|p| text(p, source))
                .unwrap_or("");
            let new_prefix = join_path(&prefix, base);
            if let Some(list) = node.child_by_field_name("list") {
                let mut cursor = list.walk();
                for child in list.children(&mut cursor) {
                    if child.kind() == "use_tree" || is_use_tree_leaf(child.kind()) {
                        collect_use_tree(child, source, new_prefix.clone(), out);
                    }
                }
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if is_use_tree_leaf(child.kind()) {
                    collect_use_tree(child, source, prefix.clone(), out);
                }
            }
        }
        "use_tree" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_use_tree(child, source, prefix.clone(), out);
            }
        }
        _ => {}
    }
}

fn is_use_tree_leaf(kind: &str) -> bool {
    matches!(
        kind,
        "identifier" | "scoped_identifier" | "use_as_clause" | "use_wildcard" | "scoped_use_list" | "use_list" | "self"
    )
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}::{segment}")
    }
}

// ---- symbols ----------------------------------------------------------

fn collect_symbols(root: Node, source: &str) -> Vec<SymbolNode> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if let Some(sym) = symbol_from_item(child, source, None) {
            out.push(sym);
        }
    }
    out
}

fn symbol_from_item(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    match node.kind() {
        "function_item" => build_function(node, source, parent, SymbolKind::Function),
        "struct_item" => build_struct(node, source, parent),
        "enum_item" => build_enum(node, source, parent),
        "trait_item" => build_trait(node, source, parent),
        "impl_item" => build_impl(node, source),
        "type_item" => build_simple(node, source, parent, SymbolKind::TypeAlias),
        "const_item" | "static_item" => build_simple(node, source, parent, SymbolKind::Constant),
        "mod_item" => build_mod(node, source, parent),
        _ => None,
    }
}

fn build_function(node: Node, source: &str, parent: Option<&str>, kind: SymbolKind) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let name = text(name_node, source).to_string();
    let params = node
        .child_by_field_name("parameters")
        .map(|p| text(p, source))
        .unwrap_or("()");
    let ret = node
        .child_by_field_name("return_type")
        .map(|r| format!(" -> {}", text(r, source)))
        .unwrap_or_default();

    let mut sym = SymbolNode::new(name, kind, position(node));
    sym.signature = Some(format!("{}{}{}", sym.name, params, ret));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let mut calls = Vec::new();
        collect_calls(body, source, &mut calls);
        for c in calls {
            sym.push_call(c);
        }
    }

    Some(sym)
}

fn build_struct(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Struct, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        if body.kind() == "field_declaration_list" {
            let mut cursor = body.walk();
            for field in body.children(&mut cursor) {
                if field.kind() == "field_declaration" {
                    if let Some(fname) = field.child_by_field_name("name") {
                        let mut fsym = SymbolNode::new(text(fname, source), SymbolKind::Field, position(field));
                        fsym.parent = Some(sym.name.clone());
                        if let Some(ty) = field.child_by_field_name("type") {
                            fsym.signature = Some(format!("{}: {}", fsym.name, text(ty, source)));
                        }
                        sym.children.push(fsym);
                    }
                }
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
        for variant in body.children(&mut cursor) {
            if variant.kind() == "enum_variant" {
                if let Some(vname) = variant.child_by_field_name("name") {
                    let mut vsym = SymbolNode::new(text(vname, source), SymbolKind::EnumMember, position(variant));
                    vsym.parent = Some(sym.name.clone());
                    sym.children.push(vsym);
                }
            }
        }
    }

    Some(sym)
}

fn build_trait(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Trait, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for item in body.children(&mut cursor) {
            if matches!(item.kind(), "function_item" | "function_signature_item") {
                if let Some(mname) = item.child_by_field_name("name") {
                    let params = item
                        .child_by_field_name("parameters")
                        .map(|p| text(p, source))
                        .unwrap_or("()");
                    let mut msym = SymbolNode::new(text(mname, source), SymbolKind::Method, position(item));
                    msym.signature = Some(format!("{}{}", msym.name, params));
                    msym.parent = Some(sym.name.clone());
                    sym.children.push(msym);
                }
            }
        }
    }

    Some(sym)
}

fn build_impl(node: Node, source: &str) -> Option<SymbolNode> {
    let type_node = node.child_by_field_name("type")?;
    let target = text(type_node, source).to_string();
    let label = format!("impl {target}");
    let mut sym = SymbolNode::new(label.clone(), SymbolKind::Module, position(node));

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for item in body.children(&mut cursor) {
            if item.kind() == "function_item" {
                if let Some(mut method) = build_function(item, source, Some(&label), SymbolKind::Method) {
                    method.parent = Some(target.clone());
                    sym.children.push(method);
                }
            }
        }
    }

    Some(sym)
}

fn build_simple(node: Node, source: &str, parent: Option<&str>, kind: SymbolKind) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), kind, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());
    Some(sym)
}

fn build_mod(node: Node, source: &str, parent: Option<&str>) -> Option<SymbolNode> {
    let name_node = node.child_by_field_name("name")?;
    let mut sym = SymbolNode::new(text(name_node, source), SymbolKind::Module, position(node));
    sym.docstring = leading_doc_comment(node, source);
    sym.parent = parent.map(|p| p.to_string());

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for item in body.children(&mut cursor) {
            if let Some(child_sym) = symbol_from_item(item, source, Some(&sym.name)) {
                sym.children.push(child_sym);
            }
        }
    }

    Some(sym)
}

// ---- calls --------------------------------------------------------------

fn collect_calls(body: Node, source: &str, out: &mut Vec<String>) {
    // Stop at nested function/closure boundaries that aren't the body root itself.
    let collected = RefCell::new(Vec::new());
    walk_calls(body, source, body, &collected);
    out.extend(collected.into_inner());
}

fn walk_calls(node: Node, source: &str, scope_root: Node, out: &RefCell<Vec<String>>) {
    if node != scope_root && matches!(node.kind(), "function_item") {
        return; // nested fn items get their own call list
    }

    match node.kind() {
        "call_expression" => {
            if let Some(func) = node.child_by_field_name("function") {
                if let Some(name) = call_name(func, source) {
                    out.borrow_mut().push(name);
                }
            }
        }
        "macro_invocation" => {
            if let Some(mac) = node.child_by_field_name("macro") {
                out.borrow_mut().push(format!("{}!", text(mac, source)));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, source, scope_root, out);
    }
}

fn call_name(func: Node, source: &str) -> Option<String> {
    match func.kind() {
        "identifier" => Some(text(func, source).to_string()),
        "scoped_identifier" => Some(text(func, source).to_string()),
        "field_expression" => {
            let field = func.child_by_field_name("field")?;
            let method = text(field, source).to_string();
            let value = func.child_by_field_name("value")?;
            if value.kind() == "self" {
                Some(method)
            } else {
                Some(format!("{}.{}", text(value, source), method))
            }
        }
        _ => None,
    }
}

// ---- exports / outline --------------------------------------------------

/// Every top-level item with a `pub` visibility modifier is an export
/// (spec §4.1 ownership-typed family).
fn collect_exports(root: Node, source: &str, out: &mut Vec<ExportDecl>) {
    let mut cursor = root.walk();
    for item in root.children(&mut cursor) {
        if !has_pub_visibility(item) {
            continue;
        }
        let (name_node, kind) = match item.kind() {
            "function_item" => (item.child_by_field_name("name"), ExportKind::Function),
            "struct_item" => (item.child_by_field_name("name"), ExportKind::Class),
            "enum_item" => (item.child_by_field_name("name"), ExportKind::Type),
            "trait_item" => (item.child_by_field_name("name"), ExportKind::Interface),
            "type_item" => (item.child_by_field_name("name"), ExportKind::Type),
            "const_item" => (item.child_by_field_name("name"), ExportKind::Const),
            "static_item" => (item.child_by_field_name("name"), ExportKind::Var),
            "mod_item" => (item.child_by_field_name("name"), ExportKind::Default),
            _ => (None, ExportKind::Var),
        };
        if let Some(name_node) = name_node {
            out.push(ExportDecl {
                name: text(name_node, source).to_string(),
                kind,
                line: position(item).line,
                signature: None,
            });
        }
    }
}

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

fn walk<F: FnMut(Node) -> bool>(node: Node, f: &mut F) {
    if !f(node) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_only_pub_items() {
        let adapter = OwnershipAdapter::new();
        let src = "pub fn greet() {}\nfn helper() {}\npub struct Widget;\n";
        let result = adapter.parse(src, "lib.rs");

        assert_eq!(result.symbols.len(), 3);
        assert_eq!(result.exports.len(), 2);
        assert!(result.exports.iter().any(|e| e.name == "greet" && e.kind == ExportKind::Function));
        assert!(result.exports.iter().any(|e| e.name == "Widget" && e.kind == ExportKind::Class));
    }

    #[test]
    fn use_declarations_flatten_into_import_edges() {
        let adapter = OwnershipAdapter::new();
        let src = "use std::collections::{HashMap, HashSet as Set};\nuse serde::Serialize;\n";
        let result = adapter.parse(src, "lib.rs");

        let modules: Vec<&str> = result.imports.iter().map(|i| i.module.as_str()).collect();
        assert!(modules.contains(&"std::collections::HashMap"));
        assert!(modules.contains(&"std::collections::HashSet"));
        assert!(modules.contains(&"serde::Serialize"));
    }

    #[test]
    fn impl_methods_nest_under_target_type_with_self_calls_stripped() {
        let adapter = OwnershipAdapter::new();
        let src = "struct Widget;\n\nimpl Widget {\n    fn render(&self) {\n        self.paint();\n    }\n\n    fn paint(&self) {}\n}\n";
        let result = adapter.parse(src, "widget.rs");

        let impl_block = result.symbols.iter().find(|s| s.name == "impl Widget").unwrap();
        assert_eq!(impl_block.children.len(), 2);
        let render = impl_block.children.iter().find(|m| m.name == "render").unwrap();
        assert_eq!(render.parent.as_deref(), Some("Widget"));
        assert_eq!(render.calls, vec!["paint".to_string()]);
    }

    #[test]
    fn macro_invocations_are_suffixed_with_bang() {
        let adapter = OwnershipAdapter::new();
        let src = "fn greet() {\n    println!(\"hi\");\n}\n";
        let result = adapter.parse(src, "lib.rs");

        assert_eq!(result.symbols[0].calls, vec!["println!".to_string()]);
    }
}
