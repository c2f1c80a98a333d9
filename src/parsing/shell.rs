//! Line-oriented family adapter (shell).
//!
//! Shell has no grammar in this crate's dependency stack, so this adapter is
//! a textual scanner rather than a tree-sitter walker: function boundaries,
//! `source`/`.` imports and call sites are all recognized by regex over
//! lines.

use super::{LanguageAdapter, ParseResult};
use crate::model::{ExportDecl, ExportKind, ImportEdge, LanguageTag, OutlineEntry, Position, SymbolKind, SymbolNode};
use regex::Regex;
use std::sync::OnceLock;

pub struct ShellAdapter;

impl ShellAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn func_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:function\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*\(\)\s*\{?|^\s*function\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{?").unwrap())
}

fn source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*(?:source|\.)\s+["']?([^\s"']+)["']?"#).unwrap())
}

fn export_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*export\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

fn positional_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(\d)").unwrap())
}

impl LanguageAdapter for ShellAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::Shell
    }

    fn parse(&self, source: &str, _path: &str) -> ParseResult {
        let mut result = ParseResult::default();
        let lines: Vec<&str> = source.lines().collect();

        let mut functions: Vec<SymbolNode> = Vec::new();
        let mut func_starts: Vec<(usize, usize)> = Vec::new(); // (symbol index, start line idx)

        for (idx, line) in lines.iter().enumerate() {
            if let Some(caps) = func_def_re().captures(line) {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().to_string());
                if let Some(name) = name {
                    let position = Position {
                        line: idx as u32 + 1,
                        column: 0,
                        end_line: idx as u32 + 1,
                        end_column: line.len() as u32,
                    };
                    let mut sym = SymbolNode::new(&name, SymbolKind::Function, position);
                    sym.signature = Some(format!("{}()", name));
                    sym.docstring = leading_comment(&lines, idx);
                    func_starts.push((functions.len(), idx));
                    functions.push(sym);
                }
            }

            if let Some(caps) = source_re().captures(line) {
                if let Some(m) = caps.get(1) {
                    result.imports.push(ImportEdge {
                        module: m.as_str().to_string(),
                        names: Vec::new(),
                        default_import: false,
                        alias: None,
                    });
                }
            }

            if let Some(caps) = export_re().captures(line) {
                if let Some(m) = caps.get(1) {
                    result.exports.push(ExportDecl {
                        name: m.as_str().to_string(),
                        kind: ExportKind::Var,
                        line: idx as u32 + 1,
                        signature: None,
                    });
                }
            }
        }

        let end_idx = find_function_end(&lines, &func_starts);
        for (i, (fi, start)) in func_starts.iter().enumerate() {
            let end = end_idx.get(i).copied().unwrap_or(lines.len());
            let body = &lines[*start..end.min(lines.len())];

            let max_param = body
                .iter()
                .flat_map(|l| positional_param_re().captures_iter(l))
                .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
                .max()
                .unwrap_or(0);
            if max_param > 0 {
                let params: Vec<String> = (1..=max_param).map(|n| format!("${n}")).collect();
                functions[*fi].signature = Some(format!("{}({})", functions[*fi].name, params.join(", ")));
            }

            let known_names: Vec<String> = functions.iter().map(|f| f.name.clone()).collect();
            for call in find_calls(body, &known_names, &functions[*fi].name) {
                functions[*fi].push_call(call);
            }
        }

        for sym in &functions {
            result.exports.push(ExportDecl {
                name: sym.name.clone(),
                kind: ExportKind::Function,
                line: sym.position.line,
                signature: sym.signature.clone(),
            });
        }

        result.outline = functions
            .iter()
            .map(|f| OutlineEntry {
                title: f.name.clone(),
                level: 0,
                line: f.position.line,
            })
            .collect();
        result.symbols = functions;

        result
    }
}

fn leading_comment(lines: &[&str], idx: usize) -> Option<String> {
    let mut comments = Vec::new();
    let mut i = idx;
    while i > 0 {
        i -= 1;
        let trimmed = lines[i].trim();
        if let Some(stripped) = trimmed.strip_prefix('#') {
            comments.push(stripped.trim().to_string());
        } else if trimmed.is_empty() {
            break;
        } else {
            break;
        }
    }
    if comments.is_empty() {
        None
    } else {
        comments.reverse();
        Some(comments.join("\n"))
    }
}

/// Functions in shell scripts have no reliable closing-brace detection
/// without a real parser, so each function's body runs until the next
/// function definition or end of file.
fn find_function_end(lines: &[&str], func_starts: &[(usize, usize)]) -> Vec<usize> {
    let mut ends = Vec::with_capacity(func_starts.len());
    for i in 0..func_starts.len() {
        let next_start = func_starts.get(i + 1).map(|(_, s)| *s).unwrap_or(lines.len());
        ends.push(next_start);
    }
    ends
}

/// A call is any occurrence of a known function name at the start of a
/// line, or after `;`, `&&`, `||`, `&`, `$(`, or a backtick (spec §4.1).
fn find_calls(body: &[&str], known_names: &[String], self_name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in body {
        for name in known_names {
            if name == self_name {
                continue;
            }
            if line_invokes(line, name) {
                out.push(name.clone());
            }
        }
    }
    out
}

fn line_invokes(line: &str, name: &str) -> bool {
    let boundaries = [";", "&&", "||", "&", "$(", "`", "|"];
    let trimmed = line.trim_start();
    if starts_with_word(trimmed, name) {
        return true;
    }
    for b in boundaries {
        if let Some(pos) = line.find(b) {
            let rest = line[pos + b.len()..].trim_start();
            if starts_with_word(rest, name) {
                return true;
            }
        }
    }
    false
}

fn starts_with_word(text: &str, word: &str) -> bool {
    if !text.starts_with(word) {
        return false;
    }
    match text.as_bytes().get(word.len()) {
        None => true,
        Some(b) => !b.is_ascii_alphanumeric() && *b != b'_',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_call() {
        let adapter = ShellAdapter::new();
        let src = "#!/bin/bash\nsource ./lib/common.sh\n\n# Say hi\nhello() {\n  echo \"hi $1\"\n}\n\nmain() {\n  hello world\n}\n\nmain\n";
        let result = adapter.parse(src, "script.sh");

        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].module, "./lib/common.sh");

        assert_eq!(result.symbols.len(), 2);
        let hello = &result.symbols[0];
        assert_eq!(hello.name, "hello");
        assert_eq!(hello.docstring.as_deref(), Some("Say hi"));
        assert_eq!(hello.signature.as_deref(), Some("hello($1)"));

        let main = &result.symbols[1];
        assert_eq!(main.calls, vec!["hello".to_string()]);
    }

    #[test]
    fn export_directive_is_recorded() {
        let adapter = ShellAdapter::new();
        let src = "export PATH_PREFIX=/usr/local\n";
        let result = adapter.parse(src, "env.sh");
        assert!(result.exports.iter().any(|e| e.name == "PATH_PREFIX"));
    }
}
