//! Symbol visitor - single-pass occurrence extraction from PHP source
//!
//! Parses one file with tree-sitter and walks the tree exactly once, emitting
//! occurrence records keyed to the file being processed. Extraction is
//! syntactic and best-effort: no symbol table, no namespace resolution, no
//! dynamic dispatch. Calls through variables and non-literal hook names
//! produce no records.
//!
//! Node rules, first match wins:
//! 1. `do_action` / `apply_filters` (incl. `_ref_array`) with a literal
//!    string first argument → hook Definition
//! 2. `add_action` / `add_filter` with a literal string first argument →
//!    hook Usage
//! 3. any other direct call to a named function → Function Usage
//! 4. `Foo::bar()` on a literal class name → Function Usage `Foo::bar`
//! 5. `class B extends A` → Class Definition keyed to the *parent* name
//! 6. free function declaration → Function Definition
//! 7. named class declaration → Class Definition, name pushed for the body
//! 8. static method while inside a class body → Function Definition
//!    `EnclosingClass::method`

use crate::occurrence::{CollectedOccurrences, IdentifierType, StatementType};
use crate::{Error, Result};
use regex::Regex;
use tree_sitter::{Node, Parser};

// A file whose raw text never mentions the hook vocabulary is skipped without
// parsing. This deliberately also skips its function/class occurrences; the
// pre-filter and the extraction rules are one trade-off, not two features.
const PREFILTER_PATTERN: &str = r"add_(filter|action)|do_action|apply_filters";
const TRIGGER_PATTERN: &str = r"^(do_action|apply_filters)(_ref_array)?$";
const REGISTRATION_PATTERN: &str = r"^add_(action|filter)$";

/// Traversal-scoped state for one file. Created fresh per scan, so nothing
/// leaks across files.
struct FileContext<'a> {
    file: &'a str,
    class_stack: Vec<String>,
}

/// Extracts definition and usage records from PHP source files.
///
/// `collect_definitions` and `collect_usage` are independently toggleable;
/// a trusted core tree is scanned definitions-only so framework-internal
/// calls do not inflate usage counts.
pub struct SymbolVisitor {
    parser: Parser,
    prefilter: Regex,
    trigger: Regex,
    registration: Regex,
    pub collect_definitions: bool,
    pub collect_usage: bool,
    /// Records accumulated across all files scanned by this visitor
    pub occurrences: CollectedOccurrences,
}

impl SymbolVisitor {
    /// Create a visitor with both collection modes enabled
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|e| Error::Parse(format!("failed to load PHP grammar: {e}")))?;

        Ok(Self {
            parser,
            prefilter: compile(PREFILTER_PATTERN)?,
            trigger: compile(TRIGGER_PATTERN)?,
            registration: compile(REGISTRATION_PATTERN)?,
            collect_definitions: true,
            collect_usage: true,
            occurrences: CollectedOccurrences::new(),
        })
    }

    /// Scan one file's source text, accumulating records under `file`.
    ///
    /// Returns true if the file was parsed and walked. Files failing the
    /// hook-vocabulary pre-filter or the parse are skipped silently; a
    /// malformed file must never abort a batch run.
    pub fn scan_source(&mut self, file: &str, source: &str) -> bool {
        if !self.prefilter.is_match(source) {
            tracing::trace!("pre-filter skip: {}", file);
            return false;
        }

        let tree = match self.parser.parse(source, None) {
            Some(tree) => tree,
            None => {
                tracing::debug!("parse skip (no tree): {}", file);
                return false;
            }
        };
        if tree.root_node().has_error() {
            tracing::debug!("parse skip (syntax error): {}", file);
            return false;
        }

        let mut context = FileContext {
            file,
            class_stack: Vec::new(),
        };
        self.visit(tree.root_node(), source, &mut context);
        true
    }

    fn visit(&mut self, node: Node, source: &str, context: &mut FileContext) {
        let pushed_class = self.enter_node(node, source, context);

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, source, context);
        }

        if pushed_class {
            context.class_stack.pop();
        }
    }

    /// Handle one node; returns true when a class name was pushed onto the
    /// stack for the duration of this node's body.
    fn enter_node(&mut self, node: Node, source: &str, context: &mut FileContext) -> bool {
        match node.kind() {
            "function_call_expression" => {
                self.enter_call(node, source, context);
                false
            }
            "scoped_call_expression" => {
                if self.collect_usage {
                    self.enter_static_call(node, source, context);
                }
                false
            }
            "class_declaration" => self.enter_class(node, source, context),
            "function_definition" => {
                if self.collect_definitions {
                    if let Some(name) = field_text(node, "name", source) {
                        self.occurrences.insert(
                            StatementType::Definition,
                            IdentifierType::Function,
                            &name,
                            context.file,
                        );
                    }
                }
                false
            }
            "method_declaration" => {
                // Only static methods, and only while inside a class body; a
                // trait or interface method has no enclosing class here.
                if self.collect_definitions && is_static_method(node) {
                    if let (Some(class), Some(name)) =
                        (context.class_stack.last(), field_text(node, "name", source))
                    {
                        self.occurrences.insert(
                            StatementType::Definition,
                            IdentifierType::Function,
                            &format!("{class}::{name}"),
                            context.file,
                        );
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn enter_call(&mut self, node: Node, source: &str, context: &mut FileContext) {
        let Some(callee) = call_target(node, source) else {
            return;
        };

        if self.collect_definitions && self.trigger.is_match(&callee) {
            if let Some(hook) = literal_first_argument(node, source) {
                let identifier = if callee.starts_with("do_action") {
                    IdentifierType::HookAction
                } else {
                    IdentifierType::HookFilter
                };
                self.occurrences
                    .insert(StatementType::Definition, identifier, &hook, context.file);
            }
        } else if self.collect_usage {
            if self.registration.is_match(&callee) {
                if let Some(hook) = literal_first_argument(node, source) {
                    let identifier = if callee == "add_action" {
                        IdentifierType::HookAction
                    } else {
                        IdentifierType::HookFilter
                    };
                    self.occurrences
                        .insert(StatementType::Usage, identifier, &hook, context.file);
                }
            } else {
                self.occurrences.insert(
                    StatementType::Usage,
                    IdentifierType::Function,
                    &callee,
                    context.file,
                );
            }
        }
    }

    fn enter_static_call(&mut self, node: Node, source: &str, context: &mut FileContext) {
        let Some(scope) = node.child_by_field_name("scope") else {
            return;
        };
        if !matches!(scope.kind(), "name" | "qualified_name" | "relative_scope") {
            return;
        }
        let Some(method) = node.child_by_field_name("name") else {
            return;
        };
        if method.kind() != "name" {
            return;
        }

        if let (Ok(scope_text), Ok(method_text)) = (
            scope.utf8_text(source.as_bytes()),
            method.utf8_text(source.as_bytes()),
        ) {
            let name = format!("{}::{}", scope_text.trim_start_matches('\\'), method_text);
            self.occurrences.insert(
                StatementType::Usage,
                IdentifierType::Function,
                &name,
                context.file,
            );
        }
    }

    fn enter_class(&mut self, node: Node, source: &str, context: &mut FileContext) -> bool {
        if self.collect_usage {
            if let Some(parent) = base_class_name(node, source) {
                // `class B extends A` attributes this file to the parent
                // class as a *definition* location, not a usage.
                self.occurrences.insert(
                    StatementType::Definition,
                    IdentifierType::Class,
                    &parent,
                    context.file,
                );
            }
        }

        if self.collect_definitions {
            if let Some(name) = field_text(node, "name", source) {
                self.occurrences.insert(
                    StatementType::Definition,
                    IdentifierType::Class,
                    &name,
                    context.file,
                );
                context.class_stack.push(name);
                return true;
            }
        }
        false
    }
}

/// Name of a direct call target: a bare or qualified function name.
/// Calls through variables, methods or closures yield nothing.
fn call_target(call: Node, source: &str) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    if !matches!(function.kind(), "name" | "qualified_name") {
        return None;
    }
    let text = function.utf8_text(source.as_bytes()).ok()?;
    Some(text.trim_start_matches('\\').to_string())
}

/// The parent class from an `extends` clause, if it is a literal name
fn base_class_name(class: Node, source: &str) -> Option<String> {
    let mut cursor = class.walk();
    let base_clause = class
        .named_children(&mut cursor)
        .find(|child| child.kind() == "base_clause")?;

    let mut base_cursor = base_clause.walk();
    let parent = base_clause
        .named_children(&mut base_cursor)
        .find(|child| matches!(child.kind(), "name" | "qualified_name"))?;
    let text = parent.utf8_text(source.as_bytes()).ok()?;
    Some(text.trim_start_matches('\\').to_string())
}

/// The first argument of a call, if it is a literal string with no
/// interpolation. Anything else is unsupported, not approximated.
fn literal_first_argument(call: Node, source: &str) -> Option<String> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let first = arguments
        .named_children(&mut cursor)
        .find(|child| child.kind() == "argument")?;
    let count = first.named_child_count();
    if count == 0 {
        return None;
    }
    literal_string(first.named_child(count - 1)?, source)
}

fn literal_string(node: Node, source: &str) -> Option<String> {
    if !matches!(node.kind(), "string" | "encapsed_string") {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if !matches!(child.kind(), "string_content" | "escape_sequence") {
            return None;
        }
    }
    let text = node.utf8_text(source.as_bytes()).ok()?;
    if text.len() < 2 {
        return None;
    }
    Some(text[1..text.len() - 1].to_string())
}

fn is_static_method(method: Node) -> bool {
    let mut cursor = method.walk();
    method
        .named_children(&mut cursor)
        .any(|child| child.kind() == "static_modifier")
}

fn field_text(node: Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(source.as_bytes())
        .ok()
        .map(str::to_string)
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Parse(format!("bad pattern {pattern}: {e}")))
}
