//! Recovers constructor assignments from Python source text.
//!
//! Driver parameters are often created in `__init__` (`self.gain = Parameter(...)`)
//! and are therefore invisible to class introspection. The scanner parses the
//! class source with tree-sitter and returns the literal right-hand side of
//! such assignments. Nothing is evaluated.

use std::collections::BTreeMap;
use std::fmt;
use tree_sitter::{Node, Parser, Tree};

/// Value shown in documentation in place of an attribute that only exists at
/// runtime. Displays exactly the recovered source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderValue {
    attribute: String,
    text: String,
}

impl PlaceholderValue {
    pub fn new(attribute: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            text: text.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PlaceholderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A parsed Python module together with its source text.
pub struct PythonSource<'a> {
    pub tree: Tree,
    pub source: &'a str,
}

impl<'a> PythonSource<'a> {
    /// Parse source. `None` when the grammar cannot be loaded or parsing fails.
    pub fn parse(source: &'a str) -> Option<Self> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
            log::warn!("Failed to set Python language: {e}");
            return None;
        }
        let tree = parser.parse(source, None)?;
        if tree.root_node().has_error() {
            log::debug!("Python source contains syntax errors; scanning what parsed");
        }
        Some(Self { tree, source })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Extract text from a node
    pub fn get_text(&self, node: &Node) -> &'a str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn name_of(&self, node: &Node) -> Option<&'a str> {
        node.child_by_field_name("name").map(|n| self.get_text(&n))
    }
}

/// Collects definitions of `kind` named `name` below `node`.
///
/// Descends through every statement except other class and function
/// definitions, so `if`/`try`/`with` bodies are searched but nested scopes
/// are not.
fn find_definitions<'t>(
    source: &PythonSource,
    node: Node<'t>,
    kind: &str,
    name: &str,
    found: &mut Vec<Node<'t>>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            k if k == kind => {
                if source.name_of(&child) == Some(name) {
                    found.push(child);
                }
            }
            "class_definition" | "function_definition" => {}
            _ => find_definitions(source, child, kind, name, found),
        }
    }
}

pub fn find_classes<'t>(source: &'t PythonSource, class_name: &str) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    find_definitions(source, source.root(), "class_definition", class_name, &mut found);
    found
}

pub fn find_init_functions<'t>(source: &PythonSource, class_node: Node<'t>) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    find_definitions(source, class_node, "function_definition", "__init__", &mut found);
    found
}

/// The single `__init__` of the single class named `class_name`.
fn find_constructor<'t>(source: &'t PythonSource, class_name: &str) -> Option<Node<'t>> {
    let classes = find_classes(source, class_name);
    let class_node = match classes.as_slice() {
        [single] => *single,
        [] => {
            log::debug!("Could not find a class definition for {class_name}");
            return None;
        }
        many => {
            log::warn!(
                "Found more than one class definition for {class_name}: found {}",
                many.len()
            );
            return None;
        }
    };

    match find_init_functions(source, class_node).as_slice() {
        [single] => Some(*single),
        [] => {
            log::debug!("Found no init function for {class_name}");
            None
        }
        many => {
            log::warn!(
                "Found more than one init function for {class_name}: found {}",
                many.len()
            );
            None
        }
    }
}

/// Collapses runs of whitespace (including newlines) to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `self.<attr> = <expr>` as (attr, normalized expr). Any other shape is `None`.
fn self_assignment(source: &PythonSource, assignment: Node) -> Option<(String, String)> {
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "attribute" {
        return None;
    }
    let receiver = left.child_by_field_name("object")?;
    let attr = left.child_by_field_name("attribute")?;
    if receiver.kind() != "identifier" || source.get_text(&receiver) != "self" {
        return None;
    }
    if attr.kind() != "identifier" {
        return None;
    }

    // self.a = self.b = value: the value is at the end of the chain
    let mut right = assignment.child_by_field_name("right")?;
    while right.kind() == "assignment" {
        right = right.child_by_field_name("right")?;
    }

    Some((
        source.get_text(&attr).to_string(),
        normalize_whitespace(source.get_text(&right)),
    ))
}

/// Maps every attribute assigned as `self.<attr> = <expr>` among the top-level
/// statements of `class_name.__init__` to its placeholder. Later assignments
/// to the same attribute win.
pub fn scan_constructor_assignments(
    source_text: &str,
    class_name: &str,
) -> BTreeMap<String, PlaceholderValue> {
    let mut assignments = BTreeMap::new();
    let Some(source) = PythonSource::parse(source_text) else {
        return assignments;
    };
    let Some(init) = find_constructor(&source, class_name) else {
        return assignments;
    };
    let Some(body) = init.child_by_field_name("body") else {
        return assignments;
    };

    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(expression) = statement.named_child(0) else {
            continue;
        };
        if expression.kind() != "assignment" {
            continue;
        }
        if let Some((attr, text)) = self_assignment(&source, expression) {
            log::debug!("{class_name}.__init__ assigns self.{attr} = {text}");
            let placeholder = PlaceholderValue::new(attr.clone(), text);
            assignments.insert(attr, placeholder);
        }
    }
    assignments
}

/// Source text assigned to `self.<attribute_name>` in the constructor of
/// `class_name`, or `None` on any miss.
pub fn recover_assigned_expression(
    source_text: &str,
    class_name: &str,
    attribute_name: &str,
) -> Option<String> {
    scan_constructor_assignments(source_text, class_name)
        .remove(attribute_name)
        .map(|placeholder| placeholder.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVER: &str = r#"
import qcodes

class Lockin(Instrument):
    """Lock-in amplifier."""

    channels = 2

    def __init__(self, name, address, **kwargs):
        super().__init__(name, **kwargs)
        self.frequency = Parameter(
            "frequency",
            unit="Hz",
                 get_cmd="FREQ?")
        self.amplitude: Parameter = Parameter("amplitude", unit="V")
        self.x = self.y = Parameter("xy")
        self.buffer[0] = 1
        a, b = 1, 2
        self.count += 1
        self.nested.attr = 3
        other.gain = 4
        if address:
            self.hidden = Parameter("hidden")

    def helper(self):
        self.late = 5
"#;

    #[test]
    fn test_recovers_normalized_text() {
        assert_eq!(
            recover_assigned_expression(DRIVER, "Lockin", "frequency").as_deref(),
            Some(r#"Parameter( "frequency", unit="Hz", get_cmd="FREQ?")"#)
        );
    }

    #[test]
    fn test_annotated_and_chained_assignments() {
        let found = scan_constructor_assignments(DRIVER, "Lockin");
        assert_eq!(found["amplitude"].text(), r#"Parameter("amplitude", unit="V")"#);
        assert_eq!(found["x"].text(), r#"Parameter("xy")"#);
        assert_eq!(found["x"].attribute(), "x");
        assert_eq!(found["amplitude"].to_string(), r#"Parameter("amplitude", unit="V")"#);
    }

    #[test]
    fn test_other_statement_shapes_are_skipped() {
        let found = scan_constructor_assignments(DRIVER, "Lockin");
        let names: Vec<&str> = found.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["amplitude", "frequency", "x"]);
        assert_eq!(recover_assigned_expression(DRIVER, "Lockin", "hidden"), None);
        assert_eq!(recover_assigned_expression(DRIVER, "Lockin", "late"), None);
    }

    #[test]
    fn test_duplicate_class_is_ambiguous() {
        let source = "class A:\n    def __init__(self):\n        self.x = 1\n\nclass A:\n    pass\n";
        assert_eq!(recover_assigned_expression(source, "A", "x"), None);
    }

    #[test]
    fn test_duplicate_init_is_ambiguous() {
        let source = "class A:\n    def __init__(self):\n        self.x = 1\n    def __init__(self):\n        self.x = 2\n";
        assert_eq!(recover_assigned_expression(source, "A", "x"), None);
    }

    #[test]
    fn test_missing_class_or_init() {
        assert_eq!(recover_assigned_expression(DRIVER, "Missing", "frequency"), None);
        let source = "class A:\n    value = 1\n";
        assert!(scan_constructor_assignments(source, "A").is_empty());
    }

    #[test]
    fn test_decorated_class_is_found_but_nested_class_is_not() {
        let source = r#"
@register
class Outer:
    def __init__(self):
        self.a = 1

    class Inner:
        def __init__(self):
            self.b = 2
"#;
        assert_eq!(recover_assigned_expression(source, "Outer", "a").as_deref(), Some("1"));
        assert_eq!(recover_assigned_expression(source, "Inner", "b"), None);
    }

    #[test]
    fn test_definitions_under_compound_statements() {
        let source = "if True:\n    class A:\n        def __init__(self):\n            self.x = 1\n";
        assert_eq!(recover_assigned_expression(source, "A", "x").as_deref(), Some("1"));

        let source = r#"
class B:
    try:
        def __init__(self):
            self.y = 2
    except ImportError:
        pass
"#;
        assert_eq!(recover_assigned_expression(source, "B", "y").as_deref(), Some("2"));
    }

    #[test]
    fn test_init_split_across_branches_is_ambiguous() {
        let source = r#"
class C:
    if FAST:
        def __init__(self):
            self.z = 1
    else:
        def __init__(self):
            self.z = 2
"#;
        let parsed = PythonSource::parse(source).unwrap();
        let classes = find_classes(&parsed, "C");
        assert_eq!(classes.len(), 1);
        assert_eq!(find_init_functions(&parsed, classes[0]).len(), 2);
        assert_eq!(recover_assigned_expression(source, "C", "z"), None);
    }

    #[test]
    fn test_later_assignment_wins() {
        let source = "class A:\n    def __init__(self):\n        self.x = 1\n        self.x = 2\n";
        assert_eq!(recover_assigned_expression(source, "A", "x").as_deref(), Some("2"));
    }
}
