//! Static model of a Python class hierarchy.
//!
//! Classes are collected from source files with tree-sitter. The model keeps
//! what introspection of the imported classes would see (bases, class-level
//! attributes, methods) plus each class's own source text, which the
//! constructor scanner needs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::Node;

use crate::doc_attrs::source_scan::{normalize_whitespace, PythonSource};
use crate::error::Result;

/// Something a class body defines at class level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    /// `name = expr` or `name: T = expr`, holding the normalized expression.
    Value(String),
    Method,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Base class names, reduced to their last dotted segment.
    pub bases: Vec<String>,
    /// The class's own source, dedented so it parses on its own.
    pub source: String,
    pub members: BTreeMap<String, ClassMember>,
    pub path: PathBuf,
}

/// All classes found in a set of Python files, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDef>,
}

impl ClassRegistry {
    /// Builds the registry from `(path, text)` pairs. When a class name occurs
    /// more than once the first definition is kept.
    pub fn from_python_sources<P: AsRef<Path>>(sources: &[(P, String)]) -> Self {
        let mut registry = ClassRegistry::default();
        for (path, text) in sources {
            let Some(parsed) = PythonSource::parse(text) else {
                log::warn!("Could not parse '{}'", path.as_ref().display());
                continue;
            };
            let mut found = Vec::new();
            collect_classes(&parsed, parsed.root(), path.as_ref(), &mut found);
            for class in found {
                registry.insert(class);
            }
        }
        log::debug!("Class registry holds {} classes", registry.classes.len());
        registry
    }

    /// Reads `.py` files, descending into directories.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            collect_python_files(path, &mut files)?;
        }
        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            let text = fs::read_to_string(&file)?;
            sources.push((file, text));
        }
        Ok(Self::from_python_sources(&sources))
    }

    pub fn insert(&mut self, class: ClassDef) {
        if let Some(existing) = self.classes.get(&class.name) {
            log::warn!(
                "Class {} defined in both '{}' and '{}'; keeping the first",
                class.name,
                existing.path.display(),
                class.path.display()
            );
            return;
        }
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// C3 method resolution order, most-derived first, `object` left out.
    ///
    /// Bases missing from the registry appear in the order but end their
    /// branch. Hierarchies without a consistent linearization fall back to
    /// depth-first order.
    pub fn mro(&self, name: &str) -> Vec<String> {
        let mut visiting = HashSet::new();
        self.linearize(name, &mut visiting)
    }

    pub fn is_subclass_of(&self, name: &str, base: &str) -> bool {
        self.mro(name).iter().any(|c| c == base)
    }

    fn bases_of(&self, name: &str) -> Vec<String> {
        self.classes
            .get(name)
            .map(|c| c.bases.iter().filter(|b| *b != "object").cloned().collect())
            .unwrap_or_default()
    }

    fn linearize(&self, name: &str, visiting: &mut HashSet<String>) -> Vec<String> {
        if !visiting.insert(name.to_string()) {
            log::warn!("Cyclic inheritance through {name}");
            return vec![name.to_string()];
        }
        let bases = self.bases_of(name);
        let mut sequences: Vec<Vec<String>> = bases
            .iter()
            .map(|base| self.linearize(base, visiting))
            .collect();
        sequences.push(bases.clone());
        visiting.remove(name);

        let mut result = vec![name.to_string()];
        match c3_merge(sequences) {
            Some(merged) => result.extend(merged),
            None => {
                log::warn!("Cannot create a consistent method resolution order for {name}");
                self.depth_first(name, &mut result);
            }
        }
        result
    }

    fn depth_first(&self, name: &str, order: &mut Vec<String>) {
        for base in self.bases_of(name) {
            if !order.contains(&base) {
                order.push(base.clone());
                self.depth_first(&base, order);
            }
        }
    }
}

/// Merge step of the C3 linearization.
fn c3_merge(mut sequences: Vec<Vec<String>>) -> Option<Vec<String>> {
    let mut merged = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Some(merged);
        }
        // first head that appears in no tail
        let candidate = sequences.iter().map(|s| &s[0]).find(|head| {
            sequences
                .iter()
                .all(|s| !s[1..].iter().any(|item| item == *head))
        })?;
        let candidate = candidate.clone();
        for seq in sequences.iter_mut() {
            if seq[0] == candidate {
                seq.remove(0);
            }
        }
        merged.push(candidate);
    }
}

fn collect_python_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();
        for entry in entries {
            collect_python_files(&entry, files)?;
        }
    } else if path.extension().is_some_and(|ext| ext == "py") {
        files.push(path.to_path_buf());
    }
    Ok(())
}

/// Last segment of a dotted base expression: `base.InstrumentBase` -> `InstrumentBase`.
fn base_name(source: &PythonSource, node: Node) -> Option<String> {
    match node.kind() {
        "identifier" => Some(source.get_text(&node).to_string()),
        "attribute" => node
            .child_by_field_name("attribute")
            .map(|n| source.get_text(&n).to_string()),
        // Generic[T] and friends
        "subscript" => node
            .child_by_field_name("value")
            .and_then(|value| base_name(source, value)),
        _ => None,
    }
}

fn dedent(text: &str, column: usize) -> String {
    let mut lines = text.lines();
    let mut out = String::with_capacity(text.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        let indent = line
            .bytes()
            .take(column)
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        out.push_str(&line[indent..]);
    }
    out
}

fn class_members(source: &PythonSource, body: Node) -> BTreeMap<String, ClassMember> {
    let mut members = BTreeMap::new();
    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        let definition = if statement.kind() == "decorated_definition" {
            statement.child_by_field_name("definition")
        } else {
            Some(statement)
        };
        let Some(definition) = definition else {
            continue;
        };
        match definition.kind() {
            "function_definition" => {
                if let Some(name) = definition.child_by_field_name("name") {
                    members.insert(source.get_text(&name).to_string(), ClassMember::Method);
                }
            }
            "expression_statement" => {
                let Some(assignment) = definition.named_child(0) else {
                    continue;
                };
                if assignment.kind() != "assignment" {
                    continue;
                }
                let (Some(left), Some(mut right)) = (
                    assignment.child_by_field_name("left"),
                    assignment.child_by_field_name("right"),
                ) else {
                    continue;
                };
                if left.kind() != "identifier" {
                    continue;
                }
                while right.kind() == "assignment" {
                    match right.child_by_field_name("right") {
                        Some(next) => right = next,
                        None => break,
                    }
                }
                members.insert(
                    source.get_text(&left).to_string(),
                    ClassMember::Value(normalize_whitespace(source.get_text(&right))),
                );
            }
            _ => {}
        }
    }
    members
}

/// Every class below `node`, not looking inside function bodies.
fn collect_classes(source: &PythonSource, node: Node, path: &Path, found: &mut Vec<ClassDef>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => {}
            "class_definition" => {
                if let Some(class) = class_def(source, child, path) {
                    found.push(class);
                }
                collect_classes(source, child, path, found);
            }
            _ => collect_classes(source, child, path, found),
        }
    }
}

fn class_def(source: &PythonSource, node: Node, path: &Path) -> Option<ClassDef> {
    let name = source.get_text(&node.child_by_field_name("name")?).to_string();
    let mut bases = Vec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            if let Some(base) = base_name(source, base) {
                bases.push(base);
            }
        }
    }
    let members = node
        .child_by_field_name("body")
        .map(|body| class_members(source, body))
        .unwrap_or_default();
    let column = node.start_position().column;
    Some(ClassDef {
        name,
        bases,
        source: dedent(source.get_text(&node), column),
        members,
        path: path.to_path_buf(),
    })
}
