use std::fmt::Write as _;

use crate::domain::{ScalarKind, SchemaNode, SelectOption};
use crate::path::FieldPath;

/// Mounted form control. Paths are absolute from the data root.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlNode {
    Group(GroupControl),
    Array(ArrayControl),
    Input(InputControl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupControl {
    pub path: FieldPath,
    pub label: String,
    pub children: Vec<ControlNode>,
}

/// Repeating container. Keeps its item schema so new items can be rendered later.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayControl {
    pub path: FieldPath,
    pub label: String,
    pub item_schema: SchemaNode,
    pub min_items: usize,
    pub items: Vec<ItemGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemGroup {
    pub index: usize,
    pub path: FieldPath,
    pub children: Vec<ControlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputControl {
    pub path: FieldPath,
    pub label: String,
    pub kind: ScalarKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub options: Vec<SelectOption>,
    pub value: String,
}

/// How an input would be presented by a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Line,
    MultiLine,
    Choice,
}

impl InputControl {
    pub fn widget(&self) -> Widget {
        match self.kind {
            ScalarKind::Textarea => Widget::MultiLine,
            ScalarKind::Select => Widget::Choice,
            _ => Widget::Line,
        }
    }
}

impl ControlNode {
    pub fn path(&self) -> &FieldPath {
        match self {
            ControlNode::Group(group) => &group.path,
            ControlNode::Array(array) => &array.path,
            ControlNode::Input(input) => &input.path,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ControlNode::Group(group) => &group.label,
            ControlNode::Array(array) => &array.label,
            ControlNode::Input(input) => &input.label,
        }
    }

    pub fn find_array(&self, path: &FieldPath) -> Option<&ArrayControl> {
        match self {
            ControlNode::Array(array) if array.path == *path => Some(array),
            ControlNode::Array(array) => array
                .items
                .iter()
                .flat_map(|item| item.children.iter())
                .find_map(|child| child.find_array(path)),
            ControlNode::Group(group) => group
                .children
                .iter()
                .find_map(|child| child.find_array(path)),
            ControlNode::Input(_) => None,
        }
    }

    pub fn find_array_mut(&mut self, path: &FieldPath) -> Option<&mut ArrayControl> {
        match self {
            ControlNode::Array(array) => {
                if array.path == *path {
                    return Some(array);
                }
                array
                    .items
                    .iter_mut()
                    .flat_map(|item| item.children.iter_mut())
                    .find_map(|child| child.find_array_mut(path))
            }
            ControlNode::Group(group) => group
                .children
                .iter_mut()
                .find_map(|child| child.find_array_mut(path)),
            ControlNode::Input(_) => None,
        }
    }

    pub fn find_input(&self, path: &FieldPath) -> Option<&InputControl> {
        match self {
            ControlNode::Input(input) if input.path == *path => Some(input),
            ControlNode::Input(_) => None,
            ControlNode::Array(array) => array
                .items
                .iter()
                .flat_map(|item| item.children.iter())
                .find_map(|child| child.find_input(path)),
            ControlNode::Group(group) => group
                .children
                .iter()
                .find_map(|child| child.find_input(path)),
        }
    }

    pub fn find_input_mut(&mut self, path: &FieldPath) -> Option<&mut InputControl> {
        match self {
            ControlNode::Input(input) if input.path == *path => Some(input),
            ControlNode::Input(_) => None,
            ControlNode::Array(array) => array
                .items
                .iter_mut()
                .flat_map(|item| item.children.iter_mut())
                .find_map(|child| child.find_input_mut(path)),
            ControlNode::Group(group) => group
                .children
                .iter_mut()
                .find_map(|child| child.find_input_mut(path)),
        }
    }

    /// Pre-order visit of every mounted input.
    pub fn for_each_input<'a>(&'a self, visit: &mut impl FnMut(&'a InputControl)) {
        match self {
            ControlNode::Input(input) => visit(input),
            ControlNode::Group(group) => {
                for child in &group.children {
                    child.for_each_input(visit);
                }
            }
            ControlNode::Array(array) => {
                for child in array.items.iter().flat_map(|item| item.children.iter()) {
                    child.for_each_input(visit);
                }
            }
        }
    }

    /// Rewrite the index at `depth` in this control's path and every descendant's.
    pub fn rebase(&mut self, depth: usize, index: usize) {
        match self {
            ControlNode::Input(input) => input.path = input.path.with_index_at(depth, index),
            ControlNode::Group(group) => {
                group.path = group.path.with_index_at(depth, index);
                for child in &mut group.children {
                    child.rebase(depth, index);
                }
            }
            ControlNode::Array(array) => {
                array.path = array.path.with_index_at(depth, index);
                for item in &mut array.items {
                    item.rebase(depth, index);
                }
            }
        }
    }

    /// Indented text rendering of the tree, one control per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            ControlNode::Group(group) => {
                if !group.label.is_empty() {
                    let _ = writeln!(out, "{pad}{}", group.label);
                }
                let next = if group.label.is_empty() { depth } else { depth + 1 };
                for child in &group.children {
                    child.write_outline(out, next);
                }
            }
            ControlNode::Array(array) => {
                let _ = writeln!(
                    out,
                    "{pad}{} [{}] ({} items, min {})",
                    array.label,
                    array.path,
                    array.items.len(),
                    array.min_items
                );
                for item in &array.items {
                    let _ = writeln!(out, "{pad}  Item {}", item.index + 1);
                    for child in &item.children {
                        child.write_outline(out, depth + 2);
                    }
                }
            }
            ControlNode::Input(input) => {
                let marker = if input.required { " *" } else { "" };
                let _ = write!(
                    out,
                    "{pad}{}{marker} <{}> {}",
                    input.label,
                    input.kind.as_str(),
                    input.path
                );
                if !input.value.is_empty() {
                    let _ = write!(out, " = {:?}", input.value);
                }
                out.push('\n');
            }
        }
    }
}

impl ItemGroup {
    pub fn rebase(&mut self, depth: usize, index: usize) {
        self.path = self.path.with_index_at(depth, index);
        for child in &mut self.children {
            child.rebase(depth, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::render;

    fn nested() -> ControlNode {
        let voci = SchemaNode::array("Voci", 1, SchemaNode::scalar(ScalarKind::Text, "Voce"));
        let gruppi = SchemaNode::array("Gruppi", 2, SchemaNode::object(None, [("voci", voci)]));
        render(
            &SchemaNode::object(None, [("gruppi", gruppi)]),
            &FieldPath::root(),
        )
    }

    #[test]
    fn finds_nested_arrays_mutably() {
        let mut root = nested();
        let inner = FieldPath::parse("gruppi[1].voci").expect("path");
        let array = root.find_array_mut(&inner).expect("inner array");
        array.min_items = 3;
        assert_eq!(root.find_array(&inner).map(|array| array.min_items), Some(3));

        let outer = FieldPath::parse("gruppi").expect("path");
        assert_eq!(
            root.find_array_mut(&outer).map(|array| array.items.len()),
            Some(2)
        );
        assert!(root.find_array_mut(&FieldPath::parse("voci").expect("path")).is_none());
    }

    #[test]
    fn finds_inputs_inside_items() {
        let mut root = nested();
        let path = FieldPath::parse("gruppi[0].voci[0]").expect("path");
        root.find_input_mut(&path).expect("input").value = "uno".to_string();
        assert_eq!(root.find_input(&path).map(|input| input.value.as_str()), Some("uno"));
    }
}
