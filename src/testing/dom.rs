//! Minimal rendered-document model that resolves [`Locator`] chains the way
//! the browser engine does.

use std::collections::BTreeMap;

use crate::locator::{Locator, Step, normalize_whitespace};

/// Element builder used by the screen renderers
#[derive(Debug, Clone, Default)]
pub struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: Option<String>,
    hidden: bool,
    binding: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Tag the element with the action it triggers when clicked or filled
    pub fn bind(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn maybe_child(self, child: Option<Node>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    own_text: Option<String>,
    hidden: bool,
    binding: Option<String>,
    parent: Option<usize>,
    /// One past the last index of this element's subtree
    end: usize,
}

/// A flattened document; index 0 is the document itself
#[derive(Debug)]
pub struct Dom {
    elements: Vec<Element>,
}

impl Dom {
    pub fn new(body: Node) -> Self {
        let mut dom = Self { elements: Vec::new() };
        let document = Node::new("#document").child(body);
        dom.push(document, None);
        dom
    }

    fn push(&mut self, node: Node, parent: Option<usize>) {
        let index = self.elements.len();
        let mut attrs = node.attrs;
        if !node.classes.is_empty() {
            attrs.insert("class".to_string(), node.classes.join(" "));
        }
        self.elements.push(Element {
            tag: node.tag,
            attrs,
            classes: node.classes,
            own_text: node.text,
            hidden: node.hidden,
            binding: node.binding,
            parent,
            end: index + 1,
        });
        for child in node.children {
            self.push(child, Some(index));
        }
        let end = self.elements.len();
        self.elements[index].end = end;
    }

    fn descendants(&self, scope: usize) -> std::ops::Range<usize> {
        scope + 1..self.elements[scope].end
    }

    /// Resolve a locator to element indices in document order
    pub fn query(&self, locator: &Locator) -> Vec<usize> {
        self.query_from(vec![0], locator.steps())
    }

    fn query_from(&self, mut current: Vec<usize>, steps: &[Step]) -> Vec<usize> {
        for step in steps {
            current = match step {
                Step::Element(query) => self.collect(&current, |i| {
                    let el = &self.elements[i];
                    query.matches(&el.tag, &el.attrs, &el.classes)
                }),
                Step::Text(matcher) => self.collect(&current, |i| {
                    matcher.matches(&self.text(i))
                        && !self
                            .descendants(i)
                            .any(|d| matcher.matches(&self.text(d)))
                }),
                Step::Parent => {
                    let mut parents: Vec<usize> = current
                        .iter()
                        .filter_map(|&i| self.elements[i].parent)
                        .collect();
                    parents.sort_unstable();
                    parents.dedup();
                    parents
                }
                Step::HasText(matcher) => current
                    .into_iter()
                    .filter(|&i| matcher.matches(&self.text(i)))
                    .collect(),
                Step::Has(inner) => current
                    .into_iter()
                    .filter(|&i| !self.query_from(vec![i], inner.steps()).is_empty())
                    .collect(),
                Step::Nth(n) => current.get(*n).map(|&i| vec![i]).unwrap_or_default(),
            };
        }
        current
    }

    fn collect(&self, scopes: &[usize], keep: impl Fn(usize) -> bool) -> Vec<usize> {
        let mut found: Vec<usize> = scopes
            .iter()
            .flat_map(|&scope| self.descendants(scope))
            .filter(|&i| keep(i))
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Rendered text of the subtree, block pieces separated by spaces
    pub fn text(&self, index: usize) -> String {
        let pieces: Vec<&str> = (index..self.elements[index].end)
            .filter_map(|i| self.elements[i].own_text.as_deref())
            .collect();
        normalize_whitespace(&pieces.join(" "))
    }

    pub fn is_visible(&self, index: usize) -> bool {
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            if self.elements[i].hidden {
                return false;
            }
            cursor = self.elements[i].parent;
        }
        true
    }

    pub fn binding(&self, index: usize) -> Option<&str> {
        self.elements[index].binding.as_deref()
    }

    pub fn tag(&self, index: usize) -> &str {
        &self.elements[index].tag
    }
}
