//! Locator descriptors
//!
//! A [`Locator`] is a declarative description of how to find a family of UI
//! elements: a chain of [`Step`]s, each scoping the next. Locators hold no
//! state and are resolved afresh by the driver on every access, since the
//! screens re-render (calendar selection, list filtering, modal open/close).
//!
//! [`Locator::selector`] renders the chain in Playwright's selector syntax,
//! which is what the browser backend sends over the wire.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::error::{WorkflowError, WorkflowResult};

/// How element text is compared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// Case-insensitive substring of the whitespace-normalised text
    Contains(String),
    /// Whole normalised text, case-sensitive
    Exact(String),
    /// Regular expression source tested against the normalised text
    Pattern(String),
}

impl TextMatch {
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    pub fn pattern(source: impl Into<String>) -> Self {
        Self::Pattern(source.into())
    }

    /// Test rendered text against this matcher
    pub fn matches(&self, text: &str) -> bool {
        let text = normalize_whitespace(text);
        match self {
            Self::Contains(needle) => text
                .to_lowercase()
                .contains(&normalize_whitespace(needle).to_lowercase()),
            Self::Exact(expected) => text == normalize_whitespace(expected),
            Self::Pattern(source) => match Regex::new(source) {
                Ok(re) => re.is_match(&text),
                Err(err) => {
                    tracing::warn!(
                        pattern = %source,
                        error = %err,
                        "invalid text pattern never matches"
                    );
                    false
                }
            },
        }
    }

    /// Reject a pattern that does not compile
    pub fn validate(&self) -> WorkflowResult<()> {
        match self {
            Self::Pattern(source) => Regex::new(source).map(|_| ()).map_err(|err| {
                WorkflowError::InvalidPattern {
                    pattern: source.clone(),
                    reason: err.to_string(),
                }
            }),
            Self::Contains(_) | Self::Exact(_) => Ok(()),
        }
    }

    fn to_selector_body(&self) -> String {
        match self {
            Self::Contains(text) => format!("{}i", quote(text)),
            Self::Exact(text) => format!("{}s", quote(text)),
            Self::Pattern(source) => format!("/{source}/"),
        }
    }
}

/// Attribute comparison inside an element query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Equals,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMatch {
    pub name: String,
    pub value: String,
    pub op: AttrOp,
}

/// Structural element query: tag, attributes, and excluded classes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementQuery {
    tag: Option<String>,
    attrs: Vec<AttrMatch>,
    excluded_classes: Vec<String>,
}

impl ElementQuery {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(AttrMatch {
            name: name.into(),
            value: value.into(),
            op: AttrOp::Equals,
        });
        self
    }

    pub fn attr_contains(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(AttrMatch {
            name: name.into(),
            value: value.into(),
            op: AttrOp::Contains,
        });
        self
    }

    pub fn role(self, role: impl Into<String>) -> Self {
        self.attr("role", role)
    }

    pub fn placeholder_contains(self, text: impl Into<String>) -> Self {
        self.attr_contains("placeholder", text)
    }

    pub fn without_class(mut self, class: impl Into<String>) -> Self {
        self.excluded_classes.push(class.into());
        self
    }

    /// Whether an element with these properties satisfies the query
    pub fn matches(&self, tag: &str, attrs: &BTreeMap<String, String>, classes: &[String]) -> bool {
        if let Some(wanted) = &self.tag {
            if !wanted.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        let attrs_ok = self.attrs.iter().all(|m| match (attrs.get(&m.name), m.op) {
            (Some(actual), AttrOp::Equals) => actual == &m.value,
            (Some(actual), AttrOp::Contains) => actual.contains(&m.value),
            (None, _) => false,
        });
        attrs_ok
            && !self
                .excluded_classes
                .iter()
                .any(|excluded| classes.iter().any(|c| c == excluded))
    }

    fn to_css(&self) -> String {
        let mut css = self.tag.clone().unwrap_or_else(|| "*".to_string());
        for m in &self.attrs {
            let op = match m.op {
                AttrOp::Equals => "=",
                AttrOp::Contains => "*=",
            };
            css.push_str(&format!("[{}{}{}]", m.name, op, quote(&m.value)));
        }
        for class in &self.excluded_classes {
            css.push_str(&format!(":not(.{class})"));
        }
        css
    }
}

/// One link of a locator chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Descendant elements matching a structural query
    Element(ElementQuery),
    /// Deepest descendant elements whose text matches
    Text(TextMatch),
    /// The parent of each current match
    Parent,
    /// Keep matches whose text matches
    HasText(TextMatch),
    /// Keep matches containing at least one element found by the locator
    Has(Locator),
    /// Keep only the n-th match (0-based)
    Nth(usize),
}

impl Step {
    fn to_selector(&self) -> String {
        match self {
            Self::Element(query) => query.to_css(),
            Self::Text(text) => format!("internal:text={}", text.to_selector_body()),
            Self::Parent => "xpath=..".to_string(),
            Self::HasText(text) => format!("internal:has-text={}", text.to_selector_body()),
            Self::Has(inner) => format!("internal:has={}", quote(&inner.selector())),
            Self::Nth(index) => format!("nth={index}"),
        }
    }
}

/// A declarative, chainable element reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    pub fn element(query: ElementQuery) -> Self {
        Self {
            steps: vec![Step::Element(query)],
        }
    }

    /// Elements with the given tag name
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::element(ElementQuery::tag(tag))
    }

    /// Deepest elements whose text matches
    pub fn text(text: TextMatch) -> Self {
        Self {
            steps: vec![Step::Text(text)],
        }
    }

    /// `tag` elements whose text contains `text`
    pub fn tag_with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::tag(tag).filter_text(TextMatch::contains(text))
    }

    /// Scope `inner` within every match of `self`
    pub fn locator(&self, inner: &Locator) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(inner.steps.iter().cloned());
        Self { steps }
    }

    pub fn parent(&self) -> Self {
        self.with_step(Step::Parent)
    }

    pub fn filter_text(&self, text: TextMatch) -> Self {
        self.with_step(Step::HasText(text))
    }

    pub fn filter_has(&self, inner: &Locator) -> Self {
        self.with_step(Step::Has(inner.clone()))
    }

    pub fn nth(&self, index: usize) -> Self {
        self.with_step(Step::Nth(index))
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Check every text pattern in the chain, nested filters included
    pub fn validate(&self) -> WorkflowResult<()> {
        self.steps.iter().try_for_each(|step| match step {
            Step::Text(text) | Step::HasText(text) => text.validate(),
            Step::Has(inner) => inner.validate(),
            Step::Element(_) | Step::Parent | Step::Nth(_) => Ok(()),
        })
    }

    /// Render in Playwright selector syntax
    pub fn selector(&self) -> String {
        self.steps
            .iter()
            .map(Step::to_selector)
            .collect::<Vec<_>>()
            .join(" >> ")
    }

    fn with_step(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

/// Collapse runs of whitespace and trim, as the browser does for text matching
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
