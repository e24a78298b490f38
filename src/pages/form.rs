//! Modal form protocol shared by the creation and edit dialogs.

use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::{ElementQuery, Locator, TextMatch};
use crate::pages::Session;

/// How a text-like control is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Write over whatever the control holds
    Replace,
    /// Empty the control first; used when editing prefilled values
    ClearThenFill,
}

/// Kind of control a form field is bound to
#[derive(Debug, Clone)]
pub enum Control {
    Text(Locator),
    Number(Locator),
    /// Custom select: a trigger that opens a list of options
    Dropdown(Locator),
}

/// The modal dialog hosting a form
#[derive(Debug, Clone)]
pub struct Dialog {
    root: Locator,
}

impl Default for Dialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialog {
    pub fn new() -> Self {
        Self {
            root: Locator::element(ElementQuery::tag("div").role("dialog")),
        }
    }

    pub fn root(&self) -> &Locator {
        &self.root
    }

    /// Scope `inner` to the dialog
    pub fn within(&self, inner: &Locator) -> Locator {
        self.root.locator(inner)
    }

    pub fn input(&self, placeholder: &str) -> Locator {
        self.within(&Locator::element(
            ElementQuery::tag("input").placeholder_contains(placeholder),
        ))
    }

    pub fn textarea(&self, placeholder: &str) -> Locator {
        self.within(&Locator::element(
            ElementQuery::tag("textarea").placeholder_contains(placeholder),
        ))
    }

    pub fn number_input(&self) -> Locator {
        self.within(&Locator::element(ElementQuery::tag("input").attr("type", "number")))
    }

    pub fn button(&self, label: &str) -> Locator {
        self.within(&Locator::tag_with_text("button", label))
    }

    /// The n-th select trigger of the dialog, in DOM order
    pub fn combobox(&self, index: usize) -> Locator {
        self.within(&Locator::element(ElementQuery::tag("button").role("combobox")))
            .nth(index)
    }

    pub async fn is_open<D: Driver>(&self, session: &Session<D>) -> WorkflowResult<bool> {
        session.driver().is_visible(&self.root).await
    }

    pub async fn wait_open<D: Driver>(&self, session: &Session<D>) -> WorkflowResult<()> {
        session.wait_visible(&self.root).await
    }

    pub async fn wait_closed<D: Driver>(&self, session: &Session<D>) -> WorkflowResult<()> {
        session.wait_hidden(&self.root).await
    }

    /// Click the first button whose label matches one of `labels`, trying
    /// the labels in order. The dialog is expected to offer exactly one.
    pub async fn commit_with<D: Driver>(
        &self,
        session: &Session<D>,
        labels: &[&str],
    ) -> WorkflowResult<()> {
        for label in labels {
            let button = self.button(label);
            if session.driver().count(&button).await? > 0 {
                tracing::debug!(label, "committing form");
                return session.click(&button.first()).await;
            }
        }
        Err(WorkflowError::NotFound {
            what: format!("button labelled {}", labels.join(" or ")),
            selector: self.root.selector(),
        })
    }
}

/// Option entry of an open select list. Options render outside the dialog.
pub fn option(text: &str) -> Locator {
    Locator::element(ElementQuery::tag("div").role("option")).filter_text(TextMatch::exact(text))
}

/// Open a select, wait until the wanted option is rendered, then pick it.
/// The wait is a predicate on the option itself, bounded by the action
/// timeout, rather than a fixed delay.
pub async fn select_option<D: Driver>(
    session: &Session<D>,
    trigger: &Locator,
    option_text: &str,
) -> WorkflowResult<()> {
    session.click(trigger).await?;
    let entry = option(option_text);
    session.wait_visible(&entry).await?;
    session.click(&entry).await
}

/// Write `value` into `control` using the protocol its kind requires
pub async fn set_control<D: Driver>(
    session: &Session<D>,
    control: &Control,
    value: &str,
    mode: FillMode,
) -> WorkflowResult<()> {
    match control {
        Control::Text(locator) | Control::Number(locator) => {
            if mode == FillMode::ClearThenFill {
                session.clear(locator).await?;
            }
            session.fill(locator, value).await
        }
        Control::Dropdown(trigger) => select_option(session, trigger, value).await,
    }
}
