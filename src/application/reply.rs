//! Outbound reply model.

/// One selectable menu entry: a human label plus the opaque token the
/// transport echoes back on selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// A structured menu: rows of buttons, rendered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    rows: Vec<Vec<Button>>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row of buttons.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Appends a row holding a single button.
    pub fn single(self, label: impl Into<String>, token: impl Into<String>) -> Self {
        self.row(vec![Button::new(label, token)])
    }

    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    /// All tokens in the menu, row by row.
    pub fn tokens(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .map(|b| b.token.as_str())
            .collect()
    }
}

/// Outbound text with an optional menu for the next expected selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub menu: Option<Menu>,
}

impl Reply {
    /// A plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }

    /// A reply with a menu attached.
    pub fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
        Self {
            text: text.into(),
            menu: Some(menu),
        }
    }
}
