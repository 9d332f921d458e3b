//! What the editor hosting us has to provide.

use std::collections::BTreeMap;

/// The active document, seen through its current selection.
pub trait Document {
    fn selection(&self) -> String;
    /// Replace the selected range (or insert at the cursor) with `text`.
    fn replace_selection(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSpec {
    pub title: String,
    pub fields: Vec<FormField>,
}

pub type FormValues = BTreeMap<String, String>;

/// Modal UI. Both calls block until the user is done.
pub trait Dialogs {
    fn show_message(&mut self, title: &str, message: &str, kind: MessageKind);
    /// `None` when the user cancels.
    fn show_form(&mut self, form: &FormSpec) -> Option<FormValues>;
}
