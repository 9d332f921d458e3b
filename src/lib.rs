//! Writing assistant core: take the selected text, ask a chat-completions
//! endpoint to complete, summarize, improve, expand or translate it, and put
//! the answer back under the selection.
//!
//! The editor is reached only through [`host::Document`] and
//! [`host::Dialogs`]; the `aiwriter` binary provides an egui implementation.

pub mod client;
pub mod command;
pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod insert;
pub mod logger;
pub mod strings;

pub use client::{BlockingClient, Completer, CompletionRequest, OpenAiClient};
pub use command::{build_prompt, Command};
pub use config::{JsonFileStore, MemoryStore, Settings, SettingsStore};
pub use dispatch::{Dispatcher, Outcome, SettingsFailurePolicy};
pub use error::{CompletionError, Error, SettingsError, ValidationError};
pub use strings::Strings;
