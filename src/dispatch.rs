use crate::client::{Completer, CompletionRequest};
use crate::command::{build_prompt, Command, ExtraDialog};
use crate::config::{
    Settings, SettingsStore, KEY_API_KEY, KEY_LANGUAGE, KEY_MAX_TOKENS, KEY_MODEL, KEY_TEMPERATURE,
};
use crate::dialog::{settings_dialog, translation_dialog, FormResult, SettingsRecord};
use crate::error::{Error, SettingsError, ValidationError};
use crate::host::{Dialogs, Document, MessageKind};
use crate::insert;
use crate::strings::Strings;
use serde_json::Value;

/// Where a failure inside the settings flow is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsFailurePolicy {
    /// Error dialog, like every other failure.
    #[default]
    Dialog,
    /// Append `":error: <message>"` to the current selection.
    AppendToSelection,
}

#[derive(Debug)]
pub enum Outcome {
    SettingsSaved,
    Cancelled,
    Rejected(ValidationError),
    Failed(Error),
    /// The model answered with nothing; the document is untouched.
    EmptyResult,
    Inserted,
}

pub struct Dispatcher<S, C> {
    store: S,
    client: C,
    strings: Strings,
    settings_failure: SettingsFailurePolicy,
}

impl<S: SettingsStore, C: Completer> Dispatcher<S, C> {
    pub fn new(store: S, client: C, strings: Strings) -> Self {
        Self {
            store,
            client,
            strings,
            settings_failure: SettingsFailurePolicy::default(),
        }
    }

    pub fn with_settings_failure(mut self, policy: SettingsFailurePolicy) -> Self {
        self.settings_failure = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    /// Run one user command to completion. Every user-facing problem has
    /// already been reported through `dialogs` when this returns.
    pub fn dispatch(
        &self,
        command: Command,
        doc: &mut dyn Document,
        dialogs: &mut dyn Dialogs,
    ) -> Outcome {
        tracing::info!(%command, "dispatching command");
        let outcome = match command.spec().dialog {
            ExtraDialog::Settings => self.run_settings(doc, dialogs),
            _ => self.run_completion(command, doc, dialogs),
        };
        tracing::debug!(%command, ?outcome, "command finished");
        outcome
    }

    fn run_settings(&self, doc: &mut dyn Document, dialogs: &mut dyn Dialogs) -> Outcome {
        match settings_dialog(dialogs, &self.store, &self.strings) {
            Ok(FormResult::Cancelled(_)) => Outcome::Cancelled,
            Ok(FormResult::Confirmed(record)) => match self.save_settings(&record) {
                Ok(()) => Outcome::SettingsSaved,
                Err(e) => self.settings_failed(e.into(), doc, dialogs),
            },
            Err(e) => self.settings_failed(e.into(), doc, dialogs),
        }
    }

    fn save_settings(&self, record: &SettingsRecord) -> Result<(), SettingsError> {
        self.store.set(KEY_API_KEY, Value::from(record.openai_api_key.as_str()))?;
        self.store.set(KEY_MODEL, Value::from(record.model.as_str()))?;
        match record.max_tokens {
            Some(n) => self.store.set(KEY_MAX_TOKENS, Value::from(n))?,
            None => tracing::warn!("max_tokens is not a whole number; keeping the stored value"),
        }
        self.store.set(KEY_TEMPERATURE, Value::from(record.temperature))?;
        tracing::info!(model = %record.model, "settings saved");
        Ok(())
    }

    fn settings_failed(&self, err: Error, doc: &mut dyn Document, dialogs: &mut dyn Dialogs) -> Outcome {
        tracing::error!(error = %err, policy = ?self.settings_failure, "settings flow failed");
        match self.settings_failure {
            SettingsFailurePolicy::Dialog => {
                dialogs.show_message(&self.strings.error, &err.to_string(), MessageKind::Error);
            }
            SettingsFailurePolicy::AppendToSelection => {
                let text = format!("{}:error: {}", doc.selection(), err);
                doc.replace_selection(&text);
            }
        }
        Outcome::Failed(err)
    }

    fn reject(&self, err: ValidationError, dialogs: &mut dyn Dialogs) -> Outcome {
        let message = match err {
            ValidationError::NoTextSelected => self.strings.no_text_selected.clone(),
            ValidationError::NoApiKey => self.strings.no_api_key.clone(),
            ValidationError::InvalidTemperature(_) => err.to_string(),
        };
        tracing::info!(reason = %err, "command rejected");
        dialogs.show_message(&self.strings.error, &message, MessageKind::Error);
        Outcome::Rejected(err)
    }

    fn run_completion(
        &self,
        command: Command,
        doc: &mut dyn Document,
        dialogs: &mut dyn Dialogs,
    ) -> Outcome {
        let spec = command.spec();
        let selection = doc.selection();
        if spec.needs_selection && selection.trim().is_empty() {
            return self.reject(ValidationError::NoTextSelected, dialogs);
        }

        let settings = Settings::load(&self.store);
        if spec.needs_api_key && !settings.has_api_key() {
            return self.reject(ValidationError::NoApiKey, dialogs);
        }

        let language = if spec.dialog == ExtraDialog::Translation {
            // A cancelled form hands back the stored language, which is used as-is.
            let record = translation_dialog(dialogs, &self.store, &self.strings);
            if let Err(e) = self.store.set(KEY_LANGUAGE, Value::from(record.language.as_str())) {
                return self.settings_failed(e.into(), doc, dialogs);
            }
            if record.language.is_empty() {
                return Outcome::Cancelled;
            }
            record.language
        } else {
            String::new()
        };

        let Some(user_prompt) = build_prompt(&self.strings, command, &selection, Some(language.as_str())) else {
            return Outcome::Cancelled;
        };
        let request = CompletionRequest {
            model: settings.model,
            system_prompt: self.strings.prompt_assistant.clone(),
            user_prompt,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        };

        match self.client.complete(&request, &settings.openai_api_key) {
            Ok(text) if text.is_empty() => {
                tracing::warn!(%command, "model returned an empty answer");
                Outcome::EmptyResult
            }
            Ok(text) => {
                insert::insert(doc, &self.strings, &selection, &text, command, &language);
                Outcome::Inserted
            }
            Err(e) => {
                tracing::error!(%command, error = %e, "completion failed");
                dialogs.show_message(&self.strings.error, &e.to_string(), MessageKind::Error);
                Outcome::Failed(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JsonFileStore, MemoryStore};
    use crate::error::CompletionError;
    use crate::host::{FormSpec, FormValues};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Buffer(String);

    impl Document for Buffer {
        fn selection(&self) -> String {
            self.0.clone()
        }
        fn replace_selection(&mut self, text: &str) {
            self.0 = text.to_string();
        }
    }

    #[derive(Default)]
    struct Recorder {
        messages: Vec<String>,
        forms: VecDeque<Option<FormValues>>,
    }

    impl Dialogs for Recorder {
        fn show_message(&mut self, _: &str, message: &str, _: MessageKind) {
            self.messages.push(message.to_string());
        }
        fn show_form(&mut self, _: &FormSpec) -> Option<FormValues> {
            self.forms.pop_front().flatten()
        }
    }

    struct Canned {
        reply: Result<&'static str, u16>,
        seen: RefCell<Vec<CompletionRequest>>,
    }

    impl Canned {
        fn ok(reply: &'static str) -> Self {
            Self { reply: Ok(reply), seen: RefCell::default() }
        }
    }

    impl Completer for Canned {
        fn complete(&self, request: &CompletionRequest, _: &str) -> Result<String, CompletionError> {
            self.seen.borrow_mut().push(request.clone());
            match self.reply {
                Ok(s) => Ok(s.to_string()),
                Err(status) => Err(CompletionError::Api { status, body: "bad request".into() }),
            }
        }
    }

    fn form(pairs: &[(&str, &str)]) -> Option<FormValues> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn keyed() -> MemoryStore {
        MemoryStore::new().with(KEY_API_KEY, "sk-test")
    }

    #[test]
    fn missing_key_short_circuits_every_model_command() {
        for command in [Command::Complete, Command::Summarize, Command::Improve, Command::Expand] {
            let d = Dispatcher::new(MemoryStore::new(), Canned::ok("x"), Strings::english());
            let mut doc = Buffer("some text".into());
            let mut dialogs = Recorder::default();
            let out = d.dispatch(command, &mut doc, &mut dialogs);
            assert!(matches!(out, Outcome::Rejected(ValidationError::NoApiKey)), "{command}");
            assert_eq!(dialogs.messages, [Strings::english().no_api_key]);
            assert!(d.client().seen.borrow().is_empty());
            assert_eq!(doc.0, "some text");
        }
    }

    #[test]
    fn whitespace_selection_is_rejected_before_key_check() {
        for command in Command::ALL.into_iter().filter(|c| *c != Command::Settings) {
            let d = Dispatcher::new(MemoryStore::new(), Canned::ok("x"), Strings::english());
            let mut dialogs = Recorder::default();
            let out = d.dispatch(command, &mut Buffer(" \n\t".into()), &mut dialogs);
            assert!(matches!(out, Outcome::Rejected(ValidationError::NoTextSelected)), "{command}");
            assert_eq!(dialogs.messages, [Strings::english().no_text_selected]);
            assert!(d.client().seen.borrow().is_empty());
        }
    }

    #[test]
    fn improve_builds_request_from_settings_and_inserts() {
        let store = keyed().with(KEY_MAX_TOKENS, "64").with(KEY_TEMPERATURE, 0.2).with(KEY_MODEL, "m1");
        let d = Dispatcher::new(store, Canned::ok("Better."), Strings::english());
        let mut doc = Buffer("bad txt".into());
        let out = d.dispatch(Command::Improve, &mut doc, &mut Recorder::default());

        assert!(matches!(out, Outcome::Inserted));
        let seen = d.client().seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            CompletionRequest {
                model: "m1".into(),
                system_prompt: Strings::english().prompt_assistant,
                user_prompt: format!("{}: bad txt", Strings::english().prompt_improve),
                max_tokens: 64,
                temperature: 0.2,
            }
        );
        assert_eq!(
            doc.0,
            "bad txt\n\n[---START IMPROVEMENT ---]\nBetter.\n[/---END IMPROVEMENT ---]\n\n"
        );
    }

    #[test]
    fn translate_asks_for_language_and_persists_it() {
        let d = Dispatcher::new(keyed(), Canned::ok("hello"), Strings::english());
        let mut doc = Buffer("hola".into());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(form(&[(KEY_LANGUAGE, "en")]));

        let out = d.dispatch(Command::Translate, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Inserted));
        assert_eq!(d.store().get_string(KEY_LANGUAGE, ""), "en");
        assert_eq!(
            d.client().seen.borrow()[0].user_prompt,
            format!("{} en: hola", Strings::english().prompt_translate)
        );
        assert!(doc.0.contains("[---START TRANSLATION en---]\nhello\n"));
    }

    #[test]
    fn cancelled_translation_uses_stored_language() {
        let d = Dispatcher::new(keyed().with(KEY_LANGUAGE, "fr"), Canned::ok("bonjour"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(None);
        let mut doc = Buffer("hola".into());

        let out = d.dispatch(Command::Translate, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Inserted));
        assert_eq!(d.store().get_string(KEY_LANGUAGE, ""), "fr");
        let seen = d.client().seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user_prompt, format!("{} fr: hola", Strings::english().prompt_translate));
        assert!(doc.0.contains("[---START TRANSLATION fr---]\nbonjour\n"));
    }

    #[test]
    fn translate_without_any_language_makes_no_request() {
        let d = Dispatcher::new(keyed().with(KEY_LANGUAGE, "fr"), Canned::ok("x"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(form(&[(KEY_LANGUAGE, "")]));
        dialogs.forms.push_back(None);

        let out = d.dispatch(Command::Translate, &mut Buffer("hola".into()), &mut dialogs);
        assert!(matches!(out, Outcome::Cancelled));
        assert_eq!(d.store().get_string(KEY_LANGUAGE, "unset"), "");

        // Cancelling now falls back to the empty language just stored.
        let out = d.dispatch(Command::Translate, &mut Buffer("hola".into()), &mut dialogs);
        assert!(matches!(out, Outcome::Cancelled));
        assert!(d.client().seen.borrow().is_empty());
    }

    #[test]
    fn api_error_is_shown_and_document_untouched() {
        let client = Canned { reply: Err(400), seen: RefCell::default() };
        let d = Dispatcher::new(keyed(), client, Strings::english());
        let mut doc = Buffer("text".into());
        let mut dialogs = Recorder::default();
        let out = d.dispatch(Command::Summarize, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Failed(Error::Completion(_))));
        assert_eq!(dialogs.messages, ["bad request"]);
        assert_eq!(doc.0, "text");
    }

    #[test]
    fn empty_answer_inserts_nothing() {
        let d = Dispatcher::new(keyed(), Canned::ok(""), Strings::english());
        let mut doc = Buffer("text".into());
        let out = d.dispatch(Command::Expand, &mut doc, &mut Recorder::default());
        assert!(matches!(out, Outcome::EmptyResult));
        assert_eq!(doc.0, "text");
    }

    #[test]
    fn settings_saves_fields_without_selection() {
        let d = Dispatcher::new(MemoryStore::new().with(KEY_MAX_TOKENS, 500), Canned::ok("x"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(form(&[
            (KEY_API_KEY, "sk-1"),
            (KEY_MODEL, "gpt-4o"),
            (KEY_MAX_TOKENS, "12ab"),
            (KEY_TEMPERATURE, "0.25"),
        ]));

        let out = d.dispatch(Command::Settings, &mut Buffer(String::new()), &mut dialogs);
        assert!(matches!(out, Outcome::SettingsSaved));
        let s = Settings::load(d.store());
        assert_eq!(s.openai_api_key, "sk-1");
        assert_eq!(s.model, "gpt-4o");
        assert_eq!(s.max_tokens, 500);
        assert_eq!(s.temperature, 0.25);
        assert!(dialogs.messages.is_empty());
    }

    #[test]
    fn settings_cancel_writes_nothing() {
        let d = Dispatcher::new(MemoryStore::new(), Canned::ok("x"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(None);
        let out = d.dispatch(Command::Settings, &mut Buffer(String::new()), &mut dialogs);
        assert!(matches!(out, Outcome::Cancelled));
        assert_eq!(d.store().get(KEY_MODEL, Value::Null), Value::Null);
    }

    #[test]
    fn settings_failure_follows_policy() {
        let bad = || form(&[(KEY_TEMPERATURE, "warm")]);

        let d = Dispatcher::new(MemoryStore::new(), Canned::ok("x"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(bad());
        let mut doc = Buffer("abc".into());
        let out = d.dispatch(Command::Settings, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Failed(Error::Validation(_))));
        assert_eq!(dialogs.messages.len(), 1);
        assert_eq!(doc.0, "abc");

        let d = d.with_settings_failure(SettingsFailurePolicy::AppendToSelection);
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(bad());
        d.dispatch(Command::Settings, &mut doc, &mut dialogs);
        assert!(dialogs.messages.is_empty());
        assert_eq!(doc.0, "abc:error: temperature must be a number, got \"warm\"");
    }

    /// Reads from memory; refuses to write `key`.
    struct RefusesKey {
        inner: MemoryStore,
        key: &'static str,
    }

    impl SettingsStore for RefusesKey {
        fn get(&self, key: &str, default: Value) -> Value {
            self.inner.get(key, default)
        }
        fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
            if key == self.key {
                return Err(SettingsError::Io {
                    path: "aiwriter.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.set(key, value)
        }
    }

    fn full_settings_form() -> Option<FormValues> {
        form(&[
            (KEY_API_KEY, "sk-1"),
            (KEY_MODEL, "gpt-4o"),
            (KEY_MAX_TOKENS, "10"),
            (KEY_TEMPERATURE, "0.1"),
        ])
    }

    #[test]
    fn unwritable_settings_file_is_reported_per_policy() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let store = JsonFileStore::new(blocker.join("aiwriter.json"));

        let d = Dispatcher::new(store, Canned::ok("x"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(full_settings_form());
        let mut doc = Buffer("abc".into());
        let out = d.dispatch(Command::Settings, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Failed(Error::Settings(_))), "{out:?}");
        assert_eq!(dialogs.messages.len(), 1);
        assert!(dialogs.messages[0].starts_with("failed to write settings file"));
        assert_eq!(doc.0, "abc");

        let d = d.with_settings_failure(SettingsFailurePolicy::AppendToSelection);
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(full_settings_form());
        let out = d.dispatch(Command::Settings, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Failed(Error::Settings(_))), "{out:?}");
        assert!(dialogs.messages.is_empty());
        assert!(doc.0.starts_with("abc:error: failed to write settings file"));
        assert_eq!(doc.0.matches(":error:").count(), 1);
    }

    #[test]
    fn failed_write_keeps_keys_saved_before_it() {
        let store = RefusesKey { inner: MemoryStore::new(), key: KEY_TEMPERATURE };
        let d = Dispatcher::new(store, Canned::ok("x"), Strings::english());
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(full_settings_form());

        let out = d.dispatch(Command::Settings, &mut Buffer(String::new()), &mut dialogs);
        assert!(matches!(out, Outcome::Failed(Error::Settings(_))));
        assert_eq!(dialogs.messages.len(), 1);
        let s = Settings::load(d.store());
        assert_eq!(s.openai_api_key, "sk-1");
        assert_eq!(s.max_tokens, 10);
        assert_eq!(d.store().get(KEY_TEMPERATURE, Value::Null), Value::Null);
    }

    #[test]
    fn unwritable_language_stops_translation() {
        let store = RefusesKey { inner: keyed(), key: KEY_LANGUAGE };
        let d = Dispatcher::new(store, Canned::ok("x"), Strings::english())
            .with_settings_failure(SettingsFailurePolicy::AppendToSelection);
        let mut dialogs = Recorder::default();
        dialogs.forms.push_back(form(&[(KEY_LANGUAGE, "en")]));
        let mut doc = Buffer("hola".into());

        let out = d.dispatch(Command::Translate, &mut doc, &mut dialogs);
        assert!(matches!(out, Outcome::Failed(Error::Settings(_))));
        assert!(dialogs.messages.is_empty());
        assert!(doc.0.starts_with("hola:error: failed to write settings file aiwriter.json"));
        assert!(d.client().seen.borrow().is_empty());
    }
}
