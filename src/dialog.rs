//! Settings and translation forms, described as data and rendered by the host.

use crate::config::{
    Settings, SettingsStore, KEY_API_KEY, KEY_LANGUAGE, KEY_MAX_TOKENS, KEY_MODEL,
    KEY_TEMPERATURE,
};
use crate::error::ValidationError;
use crate::host::{Dialogs, FieldKind, FormField, FormSpec, FormValues};
use crate::strings::Strings;

#[derive(Debug, Clone, PartialEq)]
pub enum FormResult<T> {
    Confirmed(T),
    /// The stored values, unchanged.
    Cancelled(T),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRecord {
    pub openai_api_key: String,
    pub model: String,
    /// `None` when the field was not all digits or does not fit a `u32`.
    pub max_tokens: Option<u32>,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub language: String,
}

fn field(key: &'static str, label: &str, value: String, kind: FieldKind) -> FormField {
    FormField {
        key,
        label: label.to_string(),
        value,
        kind,
    }
}

pub fn settings_form(store: &dyn SettingsStore, strings: &Strings) -> FormSpec {
    // Raw stored text so an odd value is shown as-is rather than replaced.
    let raw = |key, default: &str| store.get_string(key, default);
    FormSpec {
        title: strings.settings.clone(),
        fields: vec![
            field(KEY_API_KEY, &strings.openai_api_key, raw(KEY_API_KEY, ""), FieldKind::Secret),
            field(KEY_MODEL, &strings.openai_model, raw(KEY_MODEL, crate::config::DEFAULT_MODEL), FieldKind::Text),
            field(KEY_MAX_TOKENS, &strings.max_tokens, raw(KEY_MAX_TOKENS, "1000"), FieldKind::Number),
            field(KEY_TEMPERATURE, &strings.temperature, raw(KEY_TEMPERATURE, "0.5"), FieldKind::Number),
        ],
    }
}

pub fn translation_form(store: &dyn SettingsStore, strings: &Strings) -> FormSpec {
    FormSpec {
        title: strings.translate.clone(),
        fields: vec![field(
            KEY_LANGUAGE,
            &strings.translate_to,
            store.get_string(KEY_LANGUAGE, ""),
            FieldKind::Text,
        )],
    }
}

pub fn settings_dialog(
    dialogs: &mut dyn Dialogs,
    store: &dyn SettingsStore,
    strings: &Strings,
) -> Result<FormResult<SettingsRecord>, ValidationError> {
    let form = settings_form(store, strings);
    match dialogs.show_form(&form) {
        Some(values) => parse_settings(&values).map(FormResult::Confirmed),
        None => {
            let current = Settings::load(store);
            Ok(FormResult::Cancelled(SettingsRecord {
                openai_api_key: current.openai_api_key,
                model: current.model,
                max_tokens: Some(current.max_tokens),
                temperature: current.temperature,
            }))
        }
    }
}

fn parse_settings(values: &FormValues) -> Result<SettingsRecord, ValidationError> {
    let text = |key: &str| values.get(key).cloned().unwrap_or_default();

    let temperature_text = text(KEY_TEMPERATURE);
    let temperature = temperature_text
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| ValidationError::InvalidTemperature(temperature_text.clone()))?;

    let max_tokens_text = text(KEY_MAX_TOKENS);
    let max_tokens = if !max_tokens_text.is_empty() && max_tokens_text.bytes().all(|b| b.is_ascii_digit()) {
        let parsed = max_tokens_text.parse().ok();
        if parsed.is_none() {
            tracing::warn!(value = %max_tokens_text, "max_tokens is out of range");
        }
        parsed
    } else {
        None
    };

    Ok(SettingsRecord {
        openai_api_key: text(KEY_API_KEY),
        model: text(KEY_MODEL),
        max_tokens,
        temperature,
    })
}

/// The language typed by the user, or the stored one when the form is cancelled.
pub fn translation_dialog(
    dialogs: &mut dyn Dialogs,
    store: &dyn SettingsStore,
    strings: &Strings,
) -> TranslationRecord {
    let form = translation_form(store, strings);
    let language = match dialogs.show_form(&form) {
        Some(values) => values.get(KEY_LANGUAGE).cloned().unwrap_or_default(),
        None => store.get_string(KEY_LANGUAGE, ""),
    };
    TranslationRecord { language }
}
