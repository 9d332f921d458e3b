//! User-facing text. Two built-in tables; unknown locales get Spanish.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strings {
    pub error: String,
    pub no_text_selected: String,
    pub no_api_key: String,

    pub settings: String,
    pub translate: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub max_tokens: String,
    pub temperature: String,
    pub translate_to: String,

    pub prompt_assistant: String,
    pub prompt_complete: String,
    pub prompt_summarize: String,
    pub prompt_improve: String,
    pub prompt_expand: String,
    pub prompt_translate: String,

    pub command_complete: String,
    pub command_summarize: String,
    pub command_improve: String,
    pub command_expand: String,
    pub command_translate: String,

    pub block_start: String,
    pub block_end: String,
}

impl Strings {
    pub fn for_locale(locale: &str) -> Self {
        let lang = locale.get(..2).unwrap_or_default().to_ascii_lowercase();
        match lang.as_str() {
            "en" => Self::english(),
            _ => Self::spanish(),
        }
    }

    pub fn english() -> Self {
        Self {
            error: "Error".into(),
            no_text_selected: "No text selected. Select some text and try again.".into(),
            no_api_key: "No OpenAI API key configured. Open Settings and enter one.".into(),
            settings: "Settings".into(),
            translate: "Translate".into(),
            openai_api_key: "OpenAI API key".into(),
            openai_model: "Model".into(),
            max_tokens: "Max tokens".into(),
            temperature: "Temperature".into(),
            translate_to: "Translate to".into(),
            prompt_assistant: "You are a writing assistant. Answer only with the requested text, \
                without explanations or preambles."
                .into(),
            prompt_complete: "Continue the following text".into(),
            prompt_summarize: "Summarize the following text".into(),
            prompt_improve: "Improve the writing of the following text".into(),
            prompt_expand: "Expand the following text with more detail".into(),
            prompt_translate: "Translate the following text to".into(),
            command_complete: "Completion".into(),
            command_summarize: "Summary".into(),
            command_improve: "Improvement".into(),
            command_expand: "Expansion".into(),
            command_translate: "Translation".into(),
            block_start: "START".into(),
            block_end: "END".into(),
        }
    }

    pub fn spanish() -> Self {
        Self {
            error: "Error".into(),
            no_text_selected: "No hay texto seleccionado. Selecciona un texto e inténtalo de nuevo."
                .into(),
            no_api_key: "No hay una clave de API de OpenAI configurada. Abre Configuración e \
                introduce una."
                .into(),
            settings: "Configuración".into(),
            translate: "Traducir".into(),
            openai_api_key: "Clave API de OpenAI".into(),
            openai_model: "Modelo".into(),
            max_tokens: "Tokens máximos".into(),
            temperature: "Temperatura".into(),
            translate_to: "Traducir a".into(),
            prompt_assistant: "Eres un asistente de escritura. Responde solo con el texto \
                solicitado, sin explicaciones ni preámbulos."
                .into(),
            prompt_complete: "Continúa el siguiente texto".into(),
            prompt_summarize: "Resume el siguiente texto".into(),
            prompt_improve: "Mejora la redacción del siguiente texto".into(),
            prompt_expand: "Amplía el siguiente texto con más detalle".into(),
            prompt_translate: "Traduce el siguiente texto al".into(),
            command_complete: "Completado".into(),
            command_summarize: "Resumen".into(),
            command_improve: "Mejora".into(),
            command_expand: "Ampliación".into(),
            command_translate: "Traducción".into(),
            block_start: "INICIO".into(),
            block_end: "FIN".into(),
        }
    }
}

impl Default for Strings {
    fn default() -> Self {
        Self::spanish()
    }
}
