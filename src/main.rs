#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use aiwriter::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use aiwriter::config::KEY_API_KEY;
use aiwriter::{
    logger, BlockingClient, Dispatcher, JsonFileStore, OpenAiClient, SettingsError, SettingsStore,
    Strings,
};
use serde_json::Value;

mod ui;

/// The settings file, with `OPENAI_API_KEY` standing in while no key has been
/// saved. The environment value is never written back.
struct EnvFallback {
    file: JsonFileStore,
    api_key: Option<String>,
}

impl SettingsStore for EnvFallback {
    fn get(&self, key: &str, default: Value) -> Value {
        let stored = self.file.get(key, default);
        match (&self.api_key, &stored) {
            (Some(env), Value::String(s)) if key == KEY_API_KEY && s.is_empty() => {
                Value::from(env.as_str())
            }
            _ => stored,
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.file.set(key, value)
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn main() -> anyhow::Result<()> {
    logger::init();

    let file = JsonFileStore::new(JsonFileStore::default_path());
    tracing::info!(path = %file.path().display(), "settings file");
    let store = EnvFallback {
        file,
        api_key: env_nonempty("OPENAI_API_KEY"),
    };

    let locale = env_nonempty("AIWRITER_LANG")
        .or_else(|| env_nonempty("LANG"))
        .unwrap_or_default();
    let strings = Strings::for_locale(&locale);

    let endpoint = env_nonempty("AIWRITER_API_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    tracing::info!(%endpoint, %locale, "completion endpoint");
    let client = BlockingClient::new(OpenAiClient::new(endpoint, DEFAULT_TIMEOUT)?)?;

    ui::run(Dispatcher::new(store, client, strings))
}
