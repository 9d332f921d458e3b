use crate::strings::Strings;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Settings,
    Translate,
    Complete,
    Summarize,
    Improve,
    Expand,
}

/// Modal form a command opens before doing its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraDialog {
    None,
    Settings,
    Translation,
}

/// Static description of a command: its preconditions and the text it uses.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub id: &'static str,
    pub needs_selection: bool,
    pub needs_api_key: bool,
    pub dialog: ExtraDialog,
    pub prompt: Option<fn(&Strings) -> &str>,
    pub label: Option<fn(&Strings) -> &str>,
}

static SPECS: [CommandSpec; 6] = [
    CommandSpec {
        id: "settings",
        needs_selection: false,
        needs_api_key: false,
        dialog: ExtraDialog::Settings,
        prompt: None,
        label: None,
    },
    CommandSpec {
        id: "translate",
        needs_selection: true,
        needs_api_key: true,
        dialog: ExtraDialog::Translation,
        prompt: Some(|s| s.prompt_translate.as_str()),
        label: Some(|s| s.command_translate.as_str()),
    },
    CommandSpec {
        id: "complete",
        needs_selection: true,
        needs_api_key: true,
        dialog: ExtraDialog::None,
        prompt: Some(|s| s.prompt_complete.as_str()),
        label: Some(|s| s.command_complete.as_str()),
    },
    CommandSpec {
        id: "summarize",
        needs_selection: true,
        needs_api_key: true,
        dialog: ExtraDialog::None,
        prompt: Some(|s| s.prompt_summarize.as_str()),
        label: Some(|s| s.command_summarize.as_str()),
    },
    CommandSpec {
        id: "improve",
        needs_selection: true,
        needs_api_key: true,
        dialog: ExtraDialog::None,
        prompt: Some(|s| s.prompt_improve.as_str()),
        label: Some(|s| s.command_improve.as_str()),
    },
    CommandSpec {
        id: "expand",
        needs_selection: true,
        needs_api_key: true,
        dialog: ExtraDialog::None,
        prompt: Some(|s| s.prompt_expand.as_str()),
        label: Some(|s| s.command_expand.as_str()),
    },
];

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Settings,
        Command::Translate,
        Command::Complete,
        Command::Summarize,
        Command::Improve,
        Command::Expand,
    ];

    pub fn spec(self) -> &'static CommandSpec {
        &SPECS[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.spec().id
    }

    /// Localized name of the command as shown in inserted blocks.
    pub fn label(self, strings: &Strings) -> Option<&str> {
        self.spec().label.map(|f| f(strings))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Instruction sent as the user message. `None` for commands that never call
/// the model. The target language is embedded verbatim.
pub fn build_prompt(
    strings: &Strings,
    command: Command,
    text: &str,
    language: Option<&str>,
) -> Option<String> {
    let instruction = (command.spec().prompt?)(strings);
    match command {
        Command::Translate => Some(format!(
            "{} {}: {}",
            instruction,
            language.unwrap_or_default(),
            text
        )),
        _ => Some(format!("{}: {}", instruction, text)),
    }
}
