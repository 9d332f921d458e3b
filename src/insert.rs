use crate::command::Command;
use crate::host::Document;
use crate::strings::Strings;

/// The original selection followed by a delimited block holding the answer.
pub fn format_block(
    strings: &Strings,
    selection: &str,
    generated: &str,
    command: Command,
    language: &str,
) -> String {
    let label = command
        .label(strings)
        .unwrap_or_else(|| command.id())
        .to_uppercase();
    let language = if command == Command::Translate { language } else { "" };
    format!(
        "{selection}\n\n[---{start} {label} {language}---]\n{generated}\n[/---{end} {label} {language}---]\n\n",
        start = strings.block_start,
        end = strings.block_end,
    )
}

pub fn insert(
    doc: &mut dyn Document,
    strings: &Strings,
    selection: &str,
    generated: &str,
    command: Command,
    language: &str,
) {
    let text = format_block(strings, selection, generated, command, language);
    doc.replace_selection(&text);
    tracing::debug!(%command, chars = text.chars().count(), "result inserted");
}
