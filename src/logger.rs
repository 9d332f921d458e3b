use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

static INIT: OnceCell<()> = OnceCell::new();

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Install the global subscriber. Writes to `aiwriter.log` next to the
/// executable, or stderr when that file can't be opened. Level comes from
/// `AIWRITER_LOG` (default `info`). Safe to call more than once.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_env("AIWRITER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);
        let path = exe_dir().join("aiwriter.log");
        let installed = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => builder.with_writer(Mutex::new(file)).try_init(),
            Err(_) => builder.with_writer(std::io::stderr).try_init(),
        };
        if installed.is_ok() {
            tracing::info!(log = %path.display(), "===== aiwriter start =====");
        }
    });
}
