use std::path::{Path, PathBuf};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_BASENAME: &str = "daily-focus";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;

/// Log files sit next to the store, in their own subdirectory.
pub fn log_directory(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_DIR)
}

/// Starts file logging. The returned handle must stay alive until exit so
/// buffered lines get flushed.
#[cfg(feature = "cli")]
pub fn init_logging(
    data_dir: &Path,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    let dir = log_directory(data_dir);
    std::fs::create_dir_all(&dir)?;

    // Users can override with `DAILY_FOCUS_LOG` or `RUST_LOG`.
    let spec = crate::config::log_spec(
        std::env::var(crate::config::LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );

    let handle = Logger::try_with_str(spec)?
        .log_to_file(
            FileSpec::default()
                .directory(&dir)
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        // Stdout belongs to the command output; only problems reach the terminal.
        .duplicate_to_stderr(Duplicate::Warn)
        .start()?;

    install_panic_hook(handle.clone());

    log::info!(
        "logger initialized dir={} rotate_size_bytes={} keep_files={}",
        dir.display(),
        LOG_ROTATE_SIZE_BYTES,
        LOG_ROTATE_KEEP_FILES
    );
    Ok(handle)
}

/// Logs the panic and flushes buffered lines before the default hook runs.
#[cfg(feature = "cli")]
fn install_panic_hook(handle: flexi_logger::LoggerHandle) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let thread = std::thread::current();
        let location = info
            .location()
            .map(|loc| loc.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        log::error!(
            "panic thread={} location={location} payload={}",
            thread.name().unwrap_or("<unnamed>"),
            panic_payload_text(info.payload())
        );
        handle.flush();
        default_hook(info);
    }));
}

#[cfg(any(feature = "cli", test))]
fn panic_payload_text(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_live_under_the_data_dir() {
        let dir = log_directory(Path::new("/tmp/daily-focus"));
        assert_eq!(dir, PathBuf::from("/tmp/daily-focus/logs"));
    }

    #[test]
    fn panic_payloads_render_as_text() {
        let literal: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_payload_text(literal.as_ref()), "boom");

        let formatted: Box<dyn std::any::Any + Send> = Box::new(format!("bad id {}", 7));
        assert_eq!(panic_payload_text(formatted.as_ref()), "bad id 7");

        let other: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_payload_text(other.as_ref()), "<non-string panic payload>");
    }
}
