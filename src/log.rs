//! Logging setup shared by the CLI, the benchmark runner and the wasm glue.

#[cfg(not(target_arch = "wasm32"))]
use log::LevelFilter;

/// Environment variable that switches the native logger to `Debug`.
pub const DEBUG_ENV_VAR: &str = "WORDEQ_DEBUG";

/// Whether [`DEBUG_ENV_VAR`] is set to anything but `0`/`false`/empty.
#[must_use]
pub fn debug_requested() -> bool {
    #[cfg(target_arch = "wasm32")]
    {
        false
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var(DEBUG_ENV_VAR)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"))
            .unwrap_or(false)
    }
}

/// Initialize logging for the solver.
///
/// # Behavior
/// - **Native (CLI):** `Debug` if `debug_enabled`, otherwise `Info`; `RUST_LOG` overrides both.
/// - **WASM:** logs to the browser console at `Debug` or `Info`.
///
/// Calling this more than once keeps the first logger.
pub fn init_logger(debug_enabled: bool) {
    #[cfg(target_arch = "wasm32")]
    {
        let level = if debug_enabled {
            log::Level::Debug
        } else {
            log::Level::Info
        };

        match console_log::init_with_level(level) {
            Ok(()) => log::info!("WASM logger initialized at {level:?} level"),
            Err(e) => {
                let msg = format!("Failed to initialize console_log: {e}. Logging will be unavailable.");
                web_sys::console::error_1(&msg.into());
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let level = if debug_enabled {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };

        let mut builder = env_logger::Builder::new();
        builder
            .filter(None, level)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false);

        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }

        if builder.try_init().is_ok() {
            log::debug!("native logger initialized at {level:?} level");
        }
    }
}
