use crate::log::init_logger;
use crate::sigma::SolutionEntry;
use crate::solver::{solve_equation, HistoryExport, SolverConfig, SolverError};
use wasm_bindgen::prelude::*;

/// Structured error information for JavaScript consumers
#[derive(serde::Serialize)]
struct WasmError {
    /// Error code (e.g., "E004", "S002")
    code: String,
    /// Display message
    message: String,
    /// Short description of error type
    description: String,
    /// Detailed explanation
    details: String,
    /// Optional helpful suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

impl From<SolverError> for WasmError {
    fn from(e: SolverError) -> Self {
        // For ParseFailure, surface the nested ParseError
        match &e {
            SolverError::ParseFailure(pe) => WasmError {
                code: pe.code().to_string(),
                message: pe.to_string(),
                description: pe.description().to_string(),
                details: pe.details().to_string(),
                help: pe.help().map(ToString::to_string),
            },
            SolverError::InvalidConfig { .. } => WasmError {
                code: e.code().to_string(),
                message: e.to_string(),
                description: e.description().to_string(),
                details: e.details().to_string(),
                help: e.help().map(ToString::to_string),
            },
        }
    }
}

impl From<WasmError> for JsValue {
    fn from(e: WasmError) -> Self {
        let mut msg = format!("Error {}: {}", e.code, e.message);

        if !e.details.is_empty() {
            msg.push_str(&format!("\n\n{}", e.details));
        }

        if let Some(help) = e.help {
            msg.push_str(&format!("\n\nSuggestion: {help}"));
        }

        js_sys::Error::new(&msg).into()
    }
}

/// Validate all internal regex patterns compile successfully.
///
/// Forces LazyLock initialization of all static regexes so any compilation
/// errors occur at startup rather than on first user query.
///
/// ## IMPORTANT: Adding a new regex?
/// If you add a new `LazyLock<Regex>` anywhere in the codebase, you MUST add it here.
fn validate_internal_regexes() {
    let _ = &*crate::parser::LETTER_RE;
    let _ = &*crate::parser::VARIABLE_RE;
    log::debug!("Internal regex patterns validated successfully");
}

/// Initialize logging and validation with the specified debug setting.
///
/// This function must be called from JavaScript after the WASM module loads.
#[wasm_bindgen]
pub fn initialize(debug_enabled: bool) {
    console_error_panic_hook::set_once();
    validate_internal_regexes();
    init_logger(debug_enabled);

    log::info!("WASM module initialized");
    if !debug_enabled {
        log::info!("Debug logging disabled");
    }
}

#[derive(serde::Serialize)]
struct WasmSolveResult {
    state: String,
    found: bool,
    solution: Vec<SolutionEntry>,
    iterations: usize,
    elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    history_dot: Option<String>,
}

/// JS entry: (input: string, max_iterations: number, full_traversal: boolean, export_history: boolean)
#[wasm_bindgen]
pub fn solve_equation_wasm(
    input: &str,
    max_iterations: usize,
    full_traversal: bool,
    export_history: bool,
) -> Result<JsValue, JsValue> {
    let config = SolverConfig {
        full_traversal,
        max_iterations_count: max_iterations,
        history_export: HistoryExport { enabled: export_history, include_ignored: true },
        ..SolverConfig::default()
    };
    let result = solve_equation(input, &config).map_err(WasmError::from)?;

    let wasm_result = WasmSolveResult {
        state: result.state.to_string(),
        found: result.state.is_found(),
        solution: result.solution.as_ref().map(|s| s.to_pairs()).unwrap_or_default(),
        iterations: result.iterations,
        elapsed_ms: result.elapsed.as_secs_f64() * 1000.0,
        history_dot: result.to_dot(),
    };

    serde_wasm_bindgen::to_value(&wasm_result).map_err(|e| {
        WasmError {
            code: "WASM001".to_string(),
            message: format!("serialization failed: {e}"),
            description: "Failed to serialize result".to_string(),
            details: "The solver result could not be converted to JavaScript format.".to_string(),
            help: Some("This is an internal error. Please report this issue.".to_string()),
        }
        .into()
    })
}

/// Generate a debug report users can paste into an issue.
#[wasm_bindgen]
pub fn get_debug_info(input: &str, error_message: &str, max_iterations: usize) -> String {
    use std::fmt::Write;
    let mut report = String::new();

    // NB: writing to a String never fails
    let _ = writeln!(&mut report, "=== WORDEQ DEBUG REPORT ===");
    let _ = writeln!(&mut report, "Version: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
    let _ = writeln!(
        &mut report,
        "Generated: {}",
        js_sys::Date::new_0().to_iso_string().as_string().unwrap_or_else(|| "unknown".to_string())
    );
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "## Error");
    let _ = writeln!(&mut report, "{error_message}");
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "## Input");
    let _ = writeln!(&mut report, "Equation: {input}");
    let _ = writeln!(&mut report, "Max Iterations: {max_iterations}");
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "## Environment");
    if let Some(window) = web_sys::window() {
        if let Ok(user_agent) = window.navigator().user_agent() {
            let _ = writeln!(&mut report, "User Agent: {user_agent}");
        }
        let _ = writeln!(
            &mut report,
            "Location: {}",
            window.location().href().unwrap_or_else(|_| "unknown".to_string())
        );
    }
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "=== END DEBUG REPORT ===");

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_arch = "wasm32")]
    fn test_get_debug_info_structure() {
        let report = get_debug_info("{A}, {x}, x = A", "parse failure", 100);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "=== WORDEQ DEBUG REPORT ===");
        assert!(lines[1].starts_with(&format!("Version: {}", env!("CARGO_PKG_VERSION"))));
        assert!(lines[2].starts_with("Generated: "));
        assert_eq!(lines[4], "## Error");
        assert_eq!(lines[5], "parse failure");
        assert_eq!(lines[7], "## Input");
        assert_eq!(lines[8], "Equation: {A}, {x}, x = A");
        assert_eq!(lines[9], "Max Iterations: 100");
        assert_eq!(lines.last().copied(), Some("=== END DEBUG REPORT ==="));
    }

    #[test]
    fn test_wasm_error_from_parse_failure_uses_inner_code() {
        let err = solve_equation("{A}, {x}, x A", &SolverConfig::default()).unwrap_err();
        let wasm = WasmError::from(err);
        assert_eq!(wasm.code, "E004");
        assert!(wasm.help.is_some());
    }

    /// Every `LazyLock<Regex>` must be listed in `validate_internal_regexes()`.
    #[test]
    fn test_all_regexes_validated() {
        // current regexes:
        // 1. crate::parser::LETTER_RE
        // 2. crate::parser::VARIABLE_RE
        validate_internal_regexes();
    }
}
