//! Generated placeholder modules
//!
//! A stand-in takes the place of a module that cannot be loaded: either the
//! import points at a file that does not exist, or the file failed to
//! transpile. It renders a visible marker and exports every binding its
//! importers asked for, so the rest of the graph still links.

use serde::Serialize;
use std::fmt::Write;

/// Why a stand-in was generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StandInReason {
    Missing,
    TransformFailed { message: String },
}

const MISSING_STYLE: &str = r#"{ padding: "8px", border: "1px dashed #d97706", color: "#92400e", fontFamily: "monospace" }"#;
const ERROR_STYLE: &str = r#"{ padding: "8px", border: "1px solid #dc2626", background: "#fef2f2", color: "#991b1b", fontFamily: "monospace", whiteSpace: "pre-wrap" }"#;

/// Render the module body for a stand-in at `path`
pub fn render(path: &str, reason: &StandInReason, names: &[String], runtime: &str) -> String {
    let (marker, label, style) = match reason {
        StandInReason::Missing => (
            "data-missing-module",
            format!("Module not found: {}", path),
            MISSING_STYLE,
        ),
        StandInReason::TransformFailed { message } => (
            "data-transform-error",
            format!("Failed to compile {}:\n{}", path, message),
            ERROR_STYLE,
        ),
    };

    let mut code = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(code, "import {{ createElement }} from {};", quote(runtime));
    let _ = writeln!(code, "const label = {};", quote(&label));
    let _ = writeln!(code, "function StandIn(props) {{");
    let _ = writeln!(
        code,
        "  return createElement(\"div\", {{ {}: {}, style: {} }}, label, props && props.children);",
        quote(marker),
        quote(path),
        style
    );
    let _ = writeln!(code, "}}");
    let _ = writeln!(code, "export default StandIn;");

    let mut exported: Vec<&str> = Vec::new();
    for name in names {
        if name != "default" && !exported.contains(&name.as_str()) {
            exported.push(name);
            let _ = writeln!(code, "export {{ StandIn as {} }};", quote(name));
        }
    }

    code
}

fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
