// Structured compiler diagnostics: severity, stable code, message.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: String) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message,
        }
    }

    pub fn warning(code: &'static str, message: String) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", tag, self.code, self.message)
    }
}

/// Render a diagnostic list one per line, in emission order.
pub fn render_all(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.is_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code_and_message() {
        let d = Diagnostic::error("E_UNBOUND_VAR", "unknown name `x` (line 3)".to_string());
        let text = d.to_string();
        assert!(text.contains("E_UNBOUND_VAR"));
        assert!(text.contains("unknown name `x`"));
    }

    #[test]
    fn test_has_errors_ignores_warnings() {
        let diags = vec![Diagnostic::warning("W_EMPTY_CLASS", "class `W` has no members".into())];
        assert!(!has_errors(&diags));
    }
}
