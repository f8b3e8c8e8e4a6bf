//=========================================================================
// Runtime Errors
//=========================================================================
//
// Single error type shared by every component of the runtime.
//
// Every variant names the component (or resource kind) that raised it so
// a message printed at the host boundary is actionable on its own:
//
//   (display) Display component is started
//   (shader) Shader 0x3 does not exist
//   (runtime) Setup callback failed: <host error>
//
// Errors are raised synchronously where they are detected and are never
// retried. Callback bodies return `anyhow::Result<()>`; a failure becomes
// the `source` of [`RuntimeError::EventFailure`].
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::path::PathBuf;

//=== External Crates =====================================================

use thiserror::Error;

//=== RuntimeError ========================================================

/// Errors raised by runtime components.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `initialize` called on a component that is already initialized.
    #[error("({component}) Component is initialized")]
    AlreadyInitialized { component: &'static str },

    /// Operation requires an initialized component.
    #[error("({component}) Component is uninitialized")]
    Uninitialized { component: &'static str },

    /// `start` called while the component is running.
    #[error("({component}) Component is started")]
    AlreadyStarted { component: &'static str },

    /// `stop` called while the component is not running.
    #[error("({component}) Component is stopped")]
    AlreadyStopped { component: &'static str },

    /// Rejected argument (missing callback, malformed key).
    #[error("({component}) Invalid argument: {reason}")]
    InvalidArgument {
        component: &'static str,
        reason: String,
    },

    /// Unknown handle or key.
    #[error("({component}) {key} does not exist")]
    NotFound { component: &'static str, key: String },

    /// Failure reported by the windowing/graphics collaborator.
    #[error("({component}) {operation} failed: {diagnostic}")]
    External {
        component: &'static str,
        operation: &'static str,
        diagnostic: String,
    },

    /// Shader source file could not be read.
    #[error("(shader) Failed to read shader source {}", path.display())]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A registered callback signaled failure during dispatch.
    #[error("({component}) {event} callback failed: {source}")]
    EventFailure {
        component: &'static str,
        event: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, RuntimeError>;

//--- Constructors --------------------------------------------------------

impl RuntimeError {
    pub(crate) fn not_found(component: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            component,
            key: key.into(),
        }
    }

    pub(crate) fn external(
        component: &'static str,
        operation: &'static str,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self::External {
            component,
            operation,
            diagnostic: diagnostic.into(),
        }
    }

    pub(crate) fn invalid(component: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            component,
            reason: reason.into(),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_is_error_trait() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<RuntimeError>();
    }

    #[test]
    fn state_errors_name_the_component() {
        let err = RuntimeError::AlreadyStarted { component: "display" };
        assert_eq!(err.to_string(), "(display) Component is started");

        let err = RuntimeError::Uninitialized { component: "input" };
        assert_eq!(err.to_string(), "(input) Component is uninitialized");
    }

    #[test]
    fn not_found_formats_key() {
        let err = RuntimeError::not_found("shader", "Shader 0x3");
        assert_eq!(err.to_string(), "(shader) Shader 0x3 does not exist");
    }

    #[test]
    fn external_carries_diagnostic() {
        let err = RuntimeError::external("shader", "compile_shader", "0:1: syntax error");
        let message = err.to_string();
        assert!(message.contains("compile_shader failed"));
        assert!(message.contains("0:1: syntax error"));
    }

    #[test]
    fn event_failure_exposes_source() {
        use std::error::Error as _;

        let err = RuntimeError::EventFailure {
            component: "runtime",
            event: "Setup".to_string(),
            source: anyhow::anyhow!("out of memory"),
        };

        assert!(err.to_string().contains("Setup callback failed"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("out of memory".to_string()));
    }
}
