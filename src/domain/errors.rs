//! Error types for the formula engine.
//!
//! Every failure the engine can produce is one of a closed set of kinds so
//! that callers branch on the variant rather than matching message text.
//! Only [`EngineError::Cycle`] gets its own display marker; the other kinds
//! share the generic error marker.

/// A failure produced while tokenizing, parsing, or evaluating a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The tokenizer hit a character or identifier it cannot classify.
    Lex {
        message: String,
        position: Option<usize>,
    },
    /// The token stream does not match the grammar (unexpected token,
    /// missing delimiter, wrong function arity).
    Parse {
        message: String,
        position: Option<usize>,
    },
    /// A well-formed expression failed to evaluate (division by zero,
    /// out-of-range reference, errored dependency).
    Eval { message: String },
    /// A cell was referenced while it was already mid-evaluation.
    Cycle,
}

impl EngineError {
    /// Builds a lexer error with a source position.
    pub fn lex(message: impl Into<String>, position: usize) -> Self {
        EngineError::Lex {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Builds a parser error with a source position.
    pub fn parse_at(message: impl Into<String>, position: usize) -> Self {
        EngineError::Parse {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Builds a parser error with no useful position.
    pub fn parse(message: impl Into<String>) -> Self {
        EngineError::Parse {
            message: message.into(),
            position: None,
        }
    }

    /// Builds an evaluation error.
    pub fn eval(message: impl Into<String>) -> Self {
        EngineError::Eval {
            message: message.into(),
        }
    }

    /// True for the cycle variant, which renders with its own marker.
    pub fn is_cycle(&self) -> bool {
        matches!(self, EngineError::Cycle)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Lex { message, .. } => write!(f, "{}", message),
            EngineError::Parse { message, .. } => write!(f, "{}", message),
            EngineError::Eval { message } => write!(f, "{}", message),
            EngineError::Cycle => write!(f, "cyclic reference detected"),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_is_its_own_kind() {
        let cycle = EngineError::Cycle;
        assert!(cycle.is_cycle());
        assert!(!EngineError::eval("division by zero").is_cycle());

        // The cycle text is stable for the status bar, but classification
        // always goes through the variant, never the message.
        assert_eq!(cycle.to_string(), "cyclic reference detected");
    }

    #[test]
    fn test_display_uses_message() {
        let err = EngineError::lex("unknown character '@' at position 3", 3);
        assert_eq!(err.to_string(), "unknown character '@' at position 3");

        let err = EngineError::eval("reference out of range");
        assert_eq!(err.to_string(), "reference out of range");
    }
}
