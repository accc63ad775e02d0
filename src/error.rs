//! Error types for the runtime, the generator and configuration loading.
use std::fmt;
use std::path::PathBuf;

/// Which of the two constructor tables a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorKind {
    Value,
    Nil,
}

impl fmt::Display for ConstructorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorKind::Value => f.write_str("constructor"),
            ConstructorKind::Nil => f.write_str("nil constructor"),
        }
    }
}

/// Failures raised while turning envelopes back into values.
///
/// These are ordinary recoverable results; nothing in the runtime panics on
/// bad input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no {kind} registered for discriminator `{discriminator}`")]
    NotFound {
        discriminator: String,
        kind: ConstructorKind,
    },

    #[error("type registered as `{discriminator}` does not implement `{declared}` required by `{owner}`")]
    CapabilityMismatch {
        discriminator: String,
        declared: String,
        owner: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("expected {expected} elements, found {found}")]
    Length { expected: usize, found: usize },
}

impl Error {
    pub(crate) fn not_found(discriminator: &str, kind: ConstructorKind) -> Self {
        Error::NotFound {
            discriminator: discriminator.to_owned(),
            kind,
        }
    }
}

/// Fatal generation failures. The driver stops at the first one.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to parse source: {0}")]
    Parse(#[from] syn::Error),

    #[error("unknown module `{module}` referenced by `{owner}`")]
    UnknownModule { module: String, owner: String },

    #[error("`{owner}.{field}` is marked polymorphic but `{ty}` does not bottom out in `Poly<..>`")]
    NotPolymorphic {
        owner: String,
        field: String,
        ty: String,
    },

    #[error("`{owner}.{field}` holds `{ty}` but is not marked `polyjson:poly true`")]
    UnmarkedPoly {
        owner: String,
        field: String,
        ty: String,
    },

    #[error("`{owner}.{field}` uses a polymorphic map key in `{ty}`")]
    PolymorphicKey {
        owner: String,
        field: String,
        ty: String,
    },

    #[error("cannot classify `{owner}`: {reason}")]
    Unclassified { owner: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config `{}` at `{at}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        at: String,
        source: serde_json::Error,
    },
}
