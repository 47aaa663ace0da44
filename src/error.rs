//! Error taxonomy shared by the storage layer and the route handlers

/// Outcome of a storage call that did not succeed
///
/// Only [`StoreError::Unavailable`] makes the fallback orchestrator retry
/// against the file backend; the other variants are answers, not failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("bookmark not found")]
    NotFound,

    /// The key is already held in the addressed scope
    #[error("name already taken")]
    NameTaken,

    #[error("{backend} backend unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },
}

impl StoreError {
    pub fn unavailable(backend: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced to the route boundary
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL format.")]
    InvalidUrl,

    #[error("Password must be at least 8 characters long and contain letters and digits.")]
    WeakPassword,

    #[error("Bookmark name cannot be empty.")]
    EmptyName,

    #[error("Please provide a username and a valid email address.")]
    InvalidAccount,

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Could not secure the password. Please try again.")]
    PasswordHash,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Text shown to the user in a flash message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Store(StoreError::NotFound) => "Bookmark not found!".to_string(),
            AppError::Store(StoreError::NameTaken) => {
                "Error: Custom name already exists!".to_string()
            }
            AppError::Store(StoreError::Unavailable { .. }) => {
                "An error occurred. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}
