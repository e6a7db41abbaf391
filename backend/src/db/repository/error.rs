//! Error types for repository operations.
//!
//! Every storage failure carries an [`ErrorContext`] naming the operation and
//! the row involved, so pipeline logs say which query failed.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Where a repository error happened.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Repository operation, e.g. `fetch_store_details` or `complete_report`
    pub operation: Option<String>,
    /// Table or record kind, e.g. `store_status` or `report`
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    /// Set for failures worth replaying, such as a dropped connection
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("operation", self.operation.as_deref()),
            ("entity", self.entity.as_deref()),
            ("id", self.entity_id.as_deref()),
            ("details", self.details.as_deref()),
            ("retryable", self.retryable.then_some("true")),
        ];

        f.write_str("[")?;
        let mut first = true;
        for (key, value) in fields {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", key, value)?;
                first = false;
            }
        }
        f.write_str("]")
    }
}

/// Failures raised by the local and Postgres repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Pool checkout failed or the store is unreachable. Always retryable.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// A statement failed on the server.
    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    /// A report job or store with the given id does not exist.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Stored data has an unexpected shape, or a write violates a state rule.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// Bad settings, or a backend that was not compiled in.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Migrations, blocking-task joins and other failures outside a query.
    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },
}

/// `$plain(message)` and `$with_context(message, context)` constructors.
macro_rules! constructors {
    ($($variant:ident => $plain:ident, $with_context:ident;)*) => {
        $(
            pub fn $plain(message: impl Into<String>) -> Self {
                Self::$with_context(message, ErrorContext::default())
            }

            pub fn $with_context(message: impl Into<String>, context: ErrorContext) -> Self {
                Self::$variant {
                    message: message.into(),
                    context,
                }
            }
        )*
    };
}

impl RepositoryError {
    constructors! {
        QueryError => query, query_with_context;
        NotFound => not_found, not_found_with_context;
        ValidationError => validation, validation_with_context;
        ConfigurationError => configuration, configuration_with_context;
        InternalError => internal, internal_with_context;
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::connection_with_context(message, ErrorContext::default())
    }

    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. } => context,
        }
    }

    /// Whether replaying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError { context, .. } | Self::QueryError { context, .. } => {
                context.retryable
            }
            _ => false,
        }
    }

    /// Record the repository operation that raised this error.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => RepositoryError::not_found("Record not found"),
            Error::DatabaseError(kind, info) => {
                let mut context =
                    ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));
                // Serialization failures are safe to replay
                if matches!(kind, DatabaseErrorKind::SerializationFailure) {
                    context = context.retryable();
                }
                RepositoryError::query_with_context(info.message(), context)
            }
            Error::DeserializationError(e) => {
                RepositoryError::validation(format!("Deserialization error: {}", e))
            }
            Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}
