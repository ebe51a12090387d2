//! Error types for object construction and dependency resolution.

use thiserror::Error;

/// Construction and resolution errors
///
/// Every failure raised while binding, building, or resolving surfaces as one of
/// these variants. Collaborator errors are propagated unchanged; the only
/// translation is a lookup miss being promoted to
/// [`DiError::DependencyResolution`] where a specific class member was being
/// resolved.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{Container, DiError};
///
/// let container = Container::new();
/// match container.get("App\\Missing") {
///     Err(DiError::NotFound(id)) => assert_eq!(id, "App\\Missing"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_construct::DiError;
///
/// let cyclic = DiError::CyclicDependency(vec!["A".into(), "B".into(), "A".into()]);
/// assert_eq!(cyclic.to_string(), "Cyclic dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Identifier is neither bound nor registered as a class
    #[error("Service not found: {0}")]
    NotFound(String),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// A class identity could not be derived from the given reference
    #[error("Invalid reference: {0} is neither a class name, an object reference nor a callable")]
    InvalidReference(String),
    /// Build plan operation outside the allowed set
    #[error("Unsupported operation: BuildPlan::{0}() not found")]
    UnsupportedOperation(String),
    /// A named dependency of a class could not be satisfied
    #[error("Unable to resolve dependency `{dependency}` of {class}")]
    DependencyResolution {
        /// Class whose member was being resolved
        class: String,
        /// Parameter, property or injection name
        dependency: String,
    },
    /// Resolution re-entered an identifier that was still being resolved
    #[error("Cyclic dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A constructor reported failure
    #[error("Failed to construct {class}: {message}")]
    Construction {
        /// Class being constructed
        class: String,
        /// Constructor supplied reason
        message: String,
    },
    /// Configuration text could not be parsed
    #[cfg(feature = "config")]
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DiError {
    /// Shorthand for [`DiError::DependencyResolution`].
    pub fn unresolved(class: impl Into<String>, dependency: impl Into<String>) -> Self {
        DiError::DependencyResolution {
            class: class.into(),
            dependency: dependency.into(),
        }
    }

    /// Shorthand for [`DiError::Construction`], for use inside constructors.
    pub fn construction(class: impl Into<String>, message: impl Into<String>) -> Self {
        DiError::Construction {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// Result type for construction and resolution
///
/// ```rust
/// use ferrous_construct::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::NotFound("some_service".into()))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
