//! Built-in `Inject` attribute.

use crate::attributes::{Attribute, AttributeHandler, AttributeSpec};
use crate::class_ref::normalize_class_name;
use crate::error::{DiError, DiResult};
use crate::factory::AnyArc;

/// Resolves a property or parameter from the container.
///
/// The identifier is the explicit one given to [`Inject::id`], or the member's
/// declared type hint. The inner callable is never invoked: the injected value
/// replaces whatever the member would otherwise have resolved to.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{ClassInfo, Container, Factory, Inject, PropertyInfo};
/// use std::sync::Arc;
///
/// struct Mailer { from: Arc<String> }
///
/// let container = Container::new();
/// container.bind_shared("mail.from", Factory::value(String::from("noreply@example.com")), false);
/// container.register_class(
///     ClassInfo::new("App\\Mailer", |args| Ok(Mailer { from: args.require::<String>("from")? }))
///         .property(PropertyInfo::new("from").attribute(Inject::spec_for("mail.from"))),
/// );
///
/// let mailer = container.get_as::<Mailer>("App\\Mailer").unwrap();
/// assert_eq!(*mailer.from, "noreply@example.com");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Inject {
    id: Option<String>,
}

impl Inject {
    /// Name under which `Inject` is recognised.
    pub const NAME: &'static str = "Inject";

    /// Injects by the member's type hint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects an explicit identifier.
    pub fn id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Declaration resolving by type hint.
    pub fn spec() -> AttributeSpec {
        AttributeSpec::instance(Self::NAME, Self::new())
    }

    /// Declaration resolving an explicit identifier.
    pub fn spec_for(id: impl Into<String>) -> AttributeSpec {
        AttributeSpec::instance(Self::NAME, Self::id(id))
    }
}

impl Attribute for Inject {
    fn handle(&self, handler: &AttributeHandler) -> DiResult<AnyArc> {
        let target = handler.target();
        let class = target.class().name();
        let id = self
            .id
            .as_deref()
            .or_else(|| target.type_hint())
            .ok_or_else(|| DiError::unresolved(class, target.name()))?;

        handler.container().get(id).map_err(|err| match err {
            DiError::NotFound(missing) if normalize_class_name(&missing) == normalize_class_name(id) => {
                DiError::unresolved(class, target.name())
            }
            other => other,
        })
    }
}
