//! Attribute-driven construction pipeline.
//!
//! Classes, properties and parameters may declare attributes. When the
//! container resolves one of these targets, every declared attribute that the
//! [`AttributesResolver`] recognises for that kind of target contributes one
//! layer to a handler chain around the underlying resolution. The first
//! declared attribute is the outermost layer: it runs first, decides whether
//! and how to call the layer below it, and sees the value produced once the
//! inner layers and the base construction have run.
//!
//! # Examples
//!
//! ```rust
//! use ferrous_construct::{
//!     AttributeSpec, AttributeTarget, ClassInfo, Container, DiResult, AnyArc,
//!     attributes::AttributeHandler,
//! };
//! use std::sync::Arc;
//!
//! struct Counter(u32);
//!
//! // Doubles whatever the inner layers produced
//! fn doubling(handler: &AttributeHandler) -> DiResult<AnyArc> {
//!     let inner = handler.call_as::<Counter>()?;
//!     Ok(Arc::new(Counter(inner.0 * 2)))
//! }
//!
//! let container = Container::new();
//! container
//!     .attributes()
//!     .register_attribute("Double", AttributeTarget::CLASS);
//! container.register_class(
//!     ClassInfo::new("App\\Counter", |_| Ok(Counter(21)))
//!         .attribute(AttributeSpec::instance("Double", doubling)),
//! );
//!
//! let counter = container.get_as::<Counter>("App\\Counter").unwrap();
//! assert_eq!(counter.0, 42);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::arguments::Arguments;
use crate::error::DiResult;
use crate::factory::AnyArc;

pub mod handler;
pub mod inject;
pub mod resolver;

pub use handler::{AttributeHandler, HandlerFn};
pub use inject::Inject;
pub use resolver::AttributesResolver;

bitflags::bitflags! {
    /// Kinds of reflected targets an attribute may be recognised on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeTarget: u8 {
        const CLASS = 1 << 0;
        const PROPERTY = 1 << 1;
        const PARAMETER = 1 << 2;
        const ALL = Self::CLASS.bits() | Self::PROPERTY.bits() | Self::PARAMETER.bits();
    }
}

/// Logic of one attribute layer.
///
/// `handle` receives the handler for its layer; calling
/// [`AttributeHandler::call`] runs the inner layers and the base resolution.
/// Not calling it replaces the inner result entirely.
pub trait Attribute: Send + Sync {
    fn handle(&self, handler: &AttributeHandler) -> DiResult<AnyArc>;
}

impl<F> Attribute for F
where
    F: Fn(&AttributeHandler) -> DiResult<AnyArc> + Send + Sync,
{
    fn handle(&self, handler: &AttributeHandler) -> DiResult<AnyArc> {
        self(handler)
    }
}

type AttributeMaker = Arc<dyn Fn(&Arguments) -> DiResult<Arc<dyn Attribute>> + Send + Sync>;

/// A collaborator an attribute needs injected before it is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// Name under which the value is passed to the attribute constructor
    pub field: String,
    /// Identifier resolved from the container
    pub id: String,
}

/// An attribute as declared on a target.
///
/// Holds the attribute name (matched against the resolver's registrations),
/// the collaborators to inject, and the constructor that builds the attribute
/// from them.
#[derive(Clone)]
pub struct AttributeSpec {
    name: String,
    injections: Vec<Injection>,
    make: AttributeMaker,
}

impl AttributeSpec {
    /// Attribute built on each discovery from its injected collaborators.
    pub fn new<A, F>(name: impl Into<String>, make: F) -> Self
    where
        A: Attribute + 'static,
        F: Fn(&Arguments) -> DiResult<A> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            injections: Vec::new(),
            make: Arc::new(move |args| make(args).map(|a| Arc::new(a) as Arc<dyn Attribute>)),
        }
    }

    /// Attribute backed by one shared instance.
    pub fn instance<A: Attribute + 'static>(name: impl Into<String>, attribute: A) -> Self {
        let attribute: Arc<dyn Attribute> = Arc::new(attribute);
        Self {
            name: name.into(),
            injections: Vec::new(),
            make: Arc::new(move |_| Ok(attribute.clone())),
        }
    }

    /// Requests `id` from the container, passed to the constructor as `field`.
    pub fn inject(mut self, field: impl Into<String>, id: impl Into<String>) -> Self {
        self.injections.push(Injection {
            field: field.into(),
            id: id.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    pub(crate) fn instantiate(&self, args: &Arguments) -> DiResult<Arc<dyn Attribute>> {
        (self.make)(args)
    }
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("name", &self.name)
            .field("injections", &self.injections)
            .finish()
    }
}
