//! Reflection data for constructible classes.
//!
//! Rust has no runtime reflection, so classes describe themselves: a
//! [`ClassInfo`] names the class, lists its constructor parameters and
//! injectable properties in declaration order, carries the attributes declared
//! on each of them, and owns the constructor that turns resolved arguments into
//! an instance.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::arguments::Arguments;
use crate::attributes::{AttributeSpec, AttributeTarget};
use crate::error::DiResult;
use crate::factory::{AnyArc, Factory};

/// Constructor receiving resolved properties and parameters by name.
pub type ConstructorFn = Arc<dyn Fn(&Arguments) -> DiResult<AnyArc> + Send + Sync>;

/// Description of a constructible class.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{ClassInfo, Container, ParameterInfo, Arguments};
///
/// struct Widget { name: String }
///
/// let container = Container::new();
/// container.register_class(
///     ClassInfo::new("App\\Widget", |args| {
///         Ok(Widget { name: (*args.require::<String>("name")?).clone() })
///     })
///     .parameter(ParameterInfo::new("name")),
/// );
///
/// let widget = container
///     .new_instance("App\\Widget", &Arguments::new().with("name", String::from("gear")))
///     .unwrap()
///     .downcast::<Widget>()
///     .unwrap();
/// assert_eq!(widget.name, "gear");
/// ```
#[derive(Clone)]
pub struct ClassInfo {
    name: String,
    parameters: Vec<ParameterInfo>,
    properties: Vec<PropertyInfo>,
    attributes: Vec<AttributeSpec>,
    constructor: ConstructorFn,
}

impl ClassInfo {
    pub fn new<T, F>(name: impl Into<String>, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            properties: Vec::new(),
            attributes: Vec::new(),
            constructor: Arc::new(move |args| constructor(args).map(|v| Arc::new(v) as AnyArc)),
        }
    }

    /// Class named after the Rust type it constructs.
    pub fn of<T, F>(constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<T>(), constructor)
    }

    pub fn parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    /// Declares a class-level attribute. Declaration order is preserved.
    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Runs the constructor directly, bypassing resolution and attributes.
    pub fn construct(&self, args: &Arguments) -> DiResult<AnyArc> {
        (self.constructor)(args)
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("properties", &self.properties)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// A constructor parameter.
#[derive(Clone, Debug)]
pub struct ParameterInfo {
    name: String,
    type_hint: Option<String>,
    default: Option<Factory>,
    attributes: Vec<AttributeSpec>,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            attributes: Vec::new(),
        }
    }

    /// Declares the identifier this parameter resolves to when no argument is given.
    pub fn typed(mut self, id: impl Into<String>) -> Self {
        self.type_hint = Some(id.into());
        self
    }

    pub fn with_default(mut self, default: Factory) -> Self {
        self.default = Some(default);
        self
    }

    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    pub fn default(&self) -> Option<&Factory> {
        self.default.as_ref()
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }
}

/// An injectable property, resolved before construction and handed to the
/// constructor under its own name.
#[derive(Clone, Debug)]
pub struct PropertyInfo {
    name: String,
    type_hint: Option<String>,
    default: Option<Factory>,
    attributes: Vec<AttributeSpec>,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            attributes: Vec::new(),
        }
    }

    pub fn typed(mut self, id: impl Into<String>) -> Self {
        self.type_hint = Some(id.into());
        self
    }

    pub fn with_default(mut self, default: Factory) -> Self {
        self.default = Some(default);
        self
    }

    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    pub fn default(&self) -> Option<&Factory> {
        self.default.as_ref()
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }
}

/// A reflected target carrying attributes: a class, or one of its members.
#[derive(Clone, Debug)]
pub enum Reflector {
    Class(Arc<ClassInfo>),
    /// Property at the given declaration index
    Property(Arc<ClassInfo>, usize),
    /// Constructor parameter at the given declaration index
    Parameter(Arc<ClassInfo>, usize),
}

impl Reflector {
    pub fn kind(&self) -> AttributeTarget {
        match self {
            Reflector::Class(_) => AttributeTarget::CLASS,
            Reflector::Property(..) => AttributeTarget::PROPERTY,
            Reflector::Parameter(..) => AttributeTarget::PARAMETER,
        }
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        match self {
            Reflector::Class(class) | Reflector::Property(class, _) | Reflector::Parameter(class, _) => class,
        }
    }

    /// False for a member index past the class's declared members.
    pub fn exists(&self) -> bool {
        match self {
            Reflector::Class(_) => true,
            Reflector::Property(class, i) => *i < class.properties.len(),
            Reflector::Parameter(class, i) => *i < class.parameters.len(),
        }
    }

    /// Name of the target: the class name, or the member name. Empty for a
    /// member that does not exist.
    pub fn name(&self) -> &str {
        match self {
            Reflector::Class(class) => class.name(),
            Reflector::Property(..) => self.property().map_or("", |p| p.name()),
            Reflector::Parameter(..) => self.parameter().map_or("", |p| p.name()),
        }
    }

    /// Attributes declared on the target, in declaration order.
    pub fn attributes(&self) -> &[AttributeSpec] {
        match self {
            Reflector::Class(class) => class.attributes(),
            Reflector::Property(..) => self.property().map_or(&[][..], |p| p.attributes()),
            Reflector::Parameter(..) => self.parameter().map_or(&[][..], |p| p.attributes()),
        }
    }

    /// Declared type hint of a member; `None` for classes.
    pub fn type_hint(&self) -> Option<&str> {
        match self {
            Reflector::Class(_) => None,
            Reflector::Property(..) => self.property().and_then(|p| p.type_hint()),
            Reflector::Parameter(..) => self.parameter().and_then(|p| p.type_hint()),
        }
    }

    pub fn parameter(&self) -> Option<&ParameterInfo> {
        match self {
            Reflector::Parameter(class, i) => class.parameters.get(*i),
            _ => None,
        }
    }

    pub fn property(&self) -> Option<&PropertyInfo> {
        match self {
            Reflector::Property(class, i) => class.properties.get(*i),
            _ => None,
        }
    }
}
