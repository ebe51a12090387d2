//! # ferrous-construct
//!
//! Runtime object construction and dependency resolution for Rust.
//!
//! ## Features
//!
//! - **Lifecycle bindings**: transient or shared values, with protected
//!   bindings that ignore later overrides and report it
//! - **Build plans**: named, lazily resolved and memoized constructor arguments
//! - **Attribute pipeline**: declarative markers on classes, properties and
//!   parameters that wrap construction in an ordered handler chain
//! - **Cycle detection**: re-entrant resolutions fail with the offending path
//!   instead of overflowing the stack
//! - **Thread-safe**: cheap `Arc`-backed handles, no locks held across user code
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_construct::{Arguments, ClassInfo, Container, Factory, ParameterInfo};
//! use std::sync::Arc;
//!
//! struct Widget {
//!     name: Arc<String>,
//! }
//!
//! let container = Container::new();
//! container.register_class(
//!     ClassInfo::new("App\\Widget", |args| Ok(Widget { name: args.require::<String>("name")? }))
//!         .parameter(ParameterInfo::new("name")),
//! );
//!
//! // Configure the class once, then build it through the plan
//! let plan = container.plan("App\\Widget");
//! plan.set_argument("name", Factory::value(String::from("gear")));
//!
//! let widget = plan.create_object(&Arguments::new()).unwrap().downcast::<Widget>().unwrap();
//! assert_eq!(*widget.name, "gear");
//!
//! // Shared objects are built once
//! let a = plan.create_shared_object(&Arguments::new()).unwrap();
//! let b = plan.create_shared_object(&Arguments::new()).unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## Binding Lifecycles
//!
//! - **Transient**: the factory runs on every resolution
//! - **Shared**: the factory runs once; [`Container::get_new`] forces a refresh
//! - **Protected**: the first factory stays; later writes return `false`
//!
//! ```rust
//! use ferrous_construct::{BindFlags, Container, Factory};
//!
//! let container = Container::new();
//! assert!(container.bind_shared("db.url", Factory::value(String::from("postgres://primary")), true));
//! assert!(!container.bind_shared("db.url", Factory::value(String::from("postgres://other")), false));
//! assert_eq!(*container.get_as::<String>("db.url").unwrap(), "postgres://primary");
//! ```
//!
//! ## Cycle Detection
//!
//! ```rust
//! use ferrous_construct::{ClassInfo, Container, DiError, ParameterInfo};
//!
//! let container = Container::new();
//! container.register_class(ClassInfo::new("A", |_| Ok(())).parameter(ParameterInfo::new("b").typed("B")));
//! container.register_class(ClassInfo::new("B", |_| Ok(())).parameter(ParameterInfo::new("a").typed("A")));
//!
//! match container.get("A") {
//!     Err(DiError::CyclicDependency(path)) => assert_eq!(path, vec!["A", "B", "A"]),
//!     _ => unreachable!(),
//! }
//! ```

// Module declarations
pub mod arguments;
pub mod attributes;
pub mod class_ref;
pub mod config;
pub mod container;
pub mod definition;
pub mod entry;
pub mod error;
pub mod factory;
pub mod lifetime;
pub mod observer;
pub mod plan;
pub mod reflection;
pub mod registry;

// Internal modules
mod internal;

// Re-export core types
pub use arguments::Arguments;
pub use attributes::{Attribute, AttributeHandler, AttributeSpec, AttributeTarget, AttributesResolver, Inject};
pub use class_ref::{class_name_of, is_same_class, normalize_class_name, ClassRef};
pub use config::{ConfigValue, ContainerConfig, ContainerConfigBuilder};
pub use container::{Container, ResolverContext};
pub use definition::{ObjectBuilder, StoreDefinition};
pub use entry::LifecycleEntry;
pub use error::{DiError, DiResult};
pub use factory::{AnyArc, ExtendFn, Factory, FactoryFn};
pub use lifetime::BindFlags;
pub use observer::{ContainerObserver, TracingObserver};
pub use plan::{BuildPlan, Operation, PlanOp, PlanOutcome};
pub use reflection::{ClassInfo, ParameterInfo, PropertyInfo, Reflector};
pub use registry::Registry;
