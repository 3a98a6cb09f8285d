//! Service dispatch for zrpc servers.
//!
//! A [`Service`] is a named receiver plus an explicit table of typed
//! methods, built with [`ServiceBuilder`]. A [`ServiceMap`] holds every
//! registered service and resolves `"Service.Method"` strings to the
//! [`MethodType`] that decodes arguments, invokes the method and encodes the
//! reply.
//!
//! ```
//! use zrpc_service::{ServiceBuilder, ServiceMap};
//!
//! struct Foo;
//!
//! let service = ServiceBuilder::new("Foo", Foo)
//!     .method("Sum", |_foo: &Foo, args: (i64, i64), reply: &mut i64| {
//!         *reply = args.0 + args.1;
//!         Ok(())
//!     })
//!     .build();
//!
//! let mut services = ServiceMap::new();
//! services.register(service).unwrap();
//! assert!(services.resolve("Foo.Sum").is_ok());
//! ```

pub mod error;
pub mod map;
pub mod method;
pub mod service;

pub use error::{Result, ServiceError};
pub use map::ServiceMap;
pub use method::{Argv, MethodType, Replyv};
pub use service::{is_exported, Service, ServiceBuilder};
