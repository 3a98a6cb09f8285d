use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::method::{Argv, MethodType, Replyv};

/// Whether `name` may be exposed remotely: it must start with an ASCII
/// uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// A named receiver and its method table. Immutable once built.
pub struct Service {
    name: String,
    receiver: Arc<dyn Any + Send + Sync>,
    methods: HashMap<String, MethodType>,
}

impl Service {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<&MethodType> {
        self.methods.get(name)
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Borrow the receiver as its concrete type.
    pub fn receiver<S: Send + Sync + 'static>(&self) -> Option<&S> {
        self.receiver.downcast_ref::<S>()
    }

    /// Invoke `method` of this service.
    pub fn invoke(&self, method: &MethodType, argv: Argv, replyv: &mut Replyv) -> Result<()> {
        method.invoke(argv, replyv)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Builds a [`Service`] from a receiver and explicitly listed methods.
pub struct ServiceBuilder<S> {
    name: String,
    receiver: Arc<S>,
    methods: HashMap<String, MethodType>,
}

impl<S: Send + Sync + 'static> ServiceBuilder<S> {
    pub fn new(name: impl Into<String>, receiver: S) -> Self {
        Self {
            name: name.into(),
            receiver: Arc::new(receiver),
            methods: HashMap::new(),
        }
    }

    /// Start a service named after the receiver's type (`my_crate::Foo`
    /// becomes `Foo`).
    pub fn for_type(receiver: S) -> Self {
        let full = std::any::type_name::<S>();
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(name, receiver)
    }

    /// Add a method. Names that are not exported are skipped.
    pub fn method<A, R, F>(mut self, name: &str, f: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&S, A, &mut R) -> Result<()> + Send + Sync + 'static,
    {
        if !is_exported(name) {
            warn!(service = %self.name, method = name, "skipping unexported method");
            return self;
        }
        let method = MethodType::new(name, Arc::clone(&self.receiver), f);
        if self.methods.insert(name.to_string(), method).is_some() {
            warn!(service = %self.name, method = name, "method defined twice; keeping the last");
        }
        self
    }

    pub fn build(self) -> Service {
        Service {
            name: self.name,
            receiver: self.receiver,
            methods: self.methods,
        }
    }
}
