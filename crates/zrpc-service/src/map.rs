use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{Result, ServiceError};
use crate::method::MethodType;
use crate::service::{is_exported, Service};

/// Name-keyed table of registered services.
///
/// Filled through `&mut self` before serving starts, then shared read-only.
#[derive(Debug, Default)]
pub struct ServiceMap {
    services: HashMap<String, Service>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service. Fails if one with the same name exists.
    pub fn register(&mut self, service: Service) -> Result<()> {
        if !is_exported(service.name()) {
            return Err(ServiceError::MalformedName(format!(
                "{} is not an exported service name",
                service.name()
            )));
        }
        if self.services.contains_key(service.name()) {
            return Err(ServiceError::ServiceExists(service.name().to_string()));
        }

        for method in service.method_names() {
            debug!(service = service.name(), method, "register method");
        }
        info!(
            service = service.name(),
            methods = service.method_names().len(),
            "registered service"
        );
        self.services.insert(service.name().to_string(), service);
        Ok(())
    }

    /// Split `"Service.Method"` and look both halves up.
    pub fn resolve(&self, service_method: &str) -> Result<(&Service, &MethodType)> {
        let (service_name, method_name) = split_name(service_method)?;
        let service = self
            .services
            .get(service_name)
            .ok_or_else(|| ServiceError::NotFoundService(service_name.to_string()))?;
        let method = service
            .method(method_name)
            .ok_or_else(|| ServiceError::NotFoundMethod(service_method.to_string()))?;
        Ok((service, method))
    }

    /// Registered service names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn split_name(service_method: &str) -> Result<(&str, &str)> {
    let mut parts = service_method.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(service), Some(method), None) if !service.is_empty() && !method.is_empty() => {
            Ok((service, method))
        }
        _ => Err(ServiceError::MalformedName(service_method.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use zrpc_codec::{CodecType, ErrorKind};

    use super::*;
    use crate::service::ServiceBuilder;

    #[derive(Debug, Default)]
    struct Foo {
        base: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Args {
        num1: i64,
        num2: i64,
    }

    fn foo_service() -> Service {
        ServiceBuilder::new("Foo", Foo { base: 100 })
            .method("Sum", |_foo: &Foo, args: Args, reply: &mut i64| {
                *reply = args.num1 + args.num2;
                Ok(())
            })
            .method("Offset", |foo: &Foo, n: i64, reply: &mut i64| {
                *reply = foo.base + n;
                Ok(())
            })
            .method("Div", |_foo: &Foo, args: Args, reply: &mut i64| {
                if args.num2 == 0 {
                    return Err(ServiceError::application("divide by zero"));
                }
                *reply = args.num1 / args.num2;
                Ok(())
            })
            .method("sum", |_foo: &Foo, _args: Args, _reply: &mut i64| Ok(()))
            .build()
    }

    fn services() -> ServiceMap {
        let mut map = ServiceMap::new();
        map.register(foo_service()).unwrap();
        map
    }

    #[test]
    fn foo_sum_through_both_codecs() {
        let map = services();
        for codec_type in [CodecType::Binary, CodecType::Json] {
            let (service, method) = map.resolve("Foo.Sum").unwrap();
            let body = codec_type.encode(&Args { num1: 3, num2: 4 }).unwrap();

            let argv = method.decode_argv(codec_type, &body).unwrap();
            let mut replyv = method.new_replyv();
            assert_eq!(replyv.downcast_ref::<i64>(), Some(&0));

            service.invoke(method, argv, &mut replyv).unwrap();
            assert_eq!(replyv.downcast_ref::<i64>(), Some(&7));

            let encoded = method.encode_replyv(codec_type, &replyv).unwrap();
            assert_eq!(codec_type.decode::<i64>(&encoded).unwrap(), 7);
        }
        assert_eq!(map.resolve("Foo.Sum").unwrap().1.num_calls(), 2);
    }

    #[test]
    fn method_sees_receiver_state() {
        let map = services();
        let (service, method) = map.resolve("Foo.Offset").unwrap();
        let body = CodecType::Json.encode(&5i64).unwrap();
        let argv = method.decode_argv(CodecType::Json, &body).unwrap();
        let mut replyv = method.new_replyv();
        service.invoke(method, argv, &mut replyv).unwrap();
        assert_eq!(replyv.downcast_ref::<i64>(), Some(&105));
        assert_eq!(service.receiver::<Foo>().unwrap().base, 100);
    }

    #[test]
    fn method_error_is_returned_and_counted() {
        let map = services();
        let (_, method) = map.resolve("Foo.Div").unwrap();
        let body = CodecType::Json.encode(&Args { num1: 1, num2: 0 }).unwrap();
        let argv = method.decode_argv(CodecType::Json, &body).unwrap();
        let mut replyv = method.new_replyv();

        let err = method.invoke(argv, &mut replyv).unwrap_err();
        assert_eq!(err.to_string(), "divide by zero");
        assert_eq!(method.num_calls(), 1);
    }

    #[test]
    fn unexported_methods_are_skipped() {
        let service = foo_service();
        assert_eq!(service.method_names(), vec!["Div", "Offset", "Sum"]);
        assert!(service.method("sum").is_none());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut map = services();
        let err = map.register(foo_service()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceExists);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn unexported_service_name_is_rejected() {
        let mut map = ServiceMap::new();
        let err = map
            .register(ServiceBuilder::new("foo", Foo::default()).build())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedName);
        assert!(map.is_empty());
    }

    #[test]
    fn resolve_failures() {
        let map = services();
        for name in ["Foo", "Foo.", ".Sum", "Foo.Sum.Extra", ""] {
            let err = map.resolve(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedName, "{name:?}");
        }
        assert_eq!(
            map.resolve("Bar.Sum").unwrap_err().kind(),
            ErrorKind::NotFoundService
        );
        assert_eq!(
            map.resolve("Foo.Nope").unwrap_err().kind(),
            ErrorKind::NotFoundMethod
        );
    }

    #[test]
    fn bad_argument_bytes_are_codec_errors() {
        let map = services();
        let (_, method) = map.resolve("Foo.Sum").unwrap();
        let err = method.decode_argv(CodecType::Json, b"[1,2,3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
    }

    #[test]
    fn for_type_uses_the_type_name() {
        let service = ServiceBuilder::for_type(Foo::default()).build();
        assert_eq!(service.name(), "Foo");
    }
}
