use zrpc_codec::{CodecError, ErrorKind};

/// Errors raised while registering, resolving or invoking service methods.
///
/// Messages begin with the [`ErrorKind`] prefix of their kind so they can be
/// classified again after crossing the wire.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A service with this name is already registered.
    #[error("service already exists: {0}")]
    ServiceExists(String),

    /// The name is not `"Service.Method"`, or not an exported name.
    #[error("malformed service/method name: {0}")]
    MalformedName(String),

    #[error("service not found: {0}")]
    NotFoundService(String),

    #[error("method not found: {0}")]
    NotFoundMethod(String),

    /// Arguments or reply could not be decoded or encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A value handed to a method had the wrong type.
    #[error("codec error: expected a value of type {0}")]
    TypeMismatch(&'static str),

    /// Returned by the method itself.
    #[error("{0}")]
    Application(String),
}

impl ServiceError {
    /// An error from a method body.
    pub fn application(message: impl Into<String>) -> Self {
        ServiceError::Application(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::ServiceExists(_) => ErrorKind::ServiceExists,
            ServiceError::MalformedName(_) => ErrorKind::MalformedName,
            ServiceError::NotFoundService(_) => ErrorKind::NotFoundService,
            ServiceError::NotFoundMethod(_) => ErrorKind::NotFoundMethod,
            ServiceError::Codec(err) => err.kind(),
            ServiceError::TypeMismatch(_) => ErrorKind::Codec,
            ServiceError::Application(_) => ErrorKind::Application,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_prefix() {
        let cases = [
            ServiceError::ServiceExists("Foo".into()),
            ServiceError::MalformedName("Foo".into()),
            ServiceError::NotFoundService("Bar".into()),
            ServiceError::NotFoundMethod("Foo.Nope".into()),
            ServiceError::Codec(CodecError::Decode("eof".into())),
            ServiceError::TypeMismatch("i64"),
        ];
        for err in cases {
            let message = err.to_string();
            assert_eq!(ErrorKind::classify_remote(&message), err.kind(), "{message}");
        }
    }

    #[test]
    fn application_errors_are_passed_through_verbatim() {
        let err = ServiceError::application("divide by zero");
        assert_eq!(err.to_string(), "divide by zero");
        assert_eq!(err.kind(), ErrorKind::Application);
    }
}
