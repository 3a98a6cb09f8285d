use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use zrpc_codec::CodecType;

use crate::error::{Result, ServiceError};

/// A decoded argument, ready to hand to [`MethodType::invoke`].
pub struct Argv(Box<dyn Any + Send>);

/// A reply value a method fills in place.
pub struct Replyv(Box<dyn Any + Send>);

impl Replyv {
    /// Borrow the reply as its concrete type.
    pub fn downcast_ref<R: Any>(&self) -> Option<&R> {
        self.0.downcast_ref::<R>()
    }
}

impl fmt::Debug for Argv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Argv(..)")
    }
}

impl fmt::Debug for Replyv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Replyv(..)")
    }
}

type Call = Box<dyn Fn(Box<dyn Any + Send>, &mut (dyn Any + Send)) -> Result<()> + Send + Sync>;

/// One callable method with its argument and reply shapes erased.
pub struct MethodType {
    name: String,
    arg_type: &'static str,
    reply_type: &'static str,
    num_calls: AtomicU64,
    decode: fn(CodecType, &[u8]) -> Result<Box<dyn Any + Send>>,
    new_reply: fn() -> Box<dyn Any + Send>,
    encode: fn(CodecType, &(dyn Any + Send)) -> Result<Vec<u8>>,
    call: Call,
}

impl MethodType {
    pub(crate) fn new<S, A, R, F>(name: &str, receiver: Arc<S>, f: F) -> Self
    where
        S: Send + Sync + 'static,
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Default + Send + 'static,
        F: Fn(&S, A, &mut R) -> Result<()> + Send + Sync + 'static,
    {
        let call: Call = Box::new(move |argv: Box<dyn Any + Send>, replyv: &mut (dyn Any + Send)| {
            let argv = argv
                .downcast::<A>()
                .map_err(|_| ServiceError::TypeMismatch(std::any::type_name::<A>()))?;
            let replyv = replyv
                .downcast_mut::<R>()
                .ok_or(ServiceError::TypeMismatch(std::any::type_name::<R>()))?;
            f(&*receiver, *argv, replyv)
        });

        Self {
            name: name.to_string(),
            arg_type: std::any::type_name::<A>(),
            reply_type: std::any::type_name::<R>(),
            num_calls: AtomicU64::new(0),
            decode: decode_value::<A>,
            new_reply: new_value::<R>,
            encode: encode_value::<R>,
            call,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_type(&self) -> &'static str {
        self.arg_type
    }

    pub fn reply_type(&self) -> &'static str {
        self.reply_type
    }

    /// How many times [`MethodType::invoke`] has been entered.
    pub fn num_calls(&self) -> u64 {
        self.num_calls.load(Ordering::Relaxed)
    }

    /// Decode a request body into this method's argument type.
    pub fn decode_argv(&self, codec_type: CodecType, body: &[u8]) -> Result<Argv> {
        (self.decode)(codec_type, body).map(Argv)
    }

    /// A fresh zero-valued reply.
    pub fn new_replyv(&self) -> Replyv {
        Replyv((self.new_reply)())
    }

    /// Run the method. The reply is mutated in place; the method's own
    /// error is returned unchanged.
    pub fn invoke(&self, argv: Argv, replyv: &mut Replyv) -> Result<()> {
        self.num_calls.fetch_add(1, Ordering::Relaxed);
        (self.call)(argv.0, replyv.0.as_mut())
    }

    pub fn encode_replyv(&self, codec_type: CodecType, replyv: &Replyv) -> Result<Vec<u8>> {
        (self.encode)(codec_type, replyv.0.as_ref())
    }
}

impl fmt::Debug for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodType")
            .field("name", &self.name)
            .field("arg_type", &self.arg_type)
            .field("reply_type", &self.reply_type)
            .field("num_calls", &self.num_calls())
            .finish()
    }
}

fn decode_value<A: DeserializeOwned + Send + 'static>(
    codec_type: CodecType,
    body: &[u8],
) -> Result<Box<dyn Any + Send>> {
    let value: A = codec_type.decode(body)?;
    Ok(Box::new(value))
}

fn new_value<R: Default + Send + 'static>() -> Box<dyn Any + Send> {
    Box::new(R::default())
}

fn encode_value<R: Serialize + 'static>(
    codec_type: CodecType,
    value: &(dyn Any + Send),
) -> Result<Vec<u8>> {
    let value = value
        .downcast_ref::<R>()
        .ok_or(ServiceError::TypeMismatch(std::any::type_name::<R>()))?;
    Ok(codec_type.encode(value)?)
}
