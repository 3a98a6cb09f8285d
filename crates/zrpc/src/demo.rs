//! The `Arith` service the CLI serves.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use zrpc_service::{Service, ServiceBuilder, ServiceError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Args {
    pub num1: i64,
    pub num2: i64,
}

#[derive(Debug, Default)]
pub struct Arith;

/// `Arith.Sum`, `Arith.Mul`, and `Arith.Sleep` (sleeps the given number of
/// milliseconds, then replies with it).
pub fn arith_service() -> Service {
    ServiceBuilder::new("Arith", Arith)
        .method("Sum", |_: &Arith, args: Args, reply: &mut i64| {
            *reply = args
                .num1
                .checked_add(args.num2)
                .ok_or_else(|| ServiceError::application("integer overflow"))?;
            Ok(())
        })
        .method("Mul", |_: &Arith, args: Args, reply: &mut i64| {
            *reply = args
                .num1
                .checked_mul(args.num2)
                .ok_or_else(|| ServiceError::application("integer overflow"))?;
            Ok(())
        })
        .method("Sleep", |_: &Arith, millis: u64, reply: &mut u64| {
            std::thread::sleep(Duration::from_millis(millis));
            *reply = millis;
            Ok(())
        })
        .build()
}
