//! Single-shot RFC 3489 binding exchange over UDP.

pub mod exchange;

pub use exchange::{
    binding_check, run_exchange, run_exchange_blocking, Canceller, ExchangeConfig, ExchangeError,
    Exchanger, Outcome,
};
