//! Structured cancellation for session tasks.

mod token;

pub use token::CancellationToken;
