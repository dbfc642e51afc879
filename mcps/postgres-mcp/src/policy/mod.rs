//! SQL access-control policy engine
//!
//! Raw SQL flows through [`lexer::strip`], [`normalize::normalize`] and
//! [`classify::classify`]; [`gate::evaluate`] wires them together. The whole
//! engine is synchronous and pure, so it is safe to call from any number of
//! concurrent tool calls.

pub mod classify;
pub mod gate;
pub mod lexer;
pub mod normalize;

pub use classify::classify;
pub use gate::evaluate;
pub use lexer::{spans, strip, Span, SpanKind};
pub use normalize::{normalize, NormalizedStatement};
