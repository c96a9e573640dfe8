//! Real-world scenario benchmarks.
//!
//! These render the ambient graph exactly as the app builds it.

mod ambient;

pub use ambient::bench_ambient;
