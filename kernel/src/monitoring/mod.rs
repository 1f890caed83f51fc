/*!
 * Monitoring
 * Tracing setup and span helpers
 */

mod tracer;

pub use tracer::{init_tracing, span_operation, span_tick, TRACE_JSON_ENV};
