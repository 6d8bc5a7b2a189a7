/*!
 * Monitoring Module
 * Tracing subscriber setup for dispatch diagnostics
 */

mod tracer;

pub use tracer::{init_tracing, try_init_tracing, ENV_TRACE_JSON};
