mod metrics_sink;
mod policy_engine;
mod upstream_resolver;

pub use metrics_sink::MetricsSink;
pub use policy_engine::PolicyEngine;
pub use upstream_resolver::{UpstreamAnswer, UpstreamResolver};
