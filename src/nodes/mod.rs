//! Node runtimes (§4.5): concrete [`crate::node::Node`] implementations for
//! every node kind the engine schedules. A router is not listed here — it is
//! already the existing [`crate::graphs::EdgePredicate`], a pure function
//! from snapshot to label, with no state mutation and therefore no `Node`
//! adapter needed.

pub mod agent;
pub mod function;
pub mod llm;
pub mod tools;

pub use agent::SubAgentNode;
pub use function::FunctionNode;
pub use llm::LlmNode;
pub use tools::ToolsNode;
