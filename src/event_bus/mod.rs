//! Event bus utilities providing fan-out, sinks, and subscriber APIs.
//!
//! The module is organised around a broadcast-based [`EventHub`] and helpers for
//! configuring sinks (`EventBus`) and consuming the resulting [`EventStream`].

pub mod bus;
pub mod diagnostics;
pub mod emitter;
pub mod envelope;
pub mod event;
pub mod hub;
pub mod sink;

pub use bus::EventBus;
pub use diagnostics::{DiagnosticsConfig, DiagnosticsStream, SinkDiagnostic, SinkHealth};
pub use emitter::{EmitterError, EventEmitter};
pub use envelope::{
    Choice, CompletionDelta, EnvelopeError, EventAuthor, EventEnvelope, ModelDelta, ModelResponse,
    NodeDelta, StateDelta, ToolDelta,
};
pub use event::{
    DiagnosticEvent, Event, LLMStreamingEvent, NodeEvent, NodePhase, STREAM_END_SCOPE, ToolEvent,
    ToolPhase,
};
pub use hub::{BlockingEventIter, EventHub, EventHubMetrics, EventStream, HubEmitter};
pub use sink::{ChannelSink, EventSink, JsonLinesSink, MemorySink, StdOutSink};
