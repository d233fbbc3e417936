//! Wire and on-disk data model for the autopilot gateway.
//!
//! This crate defines the event shapes the host delivers to the gateway, the
//! state persisted between events, and the small vocabulary of enums
//! (priorities, reason codes, completion modes) shared by every hook. It
//! intentionally carries no execution logic: that lives in `gateway-hooks`.

pub mod event;
pub mod loop_state;
pub mod pending_context;
pub mod runtime_file;

pub use event::{Event, EventPayload, EventType, ReasonCode, TextPart};
pub use loop_state::{ActiveLoop, CompletionMode, GatewayState, DEFAULT_COMPLETION_PROMISE};
pub use pending_context::{Priority, PendingContextEntry};
pub use runtime_file::{AutopilotRuntimeFile, RuntimeStatus};
