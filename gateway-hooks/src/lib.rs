//! # Gateway Hooks
//!
//! An event-driven hook gateway sitting between an interactive coding
//! assistant host and its tool/model runtime. It receives lifecycle
//! events and dispatches them through an ordered, configurable pipeline
//! of hooks that can inspect, mutate, inject into, or reject the event.
//!
//! ## Architecture
//!
//! - **Registry & Dispatcher** (`registry`): deterministic event routing.
//! - **Continuation Loop** (`loop_engine`): owns the autonomous
//!   re-prompt-until-done objective.
//! - **Pending-Context Collector** (`collector`): deferred text awaiting
//!   injection into the next user-visible message.
//! - **State Store** (`state_store`): atomic on-disk persistence of
//!   [`gateway_protocol::GatewayState`].
//! - **Audit Sink** (`audit`): append-only JSONL event log with rotation.
//! - **Policy Loader** (`policy`): layered, normalized configuration.
//! - **Hook bodies** (`hooks`): the guard and advisory hooks built on top
//!   of the above.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_hooks::registry::{self, HookRegistry};
//! use gateway_hooks::context::GatewayRuntime;
//!
//! registry::register(std::sync::Arc::new(my_hook)).await;
//! registry::dispatch(&mut event, &runtime).await?;
//! ```

pub mod audit;
pub mod collector;
pub mod context;
pub mod decision;
pub mod env;
pub mod hooks;
pub mod host_api;
pub mod injection;
pub mod loop_engine;
pub mod policy;
pub mod process_sampler;
pub mod provider_error;
pub mod registry;
pub mod runtime_file;
pub mod session_map;
pub mod slash_command;
pub mod state_store;
pub mod stop_guard;
pub mod types;

pub use context::{GatewayRuntime, HookContext};
pub use decision::{GuardRejection, HookResult};
pub use policy::Policy;
pub use registry::{dispatch, register, Hook, HookRegistry};
pub use types::{HookMetadata, HookPriority};
