// SPDX-License-Identifier: GPL-3.0-only

//! Shared capture stream management
//!
//! ```text
//! ┌──────────────────────┐
//! │  StreamSinkManager   │  ← add/remove listener, façade lock
//! └──────┬────────┬──────┘
//!        │        │
//!        ▼        ▼
//! ┌────────────┐ ┌──────────────────────┐
//! │ Listener   │ │  PipelineLifecycle   │  ← one pipeline, lifecycle lock
//! │ Counter    │ └──────────┬───────────┘
//! └────────────┘            │ samples
//!                           ▼
//!                    ┌─────────────┐      ┌─────────────┐
//!                    │ RelayTask   │ ───► │ SampleQueue │ ──► consumers
//!                    └─────────────┘      └─────────────┘
//! ```

pub mod framerate;
pub mod lifecycle;
pub mod listeners;
pub mod manager;
pub mod queue;
pub mod relay;

pub use framerate::{FramerateSettings, rewrite_framerate};
pub use lifecycle::{DescriptionProvider, PipelineLifecycle, description_provider};
pub use listeners::ListenerCounter;
pub use manager::StreamSinkManager;
pub use queue::SampleQueue;
pub use relay::RelayTask;
