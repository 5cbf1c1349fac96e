//! account-desk: terminal client for a company research assistant.
//!
//! The research service generates company research and structured account
//! plans; this crate is the conversation front end:
//! Keyboard/Microphone → Submission → `POST /chat` → Transcript/Plan → Speaker
//!
//! # Architecture
//!
//! - **Session**: one random identifier per run correlates all requests
//! - **Transcript**: append-only log with keyed "thinking" placeholders
//! - **Plan**: seven known sections rendered in a fixed order
//! - **Speech**: platform synthesizer/recognizer programs behind capability checks
//! - **Chat**: the application context and its single event loop
//! - **UI**: rendering surface and terminal controls

pub mod api;
pub mod chat;
pub mod config;
pub mod desk_dirs;
pub mod error;
pub mod logging;
pub mod persona;
pub mod plan;
pub mod session;
pub mod speech;
pub mod transcript;
pub mod ui;

pub use chat::{ChatApp, SubmitOutcome};
pub use config::DeskConfig;
pub use error::{DeskError, Result};
pub use plan::{AccountPlan, PlanSection, RenderedPlan, render_plan};
pub use session::SessionId;
