/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Inbound federation pipeline: routes ActivityPub activities delivered to
//! local inboxes and applies them to follow, inbox and response state.

pub mod config;
pub mod document;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod policy;
pub mod queue;
pub mod router;
pub mod sqlite;
pub mod state;
pub mod store;
pub mod urls;

pub use config::InboxConfig;
pub use document::{Document, HttpResolver, MemoryResolver, Resolver};
pub use error::InboxError;
pub use handlers::build_router;
pub use router::{ActivityHandler, Router};
pub use state::InboxState;
