/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Context;
use std::env;
use std::sync::Arc;
use stoa_core::document::{Document, HttpResolver};
use stoa_core::queue::{ChannelQueue, OutboundTask};
use stoa_core::sqlite::InboxDb;
use stoa_core::store::UserDirectory;
use stoa_core::{build_router, InboxConfig, InboxState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [config_path, user_id, activity_path] = args.as_slice() else {
        anyhow::bail!("usage: stoa_inbox_replay <config.json> <user_id|-> <activity.json>");
    };

    let cfg = InboxConfig::load(config_path)?;
    let db = Arc::new(InboxDb::open(cfg.db_path()?)?);
    let resolver = Arc::new(HttpResolver::new(cfg.http_timeout(), &cfg.user_agent())?);

    let (queue, mut tasks) = ChannelQueue::new();
    let state = InboxState::with_store(cfg, db.clone(), Arc::new(queue));

    let recipient = if user_id == "-" {
        None
    } else {
        let user = db
            .load_user(user_id)?
            .with_context(|| format!("unknown local user: {user_id}"))?;
        Some(user)
    };

    let text = std::fs::read_to_string(activity_path)
        .with_context(|| format!("read {activity_path}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse {activity_path}"))?;
    let document = Document::new(value, resolver);

    let router = build_router();
    let result = router.handle(&state, recipient.as_ref(), &document).await;
    drop(state);

    // Nothing delivers here; show what would have gone out.
    while let Some(task) = tasks.recv().await {
        match task {
            OutboundTask::SendAccept { recipient, activity, .. } => {
                println!("queued {} to {recipient}", activity.id);
                println!("{}", serde_json::to_string_pretty(&activity)?);
            }
        }
    }

    match result {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(e) => {
            println!("status={} permanent={}", e.status_code().as_u16(), e.is_permanent());
            Err(e.into())
        }
    }
}
