/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::model::LocalActor;
use anyhow::anyhow;
use stoa_protocol::AcceptActivity;
use tokio::sync::mpsc;

/// Work handed to the outbound side. Submission does not wait for delivery.
#[derive(Debug, Clone)]
pub enum OutboundTask {
    SendAccept {
        actor: LocalActor,
        /// Inbox owner the accept is addressed to.
        recipient: String,
        activity: AcceptActivity,
    },
}

impl OutboundTask {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundTask::SendAccept { .. } => "send_accept",
        }
    }
}

pub trait TaskQueue: Send + Sync {
    /// Fire and forget; an error means the task was never accepted.
    fn run(&self, task: OutboundTask) -> anyhow::Result<()>;
}

/// Hands tasks to whoever owns the receiving half.
#[derive(Clone)]
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<OutboundTask>,
}

impl ChannelQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TaskQueue for ChannelQueue {
    fn run(&self, task: OutboundTask) -> anyhow::Result<()> {
        self.tx
            .send(task)
            .map_err(|e| anyhow!("outbound queue closed, dropped {}", e.0.kind()))
    }
}
