/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::document::Document;
use crate::error::InboxError;
use crate::model::User;
use crate::state::InboxState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use stoa_protocol::ANY;
use tracing::debug;

#[async_trait]
pub trait ActivityHandler: Send + Sync {
    async fn handle(
        &self,
        state: &InboxState,
        recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError>;
}

/// Dispatch table keyed by `(activity type, object type)`; `*` matches
/// anything. Filled once at startup, read-only afterwards.
#[derive(Default)]
pub struct Router {
    routes: HashMap<(String, String), Arc<dyn ActivityHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, replacing any handler already under the same key.
    pub fn add<H>(&mut self, activity_type: &str, object_type: &str, handler: H) -> &mut Self
    where
        H: ActivityHandler + 'static,
    {
        self.routes.insert(
            (activity_type.to_string(), object_type.to_string()),
            Arc::new(handler),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Exact/exact, then exact/any, then any/exact, then any/any.
    pub fn lookup(&self, activity_type: &str, object_type: &str) -> Option<&Arc<dyn ActivityHandler>> {
        let candidates = [
            (activity_type, object_type),
            (activity_type, ANY),
            (ANY, object_type),
            (ANY, ANY),
        ];
        candidates.iter().find_map(|(a, o)| {
            self.routes.get(&(a.to_string(), o.to_string()))
        })
    }

    /// True when some route names `activity_type` together with a concrete
    /// object type, so the object type matters for dispatch.
    fn routes_on_object_type(&self, activity_type: &str) -> bool {
        self.routes
            .keys()
            .any(|(a, o)| (a == activity_type || a == ANY) && o != ANY)
    }

    /// Runs exactly one handler for `document`.
    pub async fn handle(
        &self,
        state: &InboxState,
        recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let activity_type = document.type_name().to_string();
        let object_type = self.object_type(&activity_type, document).await;
        let Some(handler) = self.lookup(&activity_type, &object_type) else {
            return Err(InboxError::NoRoute {
                activity_type,
                object_type,
            });
        };
        debug!(
            activity_type = %activity_type,
            object_type = %object_type,
            activity = document.id(),
            "routing activity"
        );
        handler.handle(state, recipient, document).await
    }

    /// Type of the activity's object. A bare reference is only dereferenced
    /// when a route depends on it; failure leaves the type empty so only
    /// wildcard routes match.
    async fn object_type(&self, activity_type: &str, document: &Document) -> String {
        let object = document.object();
        if !object.is_reference() {
            return object.type_name().to_string();
        }
        if !self.routes_on_object_type(activity_type) {
            return String::new();
        }
        match object.load().await {
            Ok(loaded) => loaded.type_name().to_string(),
            Err(e) => {
                debug!(object = object.id(), "object type unknown: {e}");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InboxConfig;
    use crate::document::MemoryResolver;
    use crate::memory::MemoryStore;
    use crate::queue::ChannelQueue;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ActivityHandler for Recorder {
        async fn handle(
            &self,
            _state: &InboxState,
            _recipient: Option<&User>,
            _document: &Document,
        ) -> Result<(), InboxError> {
            self.calls.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    fn state() -> InboxState {
        let (queue, _rx) = ChannelQueue::new();
        InboxState::with_store(
            InboxConfig::new("https://local.example"),
            Arc::new(MemoryStore::new()),
            Arc::new(queue),
        )
    }

    fn full_router(calls: &Arc<Mutex<Vec<&'static str>>>) -> Router {
        let mut router = Router::new();
        for (a, o, name) in [
            ("Accept", "Follow", "accept/follow"),
            ("Accept", "*", "accept/*"),
            ("*", "Follow", "*/follow"),
            ("*", "*", "*/*"),
        ] {
            router.add(a, o, Recorder { name, calls: calls.clone() });
        }
        router
    }

    async fn dispatch(router: &Router, value: serde_json::Value) -> Result<(), InboxError> {
        let resolver = Arc::new(MemoryResolver::new());
        let doc = Document::new(value, resolver);
        router.handle(&state(), None, &doc).await
    }

    #[tokio::test]
    async fn precedence_prefers_most_specific() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let router = full_router(&calls);
        let cases = [
            (json!({"type": "Accept", "object": {"type": "Follow"}}), "accept/follow"),
            (json!({"type": "Accept", "object": {"type": "Note"}}), "accept/*"),
            (json!({"type": "Undo", "object": {"type": "Follow"}}), "*/follow"),
            (json!({"type": "Undo", "object": {"type": "Like"}}), "*/*"),
        ];
        for (value, expected) in cases {
            calls.lock().unwrap().clear();
            dispatch(&router, value).await.unwrap();
            assert_eq!(*calls.lock().unwrap(), vec![expected]);
        }
    }

    #[tokio::test]
    async fn unmatched_pair_is_no_route() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.add("Create", "*", Recorder { name: "create", calls: calls.clone() });
        let err = dispatch(&router, json!({"type": "Move", "object": {"type": "Person"}}))
            .await
            .unwrap_err();
        match err {
            InboxError::NoRoute { activity_type, object_type } => {
                assert_eq!(activity_type, "Move");
                assert_eq!(object_type, "Person");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolvable_reference_falls_back_to_wildcard() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let router = full_router(&calls);
        dispatch(
            &router,
            json!({"type": "Accept", "object": "https://remote.example/unknown"}),
        )
        .await
        .unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["accept/*"]);
    }

    #[test]
    fn add_replaces_existing_key() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.add("Like", "*", Recorder { name: "a", calls: calls.clone() });
        router.add("Like", "*", Recorder { name: "b", calls: calls.clone() });
        assert_eq!(router.len(), 1);
        assert!(router.lookup("Like", "Note").is_some());
        assert!(router.lookup("Dislike", "Note").is_none());
    }
}
