//! Conversation driver: orchestrates one request/response cycle.
//!
//! `handle_user_message` appends the user turn, renders the prompt from the
//! full history, awaits the model, appends the reply, and persists. A failed
//! model call rolls the user turn back so neither memory nor disk changes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use parley_core::error::ModelCallError;
use parley_core::session::SessionStore;
use parley_core::types::{Role, Turn};
use parley_core::utils;
use parley_providers::traits::{ChatModel, LlmRequestConfig};

use crate::prompt::PromptTemplate;

/// Owns the session store and talks to the model on its behalf.
pub struct ConversationDriver {
    store: SessionStore,
    model: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    request_config: LlmRequestConfig,
}

impl ConversationDriver {
    pub fn new(
        store: SessionStore,
        model: Arc<dyn ChatModel>,
        prompt: PromptTemplate,
        request_config: LlmRequestConfig,
    ) -> Self {
        info!(
            provider = model.display_name(),
            model = model.model(),
            durable = store.is_durable(),
            "conversation driver initialized"
        );
        Self {
            store,
            model,
            prompt,
            request_config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// `"<provider>/<model>"`, for banners and status lines.
    pub fn model_label(&self) -> String {
        format!("{}/{}", self.model.display_name(), self.model.model())
    }

    /// Run one exchange and return the session's updated turns.
    ///
    /// On success the last two turns are `(user, text)` and
    /// `(assistant, reply)`. On a model failure the error is returned and
    /// the session is exactly as it was before the call. Persistence
    /// failures are logged; the in-memory reply is still returned.
    pub async fn handle_user_message(
        &mut self,
        session_id: &str,
        text: &str,
    ) -> Result<&[Turn], ModelCallError> {
        let before = self.store.get_or_create(session_id).len();
        self.store.append(session_id, Role::User, text);

        let messages = self.prompt.render(&self.store.get_or_create(session_id).turns);
        debug!(session = session_id, messages = messages.len(), "sending prompt");

        let reply = match self.model.complete(&messages, &self.request_config).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = session_id, error = %e, "model call failed, rolling back turn");
                self.store.truncate(session_id, before);
                return Err(e);
            }
        };

        let turns = self
            .store
            .append(session_id, Role::Assistant, utils::unescape_newlines(&reply));

        if let Err(e) = self.store.persist(session_id) {
            warn!(session = session_id, error = %e, "failed to persist session");
        }

        info!(session = session_id, turns, "exchange complete");
        Ok(self
            .store
            .get(session_id)
            .map(|s| s.turns.as_slice())
            .unwrap_or_default())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use parley_core::types::{PromptMessage, PromptRole};
    use tempfile::tempdir;

    /// Replies from a script, recording every prompt it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, ModelCallError>>>,
        prompts: Mutex<Vec<Vec<PromptMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, ModelCallError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<Vec<PromptMessage>> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            messages: &[PromptMessage],
            _config: &LlmRequestConfig,
        ) -> Result<String, ModelCallError> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("(script exhausted)".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }

        fn display_name(&self) -> &str {
            "Stub"
        }
    }

    fn rate_limited() -> ModelCallError {
        ModelCallError::Api {
            provider: "Stub".into(),
            status: 429,
            body: "rate limit".into(),
        }
    }

    fn driver_with(store: SessionStore, model: Arc<ScriptedModel>) -> ConversationDriver {
        ConversationDriver::new(
            store,
            model,
            PromptTemplate::new("You are a helpful assistant."),
            LlmRequestConfig::default(),
        )
    }

    #[tokio::test]
    async fn single_exchange_is_appended_and_persisted() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
        let model = ScriptedModel::new(vec![Ok("hi there".into())]);
        let mut driver = driver_with(store, model);

        let turns = driver.handle_user_message("s1", "hello").await.unwrap().to_vec();
        let expected = vec![Turn::user("hello"), Turn::assistant("hi there")];
        assert_eq!(turns, expected);

        let reloaded = SessionStore::new(Some(dir.path().to_path_buf()))
            .unwrap()
            .load("s1")
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.turns, expected);
    }

    #[tokio::test]
    async fn two_calls_keep_call_order() {
        let model = ScriptedModel::new(vec![Ok("reply to a".into()), Ok("reply to b".into())]);
        let mut driver = driver_with(SessionStore::ephemeral(), model.clone());

        driver.handle_user_message("s1", "a").await.unwrap();
        let turns = driver.handle_user_message("s1", "b").await.unwrap().to_vec();

        assert_eq!(
            turns,
            vec![
                Turn::user("a"),
                Turn::assistant("reply to a"),
                Turn::user("b"),
                Turn::assistant("reply to b"),
            ]
        );

        // Second prompt = system + full history including the new user turn
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        let second: Vec<(PromptRole, &str)> = prompts[1]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            second,
            vec![
                (PromptRole::System, "You are a helpful assistant."),
                (PromptRole::User, "a"),
                (PromptRole::Assistant, "reply to a"),
                (PromptRole::User, "b"),
            ]
        );
    }

    #[tokio::test]
    async fn model_failure_leaves_session_unchanged() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
        let model = ScriptedModel::new(vec![
            Ok("first reply".into()),
            Err(rate_limited()),
            Ok("retry reply".into()),
        ]);
        let mut driver = driver_with(store, model);

        driver.handle_user_message("s1", "first").await.unwrap();
        let file = dir.path().join("s1.json");
        let snapshot = std::fs::read(&file).unwrap();

        let err = driver.handle_user_message("s1", "second").await.unwrap_err();
        assert!(matches!(err, ModelCallError::Api { status: 429, .. }));

        // Disk is byte-identical and memory has no dangling user turn
        assert_eq!(std::fs::read(&file).unwrap(), snapshot);
        assert_eq!(
            driver.store().get("s1").unwrap().turns,
            vec![Turn::user("first"), Turn::assistant("first reply")]
        );

        // A retry goes through cleanly
        let turns = driver.handle_user_message("s1", "second").await.unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[2], Turn::user("second"));
        assert_eq!(turns[3], Turn::assistant("retry reply"));
    }

    #[tokio::test]
    async fn failure_on_new_session_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
        let model = ScriptedModel::new(vec![Err(ModelCallError::Network {
            provider: "Stub".into(),
            message: "connection refused".into(),
        })]);
        let mut driver = driver_with(store, model);

        assert!(driver.handle_user_message("fresh", "hello").await.is_err());
        assert!(!dir.path().join("fresh.json").exists());
        assert!(driver.store().get("fresh").unwrap().turns.is_empty());
    }

    #[tokio::test]
    async fn reply_escape_markers_are_unescaped() {
        let model = ScriptedModel::new(vec![Ok("line one\\nline two".into())]);
        let mut driver = driver_with(SessionStore::ephemeral(), model);

        let turns = driver.handle_user_message("s1", "hi").await.unwrap();
        assert_eq!(turns[1].content, "line one\nline two");
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_reply() {
        let root = tempdir().unwrap();
        let sessions = root.path().join("sessions");
        let store = SessionStore::new(Some(sessions.clone())).unwrap();

        // Replace the sessions directory with a plain file so writes fail
        std::fs::remove_dir(&sessions).unwrap();
        std::fs::write(&sessions, "not a directory").unwrap();

        let model = ScriptedModel::new(vec![Ok("still here".into())]);
        let mut driver = driver_with(store, model);

        let turns = driver.handle_user_message("s1", "hello").await.unwrap();
        assert_eq!(turns.last().unwrap(), &Turn::assistant("still here"));
    }

    #[tokio::test]
    async fn unstorable_id_keeps_reply_but_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
        let model = ScriptedModel::new(vec![Ok("to a/b".into()), Ok("to a_b".into())]);
        let mut driver = driver_with(store, model);

        let turns = driver.handle_user_message("a/b", "hello").await.unwrap();
        assert_eq!(turns.last().unwrap(), &Turn::assistant("to a/b"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        // The look-alike id starts empty rather than picking up a/b's history
        let turns = driver.handle_user_message("a_b", "hello").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(driver.store().list_sessions().unwrap(), vec!["a_b"]);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let model = ScriptedModel::new(vec![Ok("to x".into()), Ok("to y".into())]);
        let mut driver = driver_with(SessionStore::ephemeral(), model.clone());

        driver.handle_user_message("x", "hello x").await.unwrap();
        driver.handle_user_message("y", "hello y").await.unwrap();

        assert_eq!(driver.store().get("x").unwrap().len(), 2);
        assert_eq!(driver.store().get("y").unwrap().len(), 2);
        // The prompt for y never saw x's history
        assert_eq!(model.prompts()[1].len(), 2);
    }

    #[test]
    fn model_label_names_provider_and_model() {
        let driver = driver_with(SessionStore::ephemeral(), ScriptedModel::new(vec![]));
        assert_eq!(driver.model_label(), "Stub/scripted");
    }
}
