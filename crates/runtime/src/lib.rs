//! Quill runtime: the orchestration layer.
//!
//! The [`Runtime`] coordinates settings lookup, the provider executor and
//! the session store to satisfy one logical chat turn: a single-model turn
//! (blocking or streamed over a [`Port`]), a multi-model fan-out, or a quick
//! text operation. [`Runtime::handle`] is the typed UI entry point.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_core::MemoryStorage;
//! use quill_runtime::{Runtime, Settings};
//! use quill_session::SessionHandle;
//!
//! let settings = Settings::load("quill.toml".as_ref())?;
//! let runtime = Runtime::from_settings(settings, MemoryStorage::new(), SessionHandle::new());
//! let answer = runtime.chat("hello").await?;
//! ```

pub use {
    config::{DEFAULT_MODEL_KEY, MODELS_KEY, RuntimeConfig, Settings, SyncedSettings, expand_env_vars},
    dispatch::{PortRequest, RequestKind, SessionArgs, UiRequest, UiResponse},
    operation::{DEFAULT_TARGET_LANGUAGE, Operation},
    retry::{MultiModelRetry, SingleModelRetry},
};

use compact_str::CompactString;
use futures_core::Stream;
use futures_util::{StreamExt, stream::FuturesUnordered};
use provider::{Client, Executor, validate};
use qcore::{
    ChatMessage, Completion, ConfigStore, ContentPart, Error, Message, ModelConfig, ModelResponse,
    MultiModelSession, Port, Result, Storage,
};
use session::{ChatLog, MultiModelHistory, SessionHandle, SessionStore};

mod config;
mod dispatch;
pub mod mux;
mod operation;
mod retry;

/// The quill runtime.
///
/// Generic over the configuration source and the local storage backend.
pub struct Runtime<C: ConfigStore, S: Storage> {
    config: C,
    executor: Executor,
    sessions: SessionStore<S>,
    chat_log: ChatLog<S>,
    history: MultiModelHistory<S>,
    single: SingleModelRetry,
    multi: MultiModelRetry,
}

impl<S: Storage> Runtime<Settings, S> {
    /// Build a runtime from loaded settings, using their timeout and retry
    /// policies.
    pub fn from_settings(settings: Settings, storage: S, current: SessionHandle) -> Self {
        let runtime = settings.runtime;
        let executor = Executor::new(Client::new()).with_timeout(runtime.request_timeout());
        Self::new(settings, storage, current, executor).with_retry(runtime.single, runtime.multi)
    }
}

impl<C: ConfigStore, S: Storage> Runtime<C, S> {
    /// Create a runtime with the default retry policies.
    pub fn new(config: C, storage: S, current: SessionHandle, executor: Executor) -> Self {
        Self {
            config,
            executor,
            sessions: SessionStore::new(storage.clone(), current),
            chat_log: ChatLog::new(storage.clone()),
            history: MultiModelHistory::new(storage),
            single: SingleModelRetry::default(),
            multi: MultiModelRetry::default(),
        }
    }

    /// Replace the retry policies.
    pub fn with_retry(mut self, single: SingleModelRetry, multi: MultiModelRetry) -> Self {
        self.single = single;
        self.multi = multi;
        self
    }

    /// The session store.
    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    /// The flat chat log.
    pub fn chat_log(&self) -> &ChatLog<S> {
        &self.chat_log
    }

    /// The multi-model history.
    pub fn history(&self) -> &MultiModelHistory<S> {
        &self.history
    }

    /// The configuration source.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Run a single-model turn and return the answer.
    ///
    /// The user message and the answer are appended to the current session,
    /// which is resolved (or created) before the model is called.
    pub async fn chat(&self, content: &str) -> Result<String> {
        let question = user_message(content);
        let config = self.default_model(&question).await?;
        let session = self.sessions.ensure_current().await?;
        let messages = [question.message.clone()];
        let (executor, config, messages) = (&self.executor, &config, &messages[..]);
        let completion = self
            .single
            .run(move |attempt| {
                tracing::debug!(model = %config.id, attempt, "single-model call");
                executor.complete(config, messages)
            })
            .await?;
        self.record_turn(&session.id, question, &completion).await?;
        Ok(completion.content)
    }

    /// Run a single-model turn streamed over `port`.
    ///
    /// The port receives the deltas and exactly one terminal event. Retries
    /// apply to failures before the first byte; once deltas flow, a failure
    /// ends the request. A model configured with `stream` off is answered
    /// whole and posted as a single chunk.
    pub async fn chat_stream<P: Port>(&self, content: &str, port: &P) -> Result<Completion> {
        let question = user_message(content);
        let mut target = None;
        let completion = mux::forward(port, async {
            let config = self.default_model(&question).await?;
            target = Some(self.sessions.ensure_current().await?.id);
            let messages = [question.message.clone()];
            let (executor, config, messages) = (&self.executor, &config, &messages[..]);
            if !config.stream {
                let completion = self
                    .single
                    .run(move |attempt| {
                        tracing::debug!(model = %config.id, attempt, "single-model call, streaming off");
                        executor.complete(config, messages)
                    })
                    .await?;
                return Ok(mux::whole(completion));
            }
            self.single
                .run(move |attempt| {
                    tracing::debug!(model = %config.id, attempt, "single-model stream");
                    executor.stream(config, messages)
                })
                .await
        })
        .await?;
        let id = match target {
            Some(id) => id,
            None => self.sessions.ensure_current().await?.id,
        };
        self.record_turn(&id, question, &completion).await?;
        Ok(completion)
    }

    /// Answer each inbound request with one streamed turn until the client
    /// disconnects or the requests end.
    pub async fn serve<P, R>(&self, port: &P, requests: R)
    where
        P: Port,
        R: Stream<Item = PortRequest>,
    {
        let mut requests = std::pin::pin!(requests);
        loop {
            let request = tokio::select! {
                biased;
                _ = port.closed() => break,
                request = requests.next() => match request {
                    Some(request) => request,
                    None => break,
                },
            };
            if let Err(e) = self.chat_stream(&request.content, port).await {
                tracing::debug!(kind = ?e.kind(), "streamed turn failed: {e}");
            }
        }
        tracing::debug!("port served");
    }

    /// Fan `content` out to every model in `model_ids` concurrently.
    ///
    /// Each id yields exactly one response. Unknown ids and failed branches
    /// settle as errors without affecting the others. The session is saved
    /// to the multi-model history when the fan-out starts, with every
    /// response pending, and again each time a branch settles.
    pub async fn multi_chat(&self, content: &str, model_ids: &[CompactString]) -> Result<MultiModelSession> {
        if model_ids.is_empty() {
            return Err(Error::invalid_input("select at least one model"));
        }
        let question = user_message(content);
        if question.message.is_empty() {
            return Err(Error::invalid_input("message content must not be empty"));
        }
        let models = self.models().await?;
        let messages = [question.message.clone()];

        let mut session = MultiModelSession::new(question, model_ids.to_vec());
        for response in &mut session.model_responses {
            if let Some(config) = models.iter().find(|m| m.id == response.model_id) {
                response.model_name = config.display_name().to_owned();
            }
        }
        self.save_history(&session).await;

        let (models, messages) = (&models[..], &messages[..]);
        let mut branches = model_ids
            .iter()
            .enumerate()
            .map(|(index, id)| async move { (index, self.branch(id, models, messages).await) })
            .collect::<FuturesUnordered<_>>();
        while let Some((index, response)) = branches.next().await {
            session.model_responses[index] = response;
            self.save_history(&session).await;
        }
        tracing::debug!(
            session = %session.session_id,
            succeeded = session.succeeded().count(),
            failed = session.failed().count(),
            "fan-out settled"
        );
        Ok(session)
    }

    /// Run a quick text operation with the default model.
    ///
    /// Uses the single-model retry policy and leaves the sessions alone.
    pub async fn quick(&self, operation: Operation, text: &str, language: Option<&str>) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input("no text selected"));
        }
        let prompt = user_message(&operation.prompt(text, language));
        let config = self.default_model(&prompt).await?;
        let messages = [prompt.message];
        let (executor, config, messages) = (&self.executor, &config, &messages[..]);
        let completion = self
            .single
            .run(move |_| executor.complete(config, messages))
            .await?;
        Ok(completion.content)
    }

    async fn branch(&self, id: &CompactString, models: &[ModelConfig], messages: &[ChatMessage]) -> ModelResponse {
        let Some(config) = models.iter().find(|m| m.id == *id) else {
            let mut response = ModelResponse::pending(id.clone(), id.as_str());
            response.fail("model not found");
            return response;
        };

        let mut response = ModelResponse::pending(config.id.clone(), config.display_name());
        let executor = &self.executor;
        let outcome = match validate(config) {
            Ok(_) => {
                self.multi
                    .run(move |attempt| {
                        tracing::debug!(model = %config.id, attempt, "fan-out call");
                        executor.complete(config, messages)
                    })
                    .await
            }
            Err(e) => Err(e),
        };
        match outcome {
            Ok(completion) => {
                response.succeed(Message::assistant(completion.content, completion.reasoning))
            }
            Err(e) => {
                tracing::warn!(model = %config.id, kind = ?e.kind(), "fan-out branch failed: {e}");
                response.fail(e.user_message());
            }
        }
        response
    }

    async fn save_history(&self, session: &MultiModelSession) {
        if let Err(e) = self.history.save(session).await {
            tracing::warn!("failed to save multi-model session: {e}");
        }
    }

    async fn models(&self) -> Result<Vec<ModelConfig>> {
        self.config
            .models()
            .await
            .map_err(|e| Error::storage("getModels", e))
    }

    /// Resolve and validate the default model for a non-empty question.
    async fn default_model(&self, question: &Message) -> Result<ModelConfig> {
        if question.message.is_empty() {
            return Err(Error::invalid_input("message content must not be empty"));
        }
        let models = self.models().await?;
        if models.is_empty() {
            return Err(Error::config("no models configured, add one in settings"));
        }
        let id = self
            .config
            .default_model_id()
            .await
            .map_err(|e| Error::storage("getDefaultModel", e))?
            .ok_or_else(|| Error::config("no default model selected"))?;
        let config = models
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::config(format!("default model '{id}' is not configured")))?;
        validate(&config)?;
        Ok(config)
    }

    /// Append the user message and the answer to session `id` and the chat
    /// log.
    async fn record_turn(&self, id: &str, question: Message, completion: &Completion) -> Result<()> {
        let text = question.text().to_owned();
        self.sessions.update(id, question).await?;
        let answer = Message::assistant(completion.content.clone(), completion.reasoning.clone());
        self.sessions.update(id, answer).await?;
        if let Err(e) = self.chat_log.append(&text, &completion.content).await {
            tracing::warn!("failed to append chat log: {e}");
        }
        Ok(())
    }
}

fn user_message(content: &str) -> Message {
    Message::user(vec![ContentPart::text(content.trim())])
}
