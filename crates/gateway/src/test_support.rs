// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fixtures and a scripted agent engine.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use crate::agent::{AgentCaller, ChatService};
use crate::auth::REQUEST_CREDENTIAL_FUNCTION;
use crate::credential::{AuthCredential, AuthScheme};
use crate::engine::{
    AgentEngine, Content, Event, EventStream, FunctionCall, FunctionResponse, Part, Role,
};
use crate::oauth::CallbackStore;
use crate::session::{InMemorySessionService, Session};
use crate::state::GatewayState;
use crate::tools::{ToolContext, ToolHookRegistry};

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Google-style OAuth2 authorization-code scheme.
pub fn oauth_scheme() -> AuthScheme {
    let scopes = BTreeMap::from([(
        "https://www.googleapis.com/auth/gmail.readonly".to_owned(),
        "View your emails in Gmail".to_owned(),
    )]);
    AuthScheme::oauth2_authorization_code(
        "https://accounts.google.com/o/oauth2/auth",
        "https://oauth2.googleapis.com/token",
        scopes,
    )
}

pub fn oauth_credential() -> AuthCredential {
    AuthCredential::oauth2("client-id", "client-secret")
}

/// `authConfig` JSON as the engine sends it when a tool needs authorization.
pub fn negotiation(auth_uri: &str, state: &str) -> Value {
    json!({
        "authScheme": oauth_scheme(),
        "rawAuthCredential": oauth_credential(),
        "exchangedAuthCredential": {
            "authType": "oauth2",
            "oauth2": {
                "clientId": "client-id",
                "clientSecret": "client-secret",
                "authUri": auth_uri,
                "state": state,
            }
        },
        "credentialKey": "gmail-tool",
    })
}

/// Exchanged credential as the engine stores it in run state.
pub fn exchanged_credential(access_token: &str) -> Value {
    json!({
        "authType": "oauth2",
        "oauth2": { "clientId": "client-id", "accessToken": access_token }
    })
}

/// Pending credential request event, as emitted by the engine.
pub fn auth_request_event(call_id: &str, auth_config: Value) -> Event {
    let mut args = Map::new();
    args.insert("authConfig".to_owned(), auth_config);
    let call = FunctionCall {
        id: Some(call_id.to_owned()),
        name: REQUEST_CREDENTIAL_FUNCTION.to_owned(),
        args,
    };
    let mut event = Event::new(
        Some("agent".to_owned()),
        Content::new(Role::Model, vec![Part::function_call(call)]),
    );
    event.long_running_tool_ids.insert(call_id.to_owned());
    event
}

pub fn text_event(text: &str) -> Event {
    Event::model_text(Some("agent".to_owned()), text)
}

/// One scripted action of a [`ScriptedEngine`] run.
#[derive(Debug, Clone)]
pub enum Step {
    Emit(Event),
    /// Invoke a tool through the hook registry and emit its response.
    Tool { name: String, args: Map<String, Value>, response: Value },
    /// Write into the session's run state, as the engine does after a
    /// credential exchange.
    SetState { key: String, value: Value },
    /// End the run with an engine error.
    Fail(String),
}

impl Step {
    pub fn text(text: &str) -> Self {
        Self::Emit(text_event(text))
    }

    pub fn tool(name: &str, args: Value, response: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::Tool { name: name.to_owned(), args, response }
    }

    pub fn set_state(key: impl Into<String>, value: Value) -> Self {
        Self::SetState { key: key.into(), value }
    }
}

/// Agent engine that replays one script per `run` call, in order.
///
/// Runs past the end of the script produce no events. Each session keeps its
/// own run state across runs.
pub struct ScriptedEngine {
    app_name: String,
    runs: Mutex<VecDeque<Vec<Step>>>,
    received: Mutex<Vec<Content>>,
    hooks: Arc<ToolHookRegistry>,
    states: Arc<Mutex<HashMap<String, Map<String, Value>>>>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            app_name: "agentgate".to_owned(),
            runs: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            hooks: Arc::new(ToolHookRegistry::new()),
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn hooks(self, hooks: ToolHookRegistry) -> Self {
        self.shared_hooks(Arc::new(hooks))
    }

    pub fn shared_hooks(mut self, hooks: Arc<ToolHookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Append a run made of `steps`.
    pub fn run(mut self, steps: Vec<Step>) -> Self {
        self.runs.get_mut().push_back(steps);
        self
    }

    /// Append a run that only emits text events.
    pub fn texts(self, texts: &[&str]) -> Self {
        self.run(texts.iter().map(|t| Step::text(t)).collect())
    }

    /// Messages received so far, one per `run` call.
    pub async fn received(&self) -> Vec<Content> {
        self.received.lock().await.clone()
    }

    pub async fn run_count(&self) -> usize {
        self.received.lock().await.len()
    }

    /// Run state of `session_id`.
    pub async fn state(&self, session_id: &str) -> Map<String, Value> {
        self.states.lock().await.get(session_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AgentEngine for ScriptedEngine {
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
    ) -> anyhow::Result<EventStream> {
        self.received.lock().await.push(message);
        let steps = self.runs.lock().await.pop_front().unwrap_or_default();
        let session = Session::new(session_id, self.app_name.as_str(), user_id);
        Ok(Box::pin(play(steps, session, Arc::clone(&self.hooks), Arc::clone(&self.states))))
    }
}

fn play(
    steps: Vec<Step>,
    session: Session,
    hooks: Arc<ToolHookRegistry>,
    states: Arc<Mutex<HashMap<String, Map<String, Value>>>>,
) -> impl Stream<Item = anyhow::Result<Event>> + Send + 'static {
    async_stream::try_stream! {
        for step in steps {
            match step {
                Step::Emit(event) => {
                    yield event;
                }
                Step::Tool { name, args, response } => {
                    let state = states.lock().await.remove(&session.id).unwrap_or_default();
                    let mut ctx = ToolContext { session: session.clone(), state };
                    hooks.before_tool(&name, &args, &mut ctx).await?;
                    let response = hooks.after_tool(&name, &args, &mut ctx, response).await?;
                    states.lock().await.insert(session.id.clone(), ctx.state);
                    let part = Part::function_response(FunctionResponse { id: None, name, response });
                    yield Event::new(Some("agent".to_owned()), Content::new(Role::Model, vec![part]));
                }
                Step::SetState { key, value } => {
                    states.lock().await.entry(session.id.clone()).or_default().insert(key, value);
                }
                Step::Fail(message) => {
                    Err::<(), anyhow::Error>(anyhow::anyhow!(message))?;
                }
            }
        }
    }
}

/// Builder for a [`GatewayState`] driven by a [`ScriptedEngine`].
pub struct GatewayBuilder {
    engine: ScriptedEngine,
    app_name: String,
    codes: CallbackStore,
    tools: Option<Arc<ToolHookRegistry>>,
    auth_token: Option<String>,
    redirect_uri: String,
    poll_interval: Duration,
    auth_timeout: Duration,
}

/// A built gateway plus handles tests inspect afterwards.
pub struct GatewayCtx {
    pub state: Arc<GatewayState>,
    pub engine: Arc<ScriptedEngine>,
    pub codes: CallbackStore,
}

impl GatewayBuilder {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self {
            engine,
            app_name: "agentgate".to_owned(),
            codes: CallbackStore::in_memory(),
            tools: None,
            auth_token: None,
            redirect_uri: "http://localhost:8000/oauth/callback".to_owned(),
            poll_interval: Duration::from_millis(10),
            auth_timeout: Duration::from_secs(5),
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn codes(mut self, codes: CallbackStore) -> Self {
        self.codes = codes;
        self
    }

    /// Tool hooks shared by the gateway state and the scripted engine.
    pub fn tools(mut self, tools: ToolHookRegistry) -> Self {
        self.tools = Some(Arc::new(tools));
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn build(self) -> GatewayCtx {
        let mut engine = self.engine.app_name(self.app_name.clone());
        if let Some(tools) = &self.tools {
            engine = engine.shared_hooks(Arc::clone(tools));
        }
        let engine = Arc::new(engine);
        let sessions = Arc::new(InMemorySessionService::new());
        let caller = AgentCaller::builder(engine.clone(), sessions.clone(), self.codes.clone())
            .app_name(self.app_name)
            .agent_name("agent")
            .redirect_uri(self.redirect_uri)
            .poll_interval(self.poll_interval)
            .auth_timeout(self.auth_timeout)
            .build();
        let mut state =
            GatewayState::new(ChatService::new(Arc::new(caller)), sessions, self.codes.clone())
                .with_auth_token(self.auth_token);
        if let Some(tools) = self.tools {
            state = state.with_tools(tools);
        }
        GatewayCtx { state: Arc::new(state), engine, codes: self.codes }
    }
}
