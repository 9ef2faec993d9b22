//! Chat fan-out orchestration
//!
//! Routes an incoming chat message to the matching agents, invokes them
//! concurrently, and joins their text replies into one aggregate response.
//! A failed or errored agent call degrades to a readable text fragment; the
//! aggregate completes once every selected call has settled. No retries, no
//! sibling cancellation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::router::{RouterConfig, route_message};
use crate::types::{AgentKind, ChatRequest, ChatResponse};

/// Separator between agent fragments in the aggregate reply.
const FRAGMENT_SEPARATOR: &str = "\n---\n";

/// How one agent call settled.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    /// 200 reply with a response body
    Reply(String),
    /// Non-success HTTP status
    HttpError(u16),
    /// Transport failure, panic, or anything else caught and stringified
    Exception(String),
}

impl AgentOutcome {
    /// Render as the fragment embedded in the aggregate response.
    pub fn into_fragment(self, agent: AgentKind) -> String {
        match self {
            Self::Reply(text) => format!("[{} Agent]: {}", agent.label(), text),
            Self::HttpError(status) => format!("[{} Agent]: Error {}", agent.label(), status),
            Self::Exception(err) => format!("[{} Agent]: Exception {}", agent.label(), err),
        }
    }
}

/// Seam for invoking a single agent. The production implementation goes over
/// HTTP; tests inject canned or failing invokers.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, agent: AgentKind, request: &ChatRequest) -> AgentOutcome;
}

/// Invokes agents by POSTing the chat request to their configured endpoints.
#[derive(Debug)]
pub struct HttpAgentInvoker {
    client: Client,
    endpoints: HashMap<AgentKind, String>,
}

impl HttpAgentInvoker {
    /// Build an invoker from an endpoint map. Every agent must have an
    /// endpoint; the router can select any of them.
    pub fn new(endpoints: HashMap<AgentKind, String>) -> Result<Self> {
        for agent in AgentKind::ALL {
            if !endpoints.contains_key(&agent) {
                return Err(anyhow!("No endpoint configured for agent '{}'", agent));
            }
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoints })
    }

    /// Endpoint map where every agent lives on one base URL
    /// (`{base}/agent/{name}`), the default single-process layout.
    pub fn endpoints_on(base_url: &str) -> HashMap<AgentKind, String> {
        let base = base_url.trim_end_matches('/');
        AgentKind::ALL
            .into_iter()
            .map(|agent| (agent, format!("{}/agent/{}", base, agent)))
            .collect()
    }
}

#[async_trait]
impl AgentInvoker for HttpAgentInvoker {
    async fn invoke(&self, agent: AgentKind, request: &ChatRequest) -> AgentOutcome {
        // Endpoint presence is validated in new()
        let url = match self.endpoints.get(&agent) {
            Some(u) => u,
            None => return AgentOutcome::Exception(format!("no endpoint for '{}'", agent)),
        };

        let response = match self.client.post(url).json(request).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Agent {} call failed: {}", agent, e);
                return AgentOutcome::Exception(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            return AgentOutcome::HttpError(status.as_u16());
        }

        match response.json::<ChatResponse>().await {
            Ok(body) => AgentOutcome::Reply(body.response),
            Err(e) => AgentOutcome::Exception(format!("invalid response body: {}", e)),
        }
    }
}

/// The orchestrator: keyword routing plus concurrent agent fan-out.
pub struct Orchestrator {
    invoker: Arc<dyn AgentInvoker>,
    router: RouterConfig,
}

impl Orchestrator {
    pub fn new(invoker: Arc<dyn AgentInvoker>, router: RouterConfig) -> Self {
        Self { invoker, router }
    }

    /// Handle one chat request end to end: route, fan out, aggregate.
    pub async fn dispatch(&self, request: ChatRequest) -> ChatResponse {
        let selected = route_message(&request.message, &self.router);
        debug!(
            "Dispatching message from '{}' to {} agent(s)",
            request.user_id,
            selected.len()
        );

        let request = Arc::new(request);
        let mut handles = Vec::with_capacity(selected.len());
        for agent in &selected {
            let agent = *agent;
            let invoker = self.invoker.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                invoker.invoke(agent, &request).await
            }));
        }

        // Await jointly; fragment order equals selection order.
        let mut fragments = Vec::with_capacity(handles.len());
        for (agent, handle) in selected.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Agent {} task panicked: {}", agent, e);
                    AgentOutcome::Exception(format!("task panicked: {}", e))
                }
            };
            fragments.push(outcome.into_fragment(agent));
        }

        ChatResponse {
            response: fragments.join(FRAGMENT_SEPARATOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with a per-agent canned string, or fails for agents in the
    /// failure list.
    struct CannedInvoker {
        failing: Vec<AgentKind>,
        erroring: Vec<AgentKind>,
        calls: AtomicUsize,
    }

    impl CannedInvoker {
        fn new() -> Self {
            Self {
                failing: vec![],
                erroring: vec![],
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AgentInvoker for CannedInvoker {
        async fn invoke(&self, agent: AgentKind, request: &ChatRequest) -> AgentOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&agent) {
                AgentOutcome::Exception("connection refused".to_string())
            } else if self.erroring.contains(&agent) {
                AgentOutcome::HttpError(500)
            } else {
                AgentOutcome::Reply(format!("{} says hi to {}", agent, request.user_id))
            }
        }
    }

    fn orchestrator(invoker: CannedInvoker) -> Orchestrator {
        Orchestrator::new(Arc::new(invoker), RouterConfig::default())
    }

    #[test]
    fn test_fragment_formats() {
        assert_eq!(
            AgentOutcome::Reply("ok".to_string()).into_fragment(AgentKind::Hydration),
            "[Hydration Agent]: ok"
        );
        assert_eq!(
            AgentOutcome::HttpError(503).into_fragment(AgentKind::Weather),
            "[Weather Agent]: Error 503"
        );
        assert_eq!(
            AgentOutcome::Exception("timed out".to_string()).into_fragment(AgentKind::Drinks),
            "[Drinks Agent]: Exception timed out"
        );
    }

    #[tokio::test]
    async fn test_dispatch_single_agent() {
        let orch = orchestrator(CannedInvoker::new());
        let response = orch.dispatch(ChatRequest::new("alice", "how much water?")).await;
        assert_eq!(response.response, "[Hydration Agent]: hydration says hi to alice");
    }

    #[tokio::test]
    async fn test_dispatch_fallback_on_no_match() {
        let orch = orchestrator(CannedInvoker::new());
        let response = orch.dispatch(ChatRequest::new("alice", "hello")).await;
        assert!(response.response.starts_with("[Hydration Agent]:"));
    }

    #[tokio::test]
    async fn test_dispatch_joins_fragments_in_selection_order() {
        let invoker = CannedInvoker::new();
        let orch = orchestrator(invoker);
        let response = orch
            .dispatch(ChatRequest::new("bob", "water and weather and workout"))
            .await;

        let fragments: Vec<&str> = response.response.split("\n---\n").collect();
        assert_eq!(fragments.len(), 3);
        assert!(fragments[0].starts_with("[Hydration Agent]:"));
        assert!(fragments[1].starts_with("[Weather Agent]:"));
        assert!(fragments[2].starts_with("[Activity Agent]:"));
    }

    #[tokio::test]
    async fn test_dispatch_failure_becomes_text_fragment() {
        let invoker = CannedInvoker {
            failing: vec![AgentKind::Weather],
            ..CannedInvoker::new()
        };
        let orch = orchestrator(invoker);
        let response = orch.dispatch(ChatRequest::new("bob", "water and weather")).await;

        assert!(response.response.contains("[Hydration Agent]: hydration says hi"));
        assert!(response
            .response
            .contains("[Weather Agent]: Exception connection refused"));
    }

    #[tokio::test]
    async fn test_dispatch_http_error_becomes_text_fragment() {
        let invoker = CannedInvoker {
            erroring: vec![AgentKind::Hydration],
            ..CannedInvoker::new()
        };
        let orch = orchestrator(invoker);
        let response = orch.dispatch(ChatRequest::new("bob", "water")).await;
        assert_eq!(response.response, "[Hydration Agent]: Error 500");
    }

    #[tokio::test]
    async fn test_dispatch_calls_every_selected_agent() {
        let invoker = Arc::new(CannedInvoker::new());
        let orch = Orchestrator::new(invoker.clone(), RouterConfig::default());
        let response = orch
            .dispatch(ChatRequest::new("bob", "food, water, weather, steps, label"))
            .await;
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 5);
        assert_eq!(response.response.split("\n---\n").count(), 5);
    }

    struct PanickingInvoker;

    #[async_trait]
    impl AgentInvoker for PanickingInvoker {
        async fn invoke(&self, _agent: AgentKind, _request: &ChatRequest) -> AgentOutcome {
            panic!("agent task blew up");
        }
    }

    #[tokio::test]
    async fn test_dispatch_panicked_task_degrades_to_exception_fragment() {
        let orch = Orchestrator::new(Arc::new(PanickingInvoker), RouterConfig::default());
        let response = orch.dispatch(ChatRequest::new("bob", "water")).await;
        assert!(
            response.response.starts_with("[Hydration Agent]: Exception"),
            "got: {}",
            response.response
        );
    }

    #[test]
    fn test_http_invoker_requires_full_endpoint_map() {
        let mut endpoints = HttpAgentInvoker::endpoints_on("http://localhost:8000");
        endpoints.remove(&AgentKind::Drinks);
        let err = HttpAgentInvoker::new(endpoints).unwrap_err();
        assert!(err.to_string().contains("drinks"));
    }

    #[test]
    fn test_endpoints_on_builds_per_agent_urls() {
        let endpoints = HttpAgentInvoker::endpoints_on("http://localhost:8000/");
        assert_eq!(endpoints.len(), 5);
        assert_eq!(
            endpoints.get(&AgentKind::Weather).unwrap(),
            "http://localhost:8000/agent/weather"
        );
    }
}
