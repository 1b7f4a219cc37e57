//! Turn processor
//!
//! Runs one inbound utterance through the plan / tool / wrap-up cycle
//! against the completion provider and the tool registry, mutating the
//! session as it goes. Provider failures at any stage collapse to a fixed
//! apology so the caller-facing call never hard-fails on a third-party
//! outage.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use call_agent_core::{CallSession, Clock, Error, Result, TurnRole};
use call_agent_llm::{prompt, CompletionBackend, Message, TurnPlan};
use call_agent_tools::ToolRegistry;

use crate::fallback;

/// Fixed degraded reply used when the provider fails at any stage
pub const APOLOGY: &str = "Sorry, I'm having some technical issues. Please hold for a moment.";

/// Result of processing one turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub tool_executed: Option<String>,
    pub tool_result: Option<Value>,
    pub should_end_call: bool,
    pub call_id: String,
}

/// Stages of the provider sub-protocol. A turn settles either directly from
/// the first pass or after a tool run plus a wrap-up pass.
enum TurnStage {
    /// First provider round-trip pending
    AwaitingPlan,
    /// A tool ran; its result is recorded and awaits the wrap-up reply
    ToolExecuted {
        plan: TurnPlan,
        tool: String,
        result: Value,
    },
}

/// A settled reply, ready to be committed to the session
struct Settled {
    response: String,
    tool_executed: Option<String>,
    tool_result: Option<Value>,
    should_end_call: bool,
    collect_info: Map<String, Value>,
}

impl Settled {
    fn degraded() -> Self {
        Self {
            response: APOLOGY.to_string(),
            tool_executed: None,
            tool_result: None,
            should_end_call: false,
            collect_info: Map::new(),
        }
    }
}

/// The orchestration core: one processor shared by all calls
pub struct TurnProcessor {
    backend: Option<Arc<dyn CompletionBackend>>,
    tools: Arc<ToolRegistry>,
    clock: Arc<dyn Clock>,
}

impl TurnProcessor {
    /// Create a processor. A `None` backend selects the scripted fallback.
    pub fn new(
        backend: Option<Arc<dyn CompletionBackend>>,
        tools: Arc<ToolRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            tools,
            clock,
        }
    }

    /// Process one inbound utterance against an active session.
    ///
    /// Appends the customer turn, settles a reply (live or fallback),
    /// merges collected caller facts, appends the assistant turn, and ends
    /// the session when the settled reply says so.
    pub async fn process(
        &self,
        session: &mut CallSession,
        message: &str,
    ) -> Result<TurnOutcome> {
        if !session.is_active() {
            return Err(Error::CallEnded(session.call_id().to_string()));
        }

        session.add_turn(TurnRole::Customer, message, self.clock.now());

        let settled = match &self.backend {
            Some(backend) => self.live_turn(backend.as_ref(), session).await,
            None => self.fallback_turn(session, message).await,
        };

        session.merge_customer_info(settled.collect_info);
        session.add_turn(TurnRole::Assistant, settled.response.clone(), self.clock.now());

        if settled.should_end_call {
            session.end(self.clock.now());
            tracing::info!(
                call_id = session.call_id(),
                duration = session.call_duration(),
                "call ended"
            );
        }

        Ok(TurnOutcome {
            response: settled.response,
            tool_executed: settled.tool_executed,
            tool_result: settled.tool_result,
            should_end_call: settled.should_end_call,
            call_id: session.call_id().to_string(),
        })
    }

    /// Drive the provider sub-protocol to a settled reply
    async fn live_turn(&self, backend: &dyn CompletionBackend, session: &mut CallSession) -> Settled {
        let mut stage = TurnStage::AwaitingPlan;

        loop {
            stage = match stage {
                TurnStage::AwaitingPlan => {
                    let system = prompt::system_instruction(
                        &self.tools.catalog(),
                        session.recent_tool_records(),
                        session.customer_info(),
                    );
                    let history: Vec<Message> =
                        session.history().iter().map(Message::from).collect();

                    let plan = match backend.plan_turn(&system, &history).await {
                        Ok(plan) => plan,
                        Err(err) => {
                            tracing::warn!(
                                call_id = session.call_id(),
                                %err,
                                "completion provider failed, degrading"
                            );
                            break Settled::degraded();
                        }
                    };

                    match plan.tool_name() {
                        Some(name) if self.tools.contains(name) => {
                            let name = name.to_string();
                            match self.tools.invoke(&name, plan.tool_params.clone()).await {
                                Ok(reply) => {
                                    let result = reply.into_value();
                                    session.record_tool(&name, result.clone(), self.clock.now());
                                    TurnStage::ToolExecuted {
                                        plan,
                                        tool: name,
                                        result,
                                    }
                                }
                                Err(err) => {
                                    tracing::warn!(
                                        call_id = session.call_id(),
                                        tool = %name,
                                        %err,
                                        "tool failed, degrading"
                                    );
                                    break Settled::degraded();
                                }
                            }
                        }
                        _ => {
                            break Settled {
                                response: plan.response.clone(),
                                tool_executed: None,
                                tool_result: None,
                                should_end_call: plan.should_end_call,
                                collect_info: plan.collect_info,
                            }
                        }
                    }
                }

                TurnStage::ToolExecuted { plan, tool, result } => {
                    let follow_up = prompt::follow_up_instruction(&tool, &result);
                    let mut history: Vec<Message> =
                        session.history().iter().map(Message::from).collect();
                    history.push(Message::assistant(&plan.response));

                    match backend.plan_turn(&follow_up, &history).await {
                        Ok(wrap_up) => {
                            break Settled {
                                response: wrap_up.response,
                                tool_executed: Some(tool),
                                tool_result: Some(result),
                                // Either pass may decide to hang up.
                                should_end_call: plan.should_end_call || wrap_up.should_end_call,
                                collect_info: plan.collect_info,
                            }
                        }
                        Err(err) => {
                            tracing::warn!(
                                call_id = session.call_id(),
                                tool = %tool,
                                %err,
                                "wrap-up pass failed, degrading"
                            );
                            break Settled::degraded();
                        }
                    }
                }
            };
        }
    }

    /// Settle a reply from the scripted fallback.
    ///
    /// Matching the original mode, the fallback surfaces the tool result in
    /// the outcome but writes neither tool memory nor customer info.
    async fn fallback_turn(&self, session: &mut CallSession, message: &str) -> Settled {
        tracing::debug!(
            call_id = session.call_id(),
            "no completion provider configured, using scripted fallback"
        );

        let mut response = fallback::pick_canned_reply().to_string();
        let mut tool_executed = None;
        let mut tool_result = None;

        if fallback::wants_flight_search(message) {
            match self
                .tools
                .invoke(
                    "checkFlightPrices",
                    json!({ "origin": "NYC", "destination": "LAX" }),
                )
                .await
            {
                Ok(reply) => {
                    let result = reply.into_value();
                    let flights = result["data"]["flights"]
                        .as_array()
                        .cloned()
                        .unwrap_or_default();
                    if let Some(cheapest) = flights.first() {
                        response = format!(
                            "{response} I found {} flights available. The cheapest option is {} at ${} departing at {}.",
                            flights.len(),
                            cheapest["airline"].as_str().unwrap_or("an airline"),
                            cheapest["price"],
                            cheapest["time"].as_str().unwrap_or("soon"),
                        );
                    }
                    tool_executed = Some("checkFlightPrices".to_string());
                    tool_result = Some(result);
                }
                Err(err) => {
                    tracing::warn!(call_id = session.call_id(), %err, "fallback flight search failed");
                }
            }
        }

        let should_end_call = fallback::wants_hangup(message);
        if should_end_call {
            // The farewell replaces any tool-augmented text.
            response = fallback::FAREWELL.to_string();
        }

        Settled {
            response,
            tool_executed,
            tool_result,
            should_end_call,
            collect_info: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use call_agent_core::{ManualClock, SystemClock};
    use call_agent_llm::LlmError;
    use call_agent_tools::{create_default_registry, Tool, ToolError, ToolReply};
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Backend fed from a queue of scripted plans; records every request.
    #[derive(Default)]
    struct StubBackend {
        plans: Mutex<VecDeque<std::result::Result<TurnPlan, String>>>,
        requests: Mutex<Vec<(String, Vec<Message>)>>,
    }

    impl StubBackend {
        fn scripted(plans: Vec<std::result::Result<TurnPlan, String>>) -> Arc<Self> {
            Arc::new(Self {
                plans: Mutex::new(plans.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn plan_turn(
            &self,
            system: &str,
            history: &[Message],
        ) -> std::result::Result<TurnPlan, LlmError> {
            self.requests
                .lock()
                .push((system.to_string(), history.to_vec()));
            match self.plans.lock().pop_front() {
                Some(Ok(plan)) => Ok(plan),
                Some(Err(message)) => Err(LlmError::Api(message)),
                None => panic!("stub backend ran out of scripted plans"),
            }
        }
    }

    /// Deterministic tool stand-in
    struct FixedFlights;

    #[async_trait]
    impl Tool for FixedFlights {
        fn name(&self) -> &str {
            "checkFlightPrices"
        }

        fn description(&self) -> &str {
            "fixed flights"
        }

        fn params_hint(&self) -> &str {
            "{origin, destination, date}"
        }

        async fn invoke(&self, _params: Value) -> std::result::Result<ToolReply, ToolError> {
            Ok(ToolReply::ok(json!({
                "flights": [{ "airline": "Delta", "price": 300, "time": "09:15" }],
            })))
        }
    }

    fn plan(response: &str) -> TurnPlan {
        TurnPlan::parse(&json!({ "response": response }).to_string()).unwrap()
    }

    fn tool_plan(response: &str, tool: &str) -> TurnPlan {
        TurnPlan::parse(&json!({ "response": response, "tool": tool }).to_string()).unwrap()
    }

    fn processor_with(
        backend: Option<Arc<dyn CompletionBackend>>,
        tools: ToolRegistry,
    ) -> TurnProcessor {
        TurnProcessor::new(backend, Arc::new(tools), Arc::new(SystemClock))
    }

    fn fixed_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FixedFlights));
        registry
    }

    fn session() -> CallSession {
        CallSession::new("c1", Utc::now())
    }

    #[tokio::test]
    async fn test_plain_turn_appends_two_entries() {
        let backend = StubBackend::scripted(vec![Ok(plan("Happy to help!"))]);
        let processor = processor_with(Some(backend), fixed_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "hello").await.unwrap();

        assert_eq!(outcome.response, "Happy to help!");
        assert_eq!(outcome.tool_executed, None);
        assert!(!outcome.should_end_call);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, TurnRole::Customer);
        assert_eq!(session.history()[1].content, "Happy to help!");
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_tool_turn_runs_two_passes() {
        let backend = StubBackend::scripted(vec![
            Ok(tool_plan("Checking flights now.", "checkFlightPrices")),
            Ok(plan("The cheapest is Delta at $300.")),
        ]);
        let processor = processor_with(Some(backend.clone()), fixed_registry());
        let mut session = session();

        let outcome = processor
            .process(&mut session, "any flights to LAX?")
            .await
            .unwrap();

        assert_eq!(outcome.tool_executed.as_deref(), Some("checkFlightPrices"));
        assert_eq!(outcome.response, "The cheapest is Delta at $300.");
        let result = outcome.tool_result.unwrap();
        assert_eq!(result["success"], json!(true));

        // The tool run is remembered for later context.
        assert_eq!(session.recent_tool_records().len(), 1);
        assert_eq!(session.recent_tool_records()[0].tool, "checkFlightPrices");

        // Two provider passes; the wrap-up sees the first-pass reply as
        // trailing assistant context.
        let requests = backend.requests.lock();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].0.contains("The tool checkFlightPrices returned:"));
        let trailing = requests[1].1.last().unwrap();
        assert_eq!(trailing.content, "Checking flights now.");

        // Only the final reply lands in the history.
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].content, "The cheapest is Delta at $300.");
    }

    #[tokio::test]
    async fn test_end_call_flag_is_or_of_both_passes() {
        let mut first = tool_plan("Wrapping up.", "checkFlightPrices");
        first.should_end_call = true;
        let backend = StubBackend::scripted(vec![Ok(first), Ok(plan("Goodbye!"))]);
        let processor = processor_with(Some(backend), fixed_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "last thing").await.unwrap();

        assert!(outcome.should_end_call);
        assert!(!session.is_active());
        assert!(session.call_duration() >= 0);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_apology() {
        let backend = StubBackend::scripted(vec![Err("upstream 500".to_string())]);
        let processor = processor_with(Some(backend), fixed_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "hello").await.unwrap();

        assert_eq!(outcome.response, APOLOGY);
        assert_eq!(outcome.tool_executed, None);
        assert!(!outcome.should_end_call);
        assert!(session.is_active());
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].content, APOLOGY);
    }

    #[tokio::test]
    async fn test_wrap_up_failure_degrades_but_keeps_tool_memory() {
        let backend = StubBackend::scripted(vec![
            Ok(tool_plan("Checking.", "checkFlightPrices")),
            Err("upstream timeout".to_string()),
        ]);
        let processor = processor_with(Some(backend), fixed_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "flights?").await.unwrap();

        assert_eq!(outcome.response, APOLOGY);
        assert_eq!(outcome.tool_executed, None);
        // The tool ran before the wrap-up failed; its record stays.
        assert_eq!(session.recent_tool_records().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_info_merges_idempotently() {
        let mut with_info = plan("Noted.");
        with_info
            .collect_info
            .insert("name".to_string(), json!("Ada"));
        let mut with_info_again = plan("Still noted.");
        with_info_again
            .collect_info
            .insert("name".to_string(), json!("Ada"));

        let backend = StubBackend::scripted(vec![Ok(with_info), Ok(with_info_again)]);
        let processor = processor_with(Some(backend), fixed_registry());
        let mut session = session();

        processor.process(&mut session, "I'm Ada").await.unwrap();
        processor.process(&mut session, "Ada again").await.unwrap();

        assert_eq!(session.customer_info().len(), 1);
        assert_eq!(session.customer_info()["name"], json!("Ada"));
    }

    #[tokio::test]
    async fn test_unknown_tool_name_settles_on_first_pass() {
        let backend = StubBackend::scripted(vec![Ok(tool_plan("On it.", "teleport"))]);
        let processor = processor_with(Some(backend.clone()), fixed_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "beam me up").await.unwrap();

        assert_eq!(outcome.response, "On it.");
        assert_eq!(outcome.tool_executed, None);
        assert_eq!(backend.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_ended_session_without_mutation() {
        let processor = processor_with(None, fixed_registry());
        let mut session = session();
        session.end(Utc::now());
        let history_len = session.history().len();

        let result = processor.process(&mut session, "hello?").await;

        assert!(matches!(result, Err(Error::CallEnded(_))));
        assert_eq!(session.history().len(), history_len);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_bye_ends_call_with_farewell() {
        let processor = processor_with(None, create_default_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "ok bye").await.unwrap();

        assert!(outcome.should_end_call);
        assert_eq!(outcome.response, fallback::FAREWELL);
        assert!(!session.is_active());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_flight_farewell_exclusivity() {
        let processor = processor_with(None, create_default_registry());
        let mut session = session();

        let outcome = processor
            .process(&mut session, "I want to check flights to LAX, bye")
            .await
            .unwrap();

        // The flight branch is a coin flip, but the farewell always wins the
        // response text.
        assert!(outcome.should_end_call);
        assert_eq!(outcome.response, fallback::FAREWELL);
        match outcome.tool_executed.as_deref() {
            None => assert!(outcome.tool_result.is_none()),
            Some("checkFlightPrices") => assert!(outcome.tool_result.is_some()),
            Some(other) => panic!("unexpected tool: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_plain_turn_uses_canned_reply() {
        let processor = processor_with(None, create_default_registry());
        let mut session = session();

        let outcome = processor.process(&mut session, "hello there").await.unwrap();

        assert!(fallback::CANNED_REPLIES.contains(&outcome.response.as_str()));
        assert!(!outcome.should_end_call);
        assert!(session.is_active());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_clock_drives_session_timestamps() {
        let clock = Arc::new(ManualClock::default());
        let backend = StubBackend::scripted(vec![Ok(plan("Hi."))]);
        let processor = TurnProcessor::new(
            Some(backend),
            Arc::new(fixed_registry()),
            clock.clone(),
        );
        let mut session = CallSession::new("c1", clock.now());

        processor.process(&mut session, "hello").await.unwrap();

        assert_eq!(session.history()[0].timestamp, clock.now());
    }
}
