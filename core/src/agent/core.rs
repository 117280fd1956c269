//! The reasoning/acting loop controller

use super::config::AgentConfig;
use super::execution::{AgentExecution, Outcome};
use super::parser::{parse_response, ParsedStep};
use super::prompt::{build_messages, render_instruction, DEFAULT_INSTRUCTION_PROMPT};
use crate::error::{AgentError, Result};
use crate::llm::{ChatOptions, LlmClient};
use crate::output::{
    AgentEvent, AgentOutput, ExecutionContext, NullOutput, TokenUsage, ToolExecutionInfo,
};
use crate::tools::base::error_message;
use crate::tools::{ActionArguments, ToolCall, ToolExecutor};
use crate::trajectory::{TrajectoryEntry, TrajectoryRecorder};
use crate::transcript::{Action, Observation, Step, Transcript};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Agent running the reason-then-act loop over a fixed set of tools
pub struct ReactAgent {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
    instruction: String,
    chat_options: ChatOptions,
    output: Box<dyn AgentOutput>,
    trajectory_recorder: Option<TrajectoryRecorder>,
}

/// Mutable state of one run
struct RunState {
    transcript: Transcript,
    iterations: usize,
    tool_invocations: usize,
    token_usage: TokenUsage,
}

impl ReactAgent {
    /// Create an agent from its parts. The configuration is validated and
    /// immutable afterwards.
    pub fn new(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        tool_executor: ToolExecutor,
        output: Box<dyn AgentOutput>,
    ) -> Result<Self> {
        config.validate()?;

        let template = config
            .instruction_prompt
            .as_deref()
            .unwrap_or(DEFAULT_INSTRUCTION_PROMPT);
        let instruction = render_instruction(template, &tool_executor);

        Ok(Self {
            config,
            llm_client,
            tool_executor,
            instruction,
            chat_options: ChatOptions::default(),
            output,
            trajectory_recorder: None,
        })
    }

    /// Create an agent that discards its events
    pub fn with_null_output(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        tool_executor: ToolExecutor,
    ) -> Result<Self> {
        Self::new(config, llm_client, tool_executor, Box::new(NullOutput))
    }

    /// Set the options sent with every completion request
    pub fn with_chat_options(mut self, chat_options: ChatOptions) -> Self {
        self.chat_options = chat_options;
        self
    }

    pub fn set_trajectory_recorder(&mut self, recorder: TrajectoryRecorder) {
        self.trajectory_recorder = Some(recorder);
    }

    pub fn trajectory_recorder(&self) -> Option<&TrajectoryRecorder> {
        self.trajectory_recorder.as_ref()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolExecutor {
        &self.tool_executor
    }

    /// The rendered instruction prompt, tool listing included
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Answer a query, returning only the outcome
    pub async fn run(&self, query: &str) -> Result<Outcome> {
        Ok(self.execute(query).await?.outcome)
    }

    /// Answer a query, returning the outcome with run statistics.
    ///
    /// Tool failures become observations; only a failing completion call
    /// ends the run with an error.
    pub async fn execute(&self, query: &str) -> Result<AgentExecution> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidQuery {
                message: "query cannot be empty".to_string(),
            }
            .into());
        }

        let start_time = Instant::now();
        let mut state = RunState {
            transcript: Transcript::new(query),
            iterations: 0,
            tool_invocations: 0,
            token_usage: TokenUsage::default(),
        };

        info!(
            "Starting run with ttl {} and {} tools",
            self.config.ttl,
            self.tool_executor.len()
        );
        self.emit(AgentEvent::ExecutionStarted {
            context: self.context(&state),
        })
        .await;
        self.record(TrajectoryEntry::task_start(
            query.to_string(),
            serde_json::to_value(&self.config)?,
        ))
        .await?;

        let result = self.run_loop(&mut state).await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record(TrajectoryEntry::error(e.to_string(), state.iterations))
                    .await?;
                return Err(e);
            }
        };

        let summary = match &outcome {
            Outcome::Answer { text, .. } => {
                info!("Answer reached after {} iterations", state.iterations);
                text.clone()
            }
            Outcome::Exhausted { .. } => {
                info!("Run exhausted after {} iterations", state.iterations);
                "Reached maximum number of iterations".to_string()
            }
        };

        self.record(TrajectoryEntry::task_complete(
            outcome.is_answer(),
            summary.clone(),
            state.iterations,
            duration_ms,
        ))
        .await?;
        self.emit(AgentEvent::ExecutionCompleted {
            context: self.context(&state),
            success: outcome.is_answer(),
            summary,
        })
        .await;

        Ok(AgentExecution {
            outcome,
            iterations: state.iterations,
            tool_invocations: state.tool_invocations,
            duration_ms,
            token_usage: state.token_usage,
        })
    }

    async fn run_loop(&self, state: &mut RunState) -> Result<Outcome> {
        while state.transcript.len() < self.config.ttl {
            let iteration = state.transcript.len() + 1;
            state.iterations += 1;

            let response = self.reason(iteration, state).await?;

            match parse_response(&response) {
                ParsedStep::ReasoningWithAnswer { reasoning, answer } => {
                    debug!("Iteration {} produced an answer", iteration);
                    return Ok(Outcome::Answer {
                        text: answer,
                        reasoning,
                        transcript: state.transcript.clone(),
                    });
                }
                ParsedStep::ReasoningWithAction {
                    reasoning,
                    name,
                    arguments,
                } => {
                    let action = Action::new(name, arguments);
                    let observation = self.act(iteration, &action, state).await;
                    self.append(
                        state,
                        Step::acted(iteration, response, reasoning, action, observation),
                    )
                    .await?;
                }
                ParsedStep::Reasoning { reasoning } => {
                    debug!("Iteration {} had no action", iteration);
                    self.append(state, Step::reasoning(iteration, response, reasoning))
                        .await?;
                }
            }
        }

        Ok(Outcome::Exhausted {
            transcript: state.transcript.clone(),
        })
    }

    /// Ask the model for the next step
    async fn reason(&self, iteration: usize, state: &mut RunState) -> Result<String> {
        let messages = build_messages(&self.instruction, &state.transcript);
        debug!(
            "Iteration {}: sending {} messages to {}",
            iteration,
            messages.len(),
            self.llm_client.model_name()
        );

        self.record(TrajectoryEntry::llm_request(
            messages.clone(),
            self.llm_client.model_name().to_string(),
            self.llm_client.provider_name().to_string(),
            iteration,
        ))
        .await?;

        let response = match self
            .llm_client
            .chat_completion(messages, Some(self.chat_options.clone()))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("LLM request failed in iteration {}: {}", iteration, e);
                let _ = self
                    .output
                    .error(&format!("LLM request failed: {}", e))
                    .await;
                return Err(e);
            }
        };

        if let Some(usage) = &response.usage {
            state.token_usage.add(usage);
            self.emit(AgentEvent::TokenUsageUpdated {
                token_usage: state.token_usage.clone(),
            })
            .await;
        }

        self.record(TrajectoryEntry::llm_response(
            response.message.content.clone(),
            response.usage.clone(),
            response.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            iteration,
        ))
        .await?;

        let text = response.message.content;
        if text.trim().is_empty() {
            warn!("Iteration {}: model returned an empty response", iteration);
        }
        self.emit(AgentEvent::AgentThinking {
            iteration,
            response: text.clone(),
        })
        .await;

        Ok(text)
    }

    /// Dispatch an action and turn whatever happens into an observation
    async fn act(&self, iteration: usize, action: &Action, state: &mut RunState) -> Observation {
        let info = ToolExecutionInfo::new(iteration, &action.name, &action.arguments);
        self.emit(AgentEvent::ToolExecutionStarted {
            tool_info: info.clone(),
        })
        .await;

        let observation = self.dispatch(action, state).await;
        if observation.is_error {
            warn!("Iteration {}: {}", iteration, observation.text);
        }

        self.emit(AgentEvent::ToolExecutionCompleted {
            tool_info: info.completed(&observation.text, observation.is_error),
        })
        .await;

        observation
    }

    async fn dispatch(&self, action: &Action, state: &mut RunState) -> Observation {
        let Some(tool) = self.tool_executor.get_tool(&action.name) else {
            return Observation::error(format!(
                "Error: Tool '{}' is not in the list of available tools: {}",
                action.name,
                self.tool_executor.list_tools().join(", ")
            ));
        };

        let cannot_execute = |message: String| {
            Observation::error(format!(
                "Error: Cannot execute function {}: {}",
                action.call_text(),
                message
            ))
        };

        let parameters = match ActionArguments::parse(&action.arguments)
            .and_then(|args| args.bind(&tool.argument_order()))
        {
            Ok(parameters) => parameters,
            Err(e) => return cannot_execute(error_message(&e)),
        };

        debug!("Executing {} with {}", action.name, parameters);
        state.tool_invocations += 1;

        match self
            .tool_executor
            .execute(ToolCall::new(action.name.clone(), parameters))
            .await
        {
            Ok(result) if result.success => Observation::success(result.content),
            Ok(result) => cannot_execute(result.content),
            Err(e) => cannot_execute(error_message(&e)),
        }
    }

    async fn append(&self, state: &mut RunState, step: Step) -> Result<()> {
        self.record(TrajectoryEntry::step(step.clone())).await?;
        self.emit(AgentEvent::StepCompleted { step: step.clone() })
            .await;
        state.transcript.push(step);
        Ok(())
    }

    fn context(&self, state: &RunState) -> ExecutionContext {
        ExecutionContext {
            query: state.transcript.query().to_string(),
            model: self.llm_client.model_name().to_string(),
            ttl: self.config.ttl,
            tools: self
                .tool_executor
                .list_tools()
                .into_iter()
                .map(str::to_string)
                .collect(),
            iterations: state.iterations,
            token_usage: state.token_usage.clone(),
        }
    }

    async fn emit(&self, event: AgentEvent) {
        if let Err(e) = self.output.emit_event(event).await {
            debug!("Failed to emit agent event: {}", e);
        }
    }

    async fn record(&self, entry: TrajectoryEntry) -> Result<()> {
        if let Some(recorder) = &self.trajectory_recorder {
            recorder.record(entry).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for ReactAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactAgent")
            .field("config", &self.config)
            .field("provider", &self.llm_client.provider_name())
            .field("model", &self.llm_client.model_name())
            .field("tools", &self.tool_executor.list_tools())
            .field("recording", &self.trajectory_recorder.is_some())
            .finish_non_exhaustive()
    }
}
