//! Agent configuration structures

use crate::config::ResolvedLlmConfig;
use crate::error::{ConfigError, Result};
use crate::llm::{ChatOptions, LlmClient};
use crate::output::{AgentOutput, NullOutput};
use crate::tools::{default_tool_names, ToolRegistry};
use crate::trajectory::TrajectoryRecorder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ReactAgent;

/// Default maximum number of iterations
pub const DEFAULT_TTL: usize = 5;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Maximum number of iterations before the run is exhausted
    #[serde(default = "default_ttl")]
    pub ttl: usize,

    /// Tools available to the agent, in listing order
    #[serde(default = "default_tool_names")]
    pub tools: Vec<String>,

    /// Instruction template. `{tool_prompt}` is replaced by the tool listing.
    /// If not provided, the default template will be used
    #[serde(default)]
    pub instruction_prompt: Option<String>,
}

fn default_ttl() -> usize {
    DEFAULT_TTL
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            tools: default_tool_names(),
            instruction_prompt: None,
        }
    }
}

impl AgentConfig {
    /// Check the configuration before a run is allowed
    pub fn validate(&self) -> Result<()> {
        if self.ttl == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ttl".to_string(),
                value: "0 (must be a positive integer)".to_string(),
            }
            .into());
        }

        for (i, name) in self.tools.iter().enumerate() {
            if self.tools[..i].contains(name) {
                return Err(ConfigError::InvalidValue {
                    field: "tools".to_string(),
                    value: format!("'{}' is listed more than once", name),
                }
                .into());
            }
        }

        if let Some(prompt) = &self.instruction_prompt {
            if prompt.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "instruction_prompt".to_string(),
                    value: "empty template".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Builder for creating agents
pub struct AgentBuilder {
    llm_config: Option<ResolvedLlmConfig>,
    llm_client: Option<Arc<dyn LlmClient>>,
    agent_config: AgentConfig,
    registry: ToolRegistry,
    output: Box<dyn AgentOutput>,
    trajectory_recorder: Option<TrajectoryRecorder>,
}

impl AgentBuilder {
    /// Create a new agent builder with LLM configuration
    pub fn new(llm_config: ResolvedLlmConfig) -> Self {
        Self {
            llm_config: Some(llm_config),
            ..Self::empty()
        }
    }

    /// Create a builder around an existing completion client
    pub fn with_llm_client(llm_client: Arc<dyn LlmClient>) -> Self {
        Self {
            llm_client: Some(llm_client),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            llm_config: None,
            llm_client: None,
            agent_config: AgentConfig::default(),
            registry: ToolRegistry::default(),
            output: Box::new(NullOutput),
            trajectory_recorder: None,
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum iterations
    pub fn with_ttl(mut self, ttl: usize) -> Self {
        self.agent_config.ttl = ttl;
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.agent_config.tools = tools;
        self
    }

    /// Set the instruction template
    pub fn with_instruction_prompt(mut self, instruction_prompt: Option<String>) -> Self {
        self.agent_config.instruction_prompt = instruction_prompt;
        self
    }

    /// Use a custom tool registry instead of the built-in one
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the output handler
    pub fn with_output(mut self, output: Box<dyn AgentOutput>) -> Self {
        self.output = output;
        self
    }

    /// Record the run to a trajectory
    pub fn with_trajectory_recorder(mut self, recorder: TrajectoryRecorder) -> Self {
        self.trajectory_recorder = Some(recorder);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<ReactAgent> {
        self.agent_config.validate()?;

        let chat_options = self
            .llm_config
            .as_ref()
            .map(|config| ChatOptions::from_params(&config.params))
            .unwrap_or_default();

        let llm_client = match (self.llm_client, &self.llm_config) {
            (Some(client), _) => client,
            (None, Some(config)) => {
                config
                    .validate()
                    .map_err(|message| ConfigError::InvalidValue {
                        field: "llm".to_string(),
                        value: message,
                    })?;
                crate::llm::create_client(config)?
            }
            (None, None) => {
                return Err(ConfigError::MissingField {
                    field: "llm".to_string(),
                }
                .into())
            }
        };

        let tool_executor = self.registry.create_executor(&self.agent_config.tools)?;

        let mut agent = ReactAgent::new(self.agent_config, llm_client, tool_executor, self.output)?
            .with_chat_options(chat_options);
        if let Some(recorder) = self.trajectory_recorder {
            agent.set_trajectory_recorder(recorder);
        }
        Ok(agent)
    }
}
