//! Client for the text-generation collaborator.
//!
//! The service is a black box: given a topic (and the names of concepts that
//! already exist, so it proposes connections the reconciler can actually
//! resolve), it returns a candidate structure as JSON or fails. "Service
//! unreachable / non-success" and "response unparseable" are distinct
//! failure kinds (`Generation` vs `Parse`).

mod parse;

pub use parse::extract_candidate;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{KgraphError, Result};
use crate::reconcile::CandidateGraph;

/// Request structure for the chat-completions API
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Response structure from the chat-completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "\
You are a knowledge-graph assistant. Reply with a single JSON object and \
nothing else, in this exact shape:\n\
{\"topic\": string, \"description\": string, \
\"concepts\": [{\"name\": string, \"type\": string, \"description\": string}], \
\"edges\": [{\"source\": string, \"relation\": string, \"target\": string, \
\"description\": string}]}\n\
Every edge's source must be the topic itself. Prefer targets from the list \
of known concepts when they are genuinely related.";

/// Text-generation service client with a bounded request timeout.
#[derive(Debug)]
pub struct GenerationClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GenerationClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            KgraphError::Config(format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KgraphError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Ask the service for a candidate subgraph around `topic`.
    pub async fn generate_candidate(
        &self,
        topic: &str,
        known_concepts: &[String],
    ) -> Result<CandidateGraph> {
        let user_prompt = if known_concepts.is_empty() {
            format!("Describe the topic \"{}\" and its closest related concepts.", topic)
        } else {
            format!(
                "Describe the topic \"{}\" and its closest related concepts. Known concepts: {}.",
                topic,
                known_concepts.join(", ")
            )
        };

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.2,
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| KgraphError::Generation(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(KgraphError::Generation(format!(
                "Generation API error {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            KgraphError::Parse(format!("Failed to parse response envelope: {}", e))
        })?;

        log::debug!("Generation call for '{}' took {:?}", topic, start.elapsed());

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| KgraphError::Parse("response contained no choices".to_string()))?;

        extract_candidate(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_key_env: &str) -> GenerationConfig {
        GenerationConfig {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: api_key_env.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_client_requires_api_key_env() {
        // Env var intentionally unique to this test so parallel tests don't race
        std::env::remove_var("KGRAPH_TEST_GEN_KEY_MISSING");
        let err = GenerationClient::new(&test_config("KGRAPH_TEST_GEN_KEY_MISSING")).unwrap_err();
        assert!(matches!(err, KgraphError::Config(_)));
        assert!(err.to_string().contains("KGRAPH_TEST_GEN_KEY_MISSING"));
    }

    #[test]
    fn test_client_new_with_key() {
        std::env::set_var("KGRAPH_TEST_GEN_KEY_SET", "test-key");
        let client = GenerationClient::new(&test_config("KGRAPH_TEST_GEN_KEY_SET")).unwrap();
        assert_eq!(client.model, "gpt-4o-mini");
        std::env::remove_var("KGRAPH_TEST_GEN_KEY_SET");
    }

    // Note: Integration tests for actual API calls would require a real API key
    // and should be run separately with proper test fixtures
}
