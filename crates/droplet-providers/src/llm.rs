//! OpenAI API client
//!
//! Two narrow uses: generating knowledge-base chunks from product records via
//! a forced function call, and uploading knowledge-base files to the
//! provider's file store.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked_key = if self.api_key.len() > 7 {
            format!(
                "{}...{}",
                &self.api_key[..3],
                &self.api_key[self.api_key.len() - 4..]
            )
        } else {
            "***".to_string()
        };

        f.debug_struct("OpenAiClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &masked_key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    id: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://api.openai.com".to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Set a custom base URL (e.g. for proxies)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Generate 5-6 knowledge-base chunks per product via a forced
    /// `make_chunks` function call. Returns the raw chunk objects; the
    /// caller writes them out as JSONL.
    pub async fn make_chunks(&self, products: &[Value]) -> Result<Vec<Value>> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        let function_schema = json!({
            "name": "make_chunks",
            "description": "Generate 5-6 chunk objects per product",
            "parameters": {
                "type": "object",
                "properties": {
                    "chunks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string"},
                                "text": {"type": "string"},
                                "metadata": {"type": "object"}
                            },
                            "required": ["id", "text", "metadata"]
                        }
                    }
                },
                "required": ["chunks"]
            }
        });

        let prompt = format!(
            "For each of these products, output **exactly** 5-6 chunks as JSON:\n{}\n\
             Chunks must follow the schema:\n\
             - id: brand_slug + layer (e.g. 'humantra_snapshot')\n\
             - text: concise prose (<=250 tokens)\n\
             - metadata: brand, sugar_free, price_aed_serving, sodium_mg, ..., data_type\n\
             Return via the `make_chunks` function.",
            serde_json::to_string_pretty(products)?
        );

        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "functions": [function_schema],
            "function_call": {"name": "make_chunks"},
        });

        debug!("Requesting chunk generation for {} products", products.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send chunk generation request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Chunk generation failed with status {}: {}",
                status,
                error_text
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let call = completion
            .choices
            .first()
            .and_then(|c| c.message.function_call.as_ref())
            .ok_or_else(|| anyhow!("Model did not return a make_chunks function call"))?;

        parse_chunk_arguments(&call.arguments)
    }

    /// Upload a knowledge-base file to the provider's file store.
    /// Returns the provider-assigned file id.
    pub async fn upload_file(&self, path: &Path) -> Result<String> {
        let url = format!("{}/v1/files", self.base_url.trim_end_matches('/'));

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("purpose", "user_data")
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", path.display()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "File upload failed with status {}: {}",
                status,
                error_text
            ));
        }

        let uploaded: FileUploadResponse = response
            .json()
            .await
            .context("Failed to parse file upload response")?;

        info!("Uploaded {} as {}", path.display(), uploaded.id);
        Ok(uploaded.id)
    }
}

/// Parse the function-call arguments JSON into the chunk list.
fn parse_chunk_arguments(arguments: &str) -> Result<Vec<Value>> {
    let parsed: Value =
        serde_json::from_str(arguments).context("Function call arguments were not valid JSON")?;
    let chunks = parsed
        .get("chunks")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow!("Function call arguments missing 'chunks' array"))?;
    Ok(chunks.clone())
}
