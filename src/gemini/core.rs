use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Part {
    pub text: String,
}

/// One role-tagged unit of conversation text. Serializes to the
/// `Content` shape the Gemini API expects:
///
/// ```json
/// {"role": "user", "parts": [{"text": "Where is the library?"}]}
/// ```
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Turn {
    role: Role,
    parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, text: &str) -> Self {
        Turn {
            role,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<&str>>()
            .join("")
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens: 1000,
        }
    }
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// The fixed content-safety policy sent with every request.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    vec![SafetySetting {
        category: HarmCategory::HarmCategoryHarassment,
        threshold: HarmBlockThreshold::BlockMediumAndAbove,
    }]
}

/// A provider chat session: the history used as context plus the
/// generation and safety settings that apply to the next message.
#[derive(Clone, Debug)]
pub struct ChatSession {
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
    pub history: Vec<Turn>,
}

impl ChatSession {
    pub fn start(history: Vec<Turn>) -> Self {
        Self {
            generation_config: GenerationConfig::default(),
            safety_settings: default_safety_settings(),
            history,
        }
    }

    /// Request body for sending `text` as the next user message in
    /// this session.
    pub fn payload(&self, text: &str) -> Value {
        let mut contents = self.history.clone();
        contents.push(Turn::new(Role::User, text));
        json!({
            "contents": contents,
            "generationConfig": self.generation_config,
            "safetySettings": self.safety_settings,
        })
    }
}

pub async fn generate_content(
    client: &reqwest::Client,
    payload: &Value,
    api_hostname: &str,
    api_key: &str,
    model: &str,
    timeout: Duration,
) -> Result<Value, Error> {
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        api_hostname.trim_end_matches("/"),
        model
    );
    // The key must stay out of the URL and out of error messages
    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .json(payload)
        .send()
        .await
        .map_err(reqwest::Error::without_url)?
        .error_for_status()
        .map_err(reqwest::Error::without_url)?
        .json()
        .await
        .map_err(reqwest::Error::without_url)?;

    Ok(response)
}

/// Pull the reply text out of a `generateContent` response.
///
/// A response without candidate text is an error, most commonly
/// because the prompt or the candidate was blocked by the safety
/// settings.
pub fn reply_text(resp: &Value) -> Result<String, Error> {
    if let Some(reason) = resp["promptFeedback"]["blockReason"].as_str() {
        bail!("Prompt blocked by provider: {}", reason);
    }

    let candidate = &resp["candidates"][0];
    let parts = candidate["content"]["parts"].as_array().ok_or_else(|| {
        match candidate["finishReason"].as_str() {
            Some(reason) => anyhow!("No message received. Finish reason: {}", reason),
            None => anyhow!("No message received. Resp:\n\n {}", resp),
        }
    })?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        bail!("Empty message received. Resp:\n\n {}", resp);
    }

    Ok(text)
}
