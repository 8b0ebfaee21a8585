//! Chat-model summaries of translated RFCs.
//!
//! Older RFCs (and newer ones the model was trained on) are summarized from
//! the title alone, relying on the model's own knowledge. Anything newer is
//! summarized from its abstract, always with the cheaper model tier. An
//! existing summary is only replaced by one from a strictly better tier.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use rfctrans_fetch::XML_SOURCE_THRESHOLD;
use rfctrans_shared::{
    OpenAiConfig, PublishedDate, Result, RfcDocument, RfcId, RfcTransError, SummaryRecord,
};

use crate::workspace::Workspace;

/// RFCs from this number on are summarized from their abstract unless the
/// model already knows them.
pub const ABSTRACT_THRESHOLD: u32 = 8900;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that translates English to Japanese.";

/// Chat model generations, ordered by capability. `None` stands for "no summary yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModelTier {
    None,
    Gpt35,
    Gpt4,
}

impl ModelTier {
    /// Normalize a user-supplied model name.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "gpt-3.5-turbo" | "gpt-3.5" | "gpt3.5" | "3.5" => Ok(Self::Gpt35),
            "gpt-4-turbo" | "gpt-4" | "gpt4" | "4" => Ok(Self::Gpt4),
            other => Err(RfcTransError::config(format!(
                "unknown chat model '{other}' (expected gpt-3.5-turbo or gpt-4-turbo)"
            ))),
        }
    }

    /// Canonical API model name.
    pub fn model_name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gpt35 => Some("gpt-3.5-turbo"),
            Self::Gpt4 => Some("gpt-4-turbo"),
        }
    }

    /// Last month covered by the model's training data.
    pub fn knowledge_cutoff(self) -> Option<PublishedDate> {
        match self {
            Self::None => None,
            Self::Gpt35 => Some(PublishedDate::new(2021, 9)),
            Self::Gpt4 => Some(PublishedDate::new(2023, 12)),
        }
    }

    fn knows(self, published: Option<PublishedDate>) -> bool {
        match (published, self.knowledge_cutoff()) {
            (Some(date), Some(cutoff)) => date <= cutoff,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// A yes/no question put to the operator.
pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, question: &str) -> bool {
        self(question)
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompts: &'a [String],
    pub temperature: f32,
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String>;
}

/// OpenAI-compatible `POST <base>/chat/completions` client.
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(client: Client, config: &OpenAiConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String> {
        let mut messages = vec![json!({ "role": "system", "content": request.system })];
        for prompt in request.prompts {
            messages.push(json!({ "role": "user", "content": prompt }));
        }
        let body = json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RfcTransError::Summarize(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RfcTransError::Summarize(format!(
                "chat endpoint returned HTTP {status}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RfcTransError::Summarize(format!("invalid chat response: {e}")))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| RfcTransError::Summarize("chat response has no content".into()))
    }
}

// ---------------------------------------------------------------------------
// Summarize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    ByTitle,
    ByAbstract,
}

/// Summarize RFC `number` with `model`.
///
/// Returns `Ok(false)` without writing anything when the RFC is not
/// translated yet, when the existing summary is at least as good, or when
/// the operator rejects the prompt or the answer. `force` skips both
/// confirmations.
#[instrument(skip(ws, chat, confirm))]
pub async fn summarize(
    ws: &Workspace,
    chat: &dyn ChatModel,
    number: u32,
    model: &str,
    force: bool,
    confirm: &dyn Confirm,
) -> Result<bool> {
    let requested = ModelTier::parse(model)?;
    let id = RfcId::number(number);
    let store = ws.store();

    let Some(title) = store
        .load_translation(&id)?
        .filter(|t| t.title.translated.is_some())
        .map(|t| t.title.text)
    else {
        warn!("RFC is not translated yet, translate it before summarizing");
        return Ok(false);
    };

    let existing = existing_tier(ws, number)?;
    if existing >= requested {
        info!(?existing, ?requested, "summary already exists");
        return Ok(false);
    }

    let source = if number >= XML_SOURCE_THRESHOLD {
        Some(source_document(ws, &id).await?)
    } else {
        None
    };
    let published = source.as_ref().and_then(|d| d.published);
    let known = requested.knows(published);
    debug!(?published, known, "model knowledge checked");

    let (strategy, tier) = if number < ABSTRACT_THRESHOLD || known {
        (Strategy::ByTitle, requested)
    } else {
        info!("summarizing from the abstract with gpt-3.5-turbo");
        (Strategy::ByAbstract, ModelTier::Gpt35)
    };

    if existing >= tier {
        info!(?existing, ?tier, "summary already exists");
        return Ok(false);
    }

    let prompts = match strategy {
        Strategy::ByTitle => title_prompts(&title, tier),
        Strategy::ByAbstract => {
            let text = source
                .as_ref()
                .and_then(abstract_text)
                .ok_or_else(|| RfcTransError::Summarize(format!("RFC {number} has no abstract")))?;
            abstract_prompts(&text)
        }
    };
    let model_name = tier
        .model_name()
        .ok_or_else(|| RfcTransError::Summarize("no model selected".into()))?;

    info!(model = model_name, ?strategy, "prompt ready");
    let question = format!(
        "Send the following to {model_name}?\n\n{}",
        prompts.join("\n")
    );
    if !force && !confirm.confirm(&question) {
        info!("prompt rejected");
        return Ok(false);
    }

    let answer = chat
        .complete(&ChatRequest {
            model: model_name,
            system: SYSTEM_PROMPT,
            prompts: &prompts,
            temperature: 0.0,
        })
        .await?;

    let question = format!("Is this a summary of RFC {number}?\n\n{answer}");
    if !force && !confirm.confirm(&question) {
        info!("answer rejected");
        return Ok(false);
    }

    let record = SummaryRecord {
        number,
        model: model_name.to_string(),
        created_at: Utc::now(),
        summary: split_paragraphs(&answer),
    };
    let path = store.save_summary(&record)?;
    info!(path = %path.display(), "summary saved");
    Ok(true)
}

fn existing_tier(ws: &Workspace, number: u32) -> Result<ModelTier> {
    let Some(record) = ws.store().load_summary(number)? else {
        return Ok(ModelTier::None);
    };
    Ok(ModelTier::parse(&record.model).unwrap_or_else(|_| {
        warn!(model = %record.model, "existing summary has an unknown model");
        ModelTier::None
    }))
}

/// Stored source when it carries a date, else the XML source fetched fresh.
async fn source_document(ws: &Workspace, id: &RfcId) -> Result<RfcDocument> {
    if let Some(doc) = ws.store().load_document(id)? {
        if doc.published.is_some() {
            return Ok(doc);
        }
    }
    match id.as_number() {
        Some(n) => ws.fetcher().fetch_xml_document(n).await,
        None => Err(RfcTransError::validation("drafts cannot be summarized")),
    }
}

fn abstract_text(doc: &RfcDocument) -> Option<String> {
    let section = doc.sections.iter().find(|s| s.id == "abstract")?;
    let text = section
        .paragraphs
        .iter()
        .flat_map(|p| p.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn title_prompts(title: &str, tier: ModelTier) -> Vec<String> {
    match tier {
        ModelTier::Gpt4 => vec![format!(
            "{title} についての要約、目的、利用場面を3行でまとめてください"
        )],
        _ => vec![format!("{title} についての要約と目的を3行でまとめてください")],
    }
}

fn abstract_prompts(abstract_text: &str) -> Vec<String> {
    let instruction = "次の英語の文章を日本語で要約してください。翻訳するときに以下の条件を満たしてください。\n\
                       ・出力形式はですます調です。\n\
                       ・3行以内で要約してください。\n";
    vec![instruction.to_string(), abstract_text.to_string()]
}

fn split_paragraphs(text: &str) -> Vec<String> {
    static BLANK_LINES: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
    BLANK_LINES
        .split(text.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
