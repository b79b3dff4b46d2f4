//! Offline evaluation of a running chat relay.
//!
//! Queries are posted to the `/chat` endpoint one at a time and the
//! replies are scored against reference answers by token overlap.
use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::public::chat::ChatResponse;

/// Stands in for a reply that could not be fetched.
pub const NO_RESPONSE: &str = "No response.";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct EvalCase {
    pub query: String,
    pub reference: String,
}

impl EvalCase {
    pub fn new(query: &str, reference: &str) -> Self {
        Self {
            query: query.to_string(),
            reference: reference.to_string(),
        }
    }
}

pub fn default_cases() -> Vec<EvalCase> {
    vec![
        EvalCase::new(
            "Where can I find tutoring support for my courses?",
            "You can find tutoring support at the academic resource center.",
        ),
        EvalCase::new(
            "How do I contact the financial aid office?",
            "You can contact the financial aid office via email at finaid@university.edu.",
        ),
        EvalCase::new(
            "What resources are available for mental health?",
            "Mental health resources are available at the counseling center.",
        ),
    ]
}

/// Read eval cases from a JSON array of `{"query", "reference"}`
/// objects.
pub fn load_cases(path: &str) -> Result<Vec<EvalCase>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let cases = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse eval cases in {}", path))?;
    Ok(cases)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OverlapScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Token overlap between a candidate reply and a reference answer,
/// counting repeated tokens at most as often as they occur in both.
pub fn overlap_score(reference: &str, candidate: &str) -> OverlapScore {
    let reference = if reference.trim().is_empty() {
        "No reference available."
    } else {
        reference
    };
    let candidate = if candidate.trim().is_empty() {
        "No candidate response."
    } else {
        candidate
    };

    let ref_tokens = tokens(reference);
    let cand_tokens = tokens(candidate);
    if ref_tokens.is_empty() || cand_tokens.is_empty() {
        return OverlapScore::default();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in ref_tokens.iter() {
        *counts.entry(t.as_str()).or_default() += 1;
    }
    let mut overlap = 0;
    for t in cand_tokens.iter() {
        if let Some(n) = counts.get_mut(t.as_str()).filter(|n| **n > 0) {
            *n -= 1;
            overlap += 1;
        }
    }

    let precision = overlap as f64 / cand_tokens.len() as f64;
    let recall = overlap as f64 / ref_tokens.len() as f64;
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    OverlapScore {
        precision,
        recall,
        f1,
    }
}

/// Mean scores across every reference/candidate pair.
pub fn average_score(references: &[String], candidates: &[String]) -> OverlapScore {
    let scores: Vec<OverlapScore> = references
        .iter()
        .zip(candidates.iter())
        .map(|(r, c)| overlap_score(r, c))
        .collect();
    if scores.is_empty() {
        return OverlapScore::default();
    }

    let n = scores.len() as f64;
    OverlapScore {
        precision: scores.iter().map(|s| s.precision).sum::<f64>() / n,
        recall: scores.iter().map(|s| s.recall).sum::<f64>() / n,
        f1: scores.iter().map(|s| s.f1).sum::<f64>() / n,
    }
}

/// Average perplexity of the candidates under a unigram model of the
/// reference answers, with add-one smoothing over the vocabulary of
/// both. Lower means the replies read more like the references.
///
/// Blank candidates are skipped. With no scorable candidate the result
/// is NaN.
pub fn unigram_perplexity(references: &[String], candidates: &[String]) -> f64 {
    let ref_tokens: Vec<String> = references.iter().flat_map(|r| tokens(r)).collect();
    let cand_tokens: Vec<Vec<String>> = candidates
        .iter()
        .map(|c| tokens(c))
        .filter(|t| !t.is_empty())
        .collect();
    if cand_tokens.is_empty() {
        tracing::warn!("No candidate responses to score for perplexity");
        return f64::NAN;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in ref_tokens.iter() {
        *counts.entry(t.as_str()).or_default() += 1;
    }
    let mut vocab: HashSet<&str> = counts.keys().copied().collect();
    vocab.extend(cand_tokens.iter().flatten().map(|t| t.as_str()));
    let denominator = (ref_tokens.len() + vocab.len()) as f64;

    let total: f64 = cand_tokens
        .iter()
        .map(|toks| {
            let log_likelihood: f64 = toks
                .iter()
                .map(|t| {
                    let count = counts.get(t.as_str()).copied().unwrap_or(0);
                    ((count + 1) as f64 / denominator).ln()
                })
                .sum();
            (-log_likelihood / toks.len() as f64).exp()
        })
        .sum();

    total / cand_tokens.len() as f64
}

/// Post each query to the chat endpoint at `url`. Failed requests are
/// recorded as `NO_RESPONSE` so every query has a candidate.
pub async fn fetch_responses(url: &str, queries: &[String]) -> Vec<String> {
    let client = reqwest::Client::new();
    let mut responses = Vec::with_capacity(queries.len());

    for query in queries {
        let result = client
            .post(url)
            .json(&json!({ "userInput": query }))
            .send()
            .await;

        let reply = match result {
            Ok(resp) if resp.status().is_success() => match resp.json::<ChatResponse>().await {
                Ok(body) if !body.response.trim().is_empty() => body.response.trim().to_string(),
                Ok(_) => NO_RESPONSE.to_string(),
                Err(e) => {
                    tracing::warn!("Invalid response for query '{}': {}", query, e);
                    NO_RESPONSE.to_string()
                }
            },
            Ok(resp) => {
                tracing::warn!(
                    "Failed to fetch response for query '{}': HTTP {}",
                    query,
                    resp.status()
                );
                NO_RESPONSE.to_string()
            }
            Err(e) => {
                tracing::error!("Error fetching response for query '{}': {}", query, e);
                NO_RESPONSE.to_string()
            }
        };
        tracing::debug!("Query: {}, Response: {}", query, reply);
        responses.push(reply);
    }

    responses
}
