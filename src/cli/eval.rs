use anyhow::Result;

use crate::core::logging;
use crate::eval::{
    average_score, default_cases, fetch_responses, load_cases, unigram_perplexity,
};

pub async fn run(url: &str, cases_path: Option<&str>) -> Result<()> {
    logging::init_tracing();

    let cases = match cases_path {
        Some(path) => load_cases(path)?,
        None => default_cases(),
    };
    tracing::debug!("Fetching responses from chatbot at {}", url);

    let (queries, references): (Vec<String>, Vec<String>) = cases
        .into_iter()
        .map(|c| (c.query, c.reference))
        .unzip();
    let candidates = fetch_responses(url, &queries).await;

    for (query, candidate) in queries.iter().zip(candidates.iter()) {
        println!("Q: {}\nA: {}\n", query, candidate);
    }

    let score = average_score(&references, &candidates);
    println!("Token overlap results:");
    println!("Precision: {:.4}", score.precision);
    println!("Recall: {:.4}", score.recall);
    println!("F1 Score: {:.4}", score.f1);

    let perplexity = unigram_perplexity(&references, &candidates);
    println!("Unigram perplexity: {:.4}", perplexity);

    Ok(())
}
