use std::time::Instant;

use crate::llm::{LlmClient, LlmError, Sampling};

use super::parser::{parse_explanation, Explanation};

const PROMPT_PREAMBLE: &str = r#"You are a helpful study assistant.
Use the provided web search results and video titles to answer the student's question in a simple and clear way.

Always answer in two parts: a "Gist:" paragraph in plain language, then a "Key Points:" list of short bullets.

Example:
Question: What is photosynthesis?
Gist:
Photosynthesis is how plants make their own food. They take in sunlight, water and carbon dioxide, and turn them into sugar for energy, giving off oxygen as a by-product.
Key Points:
- Happens mostly in the leaves, inside chloroplasts
- Needs sunlight, water and carbon dioxide
- Produces glucose for the plant and oxygen for us
"#;

/// Keeps at most `budget` characters, cutting on a char boundary.
pub fn truncate_chars(s: &str, budget: usize) -> &str {
    match s.char_indices().nth(budget) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Video titles, a blank line, then the web context.
pub fn assemble_context(video_titles: &[&str], web_context: &str) -> String {
    format!("{}\n\n{}", video_titles.join("\n"), web_context)
}

pub fn build_prompt(question: &str, context: &str, budget: usize) -> String {
    format!(
        "{}\nQuestion: {}\n\nContext:\n{}\n\nAnswer:\n",
        PROMPT_PREAMBLE,
        question,
        truncate_chars(context, budget)
    )
}

pub struct Explainer {
    llm: LlmClient,
    model: String,
    sampling: Sampling,
    context_budget: usize,
}

impl Explainer {
    pub fn new(llm: LlmClient, model: String, sampling: Sampling, context_budget: usize) -> Self {
        Self {
            llm,
            model,
            sampling,
            context_budget,
        }
    }

    /// Never fails: provider errors become a visible `❌ Error:` gist.
    pub async fn explain(&self, question: &str, context: &str) -> Explanation {
        let prompt = build_prompt(question, context, self.context_budget);

        let start = Instant::now();
        let result = self.llm.complete(&self.model, &prompt, self.sampling).await;
        let latency = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                tracing::debug!(
                    latency_ms = latency,
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "completion received"
                );
                parse_explanation(&response.text)
            }
            Err(LlmError::Status { status, body }) => {
                tracing::warn!(%status, "completion API returned an error");
                Explanation::error(body)
            }
            Err(e) => {
                tracing::warn!(error = %e, "completion call failed");
                Explanation::error(e)
            }
        }
    }
}
