pub mod explainer;
pub mod parser;
pub mod query;

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::instrumentation::{FeedbackLog, RunLog, RunLogger};
use crate::llm::{LlmClient, Sampling};
use crate::retrieval::{CredentialPool, VideoClient, VideoResult, WebContextClient};
use crate::session::{Feedback, SessionState};

use explainer::{assemble_context, Explainer};
use parser::Explanation;
use query::StudyQuery;

/// What one page render shows.
#[derive(Debug, Clone)]
pub struct Answer {
    pub query: StudyQuery,
    pub videos: Vec<VideoResult>,
    pub explanation: Explanation,
    pub web_context_available: bool,
    pub run_log: RunLog,
}

pub struct Agent {
    videos: VideoClient,
    web: WebContextClient,
    explainer: Explainer,
    logger: RunLogger,
}

impl Agent {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let cooldown = Duration::from_secs(config.key_cooldown_secs);

        let youtube_pool =
            CredentialPool::new("youtube", config.youtube_keys.clone()).with_cooldown(cooldown);
        let serper_pool =
            CredentialPool::new("serper", config.serper_keys.clone()).with_cooldown(cooldown);
        if youtube_pool.usable() == 0 {
            tracing::warn!("no YOUTUBE_API_KEY configured, video results will be empty");
        }
        if serper_pool.usable() == 0 {
            tracing::warn!("no SERPER_API_KEY configured, web context will be unavailable");
        }

        let llm = LlmClient::new(
            http.clone(),
            config.together_api_key.as_deref(),
            &config.together_api_url,
        );
        let sampling = Sampling {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        };

        Ok(Self {
            videos: VideoClient::new(http.clone(), youtube_pool, &config.youtube_api_url),
            web: WebContextClient::new(http, serper_pool, &config.serper_api_url),
            explainer: Explainer::new(
                llm,
                config.model.clone(),
                sampling,
                config.context_char_budget,
            ),
            logger: RunLogger::new(&config.log_dir)?,
        })
    }

    /// One full render pass for the session's current question. Videos are
    /// always fetched; the web lookup and completion are skipped when the
    /// question matches the memoized one.
    pub async fn answer(&self, session: &mut SessionState) -> Option<Answer> {
        let query = session.query.clone()?;
        let run_start = Instant::now();
        let search = query.search_string();

        let video_start = Instant::now();
        let videos = self.videos.search(&search, session.video_count).await;
        let video_latency = video_start.elapsed().as_millis() as u64;

        let mut web_latency = 0;
        let mut llm_latency = 0;
        let cached = session.cached_explanation(&query.question).cloned();
        let explanation_cached = cached.is_some();

        let (explanation, web_context_available) = match cached {
            Some(explanation) => {
                tracing::debug!(question = %query.question, "reusing memoized explanation");
                (explanation, session.last_web_available)
            }
            None => {
                let web_start = Instant::now();
                let web = self.web.context(&search).await;
                web_latency = web_start.elapsed().as_millis() as u64;

                let titles: Vec<&str> = videos.iter().map(|v| v.title.as_str()).collect();
                let context = assemble_context(&titles, web.as_str());

                let llm_start = Instant::now();
                let explanation = self.explainer.explain(&query.question, &context).await;
                llm_latency = llm_start.elapsed().as_millis() as u64;

                session.remember(&query.question, &explanation, web.is_available());
                (explanation, web.is_available())
            }
        };

        let run_log = RunLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: Some(session.id.to_string()),
            question: query.question.clone(),
            search_query: search,
            videos_requested: session.video_count,
            videos_returned: videos.len() as u32,
            web_context_available,
            explanation_cached,
            explanation_failed: explanation.failed,
            video_latency_ms: video_latency,
            web_latency_ms: web_latency,
            llm_latency_ms: llm_latency,
            total_latency_ms: run_start.elapsed().as_millis() as u64,
            gist: explanation.gist.clone(),
            key_points: explanation.key_points.clone(),
        };

        tracing::info!(
            question = %run_log.question,
            videos = run_log.videos_returned,
            web = run_log.web_context_available,
            cached = run_log.explanation_cached,
            total_ms = run_log.total_latency_ms,
            "answered"
        );

        if let Err(e) = self.logger.write(&run_log) {
            tracing::warn!(error = %e, "failed to write run log");
        }

        Some(Answer {
            query,
            videos,
            explanation,
            web_context_available,
            run_log,
        })
    }

    /// Records feedback for the session's current answer.
    pub fn record_feedback(&self, session: &mut SessionState, feedback: Feedback) -> Result<()> {
        let Some(query) = session.query.as_ref() else {
            return Ok(());
        };
        session.feedback = Some(feedback);
        self.logger.write_feedback(&FeedbackLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: session.id.to_string(),
            question: query.question.clone(),
            feedback,
        })
    }
}
