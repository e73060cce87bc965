mod agent;
mod config;
mod instrumentation;
mod llm;
mod retrieval;
mod session;
mod web;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use agent::query::{Grade, StudyQuery, Subject};
use agent::Agent;
use config::Config;
use retrieval::youtube::DEFAULT_VIDEO_COUNT;
use session::{SessionState, SessionStore};

#[derive(Parser)]
#[command(name = "studymate", about = "Study assistant: videos, web context and an easy explanation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web app
    Serve {
        /// Address to bind, overrides BIND_ADDR
        #[arg(long)]
        addr: Option<String>,
    },
    /// Answer a single question in the terminal
    Ask {
        /// The question to study
        question: String,
        #[arg(long, value_enum, default_value_t = Subject::General)]
        subject: Subject,
        #[arg(long, value_enum, default_value_t = Grade::Any)]
        grade: Grade,
        /// Number of videos to fetch
        #[arg(long, default_value_t = DEFAULT_VIDEO_COUNT)]
        videos: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let config = Config::from_env()?;
    let agent = Agent::new(&config)?;

    match cli.command {
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.bind_addr.clone());
            let state = web::AppState {
                agent: Arc::new(agent),
                sessions: SessionStore::new(Duration::from_secs(config.session_ttl_secs)),
            };
            web::serve(state, &addr).await?;
        }
        Commands::Ask {
            question,
            subject,
            grade,
            videos,
        } => {
            if question.trim().is_empty() {
                anyhow::bail!("question must not be empty");
            }

            let mut session = SessionState::new(uuid::Uuid::new_v4());
            session.ask(StudyQuery::new(&question, subject, grade));
            session.video_count = videos;

            let Some(answer) = agent.answer(&mut session).await else {
                anyhow::bail!("no question to answer");
            };

            println!("\n🔍 You asked: {}\n", answer.query.question);
            if answer.videos.is_empty() {
                println!("⚠️  No videos found for this question.");
            } else {
                println!("🎥 Recommended YouTube Videos");
                for (i, video) in answer.videos.iter().enumerate() {
                    println!("  {}. {}\n     {}", i + 1, video.title, video.video_url);
                }
            }
            if !answer.web_context_available {
                println!("\n⚠️  Web search context was unavailable.");
            }
            println!("\n🧠 Gist\n{}", answer.explanation.gist);
            if !answer.explanation.key_points.is_empty() {
                println!("\n📝 Key Points\n{}", answer.explanation.key_points);
            }
            println!("\n{}", answer.run_log.summary());
        }
    }

    Ok(())
}
