use std::fmt::Write;

use crate::agent::parser::KEY_POINTS_PLACEHOLDER;
use crate::agent::query::{Grade, Subject};
use crate::agent::Answer;
use crate::session::{Feedback, SessionState, View};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #222; }
.videos { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
.video img { width: 100%; border-radius: 6px; }
.warning { background: #fff6dd; border-left: 4px solid #e0a800; padding: .5rem 1rem; }
.suggestions form, .controls form { display: inline; }
.history details { margin: .25rem 0; }
pre { white-space: pre-wrap; font-family: inherit; }
"#;

/// Minimal escaping for text and double-quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(state: &SessionState, answer: Option<&Answer>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>StudyMate</title><style>{}</style></head><body>",
        STYLE
    );
    html.push_str("<h1>📚 StudyMate - Smart Study Chatbot</h1>");

    render_form(&mut html, state);

    if let Some(answer) = answer {
        let _ = write!(
            html,
            "<p class=\"asked\">🔍 You asked: {}</p>",
            escape(&answer.query.question)
        );
        render_videos(&mut html, answer);
        render_explanation(&mut html, state, answer);
        render_feedback(&mut html, state);
    }

    render_history(&mut html, state);
    html.push_str("</body></html>");
    html
}

fn render_form(html: &mut String, state: &SessionState) {
    let current = state.query.clone().unwrap_or_default();

    html.push_str("<form method=\"post\" action=\"/ask\" class=\"ask\">");
    let _ = write!(
        html,
        "<input type=\"text\" name=\"question\" placeholder=\"Ask a study question:\" value=\"{}\" size=\"60\">",
        escape(&current.question)
    );

    html.push_str("<select name=\"subject\">");
    for subject in Subject::ALL {
        let _ = write!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            subject.slug(),
            if subject == current.subject { " selected" } else { "" },
            subject.label()
        );
    }
    html.push_str("</select><select name=\"grade\">");
    for grade in Grade::ALL {
        let _ = write!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            grade.slug(),
            if grade == current.grade { " selected" } else { "" },
            grade.label()
        );
    }
    html.push_str("</select><button type=\"submit\">Ask</button></form>");

    html.push_str("<div class=\"suggestions\">Try: ");
    for topic in current.subject.suggested_topics() {
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/ask\"><input type=\"hidden\" name=\"question\" value=\"{}\"><input type=\"hidden\" name=\"subject\" value=\"{}\"><input type=\"hidden\" name=\"grade\" value=\"{}\"><button type=\"submit\">{}</button></form> ",
            escape(topic),
            current.subject.slug(),
            current.grade.slug(),
            escape(topic)
        );
    }
    html.push_str("</div>");
}

fn render_videos(html: &mut String, answer: &Answer) {
    html.push_str("<h2>🎥 Recommended YouTube Videos</h2>");
    if answer.videos.is_empty() {
        html.push_str(
            "<p class=\"warning\">⚠️ No videos found for this question right now. Try again later or rephrase it.</p>",
        );
    } else {
        html.push_str("<div class=\"videos\">");
        for video in &answer.videos {
            let _ = write!(
                html,
                "<div class=\"video\"><img src=\"{}\" alt=\"\"><p><strong>{}</strong></p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">▶️ Watch Video</a></div>",
                escape(&video.thumbnail_url),
                escape(&video.title),
                escape(&video.video_url)
            );
        }
        html.push_str("</div>");
    }
    html.push_str(
        "<form method=\"post\" action=\"/videos/more\"><button type=\"submit\">Show more videos</button></form>",
    );
}

fn render_explanation(html: &mut String, state: &SessionState, answer: &Answer) {
    html.push_str("<h2>🧠 Easy Explanation</h2>");
    if !answer.web_context_available {
        html.push_str(
            "<p class=\"warning\">⚠️ Web search results were unavailable, so this explanation relies on video titles only.</p>",
        );
    }

    html.push_str("<div class=\"controls\">");
    for (view, label) in [(View::Gist, "Paragraph"), (View::KeyPoints, "Key points")] {
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/view\"><input type=\"hidden\" name=\"view\" value=\"{}\"><button type=\"submit\"{}>{}</button></form> ",
            match view {
                View::Gist => "gist",
                View::KeyPoints => "key_points",
            },
            if view == state.view { " disabled" } else { "" },
            label
        );
    }
    html.push_str("</div>");

    let explanation = &answer.explanation;
    if explanation.failed || state.view == View::Gist {
        let _ = write!(html, "<p class=\"gist\">{}</p>", escape(&explanation.gist));
    } else {
        let bullets = explanation.bullets();
        if explanation.key_points == KEY_POINTS_PLACEHOLDER || bullets.is_empty() {
            let _ = write!(
                html,
                "<p class=\"key-points-missing\">{}</p>",
                escape(KEY_POINTS_PLACEHOLDER)
            );
        } else {
            html.push_str("<ul class=\"key-points\">");
            for bullet in bullets {
                let _ = write!(html, "<li>{}</li>", escape(bullet));
            }
            html.push_str("</ul>");
        }
    }
}

fn render_feedback(html: &mut String, state: &SessionState) {
    html.push_str("<div class=\"feedback\">");
    match state.feedback {
        Some(Feedback::Helpful) => html.push_str("<p>👍 Thanks for your feedback!</p>"),
        Some(Feedback::NotHelpful) => {
            html.push_str("<p>👎 Thanks, we'll try to do better next time.</p>")
        }
        None => html.push_str(
            "Was this helpful? \
             <form method=\"post\" action=\"/feedback\" style=\"display:inline\"><input type=\"hidden\" name=\"feedback\" value=\"helpful\"><button type=\"submit\">👍</button></form> \
             <form method=\"post\" action=\"/feedback\" style=\"display:inline\"><input type=\"hidden\" name=\"feedback\" value=\"not_helpful\"><button type=\"submit\">👎</button></form>",
        ),
    }
    html.push_str("</div>");
}

fn render_history(html: &mut String, state: &SessionState) {
    if state.history.is_empty() {
        return;
    }
    html.push_str("<div class=\"history\"><h2>🕘 Recent questions</h2>");
    for entry in state.recent_history() {
        let _ = write!(
            html,
            "<details><summary>{}</summary><pre>{}</pre></details>",
            escape(&entry.question),
            escape(&entry.answer)
        );
    }
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::parser::{parse_explanation, Explanation};
    use crate::agent::query::StudyQuery;
    use crate::instrumentation::RunLog;
    use crate::retrieval::VideoResult;
    use uuid::Uuid;

    fn answer(videos: usize, explanation: Explanation, web: bool) -> Answer {
        Answer {
            query: StudyQuery::new("What is <gravity>?", Subject::Physics, Grade::Any),
            videos: (0..videos)
                .map(|i| VideoResult {
                    title: format!("Video {}", i),
                    thumbnail_url: format!("https://img/{}.jpg", i),
                    video_url: format!("https://www.youtube.com/watch?v={}", i),
                })
                .collect(),
            explanation,
            web_context_available: web,
            run_log: RunLog {
                id: String::new(),
                timestamp: String::new(),
                session_id: None,
                question: String::new(),
                search_query: String::new(),
                videos_requested: 3,
                videos_returned: videos as u32,
                web_context_available: web,
                explanation_cached: false,
                explanation_failed: false,
                video_latency_ms: 0,
                web_latency_ms: 0,
                llm_latency_ms: 0,
                total_latency_ms: 0,
                gist: String::new(),
                key_points: String::new(),
            },
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn gist_view_shows_paragraph_and_one_card_per_video() {
        let state = SessionState::new(Uuid::new_v4());
        let e = parse_explanation("Gist: Things fall.\nKey Points:\n- down\n- fast");
        let html = render(&state, Some(&answer(3, e, true)));

        assert_eq!(html.matches("class=\"video\"").count(), 3);
        assert!(html.contains("<p class=\"gist\">Things fall.</p>"));
        assert!(!html.contains("<ul class=\"key-points\">"));
        assert!(html.contains("What is &lt;gravity&gt;?"));
        assert!(!html.contains("class=\"warning\""));
    }

    #[test]
    fn key_points_view_lists_bullets() {
        let mut state = SessionState::new(Uuid::new_v4());
        state.view = View::KeyPoints;
        let e = parse_explanation("Gist: Things fall.\nKey Points:\n- down\n- fast");
        let html = render(&state, Some(&answer(1, e, true)));

        assert!(html.contains("<ul class=\"key-points\"><li>down</li><li>fast</li></ul>"));
        assert!(!html.contains("<p class=\"gist\">"));
    }

    #[test]
    fn trailing_marker_with_no_bullets_shows_placeholder() {
        let mut state = SessionState::new(Uuid::new_v4());
        state.view = View::KeyPoints;
        let e = parse_explanation("Gist: Things fall.\nKey Points:");
        let html = render(&state, Some(&answer(1, e, true)));

        assert!(!html.contains("<ul class=\"key-points\">"));
        assert!(html.contains(KEY_POINTS_PLACEHOLDER));
    }

    #[test]
    fn empty_results_render_soft_warnings() {
        let state = SessionState::new(Uuid::new_v4());
        let html = render(&state, Some(&answer(0, parse_explanation("only text"), false)));

        assert_eq!(html.matches("class=\"warning\"").count(), 2);
        assert_eq!(html.matches("class=\"video\"").count(), 0);
    }

    #[test]
    fn failed_explanation_always_shows_error_text() {
        let mut state = SessionState::new(Uuid::new_v4());
        state.view = View::KeyPoints;
        let html = render(&state, Some(&answer(0, Explanation::error("quota"), true)));
        assert!(html.contains("❌ Error: quota"));
    }

    #[test]
    fn history_shows_newest_five() {
        let mut state = SessionState::new(Uuid::new_v4());
        for i in 0..7 {
            state.remember(&format!("question {}", i), &parse_explanation("g"), true);
        }
        let html = render(&state, None);
        assert_eq!(html.matches("<details>").count(), 5);
        assert!(html.contains("question 6"));
        assert!(!html.contains("question 1<"));
    }
}
