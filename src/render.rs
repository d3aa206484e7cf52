//! Terminal rendering of the create preview, the chat log, and the scorecard
//! side panel. Everything here takes shared references and returns strings;
//! the caller decides where to print.

use colored::*;

use crate::protocol::{Message, Role};
use crate::scorecard::{SectionFields, SectionName};
use crate::session::{Notice, NoticeLevel};
use crate::store::ConversationSession;

pub const ASSISTANT_NAME: &str = "WhoaAI";

const RULE: &str = "────────────────────────────────────────";

/// `boss_style` → `Boss Style`, `q1_goal` → `Q1 Goal`.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Shortened thread id for headers: the first eight characters.
pub fn short_thread_id(thread_id: &str) -> String {
    let short: String = thread_id.chars().take(8).collect();
    format!("{}...", short)
}

/// Preview card shown on the create page before the conversation starts.
pub fn render_create_preview(job_title: &str, thread_id: Option<&str>) -> String {
    let title = if job_title.trim().is_empty() { "Your Scorecard Name" } else { job_title };
    let assignment = match thread_id.filter(|t| !t.is_empty()) {
        Some(t) => format!("Thread ID: {}", t),
        None => "Not assigned to a job opening".to_string(),
    };
    format!(
        "{}\n{} {}\n  {}\n{}",
        RULE.dimmed(),
        "●".bright_blue(),
        title.bold(),
        assignment.italic(),
        RULE.dimmed()
    )
}

pub fn render_header(session: &ConversationSession) -> String {
    let mut out = format!("{}  {}", format!("{} Assistant", ASSISTANT_NAME).bold(), session.job_title().bright_white());
    if let Some(t) = session.thread_id() {
        out.push_str(&format!("  {}", format!("Thread: {}", short_thread_id(t)).italic()));
    }
    out
}

pub fn render_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("{} {}", "You:".bright_blue().bold(), message.content),
        Role::Assistant => {
            format!("{} {}", format!("{}:", ASSISTANT_NAME).bright_magenta().bold(), message.content)
        }
    }
}

pub fn render_messages(messages: &[Message]) -> String {
    messages.iter().map(render_message).collect::<Vec<_>>().join("\n")
}

fn render_section(name: SectionName, fields: Option<&SectionFields>) -> String {
    let mut out = format!("{}\n", name.label().bold());
    let lines: Vec<String> = fields
        .into_iter()
        .flatten()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("  • {}: {}", humanize_key(k).bold(), v))
        .collect();
    if fields.map_or(true, |f| f.is_empty()) {
        out.push_str(&format!("  {}", "Not set yet".italic().dimmed()));
    } else {
        out.push_str(&lines.join("\n"));
    }
    out
}

/// The scorecard side panel: progress, thread id, and all seven sections.
pub fn render_scorecard(session: &ConversationSession) -> String {
    let draft = session.draft();
    let mut parts = vec![
        "Scorecard Preview".bold().underline().to_string(),
        format!("Draft ({}/{})", draft.populated(), SectionName::ALL.len()).bright_cyan().to_string(),
    ];
    if let Some(t) = session.thread_id() {
        parts.push(format!("Thread ID: {}", t.bright_white()));
    }
    for name in SectionName::ALL {
        parts.push(RULE.dimmed().to_string());
        parts.push(render_section(name, draft.section(name)));
    }
    parts.join("\n")
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("{} {}", "[info]".bright_blue(), notice.text),
        NoticeLevel::Success => format!("{} {}", "[done]".bright_green(), notice.text),
        NoticeLevel::Warning => format!("{} {}", "[warn]".bright_yellow(), notice.text),
        NoticeLevel::Error => format!("{} {}", "[error]".bright_red(), notice.text.bright_red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::History;
    use crate::scorecard::{ScorecardDraft, SectionUpdate};

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("team_size"), "Team Size");
        assert_eq!(humanize_key("boss_style"), "Boss Style");
        assert_eq!(humanize_key("q1_goal"), "Q1 Goal");
        assert_eq!(humanize_key("ALREADY_UPPER"), "Already Upper");
        assert_eq!(humanize_key(""), "");
    }

    #[test]
    fn test_short_thread_id() {
        assert_eq!(short_thread_id("abcdefghijkl"), "abcdefgh...");
        assert_eq!(short_thread_id("abc"), "abc...");
        assert_eq!(short_thread_id("ééééééééé"), "éééééééé...");
    }

    #[test]
    fn test_create_preview_placeholders() {
        let out = render_create_preview("", None);
        assert!(out.contains("Your Scorecard Name"));
        assert!(out.contains("Not assigned to a job opening"));
        let out = render_create_preview("Senior Engineer", Some("abc123"));
        assert!(out.contains("Senior Engineer"));
        assert!(out.contains("Thread ID: abc123"));
    }

    #[test]
    fn test_render_messages_labels_roles() {
        let out = render_messages(&[Message::user("I lead a team of 5"), Message::assistant("Great")]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("You:") && lines[0].contains("I lead a team of 5"));
        assert!(lines[1].contains("WhoaAI:") && lines[1].contains("Great"));
    }

    #[test]
    fn test_scorecard_lists_all_sections() {
        let mut fields = SectionFields::new();
        fields.insert("team_size".to_string(), "5".to_string());
        fields.insert("notes".to_string(), String::new());
        let mut draft = ScorecardDraft::new();
        draft.merge(&SectionUpdate::new().with(SectionName::Situation, fields));
        let session = ConversationSession::resumed(
            "PM",
            None,
            "abc123",
            History { messages: Vec::new(), draft },
        );
        let out = render_scorecard(&session);
        assert!(out.contains("Draft (1/7)"));
        assert!(out.contains("abc123"));
        for name in SectionName::ALL {
            assert!(out.contains(name.label()), "missing {}", name.label());
        }
        assert!(out.contains("Team Size"));
        assert!(!out.contains("Notes"), "empty values are skipped");
        assert_eq!(out.matches("Not set yet").count(), 6);
    }

    #[test]
    fn test_header_shows_short_thread() {
        let mut session = ConversationSession::fresh("Senior Engineer", None);
        assert!(!render_header(&session).contains("Thread:"));
        session.set_thread_id("0123456789");
        let out = render_header(&session);
        assert!(out.contains("Senior Engineer"));
        assert!(out.contains("01234567..."));
    }

    #[test]
    fn test_notice_levels_render_text() {
        let n = Notice { level: NoticeLevel::Error, text: "boom".to_string() };
        assert!(render_notice(&n).contains("boom"));
    }
}
