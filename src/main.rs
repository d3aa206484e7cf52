use clap::Parser;
use colored::*;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use scorecard_chat::cli::Args;
use scorecard_chat::render::{
    render_create_preview, render_header, render_message, render_messages, render_notice,
    render_scorecard,
};
use scorecard_chat::{
    BackendTransport, ClientConfig, CreateForm, SendOutcome, SessionController, SessionError,
};

const HELP: &str =
    "Commands: /preview  /save  /complete  /back (new scorecard)  /quit  (anything else is sent)";

enum Command<'a> {
    Send(&'a str),
    Preview,
    Save,
    Complete,
    Back,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "/preview" => Command::Preview,
        "/save" => Command::Save,
        "/complete" => Command::Complete,
        "/back" => Command::Back,
        "/quit" | "/exit" => Command::Quit,
        "/help" => Command::Help,
        other => Command::Send(other),
    }
}

fn flush_notices(controller: &mut SessionController<BackendTransport>) {
    for notice in controller.take_notices() {
        eprintln!("{}", render_notice(&notice));
    }
}

fn prompt_with(label: &str) {
    print!("{} ", label.bright_blue().bold());
    let _ = io::stdout().flush();
}

fn prompt() {
    prompt_with(">");
}

fn print_chat_intro(controller: &SessionController<BackendTransport>) {
    if let Some(session) = controller.session() {
        println!("{}", render_header(session));
        if !session.messages().is_empty() {
            println!("{}", render_messages(session.messages()));
        }
    }
    println!("{}", HELP.dimmed());
}

/// Build a create form from the two prompted lines. A blank job title means
/// the user is done.
fn form_from_input(job_title: String, thread_id: String, token: Option<String>) -> Option<CreateForm> {
    if job_title.trim().is_empty() {
        return None;
    }
    let mut form = CreateForm::new(job_title);
    form.thread_id = Some(thread_id).filter(|t| !t.trim().is_empty());
    form.auth_token = token;
    Some(form)
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

/// Read create forms from stdin until one is accepted. Returns `false` when
/// the user leaves with a blank job title or stdin ends.
async fn recreate(
    controller: &mut SessionController<BackendTransport>,
    lines: &mut StdinLines,
    token: Option<String>,
) -> io::Result<bool> {
    loop {
        println!("{}", "Create New Scorecard".bold());
        prompt_with("Job title (blank to quit):");
        let job_title = match lines.next_line().await? {
            Some(line) if !line.trim().is_empty() => line,
            _ => return Ok(false),
        };
        prompt_with("Thread ID (optional):");
        let thread_id = lines.next_line().await?.unwrap_or_default();
        let Some(form) = form_from_input(job_title, thread_id, token.clone()) else {
            return Ok(false);
        };
        println!("{}", render_create_preview(&form.job_title, form.thread_id.as_deref()));

        let created = controller.create(form).await.is_ok();
        flush_notices(controller);
        if created {
            return Ok(true);
        }
    }
}

#[tokio::main]
async fn main() -> scorecard_chat::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let config = args.apply_overrides(ClientConfig::load(args.config.as_deref())?)?;
    tracing::debug!(ws_url = %config.ws_url, api_base_url = %config.api_base_url, "configuration loaded");

    println!("{}", "Create New Scorecard".bold());
    println!("{}", render_create_preview(&args.job_title, args.thread_id.as_deref()));

    let mut controller = SessionController::new(BackendTransport::new(config));
    if let Err(e) = controller.create(args.create_form()).await {
        flush_notices(&mut controller);
        return Err(e.into());
    }

    print_chat_intro(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Send("") => {}
            Command::Send(text) => {
                let (before, thread_before) = match controller.session() {
                    Some(s) => (s.messages().len(), s.thread_id().map(str::to_string)),
                    None => (0, None),
                };
                match controller.send(text).await {
                    Ok(outcome) => {
                        if let Some(session) = controller.session() {
                            // Skip the optimistic user line, which the terminal already shows.
                            for message in session.messages().iter().skip(before + 1) {
                                println!("{}", render_message(message));
                            }
                            if outcome == SendOutcome::NoResponse
                                || session.thread_id() != thread_before.as_deref()
                            {
                                println!("{}", render_header(session));
                            }
                        }
                    }
                    Err(SessionError::Busy) => eprintln!("{}", "Still waiting for the last reply.".yellow()),
                    Err(e) => eprintln!("{}", e.to_string().yellow()),
                }
            }
            Command::Preview => {
                if let Some(session) = controller.session() {
                    println!("{}", render_scorecard(session));
                }
            }
            Command::Save => {
                let _ = controller.save_draft();
            }
            Command::Complete => {
                let _ = controller.complete_scorecard();
            }
            Command::Help => println!("{}", HELP.dimmed()),
            Command::Back => {
                controller.back();
                flush_notices(&mut controller);
                if !recreate(&mut controller, &mut lines, args.token.clone()).await? {
                    break;
                }
                print_chat_intro(&controller);
            }
            Command::Quit => {
                controller.back();
                flush_notices(&mut controller);
                break;
            }
        }
        flush_notices(&mut controller);
        prompt();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_keywords() {
        assert!(matches!(parse_command("/preview"), Command::Preview));
        assert!(matches!(parse_command(" /save "), Command::Save));
        assert!(matches!(parse_command("/complete"), Command::Complete));
        assert!(matches!(parse_command("/back"), Command::Back));
        assert!(matches!(parse_command("/exit"), Command::Quit));
    }

    #[test]
    fn test_form_from_input() {
        assert!(form_from_input("  ".to_string(), "abc".to_string(), None).is_none());

        let form = form_from_input("PM".to_string(), " ".to_string(), Some("tok".to_string()))
            .expect("form");
        assert_eq!(form.job_title, "PM");
        assert!(form.thread_id.is_none());
        assert_eq!(form.auth_token.as_deref(), Some("tok"));

        let form = form_from_input("PM".to_string(), "abc123".to_string(), None).expect("form");
        assert_eq!(form.thread_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_command_plain_text_is_sent() {
        assert!(matches!(parse_command("  I lead a team of 5 "), Command::Send("I lead a team of 5")));
        assert!(matches!(parse_command("/unknown"), Command::Send("/unknown")));
    }
}
