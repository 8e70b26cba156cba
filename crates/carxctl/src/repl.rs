//! REPL - Conversational interface for Car Expert
//!
//! Runs the core in-process. One session per REPL; the garage added with
//! /car lives in that session's profile until the REPL exits.

use crate::output::{print_banner, print_error, print_info, print_ok, print_prompt, print_response};
use anyhow::Result;
use carx_common::responder::EMPTY_MESSAGE_PROMPT;
use carx_common::{
    CarxConfig, Exchange, OllamaClient, Response, ResponseGenerator, Session, SessionStore,
    SessionUpdate, VehicleDetails,
};
use chrono::{Local, Utc};
use std::io::{self, BufRead};
use std::time::Duration;

const HELP: &str = "\
Commands:
  /car <id> <make> <model> <year> <mileage>   add a vehicle to your garage
  /garage                                    list vehicles and upcoming services
  /history                                   show this session's questions
  /help                                      this help
  exit | quit | خروج                          leave";

/// What the REPL should do with one input line
#[derive(Debug)]
pub enum ReplOutcome {
    Exit,
    Reply(Box<Response>),
    Info(String),
}

pub struct ChatSession {
    generator: ResponseGenerator,
    sessions: SessionStore,
    llm: Option<OllamaClient>,
    llm_timeout: Duration,
    session_id: String,
}

impl ChatSession {
    pub fn new(config: &CarxConfig) -> Self {
        Self {
            generator: ResponseGenerator::new(config),
            sessions: SessionStore::from_config(&config.session),
            llm: config.llm.enabled.then(|| OllamaClient::new(&config.llm)),
            llm_timeout: Duration::from_secs(config.llm.response_timeout_secs),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.sessions.get(&self.session_id)
    }

    /// Answer one message and record it in the session
    pub async fn respond(&mut self, text: &str) -> Response {
        let profile = self
            .sessions
            .get_or_create(&self.session_id)
            .profile
            .clone();
        let analysis = self.generator.analyzer().analyze(text);
        let mut response = self.generator.respond(&analysis, &profile);

        if response.needs_model_answer() {
            if let Some(llm) = &self.llm {
                let answer = llm.answer(text, analysis.language);
                match tokio::time::timeout(self.llm_timeout, answer).await {
                    Ok(Ok(answer)) => response.apply_model_answer(llm.model(), answer),
                    Ok(Err(e)) => tracing::warn!("Model answer failed: {}", e),
                    Err(_) => tracing::warn!("Model answer timed out"),
                }
            }
        }

        self.sessions.update(
            &self.session_id,
            SessionUpdate {
                language: Some(analysis.language),
                last_query: Some(text.to_string()),
                ..Default::default()
            },
        );
        self.sessions.record_exchange(
            &self.session_id,
            Exchange {
                timestamp: Utc::now(),
                query: text.to_string(),
                intent: analysis.intent,
                reply_kind: response.kind,
            },
        );
        response
    }

    pub async fn handle_line(&mut self, line: &str) -> ReplOutcome {
        let input = line.trim();
        if input.is_empty() {
            return ReplOutcome::Info(EMPTY_MESSAGE_PROMPT.to_string());
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "خروج" => return ReplOutcome::Exit,
            "/help" => return ReplOutcome::Info(HELP.to_string()),
            "/garage" => return ReplOutcome::Info(self.garage()),
            "/history" => return ReplOutcome::Info(self.history()),
            _ => {}
        }

        if let Some(args) = input.strip_prefix("/car") {
            return ReplOutcome::Info(self.add_car(args));
        }

        ReplOutcome::Reply(Box::new(self.respond(input).await))
    }

    fn add_car(&mut self, args: &str) -> String {
        let parts: Vec<&str> = args.split_whitespace().collect();
        let [id, make, model, year, mileage] = parts.as_slice() else {
            return "Usage: /car <id> <make> <model> <year> <mileage>".to_string();
        };
        let (Ok(year), Ok(mileage)) = (year.parse::<i32>(), mileage.parse::<u64>()) else {
            return "Year and mileage must be numbers".to_string();
        };

        let details = VehicleDetails {
            make: make.to_string(),
            model: model.to_string(),
            year,
            mileage,
            ..Default::default()
        };
        let today = Local::now().date_naive();
        let session = self.sessions.get_or_create(&self.session_id);
        match session.profile.add_vehicle(id, details, today) {
            Ok(()) => format!("Added {} {} {} as {}", year, make, model, id),
            Err(e) => e.to_string(),
        }
    }

    fn garage(&self) -> String {
        let Some(session) = self.session() else {
            return "No vehicles yet. Add one with /car".to_string();
        };
        if session.profile.vehicles.is_empty() {
            return "No vehicles yet. Add one with /car".to_string();
        }
        session
            .profile
            .maintenance_reminders(session.language)
            .join("\n")
    }

    fn history(&self) -> String {
        let Some(session) = self.session() else {
            return "No questions yet".to_string();
        };
        session
            .context
            .iter()
            .map(|e| {
                format!(
                    "{} {} {}",
                    e.timestamp.format("%H:%M"),
                    e.intent.indicator(),
                    e.query
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Start the conversational REPL
pub async fn run(config: &CarxConfig, version: &str) -> Result<()> {
    print_banner(version);
    let mut chat = ChatSession::new(config);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_prompt();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                print_error(&format!("Error reading input: {}", e));
                continue;
            }
            None => break, // EOF
        };

        match chat.handle_line(&line).await {
            ReplOutcome::Exit => {
                print_ok("Drive safe! / قيادة آمنة!");
                break;
            }
            ReplOutcome::Reply(response) => print_response(&response),
            ReplOutcome::Info(message) => print_info(&message),
        }
    }
    Ok(())
}
