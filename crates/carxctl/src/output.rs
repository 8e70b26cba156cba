//! Terminal output helpers

use anyhow::Result;
use carx_common::{Response, ResponseKind};
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn print_banner(version: &str) {
    let title = format!("🚗 Car Expert v{}", version);
    println!("{}", title.bright_cyan().bold());
    println!("Ask in English or Arabic. Type /help for commands, exit to quit.");
    println!("اسأل بالعربي أو بالإنجليزي. اكتب exit للخروج.");
    println!();
}

pub fn print_prompt() {
    use std::io::Write;
    print!("{} ", "carx>".bright_blue().bold());
    let _ = std::io::stdout().flush();
}

pub fn print_response(response: &Response) {
    let text = response.render();
    match response.kind {
        ResponseKind::Emergency => println!("{}", text.bright_red().bold()),
        ResponseKind::Error => println!("{}", text.red()),
        ResponseKind::Normal => println!("{}", text),
    }
    if let Some(model) = &response.model {
        println!("{}", format!("(answered by {})", model).dimmed());
    }
    println!();
}

pub fn print_info(message: &str) {
    println!("{}", message.bright_white());
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

pub fn print_ok(message: &str) {
    println!("[OK] {}", message.green());
}

/// Pretty JSON for `--json`
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
