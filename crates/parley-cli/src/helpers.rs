//! Shared CLI helpers: chat bubbles, typing animation, banner.

use std::io::Write;
use std::time::Duration;

use colored::Colorize;

use parley_core::types::{Role, Turn};

/// Label printed in front of each bubble.
pub fn speaker_label(role: Role) -> &'static str {
    match role {
        Role::User => "You:",
        Role::Assistant => "Bot:",
    }
}

/// Print a reply as a `Bot:` bubble.
///
/// With a non-zero `typing_delay_ms` the text is revealed one character at
/// a time; otherwise it is printed at once.
pub async fn print_bot(reply: &str, typing_delay_ms: u64) {
    println!();
    print!("{} ", speaker_label(Role::Assistant).cyan().bold());
    if reply.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else if typing_delay_ms == 0 {
        println!("{reply}");
    } else {
        let delay = Duration::from_millis(typing_delay_ms);
        let mut stdout = std::io::stdout();
        for c in reply.chars() {
            print!("{c}");
            let _ = stdout.flush();
            tokio::time::sleep(delay).await;
        }
        println!();
    }
    println!();
}

/// Print one stored turn as a bubble, without animation.
pub fn print_turn(turn: &Turn) {
    let label = speaker_label(turn.role);
    let label = match turn.role {
        Role::User => label.green().bold(),
        Role::Assistant => label.cyan().bold(),
    };
    println!("{label} {}", turn.content);
}

/// Print a whole conversation, oldest turn first.
pub fn print_transcript(turns: &[Turn]) {
    if turns.is_empty() {
        println!("{}", "(empty session)".dimmed());
        return;
    }
    for turn in turns {
        print_turn(turn);
        println!();
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(model_label: &str, session_id: &str, durable: bool) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Parley".cyan().bold(), version.dimmed());
    println!("{}", format!("model: {model_label}").dimmed());
    let storage = if durable { "saved" } else { "in memory" };
    println!("{}", format!("session: {session_id} ({storage})").dimmed());
    println!(
        "{}",
        "Type a message, /help for commands, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while the model call is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_roles() {
        assert_eq!(speaker_label(Role::User), "You:");
        assert_eq!(speaker_label(Role::Assistant), "Bot:");
    }

    #[tokio::test]
    async fn typing_animation_waits_per_character() {
        let start = std::time::Instant::now();
        print_bot("abc", 5).await;
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
