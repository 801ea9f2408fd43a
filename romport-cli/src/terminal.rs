//! Terminal adapter for the engine's prompts, plus the export spinner.

use std::io::{BufRead, Write};

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use romport_core::{Answer, Interaction, Question, QuestionKind};

/// Spinner shown while exporting; hidden in quiet mode.
pub(crate) fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("/-\\|"));
    }
    pb
}

/// Asks questions on stdin/stdout. The spinner is suspended while waiting.
pub(crate) struct TerminalInteraction {
    bar: ProgressBar,
}

impl TerminalInteraction {
    pub(crate) fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Interaction for TerminalInteraction {
    fn ask(&mut self, question: &Question<'_>) -> Option<Answer> {
        self.bar.suspend(|| ask_stdin(question))
    }
}

fn ask_stdin(question: &Question<'_>) -> Option<Answer> {
    println!();
    for (i, option) in question.options.iter().enumerate() {
        println!(
            "  {} {}",
            format!("{:>3}.", i + 1).if_supports_color(Stdout, |t| t.cyan()),
            option
        );
    }

    let hint = hint(&question.kind);
    loop {
        print!(
            "{} {} ",
            question.prompt.if_supports_color(Stdout, |t| t.bold()),
            hint.if_supports_color(Stdout, |t| t.dimmed())
        );
        let _ = std::io::stdout().flush();

        let mut input = String::new();
        match std::io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        if let Some(answer) = parse_answer(&question.kind, question.options.len(), input.trim()) {
            return Some(answer);
        }
        println!(
            "  {}",
            "Please answer one of the choices shown.".if_supports_color(Stdout, |t| t.yellow())
        );
    }
}

fn hint(kind: &QuestionKind) -> String {
    match kind {
        QuestionKind::Confirm { default: true } => "[Y/n]".to_string(),
        QuestionKind::Confirm { default: false } => "[y/N]".to_string(),
        QuestionKind::Step => "[y]es/[n]o/[a]ll/[q]uit".to_string(),
        QuestionKind::Text { default } => format!("[{default}]"),
        QuestionKind::Select {
            allow_skip,
            allow_all,
            allow_quit,
        } => {
            let mut parts = vec!["number".to_string()];
            if *allow_skip {
                parts.push("[s]kip".to_string());
            }
            if *allow_all {
                parts.push("[a]lways first".to_string());
            }
            if *allow_quit {
                parts.push("[q]uit".to_string());
            }
            format!("({})", parts.join("/"))
        }
    }
}

/// Interpret one line of input. `None` means ask again.
fn parse_answer(kind: &QuestionKind, option_count: usize, input: &str) -> Option<Answer> {
    let lower = input.to_lowercase();
    match kind {
        QuestionKind::Confirm { default } => match lower.as_str() {
            "" => Some(if *default { Answer::Yes } else { Answer::No }),
            "y" | "yes" => Some(Answer::Yes),
            "n" | "no" => Some(Answer::No),
            _ => None,
        },
        QuestionKind::Text { .. } => Some(Answer::Text(input.to_string())),
        QuestionKind::Step => match lower.as_str() {
            "y" | "yes" => Some(Answer::Yes),
            "n" | "no" | "" => Some(Answer::No),
            "a" | "all" => Some(Answer::All),
            "q" | "quit" => Some(Answer::Quit),
            _ => None,
        },
        QuestionKind::Select {
            allow_skip,
            allow_all,
            allow_quit,
        } => match lower.as_str() {
            "s" | "skip" if *allow_skip => Some(Answer::Skip),
            "a" | "always" if *allow_all => Some(Answer::All),
            "q" | "quit" if *allow_quit => Some(Answer::Quit),
            _ => match lower.parse::<usize>() {
                Ok(n) if (1..=option_count).contains(&n) => Some(Answer::Index(n - 1)),
                _ => None,
            },
        },
    }
}
