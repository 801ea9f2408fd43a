//! The prompt capability: ask a question, get a bounded answer.
//!
//! The engine never assumes a console is attached. It asks through an
//! [`Interaction`]; the CLI supplies a terminal adapter, tests supply
//! [`ScriptedInteraction`], and batch runs use [`Headless`], which answers
//! nothing.

use std::collections::VecDeque;

/// The shape of answer a question accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Yes or no; empty input takes `default`.
    Confirm { default: bool },
    /// Pick one of the options by index, with optional escape hatches.
    Select {
        allow_skip: bool,
        allow_all: bool,
        allow_quit: bool,
    },
    /// Per-item step through a list: yes / no / all remaining / quit.
    Step,
    /// Free text; empty input takes `default`.
    Text { default: String },
}

/// A question put to the user.
#[derive(Debug, Clone)]
pub struct Question<'a> {
    pub prompt: &'a str,
    /// Numbered options for [`QuestionKind::Select`]; empty otherwise
    pub options: &'a [String],
    pub kind: QuestionKind,
}

impl<'a> Question<'a> {
    pub fn confirm(prompt: &'a str, default: bool) -> Self {
        Self {
            prompt,
            options: &[],
            kind: QuestionKind::Confirm { default },
        }
    }

    pub fn text(prompt: &'a str, default: impl Into<String>) -> Self {
        Self {
            prompt,
            options: &[],
            kind: QuestionKind::Text {
                default: default.into(),
            },
        }
    }

    pub fn step(prompt: &'a str) -> Self {
        Self {
            prompt,
            options: &[],
            kind: QuestionKind::Step,
        }
    }

    pub fn select(prompt: &'a str, options: &'a [String]) -> Self {
        Self {
            prompt,
            options,
            kind: QuestionKind::Select {
                allow_skip: false,
                allow_all: false,
                allow_quit: true,
            },
        }
    }

    /// Select with skip and "always take the first" escape hatches.
    pub fn select_or_skip(prompt: &'a str, options: &'a [String]) -> Self {
        Self {
            prompt,
            options,
            kind: QuestionKind::Select {
                allow_skip: true,
                allow_all: true,
                allow_quit: false,
            },
        }
    }
}

/// A bounded answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Zero-based option index
    Index(usize),
    Text(String),
    Skip,
    /// "All remaining" for steps, "always take the first" for selects
    All,
    Quit,
}

/// Something the engine can ask questions through.
pub trait Interaction {
    /// Whether a human can answer. Engines skip optional prompts when false.
    fn is_interactive(&self) -> bool {
        true
    }

    /// Ask `question`. `None` means no answer is available.
    fn ask(&mut self, question: &Question<'_>) -> Option<Answer>;
}

/// Ask a yes/no question, falling back to `None` when nobody can answer.
pub fn confirm(interaction: &mut dyn Interaction, prompt: &str, default: bool) -> Option<bool> {
    match interaction.ask(&Question::confirm(prompt, default))? {
        Answer::Yes => Some(true),
        Answer::No | Answer::Skip | Answer::Quit => Some(false),
        _ => Some(default),
    }
}

/// Ask for free text; empty answers take `default`.
pub fn text(interaction: &mut dyn Interaction, prompt: &str, default: &str) -> Option<String> {
    match interaction.ask(&Question::text(prompt, default))? {
        Answer::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => Some(default.to_string()),
    }
}

/// No console attached: every question goes unanswered.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Interaction for Headless {
    fn is_interactive(&self) -> bool {
        false
    }

    fn ask(&mut self, _question: &Question<'_>) -> Option<Answer> {
        None
    }
}

/// Fixed answers handed out in order. Records every prompt it was asked.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInteraction {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedInteraction {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Prompts asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Interaction for ScriptedInteraction {
    fn ask(&mut self, question: &Question<'_>) -> Option<Answer> {
        self.asked.push(question.prompt.to_string());
        self.answers.pop_front()
    }
}
