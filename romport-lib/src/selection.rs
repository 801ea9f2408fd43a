//! Platform and game selection with fuzzy matching.

use romport_core::interaction::{self, Interaction};
use romport_core::util::format_bytes_approx;
use romport_core::{Answer, GameFile, Question};

/// Minimum similarity for a fuzzy (non-substring) match.
pub const FUZZY_THRESHOLD: f64 = 0.6;

/// How platforms or games are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Everything
    All,
    /// Step through each item: yes / no / all remaining / quit
    Interactive,
    /// Fuzzy search
    Query(String),
}

impl Selector {
    /// `ALL` and `INTERACTIVE` (any case) are keywords; anything else is a query.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            Self::All
        } else if value.eq_ignore_ascii_case("interactive") {
            Self::Interactive
        } else {
            Self::Query(value.to_string())
        }
    }
}

/// Result of a selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    Selected(Vec<T>),
    /// The user asked to stop
    Quit,
}

impl<T> Selection<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Selection::Selected(items) => items,
            Selection::Quit => Vec::new(),
        }
    }
}

/// Similarity of `query` to `candidate` in `0.0..=1.0`, case-insensitive.
///
/// Exact match scores 1.0 and substring 0.9; otherwise the normalized
/// Levenshtein similarity is used.
pub fn similarity(query: &str, candidate: &str) -> f64 {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();
    if query == candidate {
        1.0
    } else if candidate.contains(&query) {
        0.9
    } else {
        strsim::normalized_levenshtein(&query, &candidate)
    }
}

/// Indices of `candidates` matching `query`, best first (ties by name).
pub fn fuzzy_matches<S: AsRef<str>>(query: &str, candidates: &[S]) -> Vec<(usize, f64)> {
    let mut matches: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, similarity(query, c.as_ref())))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .collect();
    matches.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| candidates[a.0].as_ref().cmp(candidates[b.0].as_ref()))
    });
    matches
}

/// Choose platforms to export.
///
/// With no selector the user picks one platform from the full list.
pub fn select_platforms(
    selector: Option<&Selector>,
    platforms: &[String],
    prompter: &mut dyn Interaction,
) -> Selection<String> {
    match selector {
        Some(Selector::All) => Selection::Selected(platforms.to_vec()),
        Some(Selector::Interactive) => step_through(platforms, platforms, "Export platform", prompter),
        Some(Selector::Query(query)) => {
            let matches = fuzzy_matches(query, platforms);
            if matches.is_empty() {
                log::warn!("No platforms found matching '{query}'");
                return Selection::Selected(Vec::new());
            }
            let labels: Vec<String> = matches
                .iter()
                .map(|(i, score)| format!("{} (match: {:.0}%)", platforms[*i], score * 100.0))
                .collect();
            let picked = pick_match(query, &matches, &labels, "platform", false, prompter);
            picked.map(|indices| indices.into_iter().map(|i| platforms[i].clone()).collect())
        }
        None => {
            if !prompter.is_interactive() {
                log::warn!("No platform selected and no console attached; nothing to export");
                return Selection::Selected(Vec::new());
            }
            match prompter.ask(&Question::select("Select platform", platforms)) {
                Some(Answer::Index(i)) if i < platforms.len() => {
                    Selection::Selected(vec![platforms[i].clone()])
                }
                Some(Answer::All) => Selection::Selected(platforms.to_vec()),
                _ => Selection::Quit,
            }
        }
    }
}

/// Choose games for one platform.
pub fn select_games(
    selector: &Selector,
    games: &[GameFile],
    prompter: &mut dyn Interaction,
) -> Selection<GameFile> {
    match selector {
        Selector::All => Selection::Selected(games.to_vec()),
        Selector::Interactive => {
            let names: Vec<String> = games.iter().map(|g| g.name.clone()).collect();
            step_through(games, &names, "Export game", prompter)
        }
        Selector::Query(query) => {
            let names: Vec<&str> = games.iter().map(|g| g.name.as_str()).collect();
            let matches = fuzzy_matches(query, &names);
            if matches.is_empty() {
                log::warn!("No games found matching '{query}'");
                return Selection::Selected(Vec::new());
            }
            let labels: Vec<String> = matches
                .iter()
                .map(|(i, score)| {
                    format!(
                        "{} ({}) (match: {:.0}%)",
                        games[*i].name,
                        format_bytes_approx(games[*i].size),
                        score * 100.0
                    )
                })
                .collect();
            let picked = pick_match(query, &matches, &labels, "game", true, prompter);
            picked.map(|indices| indices.into_iter().map(|i| games[i].clone()).collect())
        }
    }
}

/// Resolve a fuzzy match list to item indices.
fn pick_match(
    query: &str,
    matches: &[(usize, f64)],
    labels: &[String],
    noun: &str,
    offer_all: bool,
    prompter: &mut dyn Interaction,
) -> Selection<usize> {
    let exact = matches.first().filter(|(_, score)| *score >= 1.0).map(|(i, _)| *i);

    if !prompter.is_interactive() {
        return match exact {
            Some(i) => Selection::Selected(vec![i]),
            None => {
                log::warn!("No exact {noun} match for '{query}' and no console attached; skipping");
                Selection::Selected(Vec::new())
            }
        };
    }

    if matches.len() == 1 {
        if let Some(i) = exact {
            let prompt = format!("Use '{}'?", labels[0]);
            return match interaction::confirm(prompter, &prompt, true) {
                Some(true) => Selection::Selected(vec![i]),
                _ => Selection::Selected(Vec::new()),
            };
        }
    }

    let mut options = labels.to_vec();
    if offer_all {
        options.push("Select all matches".to_string());
    }
    let prompt = format!("Select {noun} matching '{query}'");
    match prompter.ask(&Question::select(&prompt, &options)) {
        Some(Answer::Index(i)) if i < matches.len() => Selection::Selected(vec![matches[i].0]),
        Some(Answer::Index(i)) if offer_all && i == matches.len() => {
            Selection::Selected(matches.iter().map(|(i, _)| *i).collect())
        }
        Some(Answer::All) if offer_all => {
            Selection::Selected(matches.iter().map(|(i, _)| *i).collect())
        }
        Some(Answer::Quit) | None => Selection::Quit,
        _ => Selection::Selected(Vec::new()),
    }
}

/// Ask about each item in turn. Quit keeps what was selected so far.
fn step_through<T: Clone>(
    items: &[T],
    labels: &[String],
    verb: &str,
    prompter: &mut dyn Interaction,
) -> Selection<T> {
    if !prompter.is_interactive() {
        log::warn!("Interactive selection needs a console; nothing selected");
        return Selection::Selected(Vec::new());
    }

    let mut selected = Vec::new();
    for (idx, (item, label)) in items.iter().zip(labels).enumerate() {
        let prompt = format!("[{}/{}] {verb} '{label}'?", idx + 1, items.len());
        match prompter.ask(&Question::step(&prompt)) {
            Some(Answer::Yes) => selected.push(item.clone()),
            Some(Answer::All) => {
                selected.extend(items[idx..].iter().cloned());
                break;
            }
            Some(Answer::Quit) | None => break,
            _ => {}
        }
    }
    log::info!("Selected {} of {}", selected.len(), items.len());
    Selection::Selected(selected)
}

impl Selection<usize> {
    fn map<U>(self, f: impl FnOnce(Vec<usize>) -> Vec<U>) -> Selection<U> {
        match self {
            Selection::Selected(items) => Selection::Selected(f(items)),
            Selection::Quit => Selection::Quit,
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
