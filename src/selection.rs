use crate::error::InvalidSelection;
use crate::model::{ChapterBucket, ChapterEntry};
use crate::prompt::{Menu, MenuOption, Prompter};

/// Sticky choice carried across one run. Leaves `Unset` at most once and
/// never goes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unset,
    AllChosen,
    GroupPreferred(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    All,
    /// Zero-based index into the candidates.
    Index(usize),
}

/// `a`/`A` or a 1-based index within `1..=options`.
pub fn parse_answer(answer: &str, options: usize) -> Result<Answer, InvalidSelection> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("a") {
        return Ok(Answer::All);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Ok(Answer::Index(n - 1)),
        _ => Err(InvalidSelection {
            answer: answer.to_owned(),
            options,
        }),
    }
}

pub fn candidate_menu(number: &str, entries: &[ChapterEntry], question: String) -> Menu {
    let mut options = entries
        .iter()
        .enumerate()
        .map(|(i, e)| MenuOption::new((i + 1).to_string(), e.group_name.clone()))
        .collect::<Vec<_>>();
    options.push(MenuOption::new("a", "all"));
    Menu {
        heading: format!("Chapter {number} available from:"),
        options,
        question,
    }
}

#[derive(Debug, PartialEq)]
pub enum Selection<'a> {
    Download(Vec<&'a ChapterEntry>),
    Skip(InvalidSelection),
}

/// Pick what to download from `bucket`, prompting only when the sticky
/// state does not already decide it.
pub fn select<'a>(
    state: &mut SelectionState,
    bucket: &'a ChapterBucket,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<Selection<'a>> {
    if !bucket.is_contested() {
        return Ok(Selection::Download(bucket.entries.iter().collect()));
    }

    match state {
        SelectionState::AllChosen => {
            return Ok(Selection::Download(bucket.entries.iter().collect()));
        }
        SelectionState::GroupPreferred(group_id) => {
            let preferred = bucket
                .entries
                .iter()
                .filter(|e| e.group_id.as_deref() == Some(group_id.as_str()))
                .collect::<Vec<_>>();
            if !preferred.is_empty() {
                return Ok(Selection::Download(preferred));
            }
        }
        SelectionState::Unset => {}
    }

    let count = bucket.entries.len();
    let menu = candidate_menu(
        &bucket.number,
        &bucket.entries,
        format!("Select option for chapter {} (1-{count} or a): ", bucket.number),
    );
    let answer = prompter.ask(&menu)?;

    match parse_answer(&answer, count) {
        Ok(Answer::All) => {
            if *state == SelectionState::Unset {
                *state = SelectionState::AllChosen;
            }
            Ok(Selection::Download(bucket.entries.iter().collect()))
        }
        Ok(Answer::Index(idx)) => {
            let choice = &bucket.entries[idx];
            if *state == SelectionState::Unset
                && let Some(group_id) = &choice.group_id
            {
                *state = SelectionState::GroupPreferred(group_id.clone());
            }
            Ok(Selection::Download(vec![choice]))
        }
        Err(invalid) => Ok(Selection::Skip(invalid)),
    }
}
