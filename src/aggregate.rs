//! Assembly of per-field results into the page's answer tree.
//!
//! Outcomes arrive in template declaration order. Only hits contribute:
//! standalone answers go to the top level, grouped bubbles go into the row
//! group named by their field, created on first use. In both places an answer
//! equal to one already present is dropped (see [`Answer::same_answer`]).

use crate::detector::FieldOutcome;
use crate::models::output::already_answered;
use crate::models::{Answer, AnswerRecord, Field, RowGroup};

/// Build the `details` tree from ordered `(field, outcome)` pairs
pub fn aggregate<'a, I>(outcomes: I) -> Vec<AnswerRecord>
where
    I: IntoIterator<Item = (&'a Field, &'a FieldOutcome)>,
{
    let mut details = Vec::new();
    for (field, outcome) in outcomes {
        if let Some(answer) = outcome.answer() {
            insert_answer(&mut details, field.row_group(), answer.clone());
        }
    }
    details
}

/// Add one answer under the dedup and grouping rules
pub fn insert_answer(details: &mut Vec<AnswerRecord>, row_group: Option<&str>, answer: Answer) {
    let Some(group_id) = row_group else {
        if !already_answered(details, &answer) {
            details.push(AnswerRecord::Answer(answer));
        }
        return;
    };

    let position = details
        .iter()
        .position(|r| matches!(r, AnswerRecord::RowGroup(g) if g.id == group_id));
    let index = match position {
        Some(index) => index,
        None => {
            details.push(AnswerRecord::RowGroup(RowGroup::new(group_id)));
            details.len() - 1
        }
    };

    if let AnswerRecord::RowGroup(group) = &mut details[index] {
        if !group.already_answered(&answer) {
            group.details.push(answer);
        }
    }
}
