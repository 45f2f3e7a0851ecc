//! Content selection: which variant of an interaction's content is active.

use rh_core::interaction::{ColumnHeaders, ContentSet};
use rh_core::{Expectations, Interaction, MultichoiceOption, ResponseCandidate, SessionVars};

/// The effective content of an interaction for the current session state.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedContent<'a> {
    /// Selector value read from the session, when a content set matched it.
    pub selector: Option<i64>,
    /// Understanding-stage options.
    pub understanding_check: &'a [ResponseCandidate],
    /// Response-stage options.
    pub detailed_responses: &'a [ResponseCandidate],
    /// Multichoice rows.
    pub multichoice_options: &'a [MultichoiceOption],
    /// Expectations or thresholds.
    pub expectations: Option<&'a Expectations>,
    /// Multichoice column headers.
    pub column_headers: Option<&'a ColumnHeaders>,
}

/// Resolve the active content of `interaction`.
///
/// The first source interaction with a stored last response supplies the
/// selector. A content set keyed by that value overrides the fields it
/// defines; everything else comes from the interaction itself. Nothing is
/// cached, so each call reflects the store as it is now.
pub fn resolve<'a>(interaction: &'a Interaction, vars: &SessionVars<'_>) -> ResolvedContent<'a> {
    let mut resolved = ResolvedContent {
        selector: None,
        understanding_check: &interaction.understanding_check,
        detailed_responses: &interaction.detailed_responses,
        multichoice_options: &interaction.multi_choice_option,
        expectations: interaction.expectations.as_ref(),
        column_headers: interaction.column_headers.as_ref(),
    };

    let Some(selection) = &interaction.content_selection else {
        return resolved;
    };
    let Some(value) = selection
        .from_interaction
        .ids()
        .iter()
        .find_map(|source| vars.last_response(*source))
    else {
        return resolved;
    };
    let Some(set) = interaction.content_sets.get(&value.to_string()) else {
        tracing::debug!(interaction = %interaction.id, selector = value, "no content set for selector");
        return resolved;
    };

    apply_set(&mut resolved, set);
    resolved.selector = Some(value);
    resolved
}

fn apply_set<'a>(resolved: &mut ResolvedContent<'a>, set: &'a ContentSet) {
    if let Some(options) = &set.understanding_check {
        resolved.understanding_check = options;
    }
    if let Some(options) = &set.detailed_responses {
        resolved.detailed_responses = options;
    }
    if let Some(options) = &set.multi_choice_option {
        resolved.multichoice_options = options;
    }
    if let Some(expectations) = &set.expectations {
        resolved.expectations = Some(expectations);
    }
    if let Some(headers) = &set.column_headers {
        resolved.column_headers = Some(headers);
    }
}
