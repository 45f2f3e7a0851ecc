use rh_core::FeedbackTemplate;

/// Join items as prose: `a`, `a and b`, `a, b, and c`.
pub fn format_item_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// Assemble a feedback line from a template and the selected items.
pub fn construct(template: &FeedbackTemplate, items: &[String]) -> String {
    let mut text = template.prefix.clone();
    match items {
        [] => text.push_str(&template.no_items_message),
        [one] => {
            text.push_str(one);
            text.push_str(&template.suffix);
        }
        [a, b] => {
            text.push_str(a);
            text.push_str(&template.separator);
            text.push_str(b);
            text.push_str(&template.suffix);
        }
        [init @ .., last] => {
            text.push_str(&init.join(template.list_separator.as_str()));
            text.push_str(&template.list_final_separator);
            text.push_str(last);
            text.push_str(&template.suffix);
        }
    }
    text
}

/// Substitute `{characterName}`, `{missing_items}` and `{unnecessary_items}`.
pub fn fill_placeholders(
    text: &str,
    learner_name: &str,
    missing: &[String],
    unnecessary: &[String],
) -> String {
    text.replace("{characterName}", learner_name)
        .replace("{missing_items}", &format_item_list(missing))
        .replace("{unnecessary_items}", &format_item_list(unnecessary))
}
