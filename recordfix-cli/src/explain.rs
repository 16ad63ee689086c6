//! Text rendering for `recordfix explain` and `recordfix list-rules`.

use recordfix_domain::{RULES, RemediationRule};
use recordfix_types::action::ActionType;
use serde_json::{Value, json};
use std::fmt::Write;

const RULE: &str =
    "================================================================================";
const SECTION: &str =
    "--------------------------------------------------------------------------------";

/// What an action type does to the store.
pub fn action_meaning(action: ActionType) -> &'static str {
    match action {
        ActionType::Update | ActionType::Create => {
            "UPDATE actions overwrite specific fields. Prior values are captured\n\
             before the write and can be restored with `recordfix rollback`."
        }
        ActionType::Nullify => {
            "NULLIFY actions clear a dangling reference. The prior value is captured\n\
             and can be restored with `recordfix rollback`."
        }
        ActionType::Delete => {
            "DELETE actions remove rows outright. They are irreversible and always\n\
             require a backup before `recordfix apply --apply`."
        }
        ActionType::Recalculate => {
            "RECALCULATE actions recompute a cached aggregate from source rows.\n\
             The prior cached value is captured for rollback."
        }
        ActionType::QueueSync => {
            "QUEUE_SYNC actions only add a request to `sync_queue`; no existing\n\
             row is modified."
        }
    }
}

/// Full explanation of one rule.
pub fn render_explanation(rule: &RemediationRule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "RULE: {}", rule.title);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);
    let _ = writeln!(out, "Key:         {}", rule.key);
    let _ = writeln!(out, "Issue type:  {}", rule.issue_type);
    let _ = writeln!(out, "Action:      {}", rule.action_type);
    let _ = writeln!(out, "Confidence:  {}", rule.base_confidence);
    let _ = writeln!(out, "Result label: {}", rule.label);
    let _ = writeln!(out);

    section(&mut out, "DESCRIPTION", rule.description);
    section(
        &mut out,
        &format!("ACTION: {}", rule.action_type.as_str().to_uppercase()),
        action_meaning(rule.action_type),
    );
    section(&mut out, "SAFETY RATIONALE", rule.safety_rationale);
    section(&mut out, "REMEDIATION GUIDANCE", rule.remediation);
    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", SECTION);
    let _ = writeln!(out, "{}", body);
    let _ = writeln!(out);
}

/// Tabular listing of every rule.
pub fn render_rule_table() -> String {
    let mut out = String::from("Available rules:\n\n");
    let _ = writeln!(out, "  {:<22} {:<12} {:>4}  TITLE", "KEY", "ACTION", "CONF");
    let _ = writeln!(out, "  {:<22} {:<12} {:>4}  -----", "---", "------", "----");
    for rule in RULES {
        let _ = writeln!(
            out,
            "  {:<22} {:<12} {:>4}  {}",
            rule.key,
            rule.action_type.as_str(),
            rule.base_confidence,
            rule.title
        );
    }
    out.push_str("\nUse 'recordfix explain <key>' for details.\n");
    out
}

pub fn rules_json() -> Value {
    RULES
        .iter()
        .map(|r| {
            json!({
                "key": r.key,
                "kind": r.kind,
                "title": r.title,
                "issue_type": r.issue_type.as_str(),
                "action_type": r.action_type.as_str(),
                "base_confidence": r.base_confidence,
                "label": r.label,
            })
        })
        .collect()
}
