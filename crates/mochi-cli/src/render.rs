//! Plain-text views

use mochi_model::{ChecklistCategory, ChecklistItem, Plan};
use std::fmt::Write;

/// Labels shown per category in the plan list
const PREVIEW_ITEMS: usize = 2;

/// One summary block per plan
#[must_use]
pub fn plan_list(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return "no plans yet\n".to_string();
    }
    let mut out = String::new();
    for plan in plans {
        let _ = writeln!(
            out,
            "{}  {}  {}, {} days, {} items",
            plan.plan_id,
            plan.title,
            plan.start_date,
            plan.days,
            plan.item_count()
        );
        for category in &plan.checklist {
            let _ = writeln!(out, "    {}: {}", category.title, category.preview(PREVIEW_ITEMS));
        }
    }
    out
}

/// Full plan with both checklist columns and the schedule
#[must_use]
pub fn plan_detail(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", plan.title, plan.plan_id);
    let _ = writeln!(
        out,
        "  {} -> {}, from {}, {} days, {}",
        plan.departure, plan.destination, plan.start_date, plan.days, plan.options.visibility
    );
    let _ = writeln!(
        out,
        "  transport: {}, accommodation: {}",
        plan.options.transport_label(),
        plan.options.accommodation_label()
    );
    for category in &plan.checklist {
        out.push('\n');
        category_block(&mut out, category);
    }
    if !plan.schedule.is_empty() {
        out.push_str("\nschedule\n");
        for day in &plan.schedule {
            let _ = writeln!(out, "  day {}", day.day);
            for entry in &day.entries {
                let _ = write!(out, "    {} {}", entry.time, entry.activity);
                if !entry.note.is_empty() {
                    let _ = write!(out, " ({})", entry.note);
                }
                out.push('\n');
            }
        }
    }
    out
}

fn category_block(out: &mut String, category: &ChecklistCategory) {
    let _ = writeln!(out, "{} [{}]", category.title, category.checklist_id);
    for (label, items) in [
        ("essential", category.essential().collect::<Vec<_>>()),
        ("extra", category.extra().collect()),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {label}");
        for item in items {
            let _ = writeln!(out, "    {}", item_line(item));
        }
    }
}

fn item_line(item: &ChecklistItem) -> String {
    let mark = if item.checked { 'x' } else { ' ' };
    format!("[{mark}] {}  ({})", item.label(), item.checklist_item_id)
}
