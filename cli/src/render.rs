//! Rendering of plans, live progress and results as text or JSON lines.

use planner_core::api::{ExecutionResult, PlanHandle, PlanHistory, ProgressEvent, ProgressKind};
use serde::Serialize;

/// One line of `--format json` output. Every record is a single compact
/// object tagged by `kind`, so a run reads as JSON lines.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputRecord<'a> {
    Plan { plan: &'a PlanHandle },
    Event { event: &'a ProgressEvent },
    Result { result: &'a ExecutionResult },
    Interrupted { phase: &'static str },
}

pub fn json_line(record: &OutputRecord<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

pub fn plan_preview(plan: &PlanHandle) -> String {
    let mut out = format!("Plan #{} ({})\n", plan.plan_id, plan.status.as_str());
    if plan.steps.is_empty() {
        out.push_str("  (no steps)\n");
    }
    for (idx, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", idx + 1, step));
    }
    out
}

/// One line per streamed event, prefixed with its local time.
pub fn event_line(ev: &ProgressEvent) -> String {
    let time = ev
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S");
    let step = ev
        .step
        .map(|s| format!("step {s}"))
        .unwrap_or_else(|| "plan".to_string());
    let label = match ev.kind {
        ProgressKind::StepStart => "started",
        ProgressKind::StepProgress => "progress",
        ProgressKind::StepComplete => "done",
        ProgressKind::StepError => "error",
        ProgressKind::Generic => "update",
    };
    match ev.summary() {
        Some(text) => format!("[{time}] {step} {label}: {text}"),
        None => format!("[{time}] {step} {label}"),
    }
}

pub fn final_results(result: &ExecutionResult) -> String {
    let mut out = format!("Plan #{} finished\n", result.plan_id);
    for step in &result.results {
        out.push_str(&format!("  {}. {}\n", step.step, step.description));
        if let Some(text) = step.result.as_deref().filter(|t| !t.trim().is_empty()) {
            for line in text.lines() {
                out.push_str(&format!("     {line}\n"));
            }
        }
    }
    out
}

pub fn step_error_notes<'a>(errors: impl Iterator<Item = &'a ProgressEvent>) -> Option<String> {
    let lines: Vec<String> = errors
        .map(|ev| {
            let step = ev.step.map(|s| s.to_string()).unwrap_or_else(|| "?".into());
            format!(
                "  step {}: {}",
                step,
                ev.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "{} step(s) reported errors during execution:\n{}\n",
        lines.len(),
        lines.join("\n")
    ))
}

pub fn history(plans: &[PlanHistory]) -> String {
    if plans.is_empty() {
        return "No plans recorded yet.\n".to_string();
    }
    let mut out = String::new();
    for plan in plans {
        out.push_str(&format!(
            "Plan #{}: {}",
            plan.plan_id,
            plan.prompt.as_deref().unwrap_or("(no prompt)")
        ));
        if let Some(at) = &plan.created_at {
            out.push_str(&format!("  [{at}]"));
        }
        out.push('\n');
        for entry in plan.entries.iter().filter(|e| e.content.prompt.is_none()) {
            let step = entry
                .content
                .step
                .map(|s| format!("{s}. "))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {}{} ({})\n",
                step,
                entry.content.description.as_deref().unwrap_or("-"),
                entry.entry_type
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_core::api::{MemoryContent, MemoryEntry, PlanStatus, StepResult};
    use pretty_assertions::assert_eq;

    #[test]
    fn json_records_are_single_tagged_lines() {
        let plan = PlanHandle {
            plan_id: 1,
            status: PlanStatus::Created,
            steps: vec!["Research".to_string(), "Draft".to_string()],
        };
        let mut ev = ProgressEvent::new(ProgressKind::StepStart, Some(1));
        ev.description = Some("Research\nthe options".to_string());
        let result = ExecutionResult {
            plan_id: 1,
            results: vec![StepResult {
                step: 1,
                description: "Research".to_string(),
                result: Some("done".to_string()),
            }],
        };

        let lines = [
            json_line(&OutputRecord::Plan { plan: &plan }).unwrap(),
            json_line(&OutputRecord::Event { event: &ev }).unwrap(),
            json_line(&OutputRecord::Result { result: &result }).unwrap(),
            json_line(&OutputRecord::Interrupted { phase: "executing" }).unwrap(),
        ];
        let kinds: Vec<String> = lines
            .iter()
            .map(|line| {
                assert!(!line.contains('\n'), "{line}");
                let v: serde_json::Value = serde_json::from_str(line).unwrap();
                v["kind"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(kinds, vec!["plan", "event", "result", "interrupted"]);

        let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v["plan"]["plan_id"], 1);
        assert_eq!(v["plan"]["status"], "created");
        let v: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(v["event"]["type"], "step_start");
        assert_eq!(v["event"]["step"], 1);
    }

    #[test]
    fn preview_numbers_steps() {
        let plan = PlanHandle {
            plan_id: 1,
            status: PlanStatus::Created,
            steps: vec!["Research".to_string(), "Draft".to_string()],
        };
        assert_eq!(
            plan_preview(&plan),
            "Plan #1 (created)\n  1. Research\n  2. Draft\n"
        );
    }

    #[test]
    fn event_line_prefers_error_text_for_step_error() {
        let mut ev = ProgressEvent::new(ProgressKind::StepError, Some(2));
        ev.message = Some("calling search".to_string());
        ev.error = Some("search tool down".to_string());
        let line = event_line(&ev);
        assert!(line.ends_with("step 2 error: search tool down"), "{line}");

        let generic = ProgressEvent::new(ProgressKind::Generic, None);
        assert!(event_line(&generic).ends_with("plan update"));
    }

    #[test]
    fn final_results_indent_multiline_output() {
        let result = ExecutionResult {
            plan_id: 3,
            results: vec![
                StepResult {
                    step: 1,
                    description: "Research".to_string(),
                    result: Some("found 3 sources\nsummarized".to_string()),
                },
                StepResult {
                    step: 2,
                    description: "Draft".to_string(),
                    result: None,
                },
            ],
        };
        assert_eq!(
            final_results(&result),
            "Plan #3 finished\n  1. Research\n     found 3 sources\n     summarized\n  2. Draft\n"
        );
    }

    #[test]
    fn step_error_notes_only_when_present() {
        assert_eq!(step_error_notes(std::iter::empty()), None);

        let mut ev = ProgressEvent::new(ProgressKind::StepError, Some(1));
        ev.error = Some("timeout".to_string());
        assert_eq!(
            step_error_notes([&ev].into_iter()).as_deref(),
            Some("1 step(s) reported errors during execution:\n  step 1: timeout\n")
        );
    }

    #[test]
    fn history_lists_plan_then_steps() {
        let plans = vec![PlanHistory {
            plan_id: 4,
            prompt: Some("organize my week".to_string()),
            created_at: Some("2024-05-01T10:00:00".to_string()),
            entries: vec![
                MemoryEntry {
                    id: 1,
                    entry_type: "plan".to_string(),
                    content: MemoryContent {
                        plan_id: Some(4),
                        prompt: Some("organize my week".to_string()),
                        ..Default::default()
                    },
                    created_at: Some("2024-05-01T10:00:00".to_string()),
                },
                MemoryEntry {
                    id: 2,
                    entry_type: "step_result".to_string(),
                    content: MemoryContent {
                        plan_id: Some(4),
                        step: Some(1),
                        description: Some("Research".to_string()),
                        ..Default::default()
                    },
                    created_at: None,
                },
            ],
        }];
        assert_eq!(
            history(&plans),
            "Plan #4: organize my week  [2024-05-01T10:00:00]\n  1. Research (step_result)\n"
        );
        assert_eq!(history(&[]), "No plans recorded yet.\n");
    }
}
