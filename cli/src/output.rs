//! Console output for a finished run

use colored::Colorize;
use conclave_application::RunGoalOutput;
use conclave_domain::core::string::truncate;
use conclave_domain::{DomainError, SubTask, TaskStatus};
use serde_json::{Value, json};

/// Formats run results for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Task table, artifacts and status counts
    pub fn format_summary(output: &RunGoalOutput) -> String {
        let project = &output.project;
        let mut out = String::new();

        out.push_str(&Self::header("Conclave Results"));
        out.push('\n');
        out.push_str(&format!(
            "{} {} ({})\n",
            "Project:".cyan().bold(),
            project.name,
            project.project_id
        ));
        out.push_str(&format!(
            "{} {:.1}s{}\n",
            "Elapsed:".cyan().bold(),
            output.elapsed.as_secs_f64(),
            if output.finished {
                String::new()
            } else {
                format!(" {}", "(stopped before all tasks finished)".yellow())
            }
        ));

        out.push_str(&Self::section_header("Tasks"));
        for task in project.tasks.values() {
            out.push_str(&Self::task_line(task));
        }

        if !project.artifacts.is_empty() {
            out.push_str(&Self::section_header("Artifacts"));
            for artifact in &project.artifacts {
                out.push_str(&format!("  * {}\n", artifact));
            }
        }

        let counts = project
            .status_counts()
            .iter()
            .map(|(status, n)| format!("{} {}", n, status))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("\n{} {}\n", "Status:".cyan().bold(), counts));
        out
    }

    /// Project record plus run metadata
    pub fn format_json(output: &RunGoalOutput) -> Result<String, DomainError> {
        let value = Self::json_value(output)?;
        Ok(serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string()))
    }

    fn json_value(output: &RunGoalOutput) -> Result<Value, DomainError> {
        Ok(json!({
            "finished": output.finished,
            "elapsed_ms": output.elapsed.as_millis() as u64,
            "project": output.project.to_record()?,
        }))
    }

    fn task_line(task: &SubTask) -> String {
        let status = match task.status {
            TaskStatus::Completed => task.status.as_str().green(),
            TaskStatus::Failed => task.status.as_str().red(),
            TaskStatus::Blocked => task.status.as_str().yellow(),
            _ => task.status.as_str().normal(),
        };
        let mut line = format!(
            "  {:<10} {:<12} {:<20} {}\n",
            task.task_id,
            status,
            task.assigned_agent.as_deref().unwrap_or("-"),
            truncate(&task.description, 60)
        );
        if let Some(error) = task.result.as_ref().and_then(|r| r.error.as_deref()) {
            line.push_str(&format!("  {:<10} {}\n", "", error.red()));
        }
        line
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{ProjectState, TaskResult};
    use std::time::Duration;

    fn output() -> RunGoalOutput {
        let mut project = ProjectState::new("p1", "Orders API", "Build an orders API");
        let mut done = SubTask::new("t1", "Design the schema").with_agent("database_agent");
        done.status = TaskStatus::Completed;
        let mut failed = SubTask::new("t2", "Build endpoints").with_agent("backend_agent");
        failed.status = TaskStatus::Failed;
        failed.result = Some(TaskResult::failure("t2", "Security veto: missing auth"));
        project.add_task(done);
        project.add_task(failed);
        project.add_artifact("schema.sql");

        RunGoalOutput {
            project,
            finished: true,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_summary_lists_tasks_and_errors() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format_summary(&output());

        assert!(text.contains("Orders API (p1)"));
        assert!(text.contains("database_agent"));
        assert!(text.contains("Security veto: missing auth"));
        assert!(text.contains("* schema.sql"));
        assert!(!text.contains("stopped before"));
    }

    #[test]
    fn test_json_output() {
        let text = ConsoleFormatter::format_json(&output()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["finished"], true);
        assert_eq!(value["elapsed_ms"], 1500);
        assert_eq!(value["project"]["project_id"], "p1");
        assert_eq!(value["project"]["tasks"]["t2"]["status"], "failed");
    }
}
