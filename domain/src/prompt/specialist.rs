//! Action catalogue and prompts for the prompt-driven specialists.
//!
//! Every specialization answers `execute_task`; the table below adds the
//! kind-specific action types. Research and Security have their own
//! behaviour in the application layer and only use the shared prompts here.
//!
//! | Kind | Action types |
//! |------|--------------|
//! | Frontend | generate_component, generate_page, improve_accessibility |
//! | Backend | design_api, generate_endpoint, design_schema, generate_migration |
//! | Requirements | analyze_requirements, generate_user_stories, create_specifications |
//! | Database | design_schema, generate_queries, create_migrations, optimize_schema |
//! | Testing | generate_unit_tests, generate_integration_tests, generate_e2e_tests, analyze_coverage |

use crate::agent::AgentKind;
use serde_json::{Map, Value};

/// The generic action every specialist accepts
pub const EXECUTE_TASK: &str = "execute_task";

/// One action a specialist can perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialistAction {
    pub action_type: &'static str,
    /// What the model is asked to produce
    pub instruction: &'static str,
    pub temperature: f64,
}

const fn action(
    action_type: &'static str,
    instruction: &'static str,
    temperature: f64,
) -> SpecialistAction {
    SpecialistAction {
        action_type,
        instruction,
        temperature,
    }
}

const FRONTEND: &[SpecialistAction] = &[
    action(
        "generate_component",
        "Generate a UI component. Provide the complete component code, its styles, the props interface and the accessibility features added.",
        0.7,
    ),
    action(
        "generate_page",
        "Compose a page from components. Provide the page code, the components it uses and the shared styles.",
        0.7,
    ),
    action(
        "improve_accessibility",
        "Improve the accessibility of the given code to WCAG 2.1 AA. Return the revised code and a list of the changes made.",
        0.3,
    ),
];

const BACKEND: &[SpecialistAction] = &[
    action(
        "design_api",
        "Design an API. Provide all endpoints (CRUD and custom actions), request/response schemas, authentication requirements and rate limits if applicable.",
        0.5,
    ),
    action(
        "generate_endpoint",
        "Generate the code for this endpoint including validation, error handling and authentication.",
        0.4,
    ),
    action(
        "design_schema",
        "Design the data models for this backend: entities, fields with types, relationships and indexes.",
        0.3,
    ),
    action(
        "generate_migration",
        "Generate a migration for the given model, with upgrade and downgrade steps.",
        0.2,
    ),
];

const REQUIREMENTS: &[SpecialistAction] = &[
    action(
        "analyze_requirements",
        "Extract structured requirements: functional requirements, non-functional requirements, constraints, assumptions and open questions.",
        0.3,
    ),
    action(
        "generate_user_stories",
        "Generate user stories (As a ... I want ... so that ...) with acceptance criteria and priority.",
        0.3,
    ),
    action(
        "create_specifications",
        "Create a technical specification: architecture overview, components, data model, interfaces and non-functional targets.",
        0.3,
    ),
];

const DATABASE: &[SpecialistAction] = &[
    action(
        "design_schema",
        "Design a complete database schema: tables, columns with types, keys, relationships, indexes and the DDL.",
        0.3,
    ),
    action(
        "generate_queries",
        "Generate SQL queries for the given schema and operations, parameterized and with the indexes they rely on.",
        0.3,
    ),
    action(
        "create_migrations",
        "Create migration scripts from the current to the target schema, including rollback.",
        0.3,
    ),
    action(
        "optimize_schema",
        "Analyze and optimize this schema: indexing, normalization, query hot spots, with the revised DDL.",
        0.3,
    ),
];

const TESTING: &[SpecialistAction] = &[
    action(
        "generate_unit_tests",
        "Generate unit tests covering the happy path, edge cases, error cases and boundary conditions, following Arrange/Act/Assert.",
        0.3,
    ),
    action(
        "generate_integration_tests",
        "Generate integration tests for the given components and API, including setup and teardown of shared resources.",
        0.3,
    ),
    action(
        "generate_e2e_tests",
        "Generate end-to-end tests for the given user flows.",
        0.3,
    ),
    action(
        "analyze_coverage",
        "Analyze test coverage of the given code and existing tests; list untested paths and the tests that would cover them.",
        0.3,
    ),
];

/// Generic task execution, shared by every kind
const EXECUTE: SpecialistAction = action(
    EXECUTE_TASK,
    "Carry out this task within your role. Produce the concrete deliverable (code, schema, document or analysis), not a plan for it.",
    0.4,
);

/// Templates for specialist action prompts
pub struct SpecialistPromptTemplate;

impl SpecialistPromptTemplate {
    /// Kind-specific actions (excluding `execute_task`)
    pub fn actions(kind: AgentKind) -> &'static [SpecialistAction] {
        match kind {
            AgentKind::Frontend => FRONTEND,
            AgentKind::Backend => BACKEND,
            AgentKind::Requirements => REQUIREMENTS,
            AgentKind::Database => DATABASE,
            AgentKind::Testing => TESTING,
            AgentKind::Research | AgentKind::Security => &[],
        }
    }

    /// Look up an action type for a kind, including `execute_task`
    pub fn find(kind: AgentKind, action_type: &str) -> Option<SpecialistAction> {
        if action_type == EXECUTE_TASK {
            return Some(EXECUTE);
        }
        Self::actions(kind)
            .iter()
            .find(|a| a.action_type == action_type)
            .copied()
    }

    /// User prompt for an action with its description and parameters
    pub fn action_prompt(
        action: &SpecialistAction,
        description: &str,
        parameters: &Map<String, Value>,
    ) -> String {
        let mut prompt = format!("{}\n\nTask:\n{}\n", action.instruction, description);

        let params = parameters
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "task_id" | "project_id" | "description"))
            .map(|(k, v)| match v {
                Value::String(s) => format!("- {}: {}", k, s),
                other => format!("- {}: {}", k, other),
            })
            .collect::<Vec<_>>();
        if !params.is_empty() {
            prompt.push_str(&format!("\nInputs:\n{}\n", params.join("\n")));
        }

        prompt.push_str("\nPut any code in fenced code blocks tagged with their language.");
        prompt
    }
}
