//! Starting content for new documents. Bracket prompts such as `[Name]` are
//! deliberate: the gates refuse to advance while they remain.

use crate::types::IssueType;

pub const OWNER_PROMPT: &str = "[Name]";

const DEFINITION_OF_DONE: &str = "## Definition of Done
- [ ] All specs completed
- [ ] Technical guidance reflects the final implementation
- [ ] Tests written and passing
- [ ] Reviewed and merged
";

/// Main document for a new issue.
pub fn issue_document(issue_type: IssueType, title: &str, owner: Option<&str>, created: &str) -> String {
    let owner = owner.unwrap_or(OWNER_PROMPT);
    let header = format!(
        "# {kind}: {title}\n\n**Owner:** {owner}\n**Created:** {created}\n\n",
        kind = heading_kind(issue_type),
    );
    match issue_type {
        IssueType::Feature => format!(
            "---\ndiscovery_phase: not_started\n---\n{header}## Description\n[Describe the feature and the value it delivers]\n\n{discovery}\n{DEFINITION_OF_DONE}",
            discovery = discovery_sections(title),
        ),
        IssueType::Bug => format!(
            "{header}## Description\n[Describe the defect]\n\n## Steps to Reproduce\n1. [First step]\n\n## Expected Behavior\n[What should happen]\n\n## Actual Behavior\n[What happens instead]\n\n{DEFINITION_OF_DONE}"
        ),
        IssueType::Task => format!(
            "{header}## Description\n[Describe the work to be done]\n\n{DEFINITION_OF_DONE}"
        ),
    }
}

fn heading_kind(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::Feature => "Feature",
        IssueType::Bug => "Bug",
        IssueType::Task => "Task",
    }
}

fn discovery_sections(title: &str) -> String {
    format!(
        "## Discovery

### User Persona
[Who is this for and what are they trying to get done?]

### Problem Statement
[What hurts today, and how do we know?]

### Scenarios
```gherkin
Feature: {title}

  Scenario: [Happy path]
    Given [starting context]
    When [the user acts]
    Then [the observable outcome]
```

### Out of Scope
- [What this feature will not do]

### Assumptions
- [What we are taking for granted]
"
    )
}

/// New `<name>.spec.md`.
pub fn spec_document(title: &str, created: &str, dependencies: &[String]) -> String {
    format!(
        "---\nstatus: pending\ncreated: {created}\ncompleted:\ndependencies: [{deps}]\n---\n# Spec: {title}\n\n## Goal\n[What this spec delivers]\n\n## Acceptance Criteria\n- [ ] [Criterion]\n",
        deps = dependencies.join(", "),
    )
}

/// New `technical-guidance.md`.
pub fn guidance_document(issue_title: &str, last_updated: &str) -> String {
    format!(
        "---\nlast-updated: {last_updated}\nstatus: draft\n---\n# Technical Guidance: {issue_title}\n\n## Approach\n\n## Investigation Log\n\n## Open Questions\n\n## Decisions\n"
    )
}
