//! BDD validator for a feature's discovery sections.
//!
//! Pure text analysis over the main document. Two kinds of problems are
//! reported separately: format errors (something structurally missing or
//! still a template prompt) and completeness errors (present but too thin).

use crate::config::Config;
use crate::markdown::{self, Section};
use serde::Serialize;

const PERSONA: &str = "User Persona";
const PROBLEM: &str = "Problem Statement";
const SCENARIOS: &str = "Scenarios";
const OUT_OF_SCOPE: &str = "Out of Scope";
const ASSUMPTIONS: &str = "Assumptions";

const STEP_KEYWORDS: &[&str] = &["Given", "When", "Then"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BddReport {
    pub valid: bool,
    pub format_errors: Vec<String>,
    pub completeness_errors: Vec<String>,
    pub has_persona: bool,
    pub has_problem_statement: bool,
    pub has_scenarios: bool,
    pub has_out_of_scope: bool,
    pub has_assumptions: bool,
    pub scenario_count: usize,
}

impl BddReport {
    /// Every problem, format errors first.
    pub fn errors(&self) -> Vec<String> {
        self.format_errors
            .iter()
            .chain(&self.completeness_errors)
            .cloned()
            .collect()
    }
}

/// One `Scenario:` / `Scenario Outline:` / `Example:` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub outline: bool,
    /// Given/When/Then lines, not counting And/But continuations.
    pub steps: usize,
}

/// Scenarios in a gherkin block. `Background:` steps and `Examples:` tables
/// belong to no scenario.
pub fn parse_scenarios(gherkin: &str) -> Vec<Scenario> {
    let mut scenarios: Vec<Scenario> = Vec::new();
    let mut in_scenario = false;
    for line in gherkin.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
            continue;
        }
        if let Some(name) = line.strip_prefix("Scenario Outline:") {
            scenarios.push(Scenario {
                name: name.trim().to_string(),
                outline: true,
                steps: 0,
            });
            in_scenario = true;
        } else if let Some(name) = line
            .strip_prefix("Scenario:")
            .or_else(|| line.strip_prefix("Example:"))
        {
            scenarios.push(Scenario {
                name: name.trim().to_string(),
                outline: false,
                steps: 0,
            });
            in_scenario = true;
        } else if line.starts_with("Background:")
            || line.starts_with("Examples:")
            || line.starts_with("Feature:")
            || line.starts_with("Rule:")
        {
            in_scenario = false;
        } else if in_scenario && starts_with_keyword(line, STEP_KEYWORDS) {
            if let Some(current) = scenarios.last_mut() {
                current.steps += 1;
            }
        }
    }
    scenarios
}

fn starts_with_keyword(line: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| {
        line.strip_prefix(k)
            .is_some_and(|rest| rest.starts_with([' ', '\t']))
    })
}

/// Gherkin-tagged fenced blocks in the Scenarios section, joined.
fn gherkin_source(section: &Section) -> Option<String> {
    let blocks: Vec<String> = markdown::code_blocks(&section.body)
        .into_iter()
        .filter(|b| b.info == "gherkin" || b.info == "feature")
        .map(|b| b.content)
        .collect();
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

fn has_prose(section: &Section) -> bool {
    !markdown::prose_lines(&section.body).is_empty()
}

pub fn validate(text: &str, config: &Config) -> BddReport {
    let mut report = BddReport::default();
    let body = crate::frontmatter::body(text);

    let persona = markdown::section(body, PERSONA);
    let problem = markdown::section(body, PROBLEM);
    let scenarios_section = markdown::section(body, SCENARIOS);
    let out_of_scope = markdown::section(body, OUT_OF_SCOPE);
    let assumptions = markdown::section(body, ASSUMPTIONS);
    let gherkin = scenarios_section.as_ref().and_then(gherkin_source);

    report.has_persona = persona.is_some();
    report.has_problem_statement = problem.is_some();
    report.has_scenarios = gherkin.is_some();
    report.has_out_of_scope = out_of_scope.is_some();
    report.has_assumptions = assumptions.is_some();

    for (name, section) in [(PERSONA, &persona), (PROBLEM, &problem)] {
        match section {
            None => report.format_errors.push(format!("missing '{name}' section")),
            Some(s) if !has_prose(s) => report
                .completeness_errors
                .push(format!("'{name}' section is empty")),
            Some(_) => {}
        }
    }

    match (&scenarios_section, &gherkin) {
        (None, _) => report
            .format_errors
            .push(format!("missing '{SCENARIOS}' section")),
        (Some(_), None) => report
            .format_errors
            .push(format!("'{SCENARIOS}' section has no ```gherkin block")),
        (Some(_), Some(source)) => {
            let scenarios = parse_scenarios(source);
            report.scenario_count = scenarios.len();
            for (i, scenario) in scenarios.iter().enumerate() {
                if scenario.steps == 0 {
                    let label = if scenario.name.is_empty() {
                        format!("#{}", i + 1)
                    } else {
                        format!("'{}'", scenario.name)
                    };
                    report
                        .format_errors
                        .push(format!("scenario {label} has no Given/When/Then steps"));
                }
            }
            if scenarios.len() < config.min_scenarios {
                report.completeness_errors.push(format!(
                    "{} scenario(s) written, at least {} required",
                    scenarios.len(),
                    config.min_scenarios
                ));
            }
        }
    }

    for (name, section) in [(OUT_OF_SCOPE, &out_of_scope), (ASSUMPTIONS, &assumptions)] {
        match section {
            None => report.format_errors.push(format!("missing '{name}' section")),
            Some(s) if markdown::list_items(&s.body).is_empty() => report
                .completeness_errors
                .push(format!("'{name}' section has no list items")),
            Some(_) => {}
        }
    }

    let region: Vec<&str> = [&persona, &problem, &scenarios_section, &out_of_scope, &assumptions]
        .into_iter()
        .flatten()
        .map(|s| s.body.as_str())
        .collect();
    let placeholders = markdown::find_placeholders(&region.join("\n"), &config.placeholder_tokens);
    if !placeholders.is_empty() {
        report.format_errors.push(format!(
            "unfilled placeholders: {}",
            placeholders.join(", ")
        ));
    }

    report.valid = report.format_errors.is_empty() && report.completeness_errors.is_empty();
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;
    use crate::types::IssueType;

    pub(crate) const COMPLETE: &str = "# Feature: Export

## Discovery

### User Persona
A finance analyst closing the month.

### Problem Statement
Reports are copied into spreadsheets by hand.

### Scenarios
```gherkin
Feature: Export

  Background:
    Given I am signed in

  Scenario: Export a report
    Given a report with rows
    When I export it as CSV
    Then a file downloads

  Scenario Outline: Reject empty reports
    Given a report with <rows> rows
    When I export it
    Then I see \"<message>\"

    Examples:
      | rows | message |
      | 0    | nothing to export |
```

### Out of Scope
- PDF export

### Assumptions
- Reports fit in memory
";

    #[test]
    fn complete_document_is_valid() {
        let report = validate(COMPLETE, &Config::default());
        assert!(report.valid, "{:?}", report.errors());
        assert_eq!(report.scenario_count, 2);
        assert!(report.has_persona && report.has_problem_statement);
        assert!(report.has_out_of_scope && report.has_assumptions);
    }

    #[test]
    fn fresh_template_is_rejected() {
        let doc = templates::issue_document(IssueType::Feature, "Export", None, "2026-10-17");
        let report = validate(&doc, &Config::default());
        assert!(!report.valid);
        assert_eq!(report.scenario_count, 1);
        assert!(report.format_errors.iter().any(|e| e.contains("placeholders")));
        assert!(report
            .completeness_errors
            .iter()
            .any(|e| e.contains("at least 2 required")));
    }

    #[test]
    fn missing_sections_are_format_errors() {
        let report = validate("# Feature: Empty\n", &Config::default());
        assert!(!report.valid);
        assert_eq!(report.format_errors.len(), 5);
        assert!(report.completeness_errors.is_empty());
    }

    #[test]
    fn empty_sections_are_completeness_errors() {
        let text = COMPLETE
            .replace("A finance analyst closing the month.\n", "")
            .replace("- PDF export\n", "");
        let report = validate(&text, &Config::default());
        assert!(report.format_errors.is_empty(), "{:?}", report.format_errors);
        assert_eq!(
            report.completeness_errors,
            vec![
                "'User Persona' section is empty".to_string(),
                "'Out of Scope' section has no list items".to_string(),
            ]
        );
    }

    #[test]
    fn zero_step_scenario_is_malformed() {
        let text = COMPLETE.replace(
            "  Scenario: Export a report\n    Given a report with rows\n    When I export it as CSV\n    Then a file downloads\n",
            "  Scenario: Export a report\n",
        );
        let report = validate(&text, &Config::default());
        assert!(report
            .format_errors
            .contains(&"scenario 'Export a report' has no Given/When/Then steps".to_string()));
    }

    #[test]
    fn configured_tokens_count_as_placeholders() {
        let text = COMPLETE.replace("PDF export", "TBD");
        let report = validate(&text, &Config::default());
        assert_eq!(report.format_errors, vec!["unfilled placeholders: TBD".to_string()]);
    }

    #[test]
    fn min_scenarios_is_configurable() {
        let cfg = Config {
            min_scenarios: 3,
            ..Config::default()
        };
        assert!(!validate(COMPLETE, &cfg).valid);
    }

    #[test]
    fn background_steps_belong_to_no_scenario() {
        let scenarios = parse_scenarios(
            "Background:\n  Given setup\nScenario: a\n  Given x\n  And y\n  Then z\n",
        );
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].steps, 2);
        assert!(!scenarios[0].outline);
    }

    #[test]
    fn title_mentioning_a_section_does_not_stand_in_for_it() {
        let text = COMPLETE
            .replace("# Feature: Export", "# Feature: User persona import")
            .replace("A finance analyst closing the month.\n", "");
        let report = validate(&text, &Config::default());
        assert!(!report.valid);
        assert!(report
            .completeness_errors
            .contains(&"'User Persona' section is empty".to_string()));
    }

    #[test]
    fn gherkin_outside_scenarios_section_is_ignored() {
        let scenarios = COMPLETE
            .split("### Scenarios\n")
            .nth(1)
            .and_then(|rest| rest.split("### Out of Scope").next())
            .unwrap();
        let text = COMPLETE
            .replace(scenarios, "Still thinking.\n\n")
            .replace("## Discovery", &format!("## Description\n{scenarios}\n## Discovery"));
        let report = validate(&text, &Config::default());
        assert!(!report.has_scenarios);
        assert!(report
            .format_errors
            .contains(&"'Scenarios' section has no ```gherkin block".to_string()));
    }

    #[test]
    fn gherkin_inside_longer_fence_is_not_a_block() {
        let text = COMPLETE.replace("```gherkin", "````markdown\n```gherkin").replace(
            "```\n\n### Out of Scope",
            "```\n````\n\n### Out of Scope",
        );
        let report = validate(&text, &Config::default());
        assert!(!report.has_scenarios);
    }
}
