//! Category rules: static mappings from raw tracker strings to canonical
//! phases, issue categories and defect categories.
//!
//! Rules are plain data. They are built once (defaults, or a YAML rules
//! file) and handed to the extractor and timeline reconstructor by
//! reference; nothing mutates them afterwards.

use crate::error::{ReportError, Result};
use crate::model::{IssueCategory, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Status strings per lifecycle phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StatusRules {
    pub pm_backlog: Vec<String>,
    pub eng_backlog: Vec<String>,
    pub development: Vec<String>,
    pub validation: Vec<String>,
    pub done: Vec<String>,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            pm_backlog: strings(&["Backlog", "Ready for Refinement"]),
            eng_backlog: strings(&[
                "Selected for Development",
                "Ready for Dev",
                "Ready for Development",
                "Ready",
                "Ready for Planning",
            ]),
            development: strings(&["In Progress", "Development", "In Development"]),
            validation: strings(&[
                "QA Ready",
                "Code Review",
                "In QA",
                "Merged",
                "Product Acceptance",
                "Passed Integration",
                "GTM",
            ]),
            done: strings(&["Done", "Won't Do"]),
        }
    }
}

/// Issue-type strings per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IssueTypeRules {
    pub planning: Vec<String>,
    pub epic: Vec<String>,
    pub standard: Vec<String>,
    pub testing: Vec<String>,
    pub subtask: Vec<String>,
}

impl Default for IssueTypeRules {
    fn default() -> Self {
        Self {
            planning: strings(&["Theme", "Initiative"]),
            epic: strings(&["Epic"]),
            standard: strings(&[
                "Bug",
                "DevOps Task",
                "Release",
                "Story",
                "Support",
                "Task",
                "Test",
            ]),
            testing: strings(&["Test Execution", "Xray Test", "Test Set", "Test Plan"]),
            subtask: strings(&[
                "Defect",
                "DevOps Sub-task",
                "Integration Tests",
                "Product Acceptance Change",
                "Sub-task",
            ]),
        }
    }
}

/// Complete rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CategoryRules {
    pub statuses: StatusRules,
    pub issue_types: IssueTypeRules,
    /// Status that backfills a missing resolution from the done date.
    pub resolved_status: String,
    /// Status that, without a resolution, drops the ticket from the output.
    pub abandoned_status: String,
    /// Issue type → defect category.
    pub defect_categories: BTreeMap<String, String>,
    pub default_defect_category: String,
    /// Overrides the defect category when escaped incidents are linked.
    pub incident_defect_category: String,
}

impl Default for CategoryRules {
    fn default() -> Self {
        let defect_categories = [
            ("Bug", "Escaped Defect"),
            ("Defect", "Internal Identified Defect"),
            ("Product Acceptance Change", "Product Identified Defect"),
            ("Story", "Feature Work"),
            ("Task", "Feature Work"),
            ("Support", "Support Work"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            statuses: StatusRules::default(),
            issue_types: IssueTypeRules::default(),
            resolved_status: "Done".to_string(),
            abandoned_status: "Won't Do".to_string(),
            defect_categories,
            default_defect_category: "Other".to_string(),
            incident_defect_category: "Customer Impacting Defect".to_string(),
        }
    }
}

impl CategoryRules {
    /// Load a rules file. Sections left out keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a status
    /// or issue type is listed under more than one bucket.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ReportError::missing_input(path, "Fix the rules-file setting or remove it")
            } else {
                ReportError::Io(err)
            }
        })?;
        let rules: Self = serde_yaml::from_str(&contents)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject rule sets where one string lands in two buckets.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the duplicated value.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeMap::new();
        for (phase, values) in self.status_buckets() {
            for value in values {
                if let Some(previous) = seen.insert(value.as_str(), phase.as_str()) {
                    return Err(ReportError::validation(
                        "statuses",
                        format!("'{value}' listed under both {previous} and {phase}"),
                    ));
                }
            }
        }

        let mut seen = BTreeMap::new();
        for (category, values) in self.type_buckets() {
            for value in values {
                if let Some(previous) = seen.insert(value.as_str(), category.as_str()) {
                    return Err(ReportError::validation(
                        "issue-types",
                        format!("'{value}' listed under both {previous} and {category}"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Map a status string to its lifecycle phase.
    #[must_use]
    pub fn phase_of(&self, status: &str) -> Option<Phase> {
        self.status_buckets()
            .into_iter()
            .find(|(_, values)| values.iter().any(|value| value == status))
            .map(|(phase, _)| phase)
    }

    /// Map an issue-type string to its category.
    #[must_use]
    pub fn category_of(&self, issue_type: &str) -> Option<IssueCategory> {
        self.type_buckets()
            .into_iter()
            .find(|(_, values)| values.iter().any(|value| value == issue_type))
            .map(|(category, _)| category)
    }

    /// Defect category for an issue type, escalated when incidents escaped.
    #[must_use]
    pub fn defect_category_of(&self, issue_type: &str, incident_count: u32) -> String {
        if incident_count > 0 {
            return self.incident_defect_category.clone();
        }
        self.defect_categories
            .get(issue_type)
            .cloned()
            .unwrap_or_else(|| self.default_defect_category.clone())
    }

    // Latest phase first so a status listed twice resolves to the later phase.
    fn status_buckets(&self) -> [(Phase, &[String]); 5] {
        [
            (Phase::Done, self.statuses.done.as_slice()),
            (Phase::Validation, self.statuses.validation.as_slice()),
            (Phase::Development, self.statuses.development.as_slice()),
            (Phase::EngBacklog, self.statuses.eng_backlog.as_slice()),
            (Phase::PmBacklog, self.statuses.pm_backlog.as_slice()),
        ]
    }

    fn type_buckets(&self) -> [(IssueCategory, &[String]); 5] {
        [
            (IssueCategory::Planning, self.issue_types.planning.as_slice()),
            (IssueCategory::Epic, self.issue_types.epic.as_slice()),
            (IssueCategory::Standard, self.issue_types.standard.as_slice()),
            (IssueCategory::Testing, self.issue_types.testing.as_slice()),
            (IssueCategory::Subtask, self.issue_types.subtask.as_slice()),
        ]
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
