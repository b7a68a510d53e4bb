//! Service contract for issue sources
//!
//! Every source of tasks implements [`IssueService`]; its issues implement
//! [`Issue`]. The shared behavior (assignment filtering, label tags, the
//! default description) lives here so services only do the mapping.

use crate::config::FlatasticConfig;
use crate::taskwarrior::{Priority, TaskRecord, UdaDefinition, UdaValue};
use crate::Result;
use async_trait::async_trait;
use minijinja::{context, Environment};

/// Marker that starts every generated description
pub const DESCRIPTION_MARKUP: &str = "(bw)";

/// Lazily normalized, already filtered issues
///
/// Borrows the service so the filter can go through [`IssueService::include`].
pub type IssueIter<'a, I> = Box<dyn Iterator<Item = Result<I>> + Send + 'a>;

/// Settings a service hands to the shared issue helpers
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMetadata {
    pub import_labels_as_tags: bool,
    pub label_template: String,
    pub only_if_assigned: Option<String>,
    pub also_unassigned: bool,
    pub default_priority: Priority,
    pub add_tags: Vec<String>,
    pub description_length: Option<usize>,
}

impl Default for ServiceMetadata {
    fn default() -> Self {
        Self {
            import_labels_as_tags: false,
            label_template: "{{label}}".to_string(),
            only_if_assigned: None,
            also_unassigned: false,
            default_priority: Priority::default(),
            add_tags: Vec::new(),
            description_length: None,
        }
    }
}

impl From<&FlatasticConfig> for ServiceMetadata {
    fn from(config: &FlatasticConfig) -> Self {
        Self {
            import_labels_as_tags: config.import_labels_as_tags,
            label_template: config.label_template.clone(),
            only_if_assigned: config.only_if_assigned.clone(),
            also_unassigned: config.also_unassigned,
            default_priority: config.default_priority,
            add_tags: config.add_tags.clone(),
            description_length: config.description_length,
        }
    }
}

impl ServiceMetadata {
    /// Whether an issue with this owner passes the assignment filter
    pub fn includes_owner(&self, owner: Option<&str>) -> bool {
        match (&self.only_if_assigned, owner) {
            (None, _) => true,
            (Some(wanted), Some(owner)) => wanted == owner,
            (Some(_), None) => self.also_unassigned,
        }
    }

    /// Turn service labels into tags, then append the configured extra tags
    pub fn tags_from_labels(&self, labels: &[String]) -> Result<Vec<String>> {
        let mut tags = Vec::new();

        if self.import_labels_as_tags && !labels.is_empty() {
            let env = Environment::new();
            let template = env.template_from_str(&self.label_template)?;
            for label in labels {
                let tag = template.render(context! { label => label })?;
                // taskwarrior tags cannot contain spaces
                tags.push(tag.replace(' ', "_"));
            }
        }

        tags.extend(self.add_tags.iter().cloned());
        Ok(tags)
    }

    /// Build the standard task description
    ///
    /// `(bw)Is#<number> - <title>`, followed by ` .. <url>` when a URL is
    /// given. The title is cut to `description_length` characters.
    pub fn build_default_description(&self, title: &str, url: &str, number: &str) -> String {
        let title: String = match self.description_length {
            Some(len) => title.chars().take(len).collect(),
            None => title.to_string(),
        };
        let link = if url.is_empty() {
            String::new()
        } else {
            format!(" .. {}", url)
        };
        format!("{}Is#{} - {}{}", DESCRIPTION_MARKUP, number, title, link)
    }
}

/// A normalized issue coming from an external service
pub trait Issue {
    /// UDA names that together identify the issue across runs
    const UNIQUE_KEY: &'static [&'static str];

    /// UDAs this issue type attaches to its tasks
    fn udas() -> &'static [UdaDefinition];

    /// Convert to a taskwarrior task
    fn to_taskwarrior(&self) -> TaskRecord;

    /// Value of a single UDA
    ///
    /// The default builds the whole task; issue types with many UDAs should
    /// look the field up directly.
    fn uda(&self, name: &str) -> Option<UdaValue> {
        self.to_taskwarrior().udas.remove(name)
    }

    /// Values of the unique key fields, in key order
    fn unique_key(&self) -> Vec<String> {
        Self::UNIQUE_KEY
            .iter()
            .map(|name| match self.uda(name) {
                Some(UdaValue::Numeric(n)) => n.to_string(),
                Some(UdaValue::String(s)) => s,
                Some(UdaValue::Date(d)) => d.to_rfc3339(),
                None => String::new(),
            })
            .collect()
    }
}

/// A source of issues
#[async_trait]
pub trait IssueService: Send + Sync {
    type Issue: Issue + Send + 'static;

    /// Short service name used in logs and UDA headers
    fn name(&self) -> &'static str;

    /// Settings that drive filtering, tagging and descriptions
    fn service_metadata(&self) -> &ServiceMetadata;

    /// Who the issue is assigned to, if anyone
    fn issue_owner(&self, issue: &Self::Issue) -> Option<String>;

    /// Fetch from the service and yield the included issues in source order
    async fn produce_issues<'a>(&'a self) -> Result<IssueIter<'a, Self::Issue>>;

    /// Assignment filter applied to every produced issue
    fn include(&self, issue: &Self::Issue) -> bool {
        self.service_metadata()
            .includes_owner(self.issue_owner(issue).as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_without_filter() {
        let metadata = ServiceMetadata::default();
        assert!(metadata.includes_owner(Some("7")));
        assert!(metadata.includes_owner(None));
    }

    #[test]
    fn test_include_only_if_assigned() {
        let metadata = ServiceMetadata {
            only_if_assigned: Some("7".to_string()),
            ..Default::default()
        };
        assert!(metadata.includes_owner(Some("7")));
        assert!(!metadata.includes_owner(Some("8")));
        assert!(!metadata.includes_owner(None));
    }

    #[test]
    fn test_include_also_unassigned() {
        let metadata = ServiceMetadata {
            only_if_assigned: Some("7".to_string()),
            also_unassigned: true,
            ..Default::default()
        };
        assert!(metadata.includes_owner(None));
        assert!(!metadata.includes_owner(Some("8")));
    }

    #[test]
    fn test_tags_ignore_labels_unless_enabled() {
        let metadata = ServiceMetadata {
            add_tags: vec!["chores".to_string()],
            ..Default::default()
        };
        let tags = metadata
            .tags_from_labels(&["kitchen".to_string()])
            .unwrap();
        assert_eq!(tags, vec!["chores"]);
    }

    #[test]
    fn test_tags_from_labels_with_template() {
        let metadata = ServiceMetadata {
            import_labels_as_tags: true,
            label_template: "flat_{{label|lower}}".to_string(),
            ..Default::default()
        };
        let tags = metadata
            .tags_from_labels(&["Kitchen".to_string(), "Living Room".to_string()])
            .unwrap();
        assert_eq!(tags, vec!["flat_kitchen", "flat_living_room"]);
    }

    #[test]
    fn test_tags_from_no_labels() {
        let metadata = ServiceMetadata::default();
        assert!(metadata.tags_from_labels(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_default_description() {
        let metadata = ServiceMetadata::default();
        assert_eq!(
            metadata.build_default_description("Dishes", "", ""),
            "(bw)Is# - Dishes"
        );
        assert_eq!(
            metadata.build_default_description("Dishes", "https://example.com/1", "1"),
            "(bw)Is#1 - Dishes .. https://example.com/1"
        );
    }

    #[test]
    fn test_default_description_truncates_title() {
        let metadata = ServiceMetadata {
            description_length: Some(4),
            ..Default::default()
        };
        assert_eq!(
            metadata.build_default_description("Vacuum the stairs", "", ""),
            "(bw)Is# - Vacu"
        );
    }
}
