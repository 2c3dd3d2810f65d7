//! Class-related models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, reusable project template
///
/// `folders` and `files` map a target path (relative to the project root) to
/// an optional template source; `None` means an empty folder or file is
/// created at the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    /// Assigned by the store on first save
    pub id: Option<i64>,
    pub name: String,
    pub labels: Vec<String>,
    pub folders: BTreeMap<String, Option<String>>,
    pub files: BTreeMap<String, Option<String>>,
    pub scripts: Vec<Script>,
}

/// A setup script run after a class has been materialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub name: String,
    pub run_as_sudo: bool,
}

impl Script {
    pub fn new(name: impl Into<String>, run_as_sudo: bool) -> Self {
        Self {
            name: name.into(),
            run_as_sudo,
        }
    }
}

/// Canonical form of a class name or label as the store keeps it
pub fn canonical_key(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_folder(mut self, target: impl Into<String>, template: Option<&str>) -> Self {
        self.folders
            .insert(target.into(), template.map(str::to_string));
        self
    }

    pub fn with_file(mut self, target: impl Into<String>, template: Option<&str>) -> Self {
        self.files.insert(target.into(), template.map(str::to_string));
        self
    }

    pub fn with_script(mut self, name: impl Into<String>, run_as_sudo: bool) -> Self {
        self.scripts.push(Script::new(name, run_as_sudo));
        self
    }

    /// Bring the class into the shape the store returns it in
    ///
    /// Name and labels are trimmed and lower-cased, labels sorted, scripts ordered by
    /// elevation then name. Empty template references become `None`.
    pub fn normalize(&mut self) {
        self.name = canonical_key(&self.name);

        for label in &mut self.labels {
            *label = canonical_key(label);
        }
        self.labels.sort();

        for template in self.folders.values_mut().chain(self.files.values_mut()) {
            if template.as_deref().is_some_and(str::is_empty) {
                *template = None;
            }
        }

        self.scripts
            .sort_by(|a, b| (a.run_as_sudo, &a.name).cmp(&(b.run_as_sudo, &b.name)));
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_orders_labels_and_scripts() {
        let class = Class::new("Rust")
            .with_label("Zeta")
            .with_label("alpha")
            .with_label("mike")
            .with_script("setup.sh", true)
            .with_script("init.sh", false)
            .with_script("build.sh", true)
            .normalized();

        assert_eq!(class.name, "rust");
        assert_eq!(class.labels, vec!["alpha", "mike", "zeta"]);
        let scripts: Vec<&str> = class.scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(scripts, vec!["init.sh", "build.sh", "setup.sh"]);
    }

    #[test]
    fn test_normalize_turns_empty_template_into_none() {
        let class = Class::new("c")
            .with_folder("src", Some(""))
            .with_file("README.md", Some("templates/readme.md"))
            .normalized();

        assert_eq!(class.folders.get("src"), Some(&None));
        assert_eq!(
            class.files.get("README.md"),
            Some(&Some("templates/readme.md".to_string()))
        );
    }

    #[test]
    fn test_normalize_trims_name_and_labels() {
        let class = Class::new("  Rust ").with_label(" CLI").normalized();
        assert_eq!(class.name, "rust");
        assert_eq!(class.labels, vec!["cli"]);
    }
}
