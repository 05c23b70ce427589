use std::collections::HashSet;

use crate::model::task::Task;
use crate::ops::OpError;

/// Result of [`add_project`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAdded {
    pub projects: Vec<String>,
    /// The name as stored (trimmed)
    pub name: String,
}

/// Result of [`rename_project`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRenamed {
    pub projects: Vec<String>,
    pub tasks: Vec<Task>,
    pub name: String,
}

/// Result of [`delete_project`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDeleted {
    pub projects: Vec<String>,
    pub tasks: Vec<Task>,
}

/// Case-insensitive name equality, the uniqueness rule for projects.
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Sort project names case-insensitively, in place.
pub fn sort_projects(projects: &mut [String]) {
    projects.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

/// Declare a new project. Fails on an empty name or a case-insensitive
/// duplicate.
pub fn add_project(projects: &[String], name: &str) -> Result<ProjectAdded, OpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OpError::Validation("Project name is required".into()));
    }
    if let Some(existing) = projects.iter().find(|p| same_name(p, name)) {
        return Err(OpError::Conflict(format!(
            "Project \"{}\" already exists",
            existing
        )));
    }
    let mut projects = projects.to_vec();
    projects.push(name.to_string());
    sort_projects(&mut projects);
    Ok(ProjectAdded {
        projects,
        name: name.to_string(),
    })
}

/// Rename a project and move every task that referenced it.
///
/// Renaming to a name that differs only in case is a successful no-op.
pub fn rename_project(
    projects: &[String],
    tasks: &[Task],
    old: &str,
    new: &str,
    now: &str,
) -> Result<ProjectRenamed, OpError> {
    let new = new.trim();
    if new.is_empty() {
        return Err(OpError::Validation("New project name is required".into()));
    }
    if same_name(new, old.trim()) {
        return Ok(ProjectRenamed {
            projects: projects.to_vec(),
            tasks: tasks.to_vec(),
            name: old.to_string(),
        });
    }

    let old = resolve(projects, old)
        .ok_or_else(|| OpError::NotFound(format!("Project \"{}\" not found", old.trim())))?;
    if let Some(existing) = projects.iter().find(|p| *p != old && same_name(p, new)) {
        return Err(OpError::Conflict(format!(
            "Project \"{}\" already exists",
            existing
        )));
    }

    let mut renamed: Vec<String> = projects
        .iter()
        .map(|p| if *p == old { new.to_string() } else { p.clone() })
        .collect();
    sort_projects(&mut renamed);

    let tasks = tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if task.in_project(old) {
                task.project = Some(new.to_string());
                task.touch(now);
            }
            task
        })
        .collect();

    Ok(ProjectRenamed {
        projects: renamed,
        tasks,
        name: new.to_string(),
    })
}

/// Remove a project (idempotent). Tasks keep existing but lose their
/// project reference.
pub fn delete_project(projects: &[String], tasks: &[Task], name: &str, now: &str) -> ProjectDeleted {
    let name = name.trim();
    let projects = projects.iter().filter(|p| *p != name).cloned().collect();
    let tasks = tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if task.in_project(name) {
                task.project = None;
                task.touch(now);
            }
            task
        })
        .collect();
    ProjectDeleted { projects, tasks }
}

/// Declared projects plus every project a task refers to, deduplicated
/// (case-sensitively) and sorted.
pub fn merge_projects(projects: &[String], tasks: &[Task]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let referenced = tasks
        .iter()
        .filter_map(|t| t.project.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty());
    for name in projects.iter().map(String::as_str).chain(referenced) {
        if seen.insert(name.to_string()) {
            merged.push(name.to_string());
        }
    }
    sort_projects(&mut merged);
    merged
}

/// Find the stored spelling of a project: exact match first, then a
/// case-insensitive one.
fn resolve<'a>(projects: &'a [String], name: &str) -> Option<&'a str> {
    let name = name.trim();
    projects
        .iter()
        .find(|p| *p == name)
        .or_else(|| projects.iter().find(|p| same_name(p, name)))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOW: &str = "2025-09-17T10:00:00.000Z";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn task_in(id: &str, project: Option<&str>) -> Task {
        Task {
            project: project.map(String::from),
            updated: Some("2025-01-01T00:00:00.000Z".into()),
            ..Task::new(Some(id.into()), format!("task {}", id))
        }
    }

    // --- add ---

    #[test]
    fn test_add_rejects_case_insensitive_duplicate() {
        let err = add_project(&names(&["Work"]), "work").unwrap_err();
        assert!(matches!(err, OpError::Conflict(_)));
    }

    #[test]
    fn test_add_trims_and_sorts() {
        let added = add_project(&names(&["Work", "alpha"]), " New ").unwrap();
        assert_eq!(added.name, "New");
        assert_eq!(added.projects, names(&["alpha", "New", "Work"]));
    }

    #[test]
    fn test_add_rejects_empty() {
        let err = add_project(&[], "   ").unwrap_err();
        assert_eq!(err, OpError::Validation("Project name is required".into()));
    }

    // --- rename ---

    #[test]
    fn test_rename_moves_tasks() {
        let tasks = vec![task_in("1", Some("Work")), task_in("2", Some("Home")), task_in("3", None)];
        let renamed = rename_project(&names(&["Home", "Work"]), &tasks, "Work", "Job", NOW).unwrap();

        assert_eq!(renamed.projects, names(&["Home", "Job"]));
        assert_eq!(renamed.tasks[0].project.as_deref(), Some("Job"));
        assert_eq!(renamed.tasks[0].updated.as_deref(), Some(NOW));
        assert_eq!(renamed.tasks[1], tasks[1]);
        assert_eq!(renamed.tasks[2], tasks[2]);
    }

    #[test]
    fn test_rename_case_only_is_noop() {
        let tasks = vec![task_in("1", Some("Work"))];
        let renamed = rename_project(&names(&["Work"]), &tasks, "Work", " work ", NOW).unwrap();
        assert_eq!(renamed.projects, names(&["Work"]));
        assert_eq!(renamed.tasks, tasks);
    }

    #[test]
    fn test_rename_collision() {
        let err = rename_project(&names(&["Home", "Work"]), &[], "Work", "HOME", NOW).unwrap_err();
        assert!(matches!(err, OpError::Conflict(_)));
    }

    #[test]
    fn test_rename_empty_target() {
        let err = rename_project(&names(&["Work"]), &[], "Work", "", NOW).unwrap_err();
        assert!(matches!(err, OpError::Validation(_)));
    }

    #[test]
    fn test_rename_unknown_source() {
        let err = rename_project(&names(&["Work"]), &[], "Garden", "Yard", NOW).unwrap_err();
        assert!(matches!(err, OpError::NotFound(_)));
    }

    #[test]
    fn test_rename_resolves_case_insensitively() {
        let tasks = vec![task_in("1", Some("Work"))];
        let renamed = rename_project(&names(&["Work"]), &tasks, "work", "Job", NOW).unwrap();
        assert_eq!(renamed.projects, names(&["Job"]));
        assert_eq!(renamed.tasks[0].project.as_deref(), Some("Job"));
    }

    // --- delete ---

    #[test]
    fn test_delete_clears_references() {
        let tasks = vec![task_in("1", Some("Work")), task_in("2", Some("Home"))];
        let deleted = delete_project(&names(&["Home", "Work"]), &tasks, "Work", NOW);
        assert_eq!(deleted.projects, names(&["Home"]));
        assert_eq!(deleted.tasks[0].project, None);
        assert_eq!(deleted.tasks[0].updated.as_deref(), Some(NOW));
        assert_eq!(deleted.tasks[1], tasks[1]);

        let json = serde_json::to_value(&deleted.tasks[0]).unwrap();
        assert!(json.get("project").is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let deleted = delete_project(&names(&["Home"]), &[], "Work", NOW);
        assert_eq!(deleted.projects, names(&["Home"]));
    }

    // --- merge ---

    #[test]
    fn test_merge_projects() {
        let tasks = vec![
            task_in("1", Some("beta")),
            task_in("2", Some("  ")),
            task_in("3", Some("Alpha")),
            task_in("4", None),
        ];
        let merged = merge_projects(&names(&["Alpha", "Gamma"]), &tasks);
        assert_eq!(merged, names(&["Alpha", "beta", "Gamma"]));
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let tasks = vec![task_in("1", Some("work"))];
        assert_eq!(merge_projects(&names(&["Work"]), &tasks), names(&["Work", "work"]));
    }
}
