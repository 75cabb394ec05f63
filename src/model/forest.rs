use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::task::Task;

/// The ordered collection of root tasks, with an id index.
///
/// The index maps each task id to the sibling-index path leading to it from
/// the roots, so id-addressed lookups walk O(depth) nodes instead of scanning
/// the tree. The index is built in depth-first pre-order and the first
/// occurrence of an id wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Task>", into = "Vec<Task>")]
pub struct Forest {
    roots: Vec<Task>,
    index: HashMap<String, Vec<usize>>,
}

impl Forest {
    pub fn new(roots: Vec<Task>) -> Self {
        let mut forest = Forest {
            roots,
            index: HashMap::new(),
        };
        forest.reindex();
        forest
    }

    pub fn roots(&self) -> &[Task] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of nodes at every depth
    pub fn node_count(&self) -> usize {
        fn count(tasks: &[Task]) -> usize {
            tasks.iter().map(|t| 1 + count(&t.subtasks)).sum()
        }
        count(&self.roots)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    /// Sibling-index path from the roots to the task
    pub fn path_of(&self, task_id: &str) -> Option<&[usize]> {
        self.index.get(task_id).map(|p| p.as_slice())
    }

    /// Find a task by id at any depth.
    pub fn get(&self, task_id: &str) -> Option<&Task> {
        let (first, rest) = self.index.get(task_id)?.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.subtasks.get(i)?;
        }
        Some(node)
    }

    /// Find a task by id at any depth, mutably.
    ///
    /// Callers must not change `id` or the shape of `subtasks` through this
    /// reference without reindexing.
    pub(crate) fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        let (first, rest) = self.index.get(task_id)?.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for &i in rest {
            node = node.subtasks.get_mut(i)?;
        }
        Some(node)
    }

    /// Every ancestor of the task, root first.
    pub fn ancestors(&self, task_id: &str) -> Vec<&Task> {
        let Some(path) = self.index.get(task_id) else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut level: &[Task] = &self.roots;
        for &i in &path[..path.len().saturating_sub(1)] {
            let Some(node) = level.get(i) else {
                break;
            };
            chain.push(node);
            level = &node.subtasks;
        }
        chain
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<Task> {
        &mut self.roots
    }

    /// Rebuild the whole id index after a structural change.
    pub(crate) fn reindex(&mut self) {
        self.index.clear();
        let mut path = Vec::new();
        index_level(&self.roots, &mut path, &mut self.index);
    }

    /// Index a subtree that was appended at `path` without touching
    /// the paths of any existing node.
    pub(crate) fn index_subtree(&mut self, path: Vec<usize>) {
        let Some(task) = resolve(&self.roots, &path) else {
            return;
        };
        let mut entries = HashMap::new();
        let mut cursor = path.clone();
        entries.entry(task.id.clone()).or_insert_with(|| path.clone());
        index_level(&task.subtasks, &mut cursor, &mut entries);
        for (id, p) in entries {
            self.index.entry(id).or_insert(p);
        }
    }
}

impl PartialEq for Forest {
    fn eq(&self, other: &Self) -> bool {
        self.roots == other.roots
    }
}

impl Eq for Forest {}

impl From<Vec<Task>> for Forest {
    fn from(roots: Vec<Task>) -> Self {
        Forest::new(roots)
    }
}

impl From<Forest> for Vec<Task> {
    fn from(forest: Forest) -> Self {
        forest.roots
    }
}

fn index_level(tasks: &[Task], path: &mut Vec<usize>, index: &mut HashMap<String, Vec<usize>>) {
    for (i, task) in tasks.iter().enumerate() {
        path.push(i);
        index.entry(task.id.clone()).or_insert_with(|| path.clone());
        index_level(&task.subtasks, path, index);
        path.pop();
    }
}

fn resolve<'a>(roots: &'a [Task], path: &[usize]) -> Option<&'a Task> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get(*first)?;
    for &i in rest {
        node = node.subtasks.get(i)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Forest {
        let mut grandchild = Task::new("g1", "Escolares", "Revisar actas");
        grandchild.is_specific_task = true;
        let mut child = Task::new("c1", "Escolares", "Captura");
        child.subtasks.push(grandchild);
        let mut root = Task::new("p1", "Escolares", "Inscripciones");
        root.subtasks.push(child);
        root.subtasks.push(Task::new("c2", "Escolares", "Bajas"));
        Forest::new(vec![root, Task::new("p2", "Finanzas", "Presupuesto")])
    }

    #[test]
    fn index_resolves_every_depth() {
        let forest = sample();
        assert_eq!(forest.path_of("p1"), Some(&[0][..]));
        assert_eq!(forest.path_of("g1"), Some(&[0, 0, 0][..]));
        assert_eq!(forest.path_of("c2"), Some(&[0, 1][..]));
        assert_eq!(forest.path_of("p2"), Some(&[1][..]));
        assert_eq!(forest.get("g1").unwrap().title, "Revisar actas");
        assert!(forest.get("nope").is_none());
        assert_eq!(forest.node_count(), 5);
    }

    #[test]
    fn duplicate_ids_resolve_to_first_preorder_match() {
        let mut root = Task::new("dup", "A", "first");
        root.subtasks.push(Task::new("dup", "A", "nested"));
        let forest = Forest::new(vec![root, Task::new("dup", "A", "last")]);
        assert_eq!(forest.get("dup").unwrap().title, "first");
    }

    #[test]
    fn ancestors_are_root_first() {
        let forest = sample();
        let ids: Vec<&str> = forest.ancestors("g1").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "c1"]);
        assert!(forest.ancestors("p1").is_empty());
        assert!(forest.ancestors("missing").is_empty());
    }

    #[test]
    fn serializes_as_plain_array() {
        let forest = sample();
        let json = serde_json::to_string(&forest).unwrap();
        assert!(json.starts_with('['));
        let back: Forest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, forest);
        assert!(back.contains("g1"));
    }
}
