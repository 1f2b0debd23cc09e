use chrono::{DateTime, Local};
use std::cmp::Ordering;

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const NO_DEADLINE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Small integer stored in the `priority` column.
    pub fn level(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn from_level(level: i64) -> Option<Priority> {
        match level {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "P0",
            Priority::Medium => "P1",
            Priority::Low => "P2",
        }
    }

    /// Step through the tiers cyclically. A negative delta moves toward High.
    pub fn rotate(self, delta: i32) -> Priority {
        let next = (self.level() as i32 - delta).rem_euclid(3);
        Priority::from_level(next as i64).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub priority: Priority,
    pub deadline: Option<DateTime<Local>>,
}

impl Task {
    /// A fresh draft with a new identity and the default priority.
    pub fn draft() -> Self {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: String::new(),
            done: false,
            priority: Priority::default(),
            deadline: None,
        }
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_overdue(&self) -> bool {
        match self.deadline {
            Some(deadline) if !self.done => deadline < Local::now(),
            _ => false,
        }
    }

    pub fn format_deadline(&self) -> String {
        match self.deadline {
            Some(deadline) => deadline.format(DEADLINE_FORMAT).to_string(),
            None => NO_DEADLINE.to_string(),
        }
    }
}

/// Canonical order: open before done, higher priority first, tasks with a
/// deadline before those without, earlier deadline first, then title.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.done
        .cmp(&b.done)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| b.has_deadline().cmp(&a.has_deadline()))
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.title.cmp(&b.title))
}

pub fn sort_tasks(tasks: &mut [Task]) {
    // slice::sort_by is stable
    tasks.sort_by(compare_tasks);
}

/// Tasks kept in canonical order at all times. Every mutation resorts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(mut tasks: Vec<Task>) -> Self {
        let mut seen = std::collections::HashSet::new();
        tasks.retain(|task| seen.insert(task.id.clone()));
        sort_tasks(&mut tasks);
        TaskList { tasks }
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn done_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.done).count()
    }

    /// Adds a task, replacing any existing task with the same ID.
    pub fn push(&mut self, task: Task) {
        match self.position(&task.id) {
            Some(index) => self.tasks[index] = task,
            None => self.tasks.push(task),
        }
        sort_tasks(&mut self.tasks);
    }

    /// Applies `edit` to the task with `id`. Returns false when no such task exists.
    pub fn update<F: FnOnce(&mut Task)>(&mut self, id: &str, edit: F) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        edit(&mut self.tasks[index]);
        sort_tasks(&mut self.tasks);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<Task> {
        if index >= self.tasks.len() {
            return None;
        }
        Some(self.tasks.remove(index))
    }
}
