use crate::models::{Task, TaskList};

/// Cursor over a sorted [`TaskList`], anchored to the identity of the selected
/// task so that resorting never leaves it pointing at the wrong row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    cursor: usize,
    selected_id: Option<String>,
}

impl Selection {
    /// Starts on the first task, if any.
    pub fn new(tasks: &TaskList) -> Self {
        Selection {
            cursor: 0,
            selected_id: tasks.get(0).map(|task| task.id.clone()),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn current<'a>(&self, tasks: &'a TaskList) -> Option<&'a Task> {
        tasks.get(self.cursor)
    }

    pub fn is_selected(&self, task: &Task) -> bool {
        self.selected_id.as_deref() == Some(task.id.as_str())
    }

    /// Moves the cursor by `delta`. Out-of-range targets are ignored.
    pub fn move_by(&mut self, delta: isize, tasks: &TaskList) {
        let Some(target) = self.cursor.checked_add_signed(delta) else {
            return;
        };
        if let Some(task) = tasks.get(target) {
            self.cursor = target;
            self.selected_id = Some(task.id.clone());
        }
    }

    /// Points the cursor at `id`. When the task is gone, falls back to the first
    /// open task, then the first task, then nothing.
    pub fn reanchor(&mut self, id: &str, tasks: &TaskList) {
        let index = tasks
            .position(id)
            .or_else(|| tasks.iter().position(|task| !task.done))
            .or(if tasks.is_empty() { None } else { Some(0) });

        match index.and_then(|i| tasks.get(i).map(|task| (i, task))) {
            Some((i, task)) => {
                self.cursor = i;
                self.selected_id = Some(task.id.clone());
            }
            None => {
                self.cursor = 0;
                self.selected_id = None;
            }
        }
    }

    /// Removes the task under the cursor and clamps into the shrunk list.
    pub fn delete_current(&mut self, tasks: &mut TaskList) -> Option<Task> {
        let removed = tasks.remove(self.cursor)?;
        if tasks.is_empty() {
            self.cursor = 0;
            self.selected_id = None;
        } else {
            if self.cursor >= tasks.len() {
                self.cursor = tasks.len() - 1;
            }
            self.selected_id = tasks.get(self.cursor).map(|task| task.id.clone());
        }
        Some(removed)
    }
}
