use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate, NaiveTime};

use crate::input::LineInput;
use crate::models::{Priority, Task, TaskList};
use crate::selection::Selection;

pub const DEFAULT_DEADLINE_HOUR: u32 = 17;

const HINT_ADD_TITLE: &str = "Type a title, Enter to confirm, Esc to cancel";
const HINT_EDIT_TITLE: &str = "Edit the title, Enter to save, Esc to cancel";
const HINT_PRIORITY: &str = "↑/↓ choose priority • Enter confirm • Esc cancel";
const HINT_DATE: &str = "←/→ switch field • ↑/↓ adjust • Enter confirm • Esc cancel";
const EMPTY_TITLE: &str = "Title cannot be empty";

/// What the title field is being used for.
#[derive(Debug, Clone, PartialEq)]
pub enum TitleContext {
    Add { draft: Task },
    Edit { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriorityContext {
    Add { draft: Task },
    Edit { id: String },
}

/// Where a confirmed deadline goes.
#[derive(Debug, Clone, PartialEq)]
pub enum DateTarget {
    New { draft: Task },
    Existing { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DateField {
    const ORDER: [DateField; 6] = [
        DateField::Year,
        DateField::Month,
        DateField::Day,
        DateField::Hour,
        DateField::Minute,
        DateField::Second,
    ];

    pub fn rotate(self, delta: i32) -> DateField {
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as i32;
        Self::ORDER[(index + delta).rem_euclid(Self::ORDER.len() as i32) as usize]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatePicker {
    pub value: DateTime<Local>,
    pub field: DateField,
}

impl DatePicker {
    /// Seeds from an existing deadline, or today at 17:00:00.
    pub fn seeded(existing: Option<DateTime<Local>>) -> Self {
        let value = existing.unwrap_or_else(default_deadline);
        DatePicker {
            value,
            field: DateField::Hour,
        }
    }

    /// Moves the focused component by `delta` steps. Calendar fields keep the
    /// clock time; results the calendar cannot represent leave the value unchanged.
    pub fn adjust(&mut self, delta: i32) {
        let next = match self.field {
            DateField::Year => shift_months(self.value, 12 * delta),
            DateField::Month => shift_months(self.value, delta),
            DateField::Day => {
                let days = Days::new(u64::from(delta.unsigned_abs()));
                if delta >= 0 {
                    self.value.checked_add_days(days)
                } else {
                    self.value.checked_sub_days(days)
                }
            }
            DateField::Hour => self.value.checked_add_signed(Duration::hours(delta as i64)),
            DateField::Minute => self
                .value
                .checked_add_signed(Duration::minutes(10 * delta as i64)),
            DateField::Second => self
                .value
                .checked_add_signed(Duration::seconds(10 * delta as i64)),
        };
        if let Some(next) = next {
            self.value = next;
        }
    }
}

/// Shifts by whole months, carrying a day past the end of the target month
/// into the next one: Jan 31 + 1 month is Mar 3 (Mar 2 in a leap year).
fn shift_months(value: DateTime<Local>, delta: i32) -> Option<DateTime<Local>> {
    let date = value.date_naive();
    let index = date.year() * 12 + date.month0() as i32 + delta;
    let first = NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)?;
    first
        .checked_add_days(Days::new(u64::from(date.day0())))?
        .and_time(value.time())
        .and_local_timezone(Local)
        .earliest()
}

fn default_deadline() -> DateTime<Local> {
    let now = Local::now();
    let time = NaiveTime::from_hms_opt(DEFAULT_DEADLINE_HOUR, 0, 0).unwrap_or_default();
    now.date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or(now)
}

/// Interaction state. Each variant carries the data only it needs, so a
/// priority picker without a target, or a date picker without one, cannot exist.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    #[default]
    Normal,
    InputTitle(TitleContext),
    PickPriority {
        context: PriorityContext,
        choice: Priority,
    },
    PickDate {
        target: DateTarget,
        picker: DatePicker,
    },
}

/// Decoded user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Add,
    Edit,
    Toggle,
    Delete,
    Confirm,
    Cancel,
    Quit,
    Char(char),
    Backspace,
    Resize(u16),
}

/// Work the caller performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Reconcile the full task list with the store.
    Persist,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct App {
    pub tasks: TaskList,
    pub selection: Selection,
    pub mode: Mode,
    pub input: LineInput,
    pub status: Option<String>,
}

impl App {
    pub fn new(tasks: TaskList, status: Option<String>) -> Self {
        let selection = Selection::new(&tasks);
        App {
            tasks,
            selection,
            mode: Mode::Normal,
            input: LineInput::default(),
            status,
        }
    }

    pub fn current(&self) -> Option<&Task> {
        self.selection.current(&self.tasks)
    }

    fn set_status(&mut self, message: &str) {
        self.status = Some(message.to_string());
    }

    fn exit_to_normal(&mut self) {
        self.mode = Mode::Normal;
        self.status = None;
        self.input.clear();
    }

    fn normal(&mut self, intent: Intent, effects: &mut Vec<Effect>) {
        match intent {
            Intent::Quit => effects.push(Effect::Quit),
            Intent::Up => self.selection.move_by(-1, &self.tasks),
            Intent::Down => self.selection.move_by(1, &self.tasks),
            Intent::Add => {
                self.input.clear();
                self.input.placeholder = "New task".to_string();
                self.mode = Mode::InputTitle(TitleContext::Add {
                    draft: Task::draft(),
                });
                self.set_status(HINT_ADD_TITLE);
            }
            Intent::Edit => {
                let Some(task) = self.current() else { return };
                let (id, title) = (task.id.clone(), task.title.clone());
                self.input.set_value(&title);
                self.input.placeholder = "Edit task".to_string();
                self.mode = Mode::InputTitle(TitleContext::Edit { id });
                self.set_status(HINT_EDIT_TITLE);
            }
            Intent::Toggle => {
                let Some(id) = self.current().map(|task| task.id.clone()) else {
                    return;
                };
                self.tasks.update(&id, |task| task.done = !task.done);
                self.selection.reanchor(&id, &self.tasks);
                self.status = None;
                effects.push(Effect::Persist);
            }
            Intent::Delete => {
                if let Some(task) = self.selection.delete_current(&mut self.tasks) {
                    log::debug!("deleted task {}", task.id);
                    self.status = None;
                    effects.push(Effect::Persist);
                }
            }
            _ => {}
        }
    }

    fn input_title(&mut self, context: TitleContext, intent: Intent, effects: &mut Vec<Effect>) {
        match intent {
            Intent::Cancel => return self.exit_to_normal(),
            Intent::Confirm => return self.confirm_title(context, effects),
            Intent::Quit => effects.push(Effect::Quit),
            Intent::Char(c) => self.input.insert_char(c),
            Intent::Backspace => self.input.delete_char(),
            Intent::Left => self.input.move_cursor_left(),
            Intent::Right => self.input.move_cursor_right(),
            Intent::Home => self.input.move_to_start(),
            Intent::End => self.input.move_to_end(),
            _ => {}
        }
        self.mode = Mode::InputTitle(context);
    }

    fn confirm_title(&mut self, context: TitleContext, effects: &mut Vec<Effect>) {
        let title = self.input.value().trim().to_string();
        if title.is_empty() {
            self.mode = Mode::InputTitle(context);
            self.set_status(EMPTY_TITLE);
            return;
        }
        self.input.clear();

        let (context, choice) = match context {
            TitleContext::Add { mut draft } => {
                draft.title = title;
                (PriorityContext::Add { draft }, Priority::Medium)
            }
            TitleContext::Edit { id } => {
                if !self.tasks.update(&id, |task| task.title = title) {
                    return self.exit_to_normal();
                }
                self.selection.reanchor(&id, &self.tasks);
                effects.push(Effect::Persist);
                let choice = self.tasks.find(&id).map(|t| t.priority).unwrap_or_default();
                (PriorityContext::Edit { id }, choice)
            }
        };
        self.mode = Mode::PickPriority { context, choice };
        self.set_status(HINT_PRIORITY);
    }

    fn pick_priority(
        &mut self,
        context: PriorityContext,
        choice: Priority,
        intent: Intent,
        effects: &mut Vec<Effect>,
    ) {
        let choice = match intent {
            Intent::Cancel => return self.exit_to_normal(),
            Intent::Quit => {
                effects.push(Effect::Quit);
                choice
            }
            Intent::Up | Intent::Left => choice.rotate(-1),
            Intent::Down | Intent::Right => choice.rotate(1),
            Intent::Confirm => return self.confirm_priority(context, choice, effects),
            _ => choice,
        };
        self.mode = Mode::PickPriority { context, choice };
    }

    fn confirm_priority(
        &mut self,
        context: PriorityContext,
        choice: Priority,
        effects: &mut Vec<Effect>,
    ) {
        let (target, existing) = match context {
            PriorityContext::Add { mut draft } => {
                draft.priority = choice;
                (DateTarget::New { draft }, None)
            }
            PriorityContext::Edit { id } => {
                if !self.tasks.update(&id, |task| task.priority = choice) {
                    return self.exit_to_normal();
                }
                self.selection.reanchor(&id, &self.tasks);
                effects.push(Effect::Persist);
                let existing = self.tasks.find(&id).and_then(|task| task.deadline);
                (DateTarget::Existing { id }, existing)
            }
        };
        self.mode = Mode::PickDate {
            target,
            picker: DatePicker::seeded(existing),
        };
        self.set_status(HINT_DATE);
    }

    fn pick_date(
        &mut self,
        target: DateTarget,
        mut picker: DatePicker,
        intent: Intent,
        effects: &mut Vec<Effect>,
    ) {
        match intent {
            Intent::Cancel => return self.exit_to_normal(),
            Intent::Confirm => return self.confirm_date(target, picker, effects),
            Intent::Quit => effects.push(Effect::Quit),
            Intent::Left => picker.field = picker.field.rotate(-1),
            Intent::Right => picker.field = picker.field.rotate(1),
            Intent::Up => picker.adjust(1),
            Intent::Down => picker.adjust(-1),
            _ => {}
        }
        self.mode = Mode::PickDate { target, picker };
    }

    fn confirm_date(&mut self, target: DateTarget, picker: DatePicker, effects: &mut Vec<Effect>) {
        let id = match target {
            DateTarget::New { mut draft } => {
                draft.deadline = Some(picker.value);
                let id = draft.id.clone();
                log::debug!("adding task {id}");
                self.tasks.push(draft);
                id
            }
            DateTarget::Existing { id } => {
                self.tasks.update(&id, |task| task.deadline = Some(picker.value));
                id
            }
        };
        self.selection.reanchor(&id, &self.tasks);
        effects.push(Effect::Persist);
        self.exit_to_normal();
    }
}

/// Applies one intent to the state. Persistence and quitting are returned as
/// effects for the caller to run; nothing here touches the store or terminal.
pub fn update(mut app: App, intent: Intent) -> (App, Vec<Effect>) {
    let mut effects = Vec::new();

    if let Intent::Resize(width) = intent {
        app.input.resize(width);
        return (app, effects);
    }

    match std::mem::take(&mut app.mode) {
        Mode::Normal => app.normal(intent, &mut effects),
        Mode::InputTitle(context) => app.input_title(context, intent, &mut effects),
        Mode::PickPriority { context, choice } => {
            app.pick_priority(context, choice, intent, &mut effects)
        }
        Mode::PickDate { target, picker } => app.pick_date(target, picker, intent, &mut effects),
    }

    (app, effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{at, task};

    fn run(app: App, intents: &[Intent]) -> (App, Vec<Effect>) {
        intents.iter().fold((app, Vec::new()), |(app, mut all), intent| {
            let (app, effects) = update(app, *intent);
            all.extend(effects);
            (app, all)
        })
    }

    fn typed(text: &str) -> Vec<Intent> {
        text.chars().map(Intent::Char).collect()
    }

    fn sample() -> App {
        App::new(
            TaskList::new(vec![
                task("a", "alpha", Priority::High),
                task("b", "beta", Priority::Medium),
            ]),
            None,
        )
    }

    #[test]
    fn add_flow_creates_selected_task() {
        let app = App::new(TaskList::new(vec![task("x", "existing", Priority::High)]), None);
        let mut intents = vec![Intent::Add];
        intents.extend(typed("Buy milk"));
        // priority: Medium -> High, then deadline: 17:00 today -> 09:00 tomorrow
        intents.extend([Intent::Confirm, Intent::Up, Intent::Confirm]);
        intents.extend(std::iter::repeat(Intent::Down).take(8));
        intents.extend([Intent::Left, Intent::Up, Intent::Confirm]);

        let (app, effects) = run(app, &intents);

        let expected = (Local::now().date_naive() + Days::new(1))
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap();
        let added = app.current().unwrap();
        assert_eq!(added.title, "Buy milk");
        assert_eq!(added.priority, Priority::High);
        assert_eq!(added.deadline, Some(expected));
        assert_eq!(app.selection.selected_id(), Some(added.id.as_str()));
        assert_eq!(app.tasks.len(), 2);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.status, None);
        assert_eq!(effects, vec![Effect::Persist]);
    }

    #[test]
    fn empty_title_does_not_advance() {
        let mut intents = vec![Intent::Add];
        intents.extend(typed("   "));
        intents.push(Intent::Confirm);
        let (app, effects) = run(sample(), &intents);

        assert!(matches!(app.mode, Mode::InputTitle(TitleContext::Add { .. })));
        assert_eq!(app.status.as_deref(), Some(EMPTY_TITLE));
        assert_eq!(app.tasks.len(), 2);
        assert!(effects.is_empty());
    }

    #[test]
    fn cancel_discards_draft_and_status() {
        let mut intents = vec![Intent::Add];
        intents.extend(typed("draft"));
        intents.extend([Intent::Confirm, Intent::Cancel]);
        let (app, effects) = run(sample(), &intents);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.status, None);
        assert_eq!(app.tasks.len(), 2);
        assert!(effects.is_empty());
    }

    #[test]
    fn edit_flow_updates_title_priority_and_deadline() {
        let mut app = sample();
        app.selection.move_by(1, &app.tasks);
        let mut intents = vec![Intent::Edit, Intent::End];
        intents.extend([Intent::Backspace; 4]);
        intents.extend(typed("zeta"));
        // beta becomes High and sorts relative to alpha by deadline presence
        intents.extend([Intent::Confirm, Intent::Up, Intent::Confirm, Intent::Confirm]);
        let (app, effects) = run(app, &intents);

        let edited = app.tasks.find("b").unwrap();
        assert_eq!(edited.title, "zeta");
        assert_eq!(edited.priority, Priority::High);
        assert!(edited.has_deadline());
        assert_eq!(app.tasks.as_slice()[0].id, "b");
        assert_eq!(app.selection.selected_id(), Some("b"));
        assert_eq!(app.selection.cursor(), 0);
        assert_eq!(effects, vec![Effect::Persist; 3]);
    }

    #[test]
    fn edit_seeds_picker_from_existing_values() {
        let mut tasks = vec![task("a", "alpha", Priority::Low)];
        tasks[0].deadline = Some(at(2031, 3, 4, 8, 30));
        let app = App::new(TaskList::new(tasks), None);
        let (app, _) = run(app, &[Intent::Edit, Intent::Confirm]);
        assert!(matches!(
            app.mode,
            Mode::PickPriority { choice: Priority::Low, .. }
        ));
        let (app, _) = run(app, &[Intent::Confirm]);
        match &app.mode {
            Mode::PickDate { target, picker } => {
                assert_eq!(target, &DateTarget::Existing { id: "a".into() });
                assert_eq!(picker.value, at(2031, 3, 4, 8, 30));
                assert_eq!(picker.field, DateField::Hour);
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn fresh_picker_defaults_to_five_pm_today() {
        let picker = DatePicker::seeded(None);
        assert_eq!(picker.value.date_naive(), Local::now().date_naive());
        assert_eq!(picker.value.time(), NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(picker.field, DateField::Hour);
    }

    #[test]
    fn edit_and_toggle_on_empty_list_are_noops() {
        let app = App::default();
        let (app, effects) = run(app, &[Intent::Edit, Intent::Toggle, Intent::Delete]);
        assert_eq!(app.mode, Mode::Normal);
        assert!(effects.is_empty());
    }

    #[test]
    fn toggle_reanchors_to_same_task() {
        let (app, effects) = run(sample(), &[Intent::Toggle]);
        assert_eq!(app.selection.selected_id(), Some("a"));
        assert_eq!(app.selection.cursor(), 1);
        assert!(app.tasks.find("a").unwrap().done);
        assert_eq!(effects, vec![Effect::Persist]);
    }

    #[test]
    fn delete_only_task_empties_selection() {
        let app = App::new(TaskList::new(vec![task("a", "only", Priority::Medium)]), None);
        let (app, effects) = run(app, &[Intent::Delete]);
        assert!(app.tasks.is_empty());
        assert_eq!(app.selection.selected_id(), None);
        assert_eq!(app.selection.cursor(), 0);
        assert_eq!(effects, vec![Effect::Persist]);
    }

    #[test]
    fn priority_picker_wraps() {
        let mut intents = vec![Intent::Add];
        intents.extend(typed("t"));
        intents.extend([Intent::Confirm, Intent::Up, Intent::Up]);
        let (app, _) = run(App::default(), &intents);
        assert!(matches!(app.mode, Mode::PickPriority { choice: Priority::Low, .. }));
        let (app, _) = run(app, &[Intent::Down]);
        assert!(matches!(app.mode, Mode::PickPriority { choice: Priority::High, .. }));
    }

    #[test]
    fn date_fields_rotate_cyclically() {
        assert_eq!(DateField::Year.rotate(-1), DateField::Second);
        assert_eq!(DateField::Second.rotate(1), DateField::Year);
        assert_eq!(DateField::Hour.rotate(-2), DateField::Month);
    }

    #[test]
    fn date_adjust_steps() {
        let mut picker = DatePicker {
            value: at(2031, 1, 31, 23, 55),
            field: DateField::Minute,
        };
        picker.adjust(1);
        assert_eq!(picker.value, at(2031, 2, 1, 0, 5));
        picker.field = DateField::Month;
        picker.adjust(-1);
        assert_eq!(picker.value, at(2031, 1, 1, 0, 5));
        picker.field = DateField::Year;
        picker.adjust(1);
        assert_eq!(picker.value, at(2032, 1, 1, 0, 5));
        picker.field = DateField::Second;
        picker.adjust(-1);
        assert_eq!(picker.value, at(2032, 1, 1, 0, 4) + Duration::seconds(50));
    }

    #[test]
    fn day_step_keeps_clock_time() {
        // Early March and early November cross daylight-saving changes in many zones.
        let mut picker = DatePicker {
            value: at(2031, 3, 8, 17, 0),
            field: DateField::Day,
        };
        picker.adjust(1);
        assert_eq!(picker.value.date_naive(), NaiveDate::from_ymd_opt(2031, 3, 9).unwrap());
        assert_eq!(picker.value.time(), NaiveTime::from_hms_opt(17, 0, 0).unwrap());

        picker.value = at(2031, 11, 2, 17, 0);
        picker.adjust(-1);
        assert_eq!(picker.value, at(2031, 11, 1, 17, 0));
        picker.adjust(1);
        picker.adjust(1);
        assert_eq!(picker.value, at(2031, 11, 3, 17, 0));
    }

    #[test]
    fn month_step_carries_overflowing_days() {
        let mut picker = DatePicker {
            value: at(2031, 1, 31, 17, 0),
            field: DateField::Month,
        };
        picker.adjust(1);
        assert_eq!(picker.value, at(2031, 3, 3, 17, 0));

        picker.value = at(2032, 1, 31, 17, 0);
        picker.adjust(1);
        assert_eq!(picker.value, at(2032, 3, 2, 17, 0));

        picker.value = at(2031, 3, 31, 9, 30);
        picker.adjust(-1);
        assert_eq!(picker.value, at(2031, 3, 3, 9, 30));

        picker.value = at(2031, 1, 15, 9, 30);
        picker.adjust(-2);
        assert_eq!(picker.value, at(2030, 11, 15, 9, 30));
    }

    #[test]
    fn year_step_from_leap_day_rolls_into_march() {
        let mut picker = DatePicker {
            value: at(2032, 2, 29, 17, 0),
            field: DateField::Year,
        };
        picker.adjust(1);
        assert_eq!(picker.value, at(2033, 3, 1, 17, 0));
    }

    #[test]
    fn resize_only_sizes_the_input() {
        let (app, effects) = update(sample(), Intent::Resize(100));
        assert_eq!(app.input.width(), 60);
        assert_eq!(app.mode, Mode::Normal);
        assert!(effects.is_empty());
    }

    #[test]
    fn quit_is_an_effect() {
        let (_, effects) = update(sample(), Intent::Quit);
        assert_eq!(effects, vec![Effect::Quit]);
    }
}
