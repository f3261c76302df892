use crate::model::{InfoEvent, SessionEvent, SessionView};
use crate::orchestrator::UiCommand;

/// A focusable control of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start(usize),
    End(usize),
    Ants,
    Iterations,
    Mode,
}

impl Field {
    pub fn is_text(self) -> bool {
        !matches!(self, Field::Mode)
    }
}

/// UI-thread state. The form is drawn only from `view`, the last snapshot
/// sent by the controller.
pub struct UiState {
    pub view: Option<SessionView>,
    pub focus: usize,
    /// Edit buffer while a text field is being edited.
    pub editing: Option<String>,
    pub mode_cursor: usize,
    pub info: String,
    pub show_help: bool,
    pub fragment_scroll: u16,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: None,
            focus: 0,
            editing: None,
            mode_cursor: 0,
            info: "Press ? for help".into(),
            show_help: false,
            fragment_scroll: 0,
        }
    }
}

impl UiState {
    pub fn fields(&self) -> Vec<Field> {
        let Some(view) = &self.view else {
            return Vec::new();
        };
        let mut fields: Vec<Field> = (0..view.stops.len())
            .flat_map(|i| [Field::Start(i), Field::End(i)])
            .collect();
        if view.include_run_parameters {
            fields.extend([Field::Ants, Field::Iterations, Field::Mode]);
        }
        fields
    }

    pub fn focused(&self) -> Option<Field> {
        self.fields().get(self.focus).copied()
    }

    pub fn move_focus(&mut self, delta: isize) {
        let n = self.fields().len();
        if n == 0 || self.editing.is_some() {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(n as isize) as usize;
    }

    pub fn move_mode_cursor(&mut self, delta: isize) {
        let n = self.view.as_ref().map(|v| v.modes.len()).unwrap_or(0);
        if n == 0 {
            return;
        }
        self.mode_cursor = (self.mode_cursor as isize + delta).rem_euclid(n as isize) as usize;
    }

    pub fn field_value(&self, field: Field) -> String {
        let Some(view) = &self.view else {
            return String::new();
        };
        match field {
            Field::Start(i) => view.stops.get(i).map(|p| p.start.clone()).unwrap_or_default(),
            Field::End(i) => view.stops.get(i).map(|p| p.end.clone()).unwrap_or_default(),
            Field::Ants => view.ant_count.clone(),
            Field::Iterations => view.iteration_count.clone(),
            Field::Mode => view
                .modes
                .iter()
                .find(|m| m.checked)
                .map(|m| m.value.clone())
                .unwrap_or_default(),
        }
    }

    /// Start editing the focused text field. Returns false for the mode row.
    pub fn begin_edit(&mut self) -> bool {
        match self.focused() {
            Some(field) if field.is_text() => {
                self.editing = Some(self.field_value(field));
                true
            }
            _ => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Finish editing and produce the command that stores the value.
    pub fn commit_edit(&mut self) -> Option<UiCommand> {
        let value = self.editing.take()?;
        match self.focused()? {
            Field::Start(index) => Some(UiCommand::SetStart { index, value }),
            Field::End(index) => Some(UiCommand::SetEnd { index, value }),
            Field::Ants => Some(UiCommand::SetAntCount(value)),
            Field::Iterations => Some(UiCommand::SetIterationCount(value)),
            Field::Mode => None,
        }
    }

    /// Command that checks the mode under the cursor.
    pub fn select_mode_under_cursor(&self) -> Option<UiCommand> {
        let view = self.view.as_ref()?;
        view.modes
            .get(self.mode_cursor)
            .map(|m| UiCommand::SelectMode(m.value.clone()))
    }

    pub fn apply_event(&mut self, ev: SessionEvent) {
        match ev {
            SessionEvent::Snapshot { view } => {
                let rendered_changed = self
                    .view
                    .as_ref()
                    .map(|old| old.target.rendered_seq != view.target.rendered_seq)
                    .unwrap_or(true);
                if rendered_changed {
                    self.fragment_scroll = 0;
                }
                if self.mode_cursor >= view.modes.len() {
                    self.mode_cursor = 0;
                }
                let anchor = self.focused();
                self.view = Some(*view);
                self.reanchor_focus(anchor);
            }
            SessionEvent::Info(info) => {
                self.info = match &info {
                    InfoEvent::RequestIssued { .. } => format!("{}…", info.to_message()),
                    _ => info.to_message(),
                };
            }
        }
    }

    /// Keep focus on the same field after the field list changed. A removed
    /// field hands focus to the last one and drops any pending edit.
    fn reanchor_focus(&mut self, anchor: Option<Field>) {
        let fields = self.fields();
        match anchor.and_then(|f| fields.iter().position(|&x| x == f)) {
            Some(i) => self.focus = i,
            None => {
                self.focus = self.focus.min(fields.len().saturating_sub(1));
                if anchor.is_some() {
                    self.editing = None;
                }
            }
        }
    }

    pub fn fragment(&self) -> &str {
        self.view
            .as_ref()
            .map(|v| v.target.content.as_str())
            .unwrap_or("")
    }
}
