//! Run-parameter controls and the collector that reads them.

use crate::error::ParamError;
use crate::model::{Mode, ModeOption, RunParameters};

/// Mutually exclusive mode choices, like a radio group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeSelector {
    options: Vec<ModeOption>,
}

impl ModeSelector {
    /// Options start unchecked; duplicates are dropped.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options: Vec<ModeOption> = Vec::new();
        for value in values {
            let value = value.into();
            if !options.iter().any(|o| o.value == value) {
                options.push(ModeOption {
                    value,
                    checked: false,
                });
            }
        }
        Self { options }
    }

    pub fn options(&self) -> &[ModeOption] {
        &self.options
    }

    /// Check `value` and uncheck every other option.
    pub fn select(&mut self, value: &str) -> Result<(), ParamError> {
        if !self.options.iter().any(|o| o.value == value) {
            return Err(ParamError::UnknownMode(value.to_string()));
        }
        for option in &mut self.options {
            option.checked = option.value == value;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        for option in &mut self.options {
            option.checked = false;
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.checked)
            .map(|o| o.value.as_str())
    }
}

/// The auxiliary input controls of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunControls {
    pub ant_count: String,
    pub iteration_count: String,
    pub mode: ModeSelector,
}

/// What to do when no mode option is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MissingMode {
    #[default]
    Reject,
    Fallback(Mode),
}

#[derive(Debug, Clone, Default)]
pub struct ParameterCollector {
    missing_mode: MissingMode,
}

impl ParameterCollector {
    pub fn new(missing_mode: MissingMode) -> Self {
        Self { missing_mode }
    }

    /// Read the controls as they are right now. Counts are not validated.
    pub fn collect(&self, controls: &RunControls) -> Result<RunParameters, ParamError> {
        let mode = match (controls.mode.selected(), &self.missing_mode) {
            (Some(token), _) => Mode::new(token),
            (None, MissingMode::Fallback(mode)) => {
                tracing::debug!(%mode, "no mode selected, using fallback");
                mode.clone()
            }
            (None, MissingMode::Reject) => return Err(ParamError::NoModeSelected),
        };
        Ok(RunParameters {
            ant_count: controls.ant_count.clone(),
            iteration_count: controls.iteration_count.clone(),
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(selected: Option<&str>) -> RunControls {
        let mut mode = ModeSelector::new(["fastest", "shortest"]);
        if let Some(s) = selected {
            mode.select(s).unwrap();
        }
        RunControls {
            ant_count: "10".into(),
            iteration_count: "5".into(),
            mode,
        }
    }

    #[test]
    fn select_is_mutually_exclusive() {
        let mut sel = ModeSelector::new(["fastest", "shortest", "fastest"]);
        assert_eq!(sel.options().len(), 2);
        sel.select("fastest").unwrap();
        sel.select("shortest").unwrap();
        let checked: Vec<_> = sel.options().iter().filter(|o| o.checked).collect();
        assert_eq!(checked.len(), 1);
        assert_eq!(sel.selected(), Some("shortest"));
    }

    #[test]
    fn selecting_an_unknown_mode_keeps_the_current_choice() {
        let mut sel = ModeSelector::new(["fastest"]);
        sel.select("fastest").unwrap();
        assert_eq!(
            sel.select("scenic"),
            Err(ParamError::UnknownMode("scenic".into()))
        );
        assert_eq!(sel.selected(), Some("fastest"));
    }

    #[test]
    fn collects_current_values_verbatim() {
        let mut c = controls(Some("shortest"));
        c.ant_count = "ten".into();
        let params = ParameterCollector::default().collect(&c).unwrap();
        assert_eq!(params.ant_count, "ten");
        assert_eq!(params.iteration_count, "5");
        assert_eq!(params.mode.as_str(), "shortest");
    }

    #[test]
    fn missing_mode_is_rejected_by_default() {
        let err = ParameterCollector::default()
            .collect(&controls(None))
            .unwrap_err();
        assert_eq!(err, ParamError::NoModeSelected);
    }

    #[test]
    fn missing_mode_uses_fallback_when_configured() {
        let collector = ParameterCollector::new(MissingMode::Fallback(Mode::from("fastest")));
        let params = collector.collect(&controls(None)).unwrap();
        assert_eq!(params.mode, Mode::from("fastest"));
    }
}
