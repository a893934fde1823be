use pw_runtime::TurnOutput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionRow {
    pub(crate) key: String,
    pub(crate) text: String,
}

#[derive(Debug, Default)]
pub(crate) struct TuiUiState {
    pub(crate) node: String,
    pub(crate) text_lines: Vec<String>,
    pub(crate) options: Vec<OptionRow>,
    pub(crate) selected_option_index: usize,
    pub(crate) option_scroll_offset: usize,
    /// Rows scrolled back from the bottom of the text.
    pub(crate) text_scroll_back: usize,
    pub(crate) input_buffer: String,
    pub(crate) ended: bool,
    pub(crate) help_visible: bool,
    pub(crate) status: String,
}

impl TuiUiState {
    pub(crate) fn show_turn(&mut self, output: &TurnOutput) {
        self.node = output.node.to_string();
        self.text_lines = output.text.lines().map(str::to_string).collect();
        self.options = output
            .options()
            .into_iter()
            .map(|option| OptionRow {
                key: option.key,
                text: option.text,
            })
            .collect();
        self.selected_option_index = 0;
        self.option_scroll_offset = 0;
        self.text_scroll_back = 0;
        self.input_buffer.clear();
        self.ended = output.exited;
    }

    pub(crate) fn select_previous(&mut self) {
        self.selected_option_index = self.selected_option_index.saturating_sub(1);
        if self.selected_option_index < self.option_scroll_offset {
            self.option_scroll_offset = self.selected_option_index;
        }
    }

    pub(crate) fn select_next(&mut self, viewport_rows: usize) {
        let last = self.options.len().saturating_sub(1);
        self.selected_option_index = (self.selected_option_index + 1).min(last);
        if viewport_rows > 0
            && self.options.len() > viewport_rows
            && self.selected_option_index >= self.option_scroll_offset + viewport_rows
        {
            self.option_scroll_offset = self.selected_option_index - viewport_rows + 1;
        }
    }

    pub(crate) fn scroll_text_back(&mut self, rows: usize) {
        let max = self.text_lines.len().saturating_sub(1);
        self.text_scroll_back = (self.text_scroll_back + rows).min(max);
    }

    pub(crate) fn scroll_text_forward(&mut self, rows: usize) {
        self.text_scroll_back = self.text_scroll_back.saturating_sub(rows);
    }

    /// Typed text wins; an empty line submits the highlighted option's key.
    pub(crate) fn take_submission(&mut self) -> Option<String> {
        if !self.input_buffer.trim().is_empty() {
            return Some(std::mem::take(&mut self.input_buffer));
        }
        self.options
            .get(self.selected_option_index)
            .map(|option| option.key.clone())
    }
}

#[cfg(test)]
mod tui_state_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{load_catalog_by_dir, start_session};

    #[test]
    fn show_turn_resets_selection_and_input() {
        let catalog = load_catalog_by_dir(&demo_catalog_copy("tui-state")).expect("catalog");
        let mut wizard = start_session(&catalog, &builder(), None, None).expect("start");
        let mut ui = TuiUiState::default();
        ui.input_buffer = "stale".to_string();
        ui.selected_option_index = 3;

        ui.show_turn(&wizard.look());
        assert_eq!(ui.node, "index");
        assert!(ui.input_buffer.is_empty());
        assert_eq!(ui.selected_option_index, 0);
        assert_eq!(
            ui.options.first(),
            Some(&OptionRow {
                key: "1".to_string(),
                text: "Key (required)".to_string(),
            })
        );
        assert!(!ui.ended);

        ui.show_turn(&wizard.enter("quit"));
        assert!(ui.ended);
        assert!(ui.options.is_empty());
    }

    #[test]
    fn selection_scrolls_within_viewport() {
        let mut ui = TuiUiState {
            options: (1..=8)
                .map(|index| OptionRow {
                    key: index.to_string(),
                    text: format!("option {}", index),
                })
                .collect(),
            ..TuiUiState::default()
        };
        for _ in 0..6 {
            ui.select_next(5);
        }
        assert_eq!(ui.selected_option_index, 6);
        assert_eq!(ui.option_scroll_offset, 2);
        for _ in 0..4 {
            ui.select_next(5);
        }
        assert_eq!(ui.selected_option_index, 7);

        for _ in 0..7 {
            ui.select_previous();
        }
        assert_eq!(ui.selected_option_index, 0);
        assert_eq!(ui.option_scroll_offset, 0);
    }

    #[test]
    fn submission_prefers_typed_text() {
        let mut ui = TuiUiState {
            options: vec![OptionRow {
                key: "sa".to_string(),
                text: "Save".to_string(),
            }],
            ..TuiUiState::default()
        };
        assert_eq!(ui.take_submission().as_deref(), Some("sa"));

        ui.input_buffer = "Grik".to_string();
        assert_eq!(ui.take_submission().as_deref(), Some("Grik"));
        assert!(ui.input_buffer.is_empty());

        ui.options.clear();
        assert_eq!(ui.take_submission(), None);
    }

    #[test]
    fn text_scroll_is_clamped() {
        let mut ui = TuiUiState {
            text_lines: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..TuiUiState::default()
        };
        ui.scroll_text_back(10);
        assert_eq!(ui.text_scroll_back, 2);
        ui.scroll_text_forward(1);
        assert_eq!(ui.text_scroll_back, 1);
        ui.scroll_text_forward(5);
        assert_eq!(ui.text_scroll_back, 0);
    }
}
