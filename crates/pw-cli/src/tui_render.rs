#![cfg(not(coverage))]

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::tui_state::TuiUiState;

pub(crate) const OPTION_VIEWPORT_ROWS: usize = 5;
const ELLIPSIS: &str = "…";

pub(crate) fn render_tui(frame: &mut Frame<'_>, ui: &TuiUiState, catalog_id: &str, state_file: &str) {
    let terminal_width = frame.area().width as usize;
    let terminal_rows = frame.area().height as usize;
    let content_width = (terminal_width.saturating_sub(2)).max(16);

    let wrapped_text_rows = ui
        .text_lines
        .iter()
        .flat_map(|line| wrap_line_to_width(line, content_width))
        .collect::<Vec<_>>();

    let mut reserved_rows = 3usize + 1usize + OPTION_VIEWPORT_ROWS + 1usize + 1usize + 1usize;
    if ui.help_visible {
        reserved_rows += 1;
    }
    let visible_text_rows = terminal_rows.saturating_sub(reserved_rows).max(1);
    let text_end = wrapped_text_rows.len().saturating_sub(ui.text_scroll_back);
    let text_start = text_end.saturating_sub(visible_text_rows);
    let clipped_text_rows = wrapped_text_rows[text_start..text_end].to_vec();

    let option_text_width = content_width.saturating_sub(2).max(8);
    let visible_option_rows = (0..OPTION_VIEWPORT_ROWS)
        .map(|row_index| {
            let absolute_index = ui.option_scroll_offset + row_index;
            let Some(option) = ui.options.get(absolute_index) else {
                return (" ".to_string(), false);
            };
            (
                truncate_to_width(
                    format!("{}: {}", option.key, option.text).as_str(),
                    option_text_width,
                ),
                absolute_index == ui.selected_option_index,
            )
        })
        .collect::<Vec<_>>();

    let header_text = truncate_to_width(
        format!("{} | node: {}", catalog_id, ui.node).as_str(),
        content_width,
    );
    let state_text = truncate_to_width(format!("state: {}", state_file).as_str(), content_width);
    let status_text = truncate_to_width(format!("status: {}", ui.status).as_str(), content_width);
    let divider_line = "─".repeat(content_width);
    let input_text = if ui.ended {
        "[session ended]".to_string()
    } else {
        truncate_to_width(format!("> {}", ui.input_buffer).as_str(), content_width)
    };
    let window_text = if ui.options.len() > OPTION_VIEWPORT_ROWS {
        truncate_to_width(
            format!(
                "options {}-{} / {}",
                ui.option_scroll_offset + 1,
                (ui.option_scroll_offset + OPTION_VIEWPORT_ROWS).min(ui.options.len()),
                ui.options.len()
            )
            .as_str(),
            content_width,
        )
    } else {
        " ".to_string()
    };
    let key_text = truncate_to_width(
        "keys: type+enter send | up/down pick option | pgup/pgdn scroll | ^s save | ^l load | ^r restart | f1 help | esc quit",
        content_width,
    );
    let help_text = truncate_to_width(
        "enter on an empty line sends the highlighted option. wizard commands (help, look, quit) are typed as input.",
        content_width,
    );

    let mut lines_out: Vec<Line<'_>> = Vec::new();
    lines_out.push(Line::from(header_text));
    lines_out.push(Line::from(Span::styled(
        state_text,
        Style::default().fg(Color::Gray),
    )));
    lines_out.push(Line::from(Span::styled(
        status_text,
        Style::default().fg(Color::Gray),
    )));
    for row in clipped_text_rows {
        lines_out.push(Line::from(row));
    }
    lines_out.push(Line::from(Span::styled(
        divider_line,
        Style::default().fg(Color::Gray),
    )));
    for (text, selected) in visible_option_rows {
        let prefix = if selected { "> " } else { "  " };
        let style = if selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        lines_out.push(Line::from(Span::styled(
            format!("{}{}", prefix, text),
            style,
        )));
    }
    lines_out.push(Line::from(Span::styled(
        window_text,
        Style::default().fg(Color::Gray),
    )));
    lines_out.push(Line::from(Span::styled(
        input_text,
        Style::default().fg(Color::Cyan),
    )));
    lines_out.push(Line::from(Span::styled(
        key_text,
        Style::default().fg(Color::Yellow),
    )));
    if ui.help_visible {
        lines_out.push(Line::from(Span::styled(
            help_text,
            Style::default().fg(Color::Magenta),
        )));
    }

    let paragraph = Paragraph::new(lines_out).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, frame.area());
}

fn truncate_to_width(value: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let chars = value.chars().collect::<Vec<_>>();
    if chars.len() <= width {
        return value.to_string();
    }
    if width == 1 {
        return ELLIPSIS.to_string();
    }
    let mut out = chars.into_iter().take(width - 1).collect::<String>();
    out.push_str(ELLIPSIS);
    out
}

fn wrap_line_to_width(value: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    let chars = value.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tui_render_tests {
    use super::*;
    use crate::tui_state::OptionRow;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn truncate_and_wrap_respect_width() {
        assert_eq!(truncate_to_width("goblin", 10), "goblin");
        assert_eq!(truncate_to_width("goblin grunt", 6), "gobli…");
        assert_eq!(truncate_to_width("goblin", 1), ELLIPSIS);
        assert_eq!(truncate_to_width("goblin", 0), "");

        assert_eq!(wrap_line_to_width("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(wrap_line_to_width("", 3), vec![String::new()]);
    }

    #[test]
    fn render_shows_node_text_and_highlighted_option() {
        let ui = TuiUiState {
            node: "name".to_string(),
            text_lines: vec!["Set the name of the template.".to_string()],
            options: vec![
                OptionRow {
                    key: "b".to_string(),
                    text: "Back (kind)".to_string(),
                },
                OptionRow {
                    key: "f".to_string(),
                    text: "Forward (aliases)".to_string(),
                },
            ],
            selected_option_index: 1,
            status: "ready".to_string(),
            ..TuiUiState::default()
        };
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).expect("test terminal");
        terminal
            .draw(|frame| render_tui(frame, &ui, "catalog-dir:/tmp/demo", "/tmp/state.json"))
            .expect("draw");

        let buffer = terminal.backend().buffer().clone();
        let screen = buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("node: name"));
        assert!(screen.contains("Set the name of the template."));
        assert!(screen.contains("  b: Back (kind)"));
        assert!(screen.contains("> f: Forward (aliases)"));
    }
}
