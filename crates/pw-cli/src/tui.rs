use pw_core::WizardError;
use pw_runtime::PrototypeWizard;

use crate::TuiCommandContext;

#[cfg(coverage)]
pub(super) fn run_tui_ratatui_mode(
    context: &TuiCommandContext<'_>,
    wizard: &mut PrototypeWizard,
    _force_line: bool,
) -> Result<i32, WizardError> {
    super::run_tui_line_mode(context, wizard)
}

#[cfg(not(coverage))]
mod rich {
    use std::io;
    use std::time::Duration;

    use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use pw_core::WizardError;
    use pw_runtime::PrototypeWizard;
    use ratatui::backend::CrosstermBackend;
    use ratatui::Terminal;

    use crate::tui_render::{render_tui, OPTION_VIEWPORT_ROWS};
    use crate::tui_state::TuiUiState;
    use crate::{handle_tui_command, map_tui_io, TuiCommandAction, TuiCommandContext};

    const POLL_INTERVAL_MS: u64 = 100;
    const TEXT_PAGE_ROWS: usize = 5;

    struct TuiTerminal {
        terminal: Terminal<CrosstermBackend<io::Stdout>>,
    }

    impl TuiTerminal {
        fn new() -> Result<Self, WizardError> {
            enable_raw_mode().map_err(map_tui_io)?;
            io::stdout()
                .execute(EnterAlternateScreen)
                .map_err(map_tui_io)?;
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::new(backend).map_err(map_tui_io)?;
            Ok(Self { terminal })
        }

        fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
            &mut self.terminal
        }
    }

    impl Drop for TuiTerminal {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }
    }

    pub(super) fn run_tui_ratatui_mode(
        context: &TuiCommandContext<'_>,
        wizard: &mut PrototypeWizard,
    ) -> Result<i32, WizardError> {
        let mut terminal = TuiTerminal::new()?;
        let mut ui = TuiUiState {
            status: "ready".to_string(),
            ..TuiUiState::default()
        };
        ui.show_turn(&wizard.look());

        loop {
            terminal
                .terminal_mut()
                .draw(|frame| render_tui(frame, &ui, &context.catalog.id, context.state_file))
                .map_err(map_tui_io)?;

            if !event::poll(Duration::from_millis(POLL_INTERVAL_MS)).map_err(map_tui_io)? {
                continue;
            }

            if let Event::Key(key) = event::read().map_err(map_tui_io)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = match handle_key(key, context, wizard, &mut ui) {
                    Ok(should_quit) => should_quit,
                    Err(error) => {
                        ui.status = error.to_string();
                        false
                    }
                };
                if should_quit {
                    break;
                }
            }
        }

        Ok(0)
    }

    fn run_host_command(
        command: &str,
        context: &TuiCommandContext<'_>,
        wizard: &mut PrototypeWizard,
        ui: &mut TuiUiState,
    ) -> Result<bool, WizardError> {
        let mut emitted = Vec::new();
        let action = handle_tui_command(command, context, wizard, &mut |line| emitted.push(line))?;
        if let Some(last) = emitted.pop() {
            ui.status = last;
        }
        match action {
            TuiCommandAction::RefreshTurn => {
                ui.show_turn(&wizard.look());
                Ok(false)
            }
            TuiCommandAction::Quit => Ok(true),
            TuiCommandAction::Continue | TuiCommandAction::NotHandled => Ok(false),
        }
    }

    fn handle_key(
        key: KeyEvent,
        context: &TuiCommandContext<'_>,
        wizard: &mut PrototypeWizard,
        ui: &mut TuiUiState,
    ) -> Result<bool, WizardError> {
        if key.code == KeyCode::Esc {
            return Ok(true);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Ok(true),
                KeyCode::Char('s') => run_host_command(":save", context, wizard, ui),
                KeyCode::Char('l') => run_host_command(":load", context, wizard, ui),
                KeyCode::Char('r') => run_host_command(":restart", context, wizard, ui),
                _ => Ok(false),
            };
        }

        match key.code {
            KeyCode::F(1) => ui.help_visible = !ui.help_visible,
            KeyCode::Up => ui.select_previous(),
            KeyCode::Down => ui.select_next(OPTION_VIEWPORT_ROWS),
            KeyCode::PageUp => ui.scroll_text_back(TEXT_PAGE_ROWS),
            KeyCode::PageDown => ui.scroll_text_forward(TEXT_PAGE_ROWS),
            KeyCode::Backspace | KeyCode::Delete => {
                ui.input_buffer.pop();
            }
            KeyCode::Enter => {
                if ui.ended {
                    ui.status = "session ended; ^r restarts, esc quits".to_string();
                    return Ok(false);
                }
                let Some(submission) = ui.take_submission() else {
                    ui.status = "nothing to send".to_string();
                    return Ok(false);
                };
                let output = wizard.enter(&submission);
                ui.show_turn(&output);
                ui.status = format!("sent {}", submission);
            }
            KeyCode::Char(ch) => {
                if !ui.ended && !key.modifiers.contains(KeyModifiers::ALT) {
                    ui.input_buffer.push(ch);
                }
            }
            _ => {}
        }

        Ok(false)
    }
}

#[cfg(not(coverage))]
pub(super) fn run_tui_ratatui_mode(
    context: &TuiCommandContext<'_>,
    wizard: &mut PrototypeWizard,
    force_line: bool,
) -> Result<i32, WizardError> {
    use std::io::IsTerminal;

    if force_line || !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return super::run_tui_line_mode(context, wizard);
    }
    rich::run_tui_ratatui_mode(context, wizard)
}
