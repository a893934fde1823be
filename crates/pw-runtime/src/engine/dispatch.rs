use pw_core::{ErrorKind, WizardError};
use tracing::{debug, warn};

use super::node::{MenuOption, NodeArgs, NodeId, NodeView, OptionTarget, Transition, Turn};
use super::render::{render_text, rendered_options, RenderedOption};
use super::PrototypeWizard;

/// What the host gets back from one turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub node: NodeId,
    /// Messages, body (or help), list page and options as plain text.
    pub text: String,
    pub view: Option<NodeView>,
    pub messages: Vec<String>,
    pub exited: bool,
}

impl TurnOutput {
    pub fn options(&self) -> Vec<RenderedOption> {
        self.view.as_ref().map(rendered_options).unwrap_or_default()
    }
}

enum Selection {
    Option(MenuOption),
    OutOfRange(usize),
    Unmatched,
}

fn select(view: &NodeView, input: &str) -> Selection {
    if !input.is_empty() {
        if let Some(option) = view
            .options
            .iter()
            .find(|option| !option.is_default && option.matches_key(input))
        {
            return Selection::Option(option.clone());
        }
        let has_numbers = view.list.is_some() || view.numbered_options().next().is_some();
        if let (true, Ok(number)) = (has_numbers, input.parse::<usize>()) {
            return match number
                .checked_sub(1)
                .and_then(|index| view.numbered_options().nth(index))
            {
                Some(option) => Selection::Option(option.clone()),
                None => Selection::OutOfRange(number),
            };
        }
    }
    match view.default_option() {
        Some(option) => Selection::Option(option.clone()),
        None => Selection::Unmatched,
    }
}

fn report(error: &WizardError, node: NodeId, outbox: &mut Vec<String>) {
    warn!(code = %error.code, node = %node, "{}", error.message);
    match error.kind {
        ErrorKind::Service | ErrorKind::Internal => outbox.push(format!("Error: {}", error)),
        _ => outbox.push(error.message.clone()),
    }
}

impl PrototypeWizard {
    /// Renders the current node without consuming input.
    pub fn look(&mut self) -> TurnOutput {
        self.finish(Vec::new())
    }

    /// Feeds one line of user input to the active node. Never fails: errors
    /// are shown to the user and the session stays where it was.
    pub fn enter(&mut self, input: &str) -> TurnOutput {
        let mut outbox = Vec::new();
        if self.exited {
            outbox.push("The wizard session has ended.".to_string());
            return self.exit_output(outbox);
        }

        let input = input.trim();
        match input.to_lowercase().as_str() {
            "h" | "help" => {
                self.state.help_visible = !self.state.help_visible;
                return self.finish(outbox);
            }
            "l" | "look" => return self.finish(outbox),
            "q" | "quit" => return self.exit(outbox),
            _ => {}
        }

        let node = self.state.node;
        let args = self.state.args.clone();
        let view = match self.render_node(node, &args, &mut outbox) {
            Ok(view) => view,
            Err(error) => {
                report(&error, node, &mut outbox);
                return self.finish(outbox);
            }
        };

        let transition = match select(&view, input) {
            Selection::Option(option) => {
                debug!(node = %node, option = %option.label, "option selected");
                self.run_target(option.target, input, &mut outbox)
            }
            Selection::OutOfRange(number) => {
                outbox.push(format!("There is no option {}.", number));
                Transition::Stay
            }
            Selection::Unmatched => {
                outbox.push("Choose one of the options.".to_string());
                Transition::Stay
            }
        };

        match transition {
            Transition::Stay => self.finish(outbox),
            Transition::Exit => self.exit(outbox),
            Transition::Goto { node, args } => {
                self.move_to(node, args);
                self.finish(outbox)
            }
        }
    }

    /// Host-driven jump to `node`, e.g. to open the load menu directly.
    pub fn goto(&mut self, node: NodeId, args: NodeArgs) -> TurnOutput {
        if self.exited {
            return self.exit_output(vec!["The wizard session has ended.".to_string()]);
        }
        self.move_to(node, args);
        self.finish(Vec::new())
    }

    fn run_target(&mut self, target: OptionTarget, input: &str, outbox: &mut Vec<String>) -> Transition {
        match target {
            OptionTarget::Goto { node, args } => Transition::Goto { node, args },
            OptionTarget::Invoke { handler, args } => {
                let node = self.state.node;
                let mut turn = Turn::new(&mut self.state, &self.services, &self.options, outbox);
                match handler(&mut turn, input, &args) {
                    Ok(transition) => transition,
                    Err(error) => {
                        report(&error, node, outbox);
                        Transition::Stay
                    }
                }
            }
        }
    }

    fn move_to(&mut self, node: NodeId, args: NodeArgs) {
        if node != self.state.node {
            self.state.push_history();
            self.state.list_page = 0;
        }
        debug!(from = %self.state.node, to = %node, "transition");
        self.state.node = node;
        self.state.args = args;
    }

    fn render_node(
        &mut self,
        node: NodeId,
        args: &NodeArgs,
        outbox: &mut Vec<String>,
    ) -> Result<NodeView, WizardError> {
        let handler = self.registry.get(node)?;
        let mut turn = Turn::new(&mut self.state, &self.services, &self.options, outbox);
        handler(&mut turn, args)
    }

    /// Renders the current node. A failing render falls back through the
    /// history, and finally to the index.
    fn finish(&mut self, mut outbox: Vec<String>) -> TurnOutput {
        loop {
            let node = self.state.node;
            let args = self.state.args.clone();
            match self.render_node(node, &args, &mut outbox) {
                Ok(view) => {
                    let text = render_text(&outbox, Some(&view), self.state.help_visible);
                    return TurnOutput {
                        node,
                        text,
                        view: Some(view),
                        messages: outbox,
                        exited: false,
                    };
                }
                Err(error) => {
                    report(&error, node, &mut outbox);
                    match self.state.history.pop() {
                        Some(entry) => {
                            self.state.node = entry.node;
                            self.state.args = entry.args;
                        }
                        None if node != NodeId::Index => {
                            self.state.node = NodeId::Index;
                            self.state.args = NodeArgs::new();
                        }
                        None => {
                            let text = render_text(&outbox, None, false);
                            return TurnOutput {
                                node,
                                text,
                                view: None,
                                messages: outbox,
                                exited: false,
                            };
                        }
                    }
                    self.state.list_page = 0;
                }
            }
        }
    }

    fn exit(&mut self, mut outbox: Vec<String>) -> TurnOutput {
        self.exited = true;
        debug!(node = %self.state.node, "wizard exited");
        outbox.push("Exited the template wizard.".to_string());
        self.exit_output(outbox)
    }

    fn exit_output(&self, outbox: Vec<String>) -> TurnOutput {
        TurnOutput {
            node: self.state.node,
            text: render_text(&outbox, None, false),
            view: None,
            messages: outbox,
            exited: true,
        }
    }
}
