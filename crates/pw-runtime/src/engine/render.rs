use super::node::{MenuOption, NodeView, OptionRole};

/// A selectable option as shown to the user: the key to type and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOption {
    pub key: String,
    pub text: String,
    pub role: OptionRole,
}

fn option_text(option: &MenuOption) -> String {
    match &option.desc {
        Some(desc) if !desc.is_empty() => format!("{} ({})", option.label, desc),
        _ => option.label.clone(),
    }
}

/// `B(ack)` style label when the key prefixes the label, `key: label` otherwise.
fn nav_text(option: &RenderedOption, label: &str, desc: Option<&str>) -> String {
    let key = option.key.as_str();
    let head = if label.len() > key.len()
        && label.is_char_boundary(key.len())
        && label[..key.len()].eq_ignore_ascii_case(key)
    {
        format!("{}({})", key.to_uppercase(), &label[key.len()..])
    } else {
        format!("{}: {}", key, label)
    };
    match desc {
        Some(desc) if !desc.is_empty() => format!("{} [{}]", head, desc),
        _ => head,
    }
}

/// Options the user can currently pick, in display order. List items outside
/// the visible page and the fallback are left out.
pub fn rendered_options(view: &NodeView) -> Vec<RenderedOption> {
    let visible = view.list.map(|window| window.visible_range());
    let mut number = 0usize;
    let mut item_index = 0usize;
    let mut out = Vec::new();
    for option in &view.options {
        if option.is_default {
            continue;
        }
        if option.role == OptionRole::Item {
            let shown = visible
                .as_ref()
                .map(|range| range.contains(&item_index))
                .unwrap_or(true);
            item_index += 1;
            if !shown {
                continue;
            }
        }
        let key = match option.keys.first() {
            Some(key) => key.clone(),
            None => {
                number += 1;
                number.to_string()
            }
        };
        out.push(RenderedOption {
            key,
            text: option_text(option),
            role: option.role,
        });
    }
    out
}

pub(crate) fn render_text(messages: &[String], view: Option<&NodeView>, help_visible: bool) -> String {
    let mut sections = Vec::new();
    if !messages.is_empty() {
        sections.push(messages.join("\n"));
    }
    let Some(view) = view else {
        return sections.join("\n\n");
    };

    let body = match (&view.content.help, help_visible) {
        (Some(help), true) => help.clone(),
        _ => view.content.body.clone(),
    };
    if !body.is_empty() {
        sections.push(body);
    }

    let options = rendered_options(view);
    let nav_sources = view
        .options
        .iter()
        .filter(|option| !option.is_default && option.role == OptionRole::Nav)
        .collect::<Vec<_>>();

    let items = options
        .iter()
        .filter(|option| option.role == OptionRole::Item)
        .map(|option| format!("  {}: {}", option.key, option.text))
        .collect::<Vec<_>>();
    if let Some(window) = view.list {
        let mut lines = items;
        if window.total == 0 {
            lines.push("  (nothing to select)".to_string());
        }
        if window.pages > 1 {
            lines.push(format!("  (page {}/{})", window.page + 1, window.pages));
        }
        sections.push(lines.join("\n"));
    }

    let plain = options
        .iter()
        .filter(|option| option.role == OptionRole::Plain)
        .map(|option| format!("  {}: {}", option.key, option.text))
        .collect::<Vec<_>>();
    if !plain.is_empty() {
        sections.push(plain.join("\n"));
    }

    let mut nav = options
        .iter()
        .filter(|option| option.role == OptionRole::Nav)
        .zip(nav_sources)
        .map(|(rendered, source)| nav_text(rendered, &source.label, source.desc.as_deref()))
        .collect::<Vec<_>>();
    if view.content.help.is_some() {
        nav.push("H(elp)".to_string());
    }
    nav.push("Q(uit)".to_string());
    sections.push(nav.join(" | "));

    sections.join("\n\n")
}
