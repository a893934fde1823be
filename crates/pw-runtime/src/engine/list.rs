use std::sync::Arc;

use pw_core::WizardError;

use super::node::{
    callback, node_handler, ListWindow, MenuOption, NodeArgs, NodeHandler, OptionRole,
    OptionTarget, Transition, Turn,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Passed to the selection callback.
    pub value: String,
    pub label: String,
}

impl ListItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

pub type ItemsFn = Arc<dyn Fn(&Turn<'_>) -> Result<Vec<ListItem>, WizardError> + Send + Sync>;
pub type SelectFn = Arc<dyn Fn(&mut Turn<'_>, &str) -> Result<Transition, WizardError> + Send + Sync>;

pub fn items_fn<F>(f: F) -> ItemsFn
where
    F: Fn(&Turn<'_>) -> Result<Vec<ListItem>, WizardError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn select_fn<F>(f: F) -> SelectFn
where
    F: Fn(&mut Turn<'_>, &str) -> Result<Transition, WizardError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps `wrapped` so it renders a paginated, numbered selection over
/// `items`. The wrapped node's own options (navigation, fallback) are kept
/// after the items. Item numbers are absolute across pages.
pub fn with_list_selection(items: ItemsFn, on_select: SelectFn, wrapped: NodeHandler) -> NodeHandler {
    node_handler(move |turn, args| {
        let entries = items(&*turn)?;
        let mut view = wrapped(turn, args)?;

        let page_size = turn.options.page_size.max(1);
        let pages = entries.len().div_ceil(page_size).max(1);
        let page = turn.state.list_page.min(pages - 1);
        turn.state.list_page = page;

        let total = entries.len();
        let mut options = Vec::with_capacity(total + view.options.len() + 2);
        for (index, entry) in entries.into_iter().enumerate() {
            let on_select = on_select.clone();
            let value = entry.value;
            options.push(
                MenuOption::invoke(
                    entry.label,
                    callback(move |turn, _raw, _args| on_select(turn, &value)),
                )
                .with_keys([(index + 1).to_string()])
                .with_role(OptionRole::Item),
            );
        }

        if pages > 1 {
            if page + 1 < pages {
                options.push(
                    MenuOption::invoke("Next page", callback(change_page(1)))
                        .with_keys(["n", "next"])
                        .nav(),
                );
            }
            if page > 0 {
                options.push(
                    MenuOption::invoke("Previous page", callback(change_page(-1)))
                        .with_keys(["p", "prev"])
                        .nav(),
                );
            }
        }

        let mut extra_number = total;
        for option in view.options.drain(..) {
            if option.is_default {
                options.push(stay_on_empty(option));
            } else if option.keys.is_empty() {
                extra_number += 1;
                options.push(option.with_keys([extra_number.to_string()]));
            } else {
                options.push(option);
            }
        }

        view.options = options;
        view.list = Some(ListWindow {
            total,
            page,
            pages,
            page_size,
        });
        Ok(view)
    })
}

fn change_page(
    step: isize,
) -> impl Fn(&mut Turn<'_>, &str, &NodeArgs) -> Result<Transition, WizardError> + Send + Sync + 'static
{
    move |turn, _raw, _args| {
        turn.state.list_page = turn.state.list_page.saturating_add_signed(step);
        Ok(Transition::Stay)
    }
}

/// Empty input on a list node returns to the wrapped node instead of
/// reaching the fallback.
fn stay_on_empty(option: MenuOption) -> MenuOption {
    let MenuOption {
        label,
        keys,
        desc,
        target,
        role,
        is_default,
    } = option;
    let target = match target {
        OptionTarget::Invoke { handler, args } => OptionTarget::Invoke {
            handler: callback(move |turn, raw, args| {
                if raw.trim().is_empty() {
                    return Ok(Transition::Stay);
                }
                handler(turn, raw, args)
            }),
            args,
        },
        goto => goto,
    };
    MenuOption {
        label,
        keys,
        desc,
        target,
        role,
        is_default,
    }
}
