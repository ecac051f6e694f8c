use blocks::{Attributes, Block, ClientId, MarkupParser};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::collection::BlockList;
use crate::error::StoreError;
use crate::notifier::ListNotifier;
use crate::state::State;

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// The action did nothing: unknown target, boundary move, empty patch,
    /// or an action kind this reducer does not handle. Keep the old state.
    Unchanged,
    /// The state after the action. `refresh` is already flipped.
    Changed(State),
}

impl Reduction {
    pub fn is_changed(&self) -> bool {
        matches!(self, Reduction::Changed(_))
    }
}

/// Compute the state that follows `action`.
///
/// `state` is never modified. Position changes are reported to `notifier`
/// during the call; nothing is reported for `Unchanged` results or errors.
pub fn reduce(
    state: &State,
    action: &Action,
    parser: &dyn MarkupParser,
    notifier: &mut dyn ListNotifier,
) -> Result<Reduction, StoreError> {
    let reduction = match action {
        Action::UpdateAttributes {
            client_id,
            attributes,
        } => update_attributes(state, client_id, attributes, notifier),
        Action::Focus { client_id } => focus(state, client_id, notifier),
        Action::MoveUp { client_id } => move_up(state, client_id, notifier),
        Action::MoveDown { client_id } => move_down(state, client_id, notifier),
        Action::Delete { client_id } => delete(state, client_id, notifier),
        Action::Create {
            block,
            client_id_above,
        } => create(state, block, client_id_above.as_ref(), notifier),
        Action::Replace { client_id, block } => replace(state, client_id, block, notifier),
        Action::Parse { html } => return parse(state, html, parser, notifier),
        Action::Other(kind) => {
            debug!(kind = %kind, "ignoring unhandled action");
            Reduction::Unchanged
        }
    };
    Ok(reduction)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn changed(state: &State, blocks: BlockList, focused_index: Option<usize>) -> Reduction {
    Reduction::Changed(State {
        blocks,
        focused_index,
        refresh: !state.refresh,
    })
}

fn not_found(action: &str, client_id: &ClientId) -> Reduction {
    debug!(action, client_id = %client_id, "no block with this client id");
    Reduction::Unchanged
}

/// Apply `patch` on top of `current`. `None` when no key changes value.
fn merge_attributes(current: &Attributes, patch: &Attributes) -> Option<Attributes> {
    let mut next: Option<Attributes> = None;
    for (key, value) in patch {
        if current.get(key) != Some(value) {
            next.get_or_insert_with(|| current.clone())
                .insert(key.clone(), value.clone());
        }
    }
    next
}

/// Where `position` ends up after swapping `index` and `index + 1`.
fn follow_swap(position: usize, index: usize) -> usize {
    if position == index {
        index + 1
    } else if position == index + 1 {
        index
    } else {
        position
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn update_attributes(
    state: &State,
    client_id: &ClientId,
    patch: &Attributes,
    notifier: &mut dyn ListNotifier,
) -> Reduction {
    let Some(index) = state.blocks.index_of(client_id) else {
        return not_found("UPDATE_ATTRIBUTES", client_id);
    };
    let Some(current) = state.blocks.get(index) else {
        return Reduction::Unchanged;
    };
    let Some(attributes) = merge_attributes(&current.attributes, patch) else {
        debug!(client_id = %client_id, "attribute patch changes nothing");
        return Reduction::Unchanged;
    };

    let mut blocks = state.blocks.clone();
    if let Some(block) = blocks.get_mut(index) {
        block.attributes = attributes;
        notifier.set(index, block);
    }
    changed(state, blocks, state.focused_index)
}

fn focus(state: &State, client_id: &ClientId, notifier: &mut dyn ListNotifier) -> Reduction {
    let Some(target) = state.blocks.index_of(client_id) else {
        return not_found("FOCUS", client_id);
    };

    let mut blocks = state.blocks.clone();
    if let Some(previous) = state.focused_index.filter(|&previous| previous != target) {
        if let Some(block) = blocks.get_mut(previous) {
            block.focused = false;
            notifier.set(previous, block);
        }
    }

    let mut focused = false;
    if let Some(block) = blocks.get_mut(target) {
        block.focused = !block.focused;
        focused = block.focused;
        notifier.set(target, block);
    }
    changed(state, blocks, focused.then_some(target))
}

fn move_up(state: &State, client_id: &ClientId, notifier: &mut dyn ListNotifier) -> Reduction {
    let Some(index) = state.blocks.index_of(client_id) else {
        return not_found("MOVE_UP", client_id);
    };
    if index == 0 {
        debug!(client_id = %client_id, "block is already first");
        return Reduction::Unchanged;
    }

    let mut blocks = state.blocks.clone();
    blocks.swap(index - 1);
    notifier.move_up(index);
    let focused_index = state
        .focused_index
        .map(|position| follow_swap(position, index - 1));
    changed(state, blocks, focused_index)
}

fn move_down(state: &State, client_id: &ClientId, notifier: &mut dyn ListNotifier) -> Reduction {
    let Some(index) = state.blocks.index_of(client_id) else {
        return not_found("MOVE_DOWN", client_id);
    };
    if index + 1 >= state.blocks.len() {
        debug!(client_id = %client_id, "block is already last");
        return Reduction::Unchanged;
    }

    let mut blocks = state.blocks.clone();
    blocks.swap(index);
    notifier.move_down(index);
    let focused_index = state
        .focused_index
        .map(|position| follow_swap(position, index));
    changed(state, blocks, focused_index)
}

fn delete(state: &State, client_id: &ClientId, notifier: &mut dyn ListNotifier) -> Reduction {
    let Some(index) = state.blocks.index_of(client_id) else {
        return not_found("DELETE", client_id);
    };

    let mut blocks = state.blocks.clone();
    blocks.remove_at(index);
    notifier.splice(index, 1, None);
    let focused_index = match state.focused_index {
        Some(position) if position == index => None,
        Some(position) if position > index => Some(position - 1),
        other => other,
    };
    changed(state, blocks, focused_index)
}

fn create(
    state: &State,
    block: &Block,
    client_id_above: Option<&ClientId>,
    notifier: &mut dyn ListNotifier,
) -> Reduction {
    if state.blocks.contains(&block.client_id) {
        debug!(client_id = %block.client_id, "client id already in use");
        return Reduction::Unchanged;
    }

    let above = client_id_above.and_then(|id| state.blocks.index_of(id));
    if let (Some(id), None) = (client_id_above, above) {
        debug!(client_id = %id, "anchor block not found, inserting at head");
    }
    let index = above.map_or(0, |above| above + 1);

    let mut blocks = state.blocks.clone();
    blocks.insert(index, block.clone());
    notifier.splice(index, 0, Some(block));

    let mut focused_index = state
        .focused_index
        .map(|position| if position >= index { position + 1 } else { position });
    if block.focused {
        if let Some(previous) = focused_index {
            if let Some(previous_block) = blocks.get_mut(previous) {
                previous_block.focused = false;
                notifier.set(previous, previous_block);
            }
        }
        focused_index = Some(index);
    }
    changed(state, blocks, focused_index)
}

fn replace(
    state: &State,
    client_id: &ClientId,
    block: &Block,
    notifier: &mut dyn ListNotifier,
) -> Reduction {
    let Some(index) = state.blocks.index_of(client_id) else {
        return not_found("REPLACE", client_id);
    };
    if &block.client_id != client_id && state.blocks.contains(&block.client_id) {
        debug!(client_id = %block.client_id, "replacement client id already in use");
        return Reduction::Unchanged;
    }

    let mut replacement = block.clone();
    replacement.focused = state.focused_index == Some(index);
    if state.blocks.get(index) == Some(&replacement) {
        return Reduction::Unchanged;
    }

    let mut blocks = state.blocks.clone();
    blocks.set(index, replacement);
    if let Some(current) = blocks.get(index) {
        notifier.set(index, current);
    }
    changed(state, blocks, state.focused_index)
}

fn parse(
    state: &State,
    html: &str,
    parser: &dyn MarkupParser,
    notifier: &mut dyn ListNotifier,
) -> Result<Reduction, StoreError> {
    let parsed = parser.parse(html).map_err(|errors| {
        warn!(errors = errors.len(), "rejecting malformed markup");
        StoreError::MalformedMarkup(errors)
    })?;

    let blocks = BlockList::from_parsed(parsed);
    info!(blocks = blocks.len(), "document replaced from markup");
    notifier.reset(blocks.as_slice());
    Ok(changed(state, blocks, None))
}
