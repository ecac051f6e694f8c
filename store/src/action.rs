use blocks::{Attributes, Block, ClientId};

/// Everything the block store reducer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Merge `attributes` into the block's attributes.
    UpdateAttributes {
        client_id: ClientId,
        attributes: Attributes,
    },
    /// Toggle focus on a block.
    Focus { client_id: ClientId },
    MoveUp { client_id: ClientId },
    MoveDown { client_id: ClientId },
    Delete { client_id: ClientId },
    /// Insert `block` right after `client_id_above`, or at the head.
    Create {
        block: Block,
        client_id_above: Option<ClientId>,
    },
    /// Put `block` where `client_id` is, keeping that position's focus.
    Replace { client_id: ClientId, block: Block },
    /// Replace the whole document with the result of parsing `html`.
    Parse { html: String },
    /// An action kind meant for some other reducer.
    Other(String),
}

impl Action {
    pub fn kind(&self) -> &str {
        match self {
            Action::UpdateAttributes { .. } => "UPDATE_ATTRIBUTES",
            Action::Focus { .. } => "FOCUS",
            Action::MoveUp { .. } => "MOVE_UP",
            Action::MoveDown { .. } => "MOVE_DOWN",
            Action::Delete { .. } => "DELETE",
            Action::Create { .. } => "CREATE",
            Action::Replace { .. } => "REPLACE",
            Action::Parse { .. } => "PARSE",
            Action::Other(kind) => kind,
        }
    }
}
