use std::sync::Arc;

use blocks::{
    Block, BlockTypeRegistry, ClientId, MarkupParser, MarkupSerializer, Parser, Serializer,
};

use crate::action::Action;
use crate::error::StoreError;
use crate::notifier::{ListNotifier, NoopNotifier};
use crate::reducer::{Reduction, reduce};
use crate::state::State;

/// Whether a dispatched action changed the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Unchanged,
    Changed,
}

impl Dispatched {
    pub fn is_changed(self) -> bool {
        self == Dispatched::Changed
    }
}

/// Owns the current state and runs every action through the reducer.
pub struct Store<N: ListNotifier = NoopNotifier> {
    state: State,
    parser: Box<dyn MarkupParser>,
    serializer: Box<dyn MarkupSerializer>,
    notifier: N,
}

impl Store<NoopNotifier> {
    /// Empty store using the default markup codec over `registry`.
    pub fn new(registry: Arc<BlockTypeRegistry>) -> Self {
        Store::with_notifier(registry, NoopNotifier)
    }
}

impl<N: ListNotifier> Store<N> {
    pub fn with_notifier(registry: Arc<BlockTypeRegistry>, notifier: N) -> Self {
        Store::with_codec(
            Box::new(Parser::new(Arc::clone(&registry))),
            Box::new(Serializer::new(registry)),
            notifier,
        )
    }

    pub fn with_codec(
        parser: Box<dyn MarkupParser>,
        serializer: Box<dyn MarkupSerializer>,
        notifier: N,
    ) -> Self {
        Store {
            state: State::default(),
            parser,
            serializer,
            notifier,
        }
    }

    /// Start from an already-built block list. Focus flags are cleared.
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.state = State::from_blocks(blocks);
        self
    }

    /// Apply `action`. On error the state is left as it was.
    pub fn dispatch(&mut self, action: Action) -> Result<Dispatched, StoreError> {
        let kind = action.kind().to_string();
        let reduction = reduce(
            &self.state,
            &action,
            self.parser.as_ref(),
            &mut self.notifier,
        )?;
        match reduction {
            Reduction::Changed(state) => {
                tracing::debug!(action = %kind, blocks = state.blocks.len(), "state changed");
                self.state = state;
                Ok(Dispatched::Changed)
            }
            Reduction::Unchanged => Ok(Dispatched::Unchanged),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.state.block_at(index)
    }

    pub fn block_count(&self) -> usize {
        self.state.block_count()
    }

    pub fn index_of(&self, client_id: &ClientId) -> Option<usize> {
        self.state.index_of(client_id)
    }

    pub fn focused_client_id(&self) -> Option<&ClientId> {
        self.state.focused_client_id()
    }

    /// Current document as markup.
    pub fn serialize(&self) -> String {
        self.serializer.serialize(self.state.blocks.as_slice())
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}
