use blocks::{Block, ClientId};

/// Receives positional change notices so a virtualized list can re-fetch
/// only the rows that changed. Implementations read block data back through
/// the store when they need it; they must not keep it.
pub trait ListNotifier {
    /// The block at `index` changed in place.
    fn set(&mut self, index: usize, block: &Block);

    /// `delete_count` blocks were removed at `index`, and `inserted` (if
    /// any) now sits there.
    fn splice(&mut self, index: usize, delete_count: usize, inserted: Option<&Block>);

    /// The block at `index` swapped places with the one before it.
    fn move_up(&mut self, index: usize);

    /// The block at `index` swapped places with the one after it.
    fn move_down(&mut self, index: usize);

    /// The whole list was replaced.
    fn reset(&mut self, blocks: &[Block]);
}

impl<N: ListNotifier + ?Sized> ListNotifier for &mut N {
    fn set(&mut self, index: usize, block: &Block) {
        (**self).set(index, block)
    }

    fn splice(&mut self, index: usize, delete_count: usize, inserted: Option<&Block>) {
        (**self).splice(index, delete_count, inserted)
    }

    fn move_up(&mut self, index: usize) {
        (**self).move_up(index)
    }

    fn move_down(&mut self, index: usize) {
        (**self).move_down(index)
    }

    fn reset(&mut self, blocks: &[Block]) {
        (**self).reset(blocks)
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ListNotifier for NoopNotifier {
    fn set(&mut self, _index: usize, _block: &Block) {}
    fn splice(&mut self, _index: usize, _delete_count: usize, _inserted: Option<&Block>) {}
    fn move_up(&mut self, _index: usize) {}
    fn move_down(&mut self, _index: usize) {}
    fn reset(&mut self, _blocks: &[Block]) {}
}

/// One recorded notification. Carries positions and ids, never block data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange {
    Set {
        index: usize,
        client_id: ClientId,
    },
    Splice {
        index: usize,
        delete_count: usize,
        inserted: Option<ClientId>,
    },
    MoveUp {
        index: usize,
    },
    MoveDown {
        index: usize,
    },
    Reset {
        len: usize,
    },
}

/// Records notifications in order until a renderer drains them.
#[derive(Debug, Default, Clone)]
pub struct ChangeLog {
    changes: Vec<ListChange>,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog::default()
    }

    pub fn changes(&self) -> &[ListChange] {
        &self.changes
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> Vec<ListChange> {
        std::mem::take(&mut self.changes)
    }
}

impl ListNotifier for ChangeLog {
    fn set(&mut self, index: usize, block: &Block) {
        self.changes.push(ListChange::Set {
            index,
            client_id: block.client_id.clone(),
        });
    }

    fn splice(&mut self, index: usize, delete_count: usize, inserted: Option<&Block>) {
        self.changes.push(ListChange::Splice {
            index,
            delete_count,
            inserted: inserted.map(|b| b.client_id.clone()),
        });
    }

    fn move_up(&mut self, index: usize) {
        self.changes.push(ListChange::MoveUp { index });
    }

    fn move_down(&mut self, index: usize) {
        self.changes.push(ListChange::MoveDown { index });
    }

    fn reset(&mut self, blocks: &[Block]) {
        self.changes.push(ListChange::Reset { len: blocks.len() });
    }
}

#[cfg(test)]
mod tests {
    use blocks::Attributes;

    use super::*;

    #[test]
    fn change_log_records_in_order_and_drains() {
        let block = Block::new("core/paragraph", Attributes::new()).with_client_id("a");
        let mut log = ChangeLog::new();
        log.set(0, &block);
        log.splice(1, 0, Some(&block));
        log.move_down(1);
        assert_eq!(log.changes().len(), 3);
        let drained = log.take();
        assert_eq!(
            drained,
            vec![
                ListChange::Set {
                    index: 0,
                    client_id: ClientId::from("a"),
                },
                ListChange::Splice {
                    index: 1,
                    delete_count: 0,
                    inserted: Some(ClientId::from("a")),
                },
                ListChange::MoveDown { index: 1 },
            ]
        );
        assert!(log.changes().is_empty());
    }

    #[test]
    fn forwarding_through_mut_reference() {
        fn notify<N: ListNotifier>(mut notifier: N) {
            notifier.move_up(2);
            notifier.reset(&[]);
        }

        let mut log = ChangeLog::new();
        notify(&mut log);
        assert_eq!(
            log.changes(),
            &[ListChange::MoveUp { index: 2 }, ListChange::Reset { len: 0 }]
        );
    }
}
