use std::fmt;

use blocks::{Attributes, BlockTypeRegistry, ClientId, create_block};
use serde::Deserialize;
use store::{Action, ChangeLog, Dispatched, ListChange, State, Store};

/// A TOML action script: `[[step]]` tables applied in order.
#[derive(Debug, Default, Deserialize)]
pub struct Script {
    #[serde(default, alias = "step")]
    pub steps: Vec<Step>,
}

/// One scripted action. Blocks are addressed by `index` (position in the
/// current document) or by an explicit `client_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Action kind, e.g. `move_up` or `UPDATE_ATTRIBUTES` (case-insensitive).
    pub action: String,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Anchor position for `create`; omit to insert at the head.
    #[serde(default)]
    pub after: Option<usize>,
    /// Block type for `create` and `replace`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    /// Create the new block focused.
    #[serde(default)]
    pub focused: bool,
    /// Markup for `parse`.
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ScriptError {
    MissingField { action: String, field: &'static str },
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::MissingField { action, field } => {
                write!(f, "step `{}` needs `{}`", action, field)
            }
            ScriptError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for {} block(s)", index, len)
            }
        }
    }
}

impl std::error::Error for ScriptError {}

pub fn parse_script(text: &str) -> Result<Script, toml::de::Error> {
    toml::from_str(text)
}

impl Step {
    /// Resolve positions against `state` and build the action to dispatch.
    /// Unrecognised kinds become [`Action::Other`].
    pub fn to_action(&self, state: &State, registry: &BlockTypeRegistry) -> Result<Action, ScriptError> {
        let kind = self.action.to_ascii_lowercase();
        let action = match kind.as_str() {
            "update_attributes" => Action::UpdateAttributes {
                client_id: self.target(state)?,
                attributes: self.attributes.clone(),
            },
            "focus" => Action::Focus {
                client_id: self.target(state)?,
            },
            "move_up" => Action::MoveUp {
                client_id: self.target(state)?,
            },
            "move_down" => Action::MoveDown {
                client_id: self.target(state)?,
            },
            "delete" => Action::Delete {
                client_id: self.target(state)?,
            },
            "create" => {
                let client_id_above = match self.after {
                    Some(index) => Some(client_id_at(state, index)?),
                    None => None,
                };
                let mut block = create_block(registry, self.block_name()?, self.attributes.clone());
                block.focused = self.focused;
                if let Some(id) = &self.client_id {
                    block.client_id = ClientId::from(id.as_str());
                }
                Action::Create {
                    block,
                    client_id_above,
                }
            }
            "replace" => {
                let client_id = match self.index {
                    Some(index) => client_id_at(state, index)?,
                    None => self.missing("index")?,
                };
                let mut block = create_block(registry, self.block_name()?, self.attributes.clone());
                if let Some(id) = &self.client_id {
                    block.client_id = ClientId::from(id.as_str());
                }
                Action::Replace { client_id, block }
            }
            "parse" => Action::Parse {
                html: self.html.clone().map_or_else(|| self.missing("html"), Ok)?,
            },
            _ => Action::Other(self.action.clone()),
        };
        Ok(action)
    }

    fn target(&self, state: &State) -> Result<ClientId, ScriptError> {
        if let Some(id) = &self.client_id {
            return Ok(ClientId::from(id.as_str()));
        }
        match self.index {
            Some(index) => client_id_at(state, index),
            None => self.missing("index"),
        }
    }

    fn block_name(&self) -> Result<&str, ScriptError> {
        match &self.name {
            Some(name) => Ok(name),
            None => self.missing("name"),
        }
    }

    fn missing<T>(&self, field: &'static str) -> Result<T, ScriptError> {
        Err(ScriptError::MissingField {
            action: self.action.clone(),
            field,
        })
    }
}

fn client_id_at(state: &State, index: usize) -> Result<ClientId, ScriptError> {
    state
        .block_at(index)
        .map(|block| block.client_id.clone())
        .ok_or(ScriptError::IndexOutOfRange {
            index,
            len: state.block_count(),
        })
}

/// One applied step and the notifications it produced.
#[derive(Debug)]
pub struct AppliedStep {
    pub kind: String,
    pub outcome: Dispatched,
    pub changes: Vec<ListChange>,
}

/// Dispatch `steps` in order. The change log is drained after every step, so
/// each [`AppliedStep`] carries only its own notifications.
pub fn apply_steps(
    store: &mut Store<ChangeLog>,
    steps: &[Step],
    registry: &BlockTypeRegistry,
) -> Result<Vec<AppliedStep>, String> {
    let mut applied = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let action = step
            .to_action(store.state(), registry)
            .map_err(|e| format!("step {}: {}", i + 1, e))?;
        let kind = action.kind().to_string();
        let outcome = store
            .dispatch(action)
            .map_err(|e| format!("step {}: {}", i + 1, e))?;
        let changes = store.notifier_mut().take();
        tracing::info!(
            step = i + 1,
            action = %kind,
            changed = outcome.is_changed(),
            notifications = changes.len(),
            "applied step"
        );
        applied.push(AppliedStep {
            kind,
            outcome,
            changes,
        });
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use blocks::Block;
    use serde_json::json;

    use super::*;

    fn state() -> State {
        State::from_blocks(vec![
            Block::new("core/paragraph", Attributes::new()).with_client_id("a"),
            Block::new("core/paragraph", Attributes::new()).with_client_id("b"),
        ])
    }

    #[test]
    fn parses_steps() {
        let script = parse_script(
            r#"
[[step]]
action = "move_down"
index = 0

[[step]]
action = "create"
after = 1
name = "heading"
attributes = { content = "Hi", level = 3 }
focused = true
"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 2);
        assert_eq!(script.steps[1].attributes["level"], json!(3));
        assert!(script.steps[1].focused);
    }

    #[test]
    fn resolves_positions() {
        let registry = BlockTypeRegistry::with_core_types();
        let step = Step {
            action: "MOVE_DOWN".into(),
            index: Some(1),
            client_id: None,
            after: None,
            name: None,
            attributes: Attributes::new(),
            focused: false,
            html: None,
        };
        assert_eq!(
            step.to_action(&state(), &registry).unwrap(),
            Action::MoveDown {
                client_id: ClientId::from("b")
            }
        );
    }

    #[test]
    fn create_builds_block_from_registry() {
        let registry = BlockTypeRegistry::with_core_types();
        let script = parse_script(
            "[[step]]\naction = \"create\"\nafter = 0\nname = \"paragraph\"\nclient_id = \"new\"\n",
        )
        .unwrap();
        let Action::Create {
            block,
            client_id_above,
        } = script.steps[0].to_action(&state(), &registry).unwrap()
        else {
            panic!("expected create");
        };
        assert_eq!(block.name, "core/paragraph");
        assert_eq!(block.client_id, ClientId::from("new"));
        assert_eq!(block.attribute_str("content"), Some(""));
        assert_eq!(client_id_above, Some(ClientId::from("a")));
    }

    #[test]
    fn reports_bad_steps() {
        let registry = BlockTypeRegistry::with_core_types();
        let script = parse_script(
            "[[step]]\naction = \"delete\"\nindex = 5\n\n[[step]]\naction = \"focus\"\n\n[[step]]\naction = \"set_title\"\n",
        )
        .unwrap();
        assert_eq!(
            script.steps[0].to_action(&state(), &registry),
            Err(ScriptError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(matches!(
            script.steps[1].to_action(&state(), &registry),
            Err(ScriptError::MissingField { field: "index", .. })
        ));
        assert_eq!(
            script.steps[2].to_action(&state(), &registry).unwrap(),
            Action::Other("set_title".into())
        );
    }

    #[test]
    fn apply_steps_drains_notifications_per_step() {
        let registry = Arc::new(BlockTypeRegistry::with_core_types());
        let mut store = Store::with_notifier(Arc::clone(&registry), ChangeLog::new())
            .with_blocks(vec![
                Block::new("core/paragraph", Attributes::new()).with_client_id("a"),
                Block::new("core/paragraph", Attributes::new()).with_client_id("b"),
            ]);
        let script = parse_script(
            "[[step]]\naction = \"move_down\"\nindex = 0\n\n[[step]]\naction = \"move_down\"\nindex = 1\n\n[[step]]\naction = \"delete\"\nindex = 0\n",
        )
        .unwrap();

        let applied = apply_steps(&mut store, &script.steps, &registry).unwrap();
        assert_eq!(applied.len(), 3);
        assert_eq!(applied[0].kind, "MOVE_DOWN");
        assert_eq!(applied[0].changes, vec![ListChange::MoveDown { index: 0 }]);
        assert_eq!(applied[1].outcome, Dispatched::Unchanged);
        assert!(applied[1].changes.is_empty());
        assert_eq!(
            applied[2].changes,
            vec![ListChange::Splice {
                index: 0,
                delete_count: 1,
                inserted: None
            }]
        );
        assert!(store.notifier().changes().is_empty());
        assert_eq!(store.block_at(0).map(|b| b.client_id.as_str()), Some("a"));
    }

    #[test]
    fn apply_steps_stops_at_first_bad_step() {
        let registry = Arc::new(BlockTypeRegistry::with_core_types());
        let mut store = Store::with_notifier(Arc::clone(&registry), ChangeLog::new());
        let script = parse_script("[[step]]\naction = \"focus\"\nindex = 0\n").unwrap();
        let error = apply_steps(&mut store, &script.steps, &registry).unwrap_err();
        assert!(error.starts_with("step 1: index 0 out of range"), "{}", error);
    }
}
