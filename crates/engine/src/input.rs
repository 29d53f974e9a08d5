use serde::{Deserialize, Serialize};

/// Logical intents the simulation consumes; device polling lives with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Fire,
    Loot,
}

const ACTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Fire,
        InputAction::Loot,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Fire => 4,
            InputAction::Loot => 5,
        }
    }
}

/// Which intents are held during one tick. Firing edge detection is the player's job,
/// so a snapshot only ever carries "held" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_actions(actions: &[InputAction]) -> Self {
        let mut snapshot = Self::empty();
        for action in actions {
            snapshot.actions.set(*action, true);
        }
        snapshot
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn held_actions(&self) -> Vec<InputAction> {
        InputAction::ALL
            .into_iter()
            .filter(|action| self.is_down(*action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_and_clears_actions() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::Fire, true)
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveLeft, false);

        assert!(snapshot.is_down(InputAction::Fire));
        assert!(!snapshot.is_down(InputAction::MoveLeft));
        assert_eq!(snapshot.held_actions(), vec![InputAction::Fire]);
    }

    #[test]
    fn actions_deserialize_from_snake_case() {
        let parsed: Vec<InputAction> =
            serde_json::from_str(r#"["move_up", "loot"]"#).expect("actions");
        assert_eq!(parsed, vec![InputAction::MoveUp, InputAction::Loot]);
    }
}
