//! Keyboard and touch mapping
//!
//! Releasing any key (or lifting a finger) is a start/restart request.
//! Space and ArrowUp, or a touch, hold the jump. M toggles the music.

/// A discrete input the session understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Start from the title screen, or restart after game over
    Start,
    JumpPress,
    JumpRelease,
}

fn is_jump_key(code: &str) -> bool {
    matches!(code, "Space" | "ArrowUp")
}

/// Whether releasing this key should flip the mute setting
pub fn is_mute_key(code: &str) -> bool {
    code == "KeyM"
}

/// `keydown` with `KeyboardEvent.code`
pub fn key_down(code: &str, repeat: bool) -> Option<InputAction> {
    (is_jump_key(code) && !repeat).then_some(InputAction::JumpPress)
}

/// `keyup` with `KeyboardEvent.code`
pub fn key_up(code: &str) -> Vec<InputAction> {
    if is_jump_key(code) {
        vec![InputAction::JumpRelease, InputAction::Start]
    } else {
        vec![InputAction::Start]
    }
}

pub fn touch_start() -> InputAction {
    InputAction::JumpPress
}

pub fn touch_end() -> Vec<InputAction> {
    vec![InputAction::JumpRelease, InputAction::Start]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_keys() {
        assert_eq!(key_down("Space", false), Some(InputAction::JumpPress));
        assert_eq!(key_down("ArrowUp", false), Some(InputAction::JumpPress));
        assert_eq!(key_down("Space", true), None);
        assert_eq!(key_down("KeyA", false), None);
    }

    #[test]
    fn test_mute_key_still_starts() {
        assert!(is_mute_key("KeyM"));
        assert!(!is_mute_key("Space"));
        assert_eq!(key_up("KeyM"), vec![InputAction::Start]);
    }

    #[test]
    fn test_any_key_release_starts() {
        assert_eq!(key_up("KeyA"), vec![InputAction::Start]);
        assert_eq!(
            key_up("Space"),
            vec![InputAction::JumpRelease, InputAction::Start]
        );
    }
}
