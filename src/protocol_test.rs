use super::*;
use crate::game::MoveError;
use serde_json::json;
use uuid::Uuid;

#[test]
fn decodes_move_action() {
    let action = decode_action(r#"{"action":"move","player":"X","positionToMark":4}"#).unwrap();
    assert_eq!(action, ClientAction::Move { player: Symbol::X, position: 4 });
}

#[test]
fn decodes_reset_action() {
    assert_eq!(decode_action(r#"{"action":"reset"}"#).unwrap(), ClientAction::Reset);
}

#[test]
fn negative_position_still_decodes() {
    let action = decode_action(r#"{"action":"move","player":"O","positionToMark":-3}"#).unwrap();
    assert_eq!(action, ClientAction::Move { player: Symbol::O, position: -3 });
}

#[test]
fn huge_whole_positions_decode_as_out_of_range() {
    let action = decode_action(r#"{"action":"move","player":"X","positionToMark":99999999999999999999}"#).unwrap();
    let ClientAction::Move { position, .. } = action else {
        panic!("expected a move");
    };
    assert_eq!(position, i64::MAX);

    let action = decode_action(r#"{"action":"move","player":"X","positionToMark":-1e30}"#).unwrap();
    assert_eq!(action, ClientAction::Move { player: Symbol::X, position: i64::MIN });

    let action = decode_action(r#"{"action":"move","player":"O","positionToMark":2.0}"#).unwrap();
    assert_eq!(action, ClientAction::Move { player: Symbol::O, position: 2 });
}

#[test]
fn fractional_or_non_numeric_position_is_malformed() {
    for payload in [
        r#"{"action":"move","player":"X","positionToMark":1.5}"#,
        r#"{"action":"move","player":"X","positionToMark":"4"}"#,
        r#"{"action":"move","player":"X","positionToMark":null}"#,
    ] {
        let err = decode_action(payload).unwrap_err();
        assert_eq!(err.error_code(), "E_MALFORMED", "{payload}");
    }
}

#[test]
fn garbage_is_malformed() {
    let err = decode_action("not json").unwrap_err();
    assert_eq!(err.error_code(), "E_MALFORMED");
    assert!(err.to_string().starts_with("invalid json"));
}

#[test]
fn unknown_action_and_player_are_malformed() {
    assert!(decode_action(r#"{"action":"undo"}"#).is_err());
    assert!(decode_action(r#"{"action":"move","player":"Z","positionToMark":1}"#).is_err());
    assert!(decode_action(r#"{"action":"move","player":"spectator","positionToMark":1}"#).is_err());
    assert!(decode_action(r#"{"action":"move","player":"X"}"#).is_err());
    assert!(decode_action(r#"{"player":"X","positionToMark":1}"#).is_err());
}

#[test]
fn snapshot_uses_wire_field_names() {
    let mut game = Game::new();
    game.assign_role(Uuid::new_v4());
    let msg = ServerMessage::snapshot(&game, Role::X, "Waiting for an opponent...");

    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        json!({
            "board": ["", "", "", "", "", "", "", "", ""],
            "nextTurn": "X",
            "winner": null,
            "message": "Waiting for an opponent...",
            "gameStatus": "waiting",
            "yourSymbol": "X",
        })
    );
}

#[test]
fn spectator_role_and_null_turn_serialize() {
    let mut game = Game::new();
    let x = Uuid::new_v4();
    game.assign_role(x);
    game.assign_role(Uuid::new_v4());
    game.release_role(x);

    let value = serde_json::to_value(ServerMessage::snapshot(&game, Role::Spectator, "bye")).unwrap();
    assert_eq!(value["yourSymbol"], "spectator");
    assert_eq!(value["nextTurn"], serde_json::Value::Null);
    assert_eq!(value["gameStatus"], "finished");
}

#[test]
fn error_code_is_attached_when_present() {
    let game = Game::new();
    let msg = ServerMessage::snapshot(&game, Role::O, "nope").with_error(&MoveError::CellOccupied(2));
    let json = msg.encode().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["error"], "E_CELL_OCCUPIED");

    let restored: ServerMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, msg);
}
