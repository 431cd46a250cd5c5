//! Tests for tic-tac-toe positions and rules.

use strictly_wager::games::tictactoe::rules::{check_winner, has_line, is_draw, is_full};
use strictly_wager::{Board, Player, Position, Square};

fn board_from(cells: &[(usize, Player)]) -> Board {
    let mut board = Board::new();
    for (cell, player) in cells {
        let pos = Position::from_index(*cell).unwrap();
        board.set(pos, Square::Occupied(*player));
    }
    board
}

#[test]
fn test_position_to_index() {
    assert_eq!(Position::TopLeft.to_index(), 0);
    assert_eq!(Position::Center.to_index(), 4);
    assert_eq!(Position::BottomRight.to_index(), 8);
}

#[test]
fn test_position_from_index() {
    assert_eq!(Position::from_index(0), Some(Position::TopLeft));
    assert_eq!(Position::from_index(4), Some(Position::Center));
    assert_eq!(Position::from_index(8), Some(Position::BottomRight));
    assert_eq!(Position::from_index(9), None);
}

#[test]
fn test_valid_moves_empty_board() {
    let board = Board::new();
    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 9);
}

#[test]
fn test_valid_moves_filters_occupied() {
    let board = board_from(&[(0, Player::One), (4, Player::Two)]);

    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 7);
    assert!(!valid.contains(&Position::TopLeft));
    assert!(!valid.contains(&Position::Center));
    assert!(valid.contains(&Position::BottomRight));
}

#[test]
fn test_column_win_for_player_two() {
    let board = board_from(&[
        (4, Player::One),
        (0, Player::Two),
        (2, Player::One),
        (6, Player::Two),
        (5, Player::One),
        (3, Player::Two),
    ]);
    assert!(has_line(&board, Player::Two));
    assert!(!has_line(&board, Player::One));
    assert_eq!(check_winner(&board), Some(Player::Two));
}

#[test]
fn test_full_board_without_line_is_draw() {
    let board = board_from(&[
        (2, Player::One),
        (4, Player::Two),
        (6, Player::One),
        (3, Player::Two),
        (5, Player::One),
        (8, Player::Two),
        (0, Player::One),
        (1, Player::Two),
        (7, Player::One),
    ]);
    assert!(is_full(&board));
    assert!(is_draw(&board));
    assert_eq!(check_winner(&board), None);
}

#[test]
fn test_full_board_with_line_is_not_draw() {
    let board = board_from(&[
        (2, Player::One),
        (1, Player::Two),
        (7, Player::One),
        (3, Player::Two),
        (0, Player::One),
        (5, Player::Two),
        (4, Player::One),
        (6, Player::Two),
        (8, Player::One),
    ]);
    assert!(is_full(&board));
    assert!(!is_draw(&board));
    assert!(has_line(&board, Player::One));
}
