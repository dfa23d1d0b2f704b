//! Tests for the modal selection protocol

use normtree::chooser::{Chooser, Key, Verdict};
use rstest::rstest;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Select mode
// ============================================================

#[test]
fn given_three_candidates_when_down_down_enter_then_third_selected() {
    let verdict =
        Chooser::select(names(&["A", "B", "C"])).run([Key::Down, Key::Down, Key::Enter]);
    assert_eq!(verdict, Verdict::Node(2));
}

#[test]
fn given_escape_at_start_then_cancelled() {
    let verdict = Chooser::select(names(&["A", "B", "C"])).run([Key::Escape]);
    assert_eq!(verdict, Verdict::Cancelled);
}

#[test]
fn given_select_mode_when_down_past_end_then_cursor_clamps() {
    let mut chooser = Chooser::select(names(&["A", "B"]));
    for _ in 0..5 {
        chooser.handle(Key::Down);
    }
    assert_eq!(chooser.cursor(), 1);
    assert_eq!(chooser.handle(Key::Enter), Some(Verdict::Node(1)));
}

#[test]
fn given_empty_candidate_list_when_enter_then_cancelled() {
    // No index into an empty list may ever be committed
    let verdict = Chooser::select(Vec::new()).run([Key::Enter]);
    assert_eq!(verdict, Verdict::Cancelled);
}

#[test]
fn given_select_mode_when_up_at_zero_then_no_op() {
    let mut chooser = Chooser::select(names(&["A", "B"]));
    chooser.handle(Key::Up);
    assert_eq!(chooser.cursor(), 0);
}

// ============================================================
// Insert mode
// ============================================================

#[test]
fn given_two_children_when_up_then_down_three_times_then_gap_two_committed() {
    let mut chooser = Chooser::insert(names(&["A", "B"]), "X");

    chooser.handle(Key::Up);
    assert_eq!(chooser.cursor(), 0, "Up at the lower bound is a no-op");

    chooser.handle(Key::Down);
    chooser.handle(Key::Down);
    chooser.handle(Key::Down);
    assert_eq!(chooser.cursor(), 2, "Down clamps at the last gap");

    assert_eq!(chooser.handle(Key::Enter), Some(Verdict::Slot(2)));
}

#[rstest]
#[case(0, &["-> {X}", "-> A", "-> B"])]
#[case(1, &["-> A", "-> {X}", "-> B"])]
#[case(2, &["-> A", "-> B", "-> {X}"])]
fn given_insert_mode_then_placeholder_tracks_cursor(
    #[case] downs: usize,
    #[case] expected: &[&str],
) {
    let mut chooser = Chooser::insert(names(&["A", "B"]), "X");
    for _ in 0..downs {
        chooser.handle(Key::Down);
    }
    let texts: Vec<String> = chooser.lines().into_iter().map(|(t, _)| t).collect();
    assert_eq!(texts, expected);
}

#[test]
fn given_insert_mode_then_exactly_one_line_under_cursor() {
    let chooser = Chooser::insert(names(&["A", "B", "C"]), "X");
    let cursor_lines = chooser.lines().iter().filter(|(_, c)| *c).count();
    assert_eq!(cursor_lines, 1);
}

// ============================================================
// Move mode
// ============================================================

#[test]
fn given_move_mode_then_cursor_starts_at_original_position() {
    // Moving "B" out of [A, B, C]: remaining list [A, C], original position 1
    let chooser = Chooser::moving(names(&["A", "C"]), "B", 1);
    assert_eq!(chooser.cursor(), 1);
}

#[test]
fn given_move_mode_when_enter_immediately_then_original_gap_committed() {
    let verdict = Chooser::moving(names(&["A", "C"]), "B", 1).run([Key::Enter]);
    assert_eq!(verdict, Verdict::Slot(1));
}

#[test]
fn given_move_mode_when_down_past_remaining_then_clamps_at_last_gap() {
    let mut chooser = Chooser::moving(names(&["A", "C"]), "B", 0);
    for _ in 0..5 {
        chooser.handle(Key::Down);
    }
    // Two remaining candidates leave gaps 0..=2
    assert_eq!(chooser.cursor(), 2);
}

#[test]
fn given_move_mode_then_placeholder_shows_moved_node_name() {
    let chooser = Chooser::moving(names(&["A", "C"]), "B", 1);
    let texts: Vec<String> = chooser.lines().into_iter().map(|(t, _)| t).collect();
    assert_eq!(texts, vec!["-> A", "-> {B}", "-> C"]);
}

// ============================================================
// Session protocol
// ============================================================

#[test]
fn given_escape_mid_navigation_then_cancelled() {
    let verdict = Chooser::insert(names(&["A", "B"]), "X").run([Key::Down, Key::Escape]);
    assert_eq!(verdict, Verdict::Cancelled);
}

#[test]
fn given_event_stream_ending_without_commit_then_cancelled() {
    let verdict = Chooser::select(names(&["A"])).run([Key::Down, Key::Up]);
    assert_eq!(verdict, Verdict::Cancelled);
}
