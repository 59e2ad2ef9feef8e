use super::*;
use chrono::{TimeZone, Utc};

fn deal(company: &str, stage: Stage, position: i64) -> Deal {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Deal {
        id: DealId::new(),
        company: company.to_string(),
        sector: None,
        funding_stage: None,
        founders: None,
        stage,
        notes: None,
        next_step: None,
        internal_owner: None,
        position,
        created_at: at,
        updated_at: at,
    }
}

fn companies(board: &StageBoard, stage: Stage) -> Vec<String> {
    board.deals(stage).map(|deal| deal.company.clone()).collect()
}

fn abc_board() -> (StageBoard, [DealId; 3]) {
    let a = deal("A", Stage::New, 0);
    let b = deal("B", Stage::New, 1);
    let c = deal("C", Stage::New, 2);
    let ids = [a.id, b.id, c.id];
    (StageBoard::from_deals(vec![a, b, c]), ids)
}

#[test]
fn load_groups_by_stage_keeping_input_order() {
    let board = StageBoard::from_deals(vec![
        deal("Acme", Stage::New, 0),
        deal("Globex", Stage::Committee, 0),
        deal("Initech", Stage::New, 1),
        deal("Umbrella", Stage::Committee, 1),
    ]);

    assert_eq!(board.len(), 4);
    assert_eq!(companies(&board, Stage::New), ["Acme", "Initech"]);
    assert_eq!(companies(&board, Stage::Committee), ["Globex", "Umbrella"]);
    for stage in [Stage::Talking, Stage::Analyzing, Stage::Invested, Stage::Archived] {
        assert!(board.lane(stage).is_empty());
    }
}

#[test]
fn loading_the_same_listing_twice_yields_the_same_board() {
    let listing = vec![
        deal("Acme", Stage::New, 0),
        deal("Globex", Stage::Analyzing, 0),
        deal("Initech", Stage::Analyzing, 1),
    ];

    let mut board = StageBoard::from_deals(listing.clone());
    let first = board.snapshot();
    board.load(listing);
    assert_eq!(board.snapshot(), first);
}

#[test]
fn load_replaces_previous_contents() {
    let (mut board, _) = abc_board();
    board.load(vec![deal("Solo", Stage::Archived, 0)]);

    assert_eq!(board.len(), 1);
    assert!(board.lane(Stage::New).is_empty());
    assert_eq!(companies(&board, Stage::Archived), ["Solo"]);
}

#[test]
fn duplicate_ids_keep_the_last_occurrence() {
    let first = deal("Old name", Stage::New, 0);
    let mut second = first.clone();
    second.company = "New name".to_string();
    second.stage = Stage::Talking;

    let board = StageBoard::from_deals(vec![first.clone(), second]);

    assert_eq!(board.len(), 1);
    assert!(board.lane(Stage::New).is_empty());
    assert_eq!(board.lane(Stage::Talking), [first.id]);
    assert_eq!(board.deal(first.id).unwrap().company, "New name");
}

#[test]
fn move_first_to_last_within_stage() {
    let (mut board, [a, b, c]) = abc_board();

    board.move_within_stage(Stage::New, 0, 2).unwrap();

    assert_eq!(board.lane(Stage::New), [b, c, a]);
}

#[test]
fn move_last_to_first_within_stage() {
    let (mut board, [a, b, c]) = abc_board();

    board.move_within_stage(Stage::New, 2, 0).unwrap();

    assert_eq!(board.lane(Stage::New), [c, a, b]);
}

#[test]
fn same_slot_move_is_a_no_op() {
    let (mut board, _) = abc_board();
    let before = board.clone();

    board.move_within_stage(Stage::New, 1, 1).unwrap();

    assert_eq!(board, before);
}

#[test]
fn within_stage_move_rejects_out_of_range_indices() {
    let (mut board, _) = abc_board();
    let before = board.clone();

    let err = board.move_within_stage(Stage::New, 0, 3).unwrap_err();
    assert_eq!(
        err,
        BoardError::IndexOutOfRange {
            stage: Stage::New,
            index: 3,
            len: 3
        }
    );
    assert!(board.move_within_stage(Stage::New, 5, 0).is_err());
    assert!(board.move_within_stage(Stage::Talking, 0, 0).is_err());
    assert_eq!(board, before);
}

#[test]
fn transfer_inserts_at_index_and_retags_stage() {
    let x = deal("X", Stage::New, 0);
    let p = deal("P", Stage::Analyzing, 0);
    let q = deal("Q", Stage::Analyzing, 1);
    let (x_id, p_id, q_id) = (x.id, p.id, q.id);
    let mut board = StageBoard::from_deals(vec![x, p, q]);

    let moved = board
        .transfer_between_stages(Stage::New, Stage::Analyzing, 0, 1)
        .unwrap();

    assert_eq!(moved, x_id);
    assert!(board.lane(Stage::New).is_empty());
    assert_eq!(board.lane(Stage::Analyzing), [p_id, x_id, q_id]);
    assert_eq!(board.deal(x_id).unwrap().stage, Stage::Analyzing);
    assert_eq!(board.len(), 3);
}

#[test]
fn transfer_into_empty_stage() {
    let (mut board, [a, b, c]) = abc_board();

    board
        .transfer_between_stages(Stage::New, Stage::Invested, 1, 0)
        .unwrap();

    assert_eq!(board.lane(Stage::Invested), [b]);
    assert_eq!(board.lane(Stage::New), [a, c]);
}

#[test]
fn transfer_may_append_at_destination_length() {
    let x = deal("X", Stage::New, 0);
    let p = deal("P", Stage::Talking, 0);
    let (x_id, p_id) = (x.id, p.id);
    let mut board = StageBoard::from_deals(vec![x, p]);

    board
        .transfer_between_stages(Stage::New, Stage::Talking, 0, 1)
        .unwrap();

    assert_eq!(board.lane(Stage::Talking), [p_id, x_id]);
}

#[test]
fn transfer_validates_before_mutating() {
    let (mut board, _) = abc_board();
    let before = board.clone();

    assert_eq!(
        board.transfer_between_stages(Stage::New, Stage::Talking, 0, 1),
        Err(BoardError::IndexOutOfRange {
            stage: Stage::Talking,
            index: 1,
            len: 0
        })
    );
    assert!(board
        .transfer_between_stages(Stage::New, Stage::Talking, 3, 0)
        .is_err());
    assert_eq!(
        board.transfer_between_stages(Stage::New, Stage::New, 0, 1),
        Err(BoardError::SameStage(Stage::New))
    );
    assert_eq!(board, before);
}

#[test]
fn relocate_dispatches_on_stage() {
    let (mut board, [a, b, c]) = abc_board();

    board
        .relocate(BoardSlot::new(Stage::New, 0), BoardSlot::new(Stage::New, 2))
        .unwrap();
    assert_eq!(board.lane(Stage::New), [b, c, a]);

    board
        .relocate(BoardSlot::new(Stage::New, 1), BoardSlot::new(Stage::Committee, 0))
        .unwrap();
    assert_eq!(board.lane(Stage::New), [b, a]);
    assert_eq!(board.lane(Stage::Committee), [c]);
}

#[test]
fn every_deal_stays_in_exactly_one_stage() {
    let (mut board, ids) = abc_board();

    board
        .relocate(BoardSlot::new(Stage::New, 2), BoardSlot::new(Stage::Talking, 0))
        .unwrap();
    board
        .relocate(BoardSlot::new(Stage::Talking, 0), BoardSlot::new(Stage::Archived, 0))
        .unwrap();
    board
        .relocate(BoardSlot::new(Stage::New, 0), BoardSlot::new(Stage::New, 1))
        .unwrap();

    let total: usize = Stage::ALL.iter().map(|stage| board.lane(*stage).len()).sum();
    assert_eq!(total, ids.len());
    for id in ids {
        let slot = board.locate(id).unwrap();
        assert_eq!(board.deal_at(slot), Some(id));
        assert_eq!(board.deal(id).unwrap().stage, slot.stage);
    }
}

#[test]
fn locate_and_deal_at_agree() {
    let (board, [_, b, _]) = abc_board();

    assert_eq!(board.locate(b), Some(BoardSlot::new(Stage::New, 1)));
    assert_eq!(board.deal_at(BoardSlot::new(Stage::New, 1)), Some(b));
    assert_eq!(board.deal_at(BoardSlot::new(Stage::New, 3)), None);
    assert_eq!(board.locate(DealId::new()), None);
}

#[test]
fn snapshot_lists_deals_per_stage() {
    let (mut board, [a, b, c]) = abc_board();
    board
        .relocate(BoardSlot::new(Stage::New, 0), BoardSlot::new(Stage::Talking, 0))
        .unwrap();

    let snapshot = board.snapshot();

    assert_eq!(snapshot.ids(Stage::New), [b, c]);
    assert_eq!(snapshot.ids(Stage::Talking), [a]);
    assert_eq!(snapshot.lane(Stage::Talking)[0].stage, Stage::Talking);
    let stages: Vec<Stage> = snapshot.iter().map(|(stage, _)| stage).collect();
    assert_eq!(stages, Stage::ALL);
}
