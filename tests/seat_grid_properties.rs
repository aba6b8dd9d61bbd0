use std::collections::BTreeSet;

use cinema_seating::models::seat::{row_label_for_index, DEFAULT_COUPLE_MARKERS};
use cinema_seating::models::{Pairing, Seat, SeatRecord, SeatStatus, SeatType};
use cinema_seating::seating::{
    build_grid, ingest_seats, occupants_for_selection, price_for_selection, units_for_row,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const STANDARD_PRICE: i64 = 75_000;
const COUPLE_PRICE: i64 = 150_000;

fn seat(id: i64, row: char, column: u32, pairing: Pairing) -> Seat {
    let (name, price) = match pairing {
        Pairing::Single => ("Standard", STANDARD_PRICE),
        Pairing::Paired => ("Couple", COUPLE_PRICE),
    };
    Seat {
        id,
        row_label: row,
        column_number: column,
        seat_type: SeatType { id: 1, name: name.into(), pairing },
        status: SeatStatus::Empty,
        price: Decimal::new(price, 0),
    }
}

fn record(id: i64, row: &str, column: i64, type_name: &str) -> SeatRecord {
    SeatRecord {
        id,
        row_label: row.into(),
        column_number: column,
        seat_type_id: 1,
        seat_type_name: type_name.into(),
        status: "EMPTY".into(),
        price: Some(Decimal::new(STANDARD_PRICE, 0)),
    }
}

/// Зал из описаний рядов: (парный ли ряд, ширина ряда в колонках).
fn hall(rows: &[(bool, u32)]) -> Vec<Seat> {
    let mut seats = Vec::new();
    let mut next_id = 1;
    for (index, (couple, width)) in rows.iter().enumerate() {
        let Some(label) = row_label_for_index(index) else {
            break;
        };
        let pairing = if *couple { Pairing::Paired } else { Pairing::Single };
        for column in 1..=*width {
            seats.push(seat(next_id, label, column, pairing));
            next_id += 1;
        }
    }
    seats
}

fn rows_strategy() -> impl Strategy<Value = Vec<(bool, u32)>> {
    prop::collection::vec((any::<bool>(), 1u32..=14), 0..10)
}

proptest! {
    #[test]
    fn every_seat_is_reachable_by_its_key(rows in rows_strategy()) {
        let seats = hall(&rows);
        let grid = build_grid(&seats);

        prop_assert_eq!(grid.len(), seats.len());
        for seat in &seats {
            prop_assert_eq!(grid.seat_at(seat.row_label, seat.column_number), Some(seat));
        }
    }

    #[test]
    fn couple_rows_are_exactly_rows_with_paired_seats(rows in rows_strategy()) {
        let grid = build_grid(&hall(&rows));

        let expected: BTreeSet<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, (couple, _))| *couple)
            .map(|(index, _)| index)
            .collect();
        prop_assert_eq!(grid.couple_rows(), &expected);
        prop_assert_eq!(grid.row_count(), rows.len());
    }

    #[test]
    fn couple_rows_never_expose_even_columns(rows in rows_strategy()) {
        let grid = build_grid(&hall(&rows));
        let width = grid.column_count() / 2;

        for label in grid.row_labels() {
            if !grid.is_couple_row(label) {
                continue;
            }
            let units = units_for_row(&grid, label);
            prop_assert!(units.len() as u32 <= width);
            for unit in &units {
                prop_assert_eq!(unit.primary.column_number % 2, 1);
                prop_assert_eq!(unit.span(), 2);
            }
        }
    }

    #[test]
    fn pairs_are_priced_once_in_any_order(width in 1u32..=6, picks in prop::collection::vec(0usize..12, 1..12)) {
        // ряд A задает ширину, ряд B парный
        let seats = hall(&[(false, width * 2), (true, width * 2)]);
        let grid = build_grid(&seats);

        let couple_ids: Vec<i64> = seats
            .iter()
            .filter(|s| s.row_label == 'B')
            .map(|s| s.id)
            .collect();
        let selection: Vec<i64> = picks
            .iter()
            .map(|i| couple_ids[i % couple_ids.len()])
            .collect();

        let distinct_pairs: BTreeSet<u32> = selection
            .iter()
            .filter_map(|id| seats.iter().find(|s| s.id == *id))
            .map(|s| (s.column_number + 1) / 2)
            .collect();

        prop_assert_eq!(
            price_for_selection(&selection, &grid),
            Decimal::new(COUPLE_PRICE, 0) * Decimal::from(distinct_pairs.len() as u64)
        );
        prop_assert_eq!(
            occupants_for_selection(&selection, &grid),
            2 * distinct_pairs.len() as u32
        );
    }
}

#[test]
fn standard_row_sets_width_for_sparse_couple_row() {
    let mut records: Vec<SeatRecord> = (1..=10).map(|c| record(c, "A", c, "Standard")).collect();
    for (i, column) in [1, 3, 5, 7].into_iter().enumerate() {
        records.push(record(100 + i as i64, "B", column, "Ghế đôi"));
    }
    let grid = build_grid(&ingest_seats(&records, DEFAULT_COUPLE_MARKERS));

    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.column_count(), 10);
    assert_eq!(grid.couple_rows(), &BTreeSet::from([1]));

    let units = units_for_row(&grid, 'B');
    let columns: Vec<u32> = units.iter().map(|u| u.primary.column_number).collect();
    assert_eq!(columns, [1, 3, 5, 7]);
    assert!(units.iter().all(|u| u.span() == 2));
}

#[test]
fn both_halves_of_a_pair_cost_one_pair() {
    let seats = vec![
        seat(1, 'A', 1, Pairing::Single),
        seat(2, 'A', 2, Pairing::Single),
        seat(11, 'B', 1, Pairing::Paired),
        seat(12, 'B', 2, Pairing::Paired),
    ];
    let grid = build_grid(&seats);

    assert_eq!(price_for_selection(&[11, 12], &grid), Decimal::new(COUPLE_PRICE, 0));
    assert_eq!(price_for_selection(&[12, 11], &grid), Decimal::new(COUPLE_PRICE, 0));
}

#[test]
fn empty_seat_list_builds_empty_grid() {
    let grid = build_grid(&[]);

    assert_eq!(grid.row_count(), 0);
    assert_eq!(grid.column_count(), 0);
    assert!(grid.is_empty());
    assert!(grid.couple_rows().is_empty());
}

#[test]
fn localized_couple_names_flip_rows() {
    let mut records: Vec<SeatRecord> = (1..=4).map(|c| record(c, "A", c, "Standard")).collect();
    records.push(record(20, "B", 1, "VIP Couple"));
    records.push(record(21, "C", 1, "ĐÔI"));
    records.push(record(22, "D", 1, "couple"));

    let grid = build_grid(&ingest_seats(&records, DEFAULT_COUPLE_MARKERS));

    assert_eq!(grid.couple_rows(), &BTreeSet::from([1, 2, 3]));
    assert!(!grid.is_couple_row('A'));
}
