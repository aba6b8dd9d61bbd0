use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{Seat, SeatRecord, SeatStatus, SeatType};

/// Переводит записи сервиса бронирования в места схемы.
///
/// Парность типа места определяется здесь, один раз. Записи с негодной
/// буквой ряда или нулевой колонкой отбрасываются с предупреждением.
pub fn ingest_seats<S: AsRef<str>>(records: &[SeatRecord], couple_markers: &[S]) -> Vec<Seat> {
    records
        .iter()
        .filter_map(|record| ingest_seat(record, couple_markers))
        .collect()
}

fn ingest_seat<S: AsRef<str>>(record: &SeatRecord, couple_markers: &[S]) -> Option<Seat> {
    let Some(row_label) = parse_row_label(&record.row_label) else {
        warn!("Seat {} has unusable row label {:?}, skipped", record.id, record.row_label);
        return None;
    };

    let column_number = match u32::try_from(record.column_number) {
        Ok(c) if c > 0 => c,
        _ => {
            warn!("Seat {} has invalid column {}, skipped", record.id, record.column_number);
            return None;
        }
    };

    Some(Seat {
        id: record.id,
        row_label,
        column_number,
        seat_type: SeatType::from_name(record.seat_type_id, record.seat_type_name.clone(), couple_markers),
        status: SeatStatus::parse_lenient(&record.status),
        price: record.price.unwrap_or(Decimal::ZERO),
    })
}

fn parse_row_label(raw: &str) -> Option<char> {
    let mut chars = raw.trim().chars();
    let label = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !label.is_ascii_uppercase() {
        return None;
    }
    Some(label)
}
