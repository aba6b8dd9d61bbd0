use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type SeatId = i64;

/// Маркеры парных ("couple") мест по умолчанию, сравниваются без учета регистра.
pub const DEFAULT_COUPLE_MARKERS: &[&str] = &["couple", "đôi"];

/// Как тип места раскладывается на схеме зала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pairing {
    Single,
    Paired,
}

impl Pairing {
    /// Определяет парность по названию типа. Вызывается один раз при загрузке мест.
    pub fn from_type_name<S: AsRef<str>>(name: &str, markers: &[S]) -> Self {
        let name = name.to_lowercase();
        let paired = markers
            .iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .any(|m| !m.is_empty() && name.contains(&m));

        if paired {
            Pairing::Paired
        } else {
            Pairing::Single
        }
    }

    /// Сколько зрителей занимает одна единица выбора.
    pub fn occupants(self) -> u32 {
        match self {
            Pairing::Single => 1,
            Pairing::Paired => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatType {
    pub id: i64,
    pub name: String,
    pub pairing: Pairing,
}

impl SeatType {
    pub fn from_name<S: AsRef<str>>(id: i64, name: impl Into<String>, markers: &[S]) -> Self {
        let name = name.into();
        let pairing = Pairing::from_type_name(&name, markers);
        Self { id, name, pairing }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatStatus {
    Empty,
    Reserved,
    Disabled,
}

impl SeatStatus {
    // Неизвестный статус трактуем как недоступное место
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "EMPTY" | "FREE" | "AVAILABLE" => SeatStatus::Empty,
            "RESERVED" | "SOLD" | "BOOKED" => SeatStatus::Reserved,
            _ => SeatStatus::Disabled,
        }
    }

    pub fn is_selectable(self) -> bool {
        self == SeatStatus::Empty
    }
}

/// Адрес места на схеме: буква ряда и номер колонки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatKey {
    pub row: char,
    pub column: u32,
}

impl SeatKey {
    pub fn new(row: char, column: u32) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for SeatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

/// Буква ряда по его порядковому номеру: 0 -> 'A'.
pub fn row_label_for_index(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'A' + i) as char)
}

/// Порядковый номер ряда по букве: 'A' -> 0.
pub fn row_index(label: char) -> Option<usize> {
    label
        .is_ascii_uppercase()
        .then(|| (label as u8 - b'A') as usize)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub row_label: char,
    pub column_number: u32,
    pub seat_type: SeatType,
    pub status: SeatStatus,
    pub price: Decimal,
}

impl Seat {
    pub fn key(&self) -> SeatKey {
        SeatKey::new(self.row_label, self.column_number)
    }

    pub fn row_index(&self) -> Option<usize> {
        row_index(self.row_label)
    }

    pub fn is_paired(&self) -> bool {
        self.seat_type.pairing == Pairing::Paired
    }
}

/// Место в том виде, в каком его отдает сервис бронирования.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRecord {
    pub id: SeatId,
    pub row_label: String,
    pub column_number: i64,
    pub seat_type_id: i64,
    pub seat_type_name: String,
    pub status: String,
    #[serde(default)]
    pub price: Option<Decimal>,
}
