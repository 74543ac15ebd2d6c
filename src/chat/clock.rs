//! All timestamps are pinned to one wall clock (+05:30) at creation time
//! and are stored that way, so live events and history render identically.

use time::{
    format_description::BorrowedFormatItem,
    macros::{format_description, offset},
    OffsetDateTime, UtcOffset,
};

pub const DISPLAY_OFFSET: UtcOffset = offset!(+5:30);

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]/[month]/[year] - [hour repr:12]:[minute] [period]");

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(DISPLAY_OFFSET)
}

pub fn display(timestamp: OffsetDateTime) -> String {
    timestamp
        .to_offset(DISPLAY_OFFSET)
        .format(DISPLAY_FORMAT)
        .expect("well-formed display format")
}
