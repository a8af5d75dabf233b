// --- File: crates/services/icewatch_cli/src/views.rs ---
//! Plain-text reports over the store, for humans poking at a running poller.

use icewatch_common::{IcewatchError, Snapshot};
use icewatch_db::{DayCursor, DayHandle, DbClient, DbError, StoreTx};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Store(#[from] DbError),
    #[error("Can't write report: {0}")]
    Io(#[from] io::Error),
}

impl From<ViewError> for IcewatchError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Store(e) => e.into(),
            ViewError::Io(e) => e.into(),
        }
    }
}

/// Which days a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryRange {
    /// Today and every later stored day.
    FromToday,
    /// The first two stored days from today.
    TodayAndTomorrow,
    Everything,
}

const HEADER: [&str; 7] = ["Date", "Start", "End", "Pad", "#Academy", "#Other", "Type"];

/// Session table with the latest state of every session, one block per day
/// ordered by start time.
pub async fn write_summary<W: Write>(
    db: &DbClient,
    range: SummaryRange,
    today: &str,
    out: &mut W,
) -> Result<(), ViewError> {
    let mut tx = db.begin_read().await?;
    let (mut days, limit): (DayCursor, Option<usize>) = match range {
        SummaryRange::FromToday => (tx.days_from(today), None),
        SummaryRange::TodayAndTomorrow => (tx.days_from(today), Some(2)),
        SummaryRange::Everything => (tx.all_days(), None),
    };

    let mut rows: Vec<[String; 7]> = vec![HEADER.map(str::to_string)];
    let mut visited = 0;
    while let Some(day) = days.next(&mut tx).await? {
        summarise_day(&mut tx, &day, &mut rows).await?;
        visited += 1;
        if limit.is_some_and(|n| visited >= n) {
            break;
        }
    }
    write_table(out, &rows)?;
    Ok(())
}

async fn summarise_day(
    tx: &mut StoreTx,
    day: &DayHandle,
    rows: &mut Vec<[String; 7]>,
) -> Result<(), DbError> {
    let Some(events) = tx.events_scope(day).await? else {
        return Ok(());
    };
    let mut latest: Vec<Snapshot> = Vec::new();
    for session in tx.sessions(&events).await? {
        if let Some(snapshot) = tx.latest_snapshot(&session).await? {
            latest.push(snapshot);
        }
    }
    latest.sort_by(|a, b| a.record.start_time.cmp(&b.record.start_time));

    for (i, snapshot) in latest.iter().enumerate() {
        let r = &snapshot.record;
        rows.push([
            if i == 0 { day.date().to_string() } else { String::new() },
            r.start_time.clone(),
            r.end_time.clone(),
            r.location.clone(),
            r.academy_booked().to_string(),
            r.other_booked().to_string(),
            r.product_name.clone(),
        ]);
    }
    Ok(())
}

/// Left-aligned columns separated by at least one space.
fn write_table<W: Write>(out: &mut W, rows: &[[String; 7]]) -> io::Result<()> {
    let mut widths = [0usize; 7];
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$} ", cell, width = widths[i]));
            }
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Everything in the store, raw.
pub async fn write_dump<W: Write>(db: &DbClient, out: &mut W) -> Result<(), ViewError> {
    let mut tx = db.begin_read().await?;
    let mut days = tx.all_days();
    while let Some(day) = days.next(&mut tx).await? {
        writeln!(out, "day {}", day.date())?;
        match tx.stored_products_json(&day).await? {
            Some(products) => writeln!(out, "  products={}", products)?,
            None => writeln!(out, "  products=<none>")?,
        }
        let Some(events) = tx.events_scope(&day).await? else {
            continue;
        };
        for session in tx.sessions(&events).await? {
            writeln!(out, "  session {}", session.session_id())?;
            for (seq, payload) in tx.raw_snapshots(&session).await? {
                writeln!(out, "    {} {}", seq, payload)?;
            }
        }
    }
    Ok(())
}
