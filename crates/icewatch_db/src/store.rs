//! Transactional access to the day → events → session → snapshot tree.
//!
//! Handles are plain keys; they are only meaningful inside the transaction
//! that produced them, and every operation goes through a [`StoreTx`].

use icewatch_common::{ProductId, Snapshot};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, trace};

use crate::error::DbError;

/// A day bucket, keyed `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayHandle {
    date: String,
}

impl DayHandle {
    pub fn date(&self) -> &str {
        &self.date
    }
}

/// The events scope of a day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventsHandle {
    date: String,
}

impl EventsHandle {
    pub fn date(&self) -> &str {
        &self.date
    }
}

/// One session's snapshot sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    date: String,
    session_id: String,
}

impl SessionHandle {
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Serializes a product list exactly as it is stored.
pub fn encode_products(products: &[ProductId]) -> Result<String, DbError> {
    serde_json::to_string(products).map_err(|source| DbError::Encode {
        what: "product list",
        source,
    })
}

/// One open transaction over the store.
///
/// Dropping it without [`StoreTx::commit`] rolls every write back.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
    read_only: bool,
}

impl StoreTx {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, read_only: bool) -> Self {
        Self { tx, read_only }
    }

    fn writable(&self) -> Result<(), DbError> {
        if self.read_only {
            Err(DbError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Make every write of this transaction durable.
    pub async fn commit(self) -> Result<(), DbError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    /// Returns the day bucket, creating it if needed; the flag is `true`
    /// when it did not exist before.
    pub async fn ensure_day(&mut self, date: &str) -> Result<(DayHandle, bool), DbError> {
        self.writable()?;
        let created = sqlx::query("INSERT INTO days (date) VALUES (?1) ON CONFLICT(date) DO NOTHING")
            .bind(date)
            .execute(&mut *self.tx)
            .await?
            .rows_affected()
            == 1;
        if created {
            debug!("Created day bucket {}", date);
        }
        Ok((
            DayHandle {
                date: date.to_string(),
            },
            created,
        ))
    }

    /// Looks a day up without creating it.
    pub async fn day(&mut self, date: &str) -> Result<Option<DayHandle>, DbError> {
        let found = sqlx::query_scalar::<_, String>("SELECT date FROM days WHERE date = ?1")
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(found.map(|date| DayHandle { date }))
    }

    /// Lazily walks days from `date` (inclusive) in ascending order.
    pub fn days_from(&self, date: &str) -> DayCursor {
        DayCursor {
            position: CursorPosition::AtOrAfter(date.to_string()),
        }
    }

    /// Lazily walks every stored day in ascending order.
    pub fn all_days(&self) -> DayCursor {
        DayCursor {
            position: CursorPosition::AtOrAfter(String::new()),
        }
    }

    /// The raw serialized product list, if one was ever written.
    pub async fn stored_products_json(&mut self, day: &DayHandle) -> Result<Option<String>, DbError> {
        let stored = sqlx::query_scalar::<_, Option<String>>("SELECT products FROM days WHERE date = ?1")
            .bind(&day.date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stored.flatten())
    }

    /// The day's products in stored order, without duplicates.
    ///
    /// A day whose list was never written has no products; a list that does
    /// not decode is an error.
    pub async fn products(&mut self, day: &DayHandle) -> Result<Vec<ProductId>, DbError> {
        let Some(raw) = self.stored_products_json(day).await? else {
            return Ok(Vec::new());
        };
        let decoded: Vec<ProductId> =
            serde_json::from_str(&raw).map_err(|source| DbError::Decode {
                what: "product list",
                key: day.date.clone(),
                source,
            })?;

        let mut products = Vec::with_capacity(decoded.len());
        for product in decoded {
            if !products.contains(&product) {
                products.push(product);
            }
        }
        Ok(products)
    }

    /// Overwrites the day's product list with an already serialized value.
    pub async fn put_products_json(&mut self, day: &DayHandle, json: &str) -> Result<(), DbError> {
        self.writable()?;
        let updated = sqlx::query("UPDATE days SET products = ?1 WHERE date = ?2")
            .bind(json)
            .bind(&day.date)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(DbError::MissingDay(day.date.clone()));
        }
        Ok(())
    }

    /// Serializes and stores `products` for the day.
    pub async fn put_products(&mut self, day: &DayHandle, products: &[ProductId]) -> Result<(), DbError> {
        let json = encode_products(products)?;
        self.put_products_json(day, &json).await
    }

    /// The day's events scope, created on first use.
    pub async fn get_or_create_events_scope(&mut self, day: &DayHandle) -> Result<EventsHandle, DbError> {
        self.writable()?;
        let updated = sqlx::query("UPDATE days SET has_events = 1 WHERE date = ?1")
            .bind(&day.date)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(DbError::MissingDay(day.date.clone()));
        }
        Ok(EventsHandle {
            date: day.date.clone(),
        })
    }

    /// The day's events scope if any pass has recorded events for it.
    pub async fn events_scope(&mut self, day: &DayHandle) -> Result<Option<EventsHandle>, DbError> {
        let flag = sqlx::query_scalar::<_, i64>("SELECT has_events FROM days WHERE date = ?1")
            .bind(&day.date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(match flag {
            Some(1) => Some(EventsHandle {
                date: day.date.clone(),
            }),
            _ => None,
        })
    }

    /// The session's scope under `events`, created on first use.
    pub async fn get_or_create_session(
        &mut self,
        events: &EventsHandle,
        session_id: &str,
    ) -> Result<SessionHandle, DbError> {
        self.writable()?;
        sqlx::query(
            "INSERT INTO sessions (date, session_id) VALUES (?1, ?2) ON CONFLICT(date, session_id) DO NOTHING",
        )
        .bind(&events.date)
        .bind(session_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(SessionHandle {
            date: events.date.clone(),
            session_id: session_id.to_string(),
        })
    }

    /// Remembers which product listed the session, for calendar routing.
    pub async fn set_session_product(
        &mut self,
        session: &SessionHandle,
        product: &ProductId,
    ) -> Result<(), DbError> {
        self.writable()?;
        sqlx::query(
            "UPDATE sessions SET product = ?3 WHERE date = ?1 AND session_id = ?2 AND product IS NOT ?3",
        )
        .bind(&session.date)
        .bind(&session.session_id)
        .bind(product.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn session_product(&mut self, session: &SessionHandle) -> Result<Option<ProductId>, DbError> {
        let product = sqlx::query_scalar::<_, Option<String>>(
            "SELECT product FROM sessions WHERE date = ?1 AND session_id = ?2",
        )
        .bind(&session.date)
        .bind(&session.session_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(product.flatten().map(ProductId::new))
    }

    /// Every session under `events`, ascending by session id.
    pub async fn sessions(&mut self, events: &EventsHandle) -> Result<Vec<SessionHandle>, DbError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT session_id FROM sessions WHERE date = ?1 ORDER BY session_id",
        )
        .bind(&events.date)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids
            .into_iter()
            .map(|session_id| SessionHandle {
                date: events.date.clone(),
                session_id,
            })
            .collect())
    }

    /// Appends `snapshot` under the next sequence number and returns it.
    pub async fn append_snapshot(&mut self, session: &SessionHandle, snapshot: &Snapshot) -> Result<u64, DbError> {
        self.writable()?;
        let payload = serde_json::to_string(snapshot).map_err(|source| DbError::Encode {
            what: "snapshot",
            source,
        })?;

        let last = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(seq), 0) FROM snapshots WHERE date = ?1 AND session_id = ?2",
        )
        .bind(&session.date)
        .bind(&session.session_id)
        .fetch_one(&mut *self.tx)
        .await?;
        let seq = last + 1;

        sqlx::query("INSERT INTO snapshots (date, session_id, seq, payload) VALUES (?1, ?2, ?3, ?4)")
            .bind(&session.date)
            .bind(&session.session_id)
            .bind(seq)
            .bind(&payload)
            .execute(&mut *self.tx)
            .await?;

        trace!("Appended snapshot {}/{}/{}", session.date, session.session_id, seq);
        Ok(seq as u64)
    }

    /// The most recent snapshot of the session, `None` if it has none yet.
    pub async fn latest_snapshot(&mut self, session: &SessionHandle) -> Result<Option<Snapshot>, DbError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT seq, payload FROM snapshots WHERE date = ?1 AND session_id = ?2 ORDER BY seq DESC LIMIT 1",
        )
        .bind(&session.date)
        .bind(&session.session_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|(seq, payload)| decode_snapshot(session, seq, &payload))
            .transpose()
    }

    /// The session's full history, oldest first.
    pub async fn snapshots(&mut self, session: &SessionHandle) -> Result<Vec<(u64, Snapshot)>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT seq, payload FROM snapshots WHERE date = ?1 AND session_id = ?2 ORDER BY seq",
        )
        .bind(&session.date)
        .bind(&session.session_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|(seq, payload)| Ok((seq as u64, decode_snapshot(session, seq, &payload)?)))
            .collect()
    }

    /// Stored payloads without decoding them, for diagnostics dumps.
    pub async fn raw_snapshots(&mut self, session: &SessionHandle) -> Result<Vec<(u64, String)>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT seq, payload FROM snapshots WHERE date = ?1 AND session_id = ?2 ORDER BY seq",
        )
        .bind(&session.date)
        .bind(&session.session_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(|(seq, payload)| (seq as u64, payload)).collect())
    }

    #[cfg(test)]
    pub(crate) async fn put_raw_snapshot(&mut self, session: &SessionHandle, seq: i64, payload: &str) -> Result<(), DbError> {
        sqlx::query("INSERT INTO snapshots (date, session_id, seq, payload) VALUES (?1, ?2, ?3, ?4)")
            .bind(&session.date)
            .bind(&session.session_id)
            .bind(seq)
            .bind(payload)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

fn decode_snapshot(session: &SessionHandle, seq: i64, payload: &str) -> Result<Snapshot, DbError> {
    serde_json::from_str(payload).map_err(|source| DbError::Decode {
        what: "snapshot",
        key: format!("{}/{}/{}", session.date, session.session_id, seq),
        source,
    })
}

#[derive(Debug, Clone)]
enum CursorPosition {
    AtOrAfter(String),
    After(String),
    Done,
}

/// Forward-only cursor over day buckets.
///
/// Each step is a separate keyed lookup, so the transaction can be written
/// to between steps.
#[derive(Debug, Clone)]
pub struct DayCursor {
    position: CursorPosition,
}

impl DayCursor {
    pub async fn next(&mut self, tx: &mut StoreTx) -> Result<Option<DayHandle>, DbError> {
        let (sql, bound) = match &self.position {
            CursorPosition::AtOrAfter(date) => (
                "SELECT date FROM days WHERE date >= ?1 ORDER BY date LIMIT 1",
                date.clone(),
            ),
            CursorPosition::After(date) => (
                "SELECT date FROM days WHERE date > ?1 ORDER BY date LIMIT 1",
                date.clone(),
            ),
            CursorPosition::Done => return Ok(None),
        };

        let found = sqlx::query_scalar::<_, String>(sql)
            .bind(bound)
            .fetch_optional(&mut *tx.tx)
            .await?;

        match found {
            Some(date) => {
                self.position = CursorPosition::After(date.clone());
                Ok(Some(DayHandle { date }))
            }
            None => {
                self.position = CursorPosition::Done;
                Ok(None)
            }
        }
    }
}
