#[cfg(test)]
mod tests {
    use crate::{encode_products, DbClient, DbError};
    use chrono::{TimeZone, Utc};
    use icewatch_common::{EventRecord, ProductId, Snapshot};

    fn snapshot(session_id: &str, available: i64) -> Snapshot {
        Snapshot::observed(
            EventRecord {
                session_id: session_id.to_string(),
                product_name: "Public Skate".to_string(),
                location: "Pad 1".to_string(),
                start_time: "18:00:00".to_string(),
                end_time: "19:00:00".to_string(),
                total_spaces: 50,
                available_spaces: available,
                academy_capacity: 10,
                academy_available: 10,
            },
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn ensure_day_reports_creation_once() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, created) = tx.ensure_day("2024-03-01").await.unwrap();
        assert!(created);
        assert_eq!(day.date(), "2024-03-01");
        let (_, created_again) = tx.ensure_day("2024-03-01").await.unwrap();
        assert!(!created_again);
    }

    #[tokio::test]
    async fn snapshots_get_increasing_sequence_numbers() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        let session = tx.get_or_create_session(&events, "S1").await.unwrap();

        assert!(tx.latest_snapshot(&session).await.unwrap().is_none());
        assert_eq!(tx.append_snapshot(&session, &snapshot("S1", 5)).await.unwrap(), 1);
        assert_eq!(tx.append_snapshot(&session, &snapshot("S1", 3)).await.unwrap(), 2);

        let latest = tx.latest_snapshot(&session).await.unwrap().unwrap();
        assert_eq!(latest.record.available_spaces, 3);

        let history = tx.snapshots(&session).await.unwrap();
        let seqs: Vec<u64> = history.iter().map(|(seq, _)| *seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn sequences_are_per_session() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        let a = tx.get_or_create_session(&events, "A").await.unwrap();
        let b = tx.get_or_create_session(&events, "B").await.unwrap();
        tx.append_snapshot(&a, &snapshot("A", 1)).await.unwrap();
        tx.append_snapshot(&a, &snapshot("A", 2)).await.unwrap();
        assert_eq!(tx.append_snapshot(&b, &snapshot("B", 1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sessions_are_listed_in_key_order() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        for id in ["c", "a", "b"] {
            tx.get_or_create_session(&events, id).await.unwrap();
        }
        // repeated creation is a no-op
        tx.get_or_create_session(&events, "a").await.unwrap();

        let ids: Vec<String> = tx
            .sessions(&events)
            .await
            .unwrap()
            .iter()
            .map(|s| s.session_id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn session_product_is_remembered() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        let session = tx.get_or_create_session(&events, "S1").await.unwrap();
        assert_eq!(tx.session_product(&session).await.unwrap(), None);

        tx.set_session_product(&session, &ProductId::from("p1")).await.unwrap();
        assert_eq!(
            tx.session_product(&session).await.unwrap(),
            Some(ProductId::from("p1"))
        );
    }

    #[tokio::test]
    async fn day_cursor_walks_forward_from_a_date() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        for date in ["2024-03-10", "2024-02-28", "2024-03-01", "2024-03-02"] {
            tx.ensure_day(date).await.unwrap();
        }

        let mut cursor = tx.days_from("2024-03-01");
        let mut seen = Vec::new();
        while let Some(day) = cursor.next(&mut tx).await.unwrap() {
            // writes between steps must not disturb the walk
            tx.get_or_create_events_scope(&day).await.unwrap();
            seen.push(day.date().to_string());
        }
        assert_eq!(seen, vec!["2024-03-01", "2024-03-02", "2024-03-10"]);
        assert!(cursor.next(&mut tx).await.unwrap().is_none());

        let mut all = tx.all_days();
        assert_eq!(all.next(&mut tx).await.unwrap().unwrap().date(), "2024-02-28");
    }

    #[tokio::test]
    async fn products_round_trip_in_stored_order() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        assert!(tx.products(&day).await.unwrap().is_empty());

        let products = vec![ProductId::from("p2"), ProductId::from("p1"), ProductId::from("p2")];
        tx.put_products(&day, &products).await.unwrap();
        assert_eq!(
            tx.stored_products_json(&day).await.unwrap().as_deref(),
            Some(r#"["p2","p1","p2"]"#)
        );
        assert_eq!(
            tx.products(&day).await.unwrap(),
            vec![ProductId::from("p2"), ProductId::from("p1")]
        );
        assert_eq!(encode_products(&products).unwrap(), r#"["p2","p1","p2"]"#);
    }

    #[tokio::test]
    async fn malformed_product_list_is_a_decode_error() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        tx.put_products_json(&day, "{not json").await.unwrap();
        let err = tx.products(&day).await.unwrap_err();
        assert!(matches!(err, DbError::Decode { what: "product list", .. }));
    }

    #[tokio::test]
    async fn malformed_snapshot_is_a_decode_error() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        let session = tx.get_or_create_session(&events, "S1").await.unwrap();
        tx.put_raw_snapshot(&session, 1, "garbage").await.unwrap();

        let err = tx.latest_snapshot(&session).await.unwrap_err();
        match err {
            DbError::Decode { what, key, .. } => {
                assert_eq!(what, "snapshot");
                assert_eq!(key, "2024-03-01/S1/1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_rolled_back() {
        let db = DbClient::in_memory().await.unwrap();
        {
            let mut tx = db.begin_write().await.unwrap();
            tx.ensure_day("2024-03-01").await.unwrap();
            // dropped without commit
        }
        let mut tx = db.begin_read().await.unwrap();
        assert!(tx.day("2024-03-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_readers() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        let events = tx.get_or_create_events_scope(&day).await.unwrap();
        let session = tx.get_or_create_session(&events, "S1").await.unwrap();
        tx.append_snapshot(&session, &snapshot("S1", 5)).await.unwrap();
        tx.commit().await.unwrap();

        let mut read = db.begin_read().await.unwrap();
        let day = read.day("2024-03-01").await.unwrap().unwrap();
        let events = read.events_scope(&day).await.unwrap().unwrap();
        let sessions = read.sessions(&events).await.unwrap();
        assert_eq!(sessions.len(), 1);
        let raw = read.raw_snapshots(&sessions[0]).await.unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw[0].1.contains("\"SessionId\":\"S1\""));
    }

    #[tokio::test]
    async fn read_transactions_refuse_writes() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_read().await.unwrap();
        assert!(matches!(tx.ensure_day("2024-03-01").await, Err(DbError::ReadOnly)));
    }

    #[tokio::test]
    async fn events_scope_absent_until_created() {
        let db = DbClient::in_memory().await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let (day, _) = tx.ensure_day("2024-03-01").await.unwrap();
        assert!(tx.events_scope(&day).await.unwrap().is_none());
        tx.get_or_create_events_scope(&day).await.unwrap();
        assert!(tx.events_scope(&day).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("nested/ice-info.db").display());
        {
            let db = DbClient::from_url(&url).await.unwrap();
            let mut tx = db.begin_write().await.unwrap();
            tx.ensure_day("2024-03-01").await.unwrap();
            tx.commit().await.unwrap();
            db.pool().close().await;
        }
        let db = DbClient::from_url(&url).await.unwrap();
        assert!(db.is_healthy().await);
        let mut tx = db.begin_read().await.unwrap();
        assert!(tx.day("2024-03-01").await.unwrap().is_some());
    }
}
