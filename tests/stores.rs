#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use lessonbook::db::db::Db;
    use lessonbook::db::roster::Roster;
    use lessonbook::db::schedules::Schedules;
    use lessonbook::db::sessions::{SessionSource, Sessions};
    use lessonbook::libs::error::ScheduleError;
    use lessonbook::libs::materializer::{materialize, NewSession};
    use lessonbook::libs::rule::ScheduleRule;
    use test_context::{test_context, TestContext};

    struct StoreTestContext {
        db: Db,
        group_id: i64,
    }

    impl TestContext for StoreTestContext {
        fn setup() -> Self {
            let db = Db::in_memory().unwrap();
            let group_id = Roster::new(&db.conn).create_group("Choir").unwrap();
            StoreTestContext { db, group_id }
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn fridays(start: u32, end: u32) -> ScheduleRule {
        ScheduleRule::new(d(start), d(end)).unwrap().with_day(Weekday::Fri, t(15, 0), t(16, 0)).unwrap()
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_base_schedule_upsert_replaces_rows(ctx: &mut StoreTestContext) {
        let schedules = Schedules::new(&ctx.db.conn);
        let first = fridays(1, 30).exclude(d(13));
        schedules.save_base(ctx.group_id, &first).unwrap();

        let second = ScheduleRule::new(d(2), d(20))
            .unwrap()
            .with_day(Weekday::Tue, t(9, 0), t(10, 0))
            .unwrap()
            .exclude(d(10));
        schedules.save_base(ctx.group_id, &second).unwrap();

        let loaded = schedules.load_base(ctx.group_id).unwrap().unwrap();
        assert_eq!(loaded, second);
        assert!(loaded.window(Weekday::Fri).is_none());
        assert!(!loaded.exclusions().contains(&d(13)));

        schedules.delete_base(ctx.group_id).unwrap();
        assert!(schedules.load_base(ctx.group_id).unwrap().is_none());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_override_lookup_and_missing_ids(ctx: &mut StoreTestContext) {
        let schedules = Schedules::new(&ctx.db.conn);
        let early = schedules.insert_override(ctx.group_id, &fridays(1, 10)).unwrap();
        let late = schedules.insert_override(ctx.group_id, &fridays(20, 30)).unwrap();

        let overlapping: Vec<i64> = schedules
            .overlapping_overrides(ctx.group_id, d(10), d(19))
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(overlapping, vec![early]);
        assert!(schedules.overlapping_overrides(ctx.group_id, d(11), d(19)).unwrap().is_empty());

        assert_eq!(schedules.get_override(late).unwrap().rule, fridays(20, 30));
        assert!(matches!(schedules.get_override(999), Err(ScheduleError::NotFound { entity: "Override", id: 999 })));
        assert!(matches!(schedules.update_override(999, &fridays(1, 2)), Err(ScheduleError::NotFound { .. })));
        assert!(matches!(schedules.delete_override(999), Err(ScheduleError::NotFound { .. })));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_duplicate_slot_is_reported(ctx: &mut StoreTestContext) {
        let sessions = Sessions::new(&ctx.db.conn);
        let slot = NewSession {
            group_id: ctx.group_id,
            date: d(6),
            start: t(15, 0),
            end: t(16, 0),
        };
        sessions.insert(&slot, SessionSource::Base).unwrap();

        match sessions.insert(&slot, SessionSource::Base) {
            Err(ScheduleError::DuplicateSession { group_id, date, .. }) => {
                assert_eq!((group_id, date), (ctx.group_id, d(6)));
            }
            other => panic!("expected DuplicateSession, got {:?}", other),
        }
        assert_eq!(sessions.list_for_group(ctx.group_id).unwrap().len(), 1);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_removed_override_leaves_its_sessions(ctx: &mut StoreTestContext) {
        let schedules = Schedules::new(&ctx.db.conn);
        let sessions = Sessions::new(&ctx.db.conn);
        let rule = fridays(1, 30);
        let id = schedules.insert_override(ctx.group_id, &rule).unwrap();
        sessions
            .insert_all(&materialize(&rule, ctx.group_id, None), SessionSource::Override(id))
            .unwrap();

        schedules.delete_override(id).unwrap();

        let remaining = sessions.list_for_group(ctx.group_id).unwrap();
        assert_eq!(remaining.len(), 4);
        assert!(remaining.iter().all(|s| s.is_temporary && s.override_id.is_none()));
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_cutoff_compares_at_minute_resolution(ctx: &mut StoreTestContext) {
        let sessions = Sessions::new(&ctx.db.conn);
        sessions
            .insert_all(&materialize(&fridays(1, 30), ctx.group_id, None), SessionSource::Base)
            .unwrap();

        // 15:00:59 truncates to 15:00, so the session starting then is kept.
        let cutoff = d(13).and_time(NaiveTime::from_hms_opt(15, 0, 59).unwrap());
        assert_eq!(sessions.delete_after(ctx.group_id, cutoff).unwrap(), 2);
        assert_eq!(materialize(&fridays(1, 30), ctx.group_id, Some(cutoff)).len(), 2);

        let left: Vec<_> = sessions.list_for_group(ctx.group_id).unwrap().iter().map(|s| s.date).collect();
        assert_eq!(left, vec![d(6), d(13)]);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_range_delete_touches_only_its_dates(ctx: &mut StoreTestContext) {
        let sessions = Sessions::new(&ctx.db.conn);
        sessions
            .insert_all(&materialize(&fridays(1, 30), ctx.group_id, None), SessionSource::Base)
            .unwrap();

        let cutoff = d(1).and_time(t(0, 0));
        assert_eq!(sessions.delete_in_range_after(ctx.group_id, d(10), d(20), cutoff).unwrap(), 2);
        let left: Vec<_> = sessions.list_for_group(ctx.group_id).unwrap().iter().map(|s| s.date).collect();
        assert_eq!(left, vec![d(6), d(27)]);
    }
}
