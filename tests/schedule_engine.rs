#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
    use lessonbook::db::attendance::Attendance;
    use lessonbook::db::db::Db;
    use lessonbook::db::roster::Roster;
    use lessonbook::db::schedules::Schedules;
    use lessonbook::db::sessions::{Session, Sessions};
    use lessonbook::libs::clock::FixedClock;
    use lessonbook::libs::engine::ScheduleEngine;
    use lessonbook::libs::error::ScheduleError;
    use lessonbook::libs::rule::ScheduleRule;
    use std::collections::HashSet;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct EngineTestContext {
        _temp_dir: TempDir,
        db: Db,
        group_id: i64,
    }

    impl TestContext for EngineTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join("lessonbook.db")).unwrap();
            let group_id = Roster::new(&db.conn).create_group("Piano beginners").unwrap();
            EngineTestContext {
                _temp_dir: temp_dir,
                db,
                group_id,
            }
        }
    }

    impl EngineTestContext {
        fn engine(&mut self, now: NaiveDateTime) -> ScheduleEngine<'_, FixedClock> {
            ScheduleEngine::new(&mut self.db.conn, FixedClock::at(now))
        }

        fn sessions(&self) -> Vec<Session> {
            Sessions::new(&self.db.conn).list_for_group(self.group_id).unwrap()
        }
    }

    /// September 2024; the 1st is a Sunday.
    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        d(day).and_time(t(hour, minute))
    }

    fn before_term() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap().and_time(t(10, 0))
    }

    fn mon_wed(start: NaiveTime, end: NaiveTime) -> ScheduleRule {
        ScheduleRule::new(d(1), d(30))
            .unwrap()
            .with_day(Weekday::Mon, start, end)
            .unwrap()
            .with_day(Weekday::Wed, start, end)
            .unwrap()
    }

    fn tuesday_override(start: u32, end: u32) -> ScheduleRule {
        ScheduleRule::new(d(start), d(end)).unwrap().with_day(Weekday::Tue, t(10, 0), t(11, 0)).unwrap()
    }

    fn assert_no_duplicates(sessions: &[Session]) {
        let slots: HashSet<_> = sessions.iter().map(|s| (s.date, s.start, s.end)).collect();
        assert_eq!(slots.len(), sessions.len());
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_full_regenerate_materializes_whole_range(ctx: &mut EngineTestContext) {
        let rule = mon_wed(t(17, 0), t(18, 30));
        let group_id = ctx.group_id;

        let regen = ctx.engine(before_term()).save_base_schedule(group_id, Some(&rule)).unwrap();

        assert_eq!(regen.inserted, 9);
        assert_eq!(regen.deleted, 0);

        let sessions = ctx.sessions();
        assert_eq!(sessions.len(), 9);
        assert_eq!(sessions[0].date, d(2));
        assert_eq!(sessions[8].date, d(30));
        assert!(sessions.iter().all(|s| !s.is_temporary && s.override_id.is_none()));
        assert!(sessions.iter().all(|s| s.start == t(17, 0) && s.end == t(18, 30)));

        let stored = Schedules::new(&ctx.db.conn).load_base(group_id).unwrap();
        assert_eq!(stored, Some(rule));
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_full_regenerate_rewrites_past_and_removal_clears_everything(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        ctx.engine(before_term())
            .save_base_schedule(group_id, Some(&mon_wed(t(17, 0), t(18, 30))))
            .unwrap();

        // Mid-term, outside any lesson: the full variant still regenerates the past.
        let regen = ctx
            .engine(at(15, 12, 0))
            .save_base_schedule(group_id, Some(&mon_wed(t(9, 0), t(10, 0))))
            .unwrap();
        assert_eq!(regen.deleted, 9);
        assert_eq!(regen.inserted, 9);
        assert!(ctx.sessions().iter().all(|s| s.start == t(9, 0)));

        let regen = ctx.engine(at(15, 12, 0)).save_base_schedule(group_id, None).unwrap();
        assert_eq!(regen.deleted, 9);
        assert!(ctx.sessions().is_empty());
        assert!(Schedules::new(&ctx.db.conn).load_base(group_id).unwrap().is_none());
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_future_only_keeps_past_running_and_imminent_sessions(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        ctx.engine(before_term())
            .save_base_schedule(group_id, Some(&mon_wed(t(17, 0), t(18, 30))))
            .unwrap();

        let student_id = Roster::new(&ctx.db.conn).create_student("Ada", d(1)).unwrap();
        Roster::new(&ctx.db.conn).add_member(student_id, group_id).unwrap();
        let first = ctx.sessions()[0].clone();
        Attendance::new(&ctx.db.conn).mark_present(first.id, student_id).unwrap();

        // Wednesday the 11th, fifteen minutes before the lesson: it is protected.
        let regen = ctx
            .engine(at(11, 16, 45))
            .save_base_schedule_future_only(group_id, Some(&mon_wed(t(16, 0), t(17, 0))))
            .unwrap();
        assert_eq!(regen.deleted, 5);
        assert_eq!(regen.inserted, 5);

        let sessions = ctx.sessions();
        assert_eq!(sessions.len(), 9);
        assert_no_duplicates(&sessions);
        for session in &sessions {
            if session.date <= d(11) {
                assert_eq!(session.start, t(17, 0), "{} should be untouched", session.date);
            } else {
                assert_eq!(session.start, t(16, 0), "{} should be regenerated", session.date);
            }
        }

        // The first session kept its identity and its attendance.
        assert_eq!(sessions[0].id, first.id);
        assert!(Attendance::new(&ctx.db.conn).is_present(first.id, student_id).unwrap());
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_future_only_without_rule_removes_only_future(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        ctx.engine(before_term())
            .save_base_schedule(group_id, Some(&mon_wed(t(17, 0), t(18, 30))))
            .unwrap();

        let regen = ctx.engine(at(15, 12, 0)).save_base_schedule_future_only(group_id, None).unwrap();

        assert_eq!(regen.deleted, 5);
        assert_eq!(regen.inserted, 0);
        let sessions = ctx.sessions();
        assert_eq!(sessions.iter().map(|s| s.date).collect::<Vec<_>>(), vec![d(2), d(4), d(9), d(11)]);
        assert!(Schedules::new(&ctx.db.conn).load_base(group_id).unwrap().is_none());
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_running_session_locks_every_mutation(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        let rule = mon_wed(t(17, 0), t(18, 30));
        ctx.engine(before_term()).save_base_schedule(group_id, Some(&rule)).unwrap();
        ctx.engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(23, 27))
            .unwrap();

        let sessions_before = ctx.sessions();
        let overrides_before = Schedules::new(&ctx.db.conn).list_overrides(group_id).unwrap();
        let running = at(9, 17, 30);
        let other = mon_wed(t(8, 0), t(9, 0));

        let mut results = Vec::new();
        results.push(ctx.engine(running).save_base_schedule(group_id, Some(&other)).map(|_| ()));
        results.push(ctx.engine(running).save_base_schedule(group_id, None).map(|_| ()));
        results.push(ctx.engine(running).save_base_schedule_future_only(group_id, Some(&other)).map(|_| ()));
        results.push(ctx.engine(running).save_base_schedule_future_only(group_id, None).map(|_| ()));
        results.push(ctx.engine(running).create_temporary_override(group_id, &tuesday_override(16, 20)).map(|_| ()));
        results.push(ctx.engine(running).reapply_overrides_future(group_id).map(|_| ()));
        for result in results {
            match result {
                Err(ScheduleError::ScheduleLocked { group_id: locked, date, start, end }) => {
                    assert_eq!(locked, group_id);
                    assert_eq!((date, start, end), (d(9), t(17, 0), t(18, 30)));
                }
                other => panic!("expected ScheduleLocked, got {:?}", other),
            }
        }

        assert_eq!(ctx.sessions(), sessions_before);
        assert_eq!(Schedules::new(&ctx.db.conn).list_overrides(group_id).unwrap(), overrides_before);
        assert_eq!(Schedules::new(&ctx.db.conn).load_base(group_id).unwrap(), Some(rule));
        assert!(ctx.engine(running).running_session(group_id).unwrap().is_some());
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_lock_ends_with_the_session(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        ctx.engine(before_term())
            .save_base_schedule(group_id, Some(&mon_wed(t(17, 0), t(18, 30))))
            .unwrap();

        assert!(ctx.engine(at(9, 18, 30)).running_session(group_id).unwrap().is_none());
        let regen = ctx
            .engine(at(9, 18, 30))
            .save_base_schedule_future_only(group_id, Some(&mon_wed(t(16, 0), t(17, 0))))
            .unwrap();
        assert_eq!(regen.inserted, 6);
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_override_strictly_inside_splits_existing(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        let existing = ScheduleRule::new(d(5), d(20)).unwrap().with_day(Weekday::Thu, t(12, 0), t(13, 0)).unwrap();
        let first = ctx.engine(before_term()).create_temporary_override(group_id, &existing).unwrap();
        assert_eq!(ctx.sessions().len(), 3);

        let created = ctx
            .engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(10, 15))
            .unwrap();

        assert_eq!(created.shrunk, vec![first.override_id]);
        assert_eq!(created.split_off.len(), 1);
        assert!(created.removed.is_empty());
        let right_id = created.split_off[0];

        let overrides = Schedules::new(&ctx.db.conn).list_overrides(group_id).unwrap();
        let ranges: Vec<_> = overrides.iter().map(|o| (o.id, o.rule.start_date(), o.rule.end_date())).collect();
        assert_eq!(
            ranges,
            vec![
                (first.override_id, d(5), d(9)),
                (created.override_id, d(10), d(15)),
                (right_id, d(16), d(20)),
            ]
        );
        assert_eq!(overrides[0].rule.window(Weekday::Thu), existing.window(Weekday::Thu));
        assert_eq!(overrides[2].rule.window(Weekday::Thu), existing.window(Weekday::Thu));

        let sessions = ctx.sessions();
        let produced: Vec<_> = sessions.iter().map(|s| (s.date, s.start, s.override_id)).collect();
        assert_eq!(
            produced,
            vec![
                (d(5), t(12, 0), Some(first.override_id)),
                (d(10), t(10, 0), Some(created.override_id)),
                (d(19), t(12, 0), Some(right_id)),
            ]
        );
        assert!(sessions.iter().all(|s| s.is_temporary));
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_override_covering_existing_removes_it(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        let inner = ctx
            .engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(10, 15))
            .unwrap();

        let outer = ScheduleRule::new(d(5), d(20)).unwrap().with_day(Weekday::Fri, t(15, 0), t(16, 0)).unwrap();
        let created = ctx.engine(before_term()).create_temporary_override(group_id, &outer).unwrap();

        assert_eq!(created.removed, vec![inner.override_id]);
        let overrides = Schedules::new(&ctx.db.conn).list_overrides(group_id).unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].id, created.override_id);

        let dates: Vec<_> = ctx.sessions().iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![d(6), d(13), d(20)]);
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_partial_overlap_shrinks_existing(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        let existing = ctx
            .engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(1, 20))
            .unwrap();

        let created = ctx
            .engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(15, 30))
            .unwrap();

        assert_eq!(created.shrunk, vec![existing.override_id]);
        assert!(created.split_off.is_empty());
        let shrunk = Schedules::new(&ctx.db.conn).get_override(existing.override_id).unwrap();
        assert_eq!((shrunk.rule.start_date(), shrunk.rule.end_date()), (d(1), d(14)));

        let produced: Vec<_> = ctx.sessions().iter().map(|s| (s.date, s.override_id)).collect();
        assert_eq!(
            produced,
            vec![
                (d(3), Some(existing.override_id)),
                (d(10), Some(existing.override_id)),
                (d(17), Some(created.override_id)),
                (d(24), Some(created.override_id)),
            ]
        );
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_override_wins_after_base_regeneration(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        ctx.engine(before_term())
            .save_base_schedule(group_id, Some(&mon_wed(t(17, 0), t(18, 30))))
            .unwrap();
        let created = ctx
            .engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(9, 15))
            .unwrap();

        ctx.engine(before_term())
            .save_base_schedule_future_only(group_id, Some(&mon_wed(t(18, 0), t(19, 0))))
            .unwrap();
        ctx.engine(before_term()).reapply_overrides_future(group_id).unwrap();

        let sessions = ctx.sessions();
        assert_no_duplicates(&sessions);
        assert_eq!(sessions.len(), 8);
        for session in &sessions {
            if (d(9)..=d(15)).contains(&session.date) {
                assert_eq!(session.date, d(10));
                assert_eq!(session.start, t(10, 0));
                assert_eq!(session.override_id, Some(created.override_id));
            } else {
                assert_eq!(session.start, t(18, 0));
                assert!(!session.is_temporary);
            }
        }
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_repeated_saves_never_duplicate(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        let rule = mon_wed(t(17, 0), t(18, 30));
        for _ in 0..3 {
            ctx.engine(before_term()).save_base_schedule_future_only(group_id, Some(&rule)).unwrap();
            ctx.engine(before_term()).reapply_overrides_future(group_id).unwrap();
        }
        ctx.engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(1, 30))
            .unwrap();
        ctx.engine(before_term())
            .create_temporary_override(group_id, &tuesday_override(1, 30))
            .unwrap();

        let sessions = ctx.sessions();
        assert_no_duplicates(&sessions);
        assert_eq!(Schedules::new(&ctx.db.conn).list_overrides(group_id).unwrap().len(), 1);
        assert_eq!(sessions.len(), 4);
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_protection_window_is_configurable(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        ctx.engine(before_term())
            .save_base_schedule(group_id, Some(&mon_wed(t(17, 0), t(18, 30))))
            .unwrap();

        // Two hours of protection before Monday the 16th at 15:30 keep that lesson.
        let regen = ctx
            .engine(at(16, 15, 30))
            .with_protection(chrono::Duration::hours(2))
            .save_base_schedule_future_only(group_id, Some(&mon_wed(t(19, 0), t(20, 0))))
            .unwrap();
        assert_eq!(regen.deleted, 4);

        let monday = ctx.sessions().into_iter().filter(|s| s.date == d(16)).collect::<Vec<_>>();
        assert_eq!(monday.len(), 2);
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_rule_without_weekdays_is_rejected(ctx: &mut EngineTestContext) {
        let group_id = ctx.group_id;
        let empty = ScheduleRule::new(d(1), d(30)).unwrap();

        let err = ctx.engine(before_term()).save_base_schedule(group_id, Some(&empty)).unwrap_err();
        assert!(matches!(err, ScheduleError::NoWeekdaysSelected));
        let err = ctx.engine(before_term()).create_temporary_override(group_id, &empty).unwrap_err();
        assert!(err.is_validation());

        assert!(Schedules::new(&ctx.db.conn).load_base(group_id).unwrap().is_none());
        assert!(ctx.sessions().is_empty());
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_unknown_group_is_not_found(ctx: &mut EngineTestContext) {
        let rule = mon_wed(t(17, 0), t(18, 30));
        let err = ctx.engine(before_term()).save_base_schedule_future_only(999, Some(&rule)).unwrap_err();
        assert!(matches!(err, ScheduleError::NotFound { entity: "Group", id: 999 }));
    }

    #[test_context(EngineTestContext)]
    #[test]
    fn test_storage_failure_rolls_back_whole_operation(ctx: &mut EngineTestContext) {
        let group = ctx.group_id;
        ctx.engine(before_term()).save_base_schedule(group, Some(&mon_wed(t(17, 0), t(18, 0)))).unwrap();
        ctx.engine(before_term()).create_temporary_override(group, &tuesday_override(9, 15)).unwrap();

        let sessions_before = ctx.sessions();
        let schedules = Schedules::new(&ctx.db.conn);
        let base_before = schedules.load_base(group).unwrap();
        let overrides_before = schedules.list_overrides(group).unwrap();

        // Wednesday the 25th can no longer be written.
        ctx.db
            .conn
            .execute_batch(
                "CREATE TRIGGER refuse_slot BEFORE INSERT ON sessions
                 WHEN NEW.date = '2024-09-25'
                 BEGIN SELECT RAISE(ABORT, 'slot refused'); END;",
            )
            .unwrap();

        let resaved = ctx.engine(before_term()).save_base_schedule_future_only(group, Some(&mon_wed(t(18, 0), t(19, 0))));
        assert!(matches!(resaved, Err(ScheduleError::Storage(_))));

        let wednesdays = ScheduleRule::new(d(12), d(30)).unwrap().with_day(Weekday::Wed, t(12, 0), t(13, 0)).unwrap();
        let created = ctx.engine(before_term()).create_temporary_override(group, &wednesdays);
        assert!(matches!(created, Err(ScheduleError::Storage(_))));

        let schedules = Schedules::new(&ctx.db.conn);
        assert_eq!(ctx.sessions(), sessions_before);
        assert_eq!(schedules.load_base(group).unwrap(), base_before);
        assert_eq!(schedules.list_overrides(group).unwrap(), overrides_before);
    }
}
