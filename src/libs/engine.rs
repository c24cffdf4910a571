//! Schedule changes and session regeneration.
//!
//! A group's effective schedule is its base rule, replaced wholesale on
//! every date covered by one of its overrides. Overrides of one group never
//! overlap: a new override clips, splits or removes the ones it intersects.
//!
//! Precedence is kept by ordering, not by merging. Whenever the base
//! schedule is regenerated, every override is regenerated right after it
//! inside the same transaction, so override sessions always win on their
//! own dates.
//!
//! Each public operation:
//!
//! 1. validates its input before touching storage,
//! 2. opens one transaction,
//! 3. refuses with [`ScheduleError::ScheduleLocked`] while a session of the
//!    group is running, using the same instant for the check and for every
//!    cutoff computed afterwards,
//! 4. commits on success; any error drops the transaction and rolls back.
//!
//! Edit-safe variants only replace sessions starting after
//! `now + protection` (30 minutes by default), so past, running and
//! imminent sessions, and the attendance attached to them, survive edits.

use super::clock::Clock;
use super::config::ScheduleConfig;
use super::error::{Result, ScheduleError};
use super::materializer::materialize;
use super::rule::ScheduleRule;
use crate::db::roster::Roster;
use crate::db::schedules::{ScheduleOverride, Schedules};
use crate::db::sessions::{Session, SessionSource, Sessions};
use crate::msg_debug;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::ops::AddAssign;

pub const DEFAULT_PROTECTION_MINUTES: i64 = 30;

/// Sessions removed and created by one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Regeneration {
    pub deleted: usize,
    pub inserted: usize,
}

impl AddAssign for Regeneration {
    fn add_assign(&mut self, other: Self) {
        self.deleted += other.deleted;
        self.inserted += other.inserted;
    }
}

/// What [`ScheduleEngine::create_temporary_override`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideCreated {
    pub override_id: i64,
    /// Existing overrides that lay entirely inside the new range
    pub removed: Vec<i64>,
    /// Existing overrides cut down to the part outside the new range
    pub shrunk: Vec<i64>,
    /// Right-hand remainders split off into new overrides
    pub split_off: Vec<i64>,
    pub regeneration: Regeneration,
}

/// How an existing override has to change to make room for a new range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clip {
    /// The new range covers it entirely.
    Remove,
    /// Only one side survives.
    Shrink(ScheduleRule),
    /// The new range sits strictly inside; left and right remainders.
    Split(ScheduleRule, ScheduleRule),
}

/// Cuts `[start, end]` out of `existing`, keeping its weekday windows and
/// only the exclusions that remain in range.
pub fn clip_against(existing: &ScheduleRule, start: NaiveDate, end: NaiveDate) -> Result<Clip> {
    let left = match start.pred_opt() {
        Some(prev) if existing.start_date() <= prev => Some(existing.with_range(existing.start_date(), prev.min(existing.end_date()))?),
        _ => None,
    };
    let right = match end.succ_opt() {
        Some(next) if next <= existing.end_date() => Some(existing.with_range(next.max(existing.start_date()), existing.end_date())?),
        _ => None,
    };
    Ok(match (left, right) {
        (None, None) => Clip::Remove,
        (Some(rule), None) | (None, Some(rule)) => Clip::Shrink(rule),
        (Some(left), Some(right)) => Clip::Split(left, right),
    })
}

pub struct ScheduleEngine<'a, C: Clock> {
    conn: &'a mut Connection,
    clock: C,
    protection: Duration,
}

impl<'a, C: Clock> ScheduleEngine<'a, C> {
    pub fn new(conn: &'a mut Connection, clock: C) -> Self {
        Self {
            conn,
            clock,
            protection: Duration::minutes(DEFAULT_PROTECTION_MINUTES),
        }
    }

    pub fn with_config(self, config: &ScheduleConfig) -> Self {
        self.with_protection(Duration::minutes(config.protection_minutes))
    }

    /// Sessions starting within `protection` of now are never regenerated.
    pub fn with_protection(mut self, protection: Duration) -> Self {
        self.protection = protection;
        self
    }

    /// The session currently running for the group, which locks edits.
    pub fn running_session(&self, group_id: i64) -> Result<Option<Session>> {
        Sessions::new(&*self.conn).running_at(group_id, self.clock.now())
    }

    /// Full regenerate for a brand-new group.
    ///
    /// With a rule: stores it, deletes every session of the group (past ones
    /// included) and generates the whole range again, then re-applies any
    /// overrides. Without a rule: removes the base schedule, the group's
    /// overrides and all of its sessions.
    pub fn save_base_schedule(&mut self, group_id: i64, rule: Option<&ScheduleRule>) -> Result<Regeneration> {
        if let Some(rule) = rule {
            ensure_generatable(rule)?;
        }
        let now = self.clock.now();

        let tx = self.conn.transaction()?;
        ensure_unlocked(&tx, group_id, now)?;

        let schedules = Schedules::new(&tx);
        let sessions = Sessions::new(&tx);
        let mut regen = Regeneration::default();

        match rule {
            Some(rule) => {
                schedules.save_base(group_id, rule)?;
                regen.deleted += sessions.delete_all_for_group(group_id)?;
                regen.inserted += sessions.insert_all(&materialize(rule, group_id, None), SessionSource::Base)?;
                regen += reapply(&tx, group_id, None)?;
            }
            None => {
                schedules.delete_base(group_id)?;
                schedules.delete_group_overrides(group_id)?;
                regen.deleted += sessions.delete_all_for_group(group_id)?;
            }
        }

        tx.commit()?;
        msg_debug!(format!(
            "Base schedule of group {} fully regenerated: {} deleted, {} inserted",
            group_id, regen.deleted, regen.inserted
        ));
        Ok(regen)
    }

    /// Edit-safe regenerate for an established group.
    ///
    /// Stores (or, given `None`, removes) the base rule, replaces only the
    /// sessions starting after the protection cutoff and re-applies every
    /// override over its own range.
    pub fn save_base_schedule_future_only(&mut self, group_id: i64, rule: Option<&ScheduleRule>) -> Result<Regeneration> {
        if let Some(rule) = rule {
            ensure_generatable(rule)?;
        }
        let now = self.clock.now();
        let cutoff = now + self.protection;

        let tx = self.conn.transaction()?;
        ensure_unlocked(&tx, group_id, now)?;

        let schedules = Schedules::new(&tx);
        let sessions = Sessions::new(&tx);
        let mut regen = Regeneration::default();

        match rule {
            Some(rule) => schedules.save_base(group_id, rule)?,
            None => schedules.delete_base(group_id)?,
        }
        regen.deleted += sessions.delete_after(group_id, cutoff)?;
        if let Some(rule) = rule {
            regen.inserted += sessions.insert_all(&materialize(rule, group_id, Some(cutoff)), SessionSource::Base)?;
        }
        regen += reapply(&tx, group_id, Some(cutoff))?;

        tx.commit()?;
        msg_debug!(format!(
            "Base schedule of group {} regenerated after {}: {} deleted, {} inserted",
            group_id, cutoff, regen.deleted, regen.inserted
        ));
        Ok(regen)
    }

    /// Stores a temporary override and regenerates its future sessions.
    ///
    /// Existing overrides intersecting the new range are removed, shrunk or
    /// split first (see [`clip_against`]).
    pub fn create_temporary_override(&mut self, group_id: i64, rule: &ScheduleRule) -> Result<OverrideCreated> {
        ensure_generatable(rule)?;
        let now = self.clock.now();
        let cutoff = now + self.protection;

        let tx = self.conn.transaction()?;
        ensure_unlocked(&tx, group_id, now)?;

        let schedules = Schedules::new(&tx);
        let mut created = OverrideCreated::default();

        for existing in schedules.overlapping_overrides(group_id, rule.start_date(), rule.end_date())? {
            match clip_against(&existing.rule, rule.start_date(), rule.end_date())? {
                Clip::Remove => {
                    msg_debug!(format!("Override {} lies inside the new range, removing it", existing.id));
                    schedules.delete_override(existing.id)?;
                    created.removed.push(existing.id);
                }
                Clip::Shrink(remaining) => {
                    msg_debug!(format!(
                        "Override {} shrunk to {}..{}",
                        existing.id,
                        remaining.start_date(),
                        remaining.end_date()
                    ));
                    schedules.update_override(existing.id, &remaining)?;
                    created.shrunk.push(existing.id);
                }
                Clip::Split(left, right) => {
                    schedules.update_override(existing.id, &left)?;
                    let right_id = schedules.insert_override(group_id, &right)?;
                    msg_debug!(format!(
                        "Override {} split: kept {}..{}, new override {} for {}..{}",
                        existing.id,
                        left.start_date(),
                        left.end_date(),
                        right_id,
                        right.start_date(),
                        right.end_date()
                    ));
                    let remainder = ScheduleOverride {
                        id: right_id,
                        group_id,
                        rule: right,
                    };
                    created.regeneration += regenerate_override(&tx, &remainder, Some(cutoff))?;
                    created.shrunk.push(existing.id);
                    created.split_off.push(right_id);
                }
            }
        }

        let override_id = schedules.insert_override(group_id, rule)?;
        let inserted = ScheduleOverride {
            id: override_id,
            group_id,
            rule: rule.clone(),
        };
        created.regeneration += regenerate_override(&tx, &inserted, Some(cutoff))?;
        created.override_id = override_id;

        tx.commit()?;
        msg_debug!(format!(
            "Override {} created for group {} ({}..{}): {} deleted, {} inserted",
            override_id,
            group_id,
            rule.start_date(),
            rule.end_date(),
            created.regeneration.deleted,
            created.regeneration.inserted
        ));
        Ok(created)
    }

    /// Regenerates every override of the group over its own range, in
    /// start-date order, after the protection cutoff.
    pub fn reapply_overrides_future(&mut self, group_id: i64) -> Result<Regeneration> {
        let now = self.clock.now();
        let cutoff = now + self.protection;

        let tx = self.conn.transaction()?;
        ensure_unlocked(&tx, group_id, now)?;
        let regen = reapply(&tx, group_id, Some(cutoff))?;
        tx.commit()?;

        Ok(regen)
    }
}

fn ensure_generatable(rule: &ScheduleRule) -> Result<()> {
    if !rule.has_weekdays() {
        return Err(ScheduleError::NoWeekdaysSelected);
    }
    Ok(())
}

/// Fails with `NotFound` for an unknown group and `ScheduleLocked` while one
/// of its sessions is in progress at `now`.
fn ensure_unlocked(conn: &Connection, group_id: i64, now: NaiveDateTime) -> Result<()> {
    if !Roster::new(conn).group_exists(group_id)? {
        return Err(ScheduleError::not_found("Group", group_id));
    }
    if let Some(running) = Sessions::new(conn).running_at(group_id, now)? {
        tracing::warn!(group_id, session_id = running.id, "schedule change refused, session in progress");
        return Err(ScheduleError::ScheduleLocked {
            group_id,
            date: running.date,
            start: running.start,
            end: running.end,
        });
    }
    Ok(())
}

fn reapply(conn: &Connection, group_id: i64, cutoff: Option<NaiveDateTime>) -> Result<Regeneration> {
    let mut regen = Regeneration::default();
    for stored in Schedules::new(conn).list_overrides(group_id)? {
        regen += regenerate_override(conn, &stored, cutoff)?;
    }
    Ok(regen)
}

/// Replaces the sessions of the override's range, only those starting after
/// `cutoff` when one is given.
fn regenerate_override(conn: &Connection, stored: &ScheduleOverride, cutoff: Option<NaiveDateTime>) -> Result<Regeneration> {
    let sessions = Sessions::new(conn);
    let (group_id, start, end) = (stored.group_id, stored.rule.start_date(), stored.rule.end_date());
    let deleted = match cutoff {
        Some(cutoff) => sessions.delete_in_range_after(group_id, start, end, cutoff)?,
        None => sessions.delete_in_range(group_id, start, end)?,
    };
    let inserted = sessions.insert_all(&materialize(&stored.rule, group_id, cutoff), SessionSource::Override(stored.id))?;
    Ok(Regeneration { deleted, inserted })
}
