#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleSchedule,
    ConfigModuleCheckIn,
    ConfigModuleDatabase,
    PromptSelectModules,
    PromptProtectionMinutes,
    PromptCheckInWindow,
    PromptDatabaseFile,

    // === DATABASE MESSAGES ===
    SchemaVersion { current: u32, latest: u32 },
    PendingMigration(u32, String),
    DatabaseUpToDate,
    MigrationsFound(usize),
    RunningMigration(u32, String), // version, name
    MigrationFailed(u32, String),  // version, error
    AllMigrationsCompleted,
    MigrationHistory,
    NoMigrationsApplied,

    // === GROUP MESSAGES ===
    GroupCreated(i64, String), // id, name
    GroupDeleted(i64),
    GroupCreationRolledBack(String), // name
    GroupsHeader,
    NoGroups,

    // === STUDENT MESSAGES ===
    StudentCreated(i64, String), // id, name
    StudentJoinedGroup(i64, i64),
    StudentLeftGroup(i64, i64),
    StudentNotInGroup(i64, i64),
    MembersHeader(String), // group name
    NoMembers(i64),

    // === SCHEDULE MESSAGES ===
    BaseScheduleSaved(i64),
    BaseScheduleCleared(i64),
    NoBaseSchedule(i64),
    SessionsRegenerated { deleted: usize, inserted: usize },
    SchedulePreview(usize),
    ConfirmClearAll(i64),
    ConfirmClearAllFinal,
    OperationCancelled,

    // === OVERRIDE MESSAGES ===
    OverrideCreated(i64),
    OverridesRemoved(Vec<i64>),
    OverridesShrunk(Vec<i64>),
    OverridesSplitOff(Vec<i64>),
    OverridesReapplied(i64),
    NoOverrides(i64),

    // === SESSION AND ATTENDANCE MESSAGES ===
    SessionsHeader(String), // group name
    NoSessions(i64),
    SessionsRangeInverted(String, String),
    SessionRunning(i64, String), // session id, slot
    RosterHeader { date: String, present: usize, total: usize },
    HistoryMonth { year: i32, month: u32, present: usize, total: usize },
    NoHistory,

    // === CHECK-IN MESSAGES ===
    PromptStudentId,
    CheckInNoGroup(String),
    CheckInNoSession(String),
    CheckInAlreadyPresent(String),
    CheckInMarked(String, usize), // student name, sessions
}
