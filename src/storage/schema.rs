//! Table layout shared by the SQL adapters.
//!
//! Each table has a full `CREATE TABLE IF NOT EXISTS` statement per dialect plus a list
//! of evolving columns. Columns added after the first release are re-checked on every
//! start and added with their default when an older database lacks them.

pub const COMPLETION_RECORDS: &str = "completion_records";
pub const STAGE_RECORDS: &str = "stage_records";
pub const PLAYER_ACCOUNTS: &str = "player_accounts";

/// A column that may be missing from databases created by older builds
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub postgres: &'static str,
    pub sqlite: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub create_postgres: &'static str,
    pub create_sqlite: &'static str,
    pub evolving: &'static [ColumnSpec],
}

const fn column(name: &'static str, postgres: &'static str, sqlite: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        postgres,
        sqlite,
    }
}

const COMPLETION_COLUMNS: &[ColumnSpec] = &[
    column("player_name", "TEXT NOT NULL DEFAULT ''", "TEXT NOT NULL DEFAULT ''"),
    column("formatted_time", "TEXT NOT NULL DEFAULT ''", "TEXT NOT NULL DEFAULT ''"),
    column("completion_count", "BIGINT NOT NULL DEFAULT 1", "INTEGER NOT NULL DEFAULT 1"),
    column(
        "last_completion_timestamp",
        "BIGINT NOT NULL DEFAULT 0",
        "INTEGER NOT NULL DEFAULT 0",
    ),
];

const STAGE_COLUMNS: &[ColumnSpec] = &[
    column("player_name", "TEXT NOT NULL DEFAULT ''", "TEXT NOT NULL DEFAULT ''"),
    column("formatted_time", "TEXT NOT NULL DEFAULT ''", "TEXT NOT NULL DEFAULT ''"),
    column("aux_data", "TEXT NOT NULL DEFAULT ''", "TEXT NOT NULL DEFAULT ''"),
    column("completion_count", "BIGINT NOT NULL DEFAULT 1", "INTEGER NOT NULL DEFAULT 1"),
    column(
        "last_completion_timestamp",
        "BIGINT NOT NULL DEFAULT 0",
        "INTEGER NOT NULL DEFAULT 0",
    ),
];

const ACCOUNT_COLUMNS: &[ColumnSpec] = &[
    column("player_name", "TEXT NOT NULL DEFAULT ''", "TEXT NOT NULL DEFAULT ''"),
    column("global_points", "BIGINT NOT NULL DEFAULT 0", "INTEGER NOT NULL DEFAULT 0"),
    column("times_connected", "BIGINT NOT NULL DEFAULT 0", "INTEGER NOT NULL DEFAULT 0"),
    column("last_connected", "BIGINT NOT NULL DEFAULT 0", "INTEGER NOT NULL DEFAULT 0"),
    column(
        "hide_timer_hud",
        "BOOLEAN NOT NULL DEFAULT FALSE",
        "INTEGER NOT NULL DEFAULT 0",
    ),
    column("hide_keys", "BOOLEAN NOT NULL DEFAULT FALSE", "INTEGER NOT NULL DEFAULT 0"),
    column(
        "sounds_enabled",
        "BOOLEAN NOT NULL DEFAULT FALSE",
        "INTEGER NOT NULL DEFAULT 0",
    ),
    column("player_fov", "INTEGER NOT NULL DEFAULT 0", "INTEGER NOT NULL DEFAULT 0"),
    column("hud_type", "INTEGER NOT NULL DEFAULT 1", "INTEGER NOT NULL DEFAULT 1"),
    column("is_vip", "BOOLEAN NOT NULL DEFAULT FALSE", "INTEGER NOT NULL DEFAULT 0"),
];

pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: COMPLETION_RECORDS,
        create_postgres: "CREATE TABLE IF NOT EXISTS completion_records (
            map_name TEXT NOT NULL,
            bonus INTEGER NOT NULL,
            style INTEGER NOT NULL,
            player_id TEXT NOT NULL,
            player_name TEXT NOT NULL DEFAULT '',
            best_ticks BIGINT NOT NULL,
            formatted_time TEXT NOT NULL DEFAULT '',
            best_timestamp BIGINT NOT NULL,
            completion_count BIGINT NOT NULL DEFAULT 1,
            last_completion_timestamp BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (map_name, bonus, style, player_id)
        )",
        create_sqlite: "CREATE TABLE IF NOT EXISTS completion_records (
            map_name TEXT NOT NULL,
            bonus INTEGER NOT NULL,
            style INTEGER NOT NULL,
            player_id TEXT NOT NULL,
            player_name TEXT NOT NULL DEFAULT '',
            best_ticks INTEGER NOT NULL,
            formatted_time TEXT NOT NULL DEFAULT '',
            best_timestamp INTEGER NOT NULL,
            completion_count INTEGER NOT NULL DEFAULT 1,
            last_completion_timestamp INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (map_name, bonus, style, player_id)
        )",
        evolving: COMPLETION_COLUMNS,
    },
    TableSpec {
        name: STAGE_RECORDS,
        create_postgres: "CREATE TABLE IF NOT EXISTS stage_records (
            map_name TEXT NOT NULL,
            bonus INTEGER NOT NULL,
            style INTEGER NOT NULL,
            stage INTEGER NOT NULL,
            player_id TEXT NOT NULL,
            player_name TEXT NOT NULL DEFAULT '',
            best_ticks BIGINT NOT NULL,
            formatted_time TEXT NOT NULL DEFAULT '',
            aux_data TEXT NOT NULL DEFAULT '',
            best_timestamp BIGINT NOT NULL,
            completion_count BIGINT NOT NULL DEFAULT 1,
            last_completion_timestamp BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (map_name, bonus, style, stage, player_id)
        )",
        create_sqlite: "CREATE TABLE IF NOT EXISTS stage_records (
            map_name TEXT NOT NULL,
            bonus INTEGER NOT NULL,
            style INTEGER NOT NULL,
            stage INTEGER NOT NULL,
            player_id TEXT NOT NULL,
            player_name TEXT NOT NULL DEFAULT '',
            best_ticks INTEGER NOT NULL,
            formatted_time TEXT NOT NULL DEFAULT '',
            aux_data TEXT NOT NULL DEFAULT '',
            best_timestamp INTEGER NOT NULL,
            completion_count INTEGER NOT NULL DEFAULT 1,
            last_completion_timestamp INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (map_name, bonus, style, stage, player_id)
        )",
        evolving: STAGE_COLUMNS,
    },
    TableSpec {
        name: PLAYER_ACCOUNTS,
        create_postgres: "CREATE TABLE IF NOT EXISTS player_accounts (
            player_id TEXT PRIMARY KEY,
            player_name TEXT NOT NULL DEFAULT '',
            global_points BIGINT NOT NULL DEFAULT 0,
            times_connected BIGINT NOT NULL DEFAULT 0,
            last_connected BIGINT NOT NULL DEFAULT 0,
            hide_timer_hud BOOLEAN NOT NULL DEFAULT FALSE,
            hide_keys BOOLEAN NOT NULL DEFAULT FALSE,
            sounds_enabled BOOLEAN NOT NULL DEFAULT FALSE,
            player_fov INTEGER NOT NULL DEFAULT 0,
            hud_type INTEGER NOT NULL DEFAULT 1,
            is_vip BOOLEAN NOT NULL DEFAULT FALSE
        )",
        create_sqlite: "CREATE TABLE IF NOT EXISTS player_accounts (
            player_id TEXT PRIMARY KEY,
            player_name TEXT NOT NULL DEFAULT '',
            global_points INTEGER NOT NULL DEFAULT 0,
            times_connected INTEGER NOT NULL DEFAULT 0,
            last_connected INTEGER NOT NULL DEFAULT 0,
            hide_timer_hud INTEGER NOT NULL DEFAULT 0,
            hide_keys INTEGER NOT NULL DEFAULT 0,
            sounds_enabled INTEGER NOT NULL DEFAULT 0,
            player_fov INTEGER NOT NULL DEFAULT 0,
            hud_type INTEGER NOT NULL DEFAULT 1,
            is_vip INTEGER NOT NULL DEFAULT 0
        )",
        evolving: ACCOUNT_COLUMNS,
    },
];

/// Secondary indexes, valid in both dialects
pub const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS completion_records_route_ticks_idx
        ON completion_records (map_name, bonus, style, best_ticks)",
    "CREATE INDEX IF NOT EXISTS completion_records_style_idx
        ON completion_records (style, map_name, bonus, best_ticks)",
    "CREATE INDEX IF NOT EXISTS stage_records_route_ticks_idx
        ON stage_records (map_name, bonus, style, stage, best_ticks)",
    "CREATE INDEX IF NOT EXISTS player_accounts_points_idx
        ON player_accounts (global_points)",
];

/// Columns of `table` absent from `existing`, in declaration order
pub fn missing_columns<'a>(table: &'a TableSpec, existing: &[String]) -> Vec<&'a ColumnSpec> {
    table
        .evolving
        .iter()
        .filter(|col| !existing.iter().any(|name| name.eq_ignore_ascii_case(col.name)))
        .collect()
}
