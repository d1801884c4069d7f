// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "Studyline";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "studyline";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".studyline";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "studyline.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STUDYLINE_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "STUDYLINE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "STUDYLINE_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STUDYLINE_LOG";

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "STUDYLINE_DEBUG";

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "STUDYLINE_DATA_DIR";

/// Environment variable for access token TTL in minutes
pub const ENV_ACCESS_TTL_MINUTES: &str = "STUDYLINE_ACCESS_TTL_MINUTES";

/// Environment variable for refresh token TTL in days
pub const ENV_REFRESH_TTL_DAYS: &str = "STUDYLINE_REFRESH_TTL_DAYS";

/// Environment variable to enable/disable auth rate limiting
pub const ENV_RATE_LIMIT_ENABLED: &str = "STUDYLINE_RATE_LIMIT_ENABLED";

/// Environment variable for auth rate limit (requests per minute)
pub const ENV_RATE_LIMIT_AUTH_RPM: &str = "STUDYLINE_RATE_LIMIT_AUTH_RPM";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 4870;

/// Default request body limit (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Body limit for auth endpoints (16 KB)
pub const AUTH_BODY_LIMIT: usize = 16 * 1024;

// =============================================================================
// Authentication
// =============================================================================

/// Cookie name for the short-lived access token
pub const ACCESS_COOKIE_NAME: &str = "studyline_access";

/// Cookie name for the long-lived refresh token
pub const REFRESH_COOKIE_NAME: &str = "studyline_refresh";

/// Default access token TTL in minutes
pub const DEFAULT_ACCESS_TTL_MINUTES: u64 = 15;

/// Default refresh token TTL in days
pub const DEFAULT_REFRESH_TTL_DAYS: u64 = 7;

/// JWT signing key filename (hex-encoded, inside the data directory)
pub const JWT_KEY_FILENAME: &str = "jwt.key";

/// Default auth endpoint rate limit (requests per minute per IP)
pub const DEFAULT_RATE_LIMIT_AUTH_RPM: u32 = 10;

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "studyline.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL autocheckpoint (pages)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval for the periodic WAL checkpoint task
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Shutdown
// =============================================================================

/// Max time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Progress
// =============================================================================

/// Page size for the recent-progress feed
pub const RECENT_PROGRESS_LIMIT: u32 = 10;
