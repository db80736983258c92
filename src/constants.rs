//! Source and platform constants shared by the crawlers, config defaults and server.

// Platform origins used to absolutize relative contest links
pub const ATCODER_ORIGIN: &str = "https://atcoder.jp";
pub const CODEFORCES_ORIGIN: &str = "https://codeforces.com";
pub const CODECHEF_ORIGIN: &str = "https://www.codechef.com";

pub const ATCODER_CONTESTS_URL: &str = "https://atcoder.jp/contests";

// clist.by aggregator
pub const CLIST_BASE_URL: &str = "https://clist.by";
pub const CLIST_CONTEST_PATH: &str = "/api/v1/contest/";
pub const CLIST_ATCODER_RESOURCE_ID: u32 = 93;
pub const CLIST_CODEFORCES_RESOURCE_ID: u32 = 1;
pub const CLIST_CODECHEF_RESOURCE_ID: u32 = 2;

// AtCoder lists its contests in Japan Standard Time
pub const JST_OFFSET_SECS: i32 = 9 * 3600;
// Announcements are written for an Indian audience
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Fixed key the merged contest list is cached under
pub const CACHE_KEY: &str = "contestData";
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 30;

pub const BEGINNER_MARKER: &str = "beginner";

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
