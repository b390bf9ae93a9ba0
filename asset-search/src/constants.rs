//! Shared constants for catalog search.

/// Field holding a document's display name in every collection.
pub const NAME_FIELD: &str = "name";

/// Asset field referencing tag ids.
pub const TAGS_FIELD: &str = "tags";

/// Asset field referencing project ids.
pub const PROJECTS_FIELD: &str = "projects";

/// Asset field referencing category ids.
pub const CATEGORIES_FIELD: &str = "categories";

/// Keywords that, searched alone, list every asset in the category of that
/// name.
pub const RESERVED_CATEGORIES: [&str; 7] =
    ["texture", "model", "video", "audio", "sprite", "image", "hdri"];

/// Characters with a meaning in regular expressions. Stripped from user
/// input before it is embedded in a pattern.
pub const REGEX_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Elements whose text content is dropped along with their tags.
pub(crate) const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Default whitelist file, relative to the working directory.
pub const DEFAULT_WHITELIST_PATH: &str = "valid-queries.json";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the whitelist path.
pub const ENV_WHITELIST: &str = "ASSET_SEARCH_WHITELIST";

/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "ASSET_SEARCH_LOG";

