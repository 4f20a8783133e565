/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Super admin role - full access
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Admin role - manages taxonomy and the media library
pub const ROLE_ADMIN: &str = "admin";

/// Editor role - read access to admin views
pub const ROLE_EDITOR: &str = "editor";

// =============================================================================
// REVALIDATION TAGS
// =============================================================================

/// Tag purged after any category mutation
pub const TAG_CATEGORIES: &str = "categories";

/// Tag purged after media uploads and deletions
pub const TAG_MEDIA: &str = "media";
