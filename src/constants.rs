// Server defaults
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT_MB: usize = 50;

// Upload form
pub const MEDIA_FIELD: &str = "media";
pub const DEFAULT_MAX_FILES: usize = 10;
pub const DEFAULT_TITLE: &str = "Untitled";

// Public URL prefix for stored media
pub const UPLOADS_URL_PREFIX: &str = "/uploads";
