use uuid::Uuid;

/// School every test server is seeded with.
pub const SCHOOL_ID: &str = "inst001";
pub const SCHOOL_NAME: &str = "National Institute of Testing";

pub const PASSWORD: &str = "testpass99";

/// A lower-case email no other test will use.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@e2e.local", Uuid::new_v4().simple())
}

/// A course code no other test will use, e.g. `CS1a2b3c4d`.
pub fn unique_course_code() -> String {
    format!("CS{}", &Uuid::new_v4().simple().to_string()[..8])
}
