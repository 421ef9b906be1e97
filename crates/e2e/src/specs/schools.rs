use anyhow::{Result, ensure};

use classroom_api::ListSchoolsResponse;

use crate::client::TestContext;
use crate::fixtures::{SCHOOL_ID, SCHOOL_NAME};

/// GET /api/schools → the seeded school is offered.
pub async fn list_schools(ctx: &TestContext) -> Result<()> {
    let resp = ctx.get("/schools").await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());

    let body: ListSchoolsResponse = resp.json().await?;
    ensure!(
        body.schools
            .iter()
            .any(|s| s.id == SCHOOL_ID && s.name == SCHOOL_NAME),
        "seeded school missing from {:?}",
        body.schools
    );
    Ok(())
}
