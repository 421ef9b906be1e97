use axum::{Json, extract::State};

use classroom_api::{ListSchoolsResponse, db};

use crate::error::ApiErr;
use crate::storage::{Db, school_from_row, sq_query_map};

/// GET /api/schools: institutions offered by the registration form.
pub async fn list_schools(State(db): State<Db>) -> Result<Json<ListSchoolsResponse>, ApiErr> {
    let conn = db.conn();
    let schools = sq_query_map(&conn, db::schools::list(), school_from_row)
        .map_err(ApiErr::from_db("list schools"))?;
    Ok(Json(ListSchoolsResponse { schools }))
}
