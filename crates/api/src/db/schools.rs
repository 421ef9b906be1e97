//! School query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Schools;

/// All schools, alphabetical.
pub fn list() -> Built {
    Query::select()
        .columns([Schools::Id, Schools::Name])
        .from(Schools::Table)
        .order_by(Schools::Name, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    Query::select()
        .columns([Schools::Id, Schools::Name])
        .from(Schools::Table)
        .and_where(Expr::col(Schools::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Insert a school, renaming it if the id already exists.
pub fn upsert(id: &str, name: &str) -> Built {
    Query::insert()
        .into_table(Schools::Table)
        .columns([Schools::Id, Schools::Name])
        .values_panic([id.into(), name.into()])
        .on_conflict(
            OnConflict::column(Schools::Id)
                .update_column(Schools::Name)
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}
