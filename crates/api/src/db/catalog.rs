//! Catalog repository: the jersey query engine plus league, team, type and
//! jersey management.
//!
//! # Jersey queries
//!
//! A listing is two statements over the same filtered join: a `COUNT(*)` for
//! the pre-pagination total and a page query with `ORDER BY`/`LIMIT`/`OFFSET`.
//! Images for the whole page are then fetched with one `= ANY($1)` query, so a
//! page never costs more than three round trips.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use fanatik_core::{
    JerseyFilter, JerseyId, JerseyTypeId, LeagueId, Page, PageRequest, SortKey, TeamId,
};

use super::{RepositoryError, map_conflict};
use crate::models::catalog::{
    Jersey, JerseyImage, JerseyImageInput, JerseyInput, JerseyRow, JerseyType, JerseyTypeInput,
    League, LeagueInput, Team, TeamInput,
};

const JERSEY_SELECT: &str = "SELECT j.id, j.team_id, j.jersey_type_id, j.season, j.main_color, \
                                    j.description, j.created_at, \
                                    t.name AS team_name, t.league_id, \
                                    jt.name AS type_name, jt.original_price, jt.current_price, \
                                    jt.description AS type_description";

const JERSEY_FROM: &str = " FROM jerseys j \
                           JOIN teams t ON t.id = j.team_id \
                           JOIN jersey_types jt ON jt.id = j.jersey_type_id";

/// Append the `WHERE` clause for a filter. Every predicate is optional and
/// they combine with `AND`.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &JerseyFilter) {
    qb.push(" WHERE TRUE");

    if let Some(pattern) = filter.search_pattern() {
        qb.push(" AND (t.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR j.description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR j.season ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if let Some(team_id) = filter.team_id {
        qb.push(" AND j.team_id = ");
        qb.push_bind(team_id);
    }
    if let Some(league_id) = filter.league_id {
        qb.push(" AND t.league_id = ");
        qb.push_bind(league_id);
    }
    if let Some(type_id) = filter.jersey_type_id {
        qb.push(" AND j.jersey_type_id = ");
        qb.push_bind(type_id);
    }
    if let Some(color) = &filter.main_color {
        qb.push(" AND j.main_color = ");
        qb.push_bind(color.clone());
    }
}

/// `ORDER BY` for a sort key. Ties and the unsorted case fall back to id so
/// pages are stable.
const fn order_clause(sort: Option<SortKey>) -> &'static str {
    match sort {
        Some(SortKey::Newest) => " ORDER BY j.created_at DESC, j.id DESC",
        Some(SortKey::PriceAsc) => " ORDER BY jt.current_price ASC, j.id ASC",
        Some(SortKey::PriceDesc) => " ORDER BY jt.current_price DESC, j.id ASC",
        None => " ORDER BY j.id ASC",
    }
}

/// Load images for a set of jerseys in one query, grouped by jersey.
///
/// Main images sort first within each group.
pub(crate) async fn load_images(
    conn: &mut PgConnection,
    ids: &[JerseyId],
) -> Result<HashMap<JerseyId, Vec<JerseyImage>>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let raw: Vec<i32> = ids.iter().map(JerseyId::as_i32).collect();
    let images = sqlx::query_as::<_, JerseyImage>(
        "SELECT id, jersey_id, image_base64, is_main FROM jersey_images \
         WHERE jersey_id = ANY($1) \
         ORDER BY jersey_id, is_main DESC, id",
    )
    .bind(raw)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<JerseyId, Vec<JerseyImage>> = HashMap::new();
    for image in images {
        grouped.entry(image.jersey_id).or_default().push(image);
    }
    Ok(grouped)
}

/// Attach images to joined rows, preserving row order.
async fn hydrate(
    conn: &mut PgConnection,
    rows: Vec<JerseyRow>,
) -> Result<Vec<Jersey>, RepositoryError> {
    let ids: Vec<JerseyId> = rows.iter().map(|r| r.id).collect();
    let mut images = load_images(conn, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let imgs = images.remove(&row.id).unwrap_or_default();
            row.into_jersey(imgs)
        })
        .collect())
}

/// Fully populated jerseys for a set of ids, keyed by id. Missing ids are
/// simply absent from the map.
pub(crate) async fn load_jerseys(
    conn: &mut PgConnection,
    ids: &[JerseyId],
) -> Result<HashMap<JerseyId, Jersey>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let raw: Vec<i32> = ids.iter().map(JerseyId::as_i32).collect();
    let sql = format!("{JERSEY_SELECT}{JERSEY_FROM} WHERE j.id = ANY($1)");
    let rows = sqlx::query_as::<_, JerseyRow>(&sql)
        .bind(raw)
        .fetch_all(&mut *conn)
        .await?;
    let jerseys = hydrate(conn, rows).await?;
    Ok(jerseys.into_iter().map(|j| (j.id, j)).collect())
}

async fn insert_images(
    conn: &mut PgConnection,
    jersey_id: JerseyId,
    images: &[JerseyImageInput],
) -> Result<(), RepositoryError> {
    if images.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<'_, Postgres> =
        QueryBuilder::new("INSERT INTO jersey_images (jersey_id, image_base64, is_main) ");
    qb.push_values(images, |mut row, image| {
        row.push_bind(jersey_id)
            .push_bind(image.image_base64.clone())
            .push_bind(image.is_main);
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

/// Fail with `NotFound` unless both the team and the jersey type exist.
async fn ensure_jersey_refs(
    conn: &mut PgConnection,
    team_id: TeamId,
    type_id: JerseyTypeId,
) -> Result<(), RepositoryError> {
    let (team, jersey_type): (bool, bool) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1), \
                EXISTS(SELECT 1 FROM jersey_types WHERE id = $2)",
    )
    .bind(team_id)
    .bind(type_id)
    .fetch_one(&mut *conn)
    .await?;
    if team && jersey_type {
        Ok(())
    } else {
        Err(RepositoryError::NotFound)
    }
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Jersey Queries
    // =========================================================================

    /// One page of jerseys matching `filter`, in `sort` order.
    ///
    /// `total` counts every match, not just this page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_jerseys(
        &self,
        filter: &JerseyFilter,
        sort: Option<SortKey>,
        page: PageRequest,
    ) -> Result<Page<Jersey>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*){JERSEY_FROM}"));
        push_filters(&mut count_qb, filter);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;

        let mut page_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("{JERSEY_SELECT}{JERSEY_FROM}"));
        push_filters(&mut page_qb, filter);
        page_qb.push(order_clause(sort));
        page_qb.push(" LIMIT ");
        page_qb.push_bind(page.limit());
        page_qb.push(" OFFSET ");
        page_qb.push_bind(page.offset());
        let rows = page_qb
            .build_query_as::<JerseyRow>()
            .fetch_all(&mut *conn)
            .await?;

        let data = hydrate(&mut conn, rows).await?;

        tracing::debug!(
            total,
            page = page.page(),
            returned = data.len(),
            sort = ?sort,
            "Listed jerseys"
        );

        Ok(Page::new(data, total, page))
    }

    /// A single jersey with its team, type and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the jersey does not exist.
    pub async fn get_jersey(&self, id: JerseyId) -> Result<Jersey, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_jerseys(&mut conn, &[id])
            .await?
            .remove(&id)
            .ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Jersey Management
    // =========================================================================

    /// Create a jersey and its images in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the team or jersey type does not
    /// exist.
    pub async fn create_jersey(&self, input: &JerseyInput) -> Result<Jersey, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        ensure_jersey_refs(&mut tx, input.team_id, input.jersey_type_id).await?;

        let id: JerseyId = sqlx::query_scalar(
            "INSERT INTO jerseys (team_id, jersey_type_id, season, main_color, description) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(input.team_id)
        .bind(input.jersey_type_id)
        .bind(&input.season)
        .bind(&input.main_color)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        insert_images(&mut tx, id, &input.images).await?;

        let jersey = load_jerseys(&mut tx, &[id])
            .await?
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        tracing::info!(jersey_id = %id, team_id = %input.team_id, "Jersey created");
        Ok(jersey)
    }

    /// Replace a jersey's fields. A non-empty image list replaces all images;
    /// an empty one leaves them untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the jersey, team or jersey type
    /// does not exist.
    pub async fn update_jersey(
        &self,
        id: JerseyId,
        input: &JerseyInput,
    ) -> Result<Jersey, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        ensure_jersey_refs(&mut tx, input.team_id, input.jersey_type_id).await?;

        let updated = sqlx::query(
            "UPDATE jerseys \
             SET team_id = $2, jersey_type_id = $3, season = $4, main_color = $5, description = $6 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.team_id)
        .bind(input.jersey_type_id)
        .bind(&input.season)
        .bind(&input.main_color)
        .bind(&input.description)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if !input.images.is_empty() {
            sqlx::query("DELETE FROM jersey_images WHERE jersey_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_images(&mut tx, id, &input.images).await?;
        }

        let jersey = load_jerseys(&mut tx, &[id])
            .await?
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(jersey)
    }

    /// Delete a jersey and its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the jersey does not exist.
    pub async fn delete_jersey(&self, id: JerseyId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM jerseys WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(jersey_id = %id, "Jersey deleted");
        Ok(())
    }

    // =========================================================================
    // Leagues
    // =========================================================================

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_league(&self, input: &LeagueInput) -> Result<League, RepositoryError> {
        sqlx::query_as::<_, League>(
            "INSERT INTO leagues (name, image_base64) VALUES ($1, $2) \
             RETURNING id, name, image_base64",
        )
        .bind(&input.name)
        .bind(&input.image_base64)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_conflict(e, "League already exists"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_leagues(&self) -> Result<Vec<League>, RepositoryError> {
        let leagues = sqlx::query_as::<_, League>(
            "SELECT id, name, image_base64 FROM leagues ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(leagues)
    }

    /// Delete a league together with its teams and their jerseys.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the league does not exist.
    pub async fn delete_league(&self, id: LeagueId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM leagues WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Teams
    // =========================================================================

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the league does not exist.
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_team(&self, input: &TeamInput) -> Result<Team, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let league_name: String = sqlx::query_scalar("SELECT name FROM leagues WHERE id = $1")
            .bind(input.league_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (name, image_base64, league_id) VALUES ($1, $2, $3) \
             RETURNING id, name, image_base64, league_id, NULL::TEXT AS league_name",
        )
        .bind(&input.name)
        .bind(&input.image_base64)
        .bind(input.league_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_conflict(e, "Team already exists"))?;

        tx.commit().await?;
        team.league_name = Some(league_name);
        Ok(team)
    }

    /// Teams ordered by name, optionally restricted to one league.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_teams(&self, league_id: Option<LeagueId>) -> Result<Vec<Team>, RepositoryError> {
        let teams = sqlx::query_as::<_, Team>(
            "SELECT t.id, t.name, t.image_base64, t.league_id, l.name AS league_name \
             FROM teams t \
             JOIN leagues l ON l.id = t.league_id \
             WHERE $1::INTEGER IS NULL OR t.league_id = $1 \
             ORDER BY t.name",
        )
        .bind(league_id)
        .fetch_all(self.pool)
        .await?;
        Ok(teams)
    }

    /// Delete a team together with its jerseys.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the team does not exist.
    pub async fn delete_team(&self, id: TeamId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Jersey Types
    // =========================================================================

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_jersey_type(
        &self,
        input: &JerseyTypeInput,
    ) -> Result<JerseyType, RepositoryError> {
        sqlx::query_as::<_, JerseyType>(
            "INSERT INTO jersey_types (name, original_price, current_price, description) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, original_price, current_price, description",
        )
        .bind(&input.name)
        .bind(input.original_price)
        .bind(input.current_price)
        .bind(&input.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_conflict(e, "Jersey type already exists"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_jersey_types(&self) -> Result<Vec<JerseyType>, RepositoryError> {
        let types = sqlx::query_as::<_, JerseyType>(
            "SELECT id, name, original_price, current_price, description \
             FROM jersey_types ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(types)
    }

    /// Replace a jersey type's name, prices and description.
    ///
    /// Existing cart and order lines keep the price they were created with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn update_jersey_type(
        &self,
        id: JerseyTypeId,
        input: &JerseyTypeInput,
    ) -> Result<JerseyType, RepositoryError> {
        sqlx::query_as::<_, JerseyType>(
            "UPDATE jersey_types \
             SET name = $2, original_price = $3, current_price = $4, description = $5 \
             WHERE id = $1 \
             RETURNING id, name, original_price, current_price, description",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.original_price)
        .bind(input.current_price)
        .bind(&input.description)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_conflict(e, "Jersey type already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist.
    /// Returns `RepositoryError::Conflict` if jerseys still use it.
    pub async fn delete_jersey_type(&self, id: JerseyTypeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM jersey_types WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_conflict(e, "Jersey type is still used by jerseys"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
