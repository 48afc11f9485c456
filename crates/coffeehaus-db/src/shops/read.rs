//! Read operations for the `shops` table.

use coffeehaus_core::LatLng;
use sqlx::PgPool;

use super::types::{ShopRow, SnapshotRow, SHOP_COLUMNS};

/// Upper bound on rows returned by the name and radius lookups.
const MAX_LOOKUP_ROWS: i64 = 50;

/// Case-insensitive substring match on `name`.
///
/// `%`, `_` and `\` in `name` are matched literally. Results are ordered by
/// `google_rating DESC, name`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_shops_by_name(pool: &PgPool, name: &str) -> Result<Vec<ShopRow>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(name));
    let sql = format!(
        "SELECT {SHOP_COLUMNS} \
         FROM shops \
         WHERE name ILIKE $1 ESCAPE '\\' \
         ORDER BY google_rating DESC, name \
         LIMIT $2"
    );
    sqlx::query_as::<_, ShopRow>(&sql)
        .bind(pattern)
        .bind(MAX_LOOKUP_ROWS)
        .fetch_all(pool)
        .await
}

/// Shops within `radius_m` meters of `center`, nearest first.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_shops_within_radius(
    pool: &PgPool,
    center: LatLng,
    radius_m: u32,
) -> Result<Vec<ShopRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {SHOP_COLUMNS} \
         FROM shops \
         WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography, $3) \
         ORDER BY ST_Distance(location, ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography) \
         LIMIT $4"
    );
    sqlx::query_as::<_, ShopRow>(&sql)
        .bind(center.lat)
        .bind(center.lng)
        .bind(f64::from(radius_m))
        .bind(MAX_LOOKUP_ROWS)
        .fetch_all(pool)
        .await
}

/// Full rows for the given directory ids, in no particular order.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_shops_by_place_ids(
    pool: &PgPool,
    place_ids: &[String],
) -> Result<Vec<ShopRow>, sqlx::Error> {
    if place_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!("SELECT {SHOP_COLUMNS} FROM shops WHERE google_place_id = ANY($1::text[])");
    sqlx::query_as::<_, ShopRow>(&sql)
        .bind(place_ids)
        .fetch_all(pool)
        .await
}

/// Comparable columns for every stored shop among `place_ids`, in one round trip.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_existing_snapshots(
    pool: &PgPool,
    place_ids: &[String],
) -> Result<Vec<SnapshotRow>, sqlx::Error> {
    if place_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, google_place_id, name, formatted_address, vicinity, \
                google_rating, ratings_total, price_level, \
                website, formatted_phone, business_status \
         FROM shops \
         WHERE google_place_id = ANY($1::text[])",
    )
    .bind(place_ids)
    .fetch_all(pool)
    .await
}

pub(super) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
