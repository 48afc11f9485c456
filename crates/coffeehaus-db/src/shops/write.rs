//! Write operations for the `shops` table.
//!
//! Both statements bind each listing column as a parallel array and expand
//! them with `UNNEST`, so a batch costs one round trip regardless of size.
//! Per-row arrays (`types`, `photo_refs`) travel as `jsonb` because
//! `UNNEST` flattens nested Postgres arrays.

use chrono::{DateTime, Utc};
use coffeehaus_core::SyncInput;
use sqlx::PgPool;

const UNNEST_COLUMNS: &str = "UNNEST(\
     $1::text[], $2::text[], $3::text[], $4::text[], $5::float8[], $6::float8[], \
     $7::float4[], $8::int4[], $9::int2[], $10::jsonb[], $11::jsonb[], $12::jsonb[], \
     $13::text[], $14::text[], $15::text[]) \
     AS u(place_id, name, formatted_address, vicinity, lat, lng, \
          rating, ratings_total, price_level, types, photo_refs, hours, \
          website, formatted_phone, business_status)";

/// Column-major view of a batch of [`SyncInput`]s.
struct ListingColumns {
    place_ids: Vec<String>,
    names: Vec<String>,
    formatted_addresses: Vec<String>,
    vicinities: Vec<String>,
    lats: Vec<f64>,
    lngs: Vec<f64>,
    ratings: Vec<f32>,
    ratings_totals: Vec<i32>,
    price_levels: Vec<i16>,
    types: Vec<serde_json::Value>,
    photo_refs: Vec<serde_json::Value>,
    hours: Vec<Option<serde_json::Value>>,
    websites: Vec<String>,
    phones: Vec<String>,
    business_statuses: Vec<String>,
}

impl ListingColumns {
    fn collect(inputs: &[SyncInput]) -> Self {
        let n = inputs.len();
        let mut cols = Self {
            place_ids: Vec::with_capacity(n),
            names: Vec::with_capacity(n),
            formatted_addresses: Vec::with_capacity(n),
            vicinities: Vec::with_capacity(n),
            lats: Vec::with_capacity(n),
            lngs: Vec::with_capacity(n),
            ratings: Vec::with_capacity(n),
            ratings_totals: Vec::with_capacity(n),
            price_levels: Vec::with_capacity(n),
            types: Vec::with_capacity(n),
            photo_refs: Vec::with_capacity(n),
            hours: Vec::with_capacity(n),
            websites: Vec::with_capacity(n),
            phones: Vec::with_capacity(n),
            business_statuses: Vec::with_capacity(n),
        };

        for input in inputs {
            let l = &input.listing;
            cols.place_ids.push(input.external_id.clone());
            cols.names.push(l.name.clone());
            cols.formatted_addresses.push(l.formatted_address.clone());
            cols.vicinities.push(l.vicinity.clone());
            cols.lats.push(l.location.lat);
            cols.lngs.push(l.location.lng);
            cols.ratings.push(l.rating);
            cols.ratings_totals.push(l.ratings_total);
            cols.price_levels.push(l.price_level);
            cols.types.push(serde_json::Value::from(l.types.clone()));
            cols.photo_refs.push(serde_json::Value::from(l.photo_refs.clone()));
            cols.hours.push(
                l.opening_hours
                    .as_ref()
                    .and_then(|h| serde_json::to_value(h).ok()),
            );
            cols.websites.push(l.website.clone());
            cols.phones.push(l.formatted_phone.clone());
            cols.business_statuses.push(l.business_status.clone());
        }

        cols
    }

    fn bind_all<'q, O>(
        self,
        query: sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        query
            .bind(self.place_ids)
            .bind(self.names)
            .bind(self.formatted_addresses)
            .bind(self.vicinities)
            .bind(self.lats)
            .bind(self.lngs)
            .bind(self.ratings)
            .bind(self.ratings_totals)
            .bind(self.price_levels)
            .bind(self.types)
            .bind(self.photo_refs)
            .bind(self.hours)
            .bind(self.websites)
            .bind(self.phones)
            .bind(self.business_statuses)
    }
}

/// Insert every input whose `google_place_id` is not yet stored.
///
/// New rows get `coffeehaus_rating = NULL` and `verified = FALSE`. Rows that
/// lose a uniqueness race against a concurrent insert are skipped by
/// `ON CONFLICT DO NOTHING`; the returned list holds only the place ids this
/// call actually inserted, so callers can route the rest to the update path.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn insert_shops(
    pool: &PgPool,
    inputs: &[SyncInput],
    synced_at: DateTime<Utc>,
) -> Result<Vec<String>, sqlx::Error> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "INSERT INTO shops \
             (google_place_id, name, formatted_address, vicinity, location, \
              google_rating, ratings_total, price_level, types, photo_refs, hours, \
              website, formatted_phone, business_status, last_sync, \
              coffeehaus_rating, verified) \
         SELECT u.place_id, u.name, u.formatted_address, u.vicinity, \
                ST_SetSRID(ST_MakePoint(u.lng, u.lat), 4326)::geography, \
                u.rating, u.ratings_total, u.price_level, \
                ARRAY(SELECT jsonb_array_elements_text(u.types)), \
                ARRAY(SELECT jsonb_array_elements_text(u.photo_refs)), \
                u.hours, u.website, u.formatted_phone, u.business_status, $16, \
                NULL, FALSE \
         FROM {UNNEST_COLUMNS} \
         ON CONFLICT (google_place_id) DO NOTHING \
         RETURNING google_place_id"
    );

    ListingColumns::collect(inputs)
        .bind_all(sqlx::query_scalar::<_, String>(&sql))
        .bind(synced_at)
        .fetch_all(pool)
        .await
}

/// Refresh directory-sourced columns for stored shops matching each input's
/// place id, and stamp `last_sync`.
///
/// Empty strings, zero numbers, empty arrays, missing hours and a `(0, 0)`
/// location keep the stored value. `coffeehaus_rating` and `verified` are not
/// in the `SET` list.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn update_shops(
    pool: &PgPool,
    inputs: &[SyncInput],
    synced_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    if inputs.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "WITH updated AS ( \
             UPDATE shops AS s SET \
                 name              = COALESCE(NULLIF(u.name, ''), s.name), \
                 formatted_address = COALESCE(NULLIF(u.formatted_address, ''), s.formatted_address), \
                 vicinity          = COALESCE(NULLIF(u.vicinity, ''), s.vicinity), \
                 location          = CASE WHEN u.lat = 0 AND u.lng = 0 THEN s.location \
                                          ELSE ST_SetSRID(ST_MakePoint(u.lng, u.lat), 4326)::geography END, \
                 google_rating     = CASE WHEN u.rating > 0 THEN u.rating ELSE s.google_rating END, \
                 ratings_total     = CASE WHEN u.ratings_total > 0 THEN u.ratings_total ELSE s.ratings_total END, \
                 price_level       = CASE WHEN u.price_level > 0 THEN u.price_level ELSE s.price_level END, \
                 types             = CASE WHEN jsonb_array_length(u.types) > 0 \
                                          THEN ARRAY(SELECT jsonb_array_elements_text(u.types)) \
                                          ELSE s.types END, \
                 photo_refs        = CASE WHEN jsonb_array_length(u.photo_refs) > 0 \
                                          THEN ARRAY(SELECT jsonb_array_elements_text(u.photo_refs)) \
                                          ELSE s.photo_refs END, \
                 hours             = COALESCE(u.hours, s.hours), \
                 website           = COALESCE(NULLIF(u.website, ''), s.website), \
                 formatted_phone   = COALESCE(NULLIF(u.formatted_phone, ''), s.formatted_phone), \
                 business_status   = COALESCE(NULLIF(u.business_status, ''), s.business_status), \
                 last_sync         = $16 \
             FROM {UNNEST_COLUMNS} \
             WHERE s.google_place_id = u.place_id \
             RETURNING s.id \
         ) \
         SELECT COUNT(*) FROM updated"
    );

    let updated: i64 = ListingColumns::collect(inputs)
        .bind_all(sqlx::query_scalar::<_, i64>(&sql))
        .bind(synced_at)
        .fetch_one(pool)
        .await?;

    Ok(u64::try_from(updated).unwrap_or(0))
}
