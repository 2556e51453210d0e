//! Repository for archive artworks and their photos.

use sqlx::PgPool;

use plinth_core::geo::BoundingBox;
use plinth_core::types::DbId;

use crate::models::artwork::{ArtworkPhotoRow, ArtworkRow, CreateArtwork};

/// Column list for `artworks` queries.
const ARTWORK_COLUMNS: &str =
    "id, title, lat, lon, artists, tags, status, source_name, source_url, \
     created_at, updated_at";

/// Column list for `artwork_photos` queries.
const PHOTO_COLUMNS: &str = "id, artwork_id, url, photo_ref, created_at";

/// Provides read and patch operations for artworks. The import engine never
/// deletes rows and never rewrites existing tag values.
pub struct ArtworkRepo;

impl ArtworkRepo {
    /// Find a single artwork by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ArtworkRow>, sqlx::Error> {
        let sql = format!("SELECT {ARTWORK_COLUMNS} FROM artworks WHERE id = $1");
        sqlx::query_as::<_, ArtworkRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All artworks whose coordinates fall inside `bbox`, optionally
    /// filtered by publication status. This is the cheap prefilter for the
    /// spatial candidate search; callers refine by exact distance.
    pub async fn find_in_bbox(
        pool: &PgPool,
        bbox: &BoundingBox,
        status: Option<&str>,
    ) -> Result<Vec<ArtworkRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {ARTWORK_COLUMNS} FROM artworks \
             WHERE lat IS NOT NULL AND lon IS NOT NULL \
               AND lat BETWEEN $1 AND $2 \
               AND lon BETWEEN $3 AND $4 \
               AND ($5::TEXT IS NULL OR status = $5) \
             ORDER BY id"
        );
        sqlx::query_as::<_, ArtworkRow>(&sql)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Insert a new artwork, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateArtwork) -> Result<ArtworkRow, sqlx::Error> {
        let sql = format!(
            "INSERT INTO artworks \
                (title, lat, lon, artists, tags, status, source_name, source_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ARTWORK_COLUMNS}"
        );
        sqlx::query_as::<_, ArtworkRow>(&sql)
            .bind(&input.title)
            .bind(input.lat)
            .bind(input.lon)
            .bind(serde_json::json!(input.artists))
            .bind(&input.tags)
            .bind(&input.status)
            .bind(&input.source_name)
            .bind(&input.source_url)
            .fetch_one(pool)
            .await
    }

    /// Merge `added` tag entries into an artwork without touching existing
    /// keys. The left side of `||` loses on key collision, so existing
    /// values win even if a conflicting key slips into the delta. Returns
    /// `None` if no row with the given `id` exists.
    pub async fn merge_missing_tags(
        pool: &PgPool,
        id: DbId,
        added: &serde_json::Value,
    ) -> Result<Option<ArtworkRow>, sqlx::Error> {
        let sql = format!(
            "UPDATE artworks SET \
                tags = $2::jsonb || tags, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {ARTWORK_COLUMNS}"
        );
        sqlx::query_as::<_, ArtworkRow>(&sql)
            .bind(id)
            .bind(added)
            .fetch_optional(pool)
            .await
    }

    /// Record a photo reference for an artwork. Re-importing the same URL is
    /// a no-op; the existing row is returned unchanged.
    pub async fn add_photo(
        pool: &PgPool,
        artwork_id: DbId,
        url: &str,
        photo_ref: Option<&str>,
    ) -> Result<ArtworkPhotoRow, sqlx::Error> {
        let sql = format!(
            "INSERT INTO artwork_photos (artwork_id, url, photo_ref) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (artwork_id, url) DO UPDATE SET url = EXCLUDED.url \
             RETURNING {PHOTO_COLUMNS}"
        );
        sqlx::query_as::<_, ArtworkPhotoRow>(&sql)
            .bind(artwork_id)
            .bind(url)
            .bind(photo_ref)
            .fetch_one(pool)
            .await
    }

    /// All photo rows for an artwork, oldest first.
    pub async fn list_photos(
        pool: &PgPool,
        artwork_id: DbId,
    ) -> Result<Vec<ArtworkPhotoRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {PHOTO_COLUMNS} FROM artwork_photos \
             WHERE artwork_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ArtworkPhotoRow>(&sql)
            .bind(artwork_id)
            .fetch_all(pool)
            .await
    }
}
