//! Asset relationship repository.

use privguard_core::utils::{current_timestamp, generate_uuid};
use privguard_core::{AssetRelationship, EntityId, Result};
use sqlx::{PgConnection, Row};

/// Repository over `asset_relationships`
pub struct RelationshipRepo;

impl RelationshipRepo {
    /// Upsert on the unique (source, target, type) triple; metadata from
    /// the latest write wins.
    pub async fn upsert(
        conn: &mut PgConnection,
        source: EntityId,
        target: EntityId,
        relationship_type: &str,
        metadata: &serde_json::Value,
    ) -> Result<AssetRelationship> {
        let relationship = AssetRelationship {
            id: generate_uuid(),
            source_asset_id: source,
            target_asset_id: target,
            relationship_type: relationship_type.to_string(),
            metadata: metadata.clone(),
            created_at: current_timestamp(),
        };

        sqlx::query(
            r#"
            INSERT INTO asset_relationships
                (id, source_asset_id, target_asset_id, relationship_type, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_asset_id, target_asset_id, relationship_type)
            DO UPDATE SET metadata = EXCLUDED.metadata
            "#,
        )
        .bind(relationship.id)
        .bind(relationship.source_asset_id)
        .bind(relationship.target_asset_id)
        .bind(&relationship.relationship_type)
        .bind(&relationship.metadata)
        .bind(relationship.created_at)
        .execute(conn)
        .await?;

        Ok(relationship)
    }

    pub async fn for_asset(
        conn: &mut PgConnection,
        asset_id: EntityId,
    ) -> Result<Vec<AssetRelationship>> {
        let rows = sqlx::query(
            "SELECT * FROM asset_relationships WHERE source_asset_id = $1 OR target_asset_id = $1",
        )
        .bind(asset_id)
        .fetch_all(conn)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(AssetRelationship {
                    id: r.try_get("id")?,
                    source_asset_id: r.try_get("source_asset_id")?,
                    target_asset_id: r.try_get("target_asset_id")?,
                    relationship_type: r.try_get("relationship_type")?,
                    metadata: r.try_get("metadata")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect()
    }
}
