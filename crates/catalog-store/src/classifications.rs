//! Classification and review-state repositories. Both rows are 1:1 with
//! their finding and cascade-delete with it.

use privguard_core::types::{ClassificationType, ConfidenceTier, ReviewStatus};
use privguard_core::{Classification, EntityId, Result, ReviewState};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;

/// Repository over `classifications`
pub struct ClassificationRepo;

impl ClassificationRepo {
    pub async fn insert(conn: &mut PgConnection, c: &Classification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO classifications
                (id, finding_id, classification_type, sub_category, confidence_score, tier,
                 justification, dpdpa_category, requires_consent, retention_period,
                 classifier_version, classified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(c.id)
        .bind(c.finding_id)
        .bind(c.classification_type.as_str())
        .bind(c.sub_category.as_deref())
        .bind(c.confidence_score)
        .bind(c.tier.as_str())
        .bind(&c.justification)
        .bind(c.dpdpa_category.as_deref())
        .bind(c.requires_consent)
        .bind(c.retention_period.as_deref())
        .bind(&c.classifier_version)
        .bind(c.classified_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get_for_finding(
        conn: &mut PgConnection,
        finding_id: EntityId,
    ) -> Result<Option<Classification>> {
        let row = sqlx::query("SELECT * FROM classifications WHERE finding_id = $1")
            .bind(finding_id)
            .fetch_optional(conn)
            .await?;
        row.map(|r| row_to_classification(&r)).transpose()
    }
}

/// Repository over `review_states`
pub struct ReviewRepo;

impl ReviewRepo {
    pub async fn insert(conn: &mut PgConnection, review: &ReviewState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_states (id, finding_id, status, reviewed_by, reviewed_at, comments)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(review.finding_id)
        .bind(review.status.as_str())
        .bind(review.reviewed_by.as_deref())
        .bind(review.reviewed_at)
        .bind(review.comments.as_deref())
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get_for_finding(
        conn: &mut PgConnection,
        finding_id: EntityId,
    ) -> Result<Option<ReviewState>> {
        let row = sqlx::query("SELECT * FROM review_states WHERE finding_id = $1")
            .bind(finding_id)
            .fetch_optional(conn)
            .await?;
        row.map(|r| row_to_review(&r)).transpose()
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        finding_id: EntityId,
        status: ReviewStatus,
        reviewed_by: &str,
        comments: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE review_states
            SET status = $2, reviewed_by = $3, reviewed_at = now(), comments = $4
            WHERE finding_id = $1
            "#,
        )
        .bind(finding_id)
        .bind(status.as_str())
        .bind(reviewed_by)
        .bind(comments)
        .execute(conn)
        .await?;
        Ok(())
    }
}

fn row_to_classification(row: &PgRow) -> Result<Classification> {
    Ok(Classification {
        id: row.try_get("id")?,
        finding_id: row.try_get("finding_id")?,
        classification_type: ClassificationType::from_str(
            row.try_get::<String, _>("classification_type")?.as_str(),
        )?,
        sub_category: row.try_get("sub_category")?,
        confidence_score: row.try_get("confidence_score")?,
        tier: ConfidenceTier::from_str(row.try_get::<String, _>("tier")?.as_str())?,
        justification: row.try_get("justification")?,
        dpdpa_category: row.try_get("dpdpa_category")?,
        requires_consent: row.try_get("requires_consent")?,
        retention_period: row.try_get("retention_period")?,
        classifier_version: row.try_get("classifier_version")?,
        classified_at: row.try_get("classified_at")?,
    })
}

fn row_to_review(row: &PgRow) -> Result<ReviewState> {
    Ok(ReviewState {
        id: row.try_get("id")?,
        finding_id: row.try_get("finding_id")?,
        status: ReviewStatus::from_str(row.try_get::<String, _>("status")?.as_str())?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at: row.try_get("reviewed_at")?,
        comments: row.try_get("comments")?,
    })
}
