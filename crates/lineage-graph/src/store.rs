//! Graph store access.
//!
//! All node upserts are idempotent by primary key and edges are merged,
//! so a resync for the same asset is safe to repeat. The trait seam keeps
//! the synchronizer testable without a live Neo4j instance.

use async_trait::async_trait;
use neo4rs::{query, Graph};
use privguard_core::config::GraphConfig;
use privguard_core::models::graph::{
    AssetNode, ContainsPiiEdge, LineageAsset, LineageCategory, LineageFilter, LineageSystem,
    PiiCategoryNode, SystemNode,
};
use privguard_core::{EntityId, Error, Result, Timestamp};
use std::collections::BTreeMap;

/// Uniform graph operations over the three-level lineage schema
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_system(&self, node: &SystemNode) -> Result<()>;
    async fn upsert_asset(&self, node: &AssetNode, updated_at: Timestamp) -> Result<()>;
    async fn upsert_pii_category(&self, node: &PiiCategoryNode) -> Result<()>;
    async fn merge_owns_edge(&self, system_id: &str, asset_id: EntityId) -> Result<()>;
    async fn merge_contains_edge(&self, edge: &ContainsPiiEdge) -> Result<()>;
    /// Drop ASSET_CONTAINS_PII edges whose type no longer appears on the asset
    async fn remove_stale_contains_edges(
        &self,
        asset_id: EntityId,
        keep_types: &[String],
    ) -> Result<()>;
    /// Set the `until` timestamp on one (asset, pii_type) edge
    async fn close_exposure(
        &self,
        asset_id: EntityId,
        pii_type: &str,
        at: Timestamp,
    ) -> Result<()>;
    /// Graph-side updated_at probe for the resync sweep
    async fn asset_updated_at(&self, asset_id: EntityId) -> Result<Option<Timestamp>>;
    /// Hierarchy projection with optional filters
    async fn hierarchy(&self, filter: &LineageFilter) -> Result<Vec<LineageSystem>>;
    /// Liveness probe
    async fn ping(&self) -> Result<()>;
}

/// Neo4j-backed graph store (bolt protocol)
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(graph_err)?;
        Ok(Self { graph })
    }
}

fn graph_err(e: neo4rs::Error) -> Error {
    Error::graph(e.to_string())
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn upsert_system(&self, node: &SystemNode) -> Result<()> {
        self.graph
            .run(
                query(
                    "MERGE (s:System {id: $id})
                     SET s.host = $host, s.source_system = $source_system",
                )
                .param("id", node.id.as_str())
                .param("host", node.host.as_str())
                .param(
                    "source_system",
                    node.source_system.clone().unwrap_or_default(),
                ),
            )
            .await
            .map_err(graph_err)
    }

    async fn upsert_asset(&self, node: &AssetNode, updated_at: Timestamp) -> Result<()> {
        self.graph
            .run(
                query(
                    "MERGE (a:Asset {id: $id})
                     SET a.path = $path, a.asset_type = $asset_type,
                         a.environment = $environment, a.risk_score = $risk_score,
                         a.updated_at = $updated_at",
                )
                .param("id", node.id.to_string())
                .param("path", node.path.as_str())
                .param("asset_type", node.asset_type.as_str())
                .param("environment", node.environment.as_str())
                .param("risk_score", i64::from(node.risk_score))
                .param("updated_at", updated_at.to_rfc3339()),
            )
            .await
            .map_err(graph_err)
    }

    async fn upsert_pii_category(&self, node: &PiiCategoryNode) -> Result<()> {
        self.graph
            .run(
                query(
                    "MERGE (p:PII_Category {type: $type})
                     SET p.risk_level = $risk_level, p.finding_count = $finding_count,
                         p.avg_confidence = $avg_confidence",
                )
                .param("type", node.pii_type.as_str())
                .param("risk_level", node.risk_level.as_str())
                .param("finding_count", node.finding_count)
                .param("avg_confidence", node.avg_confidence),
            )
            .await
            .map_err(graph_err)
    }

    async fn merge_owns_edge(&self, system_id: &str, asset_id: EntityId) -> Result<()> {
        self.graph
            .run(
                query(
                    "MATCH (s:System {id: $system_id})
                     MATCH (a:Asset {id: $asset_id})
                     MERGE (s)-[:SYSTEM_OWNS_ASSET]->(a)",
                )
                .param("system_id", system_id)
                .param("asset_id", asset_id.to_string()),
            )
            .await
            .map_err(graph_err)
    }

    async fn merge_contains_edge(&self, edge: &ContainsPiiEdge) -> Result<()> {
        self.graph
            .run(
                query(
                    "MATCH (a:Asset {id: $asset_id})
                     MATCH (p:PII_Category {type: $type})
                     MERGE (a)-[r:ASSET_CONTAINS_PII]->(p)
                     SET r.finding_count = $finding_count,
                         r.avg_confidence = $avg_confidence,
                         r.updated_at = $updated_at,
                         r.until = null",
                )
                .param("asset_id", edge.asset_id.to_string())
                .param("type", edge.pii_type.as_str())
                .param("finding_count", edge.finding_count)
                .param("avg_confidence", edge.avg_confidence)
                .param("updated_at", edge.updated_at.to_rfc3339()),
            )
            .await
            .map_err(graph_err)
    }

    async fn remove_stale_contains_edges(
        &self,
        asset_id: EntityId,
        keep_types: &[String],
    ) -> Result<()> {
        self.graph
            .run(
                query(
                    "MATCH (a:Asset {id: $asset_id})-[r:ASSET_CONTAINS_PII]->(p:PII_Category)
                     WHERE NOT p.type IN $keep
                     DELETE r",
                )
                .param("asset_id", asset_id.to_string())
                .param("keep", keep_types.to_vec()),
            )
            .await
            .map_err(graph_err)
    }

    async fn close_exposure(
        &self,
        asset_id: EntityId,
        pii_type: &str,
        at: Timestamp,
    ) -> Result<()> {
        self.graph
            .run(
                query(
                    "MATCH (a:Asset {id: $asset_id})-[r:ASSET_CONTAINS_PII]->(p:PII_Category {type: $type})
                     SET r.until = $at",
                )
                .param("asset_id", asset_id.to_string())
                .param("type", pii_type)
                .param("at", at.to_rfc3339()),
            )
            .await
            .map_err(graph_err)
    }

    async fn asset_updated_at(&self, asset_id: EntityId) -> Result<Option<Timestamp>> {
        let mut rows = self
            .graph
            .execute(
                query("MATCH (a:Asset {id: $id}) RETURN a.updated_at AS updated_at")
                    .param("id", asset_id.to_string()),
            )
            .await
            .map_err(graph_err)?;

        if let Some(row) = rows.next().await.map_err(graph_err)? {
            let raw: Option<String> = row.get("updated_at").ok();
            return Ok(raw
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc)));
        }
        Ok(None)
    }

    async fn hierarchy(&self, filter: &LineageFilter) -> Result<Vec<LineageSystem>> {
        let risk_floor = filter.risk.map(severity_floor).unwrap_or(0);

        let mut rows = self
            .graph
            .execute(
                query(
                    "MATCH (s:System)-[:SYSTEM_OWNS_ASSET]->(a:Asset)
                     WHERE ($system = '' OR s.host = $system)
                       AND a.risk_score >= $risk_floor
                     OPTIONAL MATCH (a)-[r:ASSET_CONTAINS_PII]->(p:PII_Category)
                     WHERE r.until IS NULL AND ($category = '' OR p.type = $category)
                     RETURN s.id AS system_id, s.host AS host, s.source_system AS source_system,
                            a.id AS asset_id, a.path AS path, a.asset_type AS asset_type,
                            a.environment AS environment, a.risk_score AS risk_score,
                            p.type AS pii_type, r.finding_count AS finding_count,
                            r.avg_confidence AS avg_confidence
                     ORDER BY s.id, a.id",
                )
                .param("system", filter.system.clone().unwrap_or_default())
                .param("risk_floor", risk_floor)
                .param("category", filter.category.clone().unwrap_or_default()),
            )
            .await
            .map_err(graph_err)?;

        let mut systems: BTreeMap<String, LineageSystem> = BTreeMap::new();
        while let Some(row) = rows.next().await.map_err(graph_err)? {
            let system_id: String = row.get("system_id").map_err(|e| Error::graph(e.to_string()))?;
            let host: String = row.get("host").map_err(|e| Error::graph(e.to_string()))?;
            let source_system: Option<String> = row.get("source_system").ok();
            let asset_id_raw: String = row.get("asset_id").map_err(|e| Error::graph(e.to_string()))?;
            let asset_id = asset_id_raw
                .parse::<EntityId>()
                .map_err(|e| Error::graph(format!("bad asset id in graph: {e}")))?;

            let entry = systems.entry(system_id.clone()).or_insert_with(|| LineageSystem {
                system: SystemNode {
                    id: system_id,
                    host,
                    source_system: source_system.filter(|s| !s.is_empty()),
                },
                assets: Vec::new(),
            });

            let asset_node = AssetNode {
                id: asset_id,
                path: row.get("path").map_err(|e| Error::graph(e.to_string()))?,
                asset_type: row.get("asset_type").map_err(|e| Error::graph(e.to_string()))?,
                environment: row.get("environment").map_err(|e| Error::graph(e.to_string()))?,
                risk_score: row
                    .get::<i64>("risk_score")
                    .map_err(|e| Error::graph(e.to_string()))? as i32,
            };

            let idx = match entry.assets.iter().position(|a| a.asset.id == asset_id) {
                Some(i) => i,
                None => {
                    entry.assets.push(LineageAsset {
                        asset: asset_node,
                        categories: Vec::new(),
                    });
                    entry.assets.len() - 1
                }
            };
            let asset_entry = &mut entry.assets[idx];

            if let Ok(Some(pii_type)) = row.get::<Option<String>>("pii_type") {
                asset_entry.categories.push(LineageCategory {
                    pii_type,
                    finding_count: row.get::<i64>("finding_count").unwrap_or(0),
                    avg_confidence: row.get::<f64>("avg_confidence").unwrap_or(0.0),
                });
            }
        }

        Ok(systems.into_values().collect())
    }

    async fn ping(&self) -> Result<()> {
        let mut rows = self
            .graph
            .execute(query("RETURN 1 AS ok"))
            .await
            .map_err(graph_err)?;
        rows.next().await.map_err(graph_err)?;
        Ok(())
    }
}

fn severity_floor(severity: privguard_core::Severity) -> i64 {
    match severity {
        privguard_core::Severity::Critical => 95,
        privguard_core::Severity::High => 75,
        privguard_core::Severity::Medium => 40,
        privguard_core::Severity::Low => 0,
    }
}

/// No-op store used when `graph.enabled` is off: writes succeed silently,
/// reads report the lineage surface as unavailable.
pub struct NullStore;

#[async_trait]
impl GraphStore for NullStore {
    async fn upsert_system(&self, _node: &SystemNode) -> Result<()> {
        Ok(())
    }

    async fn upsert_asset(&self, _node: &AssetNode, _updated_at: Timestamp) -> Result<()> {
        Ok(())
    }

    async fn upsert_pii_category(&self, _node: &PiiCategoryNode) -> Result<()> {
        Ok(())
    }

    async fn merge_owns_edge(&self, _system_id: &str, _asset_id: EntityId) -> Result<()> {
        Ok(())
    }

    async fn merge_contains_edge(&self, _edge: &ContainsPiiEdge) -> Result<()> {
        Ok(())
    }

    async fn remove_stale_contains_edges(
        &self,
        _asset_id: EntityId,
        _keep_types: &[String],
    ) -> Result<()> {
        Ok(())
    }

    async fn close_exposure(
        &self,
        _asset_id: EntityId,
        _pii_type: &str,
        _at: Timestamp,
    ) -> Result<()> {
        Ok(())
    }

    async fn asset_updated_at(&self, _asset_id: EntityId) -> Result<Option<Timestamp>> {
        Ok(None)
    }

    async fn hierarchy(&self, _filter: &LineageFilter) -> Result<Vec<LineageSystem>> {
        Err(Error::graph_unavailable("graph sync is disabled"))
    }

    async fn ping(&self) -> Result<()> {
        Err(Error::graph_unavailable("graph sync is disabled"))
    }
}
