//! Direct heap operations for Agent entities.
//!
//! This module provides hot-path operations for agent registration and coordination
//! that bypass SQL parsing entirely by using direct heap access via pgrx.

use pgrx::pg_sys;
use pgrx::prelude::*;

use caliber_core::{
    Agent, AgentId, AgentStatus, CaliberError, CaliberResult, EntityIdType, EntityType,
    MemoryAccess, ScopeId, StorageError, TenantId, TrajectoryId,
};

use crate::column_maps::agent;
use crate::heap_ops::{
    current_timestamp, form_tuple, get_active_snapshot, insert_tuple, open_relation,
    timestamp_to_pgrx, update_tuple, HeapRelation, PgLockMode as HeapLockMode,
};
use crate::index_ops::{
    init_scan_key, open_index, operator_oids, update_indexes_for_insert, BTreeStrategy,
    IndexScanner,
};
use crate::tuple_extract::{
    extract_jsonb, extract_text, extract_text_array, extract_timestamp, extract_uuid,
    extract_values_and_nulls, json_to_datum, option_uuid_to_datum, string_to_datum,
    text_array_to_datum, timestamp_to_chrono, uuid_to_datum,
};

/// Agent row with tenant ownership metadata.
pub struct AgentRow {
    pub agent: Agent,
    pub tenant_id: Option<TenantId>,
}

impl From<AgentRow> for Agent {
    fn from(row: AgentRow) -> Self {
        row.agent
    }
}

/// Register a new agent by inserting an agent record using direct heap operations.
pub fn agent_register_heap(
    agent_id: AgentId,
    agent_type: &str,
    capabilities: &[String],
    memory_access: &MemoryAccess,
    can_delegate_to: &[String],
    reports_to: Option<AgentId>,
    tenant_id: TenantId,
) -> CaliberResult<AgentId> {
    let rel = open_relation(agent::TABLE_NAME, HeapLockMode::RowExclusive)?;
    validate_agent_relation(&rel)?;

    let now = current_timestamp();
    let now_datum = timestamp_to_pgrx(now)?.into_datum().ok_or_else(|| {
        CaliberError::Storage(StorageError::InsertFailed {
            entity_type: EntityType::Agent,
            reason: "Failed to convert timestamp to datum".to_string(),
        })
    })?;

    // Serialize memory_access to JSON
    let memory_access_json = serde_json::to_value(memory_access).map_err(|e| {
        CaliberError::Storage(StorageError::InsertFailed {
            entity_type: EntityType::Agent,
            reason: format!("Failed to serialize memory_access: {}", e),
        })
    })?;

    let mut values: [pg_sys::Datum; agent::NUM_COLS] = [pg_sys::Datum::from(0); agent::NUM_COLS];
    let mut nulls: [bool; agent::NUM_COLS] = [false; agent::NUM_COLS];

    // Set required fields
    values[agent::AGENT_ID as usize - 1] = uuid_to_datum(agent_id.as_uuid());
    values[agent::AGENT_TYPE as usize - 1] = string_to_datum(agent_type);

    // Set capabilities array
    if capabilities.is_empty() {
        nulls[agent::CAPABILITIES as usize - 1] = true;
    } else {
        values[agent::CAPABILITIES as usize - 1] = text_array_to_datum(capabilities);
    }

    // Set memory_access JSONB
    values[agent::MEMORY_ACCESS as usize - 1] = json_to_datum(&memory_access_json);

    // Set status - default to "idle"
    values[agent::STATUS as usize - 1] = string_to_datum("idle");

    // Set optional current_trajectory_id
    nulls[agent::CURRENT_TRAJECTORY_ID as usize - 1] = true;

    // Set optional current_scope_id
    nulls[agent::CURRENT_SCOPE_ID as usize - 1] = true;

    // Set can_delegate_to array
    if can_delegate_to.is_empty() {
        nulls[agent::CAN_DELEGATE_TO as usize - 1] = true;
    } else {
        values[agent::CAN_DELEGATE_TO as usize - 1] = text_array_to_datum(can_delegate_to);
    }

    // Set optional reports_to using helper
    let (reports_to_datum, reports_to_null) = build_optional_agent_uuid(reports_to);
    values[agent::REPORTS_TO as usize - 1] = reports_to_datum;
    nulls[agent::REPORTS_TO as usize - 1] = reports_to_null;

    // Set timestamps
    values[agent::CREATED_AT as usize - 1] = now_datum;
    values[agent::LAST_HEARTBEAT as usize - 1] = now_datum;

    // Set tenant_id
    values[agent::TENANT_ID as usize - 1] = uuid_to_datum(tenant_id.as_uuid());

    let tuple = form_tuple(&rel, &values, &nulls)?;
    let _tid = unsafe { insert_tuple(&rel, tuple)? };
    unsafe { update_indexes_for_insert(&rel, tuple, &values, &nulls)? };

    Ok(agent_id)
}

/// Get an agent by ID using direct heap operations.
pub fn agent_get_heap(agent_id: AgentId, tenant_id: TenantId) -> CaliberResult<Option<AgentRow>> {
    let rel = open_relation(agent::TABLE_NAME, HeapLockMode::AccessShare)?;
    let index_rel = open_index(agent::PK_INDEX)?;
    let snapshot = get_active_snapshot();

    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::UUID_EQ,
        uuid_to_datum(agent_id.as_uuid()),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    if let Some(tuple) = scanner.next() {
        let tuple_desc = rel.tuple_desc();
        let row = unsafe { tuple_to_agent(tuple, tuple_desc) }?;
        if row.tenant_id.map(|t| t.as_uuid()) == Some(tenant_id.as_uuid()) {
            Ok(Some(row))
        } else {
            Ok(None)
        }
    } else {
        Ok(None)
    }
}

/// Update agent heartbeat timestamp using direct heap operations.
pub fn agent_heartbeat_heap(agent_id: AgentId, tenant_id: TenantId) -> CaliberResult<bool> {
    let rel = open_relation(agent::TABLE_NAME, HeapLockMode::RowExclusive)?;
    let index_rel = open_index(agent::PK_INDEX)?;
    let snapshot = get_active_snapshot();

    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::UUID_EQ,
        uuid_to_datum(agent_id.as_uuid()),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    if let Some(old_tuple) = scanner.next() {
        let tuple_desc = rel.tuple_desc();
        let existing_tenant = unsafe { extract_uuid(old_tuple, tuple_desc, agent::TENANT_ID)? };
        if existing_tenant != Some(tenant_id.as_uuid()) {
            return Ok(false);
        }
        let (mut values, nulls) = unsafe { extract_values_and_nulls(old_tuple, tuple_desc) }?;

        // Update last_heartbeat to current timestamp
        let now = current_timestamp();
        let now_datum = timestamp_to_pgrx(now)?.into_datum().ok_or_else(|| {
            CaliberError::Storage(StorageError::UpdateFailed {
                entity_type: EntityType::Agent,
                id: agent_id.as_uuid(),
                reason: "Failed to convert timestamp to datum".to_string(),
            })
        })?;

        values[agent::LAST_HEARTBEAT as usize - 1] = now_datum;

        let new_tuple = form_tuple(&rel, &values, &nulls)?;
        let old_tid = scanner.current_tid().ok_or_else(|| {
            CaliberError::Storage(StorageError::TransactionFailed {
                reason: "Failed to get TID of agent tuple".to_string(),
            })
        })?;

        unsafe { update_tuple(&rel, &old_tid, new_tuple)? };
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Update agent status using direct heap operations.
pub fn agent_set_status_heap(
    agent_id: AgentId,
    status: AgentStatus,
    tenant_id: TenantId,
) -> CaliberResult<bool> {
    let rel = open_relation(agent::TABLE_NAME, HeapLockMode::RowExclusive)?;
    let index_rel = open_index(agent::PK_INDEX)?;
    let snapshot = get_active_snapshot();

    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::UUID_EQ,
        uuid_to_datum(agent_id.as_uuid()),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    if let Some(old_tuple) = scanner.next() {
        let tuple_desc = rel.tuple_desc();
        let existing_tenant = unsafe { extract_uuid(old_tuple, tuple_desc, agent::TENANT_ID)? };
        if existing_tenant != Some(tenant_id.as_uuid()) {
            return Ok(false);
        }
        let (mut values, nulls) = unsafe { extract_values_and_nulls(old_tuple, tuple_desc) }?;

        // Update status field
        let status_str = match status {
            AgentStatus::Idle => "idle",
            AgentStatus::Active => "active",
            AgentStatus::Blocked => "blocked",
            AgentStatus::Failed => "failed",
            AgentStatus::Offline => "offline",
        };
        values[agent::STATUS as usize - 1] = string_to_datum(status_str);

        let new_tuple = form_tuple(&rel, &values, &nulls)?;
        let old_tid = scanner.current_tid().ok_or_else(|| {
            CaliberError::Storage(StorageError::TransactionFailed {
                reason: "Failed to get TID of agent tuple".to_string(),
            })
        })?;

        unsafe { update_tuple(&rel, &old_tid, new_tuple)? };
        Ok(true)
    } else {
        Ok(false)
    }
}

/// List agents by type using direct heap operations.
pub fn agent_list_by_type_heap(
    agent_type: &str,
    tenant_id: TenantId,
) -> CaliberResult<Vec<AgentRow>> {
    let rel = open_relation(agent::TABLE_NAME, HeapLockMode::AccessShare)?;
    let index_rel = open_index(agent::TYPE_INDEX)?;
    let snapshot = get_active_snapshot();

    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::TEXT_EQ,
        string_to_datum(agent_type),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    let tuple_desc = rel.tuple_desc();
    let mut results = Vec::new();

    for tuple in &mut scanner {
        let row = unsafe { tuple_to_agent(tuple, tuple_desc) }?;
        if row.tenant_id.map(|t| t.as_uuid()) == Some(tenant_id.as_uuid()) {
            results.push(row);
        }
    }

    Ok(results)
}

/// Validate that a HeapRelation is suitable for agent operations.
fn validate_agent_relation(rel: &HeapRelation) -> CaliberResult<()> {
    let natts = rel.natts();
    if natts != agent::NUM_COLS as i16 {
        return Err(CaliberError::Storage(StorageError::TransactionFailed {
            reason: format!(
                "Agent relation has {} columns, expected {}",
                natts,
                agent::NUM_COLS
            ),
        }));
    }
    Ok(())
}

/// Build optional UUID datum using proper helper.
fn build_optional_agent_uuid(reports_to: Option<AgentId>) -> (pg_sys::Datum, bool) {
    match reports_to {
        Some(id) => (option_uuid_to_datum(Some(id.as_uuid())), false),
        None => (pg_sys::Datum::from(0), true),
    }
}

unsafe fn tuple_to_agent(
    tuple: *mut pg_sys::HeapTupleData,
    tuple_desc: pg_sys::TupleDesc,
) -> CaliberResult<AgentRow> {
    let agent_id = extract_uuid(tuple, tuple_desc, agent::AGENT_ID)?.ok_or_else(|| {
        CaliberError::Storage(StorageError::TransactionFailed {
            reason: "agent_id is NULL".to_string(),
        })
    })?;
    let agent_id = AgentId::new(agent_id);

    let agent_type = extract_text(tuple, tuple_desc, agent::AGENT_TYPE)?.ok_or_else(|| {
        CaliberError::Storage(StorageError::TransactionFailed {
            reason: "agent_type is NULL".to_string(),
        })
    })?;

    let capabilities =
        extract_text_array(tuple, tuple_desc, agent::CAPABILITIES)?.unwrap_or_default();

    let memory_access_json =
        extract_jsonb(tuple, tuple_desc, agent::MEMORY_ACCESS)?.ok_or_else(|| {
            CaliberError::Storage(StorageError::TransactionFailed {
                reason: "memory_access is NULL".to_string(),
            })
        })?;
    let memory_access: MemoryAccess = serde_json::from_value(memory_access_json).map_err(|e| {
        CaliberError::Storage(StorageError::TransactionFailed {
            reason: format!("Failed to deserialize memory_access: {}", e),
        })
    })?;

    let status_str = extract_text(tuple, tuple_desc, agent::STATUS)?.ok_or_else(|| {
        CaliberError::Storage(StorageError::TransactionFailed {
            reason: "status is NULL".to_string(),
        })
    })?;
    let status = match status_str.as_str() {
        "idle" => AgentStatus::Idle,
        "active" => AgentStatus::Active,
        "blocked" => AgentStatus::Blocked,
        "failed" => AgentStatus::Failed,
        "offline" => AgentStatus::Offline,
        _ => {
            pgrx::warning!(
                "CALIBER: Unknown agent status '{}', defaulting to Idle",
                status_str
            );
            AgentStatus::Idle
        }
    };

    let current_trajectory_id =
        extract_uuid(tuple, tuple_desc, agent::CURRENT_TRAJECTORY_ID)?.map(TrajectoryId::new);
    let current_scope_id =
        extract_uuid(tuple, tuple_desc, agent::CURRENT_SCOPE_ID)?.map(ScopeId::new);

    let can_delegate_to =
        extract_text_array(tuple, tuple_desc, agent::CAN_DELEGATE_TO)?.unwrap_or_default();

    let reports_to = extract_uuid(tuple, tuple_desc, agent::REPORTS_TO)?.map(AgentId::new);

    let created_at_ts =
        extract_timestamp(tuple, tuple_desc, agent::CREATED_AT)?.ok_or_else(|| {
            CaliberError::Storage(StorageError::TransactionFailed {
                reason: "created_at is NULL".to_string(),
            })
        })?;
    let created_at = timestamp_to_chrono(created_at_ts);

    let last_heartbeat_ts = extract_timestamp(tuple, tuple_desc, agent::LAST_HEARTBEAT)?
        .ok_or_else(|| {
            CaliberError::Storage(StorageError::TransactionFailed {
                reason: "last_heartbeat is NULL".to_string(),
            })
        })?;
    let last_heartbeat = timestamp_to_chrono(last_heartbeat_ts);

    let tenant_id = extract_uuid(tuple, tuple_desc, agent::TENANT_ID)?.map(TenantId::new);

    Ok(AgentRow {
        agent: Agent {
            agent_id,
            agent_type,
            capabilities,
            memory_access,
            status,
            current_trajectory_id,
            current_scope_id,
            can_delegate_to,
            reports_to,
            created_at,
            last_heartbeat,
        },
        tenant_id,
    })
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
