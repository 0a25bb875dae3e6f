//! Direct heap operations for Message entities.
//!
//! This module provides hot-path operations for inter-agent messages that bypass SQL
//! parsing entirely by using direct heap access via pgrx.

use pgrx::prelude::*;
use pgrx::pg_sys;

use caliber_core::{
    AgentId, AgentMessage, ArtifactId, CaliberError, CaliberResult, EntityIdType, EntityType,
    MessageId, MessagePriority, MessageType, ScopeId, StorageError, TenantId, TrajectoryId,
};

use crate::column_maps::message;
use crate::heap_ops::{
    current_timestamp, form_tuple, insert_tuple, open_relation, update_tuple,
    PgLockMode as HeapLockMode, HeapRelation, get_active_snapshot,
    timestamp_to_pgrx,
};
use crate::index_ops::{
    init_scan_key, open_index, update_indexes_for_insert,
    BTreeStrategy, IndexScanner, operator_oids,
};
use crate::tuple_extract::{
    extract_uuid, extract_text, extract_timestamp, extract_uuid_array,
    extract_values_and_nulls, uuid_to_datum, string_to_datum,
    timestamp_to_chrono, uuid_array_to_datum, option_uuid_to_datum,
    option_string_to_datum, option_datetime_to_datum,
};

/// Message row with tenant ownership metadata.
pub struct MessageRow {
    pub message: AgentMessage,
    pub tenant_id: Option<TenantId>,
}

impl From<MessageRow> for AgentMessage {
    fn from(row: MessageRow) -> Self {
        row.message
    }
}

type OptionalMessageDatums = (
    pg_sys::Datum,
    pg_sys::Datum,
    pg_sys::Datum,
    pg_sys::Datum,
    pg_sys::Datum,
    bool,
    bool,
    bool,
    bool,
    bool,
);

/// Send a message by inserting a message record using direct heap operations.
pub struct MessageSendParams<'a> {
    pub message_id: MessageId,
    pub from_agent_id: AgentId,
    pub to_agent_id: Option<AgentId>,
    pub to_agent_type: Option<&'a str>,
    pub message_type: MessageType,
    pub payload: &'a str,
    pub trajectory_id: Option<TrajectoryId>,
    pub scope_id: Option<ScopeId>,
    pub artifact_ids: &'a [ArtifactId],
    pub priority: MessagePriority,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub tenant_id: TenantId,
}

pub fn message_send_heap(params: MessageSendParams<'_>) -> CaliberResult<MessageId> {
    let MessageSendParams {
        message_id,
        from_agent_id,
        to_agent_id,
        to_agent_type,
        message_type,
        payload,
        trajectory_id,
        scope_id,
        artifact_ids,
        priority,
        expires_at,
        tenant_id,
    } = params;
    let rel = open_relation(message::TABLE_NAME, HeapLockMode::RowExclusive)?;
    validate_message_relation(&rel)?;

    let now = current_timestamp();
    let now_datum = timestamp_to_pgrx(now)?.into_datum()
        .ok_or_else(|| CaliberError::Storage(StorageError::InsertFailed {
            entity_type: EntityType::Message,
            reason: "Failed to convert timestamp to datum".to_string(),
        }))?;
    
    let mut values: [pg_sys::Datum; message::NUM_COLS] = [pg_sys::Datum::from(0); message::NUM_COLS];
    let mut nulls: [bool; message::NUM_COLS] = [false; message::NUM_COLS];

    // Use helper for optional fields
    let (to_agent_datum, to_type_datum, traj_datum, scope_datum, expires_datum,
         to_agent_null, to_type_null, traj_null, scope_null, expires_null) =
        build_optional_message_datums(to_agent_id, to_agent_type, trajectory_id, scope_id, expires_at)?;

    // Set required fields
    values[message::MESSAGE_ID as usize - 1] = uuid_to_datum(message_id.as_uuid());
    values[message::FROM_AGENT_ID as usize - 1] = uuid_to_datum(from_agent_id.as_uuid());

    // Set optional to_agent_id
    values[message::TO_AGENT_ID as usize - 1] = to_agent_datum;
    nulls[message::TO_AGENT_ID as usize - 1] = to_agent_null;

    // Set optional to_agent_type
    values[message::TO_AGENT_TYPE as usize - 1] = to_type_datum;
    nulls[message::TO_AGENT_TYPE as usize - 1] = to_type_null;

    // Set message_type
    let message_type_str = match message_type {
        MessageType::TaskDelegation => "task_delegation",
        MessageType::TaskResult => "task_result",
        MessageType::ContextRequest => "context_request",
        MessageType::ContextShare => "context_share",
        MessageType::CoordinationSignal => "coordination_signal",
        MessageType::Handoff => "handoff",
        MessageType::Interrupt => "interrupt",
        MessageType::Heartbeat => "heartbeat",
    };
    values[message::MESSAGE_TYPE as usize - 1] = string_to_datum(message_type_str);

    // Set payload
    values[message::PAYLOAD as usize - 1] = string_to_datum(payload);

    // Set optional trajectory_id
    values[message::TRAJECTORY_ID as usize - 1] = traj_datum;
    nulls[message::TRAJECTORY_ID as usize - 1] = traj_null;

    // Set optional scope_id
    values[message::SCOPE_ID as usize - 1] = scope_datum;
    nulls[message::SCOPE_ID as usize - 1] = scope_null;

    // Set artifact_ids array
    if artifact_ids.is_empty() {
        nulls[message::ARTIFACT_IDS as usize - 1] = true;
    } else {
        let artifact_uuids: Vec<uuid::Uuid> = artifact_ids.iter().map(|id| id.as_uuid()).collect();
        values[message::ARTIFACT_IDS as usize - 1] = uuid_array_to_datum(&artifact_uuids);
    }

    // Set timestamps
    values[message::CREATED_AT as usize - 1] = now_datum;
    nulls[message::DELIVERED_AT as usize - 1] = true;
    nulls[message::ACKNOWLEDGED_AT as usize - 1] = true;

    // Set priority
    let priority_str = match priority {
        MessagePriority::Low => "low",
        MessagePriority::Normal => "normal",
        MessagePriority::High => "high",
        MessagePriority::Critical => "critical",
    };
    values[message::PRIORITY as usize - 1] = string_to_datum(priority_str);

    // Set optional expires_at
    values[message::EXPIRES_AT as usize - 1] = expires_datum;
    nulls[message::EXPIRES_AT as usize - 1] = expires_null;

    // Set tenant_id
    values[message::TENANT_ID as usize - 1] = uuid_to_datum(tenant_id.as_uuid());
    
    let tuple = form_tuple(&rel, &values, &nulls)?;
    let _tid = unsafe { insert_tuple(&rel, tuple)? };
    unsafe { update_indexes_for_insert(&rel, tuple, &values, &nulls)? };
    
    Ok(message_id)
}

/// Get a message by ID using direct heap operations.
pub fn message_get_heap(message_id: MessageId, tenant_id: TenantId) -> CaliberResult<Option<MessageRow>> {
    let rel = open_relation(message::TABLE_NAME, HeapLockMode::AccessShare)?;
    let index_rel = open_index(message::PK_INDEX)?;
    let snapshot = get_active_snapshot();
    
    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::UUID_EQ,
        uuid_to_datum(message_id.as_uuid()),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    if let Some(tuple) = scanner.next() {
        let tuple_desc = rel.tuple_desc();
        let row = unsafe { tuple_to_message(tuple, tuple_desc) }?;
        if row.tenant_id.map(|t| t.as_uuid()) == Some(tenant_id.as_uuid()) {
            Ok(Some(row))
        } else {
            Ok(None)
        }
    } else {
        Ok(None)
    }
}

/// List messages for a specific agent using direct heap operations.
pub fn message_list_for_agent_heap(
    to_agent_id: AgentId,
    tenant_id: TenantId,
) -> CaliberResult<Vec<MessageRow>> {
    let rel = open_relation(message::TABLE_NAME, HeapLockMode::AccessShare)?;
    let index_rel = open_index(message::TO_AGENT_INDEX)?;
    let snapshot = get_active_snapshot();
    
    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::UUID_EQ,
        uuid_to_datum(to_agent_id.as_uuid()),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    let tuple_desc = rel.tuple_desc();
    let mut results = Vec::new();

    for tuple in &mut scanner {
        let row = unsafe { tuple_to_message(tuple, tuple_desc) }?;
        if row.tenant_id.map(|t| t.as_uuid()) == Some(tenant_id.as_uuid()) {
            results.push(row);
        }
    }
    
    Ok(results)
}

/// Acknowledge a message by updating its acknowledged_at field using direct heap operations.
pub fn message_acknowledge_heap(message_id: MessageId, tenant_id: TenantId) -> CaliberResult<bool> {
    let rel = open_relation(message::TABLE_NAME, HeapLockMode::RowExclusive)?;
    let index_rel = open_index(message::PK_INDEX)?;
    let snapshot = get_active_snapshot();
    
    let mut scan_key = pg_sys::ScanKeyData::default();
    init_scan_key(
        &mut scan_key,
        1,
        BTreeStrategy::Equal,
        operator_oids::UUID_EQ,
        uuid_to_datum(message_id.as_uuid()),
    );

    let mut scanner = unsafe { IndexScanner::new(&rel, &index_rel, snapshot, 1, &mut scan_key) };

    if let Some(old_tuple) = scanner.next() {
        let tuple_desc = rel.tuple_desc();
        let existing_tenant = unsafe { extract_uuid(old_tuple, tuple_desc, message::TENANT_ID)? };
        if existing_tenant != Some(tenant_id.as_uuid()) {
            return Ok(false);
        }
        let (mut values, mut nulls) = unsafe { extract_values_and_nulls(old_tuple, tuple_desc) }?;
        
        // Update acknowledged_at to current timestamp
        let now = current_timestamp();
        let now_datum = timestamp_to_pgrx(now)?.into_datum()
            .ok_or_else(|| CaliberError::Storage(StorageError::UpdateFailed {
                entity_type: EntityType::Message,
                id: message_id.as_uuid(),
                reason: "Failed to convert timestamp to datum".to_string(),
            }))?;
        
        values[message::ACKNOWLEDGED_AT as usize - 1] = now_datum;
        nulls[message::ACKNOWLEDGED_AT as usize - 1] = false;
        
        let new_tuple = form_tuple(&rel, &values, &nulls)?;
        let old_tid = scanner.current_tid()
            .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
                reason: "Failed to get TID of message tuple".to_string(),
            }))?;
        
        unsafe { update_tuple(&rel, &old_tid, new_tuple)? };
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Validate that a HeapRelation is suitable for message operations.
fn validate_message_relation(rel: &HeapRelation) -> CaliberResult<()> {
    let natts = rel.natts();
    if natts != message::NUM_COLS as i16 {
        return Err(CaliberError::Storage(StorageError::TransactionFailed {
            reason: format!(
                "Message relation has {} columns, expected {}",
                natts,
                message::NUM_COLS
            ),
        }));
    }
    Ok(())
}

/// Build optional datum values for message fields using proper option_* helpers.
fn build_optional_message_datums(
    to_agent_id: Option<AgentId>,
    to_agent_type: Option<&str>,
    trajectory_id: Option<TrajectoryId>,
    scope_id: Option<ScopeId>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
) -> CaliberResult<OptionalMessageDatums> {
    let (to_agent_datum, to_agent_null) = match to_agent_id {
        Some(id) => (option_uuid_to_datum(Some(id.as_uuid())), false),
        None => (pg_sys::Datum::from(0), true),
    };

    let (to_type_datum, to_type_null) = match to_agent_type {
        Some(t) => (option_string_to_datum(Some(t)), false),
        None => (pg_sys::Datum::from(0), true),
    };

    let (traj_datum, traj_null) = match trajectory_id {
        Some(id) => (option_uuid_to_datum(Some(id.as_uuid())), false),
        None => (pg_sys::Datum::from(0), true),
    };

    let (scope_datum, scope_null) = match scope_id {
        Some(id) => (option_uuid_to_datum(Some(id.as_uuid())), false),
        None => (pg_sys::Datum::from(0), true),
    };

    let (expires_datum, expires_null) = match expires_at {
        Some(dt) => (option_datetime_to_datum(Some(dt))?, false),
        None => (pg_sys::Datum::from(0), true),
    };

    Ok((
        to_agent_datum,
        to_type_datum,
        traj_datum,
        scope_datum,
        expires_datum,
        to_agent_null,
        to_type_null,
        traj_null,
        scope_null,
        expires_null,
    ))
}

unsafe fn tuple_to_message(
    tuple: *mut pg_sys::HeapTupleData,
    tuple_desc: pg_sys::TupleDesc,
) -> CaliberResult<MessageRow> {
    let message_id = extract_uuid(tuple, tuple_desc, message::MESSAGE_ID)?
        .map(MessageId::new)
        .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
            reason: "message_id is NULL".to_string(),
        }))?;

    let from_agent_id = extract_uuid(tuple, tuple_desc, message::FROM_AGENT_ID)?
        .map(AgentId::new)
        .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
            reason: "from_agent_id is NULL".to_string(),
        }))?;

    let to_agent_id = extract_uuid(tuple, tuple_desc, message::TO_AGENT_ID)?.map(AgentId::new);
    let to_agent_type = extract_text(tuple, tuple_desc, message::TO_AGENT_TYPE)?;
    
    let message_type_str = extract_text(tuple, tuple_desc, message::MESSAGE_TYPE)?
        .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
            reason: "message_type is NULL".to_string(),
        }))?;
    let message_type = match message_type_str.as_str() {
        "task_delegation" => MessageType::TaskDelegation,
        "task_result" => MessageType::TaskResult,
        "context_request" => MessageType::ContextRequest,
        "context_share" => MessageType::ContextShare,
        "coordination_signal" => MessageType::CoordinationSignal,
        "handoff" => MessageType::Handoff,
        "interrupt" => MessageType::Interrupt,
        "heartbeat" => MessageType::Heartbeat,
        _ => {
            pgrx::warning!("CALIBER: Unknown message type '{}', defaulting to CoordinationSignal", message_type_str);
            MessageType::CoordinationSignal
        }
    };
    
    let payload = extract_text(tuple, tuple_desc, message::PAYLOAD)?
        .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
            reason: "payload is NULL".to_string(),
        }))?;
    
    let trajectory_id = extract_uuid(tuple, tuple_desc, message::TRAJECTORY_ID)?.map(TrajectoryId::new);
    let scope_id = extract_uuid(tuple, tuple_desc, message::SCOPE_ID)?.map(ScopeId::new);

    let artifact_ids = extract_uuid_array(tuple, tuple_desc, message::ARTIFACT_IDS)?
        .map(|uuids| uuids.into_iter().map(ArtifactId::new).collect())
        .unwrap_or_default();
    
    let created_at_ts = extract_timestamp(tuple, tuple_desc, message::CREATED_AT)?
        .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
            reason: "created_at is NULL".to_string(),
        }))?;
    let created_at = timestamp_to_chrono(created_at_ts);
    
    let delivered_at = extract_timestamp(tuple, tuple_desc, message::DELIVERED_AT)?
        .map(timestamp_to_chrono);
    
    let acknowledged_at = extract_timestamp(tuple, tuple_desc, message::ACKNOWLEDGED_AT)?
        .map(timestamp_to_chrono);
    
    let priority_str = extract_text(tuple, tuple_desc, message::PRIORITY)?
        .ok_or_else(|| CaliberError::Storage(StorageError::TransactionFailed {
            reason: "priority is NULL".to_string(),
        }))?;
    let priority = match priority_str.as_str() {
        "low" => MessagePriority::Low,
        "normal" => MessagePriority::Normal,
        "high" => MessagePriority::High,
        "critical" => MessagePriority::Critical,
        _ => {
            pgrx::warning!("CALIBER: Unknown message priority '{}', defaulting to Normal", priority_str);
            MessagePriority::Normal
        }
    };
    
    let expires_at = extract_timestamp(tuple, tuple_desc, message::EXPIRES_AT)?
        .map(timestamp_to_chrono);

    let tenant_id = extract_uuid(tuple, tuple_desc, message::TENANT_ID)?.map(TenantId::new);
    
    Ok(MessageRow {
        message: AgentMessage {
            message_id,
            from_agent_id,
            to_agent_id,
            to_agent_type,
            message_type,
            payload,
            trajectory_id,
            scope_id,
            artifact_ids,
            created_at,
            delivered_at,
            acknowledged_at,
            priority,
            expires_at,
        },
        tenant_id,
    })
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
