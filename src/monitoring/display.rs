//! Display model built from one resource pool snapshot.
//!
//! Rendering is a pure function of the snapshot. Front ends (the TUI and the
//! plain text printer) only walk the model; they never look at the pool.

use serde::Serialize;

use crate::core::{Resource, ResourcePool, StatusIndicator, Vm};

/// Literal shown in place of the table when a cycle fails at any stage.
pub const ERROR_MESSAGE: &str = "Error Reading from RPC Server";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DisplayModel {
    /// Nothing has been fetched yet.
    Pending,
    Table(PoolTable),
    Error { message: String },
    /// The poll loop has shut down.
    Stopped,
}

impl DisplayModel {
    pub fn error() -> Self {
        DisplayModel::Error {
            message: ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolTable {
    pub groups: Vec<ClusterGroup>,
}

impl PoolTable {
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }
}

/// All rows belonging to one cluster. The cluster cell spans `row_span` rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGroup {
    pub cluster: ClusterCell,
    pub row_span: usize,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterCell {
    pub name: String,
    pub cloud_type: String,
    pub vm_slots: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableRow {
    /// Placeholder row for a cluster without VMs; it has no VM or status cells.
    ClusterOnly,
    Vm { vm: VmCell, status: StatusCell },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmCell {
    pub name: String,
    pub memory: String,
    pub cpucores: String,
    pub vmtype: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCell {
    pub text: String,
    pub indicator: StatusIndicator,
}

pub fn render(pool: &ResourcePool) -> PoolTable {
    PoolTable {
        groups: pool.resources.iter().map(render_cluster).collect(),
    }
}

fn render_cluster(resource: &Resource) -> ClusterGroup {
    let rows: Vec<TableRow> = if resource.vms.is_empty() {
        vec![TableRow::ClusterOnly]
    } else {
        resource.vms.iter().map(render_vm).collect()
    };

    ClusterGroup {
        cluster: ClusterCell {
            name: resource.name.clone(),
            cloud_type: resource.cloud_type.clone(),
            vm_slots: resource.vm_slots,
        },
        row_span: rows.len(),
        rows,
    }
}

fn render_vm(vm: &Vm) -> TableRow {
    TableRow::Vm {
        vm: VmCell {
            name: vm.name.clone(),
            memory: vm.memory.to_string(),
            cpucores: vm.cpucores.to_string(),
            vmtype: vm.vmtype.clone(),
        },
        status: StatusCell {
            text: vm.status.clone(),
            indicator: vm.indicator(),
        },
    }
}
