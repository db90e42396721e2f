use colored::{ColoredString, Colorize};
use std::fmt::Write;

use crate::core::StatusIndicator;
use crate::monitoring::display::{DisplayModel, PoolTable, TableRow};
use crate::monitoring::MonitorFrame;

/// Plain-text rendering of a display model for terminals without the TUI.
pub fn format_model(model: &DisplayModel) -> String {
    match model {
        DisplayModel::Table(table) => format_table(table),
        DisplayModel::Error { message } => format!("{}\n", message.red().bold()),
        DisplayModel::Pending => "Waiting for the first refresh...\n".to_string(),
        DisplayModel::Stopped => "Monitor stopped\n".to_string(),
    }
}

pub fn format_frame(frame: &MonitorFrame) -> String {
    let updated = frame
        .published_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{} cycle {} (updated {})\n{}",
        "==>".bold(),
        frame.cycle,
        updated,
        format_model(&frame.model)
    )
}

fn format_table(table: &PoolTable) -> String {
    let mut out = String::new();

    for group in &table.groups {
        let _ = writeln!(
            out,
            "{}  type: {}  available VM slots: {}",
            group.cluster.name.bold(),
            group.cluster.cloud_type,
            group.cluster.vm_slots
        );

        for row in &group.rows {
            match row {
                TableRow::ClusterOnly => {
                    let _ = writeln!(out, "    {}", "(no VMs)".dimmed());
                }
                TableRow::Vm { vm, status } => {
                    let _ = writeln!(
                        out,
                        "    {}  mem: {}  cpus: {}  type: {}  [{}]",
                        vm.name,
                        vm.memory,
                        vm.cpucores,
                        vm.vmtype,
                        paint(&status.text, status.indicator)
                    );
                }
            }
        }
    }

    if table.groups.is_empty() {
        out.push_str("No clusters reported\n");
    }
    out
}

fn paint(text: &str, indicator: StatusIndicator) -> ColoredString {
    match indicator {
        StatusIndicator::Green => text.black().on_green(),
        StatusIndicator::Yellow => text.black().on_yellow(),
        StatusIndicator::Red => text.white().on_red(),
    }
}
