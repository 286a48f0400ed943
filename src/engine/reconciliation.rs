// src/engine/reconciliation.rs

//! Cruzamento do relatório de licenças com o de catraca.
//!
//! Índice por (colaborador, dia) dos dois lados e full outer join. O lado
//! ausente sai como "N/A". Nomes de catraca sem mapeamento não entram no
//! resultado, mas são listados em `unmapped`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::models::report::{
    AttendanceRow, DoorEntryMapping, DoorEntryRow, LeaveReportRow, RowSource, NOT_AVAILABLE,
};

type DayKey = (String, NaiveDate);

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub rows: Vec<AttendanceRow>,
    pub unmapped: Vec<String>,
}

#[derive(Debug, Default)]
struct LeaveDay {
    employee_name: String,
    statuses: BTreeSet<&'static str>,
    types: BTreeSet<&'static str>,
    days: Decimal,
}

#[derive(Debug, Default)]
struct DoorDay {
    first_in: Option<NaiveTime>,
    last_out: Option<NaiveTime>,
    punches: usize,
}

fn index_leave(rows: &[LeaveReportRow]) -> BTreeMap<DayKey, LeaveDay> {
    let mut index: BTreeMap<DayKey, LeaveDay> = BTreeMap::new();
    for row in rows {
        let entry = index.entry((row.employee_id.clone(), row.date)).or_default();
        if entry.employee_name.is_empty() {
            entry.employee_name = row.employee_name.clone();
        }
        entry.statuses.insert(row.leave_status.as_str());
        entry.types.insert(row.leave_type.as_str());
        entry.days += row.chargeable_days;
    }
    index
}

/// Resolve o colaborador de uma linha da catraca: primeiro pelo id, depois pelo nome.
struct MappingIndex<'a> {
    by_id: HashMap<&'a str, &'a str>,
    by_name: HashMap<&'a str, &'a str>,
}

impl<'a> MappingIndex<'a> {
    fn new(mappings: &'a [DoorEntryMapping]) -> Self {
        let by_id = mappings
            .iter()
            .map(|m| (m.door_system_id.as_str(), m.employee_id.as_str()))
            .collect();
        let by_name = mappings
            .iter()
            .map(|m| (m.door_system_name.as_str(), m.employee_id.as_str()))
            .collect();
        Self { by_id, by_name }
    }

    fn resolve(&self, row: &DoorEntryRow) -> Option<&'a str> {
        row.door_system_id
            .as_deref()
            .and_then(|id| self.by_id.get(id))
            .or_else(|| self.by_name.get(row.door_system_name.as_str()))
            .copied()
    }
}

fn min_time(a: Option<NaiveTime>, b: Option<NaiveTime>) -> Option<NaiveTime> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn fmt_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn join_set(set: &BTreeSet<&'static str>) -> String {
    set.iter().copied().collect::<Vec<_>>().join(",")
}

pub fn reconcile(
    leave_rows: &[LeaveReportRow],
    door_rows: &[DoorEntryRow],
    mappings: &[DoorEntryMapping],
    employee_names: &HashMap<String, String>,
) -> Reconciliation {
    let leave = index_leave(leave_rows);
    let mapping = MappingIndex::new(mappings);

    let mut door: BTreeMap<DayKey, DoorDay> = BTreeMap::new();
    let mut unmapped: BTreeSet<String> = BTreeSet::new();

    for row in door_rows {
        let Some(employee_id) = mapping.resolve(row) else {
            unmapped.insert(row.door_system_name.clone());
            continue;
        };
        let entry = door.entry((employee_id.to_string(), row.date)).or_default();
        entry.first_in = min_time(entry.first_in, row.first_in);
        entry.last_out = entry.last_out.max(row.last_out);
        entry.punches += 1;
    }

    let keys: BTreeSet<&DayKey> = leave.keys().chain(door.keys()).collect();

    let rows = keys
        .into_iter()
        .map(|key| {
            let (employee_id, date) = key;
            let leave_day = leave.get(key);
            let door_day = door.get(key);

            let employee_name = leave_day
                .map(|l| l.employee_name.clone())
                .filter(|name| !name.is_empty())
                .or_else(|| employee_names.get(employee_id).cloned())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            let source = match (leave_day, door_day) {
                (Some(_), Some(_)) => RowSource::Both,
                (Some(_), None) => RowSource::LeaveOnly,
                _ => RowSource::DoorOnly,
            };

            AttendanceRow {
                employee_id: employee_id.clone(),
                employee_name,
                date: *date,
                leave_status: leave_day
                    .map(|l| join_set(&l.statuses))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                leave_type: leave_day
                    .map(|l| join_set(&l.types))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                leave_days: leave_day
                    .map(|l| l.days.normalize().to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                first_in: fmt_time(door_day.and_then(|d| d.first_in)),
                last_out: fmt_time(door_day.and_then(|d| d.last_out)),
                door_punches: door_day
                    .map(|d| d.punches.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                source,
            }
        })
        .collect();

    Reconciliation { rows, unmapped: unmapped.into_iter().collect() }
}
