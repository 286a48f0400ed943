// src/engine/leave_report.rs

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::engine::calendar::HolidayCalendar;
use crate::engine::day_calculator::chargeable_days;
use crate::models::employee::Employee;
use crate::models::leave::{LeaveRequest, LeaveStatus};
use crate::models::report::LeaveReportRow;

/// Primeiro e último dia do mês, ou None para mês inválido.
pub fn month_bounds(month: i16, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let month = u32::try_from(month).ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

fn is_reported(status: LeaveStatus) -> bool {
    matches!(status, LeaveStatus::Pending | LeaveStatus::Approved | LeaveStatus::Rejected)
}

/// Uma linha por (colaborador, dia útil) de cada pedido que cruza o mês.
///
/// O valor de cada dia sai do mesmo cálculo usado na submissão.
pub fn build_leave_rows(
    calendar: &HolidayCalendar,
    requests: &[LeaveRequest],
    employees: &[Employee],
    month: i16,
    year: i32,
) -> Vec<LeaveReportRow> {
    let Some((first, last)) = month_bounds(month, year) else {
        return Vec::new();
    };

    let names: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.employee_id.as_str(), e.name.as_str()))
        .collect();

    let mut rows: Vec<LeaveReportRow> = requests
        .iter()
        .filter(|r| is_reported(r.status) && r.overlaps(first, last))
        .flat_map(|r| {
            let start = r.from_date.max(first);
            let end = r.to_date.min(last);
            let name = names.get(r.employee_id.as_str()).copied().unwrap_or_default().to_string();

            start
                .iter_days()
                .take_while(move |day| *day <= end)
                .filter_map(move |day| {
                    let days = chargeable_days(calendar, day, day, r.duration_mode).ok()?;
                    if days.is_zero() {
                        return None;
                    }
                    Some(LeaveReportRow {
                        employee_id: r.employee_id.clone(),
                        employee_name: name.clone(),
                        date: day,
                        leave_status: r.status,
                        leave_type: r.leave_type,
                        chargeable_days: days,
                        leave_request_id: r.id,
                    })
                })
        })
        .collect();

    rows.sort_by(|a, b| {
        (a.employee_id.as_str(), a.date, a.leave_type).cmp(&(b.employee_id.as_str(), b.date, b.leave_type))
    });
    debug_assert!(rows.iter().all(|row| row.date.month() == first.month()));
    rows
}
