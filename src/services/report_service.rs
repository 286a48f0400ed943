// src/services/report_service.rs

//! Relatórios mensais: licenças (gerado), catraca (upload) e presença (cruzamento).
//!
//! O conteúdo é calculado inteiro em memória (numa thread de bloqueio) e só
//! então gravado com um único INSERT; cancelar no meio não deixa lixo.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
    common::{db_utils::with_timeout, error::AppError},
    db::{DoorMappingStore, LeaveStore, PeriodLock, ReportStore},
    engine::{leave_report, reconciliation},
    models::report::{
        DoorEntryMapping, DoorEntryMappingPayload, GenerateReportPayload, MonthlyReport, ReportPayload, ReportQuery,
        ReportSummary, ReportType, UploadDoorEntryPayload,
    },
    services::{
        approver_service::ApproverService, calendar_service::CalendarService, generation_guard::GenerationGuard,
    },
};

#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
    leaves: Arc<dyn LeaveStore>,
    mappings: Arc<dyn DoorMappingStore>,
    approvers: ApproverService,
    calendar: CalendarService,
    guard: GenerationGuard,
    timeout: Duration,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        leaves: Arc<dyn LeaveStore>,
        mappings: Arc<dyn DoorMappingStore>,
        approvers: ApproverService,
        calendar: CalendarService,
        timeout: Duration,
    ) -> Self {
        Self { reports, leaves, mappings, approvers, calendar, guard: GenerationGuard::new(), timeout }
    }

    pub fn guard(&self) -> &GenerationGuard {
        &self.guard
    }

    /// Trava do período no store (entre instâncias), depois do guard local.
    async fn lock_period(&self, report_type: ReportType, month: i16, year: i32) -> Result<PeriodLock, AppError> {
        with_timeout(self.timeout, "try_lock_period", self.reports.try_lock_period(report_type, month, year))
            .await?
            .ok_or(AppError::GenerationInProgress { report_type, month, year })
    }

    async fn commit(&self, report: MonthlyReport) -> Result<MonthlyReport, AppError> {
        with_timeout(self.timeout, "insert_report", self.reports.insert_report(&report)).await?;
        tracing::info!(
            "📊 Relatório {:?} {}/{} gravado: {} ({} linha(s))",
            report.report_type,
            report.period_month,
            report.period_year,
            report.id,
            report.payload.len()
        );
        Ok(report)
    }

    fn new_report(
        payload: ReportPayload,
        month: i16,
        year: i32,
        now: NaiveDateTime,
        source_file_ref: Option<String>,
        unmapped: Vec<String>,
    ) -> MonthlyReport {
        MonthlyReport {
            id: Uuid::new_v4(),
            report_type: payload.report_type(),
            period_month: month,
            period_year: year,
            generated_at: now,
            payload,
            source_file_ref,
            unmapped,
        }
    }

    // --- GERAÇÃO POR PERÍODO ---
    pub async fn generate(&self, request: &GenerateReportPayload, now: NaiveDateTime) -> Result<MonthlyReport, AppError> {
        match request.report_type {
            ReportType::LeaveReport => self.generate_leave_report(request.month, request.year, now).await,
            ReportType::AttendanceReport => self.attendance_for_period(request.month, request.year, now).await,
            ReportType::DoorEntryReport => Err(AppError::Validation(
                "door-entry reports come from the door system and must be uploaded".into(),
            )),
        }
    }

    pub async fn generate_leave_report(&self, month: i16, year: i32, now: NaiveDateTime) -> Result<MonthlyReport, AppError> {
        let _permit = self.guard.try_acquire(ReportType::LeaveReport, month, year)?;
        let _lock = self.lock_period(ReportType::LeaveReport, month, year).await?;

        let (first, last) = leave_report::month_bounds(month, year)
            .ok_or_else(|| AppError::Validation(format!("invalid period {month}/{year}")))?;

        let requests = with_timeout(self.timeout, "leaves_overlapping", self.leaves.leaves_overlapping(first, last)).await?;
        let employees = self.approvers.list_employees().await?;
        let calendar = self.calendar.calendar_between(first, last).await?;

        let rows = tokio::task::spawn_blocking(move || {
            leave_report::build_leave_rows(&calendar, &requests, &employees, month, year)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

        self.commit(Self::new_report(ReportPayload::Leave(rows), month, year, now, None, Vec::new()))
            .await
    }

    // --- UPLOAD DA CATRACA ---
    pub async fn upload_door_entry(
        &self,
        upload: UploadDoorEntryPayload,
        now: NaiveDateTime,
    ) -> Result<MonthlyReport, AppError> {
        let _permit = self.guard.try_acquire(ReportType::DoorEntryReport, upload.month, upload.year)?;
        let _lock = self.lock_period(ReportType::DoorEntryReport, upload.month, upload.year).await?;

        let (first, last) = leave_report::month_bounds(upload.month, upload.year)
            .ok_or_else(|| AppError::Validation(format!("invalid period {}/{}", upload.month, upload.year)))?;

        if let Some(row) = upload.rows.iter().find(|row| row.date < first || row.date > last) {
            return Err(AppError::Validation(format!(
                "row dated {} is outside {}/{}",
                row.date, upload.month, upload.year
            )));
        }

        let report = Self::new_report(
            ReportPayload::DoorEntry(upload.rows),
            upload.month,
            upload.year,
            now,
            upload.source_file_ref,
            Vec::new(),
        );
        self.commit(report).await
    }

    // --- PRESENÇA ---
    async fn load_source(&self, id: Uuid, expected: ReportType) -> Result<MonthlyReport, AppError> {
        let report = with_timeout(self.timeout, "find_report", self.reports.find_report(id)).await?;
        match report {
            Some(report) if report.report_type == expected => Ok(report),
            Some(report) => Err(AppError::MissingSource(format!(
                "report {id} is a {:?}, expected {:?}",
                report.report_type, expected
            ))),
            None => Err(AppError::MissingSource(format!("report {id} does not exist"))),
        }
    }

    pub async fn generate_attendance(
        &self,
        leave_report_id: Uuid,
        door_entry_report_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<MonthlyReport, AppError> {
        let leave = self.load_source(leave_report_id, ReportType::LeaveReport).await?;
        let door = self.load_source(door_entry_report_id, ReportType::DoorEntryReport).await?;
        self.reconcile(leave, door, now).await
    }

    async fn latest_source(&self, report_type: ReportType, month: i16, year: i32) -> Result<MonthlyReport, AppError> {
        with_timeout(self.timeout, "latest_report", self.reports.latest_report(report_type, month, year))
            .await?
            .ok_or_else(|| AppError::MissingSource(format!("no {report_type:?} for {month}/{year}")))
    }

    /// Cruza os relatórios mais recentes de licença e catraca do período.
    pub async fn attendance_for_period(&self, month: i16, year: i32, now: NaiveDateTime) -> Result<MonthlyReport, AppError> {
        let leave = self.latest_source(ReportType::LeaveReport, month, year).await?;
        let door = self.latest_source(ReportType::DoorEntryReport, month, year).await?;
        self.reconcile(leave, door, now).await
    }

    async fn reconcile(&self, leave: MonthlyReport, door: MonthlyReport, now: NaiveDateTime) -> Result<MonthlyReport, AppError> {
        if (leave.period_month, leave.period_year) != (door.period_month, door.period_year) {
            return Err(AppError::Validation(format!(
                "leave report is for {}/{} but door-entry report is for {}/{}",
                leave.period_month, leave.period_year, door.period_month, door.period_year
            )));
        }
        let (month, year) = (leave.period_month, leave.period_year);

        let _permit = self.guard.try_acquire(ReportType::AttendanceReport, month, year)?;
        let _lock = self.lock_period(ReportType::AttendanceReport, month, year).await?;

        let (ReportPayload::Leave(leave_rows), ReportPayload::DoorEntry(door_rows)) = (leave.payload, door.payload) else {
            return Err(AppError::MissingSource("source reports carry unexpected payloads".into()));
        };

        let mappings = self.list_mappings().await?;
        let names: HashMap<String, String> = self
            .approvers
            .list_employees()
            .await?
            .into_iter()
            .map(|e| (e.employee_id, e.name))
            .collect();

        let result = tokio::task::spawn_blocking(move || {
            reconciliation::reconcile(&leave_rows, &door_rows, &mappings, &names)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

        if !result.unmapped.is_empty() {
            tracing::warn!(
                "🚪 {} nome(s) da catraca sem mapeamento em {}/{}: {}",
                result.unmapped.len(),
                month,
                year,
                result.unmapped.join(", ")
            );
        }

        self.commit(Self::new_report(
            ReportPayload::Attendance(result.rows),
            month,
            year,
            now,
            door.source_file_ref,
            result.unmapped,
        ))
        .await
    }

    // --- LEITURA ---
    pub async fn get_report(&self, id: Uuid) -> Result<MonthlyReport, AppError> {
        with_timeout(self.timeout, "find_report", self.reports.find_report(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("report {id}")))
    }

    pub async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<ReportSummary>, AppError> {
        with_timeout(self.timeout, "list_reports", self.reports.list_reports(query)).await
    }

    // --- MAPEAMENTO DE CATRACA ---
    pub async fn upsert_mapping(
        &self,
        employee_id: &str,
        payload: DoorEntryMappingPayload,
    ) -> Result<DoorEntryMapping, AppError> {
        self.approvers.find_employee(employee_id).await?;

        let mapping = DoorEntryMapping {
            employee_id: employee_id.to_string(),
            door_system_name: payload.door_system_name,
            door_system_id: payload.door_system_id,
        };
        with_timeout(self.timeout, "upsert_mapping", self.mappings.upsert_mapping(&mapping)).await?;

        tracing::info!(
            "🚪 {} mapeado para '{}' ({})",
            mapping.employee_id,
            mapping.door_system_name,
            mapping.door_system_id
        );
        Ok(mapping)
    }

    pub async fn list_mappings(&self) -> Result<Vec<DoorEntryMapping>, AppError> {
        with_timeout(self.timeout, "list_mappings", self.mappings.list_mappings()).await
    }
}
