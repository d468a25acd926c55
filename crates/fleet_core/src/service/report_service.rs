//! Read-only company reports.
//!
//! # Responsibility
//! - Aggregate counts and price sums per company and per driver.
//! - Render the plain-text company report.
//!
//! # Invariants
//! - Nothing here writes to storage.
//! - Driver statistics are stable-sorted by transport count, descending;
//!   ties keep employee id order.

use crate::model::company::Company;
use crate::model::transport::Transport;
use crate::model::{CompanyId, EmployeeId};
use crate::repo::company_repo::SqliteCompanyRepository;
use crate::repo::employee_repo::SqliteEmployeeRepository;
use crate::repo::store::Store;
use crate::repo::transport_repo::{PriceFilter, SqliteTransportRepository};
use crate::service::ServiceResult;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

const CURRENCY: &str = "BGN";

/// Counts and sums for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanySummary {
    pub company_id: CompanyId,
    pub company_name: String,
    pub employee_count: u64,
    pub total_transports: u64,
    pub paid_transports: u64,
    pub unpaid_transports: u64,
    /// Sum of prices of paid transports.
    pub total_revenue: Decimal,
    /// Sum of prices of unpaid transports.
    pub pending_amount: Decimal,
}

/// Per-driver workload and paid revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverReport {
    pub driver_id: EmployeeId,
    pub driver_name: String,
    pub transport_count: u64,
    pub total_revenue: Decimal,
}

/// Read-side aggregation over the ledger.
pub struct ReportService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReportService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn transports(&self) -> SqliteTransportRepository<'conn> {
        SqliteTransportRepository::new(self.conn)
    }

    pub fn total_transports_count(&self, company_id: CompanyId) -> ServiceResult<u64> {
        Ok(self.transports().count_by_company(company_id)?)
    }

    /// Sum of prices of the company's paid transports.
    pub fn total_revenue(&self, company_id: CompanyId) -> ServiceResult<Decimal> {
        Ok(self
            .transports()
            .sum_price(&PriceFilter::company(company_id).paid(true))?)
    }

    /// Paid revenue of transports departing on/after `start` and arriving
    /// on/before `end`.
    pub fn revenue_for_period(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Decimal> {
        Ok(self.transports().sum_price(
            &PriceFilter::company(company_id)
                .paid(true)
                .between(start, end),
        )?)
    }

    /// Statistics for every employee of the company.
    ///
    /// Counts and revenue cover all transports the employee drove.
    pub fn driver_statistics(&self, company_id: CompanyId) -> ServiceResult<Vec<DriverReport>> {
        let transports = self.transports();
        let mut reports = Vec::new();

        for employee in SqliteEmployeeRepository::new(self.conn).find_by_company(company_id)? {
            reports.push(DriverReport {
                driver_id: employee.id,
                driver_name: employee.full_name(),
                transport_count: transports.count_by_driver(employee.id)?,
                total_revenue: transports.sum_price(&PriceFilter::driver(employee.id).paid(true))?,
            });
        }

        // `sort_by` is stable.
        reports.sort_by(|a, b| b.transport_count.cmp(&a.transport_count));
        Ok(reports)
    }

    /// `(driver name, paid revenue)` pairs in driver-statistics order.
    pub fn revenue_by_driver(&self, company_id: CompanyId) -> ServiceResult<Vec<(String, Decimal)>> {
        Ok(self
            .driver_statistics(company_id)?
            .into_iter()
            .map(|report| (report.driver_name, report.total_revenue))
            .collect())
    }

    /// Company transports keyed by end point.
    pub fn transports_grouped_by_destination(
        &self,
        company_id: CompanyId,
    ) -> ServiceResult<BTreeMap<String, Vec<Transport>>> {
        let mut groups: BTreeMap<String, Vec<Transport>> = BTreeMap::new();
        for transport in self.transports().find_by_company(company_id)? {
            groups
                .entry(transport.end_point.clone())
                .or_default()
                .push(transport);
        }
        Ok(groups)
    }

    /// Summary of one company, or `None` when it does not exist.
    pub fn company_summary(&self, company_id: CompanyId) -> ServiceResult<Option<CompanySummary>> {
        let Some(company) = SqliteCompanyRepository::new(self.conn).find_by_id(company_id)? else {
            return Ok(None);
        };
        Ok(Some(self.summarize(&company)?))
    }

    /// Plain-text report for one company, or `None` when it does not exist.
    pub fn generate_text_report(
        &self,
        company_id: CompanyId,
        generated_on: NaiveDate,
    ) -> ServiceResult<Option<String>> {
        let Some(summary) = self.company_summary(company_id)? else {
            return Ok(None);
        };
        let drivers = self.driver_statistics(company_id)?;
        Ok(Some(render_text_report(&summary, &drivers, generated_on)))
    }

    fn summarize(&self, company: &Company) -> ServiceResult<CompanySummary> {
        let transports = self.transports();
        let paid = PriceFilter::company(company.id).paid(true);
        let unpaid = PriceFilter::company(company.id).paid(false);

        Ok(CompanySummary {
            company_id: company.id,
            company_name: company.name.clone(),
            employee_count: SqliteEmployeeRepository::new(self.conn)
                .count_by_company(company.id)?,
            total_transports: transports.count_by_company(company.id)?,
            paid_transports: transports.count_matching(&paid)?,
            unpaid_transports: transports.count_matching(&unpaid)?,
            total_revenue: transports.sum_price(&paid)?,
            pending_amount: transports.sum_price(&unpaid)?,
        })
    }
}

/// Renders the multi-section company report.
pub fn render_text_report(
    summary: &CompanySummary,
    drivers: &[DriverReport],
    generated_on: NaiveDate,
) -> String {
    TextReport {
        summary,
        drivers,
        generated_on,
    }
    .to_string()
}

struct TextReport<'a> {
    summary: &'a CompanySummary,
    drivers: &'a [DriverReport],
    generated_on: NaiveDate,
}

impl Display for TextReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let heavy = "=".repeat(60);
        let light = "-".repeat(40);
        let summary = self.summary;

        writeln!(f, "{heavy}")?;
        writeln!(f, "         COMPANY REPORT: {}", summary.company_name)?;
        writeln!(f, "{heavy}")?;
        writeln!(f)?;

        writeln!(f, "SUMMARY")?;
        writeln!(f, "{light}")?;
        writeln!(f, "Total Employees: {}", summary.employee_count)?;
        writeln!(f, "Total Transports: {}", summary.total_transports)?;
        writeln!(f, "Paid Transports: {}", summary.paid_transports)?;
        writeln!(f, "Unpaid Transports: {}", summary.unpaid_transports)?;
        writeln!(
            f,
            "Total Revenue (paid): {} {CURRENCY}",
            money(summary.total_revenue)
        )?;
        writeln!(
            f,
            "Pending Amount (unpaid): {} {CURRENCY}",
            money(summary.pending_amount)
        )?;

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "DRIVER STATISTICS")?;
        writeln!(f, "{light}")?;
        writeln!(f, "{:<25} {:>10} {:>15}", "Driver Name", "Transports", "Revenue")?;
        writeln!(f, "{}", "-".repeat(55))?;
        for driver in self.drivers {
            writeln!(
                f,
                "{:<25} {:>10} {:>15}",
                driver.driver_name,
                driver.transport_count,
                money(driver.total_revenue)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{heavy}")?;
        writeln!(f, "Report generated: {}", self.generated_on)
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::{render_text_report, CompanySummary, DriverReport};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn summary() -> CompanySummary {
        CompanySummary {
            company_id: 1,
            company_name: "Acme Ltd".to_string(),
            employee_count: 2,
            total_transports: 3,
            paid_transports: 1,
            unpaid_transports: 2,
            total_revenue: Decimal::new(50000, 2),
            pending_amount: Decimal::new(12050, 2),
        }
    }

    #[test]
    fn text_report_has_every_section() {
        let drivers = vec![
            DriverReport {
                driver_id: 1,
                driver_name: "Jane Doe".to_string(),
                transport_count: 2,
                total_revenue: Decimal::new(50000, 2),
            },
            DriverReport {
                driver_id: 2,
                driver_name: "John Roe".to_string(),
                transport_count: 1,
                total_revenue: Decimal::ZERO,
            },
        ];
        let report = render_text_report(
            &summary(),
            &drivers,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "         COMPANY REPORT: Acme Ltd");
        assert!(lines.contains(&"Total Employees: 2"));
        assert!(lines.contains(&"Unpaid Transports: 2"));
        assert!(lines.contains(&"Total Revenue (paid): 500.00 BGN"));
        assert!(lines.contains(&"Pending Amount (unpaid): 120.50 BGN"));
        assert!(lines.contains(&"DRIVER STATISTICS"));
        assert!(lines.contains(&format!("{:<25} {:>10} {:>15}", "Jane Doe", 2, "500.00").as_str()));
        assert!(lines.contains(&format!("{:<25} {:>10} {:>15}", "John Roe", 1, "0.00").as_str()));
        assert_eq!(lines.last().copied(), Some("Report generated: 2024-02-01"));
    }

    #[test]
    fn text_report_without_drivers_keeps_table_header() {
        let report = render_text_report(
            &summary(),
            &[],
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        assert!(report.contains("Driver Name"));
        assert!(report.ends_with("Report generated: 2024-02-01\n"));
    }
}
