//! Per-year, per-jurisdiction reference data.
//!
//! Tables are `'static` and read-only; `TaxConstants` is the injectable handle that
//! computation and rule evaluation resolve against.

mod federal;
mod state;

use serde::Serialize;
use tracing::debug;

use super::domain::{FilingStatus, StateCode};

/// One width-based bracket segment. `width == None` is the unbounded final segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bracket {
    pub width: Option<u64>,
    /// Marginal rate in basis points (1% == 100).
    pub rate_bps: u32,
}

impl Bracket {
    pub const fn span(width: u64, rate_bps: u32) -> Self {
        Self {
            width: Some(width),
            rate_bps,
        }
    }

    pub const fn rest(rate_bps: u32) -> Self {
        Self {
            width: None,
            rate_bps,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate_bps as f64 / 10_000.0
    }
}

/// Federal values that vary by filing status. Qualifying surviving spouse reads the joint value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ByStatus<T> {
    pub single: T,
    pub joint: T,
    pub separate: T,
    pub head_of_household: T,
}

impl<T: Copy> ByStatus<T> {
    pub fn get(&self, status: FilingStatus) -> T {
        match status {
            FilingStatus::Single => self.single,
            FilingStatus::MarriedFilingJointly | FilingStatus::QualifyingSurvivingSpouse => {
                self.joint
            }
            FilingStatus::MarriedFilingSeparately => self.separate,
            FilingStatus::HeadOfHousehold => self.head_of_household,
        }
    }
}

/// State tables only distinguish single and joint filers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleOrJoint<T> {
    pub single: T,
    pub joint: T,
}

impl<T: Copy> SingleOrJoint<T> {
    /// Separate and head-of-household filers use the single table; surviving spouses the joint one.
    pub fn get(&self, status: FilingStatus) -> T {
        if status.is_joint() {
            self.joint
        } else {
            self.single
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollConstants {
    pub social_security_rate: f64,
    pub social_security_wage_base: f64,
    pub medicare_rate: f64,
    pub additional_medicare_rate: f64,
    pub additional_medicare_threshold: ByStatus<f64>,
    pub se_tax_rate: f64,
    /// Share of net self-employment profit subject to SE tax.
    pub se_earnings_factor: f64,
    pub se_minimum_earnings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionLimits {
    pub ira: f64,
    pub elective_deferral: f64,
    pub hsa_self: f64,
    pub hsa_family: f64,
    pub student_loan_interest: f64,
    pub educator_expense: f64,
}

impl ContributionLimits {
    pub fn hsa(&self, family_coverage: bool) -> f64 {
        if family_coverage {
            self.hsa_family
        } else {
            self.hsa_self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditConstants {
    pub child_tax_credit: f64,
    pub other_dependent_credit: f64,
    pub ctc_phaseout_threshold: ByStatus<f64>,
    pub ctc_phaseout_step: f64,
    pub ctc_phaseout_reduction: f64,
    pub aotc_full_tier: f64,
    pub aotc_partial_tier: f64,
    pub aotc_partial_rate: f64,
    pub aotc_income_limit: ByStatus<f64>,
    pub ev_credit: f64,
    pub ev_income_limit: ByStatus<f64>,
    pub childcare_rate: f64,
    pub childcare_cap_one: f64,
    pub childcare_cap_two_or_more: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FederalConstants {
    pub year: u16,
    pub standard_deduction: ByStatus<f64>,
    pub brackets: ByStatus<&'static [Bracket]>,
    pub payroll: PayrollConstants,
    pub limits: ContributionLimits,
    pub salt_cap: ByStatus<f64>,
    pub credits: CreditConstants,
    /// MAGI range over which the student loan interest deduction phases out.
    pub student_loan_phaseout: ByStatus<(f64, f64)>,
    pub mileage_rate: f64,
    pub home_office_rate: f64,
    pub home_office_max_sqft: f64,
    pub schedule_b_threshold: f64,
    pub capital_loss_limit: ByStatus<f64>,
    pub niit_threshold: ByStatus<f64>,
    pub niit_rate: f64,
}

/// Flat-rate surtax applied to state taxable income above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surtax {
    pub name: &'static str,
    pub threshold: f64,
    pub rate_bps: u32,
}

impl Surtax {
    pub fn rate(&self) -> f64 {
        self.rate_bps as f64 / 10_000.0
    }

    /// Rounded surtax owed on the given taxable income.
    pub fn compute(&self, taxable_income: f64) -> f64 {
        let excess = (taxable_income - self.threshold).max(0.0);
        (excess * self.rate_bps as f64 / 10_000.0).round()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentersCredit {
    pub amount: SingleOrJoint<f64>,
    pub agi_limit: SingleOrJoint<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateConstants {
    pub state: StateCode,
    pub year: u16,
    pub standard_deduction: SingleOrJoint<f64>,
    pub brackets: SingleOrJoint<&'static [Bracket]>,
    pub surtax: Option<Surtax>,
    pub renters_credit: Option<RentersCredit>,
}

/// Federal constants resolved for one filing status.
#[derive(Debug, Clone, Copy)]
pub struct FederalTable {
    pub constants: &'static FederalConstants,
    pub filing_status: FilingStatus,
    pub standard_deduction: f64,
    pub brackets: &'static [Bracket],
}

/// State constants resolved for one filing status.
#[derive(Debug, Clone, Copy)]
pub struct StateTable {
    pub constants: &'static StateConstants,
    pub filing_status: FilingStatus,
    pub standard_deduction: f64,
    pub brackets: &'static [Bracket],
}

impl StateTable {
    pub fn state(&self) -> StateCode {
        self.constants.state
    }

    /// Renter's credit amount and AGI ceiling for this filer, when the state offers one.
    pub fn renters_credit(&self) -> Option<(f64, f64)> {
        self.constants.renters_credit.map(|credit| {
            (
                credit.amount.get(self.filing_status),
                credit.agi_limit.get(self.filing_status),
            )
        })
    }
}

/// Injectable reference table. `standard()` carries every tabulated year.
#[derive(Debug, Clone)]
pub struct TaxConstants {
    federal: Vec<&'static FederalConstants>,
    states: Vec<&'static StateConstants>,
}

impl Default for TaxConstants {
    fn default() -> Self {
        Self::standard()
    }
}

impl TaxConstants {
    pub fn standard() -> Self {
        Self::with_tables(federal::tables(), state::tables())
    }

    pub fn with_tables(
        mut federal: Vec<&'static FederalConstants>,
        mut states: Vec<&'static StateConstants>,
    ) -> Self {
        federal.sort_by_key(|table| table.year);
        states.sort_by_key(|table| (table.state, table.year));
        Self { federal, states }
    }

    pub fn known_years(&self) -> Vec<u16> {
        self.federal.iter().map(|table| table.year).collect()
    }

    pub fn latest_year(&self) -> u16 {
        self.federal
            .last()
            .map(|table| table.year)
            .unwrap_or(federal::FALLBACK.year)
    }

    /// Federal constants for `year`, or the most recent year when it is not tabulated.
    pub fn federal(&self, year: u16) -> &'static FederalConstants {
        if let Some(table) = self.federal.iter().find(|table| table.year == year) {
            return *table;
        }

        let fallback = self.federal.last().copied().unwrap_or(federal::FALLBACK);
        debug!(
            requested = year,
            resolved = fallback.year,
            "federal tax year not tabulated; using most recent"
        );
        fallback
    }

    pub fn state(&self, year: u16, state: StateCode) -> Option<&'static StateConstants> {
        let mut candidates = self.states.iter().filter(|table| table.state == state);
        let exact = candidates.clone().find(|table| table.year == year).copied();
        match exact {
            Some(table) => Some(table),
            None => {
                let latest = candidates.next_back().copied();
                if let Some(table) = latest {
                    debug!(
                        requested = year,
                        resolved = table.year,
                        state = %state,
                        "state tax year not tabulated; using most recent"
                    );
                }
                latest
            }
        }
    }

    pub fn lookup(
        &self,
        year: u16,
        state: Option<StateCode>,
        filing_status: FilingStatus,
    ) -> (FederalTable, Option<StateTable>) {
        let federal = self.federal(year);
        let federal_table = FederalTable {
            constants: federal,
            filing_status,
            standard_deduction: federal.standard_deduction.get(filing_status),
            brackets: federal.brackets.get(filing_status),
        };

        let state_table = state
            .and_then(|code| self.state(federal.year, code))
            .map(|constants| StateTable {
                constants,
                filing_status,
                standard_deduction: constants.standard_deduction.get(filing_status),
                brackets: constants.brackets.get(filing_status),
            });

        (federal_table, state_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_statuses_read_the_joint_column() {
        let column = SingleOrJoint {
            single: "single",
            joint: "joint",
        };
        for status in FilingStatus::ordered() {
            let expected = if status.is_joint() { "joint" } else { "single" };
            assert_eq!(column.get(status), expected, "{status:?}");
        }
        assert_eq!(column.get(FilingStatus::QualifyingSurvivingSpouse), "joint");
        assert_eq!(column.get(FilingStatus::HeadOfHousehold), "single");
    }

    #[test]
    fn unknown_year_falls_back_to_latest() {
        let constants = TaxConstants::standard();
        let (federal, _) = constants.lookup(2031, None, FilingStatus::Single);
        assert_eq!(federal.constants.year, 2025);
        assert_eq!(federal.standard_deduction, 15_000.0);
    }

    #[test]
    fn resolves_prior_year_tables() {
        let constants = TaxConstants::standard();
        let (federal, state) =
            constants.lookup(2024, Some(StateCode::California), FilingStatus::Single);
        assert_eq!(federal.constants.year, 2024);
        assert_eq!(federal.standard_deduction, 14_600.0);
        let state = state.expect("california table");
        assert_eq!(state.constants.year, 2024);
        assert_eq!(state.standard_deduction, 5_540.0);
    }

    #[test]
    fn state_tables_map_separate_and_head_of_household_to_single() {
        let constants = TaxConstants::standard();
        let single = constants
            .lookup(2025, Some(StateCode::NewYork), FilingStatus::Single)
            .1
            .expect("ny table");
        for status in [
            FilingStatus::MarriedFilingSeparately,
            FilingStatus::HeadOfHousehold,
        ] {
            let table = constants
                .lookup(2025, Some(StateCode::NewYork), status)
                .1
                .expect("ny table");
            assert_eq!(table.brackets, single.brackets);
            assert_eq!(table.standard_deduction, single.standard_deduction);
        }

        let joint = constants
            .lookup(2025, Some(StateCode::NewYork), FilingStatus::MarriedFilingJointly)
            .1
            .expect("ny table");
        let surviving = constants
            .lookup(
                2025,
                Some(StateCode::NewYork),
                FilingStatus::QualifyingSurvivingSpouse,
            )
            .1
            .expect("ny table");
        assert_eq!(surviving.brackets, joint.brackets);
    }

    #[test]
    fn every_bracket_table_ends_unbounded() {
        let constants = TaxConstants::standard();
        for year in constants.known_years() {
            for status in FilingStatus::ordered() {
                for state in [None, Some(StateCode::California), Some(StateCode::NewYork)] {
                    let (federal, state) = constants.lookup(year, state, status);
                    assert_eq!(federal.brackets.last().and_then(|b| b.width), None);
                    if let Some(state) = state {
                        assert_eq!(state.brackets.last().and_then(|b| b.width), None);
                    }
                }
            }
        }
    }

    #[test]
    fn california_carries_mental_health_surtax() {
        let constants = TaxConstants::standard();
        let table = constants
            .state(2025, StateCode::California)
            .expect("california table");
        let surtax = table.surtax.expect("mhst");
        assert_eq!(surtax.threshold, 1_000_000.0);
        assert_eq!(surtax.compute(1_250_000.0), 2_500.0);
        assert_eq!(surtax.compute(900_000.0), 0.0);
    }
}
