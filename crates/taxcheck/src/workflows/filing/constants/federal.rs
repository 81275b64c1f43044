use super::{
    Bracket, ByStatus, ContributionLimits, CreditConstants, FederalConstants, PayrollConstants,
};

pub(super) static FALLBACK: &FederalConstants = &FEDERAL_2025;

pub(super) fn tables() -> Vec<&'static FederalConstants> {
    vec![&FEDERAL_2024, &FEDERAL_2025]
}

static SINGLE_2024: [Bracket; 7] = [
    Bracket::span(11_600, 1000),
    Bracket::span(35_550, 1200),
    Bracket::span(53_375, 2200),
    Bracket::span(91_425, 2400),
    Bracket::span(51_775, 3200),
    Bracket::span(365_625, 3500),
    Bracket::rest(3700),
];

static JOINT_2024: [Bracket; 7] = [
    Bracket::span(23_200, 1000),
    Bracket::span(71_100, 1200),
    Bracket::span(106_750, 2200),
    Bracket::span(182_850, 2400),
    Bracket::span(103_550, 3200),
    Bracket::span(243_750, 3500),
    Bracket::rest(3700),
];

static SEPARATE_2024: [Bracket; 7] = [
    Bracket::span(11_600, 1000),
    Bracket::span(35_550, 1200),
    Bracket::span(53_375, 2200),
    Bracket::span(91_425, 2400),
    Bracket::span(51_775, 3200),
    Bracket::span(121_875, 3500),
    Bracket::rest(3700),
];

static HEAD_OF_HOUSEHOLD_2024: [Bracket; 7] = [
    Bracket::span(16_550, 1000),
    Bracket::span(46_550, 1200),
    Bracket::span(37_400, 2200),
    Bracket::span(91_450, 2400),
    Bracket::span(51_750, 3200),
    Bracket::span(365_650, 3500),
    Bracket::rest(3700),
];

static SINGLE_2025: [Bracket; 7] = [
    Bracket::span(11_925, 1000),
    Bracket::span(36_550, 1200),
    Bracket::span(54_875, 2200),
    Bracket::span(93_950, 2400),
    Bracket::span(53_225, 3200),
    Bracket::span(375_825, 3500),
    Bracket::rest(3700),
];

static JOINT_2025: [Bracket; 7] = [
    Bracket::span(23_850, 1000),
    Bracket::span(73_100, 1200),
    Bracket::span(109_750, 2200),
    Bracket::span(187_900, 2400),
    Bracket::span(106_450, 3200),
    Bracket::span(250_550, 3500),
    Bracket::rest(3700),
];

static SEPARATE_2025: [Bracket; 7] = [
    Bracket::span(11_925, 1000),
    Bracket::span(36_550, 1200),
    Bracket::span(54_875, 2200),
    Bracket::span(93_950, 2400),
    Bracket::span(53_225, 3200),
    Bracket::span(125_275, 3500),
    Bracket::rest(3700),
];

static HEAD_OF_HOUSEHOLD_2025: [Bracket; 7] = [
    Bracket::span(17_000, 1000),
    Bracket::span(47_850, 1200),
    Bracket::span(38_500, 2200),
    Bracket::span(93_950, 2400),
    Bracket::span(53_200, 3200),
    Bracket::span(375_850, 3500),
    Bracket::rest(3700),
];

const HIGH_INCOME_THRESHOLD: ByStatus<f64> = ByStatus {
    single: 200_000.0,
    joint: 250_000.0,
    separate: 125_000.0,
    head_of_household: 200_000.0,
};

const CREDITS: CreditConstants = CreditConstants {
    child_tax_credit: 2_000.0,
    other_dependent_credit: 500.0,
    ctc_phaseout_threshold: ByStatus {
        single: 200_000.0,
        joint: 400_000.0,
        separate: 200_000.0,
        head_of_household: 200_000.0,
    },
    ctc_phaseout_step: 1_000.0,
    ctc_phaseout_reduction: 50.0,
    aotc_full_tier: 2_000.0,
    aotc_partial_tier: 2_000.0,
    aotc_partial_rate: 0.25,
    aotc_income_limit: ByStatus {
        single: 90_000.0,
        joint: 180_000.0,
        separate: 0.0,
        head_of_household: 90_000.0,
    },
    ev_credit: 7_500.0,
    ev_income_limit: ByStatus {
        single: 150_000.0,
        joint: 300_000.0,
        separate: 150_000.0,
        head_of_household: 225_000.0,
    },
    childcare_rate: 0.20,
    childcare_cap_one: 3_000.0,
    childcare_cap_two_or_more: 6_000.0,
};

const SALT_CAP: ByStatus<f64> = ByStatus {
    single: 10_000.0,
    joint: 10_000.0,
    separate: 5_000.0,
    head_of_household: 10_000.0,
};

const CAPITAL_LOSS_LIMIT: ByStatus<f64> = ByStatus {
    single: 3_000.0,
    joint: 3_000.0,
    separate: 1_500.0,
    head_of_household: 3_000.0,
};

static FEDERAL_2024: FederalConstants = FederalConstants {
    year: 2024,
    standard_deduction: ByStatus {
        single: 14_600.0,
        joint: 29_200.0,
        separate: 14_600.0,
        head_of_household: 21_900.0,
    },
    brackets: ByStatus {
        single: &SINGLE_2024,
        joint: &JOINT_2024,
        separate: &SEPARATE_2024,
        head_of_household: &HEAD_OF_HOUSEHOLD_2024,
    },
    payroll: PayrollConstants {
        social_security_rate: 0.062,
        social_security_wage_base: 168_600.0,
        medicare_rate: 0.0145,
        additional_medicare_rate: 0.009,
        additional_medicare_threshold: HIGH_INCOME_THRESHOLD,
        se_tax_rate: 0.153,
        se_earnings_factor: 0.9235,
        se_minimum_earnings: 400.0,
    },
    limits: ContributionLimits {
        ira: 7_000.0,
        elective_deferral: 23_000.0,
        hsa_self: 4_150.0,
        hsa_family: 8_300.0,
        student_loan_interest: 2_500.0,
        educator_expense: 300.0,
    },
    salt_cap: SALT_CAP,
    credits: CREDITS,
    student_loan_phaseout: ByStatus {
        single: (80_000.0, 95_000.0),
        joint: (165_000.0, 195_000.0),
        separate: (0.0, 0.0),
        head_of_household: (80_000.0, 95_000.0),
    },
    mileage_rate: 0.67,
    home_office_rate: 5.0,
    home_office_max_sqft: 300.0,
    schedule_b_threshold: 1_500.0,
    capital_loss_limit: CAPITAL_LOSS_LIMIT,
    niit_threshold: HIGH_INCOME_THRESHOLD,
    niit_rate: 0.038,
};

static FEDERAL_2025: FederalConstants = FederalConstants {
    year: 2025,
    standard_deduction: ByStatus {
        single: 15_000.0,
        joint: 30_000.0,
        separate: 15_000.0,
        head_of_household: 22_500.0,
    },
    brackets: ByStatus {
        single: &SINGLE_2025,
        joint: &JOINT_2025,
        separate: &SEPARATE_2025,
        head_of_household: &HEAD_OF_HOUSEHOLD_2025,
    },
    payroll: PayrollConstants {
        social_security_rate: 0.062,
        social_security_wage_base: 176_100.0,
        medicare_rate: 0.0145,
        additional_medicare_rate: 0.009,
        additional_medicare_threshold: HIGH_INCOME_THRESHOLD,
        se_tax_rate: 0.153,
        se_earnings_factor: 0.9235,
        se_minimum_earnings: 400.0,
    },
    limits: ContributionLimits {
        ira: 7_000.0,
        elective_deferral: 23_500.0,
        hsa_self: 4_300.0,
        hsa_family: 8_550.0,
        student_loan_interest: 2_500.0,
        educator_expense: 300.0,
    },
    salt_cap: SALT_CAP,
    credits: CREDITS,
    student_loan_phaseout: ByStatus {
        single: (85_000.0, 100_000.0),
        joint: (170_000.0, 200_000.0),
        separate: (0.0, 0.0),
        head_of_household: (85_000.0, 100_000.0),
    },
    mileage_rate: 0.70,
    home_office_rate: 5.0,
    home_office_max_sqft: 300.0,
    schedule_b_threshold: 1_500.0,
    capital_loss_limit: CAPITAL_LOSS_LIMIT,
    niit_threshold: HIGH_INCOME_THRESHOLD,
    niit_rate: 0.038,
};
