use super::super::domain::StateCode;
use super::{Bracket, RentersCredit, SingleOrJoint, StateConstants, Surtax};

pub(super) fn tables() -> Vec<&'static StateConstants> {
    vec![&CA_2024, &CA_2025, &NY_2024, &NY_2025]
}

const MENTAL_HEALTH_SERVICES_TAX: Surtax = Surtax {
    name: "Mental Health Services Tax",
    threshold: 1_000_000.0,
    rate_bps: 100,
};

static CA_SINGLE_2024: [Bracket; 9] = [
    Bracket::span(10_756, 100),
    Bracket::span(14_743, 200),
    Bracket::span(14_746, 400),
    Bracket::span(15_621, 600),
    Bracket::span(14_740, 800),
    Bracket::span(290_053, 930),
    Bracket::span(72_128, 1030),
    Bracket::span(288_527, 1130),
    Bracket::rest(1230),
];

static CA_JOINT_2024: [Bracket; 9] = [
    Bracket::span(21_512, 100),
    Bracket::span(29_486, 200),
    Bracket::span(29_492, 400),
    Bracket::span(31_242, 600),
    Bracket::span(29_480, 800),
    Bracket::span(580_106, 930),
    Bracket::span(144_256, 1030),
    Bracket::span(577_054, 1130),
    Bracket::rest(1230),
];

static CA_SINGLE_2025: [Bracket; 9] = [
    Bracket::span(11_079, 100),
    Bracket::span(15_185, 200),
    Bracket::span(15_188, 400),
    Bracket::span(16_090, 600),
    Bracket::span(15_182, 800),
    Bracket::span(298_755, 930),
    Bracket::span(74_292, 1030),
    Bracket::span(297_182, 1130),
    Bracket::rest(1230),
];

static CA_JOINT_2025: [Bracket; 9] = [
    Bracket::span(22_158, 100),
    Bracket::span(30_370, 200),
    Bracket::span(30_376, 400),
    Bracket::span(32_180, 600),
    Bracket::span(30_364, 800),
    Bracket::span(597_510, 930),
    Bracket::span(148_584, 1030),
    Bracket::span(594_364, 1130),
    Bracket::rest(1230),
];

static NY_SINGLE: [Bracket; 9] = [
    Bracket::span(8_500, 400),
    Bracket::span(3_200, 450),
    Bracket::span(2_200, 525),
    Bracket::span(66_750, 550),
    Bracket::span(134_750, 600),
    Bracket::span(862_150, 685),
    Bracket::span(3_922_450, 965),
    Bracket::span(20_000_000, 1030),
    Bracket::rest(1090),
];

static NY_JOINT: [Bracket; 9] = [
    Bracket::span(17_150, 400),
    Bracket::span(6_450, 450),
    Bracket::span(4_300, 525),
    Bracket::span(133_650, 550),
    Bracket::span(161_650, 600),
    Bracket::span(1_832_150, 685),
    Bracket::span(2_844_650, 965),
    Bracket::span(20_000_000, 1030),
    Bracket::rest(1090),
];

static CA_2024: StateConstants = StateConstants {
    state: StateCode::California,
    year: 2024,
    standard_deduction: SingleOrJoint {
        single: 5_540.0,
        joint: 11_080.0,
    },
    brackets: SingleOrJoint {
        single: &CA_SINGLE_2024,
        joint: &CA_JOINT_2024,
    },
    surtax: Some(MENTAL_HEALTH_SERVICES_TAX),
    renters_credit: Some(RentersCredit {
        amount: SingleOrJoint {
            single: 60.0,
            joint: 120.0,
        },
        agi_limit: SingleOrJoint {
            single: 52_421.0,
            joint: 104_842.0,
        },
    }),
};

static CA_2025: StateConstants = StateConstants {
    state: StateCode::California,
    year: 2025,
    standard_deduction: SingleOrJoint {
        single: 5_706.0,
        joint: 11_412.0,
    },
    brackets: SingleOrJoint {
        single: &CA_SINGLE_2025,
        joint: &CA_JOINT_2025,
    },
    surtax: Some(MENTAL_HEALTH_SERVICES_TAX),
    renters_credit: Some(RentersCredit {
        amount: SingleOrJoint {
            single: 60.0,
            joint: 120.0,
        },
        agi_limit: SingleOrJoint {
            single: 53_994.0,
            joint: 107_988.0,
        },
    }),
};

static NY_2024: StateConstants = StateConstants {
    state: StateCode::NewYork,
    year: 2024,
    standard_deduction: SingleOrJoint {
        single: 8_000.0,
        joint: 16_050.0,
    },
    brackets: SingleOrJoint {
        single: &NY_SINGLE,
        joint: &NY_JOINT,
    },
    surtax: None,
    renters_credit: None,
};

static NY_2025: StateConstants = StateConstants {
    state: StateCode::NewYork,
    year: 2025,
    standard_deduction: SingleOrJoint {
        single: 8_000.0,
        joint: 16_050.0,
    },
    brackets: SingleOrJoint {
        single: &NY_SINGLE,
        joint: &NY_JOINT,
    },
    surtax: None,
    renters_credit: None,
};
