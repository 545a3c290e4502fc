//! Anatomical categorization of assets by display name.
//!
//! Membership is driven by a controlled vocabulary, so exact-set lookup
//! suffices. The tables are checked in a fixed precedence order; the first
//! table containing the (trimmed) name wins, and unmatched names fall into
//! [`CategoryId::Other`].

/// Display grouping of assets by anatomical meaning.
///
/// Precedence when tables overlap: cardio > lung > organ > bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryId {
    /// Cardiovascular system.
    Cardio,
    /// Lungs and airway.
    Lung,
    /// Abdominal organs.
    Organ,
    /// Skeleton.
    Bone,
    /// Everything unmatched.
    Other,
}

impl CategoryId {
    /// All categories in panel display order.
    pub const ALL: [Self; 5] = [
        Self::Cardio,
        Self::Lung,
        Self::Organ,
        Self::Bone,
        Self::Other,
    ];

    /// Panel title. Part of the upstream display contract.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cardio => "心血管系统",
            Self::Lung => "肺",
            Self::Organ => "内脏",
            Self::Bone => "骨骼",
            Self::Other => "其他",
        }
    }

    /// Two-letter icon tag. Part of the upstream display contract.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Cardio => "CV",
            Self::Lung => "LU",
            Self::Organ => "OR",
            Self::Bone => "BO",
            Self::Other => "ET",
        }
    }

    /// Categorize a display name. Pure and total: trims the name, checks
    /// the tables in precedence order, falls back to `Other`.
    #[must_use]
    pub fn assign(display_name: &str) -> Self {
        assign_in(NAME_TABLE, display_name)
    }
}

const CARDIO_NAMES: &[&str] = &[
    "心脏",
    "主动脉",
    "肺静脉",
    "左心耳",
    "上腔静脉",
    "下腔静脉",
    "头臂干",
    "右锁骨下动脉",
    "左锁骨下动脉",
    "右颈总动脉",
    "左颈总动脉",
    "左头臂静脉",
    "右头臂静脉",
];

const LUNG_NAMES: &[&str] = &[
    "左肺",
    "右肺",
    "左肺上叶",
    "左肺下叶",
    "右肺上叶",
    "右肺中叶",
    "右肺下叶",
    "气管",
];

const ORGAN_NAMES: &[&str] = &[
    "肝脏",
    "胆囊",
    "胰腺",
    "脾脏",
    "胃",
    "十二指肠",
    "门静脉及脾静脉",
    "右肾上腺",
    "左肾上腺",
    "右肾",
    "左肾",
    "食管",
];

const BONE_NAMES: &[&str] = &["骨骼"];

/// Lookup tables in precedence order.
const NAME_TABLE: &[(CategoryId, &[&str])] = &[
    (CategoryId::Cardio, CARDIO_NAMES),
    (CategoryId::Lung, LUNG_NAMES),
    (CategoryId::Organ, ORGAN_NAMES),
    (CategoryId::Bone, BONE_NAMES),
];

fn assign_in(table: &[(CategoryId, &[&str])], display_name: &str) -> CategoryId {
    let name = display_name.trim();
    for (category, names) in table {
        if names.contains(&name) {
            return *category;
        }
    }
    CategoryId::Other
}
